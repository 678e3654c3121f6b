use crate::error::{Result, SimulationError};
use crate::sim::orbital_elements::{elements_to_state, OrbitalElementSet};
use crate::sim::units::Float;
use crate::sim::vector;
use serde::Serialize;

/// A point mass. Identity is its index inside the owning `BodySystem`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Body {
    pub(crate) mass: Float,
    pub(crate) position: Vec<Float>,
    pub(crate) velocity: Vec<Float>,
    #[serde(skip)]
    pub(crate) force: Vec<Float>,
}

impl Body {
    pub fn new(mass: Float, position: Vec<Float>, velocity: Vec<Float>) -> Result<Body> {
        if !(mass.is_finite() && mass > 0.) {
            return Err(SimulationError::InvalidBodies(format!(
                "mass must be positive and finite, got {mass}"
            )));
        }
        if position.len() != 2 && position.len() != 3 {
            return Err(SimulationError::InvalidBodies(format!(
                "position must have 2 or 3 components, got {}",
                position.len()
            )));
        }
        if velocity.len() != position.len() {
            return Err(SimulationError::InvalidBodies(format!(
                "velocity has {} components but position has {}",
                velocity.len(),
                position.len()
            )));
        }
        if position.iter().chain(velocity.iter()).any(|x| !x.is_finite()) {
            return Err(SimulationError::InvalidBodies(
                "position and velocity must be finite".to_string(),
            ));
        }
        let force = vec![0.; position.len()];
        Ok(Body {
            mass,
            position,
            velocity,
            force,
        })
    }

    /// Places a body on the Keplerian orbit described by `elements`,
    /// relative to a central body at `origin` moving with `origin_velocity`.
    pub fn from_elements(
        mass: Float,
        elements: &OrbitalElementSet,
        origin: &[Float; 3],
        origin_velocity: &[Float; 3],
    ) -> Result<Body> {
        let (r, v) = elements_to_state(elements)?;
        let mut position = vec![0.; 3];
        let mut velocity = vec![0.; 3];
        for k in 0..3 {
            position[k] = origin[k] + r[k];
            velocity[k] = origin_velocity[k] + v[k];
        }
        Body::new(mass, position, velocity)
    }

    pub fn mass(&self) -> Float {
        self.mass
    }

    pub fn position(&self) -> &[Float] {
        &self.position
    }

    pub fn velocity(&self) -> &[Float] {
        &self.velocity
    }

    /// Net force from the most recent force evaluation.
    pub fn force(&self) -> &[Float] {
        &self.force
    }

    pub fn dimensionality(&self) -> usize {
        self.position.len()
    }

    pub(crate) fn reset_force(&mut self) {
        self.force.iter_mut().for_each(|f| *f = 0.);
    }

    pub(crate) fn acceleration(&self) -> Vec<Float> {
        self.force.iter().map(|f| f / self.mass).collect()
    }

    pub fn distance_to(&self, other: &Self) -> Float {
        vector::norm(&vector::difference(&self.position, &other.position))
    }

    pub fn kinetic_energy(&self) -> Float {
        0.5 * self.mass * vector::dot(&self.velocity, &self.velocity)
    }

    /// Pairwise potential energy; zero for coincident bodies.
    pub fn potential_energy_with(&self, other: &Self, gravitational_constant: Float) -> Float {
        let distance = self.distance_to(other);
        if distance == 0. {
            return 0.;
        }
        -gravitational_constant * self.mass * other.mass / distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::units::PI;
    use approx::assert_relative_eq;

    #[test]
    fn rejects_non_positive_mass() {
        assert!(Body::new(0., vec![0., 0.], vec![0., 0.]).is_err());
        assert!(Body::new(-1., vec![0., 0.], vec![0., 0.]).is_err());
        assert!(Body::new(Float::NAN, vec![0., 0.], vec![0., 0.]).is_err());
    }

    #[test]
    fn rejects_mismatched_dimensionality() {
        let error = Body::new(1., vec![0., 0.], vec![0., 0., 0.]).unwrap_err();
        assert!(error.is_configuration());
        assert!(Body::new(1., vec![0.], vec![0.]).is_err());
        assert!(Body::new(1., vec![0.; 4], vec![0.; 4]).is_err());
    }

    #[test]
    fn force_matches_position_dimensionality() {
        let planar = Body::new(1., vec![1., 2.], vec![0., 0.]).unwrap();
        let spatial = Body::new(1., vec![1., 2., 3.], vec![0., 0., 0.]).unwrap();
        assert_eq!(planar.force().len(), 2);
        assert_eq!(spatial.force().len(), 3);
    }

    #[test]
    fn coincident_bodies_have_no_potential_energy() {
        let body1 = Body::new(1., vec![1., 1.], vec![0., 0.]).unwrap();
        let body2 = Body::new(2., vec![1., 1.], vec![0., 0.]).unwrap();
        assert_eq!(body1.potential_energy_with(&body2, 1.), 0.);
    }

    #[test]
    fn kinetic_and_potential_energy() {
        let body1 = Body::new(2., vec![0., 0.], vec![3., 4.]).unwrap();
        let body2 = Body::new(3., vec![0., 2.], vec![0., 0.]).unwrap();
        assert_relative_eq!(body1.kinetic_energy(), 25.);
        assert_relative_eq!(body1.potential_energy_with(&body2, 1.), -3.);
    }

    #[test]
    fn body_from_elements_is_offset_by_origin() {
        let elements = OrbitalElementSet::new(2., 0., 0., 0., 0., PI / 2., 8.).unwrap();
        let body = Body::from_elements(1., &elements, &[1., 1., 0.], &[0., 0., 1.]).unwrap();
        assert_relative_eq!(body.position()[0], 1., epsilon = 1e-12);
        assert_relative_eq!(body.position()[1], 3., epsilon = 1e-12);
        assert_relative_eq!(body.velocity()[0], -2., epsilon = 1e-12);
        assert_relative_eq!(body.velocity()[2], 1., epsilon = 1e-12);
    }
}
