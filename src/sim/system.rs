use crate::error::{Result, SimulationError};
use crate::sim::body::Body;
use crate::sim::force::ForceModel;
use crate::sim::integrator::{Integrator, Scheme};
use crate::sim::units::Float;
use serde::Serialize;

/// An ordered set of bodies sharing one gravitational constant.
///
/// The system exclusively owns its bodies; callers get read access through
/// `bodies()` and `snapshot()`, and only an `Integrator` mutates them.
#[derive(Clone, Debug)]
pub struct BodySystem {
    pub(crate) current_time: Float,
    pub(crate) gravitational_constant: Float,
    pub(crate) bodies: Vec<Body>,
}

/// Positions of every body at one instant.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrajectorySample {
    pub time: Float,
    pub positions: Vec<Vec<Float>>,
}

impl BodySystem {
    pub fn new(bodies: Vec<Body>, gravitational_constant: Float) -> Result<BodySystem> {
        if bodies.is_empty() {
            return Err(SimulationError::InvalidBodies(
                "a body system needs at least one body".to_string(),
            ));
        }
        if !(gravitational_constant.is_finite() && gravitational_constant > 0.) {
            return Err(SimulationError::InvalidParameter {
                parameter: "gravitational_constant",
                reason: format!("must be positive and finite, got {gravitational_constant}"),
            });
        }
        let dimensionality = bodies[0].dimensionality();
        if let Some(index) = bodies
            .iter()
            .position(|b| b.dimensionality() != dimensionality)
        {
            return Err(SimulationError::InvalidBodies(format!(
                "body {index} has {} components, body 0 has {dimensionality}",
                bodies[index].dimensionality()
            )));
        }
        Ok(BodySystem {
            current_time: 0.,
            gravitational_constant,
            bodies,
        })
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn dimensionality(&self) -> usize {
        self.bodies[0].dimensionality()
    }

    pub fn current_time(&self) -> Float {
        self.current_time
    }

    pub fn gravitational_constant(&self) -> Float {
        self.gravitational_constant
    }

    /// Refreshes every body's force accumulator.
    pub fn compute_forces(&mut self, force_model: &dyn ForceModel) {
        force_model.compute_forces(&mut self.bodies, self.gravitational_constant);
    }

    /// Advances by one step of `dt` with the scheme called `scheme_name`,
    /// using direct pairwise gravity.
    pub fn step(&mut self, dt: Float, scheme_name: &str) -> Result<()> {
        let scheme: Scheme = scheme_name.parse()?;
        validate_time_step(dt)?;
        Integrator::new(scheme).step(self, dt);
        Ok(())
    }

    pub fn kinetic_energy(&self) -> Float {
        self.bodies.iter().map(Body::kinetic_energy).sum::<Float>()
    }

    pub fn potential_energy(&self) -> Float {
        let mut energy = 0.;
        for i in 0..self.bodies.len() {
            for j in (i + 1)..self.bodies.len() {
                energy +=
                    self.bodies[i].potential_energy_with(&self.bodies[j], self.gravitational_constant);
            }
        }
        energy
    }

    pub fn total_energy(&self) -> Float {
        self.kinetic_energy() + self.potential_energy()
    }

    pub fn total_mass(&self) -> Float {
        self.bodies.iter().map(Body::mass).sum::<Float>()
    }

    pub fn center_of_mass(&self) -> Vec<Float> {
        let total_mass = self.total_mass();
        let mut center = vec![0.; self.dimensionality()];
        for body in self.bodies.iter() {
            for k in 0..center.len() {
                center[k] += body.position[k] * body.mass / total_mass;
            }
        }
        center
    }

    pub fn snapshot(&self) -> TrajectorySample {
        TrajectorySample {
            time: self.current_time,
            positions: self.bodies.iter().map(|b| b.position.clone()).collect(),
        }
    }
}

pub(crate) fn validate_time_step(dt: Float) -> Result<()> {
    if dt.is_finite() && dt > 0. {
        Ok(())
    } else {
        Err(SimulationError::InvalidParameter {
            parameter: "dt",
            reason: format!("time step must be positive and finite, got {dt}"),
        })
    }
}

/// Steps `system` `steps` times, sampling positions after every step.
pub fn record_trajectory<F: ForceModel>(
    system: &mut BodySystem,
    integrator: &Integrator<F>,
    dt: Float,
    steps: usize,
) -> Result<Vec<TrajectorySample>> {
    validate_time_step(dt)?;
    let mut trajectory = Vec::with_capacity(steps);
    for _ in 0..steps {
        integrator.step(system, dt);
        trajectory.push(system.snapshot());
    }
    Ok(trajectory)
}

impl Default for BodySystem {
    /// A lone solar-mass star at rest, in SI units.
    fn default() -> Self {
        let constants = crate::sim::units::Constants::default();
        BodySystem {
            current_time: 0.,
            gravitational_constant: constants.gravitational_constant,
            bodies: vec![Body {
                mass: constants.sun_mass,
                position: vec![0., 0.],
                velocity: vec![0., 0.],
                force: vec![0., 0.],
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn two_bodies() -> Vec<Body> {
        vec![
            Body::new(1., vec![1., 0.], vec![0., 0.]).unwrap(),
            Body::new(1., vec![-1., 0.], vec![0., 0.]).unwrap(),
        ]
    }

    #[test]
    fn empty_system_is_rejected() {
        let error = BodySystem::new(vec![], 1.).unwrap_err();
        assert!(error.is_configuration());
    }

    #[test]
    fn mixed_dimensionality_is_rejected() {
        let bodies = vec![
            Body::new(1., vec![0., 0.], vec![0., 0.]).unwrap(),
            Body::new(1., vec![1., 0., 0.], vec![0., 0., 0.]).unwrap(),
        ];
        assert!(BodySystem::new(bodies, 1.).is_err());
    }

    #[test]
    fn unknown_scheme_fails_before_stepping() {
        let mut system = BodySystem::new(two_bodies(), 1.).unwrap();
        let before = system.clone();
        let error = system.step(0.1, "leapfrog").unwrap_err();
        assert!(matches!(error, SimulationError::UnknownScheme(_)));
        assert_eq!(system.bodies(), before.bodies());
        assert_eq!(system.current_time(), 0.);
    }

    #[test]
    fn non_positive_time_step_is_rejected() {
        let mut system = BodySystem::new(two_bodies(), 1.).unwrap();
        assert!(system.step(0., "verlet").is_err());
        assert!(system.step(-1., "verlet").is_err());
        assert!(system.step(Float::NAN, "verlet").is_err());
    }

    #[test]
    fn symmetric_bodies_fall_towards_each_other() {
        let mut system = BodySystem::new(two_bodies(), 1.).unwrap();
        system.step(0.1, "verlet").unwrap();
        system.step(0.1, "verlet").unwrap();
        println!("{:?}", system);

        assert!(system.bodies()[0].position()[0] < 1.);
        assert!(system.bodies()[1].position()[0] > -1.);
        assert!(system.bodies()[0].velocity()[0] < 0.);
        assert!(system.bodies()[1].velocity()[0] > 0.);
        assert_relative_eq!(system.current_time(), 0.2);
    }

    #[test]
    fn energy_of_static_pair() {
        let system = BodySystem::new(two_bodies(), 2.).unwrap();
        assert_eq!(system.kinetic_energy(), 0.);
        assert_relative_eq!(system.potential_energy(), -1.);
        assert_relative_eq!(system.total_energy(), -1.);
    }

    #[test]
    fn center_of_mass_is_mass_weighted() {
        let bodies = vec![
            Body::new(3., vec![0., 0.], vec![0., 0.]).unwrap(),
            Body::new(1., vec![4., 8.], vec![0., 0.]).unwrap(),
        ];
        let system = BodySystem::new(bodies, 1.).unwrap();
        let center = system.center_of_mass();
        assert_relative_eq!(center[0], 1.);
        assert_relative_eq!(center[1], 2.);
    }

    #[test]
    fn trajectory_has_one_sample_per_step() {
        let mut system = BodySystem::new(two_bodies(), 1.).unwrap();
        let integrator = Integrator::new(Scheme::VelocityVerlet);
        let trajectory = record_trajectory(&mut system, &integrator, 0.01, 5).unwrap();
        assert_eq!(trajectory.len(), 5);
        assert_relative_eq!(trajectory[4].time, 0.05);
        assert_eq!(trajectory[4].positions.len(), 2);
        assert_eq!(&trajectory[4].positions[0], &system.bodies()[0].position().to_vec());
    }

    #[test]
    fn default_system_is_a_lone_star() {
        let mut system = BodySystem::default();
        system.step(3600., "rk4").unwrap();
        assert_eq!(system.bodies()[0].position(), &[0., 0.]);
    }
}
