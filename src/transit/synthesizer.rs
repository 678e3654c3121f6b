use crate::error::{Result, SimulationError};
use crate::sim::body::Body;
use crate::sim::force::ForceModel;
use crate::sim::integrator::{Integrator, Scheme};
use crate::sim::system::{validate_time_step, BodySystem};
use crate::sim::units::{Constants, Float};
use crate::sim::vector;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FluxSample {
    pub time: Float,
    pub flux: Float,
    pub flux_noisy: Float,
}

/// Box-shaped occultation model: no limb darkening, and overlapping planets
/// are counted twice. Body 0 is the star. Occultation is tested on the
/// sky-plane offset only, so a planet behind the star dims it as well.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitSynthesizer {
    star_radius: Float,
    planet_radii: BTreeMap<usize, Float>,
    line_of_sight: [Float; 3],
    noise_std: Float,
}

impl TransitSynthesizer {
    /// `line_of_sight` points toward the observer and is normalized here.
    pub fn new(
        star_radius: Float,
        planet_radii: BTreeMap<usize, Float>,
        line_of_sight: [Float; 3],
        noise_std: Float,
    ) -> Result<Self> {
        if !(star_radius.is_finite() && star_radius > 0.) {
            return Err(SimulationError::InvalidParameter {
                parameter: "star_radius",
                reason: format!("must be positive and finite, got {star_radius}"),
            });
        }
        if let Some((index, radius)) = planet_radii
            .iter()
            .find(|(_, radius)| !(radius.is_finite() && **radius >= 0.))
        {
            return Err(SimulationError::InvalidParameter {
                parameter: "planet_radii",
                reason: format!("radius of body {index} must be non-negative, got {radius}"),
            });
        }
        if planet_radii.contains_key(&0) {
            return Err(SimulationError::InvalidParameter {
                parameter: "planet_radii",
                reason: "index 0 is the star".to_string(),
            });
        }
        if !(noise_std.is_finite() && noise_std >= 0.) {
            return Err(SimulationError::InvalidParameter {
                parameter: "noise_std",
                reason: format!("must be non-negative, got {noise_std}"),
            });
        }
        let length = vector::norm(&line_of_sight);
        if !(length.is_finite() && length > 0.) {
            return Err(SimulationError::InvalidParameter {
                parameter: "line_of_sight",
                reason: format!("must be a non-zero finite vector, got {line_of_sight:?}"),
            });
        }
        let line_of_sight = line_of_sight.map(|x| x / length);
        Ok(TransitSynthesizer {
            star_radius,
            planet_radii,
            line_of_sight,
            noise_std,
        })
    }

    pub fn line_of_sight(&self) -> [Float; 3] {
        self.line_of_sight
    }

    /// Distance of `planet` from the star as seen on the sky plane.
    pub fn sky_separation(&self, star: &Body, planet: &Body) -> Float {
        let relative = vector::embed_3d(&vector::difference(planet.position(), star.position()));
        let along = vector::dot(&relative, &self.line_of_sight);
        let perpendicular: Vec<Float> = relative
            .iter()
            .zip(self.line_of_sight.iter())
            .map(|(r, l)| r - along * l)
            .collect();
        vector::norm(&perpendicular)
    }

    /// Noise-free normalized flux for one configuration, clamped to `[0, 1]`.
    pub fn flux(&self, bodies: &[Body]) -> Float {
        let Some(star) = bodies.first() else {
            return 1.;
        };
        let mut deficit = 0.;
        for (index, planet) in bodies.iter().enumerate().skip(1) {
            let planet_radius = self.planet_radii.get(&index).copied().unwrap_or(0.);
            if self.sky_separation(star, planet) < self.star_radius + planet_radius {
                deficit += (planet_radius / self.star_radius).powi(2);
            }
        }
        (1. - deficit).max(0.)
    }

    fn check_indices(&self, system: &BodySystem) -> Result<()> {
        match self.planet_radii.keys().find(|index| **index >= system.len()) {
            Some(index) => Err(SimulationError::InvalidParameter {
                parameter: "planet_radii",
                reason: format!("body {index} does not exist in a system of {}", system.len()),
            }),
            None => Ok(()),
        }
    }

    /// Samples the flux, then advances one step, `steps` times.
    ///
    /// Sample `k` is taken at time `k·dt`, before step `k+1` is applied.
    pub fn run<F: ForceModel, R: Rng + ?Sized>(
        &self,
        integrator: &Integrator<F>,
        system: &mut BodySystem,
        dt: Float,
        steps: usize,
        rng: &mut R,
    ) -> Result<Vec<FluxSample>> {
        validate_time_step(dt)?;
        self.check_indices(system)?;
        let noise = Normal::new(0., self.noise_std).map_err(|e| SimulationError::InvalidParameter {
            parameter: "noise_std",
            reason: e.to_string(),
        })?;
        tracing::debug!(
            bodies = system.len(),
            steps,
            dt,
            scheme = %integrator.scheme(),
            "Synthesizing light curve"
        );

        let mut series = Vec::with_capacity(steps);
        for k in 0..steps {
            let flux = self.flux(system.bodies());
            series.push(FluxSample {
                time: k as Float * dt,
                flux,
                flux_noisy: flux + noise.sample(rng),
            });
            integrator.step(system, dt);
        }

        let in_transit = series.iter().filter(|s| s.flux < 1.).count();
        tracing::debug!(in_transit, "Light curve complete");
        Ok(series)
    }
}

/// Light curve of `bodies` (star first) in SI units with the explicit scheme.
///
/// The bodies are copied; the caller's collection is left untouched.
pub fn synthesize(
    bodies: &[Body],
    dt: Float,
    steps: usize,
    star_radius: Float,
    planet_radii: &BTreeMap<usize, Float>,
    line_of_sight: [Float; 3],
    noise_std: Float,
) -> Result<Vec<FluxSample>> {
    let synthesizer =
        TransitSynthesizer::new(star_radius, planet_radii.clone(), line_of_sight, noise_std)?;
    let mut system = BodySystem::new(
        bodies.to_vec(),
        Constants::default().gravitational_constant,
    )?;
    synthesizer.run(
        &Integrator::new(Scheme::Explicit),
        &mut system,
        dt,
        steps,
        &mut rand::thread_rng(),
    )
}
