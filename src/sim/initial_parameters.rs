use crate::error::{Result, SimulationError};
use crate::sim::integrator::Scheme;
use crate::sim::units::{Constants, Float, DAY, EARTH_RADIUS, SUN_RADIUS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Settings of one light-curve run. Missing JSON fields take the defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunParameters {
    pub dt: Float,
    pub steps: usize,
    pub scheme: Scheme,
    pub star_radius: Float,
    /// Radius of every planet without an entry in `planet_radii`.
    pub planet_radius: Float,
    pub planet_radii: BTreeMap<usize, Float>,
    pub line_of_sight: [Float; 3],
    pub noise_std: Float,
    pub threshold_sigma: Float,
    pub seed: Option<u64>,
    pub constants: Constants,
}

impl Default for RunParameters {
    fn default() -> Self {
        Self {
            dt: DAY,
            steps: 365,
            scheme: Scheme::Explicit,
            star_radius: SUN_RADIUS,
            planet_radius: EARTH_RADIUS,
            planet_radii: BTreeMap::new(),
            line_of_sight: [1., 0., 0.],
            noise_std: 1e-4,
            threshold_sigma: 5.,
            seed: None,
            constants: Constants::default(),
        }
    }
}

fn invalid(parameter: &'static str, reason: String) -> Result<()> {
    Err(SimulationError::InvalidParameter { parameter, reason })
}

impl RunParameters {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let params: RunParameters = serde_json::from_str(&text)?;
        params.validate()?;
        tracing::debug!("Loaded run parameters from {:?}", path);
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.dt.is_finite() && self.dt > 0.) {
            return invalid("dt", format!("must be positive and finite, got {}", self.dt));
        }
        if !(self.star_radius.is_finite() && self.star_radius > 0.) {
            return invalid(
                "star_radius",
                format!("must be positive and finite, got {}", self.star_radius),
            );
        }
        let radii = std::iter::once(&self.planet_radius).chain(self.planet_radii.values());
        for radius in radii {
            if !(radius.is_finite() && *radius >= 0.) {
                return invalid("planet_radius", format!("must be non-negative, got {radius}"));
            }
        }
        if self.planet_radii.contains_key(&0) {
            return invalid(
                "planet_radii",
                "index 0 is the star and cannot carry a planet radius".to_string(),
            );
        }
        if !(self.noise_std.is_finite() && self.noise_std >= 0.) {
            return invalid("noise_std", format!("must be non-negative, got {}", self.noise_std));
        }
        if !(self.threshold_sigma.is_finite() && self.threshold_sigma >= 0.) {
            return invalid(
                "threshold_sigma",
                format!("must be non-negative, got {}", self.threshold_sigma),
            );
        }
        let los_norm = self.line_of_sight.iter().map(|x| x * x).sum::<Float>().sqrt();
        if !(los_norm.is_finite() && los_norm > 0.) {
            return invalid(
                "line_of_sight",
                format!("must be a non-zero finite vector, got {:?}", self.line_of_sight),
            );
        }
        Ok(())
    }

    /// Radius of every planet (indices `1..body_count`).
    pub fn radii_for(&self, body_count: usize) -> BTreeMap<usize, Float> {
        (1..body_count)
            .map(|index| {
                let radius = self
                    .planet_radii
                    .get(&index)
                    .copied()
                    .unwrap_or(self.planet_radius);
                (index, radius)
            })
            .collect()
    }
}
