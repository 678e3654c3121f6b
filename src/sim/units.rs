use serde::{Deserialize, Serialize};

pub type Float = f64;
pub const PI: Float = std::f64::consts::PI;

//SI units throughout: meters, kilograms, seconds.
pub const G: Float = 6.67430e-11;
pub const AU: Float = 1.495978707e11;
pub const DAY: Float = 60. * 60. * 24.;

pub const SUN_MASS: Float = 1.989e30;
pub const EARTH_MASS: Float = 5.972e24;
pub const MARS_MASS: Float = 6.4171e23;

pub const SUN_RADIUS: Float = 6.957e8;
pub const EARTH_RADIUS: Float = 6.371e6;

/// Physical constants of one simulation run.
///
/// Passed explicitly into constructors so that runs with different unit
/// systems (e.g. `G = 1` test units) can coexist.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constants {
    pub gravitational_constant: Float,
    pub astronomical_unit: Float,
    pub day: Float,
    pub sun_mass: Float,
    pub earth_mass: Float,
    pub mars_mass: Float,
    pub sun_radius: Float,
    pub earth_radius: Float,
}

impl Default for Constants {
    fn default() -> Self {
        Self {
            gravitational_constant: G,
            astronomical_unit: AU,
            day: DAY,
            sun_mass: SUN_MASS,
            earth_mass: EARTH_MASS,
            mars_mass: MARS_MASS,
            sun_radius: SUN_RADIUS,
            earth_radius: EARTH_RADIUS,
        }
    }
}

impl Constants {
    /// Circular orbital speed around `central_mass` at distance `radius`.
    pub fn circular_velocity(&self, central_mass: Float, radius: Float) -> Float {
        (self.gravitational_constant * central_mass / radius).sqrt()
    }

    pub fn orbital_period(&self, central_mass: Float, semi_major_axis: Float) -> Float {
        2. * PI * (semi_major_axis.powi(3) / (self.gravitational_constant * central_mass)).sqrt()
    }
}
