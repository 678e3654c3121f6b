//! Classical orbital elements to Cartesian state vectors.
//!
//! The orbital-plane state is rotated into the inertial frame by
//! `R = R_z(raan) · R_x(i) · R_z(argp)`. Results are always 3-vectors.

use crate::error::{Result, SimulationError};
use crate::sim::units::{Float, PI};
use serde::{Deserialize, Serialize};

pub const KEPLER_MAX_ITERATIONS: usize = 100;
pub const KEPLER_TOLERANCE: Float = 1e-10;

/// Eccentricity at and above which Newton iteration starts from π.
const HIGH_ECCENTRICITY: Float = 0.8;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrbitalElementSet {
    /// Semi-major axis (m)
    pub a: Float,
    /// Eccentricity, in [0, 1)
    pub e: Float,
    /// Inclination (rad)
    pub i: Float,
    /// Right ascension of the ascending node (rad)
    pub raan: Float,
    /// Argument of periapsis (rad)
    pub argp: Float,
    /// Mean anomaly (rad)
    pub mean_anomaly: Float,
    /// Standard gravitational parameter (m³/s²)
    pub mu: Float,
}

impl OrbitalElementSet {
    pub fn new(
        a: Float,
        e: Float,
        i: Float,
        raan: Float,
        argp: Float,
        mean_anomaly: Float,
        mu: Float,
    ) -> Result<Self> {
        let elements = OrbitalElementSet {
            a,
            e,
            i,
            raan,
            argp,
            mean_anomaly,
            mu,
        };
        elements.validate()?;
        Ok(elements)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |field: &'static str, reason: String| {
            Err(SimulationError::InvalidElements { field, reason })
        };
        let fields = [
            ("a", self.a),
            ("e", self.e),
            ("i", self.i),
            ("raan", self.raan),
            ("argp", self.argp),
            ("mean_anomaly", self.mean_anomaly),
            ("mu", self.mu),
        ];
        if let Some(&(field, value)) = fields.iter().find(|(_, value)| !value.is_finite()) {
            return invalid(field, format!("must be finite, got {value}"));
        }
        if self.a <= 0. {
            return invalid("a", format!("semi-major axis must be positive, got {}", self.a));
        }
        if !(0. ..1.).contains(&self.e) {
            return invalid("e", format!("eccentricity must lie in [0, 1), got {}", self.e));
        }
        if self.mu <= 0. {
            return invalid("mu", format!("must be positive, got {}", self.mu));
        }
        Ok(())
    }

    pub fn period(&self) -> Float {
        2. * PI * (self.a.powi(3) / self.mu).sqrt()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeplerSolution {
    pub eccentric_anomaly: Float,
    pub iterations: usize,
    pub converged: bool,
}

/// Newton-Raphson solution of `M = E - e·sin(E)`, with convergence details.
pub fn solve_kepler_checked(
    mean_anomaly: Float,
    eccentricity: Float,
    tolerance: Float,
) -> KeplerSolution {
    let mut eccentric_anomaly = if eccentricity < HIGH_ECCENTRICITY {
        mean_anomaly
    } else {
        PI
    };
    for iteration in 1..=KEPLER_MAX_ITERATIONS {
        let f = eccentric_anomaly - eccentricity * eccentric_anomaly.sin() - mean_anomaly;
        let f_prime = 1. - eccentricity * eccentric_anomaly.cos();
        let correction = f / f_prime;
        eccentric_anomaly -= correction;
        if correction.abs() < tolerance {
            return KeplerSolution {
                eccentric_anomaly,
                iterations: iteration,
                converged: true,
            };
        }
    }
    KeplerSolution {
        eccentric_anomaly,
        iterations: KEPLER_MAX_ITERATIONS,
        converged: false,
    }
}

/// Eccentric anomaly for the given mean anomaly.
///
/// Never fails: if the iteration cap is hit, the last iterate is returned
/// and a warning is logged.
pub fn solve_kepler(mean_anomaly: Float, eccentricity: Float, tolerance: Float) -> Float {
    let solution = solve_kepler_checked(mean_anomaly, eccentricity, tolerance);
    if !solution.converged {
        tracing::warn!(
            mean_anomaly,
            eccentricity,
            tolerance,
            eccentric_anomaly = solution.eccentric_anomaly,
            "Kepler solver did not converge in {} iterations",
            KEPLER_MAX_ITERATIONS
        );
    }
    solution.eccentric_anomaly
}

type Matrix3 = [[Float; 3]; 3];

fn rotation_z(angle: Float) -> Matrix3 {
    let (sin, cos) = angle.sin_cos();
    [[cos, -sin, 0.], [sin, cos, 0.], [0., 0., 1.]]
}

fn rotation_x(angle: Float) -> Matrix3 {
    let (sin, cos) = angle.sin_cos();
    [[1., 0., 0.], [0., cos, -sin], [0., sin, cos]]
}

fn multiply(a: &Matrix3, b: &Matrix3) -> Matrix3 {
    let mut product = [[0.; 3]; 3];
    for row in 0..3 {
        for col in 0..3 {
            product[row][col] = (0..3).map(|k| a[row][k] * b[k][col]).sum::<Float>();
        }
    }
    product
}

fn apply(matrix: &Matrix3, vector: &[Float; 3]) -> [Float; 3] {
    let mut result = [0.; 3];
    for row in 0..3 {
        result[row] = (0..3).map(|k| matrix[row][k] * vector[k]).sum::<Float>();
    }
    result
}

/// Inertial-frame position and velocity of a body on the given orbit.
pub fn elements_to_state(elements: &OrbitalElementSet) -> Result<([Float; 3], [Float; 3])> {
    elements.validate()?;
    let OrbitalElementSet {
        a,
        e,
        i,
        raan,
        argp,
        mean_anomaly,
        mu,
    } = *elements;

    let eccentric_anomaly = solve_kepler(mean_anomaly, e, KEPLER_TOLERANCE);
    let (sin_e, cos_e) = eccentric_anomaly.sin_cos();

    let x = a * (cos_e - e);
    let y = a * (1. - e * e).sqrt() * sin_e;
    let r = x.hypot(y);

    let vx = -(mu * a).sqrt() / r * sin_e;
    let vy = (mu * a * (1. - e * e)).sqrt() / r * cos_e;

    let rotation = multiply(
        &multiply(&rotation_z(raan), &rotation_x(i)),
        &rotation_z(argp),
    );
    Ok((
        apply(&rotation, &[x, y, 0.]),
        apply(&rotation, &[vx, vy, 0.]),
    ))
}
