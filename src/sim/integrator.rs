use crate::error::SimulationError;
use crate::sim::body::Body;
use crate::sim::force::{DirectGravity, ForceModel};
use crate::sim::system::BodySystem;
use crate::sim::units::Float;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed-step integration schemes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scheme {
    /// Semi-implicit Euler: the position update uses the advanced velocity.
    #[serde(rename = "euler", alias = "explicit")]
    Explicit,
    /// Kick-drift-kick velocity Verlet.
    #[serde(rename = "verlet", alias = "velocity_verlet")]
    VelocityVerlet,
    /// Classical four-stage Runge-Kutta.
    Rk4,
}

impl FromStr for Scheme {
    type Err = SimulationError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "euler" | "explicit" => Ok(Scheme::Explicit),
            "verlet" | "velocity_verlet" | "velocity-verlet" => Ok(Scheme::VelocityVerlet),
            "rk4" => Ok(Scheme::Rk4),
            _ => Err(SimulationError::UnknownScheme(name.to_string())),
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scheme::Explicit => "euler",
            Scheme::VelocityVerlet => "verlet",
            Scheme::Rk4 => "rk4",
        };
        f.write_str(name)
    }
}

/// Advances a `BodySystem` by fixed steps, using a `ForceModel` as the
/// force oracle.
#[derive(Clone, Debug)]
pub struct Integrator<F: ForceModel = DirectGravity> {
    scheme: Scheme,
    force_model: F,
}

impl Integrator<DirectGravity> {
    pub fn new(scheme: Scheme) -> Self {
        Self::with_force_model(scheme, DirectGravity)
    }

    pub fn from_name(scheme_name: &str) -> crate::error::Result<Self> {
        Ok(Self::new(scheme_name.parse()?))
    }
}

impl<F: ForceModel> Integrator<F> {
    pub fn with_force_model(scheme: Scheme, force_model: F) -> Self {
        Integrator {
            scheme,
            force_model,
        }
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Advances `system` by exactly one step of `dt`.
    ///
    /// Forces are always evaluated at the current configuration first.
    pub fn step(&self, system: &mut BodySystem, dt: Float) {
        system.compute_forces(&self.force_model);
        match self.scheme {
            Scheme::Explicit => Self::explicit_step(&mut system.bodies, dt),
            Scheme::VelocityVerlet => self.velocity_verlet_step(system, dt),
            Scheme::Rk4 => self.rk4_step(system, dt),
        }
        system.current_time += dt;
    }

    /// Takes `n_steps` steps and returns the final time.
    pub fn integrate(&self, system: &mut BodySystem, dt: Float, n_steps: usize) -> Float {
        for _ in 0..n_steps {
            self.step(system, dt);
        }
        system.current_time
    }

    fn explicit_step(bodies: &mut [Body], dt: Float) {
        for body in bodies.iter_mut() {
            for k in 0..body.position.len() {
                body.velocity[k] += body.force[k] / body.mass * dt;
                body.position[k] += body.velocity[k] * dt;
            }
        }
    }

    fn half_kick(bodies: &mut [Body], dt: Float) {
        for body in bodies.iter_mut() {
            for k in 0..body.velocity.len() {
                body.velocity[k] += 0.5 * body.force[k] / body.mass * dt;
            }
        }
    }

    fn velocity_verlet_step(&self, system: &mut BodySystem, dt: Float) {
        Self::half_kick(&mut system.bodies, dt);
        for body in system.bodies.iter_mut() {
            for k in 0..body.position.len() {
                body.position[k] += body.velocity[k] * dt;
            }
        }
        system.compute_forces(&self.force_model);
        Self::half_kick(&mut system.bodies, dt);
    }

    /// Accelerations of every body with positions replaced by `positions`.
    ///
    /// Works on `scratch`, a private copy of the system, so that every stage
    /// sees one consistent configuration.
    fn stage_accelerations(
        &self,
        scratch: &mut [Body],
        positions: &[Vec<Float>],
        gravitational_constant: Float,
    ) -> Vec<Vec<Float>> {
        for (body, position) in scratch.iter_mut().zip(positions.iter()) {
            body.position.copy_from_slice(position);
        }
        self.force_model.compute_forces(scratch, gravitational_constant);
        scratch.iter().map(Body::acceleration).collect()
    }

    fn rk4_step(&self, system: &mut BodySystem, dt: Float) {
        let g = system.gravitational_constant;
        let mut scratch = system.bodies.clone();
        let x0: Vec<Vec<Float>> = system.bodies.iter().map(|b| b.position.clone()).collect();
        let v0: Vec<Vec<Float>> = system.bodies.iter().map(|b| b.velocity.clone()).collect();

        let a1: Vec<Vec<Float>> = system.bodies.iter().map(Body::acceleration).collect();
        let k1_x = scaled(dt, &v0);
        let k1_v = scaled(dt, &a1);

        let x2 = offset(&x0, &k1_x, 0.5);
        let v2 = offset(&v0, &k1_v, 0.5);
        let k2_x = scaled(dt, &v2);
        let k2_v = scaled(dt, &self.stage_accelerations(&mut scratch, &x2, g));

        let x3 = offset(&x0, &k2_x, 0.5);
        let v3 = offset(&v0, &k2_v, 0.5);
        let k3_x = scaled(dt, &v3);
        let k3_v = scaled(dt, &self.stage_accelerations(&mut scratch, &x3, g));

        let x4 = offset(&x0, &k3_x, 1.);
        let v4 = offset(&v0, &k3_v, 1.);
        let k4_x = scaled(dt, &v4);
        let k4_v = scaled(dt, &self.stage_accelerations(&mut scratch, &x4, g));

        for (i, body) in system.bodies.iter_mut().enumerate() {
            for k in 0..body.position.len() {
                body.position[k] +=
                    (k1_x[i][k] + 2. * k2_x[i][k] + 2. * k3_x[i][k] + k4_x[i][k]) / 6.;
                body.velocity[k] +=
                    (k1_v[i][k] + 2. * k2_v[i][k] + 2. * k3_v[i][k] + k4_v[i][k]) / 6.;
            }
        }
    }
}

fn offset(base: &[Vec<Float>], delta: &[Vec<Float>], factor: Float) -> Vec<Vec<Float>> {
    base.iter()
        .zip(delta.iter())
        .map(|(b, d)| b.iter().zip(d.iter()).map(|(x, y)| x + factor * y).collect())
        .collect()
}

fn scaled(dt: Float, vectors: &[Vec<Float>]) -> Vec<Vec<Float>> {
    vectors
        .iter()
        .map(|v| v.iter().map(|x| x * dt).collect())
        .collect()
}
