use crate::sim::body::Body;
use crate::sim::units::Float;
use crate::sim::vector;

/// Computes the net force on every body of a body set.
///
/// Implementations must reset each accumulator before summing so that a
/// second call on an unchanged configuration reproduces the same forces.
/// Integrators only talk to this trait, so a tree code can replace
/// `DirectGravity` without touching them.
pub trait ForceModel {
    fn compute_forces(&self, bodies: &mut [Body], gravitational_constant: Float);
}

/// Direct pairwise Newtonian gravity, O(n²) in the body count.
///
/// Adequate for a handful to a few tens of bodies. Every ordered pair is
/// evaluated on its own; pairs at zero separation contribute nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct DirectGravity;

impl DirectGravity {
    /// Force exerted on `attracted` by `attracting`, `None` if they coincide.
    fn pair_force(
        attracted: &Body,
        attracting: &Body,
        gravitational_constant: Float,
    ) -> Option<Vec<Float>> {
        let r = vector::difference(&attracting.position, &attracted.position);
        let distance = vector::norm(&r);
        if distance == 0. {
            return None;
        }
        let magnitude =
            gravitational_constant * attracted.mass * attracting.mass / (distance * distance);
        Some(r.iter().map(|x| magnitude * x / distance).collect())
    }
}

impl ForceModel for DirectGravity {
    fn compute_forces(&self, bodies: &mut [Body], gravitational_constant: Float) {
        for body in bodies.iter_mut() {
            body.reset_force();
        }
        for i in 0..bodies.len() {
            for j in 0..bodies.len() {
                if i == j {
                    continue;
                }
                let pair = Self::pair_force(&bodies[i], &bodies[j], gravitational_constant);
                match pair {
                    Some(force) => {
                        for (total, f) in bodies[i].force.iter_mut().zip(force.iter()) {
                            *total += f;
                        }
                    }
                    None => tracing::trace!(i, j, "skipping coincident body pair"),
                }
            }
        }
    }
}
