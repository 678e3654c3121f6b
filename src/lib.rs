//! N-body gravity engine with synthetic transit light curves.
//!
//! Bodies are advanced under Newtonian gravity by one of three fixed-step
//! schemes, orbits can be seeded from classical orbital elements, and the
//! resulting geometry is turned into a normalized flux series from which
//! discrete transit events are recovered.

pub mod error;
pub mod export;
pub mod sim;
pub mod transit;

pub use error::{Result, SimulationError};
pub use sim::body::Body;
pub use sim::force::{DirectGravity, ForceModel};
pub use sim::integrator::{Integrator, Scheme};
pub use sim::orbital_elements::{elements_to_state, solve_kepler, OrbitalElementSet};
pub use sim::system::BodySystem;
pub use sim::units::{Constants, Float};
pub use transit::detector::{detect, TransitEvent};
pub use transit::synthesizer::{synthesize, FluxSample, TransitSynthesizer};
