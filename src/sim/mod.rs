pub mod body;
pub mod force;
pub mod initial_parameters;
pub mod integrator;
pub mod orbital_elements;
pub mod scenarios;
pub mod system;
pub mod units;
pub(crate) mod vector;
