use thiserror::Error;

/// Errors raised while configuring or exporting a simulation run.
///
/// Numerical trouble during stepping is never reported here: coincident
/// bodies are skipped by the force model and Kepler non-convergence is only
/// logged.
#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Unknown integration scheme '{0}' (expected euler, verlet or rk4)")]
    UnknownScheme(String),

    #[error("Unknown scenario '{0}'")]
    UnknownScenario(String),

    #[error("Invalid orbital element '{field}': {reason}")]
    InvalidElements { field: &'static str, reason: String },

    #[error("Invalid body collection: {0}")]
    InvalidBodies(String),

    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        parameter: &'static str,
        reason: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SimulationError {
    /// True for the error kinds that reject a run before any stepping.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownScheme(_)
                | Self::UnknownScenario(_)
                | Self::InvalidElements { .. }
                | Self::InvalidBodies(_)
                | Self::InvalidParameter { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SimulationError>;
