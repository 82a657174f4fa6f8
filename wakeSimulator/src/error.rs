use thiserror::Error;

/// Failures raised while configuring, running or post-processing a wind farm simulation.
#[derive(Debug, Clone, Error)]
pub enum SimulationError {
    #[error("Dimension mismatch for {what}: expected {expected}, got {got}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Wind direction {0} deg is not present in the selection source")]
    UnknownDirection(f64),

    #[error("Wind speed {0} m/s is not present in the selection source")]
    UnknownSpeed(f64),

    #[error("Empty {0} grid")]
    EmptyGrid(&'static str),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Optimization failed: {0}")]
    Optimization(String),
}

pub type SimResult<T> = Result<T, SimulationError>;
