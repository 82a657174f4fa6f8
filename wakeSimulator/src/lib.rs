// Module declarations for the wake steering simulator

pub mod error;

// Simulation driving and result containers
pub mod core {
    pub mod tensor;
    pub mod simulation_result;
    pub mod wind_farm_model;
    pub mod simulation;
}

// Configuration modules
pub mod config {
    pub mod constants;
    pub mod const_funcs;
    pub mod simulation_config;
}

// Turbine, site, layout and wake building blocks
pub mod models {
    pub mod turbine;
    pub mod site;
    pub mod layout;
    pub mod wake;
}

// Metrics and reporting
pub mod analysis {
    pub mod metrics_calculation;
    pub mod aggregation;
    pub mod reporting;
}

// Yaw optimisation
pub mod optimization {
    pub mod objectives;
    pub mod yaw_optimizer;
}

// Utility functions
pub mod utils {
    pub mod logging;
    pub mod csv_export;
}

// CLI interface
pub mod cli {
    pub mod cli;
}

// Re-export commonly used items
pub use crate::core::simulation::run_sim;
pub use crate::core::wind_farm_model::{EngineeringWindFarmModel, ModelFidelity, WindFarmModel, YawInput};
pub use crate::error::{SimResult, SimulationError};
pub use crate::optimization::yaw_optimizer::optimise_direction;
