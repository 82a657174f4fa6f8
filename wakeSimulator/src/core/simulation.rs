use crate::config::constants::DEFAULT_N_CPU;
use crate::core::simulation_result::SimulationResult;
use crate::core::wind_farm_model::{SimulationRequest, WindFarmModel, YawInput};
use crate::error::SimResult;
use crate::models::layout::Layout;
use crate::utils::logging::{self, OperationCategory};

/// Run the wind farm model with zero tilt on a single core.
pub fn run_sim(
    model: &dyn WindFarmModel,
    layout: &Layout,
    yaw: YawInput,
    ws: &[f64],
    wd: &[f64],
) -> SimResult<SimulationResult> {
    run_sim_with_cpus(model, layout, yaw, ws, wd, DEFAULT_N_CPU)
}

pub fn run_sim_with_cpus(
    model: &dyn WindFarmModel,
    layout: &Layout,
    yaw: YawInput,
    ws: &[f64],
    wd: &[f64],
    n_cpu: usize,
) -> SimResult<SimulationResult> {
    let _timing = logging::start_timing("run_sim", OperationCategory::Simulation);

    let request = SimulationRequest {
        layout,
        tilt_deg: 0.0,
        yaw,
        n_cpu,
        ws,
        wd,
    };
    model.run(&request)
}
