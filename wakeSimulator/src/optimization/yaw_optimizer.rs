//! Two-phase yaw optimisation for a single wind direction.
//!
//! Phase 1 walks the wind speeds in order and maximises farm power at each one, using the previous
//! speed's optimum as the next starting point. Phase 2 takes the whole phase-1 schedule as a warm
//! start and minimises the direction's LCoE jointly over every turbine and wind speed.

use argmin::core::{CostFunction, Executor, Gradient, State};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::LBFGS;
use tracing::{debug, info, warn};

use super::objectives::{LcoeObjective, PowerRatioObjective};
use crate::config::simulation_config::{CostAssumptions, OptimizerSettings};
use crate::core::simulation_result::SimulationResult;
use crate::core::tensor::YawTensor;
use crate::core::wind_farm_model::WindFarmModel;
use crate::error::{SimResult, SimulationError};
use crate::models::layout::Layout;
use crate::models::site::{coord_index, JointProbability, SectorFrequency};
use crate::utils::logging::{self, OperationCategory, OptimizationPhase};

/// Optimised yaw (deg) for one direction, both shaped (n_wt, 1, n_ws).
#[derive(Debug, Clone)]
pub struct DirectionYawSchedule {
    pub wd: f64,
    pub ws: Vec<f64>,
    /// Phase-1 result, maximising power speed by speed
    pub yaw_power: YawTensor,
    /// Phase-2 result, minimising direction LCoE
    pub yaw_lcoe: YawTensor,
}

/// Bounds passed to one L-BFGS run.
struct MinimizerBounds {
    max_iters: u64,
    tolerance_grad: f64,
    tolerance_cost: Option<f64>,
    memory: usize,
}

/// Accumulator of the phase-1 fold.
struct WarmStartChain {
    /// Normalised yaw carried to the next wind speed
    warm_start: Vec<f64>,
    /// Yaw in degrees per wind speed, one entry per turbine
    columns: Vec<Vec<f64>>,
}

impl WarmStartChain {
    fn new(n_wt: usize, n_ws: usize, settings: &OptimizerSettings) -> Self {
        Self {
            warm_start: vec![settings.initial_yaw_deg / settings.yaw_scale; n_wt],
            columns: Vec::with_capacity(n_ws),
        }
    }

    /// Below cut-in: zero yaw, warm start unchanged.
    fn idle(mut self) -> Self {
        self.columns.push(vec![0.0; self.warm_start.len()]);
        self
    }

    fn advance(mut self, optimum: Vec<f64>, yaw_scale: f64) -> Self {
        self.columns.push(optimum.iter().map(|y| y * yaw_scale).collect());
        self.warm_start = optimum;
        self
    }

    fn into_tensor(self) -> YawTensor {
        let n_wt = self.warm_start.len();
        let mut yaw = YawTensor::zeros((n_wt, 1, self.columns.len()));
        for (k, column) in self.columns.iter().enumerate() {
            for (i, value) in column.iter().enumerate() {
                yaw.set(i, 0, k, *value);
            }
        }
        yaw
    }
}

/// Run L-BFGS from `x0` and return the best parameter found.
///
/// Simulator errors raised inside the objective propagate. Any other minimiser failure, such as a
/// line search that cannot make progress, ends the run at the start point.
fn minimize<P>(problem: P, x0: Vec<f64>, bounds: &MinimizerBounds) -> SimResult<Vec<f64>>
where
    P: CostFunction<Param = Vec<f64>, Output = f64> + Gradient<Param = Vec<f64>, Gradient = Vec<f64>>,
{
    let linesearch: MoreThuenteLineSearch<Vec<f64>, Vec<f64>, f64> = MoreThuenteLineSearch::new();
    let mut solver: LBFGS<_, Vec<f64>, Vec<f64>, f64> = LBFGS::new(linesearch, bounds.memory)
        .with_tolerance_grad(bounds.tolerance_grad)
        .map_err(|e| SimulationError::Optimization(e.to_string()))?;
    if let Some(tolerance) = bounds.tolerance_cost {
        solver = solver
            .with_tolerance_cost(tolerance)
            .map_err(|e| SimulationError::Optimization(e.to_string()))?;
    }

    let start = x0.clone();
    let outcome = Executor::new(problem, solver)
        .configure(|state| state.param(start).max_iters(bounds.max_iters))
        .run();

    match outcome {
        Ok(result) => {
            let state = result.state();
            debug!(
                "minimiser stopped after {} iterations ({:?}), best cost {:.6}",
                state.get_iter(),
                state.get_termination_status(),
                state.get_best_cost()
            );
            Ok(state.get_best_param().cloned().unwrap_or(x0))
        }
        Err(err) => match err.downcast_ref::<SimulationError>() {
            Some(sim_err) => Err(sim_err.clone()),
            None => {
                warn!("minimiser stopped early: {}", err);
                Ok(x0)
            }
        },
    }
}

#[allow(clippy::too_many_arguments)]
pub fn optimise_direction(
    model: &dyn WindFarmModel,
    layout: &Layout,
    wd: f64,
    sim_res_base: &SimulationResult,
    sector_frequency: &SectorFrequency,
    probability: &JointProbability,
    lcoe_direction_base: f64,
    costs: &CostAssumptions,
    settings: &OptimizerSettings,
) -> SimResult<DirectionYawSchedule> {
    let _timing = logging::start_timing("optimise_direction",
        OperationCategory::Optimization { subcategory: OptimizationPhase::Direction });

    let ws = sim_res_base.ws.clone();
    let n_wt = sim_res_base.n_turbines();
    if ws.is_empty() {
        return Err(SimulationError::EmptyGrid("wind speeds"));
    }
    if layout.len() != n_wt {
        return Err(SimulationError::DimensionMismatch {
            what: "layout turbines",
            expected: n_wt,
            got: layout.len(),
        });
    }
    sim_res_base.wd_index(wd)?;

    let yaw_power = optimise_power_per_speed(model, layout, wd, sim_res_base, settings)?;
    let yaw_lcoe = optimise_lcoe(
        model,
        layout,
        wd,
        sim_res_base,
        sector_frequency,
        probability,
        lcoe_direction_base,
        costs,
        settings,
        &yaw_power,
    )?;

    Ok(DirectionYawSchedule { wd, ws, yaw_power, yaw_lcoe })
}

/// Phase 1: per-speed power maximisation chained by warm starts.
fn optimise_power_per_speed(
    model: &dyn WindFarmModel,
    layout: &Layout,
    wd: f64,
    sim_res_base: &SimulationResult,
    settings: &OptimizerSettings,
) -> SimResult<YawTensor> {
    let _timing = logging::start_timing("optimise_power_per_speed",
        OperationCategory::Optimization { subcategory: OptimizationPhase::PowerPerSpeed });
    info!("starting power based optimisation (wd = {})", wd);

    let ws = &sim_res_base.ws;
    let cut_in = sim_res_base
        .turbine
        .cut_in_speed(ws)
        .ok_or(SimulationError::EmptyGrid("wind speeds"))?;
    let bounds = MinimizerBounds {
        max_iters: settings.phase1_max_iters,
        tolerance_grad: settings.gradient_tolerance,
        tolerance_cost: None,
        memory: settings.lbfgs_memory,
    };

    let chain = ws.iter().try_fold(
        WarmStartChain::new(sim_res_base.n_turbines(), ws.len(), settings),
        |chain, &speed| -> SimResult<WarmStartChain> {
            if speed < cut_in {
                return Ok(chain.idle());
            }
            let baseline_power = sim_res_base.farm_power(wd, speed)?;
            if baseline_power <= 0.0 {
                debug!("ws = {}: no baseline power, keeping warm start", speed);
                let optimum = chain.warm_start.clone();
                return Ok(chain.advance(optimum, settings.yaw_scale));
            }
            let objective = PowerRatioObjective {
                model,
                layout,
                wd,
                ws: speed,
                baseline_power,
                yaw_scale: settings.yaw_scale,
                step: settings.finite_difference_step,
                n_cpu: settings.n_cpu,
            };
            let optimum = minimize(objective, chain.warm_start.clone(), &bounds)?;
            debug!("ws = {}: yaw = {:?}", speed, optimum.iter().map(|y| y * settings.yaw_scale).collect::<Vec<_>>());
            Ok(chain.advance(optimum, settings.yaw_scale))
        },
    )?;

    Ok(chain.into_tensor())
}

/// Phase 2: joint LCoE minimisation warm-started from the phase-1 schedule.
#[allow(clippy::too_many_arguments)]
fn optimise_lcoe(
    model: &dyn WindFarmModel,
    layout: &Layout,
    wd: f64,
    sim_res_base: &SimulationResult,
    sector_frequency: &SectorFrequency,
    probability: &JointProbability,
    lcoe_direction_base: f64,
    costs: &CostAssumptions,
    settings: &OptimizerSettings,
    yaw_power: &YawTensor,
) -> SimResult<YawTensor> {
    let _timing = logging::start_timing("optimise_lcoe",
        OperationCategory::Optimization { subcategory: OptimizationPhase::JointLcoe });
    info!("starting LCoE based optimisation (wd = {})", wd);

    let objective = LcoeObjective {
        model,
        layout,
        wd,
        ws: &sim_res_base.ws,
        sim_res_base,
        sector_frequency,
        probability,
        costs,
        lcoe_direction_base,
        yaw_shape: yaw_power.shape(),
        yaw_scale: settings.yaw_scale,
        step: settings.finite_difference_step,
        n_cpu: settings.n_cpu,
    };

    let bounds = MinimizerBounds {
        max_iters: settings.phase2_max_iters,
        tolerance_grad: settings.gradient_tolerance,
        tolerance_cost: Some(settings.phase2_tolerance),
        memory: settings.lbfgs_memory,
    };
    let best = minimize(objective, yaw_power.to_normalized(settings.yaw_scale), &bounds)?;
    YawTensor::from_normalized(yaw_power.shape(), &best, settings.yaw_scale)
}

/// Place per-direction schedules into full (n_wt, n_wd, n_ws) tensors over `wd`. Directions
/// without a schedule keep zero yaw.
pub fn merge_schedules(
    schedules: &[DirectionYawSchedule],
    n_wt: usize,
    wd: &[f64],
    ws: &[f64],
) -> SimResult<(YawTensor, YawTensor)> {
    let shape = (n_wt, wd.len(), ws.len());
    let mut yaw_power = YawTensor::zeros(shape);
    let mut yaw_lcoe = YawTensor::zeros(shape);
    for schedule in schedules {
        let l = coord_index(wd, schedule.wd)
            .ok_or(SimulationError::UnknownDirection(schedule.wd))?;
        let expected = (n_wt, 1, ws.len());
        if schedule.yaw_power.shape() != expected || schedule.yaw_lcoe.shape() != expected {
            return Err(SimulationError::DimensionMismatch {
                what: "yaw schedule",
                expected: n_wt * ws.len(),
                got: schedule.yaw_power.as_slice().len(),
            });
        }
        for i in 0..n_wt {
            for k in 0..ws.len() {
                yaw_power.set(i, l, k, schedule.yaw_power.get(i, 0, k));
                yaw_lcoe.set(i, l, k, schedule.yaw_lcoe.get(i, 0, k));
            }
        }
    }
    Ok((yaw_power, yaw_lcoe))
}
