//! Objective functions for the yaw optimiser.
//!
//! Each objective is a plain parameter struct holding everything the simulator call needs, so the
//! minimiser sees a pure function of the normalised yaw vector. Gradients are forward differences,
//! one extra simulation per variable.

use argmin::core::{CostFunction, Error, Gradient};

use crate::analysis::aggregation::aggregate_metrics;
use crate::analysis::metrics_calculation::calc_metrics;
use crate::config::simulation_config::CostAssumptions;
use crate::core::simulation::run_sim_with_cpus;
use crate::core::simulation_result::SimulationResult;
use crate::core::tensor::YawTensor;
use crate::core::wind_farm_model::{WindFarmModel, YawInput};
use crate::error::SimulationError;
use crate::models::layout::Layout;
use crate::models::site::{JointProbability, SectorFrequency};

/// Forward-difference gradient of a scalar cost.
pub fn forward_difference<C>(problem: &C, x: &[f64], step: f64) -> Result<Vec<f64>, Error>
where
    C: CostFunction<Param = Vec<f64>, Output = f64>,
{
    let f0 = problem.cost(&x.to_vec())?;
    (0..x.len())
        .map(|i| {
            let mut shifted = x.to_vec();
            shifted[i] += step;
            Ok((problem.cost(&shifted)? - f0) / step)
        })
        .collect()
}

/// Negative farm power ratio at a single (wd, ws) flow case, yaw given per turbine.
pub struct PowerRatioObjective<'a> {
    pub model: &'a dyn WindFarmModel,
    pub layout: &'a Layout,
    pub wd: f64,
    pub ws: f64,
    /// Farm power (W) of the unyawed baseline at this flow case
    pub baseline_power: f64,
    pub yaw_scale: f64,
    pub step: f64,
    pub n_cpu: usize,
}

impl CostFunction for PowerRatioObjective<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, yaw_norm: &Self::Param) -> Result<Self::Output, Error> {
        let yaw = yaw_norm.iter().map(|y| y * self.yaw_scale).collect();
        let sim_res = run_sim_with_cpus(
            self.model,
            self.layout,
            YawInput::PerTurbine(yaw),
            &[self.ws],
            &[self.wd],
            self.n_cpu,
        )?;
        let power = sim_res.farm_power(self.wd, self.ws)?;
        Ok(-(power / self.baseline_power))
    }
}

impl Gradient for PowerRatioObjective<'_> {
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    fn gradient(&self, yaw_norm: &Self::Param) -> Result<Self::Gradient, Error> {
        forward_difference(self, yaw_norm, self.step)
    }
}

/// Direction-level LCoE relative to a baseline, over the joint (turbine, 1, wind speed) yaw tensor.
pub struct LcoeObjective<'a> {
    pub model: &'a dyn WindFarmModel,
    pub layout: &'a Layout,
    pub wd: f64,
    pub ws: &'a [f64],
    pub sim_res_base: &'a SimulationResult,
    pub sector_frequency: &'a SectorFrequency,
    pub probability: &'a JointProbability,
    pub costs: &'a CostAssumptions,
    pub lcoe_direction_base: f64,
    pub yaw_shape: (usize, usize, usize),
    pub yaw_scale: f64,
    pub step: f64,
    pub n_cpu: usize,
}

impl LcoeObjective<'_> {
    /// Farm LCoE (USD/MWh) for the given normalised yaw vector.
    pub fn lcoe(&self, yaw_norm: &[f64]) -> Result<f64, SimulationError> {
        let yaw = YawTensor::from_normalized(self.yaw_shape, yaw_norm, self.yaw_scale)?;
        let sim_res = run_sim_with_cpus(self.model, self.layout, YawInput::Full(yaw), self.ws, &[self.wd], self.n_cpu)?;
        let metrics = calc_metrics(
            &sim_res,
            self.sim_res_base,
            self.sector_frequency,
            self.probability,
            self.costs,
            false,
        )?;
        let aggregated = aggregate_metrics(Some(&metrics.aep), Some(&metrics.lcoe), None, Some(&metrics.sector_frequency))?;
        aggregated
            .lcoe_overall
            .ok_or_else(|| SimulationError::Optimization("LCoE aggregate missing".to_string()))
    }
}

impl CostFunction for LcoeObjective<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, yaw_norm: &Self::Param) -> Result<Self::Output, Error> {
        Ok(self.lcoe(yaw_norm)? / self.lcoe_direction_base)
    }
}

impl Gradient for LcoeObjective<'_> {
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    fn gradient(&self, yaw_norm: &Self::Param) -> Result<Self::Gradient, Error> {
        forward_difference(self, yaw_norm, self.step)
    }
}
