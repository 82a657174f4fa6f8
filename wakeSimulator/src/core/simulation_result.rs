use std::sync::Arc;

use crate::config::constants::{HOURS_PER_YEAR, WATTS_PER_GIGAWATT};
use crate::core::tensor::FarmTensor;
use crate::error::{SimResult, SimulationError};
use crate::models::layout::Layout;
use crate::models::site::{coord_index, JointProbability};
use crate::models::turbine::WindTurbine;

/// Output of one wind farm simulation over (turbine, wind direction, wind speed).
#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub layout: Layout,
    /// Free-stream wind directions (deg)
    pub wd: Vec<f64>,
    /// Free-stream wind speeds (m/s)
    pub ws: Vec<f64>,
    pub power: FarmTensor,
    pub ws_eff: FarmTensor,
    pub ti_eff: FarmTensor,
    pub ct: FarmTensor,
    pub yaw: FarmTensor,
    /// Occurrence probability of each (wd, ws) flow case
    pub probability: JointProbability,
    pub turbine: Arc<WindTurbine>,
}

impl SimulationResult {
    pub fn n_turbines(&self) -> usize {
        self.layout.len()
    }

    pub fn wd_index(&self, wd: f64) -> SimResult<usize> {
        coord_index(&self.wd, wd).ok_or(SimulationError::UnknownDirection(wd))
    }

    pub fn ws_index(&self, ws: f64) -> SimResult<usize> {
        coord_index(&self.ws, ws).ok_or(SimulationError::UnknownSpeed(ws))
    }

    /// Farm power (W) for one flow case, summed over turbines.
    pub fn farm_power(&self, wd: f64, ws: f64) -> SimResult<f64> {
        let l = self.wd_index(wd)?;
        let k = self.ws_index(ws)?;
        Ok((0..self.n_turbines()).map(|i| self.power.get(i, l, k)).sum())
    }

    /// Restrict to the given directions, in the given order.
    pub fn select_directions(&self, wd: &[f64]) -> SimResult<Self> {
        let idx = wd
            .iter()
            .map(|&d| self.wd_index(d))
            .collect::<SimResult<Vec<_>>>()?;
        Ok(Self {
            layout: self.layout.clone(),
            wd: wd.to_vec(),
            ws: self.ws.clone(),
            power: self.power.select_directions(&idx),
            ws_eff: self.ws_eff.select_directions(&idx),
            ti_eff: self.ti_eff.select_directions(&idx),
            ct: self.ct.select_directions(&idx),
            yaw: self.yaw.select_directions(&idx),
            probability: self.probability.select_directions(wd)?,
            turbine: Arc::clone(&self.turbine),
        })
    }

    /// Annual energy production (GWh) per turbine, without any availability penalty.
    pub fn aep_per_turbine_gwh(&self) -> Vec<f64> {
        let (n_wt, n_wd, n_ws) = self.power.shape();
        (0..n_wt)
            .map(|i| {
                let mut energy = 0.0;
                for l in 0..n_wd {
                    for k in 0..n_ws {
                        energy += self.power.get(i, l, k) * self.probability.at(l, k);
                    }
                }
                energy * HOURS_PER_YEAR / WATTS_PER_GIGAWATT
            })
            .collect()
    }

    /// Total annual energy production (GWh) of the farm, without any availability penalty.
    pub fn aep_gwh(&self) -> f64 {
        self.aep_per_turbine_gwh().iter().sum()
    }
}
