use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::const_funcs;
use crate::config::constants::*;
use crate::error::{SimResult, SimulationError};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CostAssumptions {
    pub capex_per_gw: f64,            // USD per GW installed
    pub opex_fixed_per_gw_year: f64,  // USD per GW-year
    pub opex_var_per_gwh: f64,        // USD per GWh produced
    pub lifespan_years: f64,
    pub downtime: f64,                // fraction of the year, scaled by the TKE ratio
}

impl Default for CostAssumptions {
    fn default() -> Self {
        Self {
            capex_per_gw: const_funcs::capex_per_gw(),
            opex_fixed_per_gw_year: const_funcs::opex_fixed_per_gw_year(),
            opex_var_per_gwh: const_funcs::opex_var_per_gwh(),
            lifespan_years: LIFESPAN_YEARS,
            downtime: DOWNTIME,
        }
    }
}

impl CostAssumptions {
    /// Annualised fixed cost per GW: fixed OPEX plus straight-line CAPEX recovery.
    pub fn fixed_cost_per_gw_year(&self) -> f64 {
        self.opex_fixed_per_gw_year + self.capex_per_gw / self.lifespan_years
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.lifespan_years <= 0.0 {
            return Err(SimulationError::InvalidConfig(format!(
                "lifespan_years must be positive, got {}",
                self.lifespan_years
            )));
        }
        if !(0.0..1.0).contains(&self.downtime) {
            return Err(SimulationError::InvalidConfig(format!(
                "downtime must be in [0, 1), got {}",
                self.downtime
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerSettings {
    pub yaw_scale: f64,
    pub initial_yaw_deg: f64,
    pub phase1_max_iters: u64,
    pub phase2_max_iters: u64,
    pub phase2_tolerance: f64,
    pub gradient_tolerance: f64,
    pub finite_difference_step: f64,
    pub lbfgs_memory: usize,
    /// Parallelism hint for every simulator call made while optimising
    pub n_cpu: usize,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            yaw_scale: YAW_SCALE,
            initial_yaw_deg: INITIAL_YAW_DEG,
            phase1_max_iters: PHASE1_MAX_ITERS,
            phase2_max_iters: PHASE2_MAX_ITERS,
            phase2_tolerance: PHASE2_TOLERANCE,
            gradient_tolerance: GRADIENT_TOLERANCE,
            finite_difference_step: f64::EPSILON.sqrt(),
            lbfgs_memory: LBFGS_MEMORY,
            n_cpu: DEFAULT_N_CPU,
        }
    }
}

impl OptimizerSettings {
    pub fn validate(&self) -> SimResult<()> {
        if self.yaw_scale <= 0.0 {
            return Err(SimulationError::InvalidConfig("yaw_scale must be positive".to_string()));
        }
        if self.finite_difference_step <= 0.0 {
            return Err(SimulationError::InvalidConfig(
                "finite_difference_step must be positive".to_string(),
            ));
        }
        if self.lbfgs_memory == 0 {
            return Err(SimulationError::InvalidConfig("lbfgs_memory must be at least 1".to_string()));
        }
        if self.n_cpu == 0 {
            return Err(SimulationError::InvalidConfig("n_cpu must be at least 1".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub costs: CostAssumptions,
    pub optimizer: OptimizerSettings,
}

impl RunConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SimResult<()> {
        self.costs.validate()?;
        self.optimizer.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: RunConfig =
            serde_json::from_str(r#"{ "costs": { "downtime": 0.05 } }"#).unwrap();
        assert_eq!(config.costs.downtime, 0.05);
        assert_eq!(config.costs.lifespan_years, LIFESPAN_YEARS);
        assert_eq!(config.optimizer.yaw_scale, YAW_SCALE);
        assert_eq!(config.optimizer.n_cpu, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_zero_cpus() {
        let mut config = RunConfig::default();
        config.optimizer.n_cpu = 0;
        assert!(matches!(config.validate(), Err(SimulationError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_invalid_downtime() {
        let mut config = RunConfig::default();
        config.costs.downtime = 1.5;
        assert!(matches!(config.validate(), Err(SimulationError::InvalidConfig(_))));
    }

    #[test]
    fn load_reads_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(&path, r#"{ "optimizer": { "phase2_max_iters": 5 } }"#).unwrap();
        let config = RunConfig::load(&path).unwrap();
        assert_eq!(config.optimizer.phase2_max_iters, 5);
    }
}
