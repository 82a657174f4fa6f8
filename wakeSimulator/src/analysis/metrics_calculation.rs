use serde::Serialize;

use super::aggregation::{aggregate_metrics, AggregatedMetrics};
use super::reporting::print_metrics_summary;
use crate::config::const_funcs::hours_per_julian_year;
use crate::config::constants::{HOURS_PER_YEAR, MWH_PER_GWH, WATTS_PER_GIGAWATT};
use crate::config::simulation_config::CostAssumptions;
use crate::core::simulation::run_sim_with_cpus;
use crate::core::simulation_result::SimulationResult;
use crate::core::tensor::{FarmTensor, TurbineDirectionGrid};
use crate::core::wind_farm_model::{WindFarmModel, YawInput};
use crate::error::SimResult;
use crate::models::layout::Layout;
use crate::models::site::{JointProbability, SectorFrequency};
use crate::utils::logging::{self, MetricsType, OperationCategory};

/// Per-turbine, per-direction economic metrics for one simulation result.
#[derive(Debug, Clone, Serialize)]
pub struct FarmMetrics {
    pub wd: Vec<f64>,
    /// Annual energy production after availability losses (GWh)
    pub aep: TurbineDirectionGrid,
    /// Levelized cost of energy (USD/MWh)
    pub lcoe: TurbineDirectionGrid,
    pub cap_fac: TurbineDirectionGrid,
    /// Sector frequency restricted to `wd`
    pub sector_frequency: SectorFrequency,
    pub tke_ratio: Vec<f64>,
    pub uptime: Vec<f64>,
}

impl FarmMetrics {
    pub fn aggregate(&self) -> SimResult<AggregatedMetrics> {
        aggregate_metrics(
            Some(&self.aep),
            Some(&self.lcoe),
            Some(&self.cap_fac),
            Some(&self.sector_frequency),
        )
    }

    pub fn total_aep(&self) -> f64 {
        self.aep.nansum()
    }
}

/// Probability-weighted turbulent kinetic energy proxy per turbine: sum of (TI_eff * ws)^2 * P.
pub fn turbulent_kinetic_energy(ti_eff: &FarmTensor, ws: &[f64], probability: &JointProbability) -> Vec<f64> {
    let (n_wt, n_wd, n_ws) = ti_eff.shape();
    (0..n_wt)
        .map(|i| {
            let mut total = 0.0;
            for l in 0..n_wd {
                for (k, speed) in ws.iter().enumerate().take(n_ws) {
                    let v = ti_eff.get(i, l, k) * speed;
                    total += v * v * probability.at(l, k);
                }
            }
            total
        })
        .collect()
}

pub fn calc_metrics(
    sim_res: &SimulationResult,
    sim_res_base: &SimulationResult,
    sector_frequency: &SectorFrequency,
    probability: &JointProbability,
    costs: &CostAssumptions,
    show: bool,
) -> SimResult<FarmMetrics> {
    let _timing = logging::start_timing("calc_metrics",
        OperationCategory::Metrics { subcategory: MetricsType::Calculation });

    let rated_power = sim_res.turbine.rated_power_gw();
    let base = sim_res_base.select_directions(&sim_res.wd)?;
    let freq = sector_frequency.select(&sim_res.wd)?;
    let prob = probability.select(&sim_res.wd, &sim_res.ws)?;
    let prob_base = probability.select(&base.wd, &base.ws)?;
    let (n_wt, n_wd, n_ws) = sim_res.power.shape();

    // Turbulence-driven availability
    let tke = turbulent_kinetic_energy(&sim_res.ti_eff, &sim_res.ws, &prob);
    let tke_base = turbulent_kinetic_energy(&base.ti_eff, &base.ws, &prob_base);
    let tke_ratio: Vec<f64> = tke.iter().zip(&tke_base).map(|(t, b)| t / b).collect();
    let uptime: Vec<f64> = tke_ratio.iter().map(|r| 1.0 - costs.downtime * r).collect();

    let aep = TurbineDirectionGrid::from_fn(n_wt, n_wd, |i, l| {
        let expected_power: f64 = (0..n_ws).map(|k| sim_res.power.get(i, l, k) * prob.at(l, k)).sum();
        expected_power * HOURS_PER_YEAR / WATTS_PER_GIGAWATT * uptime[i]
    });

    let weights = freq.weights();
    let fixed_cost_rate = costs.fixed_cost_per_gw_year() * rated_power;
    let lcoe = TurbineDirectionGrid::from_fn(n_wt, n_wd, |i, l| {
        let fixed_cost = fixed_cost_rate * weights[l];
        let variable_cost = costs.opex_var_per_gwh * aep.get(i, l);
        (fixed_cost + variable_cost) / (aep.get(i, l) * MWH_PER_GWH)
    });
    let cap_fac = TurbineDirectionGrid::from_fn(n_wt, n_wd, |i, l| {
        aep.get(i, l) / (weights[l] * rated_power * hours_per_julian_year())
    });

    let metrics = FarmMetrics {
        wd: sim_res.wd.clone(),
        aep,
        lcoe,
        cap_fac,
        sector_frequency: freq,
        tke_ratio,
        uptime,
    };

    if show {
        let aggregated = metrics.aggregate()?;
        print_metrics_summary(&metrics, &aggregated);
    }

    Ok(metrics)
}

#[allow(clippy::too_many_arguments)]
pub fn run_sim_and_calculate_metrics(
    sim_res_base: &SimulationResult,
    sector_frequency: &SectorFrequency,
    probability: &JointProbability,
    costs: &CostAssumptions,
    model: &dyn WindFarmModel,
    layout: &Layout,
    yaw: YawInput,
    ws: &[f64],
    wd: &[f64],
    n_cpu: usize,
    show: bool,
) -> SimResult<FarmMetrics> {
    let sim_res = run_sim_with_cpus(model, layout, yaw, ws, wd, n_cpu)?;
    calc_metrics(&sim_res, sim_res_base, sector_frequency, probability, costs, show)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::simulation::run_sim;
    use crate::core::wind_farm_model::{EngineeringWindFarmModel, ModelFidelity};
    use crate::config::const_funcs::default_wind_speeds;

    fn row_layout() -> Layout {
        Layout::new(vec![0.0, 560.0, 1120.0], vec![0.0, 0.0, 0.0]).unwrap()
    }

    #[test]
    fn same_run_as_baseline_gives_unit_tke_ratio() {
        let model = EngineeringWindFarmModel::from_fidelity(ModelFidelity::Low).unwrap();
        let layout = row_layout();
        let ws = default_wind_speeds();
        let wd = vec![0.0, 90.0, 180.0, 270.0];
        let freq = model.site().sector_frequency(&wd).unwrap();
        let prob = model.site().probability(&wd, &ws).unwrap();
        let base = run_sim(&model, &layout, YawInput::Uniform(0.0), &ws, &wd).unwrap();
        let costs = CostAssumptions::default();

        let metrics = calc_metrics(&base, &base, &freq, &prob, &costs, false).unwrap();
        for (ratio, uptime) in metrics.tke_ratio.iter().zip(&metrics.uptime) {
            assert!((ratio - 1.0).abs() < 1e-12);
            assert!((uptime - (1.0 - costs.downtime)).abs() < 1e-12);
        }
    }

    #[test]
    fn subset_result_is_sliced_against_full_baseline() {
        let model = EngineeringWindFarmModel::from_fidelity(ModelFidelity::Low).unwrap();
        let layout = row_layout();
        let ws = default_wind_speeds();
        let wd = vec![0.0, 90.0, 180.0, 270.0];
        let freq = model.site().sector_frequency(&wd).unwrap();
        let prob = model.site().probability(&wd, &ws).unwrap();
        let base = run_sim(&model, &layout, YawInput::Uniform(0.0), &ws, &wd).unwrap();
        let single = run_sim(&model, &layout, YawInput::Uniform(0.0), &ws, &[270.0]).unwrap();
        let costs = CostAssumptions::default();

        let full = calc_metrics(&base, &base, &freq, &prob, &costs, false).unwrap();
        let sub = calc_metrics(&single, &base, &freq, &prob, &costs, false).unwrap();
        assert_eq!(sub.wd, vec![270.0]);
        assert_eq!(sub.sector_frequency.weights(), &[freq.get(270.0).unwrap()]);
        for i in 0..3 {
            assert!((sub.aep.get(i, 0) - full.aep.get(i, 3)).abs() < 1e-9);
            assert!((sub.lcoe.get(i, 0) - full.lcoe.get(i, 3)).abs() < 1e-9);
        }
    }

    #[test]
    fn lcoe_matches_cost_formula() {
        let model = EngineeringWindFarmModel::from_fidelity(ModelFidelity::Lossless).unwrap();
        let layout = row_layout();
        let ws = default_wind_speeds();
        let wd = vec![90.0, 270.0];
        let freq = model.site().sector_frequency(&wd).unwrap();
        let prob = model.site().probability(&wd, &ws).unwrap();
        let base = run_sim(&model, &layout, YawInput::Uniform(0.0), &ws, &wd).unwrap();
        let costs = CostAssumptions::default();
        let metrics = calc_metrics(&base, &base, &freq, &prob, &costs, false).unwrap();

        let rated = model.turbine().rated_power_gw();
        let aep = metrics.aep.get(0, 1);
        let fixed = (costs.opex_fixed_per_gw_year + costs.capex_per_gw / costs.lifespan_years) * rated * freq.weights()[1];
        let expected = (fixed + costs.opex_var_per_gwh * aep) / (aep * 1000.0);
        assert!((metrics.lcoe.get(0, 1) - expected).abs() < 1e-9 * expected);
    }

    #[test]
    fn parallel_run_and_metrics_matches_serial_metrics() {
        let model = EngineeringWindFarmModel::from_fidelity(ModelFidelity::Low).unwrap();
        let layout = row_layout();
        let ws = vec![6.0, 8.0, 10.0];
        let wd = vec![90.0, 270.0];
        let freq = model.site().sector_frequency(&wd).unwrap();
        let prob = model.site().probability(&wd, &ws).unwrap();
        let costs = CostAssumptions::default();
        let base = run_sim(&model, &layout, YawInput::Uniform(0.0), &ws, &wd).unwrap();

        let serial = calc_metrics(&base, &base, &freq, &prob, &costs, false).unwrap();
        let parallel = run_sim_and_calculate_metrics(
            &base, &freq, &prob, &costs, &model, &layout, YawInput::Uniform(0.0), &ws, &wd, 2, false,
        )
        .unwrap();
        for i in 0..3 {
            for l in 0..2 {
                assert!((serial.aep.get(i, l) - parallel.aep.get(i, l)).abs() < 1e-12);
                assert!((serial.lcoe.get(i, l) - parallel.lcoe.get(i, l)).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn unknown_direction_is_an_error() {
        let model = EngineeringWindFarmModel::from_fidelity(ModelFidelity::Lossless).unwrap();
        let layout = row_layout();
        let ws = vec![8.0];
        let base = run_sim(&model, &layout, YawInput::Uniform(0.0), &ws, &[0.0]).unwrap();
        let other = run_sim(&model, &layout, YawInput::Uniform(0.0), &ws, &[45.0]).unwrap();
        let freq = model.site().sector_frequency(&[0.0, 45.0]).unwrap();
        let prob = model.site().probability(&[0.0, 45.0], &ws).unwrap();
        assert!(calc_metrics(&other, &base, &freq, &prob, &CostAssumptions::default(), false).is_err());
    }
}
