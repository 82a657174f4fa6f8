use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use wake_steering::analysis::aggregation::aggregate_metrics;
use wake_steering::analysis::metrics_calculation::calc_metrics;
use wake_steering::config::const_funcs::{default_wind_directions, default_wind_speeds};
use wake_steering::config::constants::{HOURS_PER_YEAR, WATTS_PER_GIGAWATT};
use wake_steering::config::simulation_config::CostAssumptions;
use wake_steering::core::tensor::TurbineDirectionGrid;
use wake_steering::models::layout::Layout;
use wake_steering::models::site::{JointProbability, SectorFrequency};
use wake_steering::{run_sim, EngineeringWindFarmModel, ModelFidelity, WindFarmModel, YawInput};

#[test]
fn lossless_capacity_factor_at_rated_power_is_bounded() {
    let model = EngineeringWindFarmModel::from_fidelity(ModelFidelity::Lossless).unwrap();
    let layout = Layout::hornsrev(2, 2).unwrap();
    let wd = vec![0.0, 90.0, 180.0, 270.0];
    // First speed where the V80 reaches its 2 MW rating
    let ws = vec![17.0];
    assert_eq!(model.turbine().power(17.0), 2_000_000.0);
    let sim_res = run_sim(&model, &layout, YawInput::Uniform(0.0), &ws, &wd).unwrap();
    let costs = CostAssumptions::default();

    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..20 {
        let weights: Vec<f64> = (0..wd.len()).map(|_| rng.gen_range(0.01..1.0)).collect();
        let freq = SectorFrequency::new(wd.clone(), weights.clone()).unwrap();
        let prob = JointProbability::new(wd.clone(), ws.clone(), weights).unwrap();

        let metrics = calc_metrics(&sim_res, &sim_res, &freq, &prob, &costs, false).unwrap();
        for value in metrics.cap_fac.as_slice() {
            assert!(*value >= 0.0 && *value <= 1.0, "capacity factor {}", value);
        }
        let overall = metrics.aggregate().unwrap().cap_fac_overall.unwrap();
        assert!((0.0..=1.0).contains(&overall));
        // Only the availability loss and the Julian year separate it from 1
        let expected = (1.0 - costs.downtime) * 8760.0 / 8766.0;
        assert!((overall - expected).abs() < 1e-9);
    }
}

#[test]
fn two_direction_lcoe_is_energy_weighted() {
    let aep = TurbineDirectionGrid::from_vec(2, 2, vec![10.0, 20.0, 30.0, 5.0]).unwrap();
    let lcoe = TurbineDirectionGrid::from_vec(2, 2, vec![40.0, 60.0, 50.0, 80.0]).unwrap();
    let agg = aggregate_metrics(Some(&aep), Some(&lcoe), None, None).unwrap();

    let expected = (40.0 * 10.0 + 60.0 * 20.0 + 50.0 * 30.0 + 80.0 * 5.0) / (10.0 + 20.0 + 30.0 + 5.0);
    assert!((agg.lcoe_overall.unwrap() - expected).abs() < 1e-9);
    let direction = agg.lcoe_direction.unwrap();
    assert!((direction[0] - (40.0 * 10.0 + 50.0 * 30.0) / 40.0).abs() < 1e-9);
    assert!((direction[1] - (60.0 * 20.0 + 80.0 * 5.0) / 25.0).abs() < 1e-9);
}

#[test]
fn lossless_aep_has_no_uptime_penalty() {
    let model = EngineeringWindFarmModel::from_fidelity(ModelFidelity::Lossless).unwrap();
    let layout = Layout::hornsrev(3, 3).unwrap();
    let ws = default_wind_speeds();
    let wd = default_wind_directions();
    let sim_res = run_sim(&model, &layout, YawInput::Uniform(0.0), &ws, &wd).unwrap();
    let prob = model.site().probability(&wd, &ws).unwrap();

    let mut naive = 0.0;
    for l in 0..wd.len() {
        for (k, speed) in ws.iter().enumerate() {
            naive += model.turbine().power(*speed) * prob.at(l, k);
        }
    }
    naive *= layout.len() as f64 * HOURS_PER_YEAR / WATTS_PER_GIGAWATT;

    let aep = sim_res.aep_gwh();
    assert!((aep - naive).abs() < 1e-9 * naive);

    // calc_metrics applies the availability loss on top
    let freq = model.site().sector_frequency(&wd).unwrap();
    let costs = CostAssumptions::default();
    let metrics = calc_metrics(&sim_res, &sim_res, &freq, &prob, &costs, false).unwrap();
    assert!((metrics.total_aep() - aep * (1.0 - costs.downtime)).abs() < 1e-9 * aep);
}

#[test]
fn wakes_lower_aep_and_uptime() {
    let layout = Layout::hornsrev(3, 3).unwrap();
    let ws = default_wind_speeds();
    let wd = default_wind_directions();
    let lossless = EngineeringWindFarmModel::from_fidelity(ModelFidelity::Lossless).unwrap();
    let low = EngineeringWindFarmModel::from_fidelity(ModelFidelity::Low).unwrap();

    let base = run_sim(&lossless, &layout, YawInput::Uniform(0.0), &ws, &wd).unwrap();
    let waked = run_sim(&low, &layout, YawInput::Uniform(0.0), &ws, &wd).unwrap();
    assert!(waked.aep_gwh() < base.aep_gwh());

    let freq = low.site().sector_frequency(&wd).unwrap();
    let prob = low.site().probability(&wd, &ws).unwrap();
    let metrics = calc_metrics(&waked, &base, &freq, &prob, &CostAssumptions::default(), false).unwrap();
    assert!(metrics.tke_ratio.iter().all(|r| *r >= 1.0 - 1e-12));
    assert!(metrics.tke_ratio.iter().any(|r| *r > 1.0));
}
