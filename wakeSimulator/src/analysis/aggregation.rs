use serde::Serialize;

use crate::config::constants::MWH_PER_GWH;
use crate::core::tensor::{nansum, TurbineDirectionGrid};
use crate::error::{SimResult, SimulationError};
use crate::models::site::SectorFrequency;
use crate::utils::logging::{self, MetricsType, OperationCategory};

/// Direction-level and farm-level collapses of per-turbine metrics. A field is `None` when the
/// inputs it depends on were not supplied.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregatedMetrics {
    pub lcoe_direction: Option<Vec<f64>>,
    pub cap_fac_direction: Option<Vec<f64>>,
    pub lcoe_overall: Option<f64>,
    pub cap_fac_overall: Option<f64>,
}

pub fn aggregate_metrics(
    aep: Option<&TurbineDirectionGrid>,
    lcoe: Option<&TurbineDirectionGrid>,
    cap_fac: Option<&TurbineDirectionGrid>,
    sector_frequency: Option<&SectorFrequency>,
) -> SimResult<AggregatedMetrics> {
    let _timing = logging::start_timing("aggregate_metrics",
        OperationCategory::Metrics { subcategory: MetricsType::Aggregation });

    let (lcoe_direction, lcoe_overall) = match (aep, lcoe) {
        (Some(aep), Some(lcoe)) => {
            let (direction, overall) = energy_weighted_lcoe(aep, lcoe)?;
            (Some(direction), Some(overall))
        }
        _ => (None, None),
    };

    let (cap_fac_direction, cap_fac_overall) = match (cap_fac, sector_frequency) {
        (Some(cap_fac), Some(freq)) => {
            let (direction, overall) = frequency_weighted_mean(cap_fac, freq)?;
            (Some(direction), Some(overall))
        }
        _ => (None, None),
    };

    Ok(AggregatedMetrics {
        lcoe_direction,
        cap_fac_direction,
        lcoe_overall,
        cap_fac_overall,
    })
}

/// LCoE weighted by the energy each turbine delivers, per direction and over the whole farm.
fn energy_weighted_lcoe(aep: &TurbineDirectionGrid, lcoe: &TurbineDirectionGrid) -> SimResult<(Vec<f64>, f64)> {
    aep.ensure_same_shape(lcoe, "lcoe")?;
    let cost = TurbineDirectionGrid::from_fn(aep.n_wt(), aep.n_wd(), |i, l| {
        lcoe.get(i, l) * aep.get(i, l) * MWH_PER_GWH
    });
    let energy = TurbineDirectionGrid::from_fn(aep.n_wt(), aep.n_wd(), |i, l| aep.get(i, l) * MWH_PER_GWH);

    let direction = cost
        .nansum_turbines()
        .iter()
        .zip(energy.nansum_turbines())
        .map(|(c, e)| c / e)
        .collect();
    Ok((direction, cost.nansum() / energy.nansum()))
}

/// Sector-frequency weighted mean. Weights of NaN cells are left out of the normaliser.
fn frequency_weighted_mean(values: &TurbineDirectionGrid, freq: &SectorFrequency) -> SimResult<(Vec<f64>, f64)> {
    if freq.weights().len() != values.n_wd() {
        return Err(SimulationError::DimensionMismatch {
            what: "sector frequency",
            expected: values.n_wd(),
            got: freq.weights().len(),
        });
    }
    let weights = freq.weights();
    let cells = |l: usize| (0..values.n_wt()).map(move |i| (values.get(i, l), weights[l]));
    let weighted_mean = |pairs: &mut dyn Iterator<Item = (f64, f64)>| {
        let valid: Vec<(f64, f64)> = pairs.filter(|(v, _)| !v.is_nan()).collect();
        nansum(valid.iter().map(|(v, w)| v * w)) / nansum(valid.iter().map(|(_, w)| *w))
    };

    let direction = (0..values.n_wd()).map(|l| weighted_mean(&mut cells(l))).collect();
    let overall = weighted_mean(&mut (0..values.n_wd()).flat_map(cells));
    Ok((direction, overall))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lcoe_is_energy_weighted() {
        // One turbine, two directions
        let aep = TurbineDirectionGrid::from_vec(1, 2, vec![10.0, 30.0]).unwrap();
        let lcoe = TurbineDirectionGrid::from_vec(1, 2, vec![50.0, 90.0]).unwrap();
        let agg = aggregate_metrics(Some(&aep), Some(&lcoe), None, None).unwrap();
        let expected = (50.0 * 10.0 + 90.0 * 30.0) / (10.0 + 30.0);
        assert!((agg.lcoe_overall.unwrap() - expected).abs() < 1e-9);
        assert_eq!(agg.lcoe_direction.unwrap(), vec![50.0, 90.0]);
        assert!(agg.cap_fac_direction.is_none());
        assert!(agg.cap_fac_overall.is_none());
    }

    #[test]
    fn zero_energy_turbines_drop_out_of_lcoe() {
        let aep = TurbineDirectionGrid::from_vec(2, 1, vec![0.0, 20.0]).unwrap();
        let lcoe = TurbineDirectionGrid::from_vec(2, 1, vec![f64::INFINITY, 40.0]).unwrap();
        let agg = aggregate_metrics(Some(&aep), Some(&lcoe), None, None).unwrap();
        assert!((agg.lcoe_overall.unwrap() - 40.0).abs() < 1e-12);
    }

    #[test]
    fn cap_fac_is_frequency_weighted() {
        let cap_fac = TurbineDirectionGrid::from_vec(2, 2, vec![0.4, 0.2, 0.6, 0.2]).unwrap();
        let freq = SectorFrequency::new(vec![0.0, 180.0], vec![0.75, 0.25]).unwrap();
        let agg = aggregate_metrics(None, None, Some(&cap_fac), Some(&freq)).unwrap();
        let direction = agg.cap_fac_direction.unwrap();
        assert!((direction[0] - 0.5).abs() < 1e-12);
        assert!((direction[1] - 0.2).abs() < 1e-12);
        let expected = (0.75 * (0.4 + 0.6) + 0.25 * (0.2 + 0.2)) / (2.0 * 0.75 + 2.0 * 0.25);
        assert!((agg.cap_fac_overall.unwrap() - expected).abs() < 1e-12);
        assert!(agg.lcoe_overall.is_none());
    }

    #[test]
    fn missing_inputs_yield_missing_outputs() {
        let aep = TurbineDirectionGrid::from_vec(1, 1, vec![1.0]).unwrap();
        let agg = aggregate_metrics(Some(&aep), None, None, None).unwrap();
        assert_eq!(agg, AggregatedMetrics::default());
    }

    #[test]
    fn mismatched_frequency_is_rejected() {
        let cap_fac = TurbineDirectionGrid::from_vec(1, 2, vec![0.1, 0.2]).unwrap();
        let freq = SectorFrequency::new(vec![0.0], vec![1.0]).unwrap();
        assert!(aggregate_metrics(None, None, Some(&cap_fac), Some(&freq)).is_err());
    }
}
