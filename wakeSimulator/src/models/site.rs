// Site wind climate: sector frequencies, Weibull speed distributions and ambient turbulence
use serde::{Deserialize, Serialize};

use crate::config::const_funcs::angular_distance;
use crate::config::constants::{COORD_MATCH_TOLERANCE, FULL_CIRCLE_DEG};
use crate::error::{SimResult, SimulationError};

/// Position of `value` in `coords`, matched within tolerance.
pub(crate) fn coord_index(coords: &[f64], value: f64) -> Option<usize> {
    coords.iter().position(|c| (c - value).abs() <= COORD_MATCH_TOLERANCE)
}

/// Probability weight per wind direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorFrequency {
    wd: Vec<f64>,
    weights: Vec<f64>,
}

impl SectorFrequency {
    pub fn new(wd: Vec<f64>, weights: Vec<f64>) -> SimResult<Self> {
        if wd.len() != weights.len() {
            return Err(SimulationError::DimensionMismatch {
                what: "sector frequency",
                expected: wd.len(),
                got: weights.len(),
            });
        }
        if weights.iter().any(|w| *w < 0.0) {
            return Err(SimulationError::InvalidConfig(
                "sector frequencies must be non-negative".to_string(),
            ));
        }
        Ok(Self { wd, weights })
    }

    pub fn wd(&self) -> &[f64] {
        &self.wd
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn get(&self, wd: f64) -> Option<f64> {
        coord_index(&self.wd, wd).map(|i| self.weights[i])
    }

    pub fn total(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Restrict to the given directions, in the given order.
    pub fn select(&self, wd: &[f64]) -> SimResult<Self> {
        let weights = wd
            .iter()
            .map(|&d| self.get(d).ok_or(SimulationError::UnknownDirection(d)))
            .collect::<SimResult<Vec<_>>>()?;
        Ok(Self { wd: wd.to_vec(), weights })
    }
}

/// Occurrence probability of each (wind direction, wind speed) pair, stored row-major by direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointProbability {
    wd: Vec<f64>,
    ws: Vec<f64>,
    values: Vec<f64>,
}

impl JointProbability {
    pub fn new(wd: Vec<f64>, ws: Vec<f64>, values: Vec<f64>) -> SimResult<Self> {
        let expected = wd.len() * ws.len();
        if values.len() != expected {
            return Err(SimulationError::DimensionMismatch {
                what: "joint probability",
                expected,
                got: values.len(),
            });
        }
        if values.iter().any(|p| *p < 0.0) {
            return Err(SimulationError::InvalidConfig(
                "probabilities must be non-negative".to_string(),
            ));
        }
        Ok(Self { wd, ws, values })
    }

    pub fn wd(&self) -> &[f64] {
        &self.wd
    }

    pub fn ws(&self) -> &[f64] {
        &self.ws
    }

    /// Probability by grid position.
    pub fn at(&self, wd_idx: usize, ws_idx: usize) -> f64 {
        self.values[wd_idx * self.ws.len() + ws_idx]
    }

    pub fn get(&self, wd: f64, ws: f64) -> Option<f64> {
        let l = coord_index(&self.wd, wd)?;
        let k = coord_index(&self.ws, ws)?;
        Some(self.at(l, k))
    }

    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn select(&self, wd: &[f64], ws: &[f64]) -> SimResult<Self> {
        let wd_idx = wd
            .iter()
            .map(|&d| coord_index(&self.wd, d).ok_or(SimulationError::UnknownDirection(d)))
            .collect::<SimResult<Vec<_>>>()?;
        let ws_idx = ws
            .iter()
            .map(|&s| coord_index(&self.ws, s).ok_or(SimulationError::UnknownSpeed(s)))
            .collect::<SimResult<Vec<_>>>()?;
        let values = wd_idx
            .iter()
            .flat_map(|&l| ws_idx.iter().map(move |&k| (l, k)))
            .map(|(l, k)| self.at(l, k))
            .collect();
        Ok(Self { wd: wd.to_vec(), ws: ws.to_vec(), values })
    }

    pub fn select_directions(&self, wd: &[f64]) -> SimResult<Self> {
        let ws = self.ws.clone();
        self.select(wd, &ws)
    }
}

/// Site with direction-dependent Weibull wind speeds and uniform ambient turbulence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniformWeibullSite {
    sector_f: Vec<f64>,
    weibull_a: Vec<f64>,
    weibull_k: Vec<f64>,
    ti: f64,
}

impl UniformWeibullSite {
    pub fn new(sector_f: Vec<f64>, weibull_a: Vec<f64>, weibull_k: Vec<f64>, ti: f64) -> SimResult<Self> {
        if sector_f.is_empty() {
            return Err(SimulationError::EmptyGrid("site sector"));
        }
        for (what, len) in [("weibull A", weibull_a.len()), ("weibull k", weibull_k.len())] {
            if len != sector_f.len() {
                return Err(SimulationError::DimensionMismatch { what, expected: sector_f.len(), got: len });
            }
        }
        let total: f64 = sector_f.iter().sum();
        if total <= 0.0 || sector_f.iter().any(|f| *f < 0.0) {
            return Err(SimulationError::InvalidConfig(
                "sector frequencies must be non-negative with a positive sum".to_string(),
            ));
        }
        let sector_f = sector_f.iter().map(|f| f / total).collect();
        Ok(Self { sector_f, weibull_a, weibull_k, ti })
    }

    /// Horns Rev 1 offshore site, 12 sectors, TI = 0.1.
    pub fn hornsrev1() -> Self {
        let f = vec![
            3.597152, 3.948682, 5.167395, 7.000154, 8.364547, 6.43485, 8.643194, 11.77051,
            15.15757, 14.73792, 10.01205, 5.165975,
        ];
        let a = vec![
            9.176929, 9.782334, 9.531809, 9.909545, 10.04269, 9.593921, 9.584007, 10.51499,
            11.39895, 11.68746, 11.63732, 10.08803,
        ];
        let k = vec![
            2.392578, 2.447266, 2.412109, 2.591797, 2.755859, 2.595703, 2.583984, 2.548828,
            2.470703, 2.607422, 2.626953, 2.326172,
        ];
        let total: f64 = f.iter().sum();
        Self {
            sector_f: f.iter().map(|v| v / total).collect(),
            weibull_a: a,
            weibull_k: k,
            ti: 0.1,
        }
    }

    pub fn ambient_ti(&self) -> f64 {
        self.ti
    }

    fn sector_width(&self) -> f64 {
        FULL_CIRCLE_DEG / self.sector_f.len() as f64
    }

    /// Linear interpolation between sector centres, wrapping around north.
    fn interp_sector(&self, values: &[f64], wd: f64) -> f64 {
        let width = self.sector_width();
        let pos = wd.rem_euclid(FULL_CIRCLE_DEG) / width;
        let lower = pos.floor() as usize % values.len();
        let upper = (lower + 1) % values.len();
        let frac = pos - pos.floor();
        values[lower] * (1.0 - frac) + values[upper] * frac
    }

    /// Bin width of each requested direction: the mean gap to its neighbours on the circle, or the
    /// whole circle shared equally when the grid is too small to infer spacing.
    fn direction_bins(wd: &[f64]) -> Vec<f64> {
        if wd.len() < 2 {
            return vec![FULL_CIRCLE_DEG / wd.len().max(1) as f64; wd.len()];
        }
        let mut sorted: Vec<f64> = wd.iter().map(|d| d.rem_euclid(FULL_CIRCLE_DEG)).collect();
        sorted.sort_by(|a, b| a.total_cmp(b));
        sorted.dedup_by(|a, b| (*a - *b).abs() <= 1e-9);
        let n = sorted.len();
        wd.iter()
            .map(|d| {
                let d = d.rem_euclid(FULL_CIRCLE_DEG);
                let i = sorted
                    .iter()
                    .position(|s| (s - d).abs() <= 1e-9)
                    .unwrap_or(0);
                if n < 2 {
                    return FULL_CIRCLE_DEG;
                }
                let prev = sorted[(i + n - 1) % n];
                let next = sorted[(i + 1) % n];
                (angular_distance(d, prev) + angular_distance(d, next)) / 2.0
            })
            .collect()
    }

    /// Sector frequency for an arbitrary direction grid. Frequency density is interpolated between
    /// sector centres and multiplied by each direction's bin width.
    pub fn sector_frequency(&self, wd: &[f64]) -> SimResult<SectorFrequency> {
        if wd.is_empty() {
            return Err(SimulationError::EmptyGrid("wind direction"));
        }
        let width = self.sector_width();
        let weights = wd
            .iter()
            .zip(Self::direction_bins(wd))
            .map(|(&d, bin)| self.interp_sector(&self.sector_f, d) / width * bin)
            .collect();
        SectorFrequency::new(wd.to_vec(), weights)
    }

    /// Weibull probability of the speed bin around each requested speed.
    fn speed_probabilities(&self, wd: f64, ws: &[f64]) -> Vec<f64> {
        let a = self.interp_sector(&self.weibull_a, wd);
        let k = self.interp_sector(&self.weibull_k, wd);
        let cdf = |v: f64| if v <= 0.0 { 0.0 } else { 1.0 - (-(v / a).powf(k)).exp() };
        ws.iter()
            .enumerate()
            .map(|(i, &v)| {
                let lower_gap = if i > 0 { v - ws[i - 1] } else if ws.len() > 1 { ws[1] - v } else { 1.0 };
                let upper_gap = if i + 1 < ws.len() { ws[i + 1] - v } else { lower_gap };
                cdf(v + upper_gap / 2.0) - cdf(v - lower_gap / 2.0)
            })
            .collect()
    }

    pub fn probability(&self, wd: &[f64], ws: &[f64]) -> SimResult<JointProbability> {
        if ws.is_empty() {
            return Err(SimulationError::EmptyGrid("wind speed"));
        }
        let freq = self.sector_frequency(wd)?;
        let values = wd
            .iter()
            .zip(freq.weights())
            .flat_map(|(&d, &f)| self.speed_probabilities(d, ws).into_iter().map(move |p| p * f))
            .collect();
        JointProbability::new(wd.to_vec(), ws.to_vec(), values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::const_funcs::{default_wind_directions, default_wind_speeds};

    #[test]
    fn sector_frequency_sums_to_one_over_full_circle() {
        let site = UniformWeibullSite::hornsrev1();
        let freq = site.sector_frequency(&default_wind_directions()).unwrap();
        assert!((freq.total() - 1.0).abs() < 1e-9);
        let single = site.sector_frequency(&[270.0]).unwrap();
        assert!(single.weights()[0] > 0.0);
    }

    #[test]
    fn joint_probability_is_bounded_by_sector_frequency() {
        let site = UniformWeibullSite::hornsrev1();
        let wd = default_wind_directions();
        let ws = default_wind_speeds();
        let freq = site.sector_frequency(&wd).unwrap();
        let p = site.probability(&wd, &ws).unwrap();
        for (l, f) in freq.weights().iter().enumerate() {
            let row: f64 = (0..ws.len()).map(|k| p.at(l, k)).sum();
            assert!(row <= *f + 1e-12);
            assert!(row > 0.99 * f);
        }
    }

    #[test]
    fn select_keeps_requested_order_and_rejects_unknown() {
        let freq = SectorFrequency::new(vec![0.0, 90.0, 180.0], vec![0.2, 0.3, 0.5]).unwrap();
        let sub = freq.select(&[180.0, 0.0]).unwrap();
        assert_eq!(sub.weights(), &[0.5, 0.2]);
        assert!(matches!(freq.select(&[45.0]), Err(SimulationError::UnknownDirection(_))));

        let p = JointProbability::new(vec![0.0, 90.0], vec![5.0, 6.0], vec![0.1, 0.2, 0.3, 0.4]).unwrap();
        let sub = p.select_directions(&[90.0]).unwrap();
        assert_eq!(sub.get(90.0, 6.0), Some(0.4));
        assert_eq!(sub.get(0.0, 6.0), None);
    }
}
