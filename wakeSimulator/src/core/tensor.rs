// Dense row-major containers for per-turbine simulation and metric values
use serde::{Deserialize, Serialize};

use crate::error::{SimResult, SimulationError};

/// Values over (turbine, wind direction, wind speed), row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmTensor {
    shape: (usize, usize, usize),
    data: Vec<f64>,
}

impl FarmTensor {
    pub fn zeros(shape: (usize, usize, usize)) -> Self {
        Self::filled(shape, 0.0)
    }

    pub fn filled(shape: (usize, usize, usize), value: f64) -> Self {
        Self {
            shape,
            data: vec![value; shape.0 * shape.1 * shape.2],
        }
    }

    pub fn from_vec(shape: (usize, usize, usize), data: Vec<f64>) -> SimResult<Self> {
        let expected = shape.0 * shape.1 * shape.2;
        if data.len() != expected {
            return Err(SimulationError::DimensionMismatch { what: "farm tensor", expected, got: data.len() });
        }
        Ok(Self { shape, data })
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        self.shape
    }

    fn offset(&self, i: usize, l: usize, k: usize) -> usize {
        (i * self.shape.1 + l) * self.shape.2 + k
    }

    pub fn get(&self, i: usize, l: usize, k: usize) -> f64 {
        self.data[self.offset(i, l, k)]
    }

    pub fn set(&mut self, i: usize, l: usize, k: usize, value: f64) {
        let idx = self.offset(i, l, k);
        self.data[idx] = value;
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Copy of the tensor restricted to the given direction indices, in order.
    pub fn select_directions(&self, wd_idx: &[usize]) -> Self {
        let (n_wt, _, n_ws) = self.shape;
        let mut out = Self::zeros((n_wt, wd_idx.len(), n_ws));
        for i in 0..n_wt {
            for (new_l, &l) in wd_idx.iter().enumerate() {
                for k in 0..n_ws {
                    out.set(i, new_l, k, self.get(i, l, k));
                }
            }
        }
        out
    }
}

/// Yaw offsets in degrees over (turbine, direction slot, wind speed).
pub type YawTensor = FarmTensor;

impl FarmTensor {
    /// Flatten in C order, scaled by `1 / scale`.
    pub fn to_normalized(&self, scale: f64) -> Vec<f64> {
        self.data.iter().map(|v| v / scale).collect()
    }

    /// Rebuild from a C-order flat vector, scaled by `scale`.
    pub fn from_normalized(shape: (usize, usize, usize), flat: &[f64], scale: f64) -> SimResult<Self> {
        Self::from_vec(shape, flat.iter().map(|v| v * scale).collect())
    }
}

/// Values over (turbine, wind direction), row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurbineDirectionGrid {
    n_wt: usize,
    n_wd: usize,
    data: Vec<f64>,
}

impl TurbineDirectionGrid {
    pub fn zeros(n_wt: usize, n_wd: usize) -> Self {
        Self { n_wt, n_wd, data: vec![0.0; n_wt * n_wd] }
    }

    pub fn from_vec(n_wt: usize, n_wd: usize, data: Vec<f64>) -> SimResult<Self> {
        if data.len() != n_wt * n_wd {
            return Err(SimulationError::DimensionMismatch {
                what: "turbine-direction grid",
                expected: n_wt * n_wd,
                got: data.len(),
            });
        }
        Ok(Self { n_wt, n_wd, data })
    }

    /// Build a grid from a function of (turbine, direction).
    pub fn from_fn(n_wt: usize, n_wd: usize, f: impl Fn(usize, usize) -> f64) -> Self {
        let data = (0..n_wt)
            .flat_map(|i| (0..n_wd).map(move |l| (i, l)))
            .map(|(i, l)| f(i, l))
            .collect();
        Self { n_wt, n_wd, data }
    }

    pub fn n_wt(&self) -> usize {
        self.n_wt
    }

    pub fn n_wd(&self) -> usize {
        self.n_wd
    }

    pub fn get(&self, i: usize, l: usize) -> f64 {
        self.data[i * self.n_wd + l]
    }

    pub fn set(&mut self, i: usize, l: usize, value: f64) {
        self.data[i * self.n_wd + l] = value;
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Sum over all cells. NaN cells are skipped.
    pub fn nansum(&self) -> f64 {
        nansum(self.data.iter().copied())
    }

    /// Sum over turbines for each direction. NaN cells are skipped.
    pub fn nansum_turbines(&self) -> Vec<f64> {
        (0..self.n_wd)
            .map(|l| nansum((0..self.n_wt).map(|i| self.get(i, l))))
            .collect()
    }

    pub fn ensure_same_shape(&self, other: &Self, what: &'static str) -> SimResult<()> {
        if self.n_wt != other.n_wt || self.n_wd != other.n_wd {
            return Err(SimulationError::DimensionMismatch {
                what,
                expected: self.n_wt * self.n_wd,
                got: other.n_wt * other.n_wd,
            });
        }
        Ok(())
    }
}

/// Sum that ignores NaN values.
pub fn nansum(values: impl Iterator<Item = f64>) -> f64 {
    values.filter(|v| !v.is_nan()).sum()
}
