use serde::{Deserialize, Serialize};

use crate::config::constants::*;
use crate::error::{SimResult, SimulationError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Turbine positions in metres (easting, northing).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl Layout {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> SimResult<Self> {
        if x.len() != y.len() {
            return Err(SimulationError::DimensionMismatch { what: "layout y", expected: x.len(), got: y.len() });
        }
        if x.is_empty() {
            return Err(SimulationError::EmptyGrid("turbine"));
        }
        Ok(Self { x, y })
    }

    /// Horns Rev 1 style grid: `columns` columns of `per_column` turbines, each column running
    /// south with a slight eastward skew. Both counts must be positive.
    pub fn hornsrev(columns: usize, per_column: usize) -> SimResult<Self> {
        let (x, y) = (0..columns)
            .flat_map(|c| (0..per_column).map(move |r| (c, r)))
            .map(|(c, r)| {
                (
                    HORNSREV_ORIGIN_X + c as f64 * HORNSREV_COLUMN_SPACING_M + r as f64 * HORNSREV_ROW_SKEW_M,
                    HORNSREV_ORIGIN_Y - r as f64 * HORNSREV_ROW_SPACING_M,
                )
            })
            .unzip();
        Self::new(x, y)
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn coordinate(&self, i: usize) -> Coordinate {
        Coordinate::new(self.x[i], self.y[i])
    }
}

/// Named layouts shipped with the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum LayoutPreset {
    Wt9,
    Wt16,
    Wt80,
}

impl LayoutPreset {
    pub fn build(&self) -> SimResult<Layout> {
        match self {
            LayoutPreset::Wt9 => Layout::hornsrev(3, 3),
            LayoutPreset::Wt16 => Layout::hornsrev(4, 4),
            LayoutPreset::Wt80 => Layout::hornsrev(10, 8),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hornsrev_presets_have_expected_sizes() {
        assert_eq!(LayoutPreset::Wt9.build().unwrap().len(), 9);
        assert_eq!(LayoutPreset::Wt16.build().unwrap().len(), 16);
        let full = LayoutPreset::Wt80.build().unwrap();
        assert_eq!(full.len(), 80);
        assert_eq!(full.x()[8], 424_534.0);
        assert_eq!(full.y()[1], 6_150_891.0);
    }

    #[test]
    fn rejects_mismatched_coordinates() {
        assert!(Layout::new(vec![0.0, 1.0], vec![0.0]).is_err());
        assert!(Layout::new(vec![], vec![]).is_err());
    }

    #[test]
    fn empty_hornsrev_grid_is_rejected() {
        assert!(matches!(Layout::hornsrev(0, 4), Err(SimulationError::EmptyGrid(_))));
        assert!(matches!(Layout::hornsrev(3, 0), Err(SimulationError::EmptyGrid(_))));
        assert_eq!(Layout::hornsrev(1, 2).unwrap().len(), 2);
    }

    #[test]
    fn neighbouring_turbines_are_about_seven_diameters_apart() {
        let layout = LayoutPreset::Wt9.build().unwrap();
        let d = layout.coordinate(0).distance_to(&layout.coordinate(1));
        assert!((d - (68.0f64.powi(2) + 556.0f64.powi(2)).sqrt()).abs() < 1e-9);
    }
}
