// Wind turbine power and thrust curves
use serde::{Deserialize, Serialize};

use crate::config::constants::WATTS_PER_GIGAWATT;
use crate::error::{SimResult, SimulationError};

/// Tabulated power / thrust curve. Values outside the table are idle (zero power, zero thrust).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerCtTable {
    pub ws: Vec<f64>,
    pub power_w: Vec<f64>,
    pub ct: Vec<f64>,
}

impl PowerCtTable {
    pub fn new(ws: Vec<f64>, power_w: Vec<f64>, ct: Vec<f64>) -> SimResult<Self> {
        if ws.is_empty() {
            return Err(SimulationError::EmptyGrid("power curve"));
        }
        for (what, len) in [("power curve power", power_w.len()), ("power curve ct", ct.len())] {
            if len != ws.len() {
                return Err(SimulationError::DimensionMismatch { what, expected: ws.len(), got: len });
            }
        }
        if ws.windows(2).any(|w| w[1] <= w[0]) {
            return Err(SimulationError::InvalidConfig(
                "power curve wind speeds must be strictly increasing".to_string(),
            ));
        }
        Ok(Self { ws, power_w, ct })
    }

    fn interpolate(&self, values: &[f64], ws: f64) -> f64 {
        let first = self.ws[0];
        let last = self.ws[self.ws.len() - 1];
        if !(first..=last).contains(&ws) {
            return 0.0;
        }
        let upper = self.ws.partition_point(|&v| v < ws);
        if upper == 0 {
            return values[0];
        }
        let (x0, x1) = (self.ws[upper - 1], self.ws[upper]);
        let (y0, y1) = (values[upper - 1], values[upper]);
        y0 + (y1 - y0) * (ws - x0) / (x1 - x0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindTurbine {
    name: String,
    diameter: f64,
    hub_height: f64,
    table: PowerCtTable,
}

impl WindTurbine {
    pub fn new(name: impl Into<String>, diameter: f64, hub_height: f64, table: PowerCtTable) -> Self {
        Self {
            name: name.into(),
            diameter,
            hub_height,
            table,
        }
    }

    /// Vestas V80 2 MW as used at Horns Rev 1.
    pub fn v80() -> Self {
        let ws: Vec<f64> = (3..=25).map(f64::from).collect();
        let power_kw = [
            0.0, 66.6, 154.0, 282.0, 460.0, 696.0, 996.0, 1341.0, 1661.0, 1866.0, 1958.0, 1988.0,
            1997.0, 1999.0, 2000.0, 2000.0, 2000.0, 2000.0, 2000.0, 2000.0, 2000.0, 2000.0, 2000.0,
        ];
        let ct = vec![
            0.0, 0.818, 0.806, 0.804, 0.805, 0.806, 0.807, 0.793, 0.739, 0.709, 0.409, 0.314,
            0.249, 0.202, 0.167, 0.140, 0.119, 0.102, 0.088, 0.077, 0.067, 0.060, 0.053,
        ];
        let table = PowerCtTable {
            ws,
            power_w: power_kw.iter().map(|p| p * 1000.0).collect(),
            ct,
        };
        Self::new("V80", 80.0, 70.0, table)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn diameter(&self) -> f64 {
        self.diameter
    }

    pub fn hub_height(&self) -> f64 {
        self.hub_height
    }

    /// Power (W) at the given rotor-normal wind speed.
    pub fn power(&self, ws: f64) -> f64 {
        self.table.interpolate(&self.table.power_w, ws)
    }

    pub fn ct(&self, ws: f64) -> f64 {
        self.table.interpolate(&self.table.ct, ws)
    }

    /// Power (W) and thrust coefficient for a yawed / tilted rotor. The inflow is projected onto the
    /// rotor normal before the table lookup.
    pub fn power_ct_yawed(&self, ws: f64, yaw_deg: f64, tilt_deg: f64) -> (f64, f64) {
        let projected = ws * yaw_deg.to_radians().cos() * tilt_deg.to_radians().cos();
        (self.power(projected), self.ct(projected))
    }

    /// Maximum of the power table in GW.
    pub fn rated_power_gw(&self) -> f64 {
        self.table.power_w.iter().cloned().fold(0.0, f64::max) / WATTS_PER_GIGAWATT
    }

    /// First speed in `speeds` with non-zero unyawed power. Falls back to the first speed when no
    /// speed produces power.
    pub fn cut_in_speed(&self, speeds: &[f64]) -> Option<f64> {
        speeds
            .iter()
            .copied()
            .find(|&ws| self.power(ws) > 0.0)
            .or_else(|| speeds.first().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v80_curve_interpolates_and_idles_outside_table() {
        let wt = WindTurbine::v80();
        assert_eq!(wt.power(2.0), 0.0);
        assert_eq!(wt.power(26.0), 0.0);
        assert_eq!(wt.ct(30.0), 0.0);
        assert!((wt.power(4.5) - 110_300.0).abs() < 1e-6);
        assert_eq!(wt.power(15.0), 1_997_000.0);
    }

    #[test]
    fn v80_rated_power_and_cut_in() {
        let wt = WindTurbine::v80();
        assert!((wt.rated_power_gw() - 0.002).abs() < 1e-12);
        let speeds: Vec<f64> = (0..=30).map(f64::from).collect();
        assert_eq!(wt.cut_in_speed(&speeds), Some(4.0));
        assert_eq!(wt.cut_in_speed(&[0.0, 1.0]), Some(0.0));
    }

    #[test]
    fn yaw_reduces_power() {
        let wt = WindTurbine::v80();
        let (p0, _) = wt.power_ct_yawed(9.0, 0.0, 0.0);
        let (p30, _) = wt.power_ct_yawed(9.0, 30.0, 0.0);
        assert!(p30 < p0);
    }

    #[test]
    fn table_rejects_mismatched_lengths() {
        let err = PowerCtTable::new(vec![1.0, 2.0], vec![0.0], vec![0.0, 0.0]).unwrap_err();
        assert!(matches!(err, SimulationError::DimensionMismatch { .. }));
    }
}
