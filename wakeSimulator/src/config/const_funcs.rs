use crate::config::constants::*;

/// Capital cost per GW of installed capacity (USD), midpoint of the ATB range.
pub fn capex_per_gw() -> f64 {
    (CAPEX_LOW_USD_PER_KW + CAPEX_HIGH_USD_PER_KW) / 2.0 * USD_PER_MILLION
}

/// Slope of the two-point OPEX fit, in USD/kW-yr per unit of capacity factor.
fn opex_gradient() -> f64 {
    (OPEX_POINT_HIGH.1 - OPEX_POINT_LOW.1) / (OPEX_POINT_HIGH.0 - OPEX_POINT_LOW.0)
}

/// Fixed operating cost per GW-year (USD): the OPEX fit extrapolated to zero capacity factor.
pub fn opex_fixed_per_gw_year() -> f64 {
    (OPEX_POINT_LOW.1 - opex_gradient() * OPEX_POINT_LOW.0) * USD_PER_MILLION
}

/// Variable operating cost per GWh (USD).
pub fn opex_var_per_gwh() -> f64 {
    opex_gradient() / hours_per_julian_year()
}

pub fn hours_per_julian_year() -> f64 {
    DAYS_PER_JULIAN_YEAR * HOURS_PER_DAY
}

/// Evenly spaced grid from `start` to `stop` inclusive.
pub fn inclusive_range(start: f64, stop: f64, step: f64) -> Vec<f64> {
    if step <= 0.0 || stop < start {
        return vec![start];
    }
    let n = ((stop - start) / step + 1e-9).floor() as usize + 1;
    (0..n).map(|i| start + step * i as f64).collect()
}

/// Default wind speeds: 0..=30 m/s in 1 m/s steps.
pub fn default_wind_speeds() -> Vec<f64> {
    inclusive_range(WS_DEFAULT_MIN, WS_DEFAULT_MAX, WS_DEFAULT_STEP)
}

/// Full circle of wind directions with the given step, excluding 360.
pub fn wind_direction_grid(step: f64) -> Vec<f64> {
    if step <= 0.0 || step >= FULL_CIRCLE_DEG {
        return vec![0.0];
    }
    let n = (FULL_CIRCLE_DEG / step).round() as usize;
    (0..n).map(|i| step * i as f64).filter(|wd| *wd < FULL_CIRCLE_DEG).collect()
}

pub fn default_wind_directions() -> Vec<f64> {
    wind_direction_grid(WD_DEFAULT_STEP)
}

/// Smallest angular difference between two directions in degrees.
pub fn angular_distance(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(FULL_CIRCLE_DEG);
    d.min(FULL_CIRCLE_DEG - d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cost_rates_match_atb_fit() {
        assert!((capex_per_gw() - 3525.5e6).abs() < 1.0);
        let grad = 14.0 / 0.17;
        assert!((opex_fixed_per_gw_year() - (102.0 - grad * 0.29) * 1e6).abs() < 1e-3);
        assert!((opex_var_per_gwh() - grad / 8766.0).abs() < 1e-12);
    }

    #[test]
    fn default_grids() {
        let ws = default_wind_speeds();
        assert_eq!(ws.len(), 31);
        assert_eq!(ws[0], 0.0);
        assert_eq!(ws[30], 30.0);

        let wd = default_wind_directions();
        assert_eq!(wd.len(), 24);
        assert_eq!(wd[1], 15.0);
        assert_eq!(*wd.last().unwrap(), 345.0);
    }

    #[test]
    fn angular_distance_wraps() {
        assert_eq!(angular_distance(350.0, 10.0), 20.0);
        assert_eq!(angular_distance(0.0, 180.0), 180.0);
    }
}
