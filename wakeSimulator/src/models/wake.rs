// Engineering wake building blocks. Each is a swappable strategy handed to the wind farm model.
use std::fmt::Debug;

use crate::config::constants::*;
use crate::error::{SimResult, SimulationError};

/// State of an upstream turbine as seen by the wake models.
#[derive(Debug, Clone, Copy)]
pub struct WakeSource {
    pub ws_ambient: f64,
    pub ws_eff: f64,
    pub ti_eff: f64,
    /// Thrust coefficient relative to the free stream (yaw already applied).
    pub ct: f64,
    pub yaw_deg: f64,
    pub diameter: f64,
}

pub trait DeficitModel: Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Velocity deficit (m/s) at downwind distance `dw` and radial distance `r` from the wake centre.
    fn deficit(&self, source: &WakeSource, dw: f64, r: f64) -> f64;
}

pub trait DeflectionModel: Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Lateral displacement (m) of the wake centre at downwind distance `dw`.
    fn lateral_offset(&self, source: &WakeSource, dw: f64) -> f64;
}

pub trait TurbulenceModel: Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Turbulence intensity added by `source` at downwind distance `dw` and radial distance `r`.
    fn added_ti(&self, source: &WakeSource, dw: f64, r: f64) -> f64;

    fn superpose(&self, ambient_ti: f64, added: &[f64]) -> f64;
}

pub trait RotorAvgModel: Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Integration nodes as (lateral, vertical, weight), positions in rotor radii.
    fn nodes(&self) -> &[(f64, f64, f64)];
}

pub trait SuperpositionModel: Debug + Send + Sync {
    fn name(&self) -> &str;

    fn combine(&self, deficits: &[f64]) -> f64;
}

// ---------------------------------------------------------------------------
// Deficit models
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct NoWakeDeficit;

impl DeficitModel for NoWakeDeficit {
    fn name(&self) -> &str {
        "NoWakeDeficit"
    }

    fn deficit(&self, _source: &WakeSource, _dw: f64, _r: f64) -> f64 {
        0.0
    }
}

/// Self-similar Gaussian wake with turbulence-dependent expansion, k = a * TI + b.
#[derive(Debug, Clone)]
pub struct GaussianDeficit {
    pub ti_slope: f64,
    pub ti_offset: f64,
    pub use_effective_ws: bool,
}

impl Default for GaussianDeficit {
    fn default() -> Self {
        Self {
            ti_slope: GAUSSIAN_TI_SLOPE,
            ti_offset: GAUSSIAN_TI_OFFSET,
            use_effective_ws: false,
        }
    }
}

impl GaussianDeficit {
    pub fn with_effective_ws(mut self, use_effective_ws: bool) -> Self {
        self.use_effective_ws = use_effective_ws;
        self
    }

    /// Wake width normalised by the rotor diameter.
    pub fn sigma_over_d(&self, source: &WakeSource, dw: f64) -> f64 {
        let ct = source.ct.clamp(0.0, 0.999);
        let sqrt_term = (1.0 - ct).sqrt();
        let beta = 0.5 * (1.0 + sqrt_term) / sqrt_term;
        let k = self.ti_slope * source.ti_eff + self.ti_offset;
        k * dw / source.diameter + 0.2 * beta.sqrt()
    }
}

impl DeficitModel for GaussianDeficit {
    fn name(&self) -> &str {
        "GaussianDeficit"
    }

    fn deficit(&self, source: &WakeSource, dw: f64, r: f64) -> f64 {
        if dw <= 0.0 || source.ct <= 0.0 {
            return 0.0;
        }
        let sigma_d = self.sigma_over_d(source, dw);
        let centre = 1.0 - (1.0 - source.ct / (8.0 * sigma_d * sigma_d)).max(0.0).sqrt();
        let sigma = sigma_d * source.diameter;
        let ws_ref = if self.use_effective_ws { source.ws_eff } else { source.ws_ambient };
        ws_ref * centre * (-r * r / (2.0 * sigma * sigma)).exp()
    }
}

// ---------------------------------------------------------------------------
// Deflection
// ---------------------------------------------------------------------------

/// Jimenez et al. (2010) wake deflection for yawed rotors.
#[derive(Debug, Clone)]
pub struct JimenezWakeDeflection {
    pub beta: f64,
}

impl Default for JimenezWakeDeflection {
    fn default() -> Self {
        Self { beta: JIMENEZ_BETA }
    }
}

impl DeflectionModel for JimenezWakeDeflection {
    fn name(&self) -> &str {
        "JimenezWakeDeflection"
    }

    fn lateral_offset(&self, source: &WakeSource, dw: f64) -> f64 {
        if dw <= 0.0 {
            return 0.0;
        }
        let theta0 = 0.5 * source.ct * source.yaw_deg.to_radians().sin();
        let d = source.diameter;
        theta0 * d / (2.0 * self.beta) * (1.0 - 1.0 / (1.0 + 2.0 * self.beta * dw / d))
    }
}

// ---------------------------------------------------------------------------
// Turbulence
// ---------------------------------------------------------------------------

/// Frandsen added turbulence (IEC 61400-1 ed. 4 form) with a Gaussian lateral profile and
/// square-root-of-max superposition.
#[derive(Debug, Clone)]
pub struct Stf2017TurbulenceModel {
    pub lateral_expansion: f64,
}

impl Default for Stf2017TurbulenceModel {
    fn default() -> Self {
        Self { lateral_expansion: 0.04 }
    }
}

impl TurbulenceModel for Stf2017TurbulenceModel {
    fn name(&self) -> &str {
        "STF2017TurbulenceModel"
    }

    fn added_ti(&self, source: &WakeSource, dw: f64, r: f64) -> f64 {
        if dw <= 0.0 || source.ct <= 0.0 {
            return 0.0;
        }
        let d = source.diameter;
        let centreline = 1.0 / (1.5 + 0.8 * (dw / d) / source.ct.sqrt());
        let sigma = d / 2.0 + self.lateral_expansion * dw;
        centreline * (-r * r / (2.0 * sigma * sigma)).exp()
    }

    fn superpose(&self, ambient_ti: f64, added: &[f64]) -> f64 {
        let max_added = added.iter().cloned().fold(0.0, f64::max);
        (ambient_ti * ambient_ti + max_added * max_added).sqrt()
    }
}

// ---------------------------------------------------------------------------
// Rotor averaging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RotorCenter {
    nodes: [(f64, f64, f64); 1],
}

impl Default for RotorCenter {
    fn default() -> Self {
        Self { nodes: [(0.0, 0.0, 1.0)] }
    }
}

impl RotorAvgModel for RotorCenter {
    fn name(&self) -> &str {
        "RotorCenter"
    }

    fn nodes(&self) -> &[(f64, f64, f64)] {
        &self.nodes
    }
}

/// Circular Gauss integration over the rotor disc.
#[derive(Debug, Clone)]
pub struct CgiRotorAvg {
    nodes: Vec<(f64, f64, f64)>,
}

impl CgiRotorAvg {
    pub fn new(n: usize) -> SimResult<Self> {
        let nodes = match n {
            4 => vec![(-0.5, -0.5, 0.25), (-0.5, 0.5, 0.25), (0.5, -0.5, 0.25), (0.5, 0.5, 0.25)],
            7 => {
                let a = (2.0f64 / 3.0).sqrt();
                let b = (1.0f64 / 6.0).sqrt();
                let c = 0.5f64.sqrt();
                vec![
                    (0.0, 0.0, 0.25),
                    (-a, 0.0, 0.125),
                    (a, 0.0, 0.125),
                    (-b, c, 0.125),
                    (b, c, 0.125),
                    (-b, -c, 0.125),
                    (b, -c, 0.125),
                ]
            }
            _ => {
                return Err(SimulationError::InvalidConfig(format!(
                    "CGI rotor average supports 4 or 7 points, got {}",
                    n
                )))
            }
        };
        Ok(Self { nodes })
    }
}

impl RotorAvgModel for CgiRotorAvg {
    fn name(&self) -> &str {
        "CGIRotorAvg"
    }

    fn nodes(&self) -> &[(f64, f64, f64)] {
        &self.nodes
    }
}

// ---------------------------------------------------------------------------
// Superposition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct LinearSum;

impl SuperpositionModel for LinearSum {
    fn name(&self) -> &str {
        "LinearSum"
    }

    fn combine(&self, deficits: &[f64]) -> f64 {
        deficits.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(ct: f64, yaw_deg: f64) -> WakeSource {
        WakeSource {
            ws_ambient: 10.0,
            ws_eff: 9.0,
            ti_eff: 0.1,
            ct,
            yaw_deg,
            diameter: 80.0,
        }
    }

    #[test]
    fn gaussian_deficit_decays_downstream_and_laterally() {
        let model = GaussianDeficit::default();
        let src = source(0.8, 0.0);
        let near = model.deficit(&src, 400.0, 0.0);
        let far = model.deficit(&src, 1200.0, 0.0);
        let side = model.deficit(&src, 400.0, 120.0);
        assert!(near > far && far > 0.0);
        assert!(side < near);
        assert_eq!(model.deficit(&src, -100.0, 0.0), 0.0);
    }

    #[test]
    fn effective_ws_reference_scales_deficit() {
        let src = source(0.8, 0.0);
        let ambient = GaussianDeficit::default().deficit(&src, 560.0, 0.0);
        let effective = GaussianDeficit::default().with_effective_ws(true).deficit(&src, 560.0, 0.0);
        assert!((effective / ambient - 0.9).abs() < 1e-12);
    }

    #[test]
    fn jimenez_deflection_follows_yaw_sign() {
        let model = JimenezWakeDeflection::default();
        assert_eq!(model.lateral_offset(&source(0.8, 0.0), 500.0), 0.0);
        let pos = model.lateral_offset(&source(0.8, 20.0), 500.0);
        let neg = model.lateral_offset(&source(0.8, -20.0), 500.0);
        assert!(pos > 0.0);
        assert!((pos + neg).abs() < 1e-12);
    }

    #[test]
    fn cgi_weights_sum_to_one() {
        for n in [4, 7] {
            let total: f64 = CgiRotorAvg::new(n).unwrap().nodes().iter().map(|n| n.2).sum();
            assert!((total - 1.0).abs() < 1e-12);
        }
        assert!(CgiRotorAvg::new(5).is_err());
    }

    #[test]
    fn superposition_rules() {
        assert_eq!(LinearSum.combine(&[1.0, 2.0]), 3.0);
        assert_eq!(LinearSum.combine(&[]), 0.0);
        let stf = Stf2017TurbulenceModel::default();
        assert!((stf.superpose(0.1, &[]) - 0.1).abs() < 1e-12);
        assert!(stf.superpose(0.1, &[0.05, 0.02]) > 0.1);
    }
}
