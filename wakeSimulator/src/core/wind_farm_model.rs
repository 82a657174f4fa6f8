// Wind farm model seam and the reference engineering implementation
use std::fmt;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::constants::{ALL2ALL_MAX_ITERS, ALL2ALL_TOLERANCE, CGI_POINTS, DEFAULT_N_CPU};
use crate::core::simulation_result::SimulationResult;
use crate::core::tensor::{FarmTensor, YawTensor};
use crate::error::{SimResult, SimulationError};
use crate::models::layout::Layout;
use crate::models::site::UniformWeibullSite;
use crate::models::turbine::WindTurbine;
use crate::models::wake::*;

/// Yaw offsets (deg) handed to the simulator.
#[derive(Debug, Clone, PartialEq)]
pub enum YawInput {
    Uniform(f64),
    PerTurbine(Vec<f64>),
    /// Shape (n_wt, n_wd or 1, n_ws). A single direction slot is broadcast over all directions.
    Full(YawTensor),
}

impl YawInput {
    fn validate(&self, n_wt: usize, n_wd: usize, n_ws: usize) -> SimResult<()> {
        match self {
            YawInput::Uniform(_) => Ok(()),
            YawInput::PerTurbine(values) if values.len() == n_wt => Ok(()),
            YawInput::PerTurbine(values) => Err(SimulationError::DimensionMismatch {
                what: "per-turbine yaw",
                expected: n_wt,
                got: values.len(),
            }),
            YawInput::Full(tensor) => {
                let (a, b, c) = tensor.shape();
                if a == n_wt && (b == n_wd || b == 1) && c == n_ws {
                    Ok(())
                } else {
                    Err(SimulationError::DimensionMismatch {
                        what: "yaw tensor",
                        expected: n_wt * n_wd * n_ws,
                        got: a * b * c,
                    })
                }
            }
        }
    }

    fn at(&self, i: usize, l: usize, k: usize) -> f64 {
        match self {
            YawInput::Uniform(v) => *v,
            YawInput::PerTurbine(values) => values[i],
            YawInput::Full(tensor) => {
                let slot = if tensor.shape().1 == 1 { 0 } else { l };
                tensor.get(i, slot, k)
            }
        }
    }
}

/// Inputs of one simulator invocation.
#[derive(Debug, Clone)]
pub struct SimulationRequest<'a> {
    pub layout: &'a Layout,
    pub tilt_deg: f64,
    pub yaw: YawInput,
    pub n_cpu: usize,
    pub ws: &'a [f64],
    pub wd: &'a [f64],
}

impl<'a> SimulationRequest<'a> {
    pub fn new(layout: &'a Layout, yaw: YawInput, ws: &'a [f64], wd: &'a [f64]) -> Self {
        Self {
            layout,
            tilt_deg: 0.0,
            yaw,
            n_cpu: DEFAULT_N_CPU,
            ws,
            wd,
        }
    }
}

/// A wind farm simulator treated as a black box by the metrics and optimisation layers.
pub trait WindFarmModel: Send + Sync {
    fn name(&self) -> &str;

    fn site(&self) -> &UniformWeibullSite;

    fn turbine(&self) -> &WindTurbine;

    fn run(&self, request: &SimulationRequest<'_>) -> SimResult<SimulationResult>;
}

/// How wake interactions are resolved across the farm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WakeSolver {
    /// Single sweep from the most upstream turbine downwards.
    PropagateDownwind,
    /// Repeated sweeps until effective wind speeds settle.
    All2AllIterative { max_iters: usize, tolerance: f64 },
}

/// Predefined model configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum ModelFidelity {
    High,
    Low,
    Lossless,
}

impl fmt::Display for ModelFidelity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelFidelity::High => write!(f, "high"),
            ModelFidelity::Low => write!(f, "low"),
            ModelFidelity::Lossless => write!(f, "lossless"),
        }
    }
}

/// Wake-model simulator assembled from swappable strategy objects.
#[derive(Debug)]
pub struct EngineeringWindFarmModel {
    name: String,
    site: UniformWeibullSite,
    turbine: Arc<WindTurbine>,
    deficit: Box<dyn DeficitModel>,
    superposition: Box<dyn SuperpositionModel>,
    deflection: Option<Box<dyn DeflectionModel>>,
    turbulence: Option<Box<dyn TurbulenceModel>>,
    rotor_avg: Box<dyn RotorAvgModel>,
    solver: WakeSolver,
}

#[derive(Debug, Clone, Default)]
struct FlowCase {
    power: Vec<f64>,
    ws_eff: Vec<f64>,
    ti_eff: Vec<f64>,
    ct: Vec<f64>,
}

impl EngineeringWindFarmModel {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        site: UniformWeibullSite,
        turbine: WindTurbine,
        deficit: Box<dyn DeficitModel>,
        superposition: Box<dyn SuperpositionModel>,
        deflection: Option<Box<dyn DeflectionModel>>,
        turbulence: Option<Box<dyn TurbulenceModel>>,
        rotor_avg: Box<dyn RotorAvgModel>,
        solver: WakeSolver,
    ) -> Self {
        Self {
            name: name.into(),
            site,
            turbine: Arc::new(turbine),
            deficit,
            superposition,
            deflection,
            turbulence,
            rotor_avg,
            solver,
        }
    }

    /// Build one of the predefined configurations on the Horns Rev 1 site with V80 turbines.
    pub fn from_fidelity(fidelity: ModelFidelity) -> SimResult<Self> {
        let site = UniformWeibullSite::hornsrev1();
        let turbine = WindTurbine::v80();
        let model = match fidelity {
            ModelFidelity::High => Self::new(
                "high",
                site,
                turbine,
                Box::new(GaussianDeficit::default().with_effective_ws(true)),
                Box::new(LinearSum),
                Some(Box::new(JimenezWakeDeflection::default())),
                Some(Box::new(Stf2017TurbulenceModel::default())),
                Box::new(CgiRotorAvg::new(CGI_POINTS)?),
                WakeSolver::All2AllIterative {
                    max_iters: ALL2ALL_MAX_ITERS,
                    tolerance: ALL2ALL_TOLERANCE,
                },
            ),
            ModelFidelity::Low => Self::new(
                "low",
                site,
                turbine,
                Box::new(GaussianDeficit::default().with_effective_ws(true)),
                Box::new(LinearSum),
                Some(Box::new(JimenezWakeDeflection::default())),
                Some(Box::new(Stf2017TurbulenceModel::default())),
                Box::new(RotorCenter::default()),
                WakeSolver::PropagateDownwind,
            ),
            ModelFidelity::Lossless => Self::new(
                "lossless",
                site,
                turbine,
                Box::new(NoWakeDeficit),
                Box::new(LinearSum),
                None,
                None,
                Box::new(RotorCenter::default()),
                WakeSolver::PropagateDownwind,
            ),
        };
        Ok(model)
    }

    pub fn describe(&self) -> String {
        format!(
            "{} [deficit={}, superposition={}, deflection={}, turbulence={}, rotor_avg={}, solver={:?}]",
            self.name,
            self.deficit.name(),
            self.superposition.name(),
            self.deflection.as_ref().map_or("none", |d| d.name()),
            self.turbulence.as_ref().map_or("none", |t| t.name()),
            self.rotor_avg.name(),
            self.solver,
        )
    }

    fn source_for(&self, ws: f64, ws_eff: f64, ti_eff: f64, yaw_deg: f64, tilt_deg: f64) -> (WakeSource, f64) {
        let (power, ct_normal) = self.turbine.power_ct_yawed(ws_eff, yaw_deg, tilt_deg);
        let projection = yaw_deg.to_radians().cos() * tilt_deg.to_radians().cos();
        let source = WakeSource {
            ws_ambient: ws,
            ws_eff,
            ti_eff,
            ct: ct_normal * projection * projection,
            yaw_deg,
            diameter: self.turbine.diameter(),
        };
        (source, power)
    }

    /// Effective wind speed and turbulence at turbine `j` given the states of upstream turbines.
    fn inflow_at(
        &self,
        j: usize,
        ws: f64,
        downwind: &[f64],
        crosswind: &[f64],
        sources: &[Option<WakeSource>],
    ) -> (f64, f64) {
        let radius = self.turbine.diameter() / 2.0;
        let ambient_ti = self.site.ambient_ti();
        let upstream: Vec<(f64, f64, &WakeSource)> = sources
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|s| (i, s)))
            .filter(|(i, _)| *i != j && downwind[j] > downwind[*i])
            .map(|(i, s)| {
                let dw = downwind[j] - downwind[i];
                let offset = self.deflection.as_ref().map_or(0.0, |d| d.lateral_offset(s, dw));
                (dw, crosswind[j] - (crosswind[i] + offset), s)
            })
            .collect();

        let ws_eff = self
            .rotor_avg
            .nodes()
            .iter()
            .map(|&(ny, nz, weight)| {
                let deficits: Vec<f64> = upstream
                    .iter()
                    .map(|(dw, lateral, s)| {
                        let r = (lateral + ny * radius).hypot(nz * radius);
                        self.deficit.deficit(s, *dw, r)
                    })
                    .collect();
                weight * (ws - self.superposition.combine(&deficits))
            })
            .sum::<f64>()
            .max(0.0);

        let ti_eff = match &self.turbulence {
            Some(model) => {
                let added: Vec<f64> = upstream
                    .iter()
                    .map(|(dw, lateral, s)| model.added_ti(s, *dw, lateral.abs()))
                    .collect();
                model.superpose(ambient_ti, &added)
            }
            None => ambient_ti,
        };
        (ws_eff, ti_eff)
    }

    fn solve_flow_case(&self, layout: &Layout, wd: f64, ws: f64, yaw: impl Fn(usize) -> f64, tilt_deg: f64) -> FlowCase {
        let n = layout.len();
        let theta = wd.to_radians();
        // Wind blows from `wd`, towards wd + 180
        let (dx, dy) = (-theta.sin(), -theta.cos());
        let (cx, cy) = (theta.cos(), -theta.sin());
        let downwind: Vec<f64> = (0..n).map(|i| layout.x()[i] * dx + layout.y()[i] * dy).collect();
        let crosswind: Vec<f64> = (0..n).map(|i| layout.x()[i] * cx + layout.y()[i] * cy).collect();
        let ambient_ti = self.site.ambient_ti();

        let mut case = FlowCase {
            power: vec![0.0; n],
            ws_eff: vec![ws; n],
            ti_eff: vec![ambient_ti; n],
            ct: vec![0.0; n],
        };

        match self.solver {
            WakeSolver::PropagateDownwind => {
                let mut order: Vec<usize> = (0..n).collect();
                order.sort_by(|a, b| downwind[*a].total_cmp(&downwind[*b]));
                let mut sources: Vec<Option<WakeSource>> = vec![None; n];
                for j in order {
                    let (ws_eff, ti_eff) = self.inflow_at(j, ws, &downwind, &crosswind, &sources);
                    let (source, power) = self.source_for(ws, ws_eff, ti_eff, yaw(j), tilt_deg);
                    case.power[j] = power;
                    case.ws_eff[j] = ws_eff;
                    case.ti_eff[j] = ti_eff;
                    case.ct[j] = source.ct;
                    sources[j] = Some(source);
                }
            }
            WakeSolver::All2AllIterative { max_iters, tolerance } => {
                let mut sources: Vec<Option<WakeSource>> = (0..n)
                    .map(|j| Some(self.source_for(ws, ws, ambient_ti, yaw(j), tilt_deg).0))
                    .collect();
                for iteration in 0..max_iters.max(1) {
                    let inflow: Vec<(f64, f64)> = (0..n)
                        .map(|j| self.inflow_at(j, ws, &downwind, &crosswind, &sources))
                        .collect();
                    let mut max_change: f64 = 0.0;
                    let mut next = Vec::with_capacity(n);
                    for (j, (ws_eff, ti_eff)) in inflow.into_iter().enumerate() {
                        max_change = max_change.max((ws_eff - case.ws_eff[j]).abs());
                        let (source, power) = self.source_for(ws, ws_eff, ti_eff, yaw(j), tilt_deg);
                        case.power[j] = power;
                        case.ws_eff[j] = ws_eff;
                        case.ti_eff[j] = ti_eff;
                        case.ct[j] = source.ct;
                        next.push(Some(source));
                    }
                    sources = next;
                    if iteration > 0 && max_change < tolerance {
                        break;
                    }
                }
            }
        }
        case
    }
}

impl WindFarmModel for EngineeringWindFarmModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn site(&self) -> &UniformWeibullSite {
        &self.site
    }

    fn turbine(&self) -> &WindTurbine {
        &self.turbine
    }

    fn run(&self, request: &SimulationRequest<'_>) -> SimResult<SimulationResult> {
        let n_wt = request.layout.len();
        let (n_wd, n_ws) = (request.wd.len(), request.ws.len());
        if n_wd == 0 {
            return Err(SimulationError::EmptyGrid("wind direction"));
        }
        if n_ws == 0 {
            return Err(SimulationError::EmptyGrid("wind speed"));
        }
        request.yaw.validate(n_wt, n_wd, n_ws)?;

        let cases: Vec<(usize, usize)> = (0..n_wd).flat_map(|l| (0..n_ws).map(move |k| (l, k))).collect();
        let solve = |&(l, k): &(usize, usize)| {
            self.solve_flow_case(
                request.layout,
                request.wd[l],
                request.ws[k],
                |i| request.yaw.at(i, l, k),
                request.tilt_deg,
            )
        };
        let solved: Vec<FlowCase> = if request.n_cpu > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(request.n_cpu)
                .build()
                .map_err(|e| SimulationError::InvalidConfig(format!("thread pool: {}", e)))?;
            pool.install(|| cases.par_iter().map(solve).collect())
        } else {
            cases.iter().map(solve).collect()
        };

        let shape = (n_wt, n_wd, n_ws);
        let mut power = FarmTensor::zeros(shape);
        let mut ws_eff = FarmTensor::zeros(shape);
        let mut ti_eff = FarmTensor::zeros(shape);
        let mut ct = FarmTensor::zeros(shape);
        let mut yaw = FarmTensor::zeros(shape);
        for (&(l, k), case) in cases.iter().zip(&solved) {
            for i in 0..n_wt {
                power.set(i, l, k, case.power[i]);
                ws_eff.set(i, l, k, case.ws_eff[i]);
                ti_eff.set(i, l, k, case.ti_eff[i]);
                ct.set(i, l, k, case.ct[i]);
                yaw.set(i, l, k, request.yaw.at(i, l, k));
            }
        }
        debug!(model = %self.name, n_wt, n_wd, n_ws, "simulated flow cases");

        Ok(SimulationResult {
            layout: request.layout.clone(),
            wd: request.wd.to_vec(),
            ws: request.ws.to_vec(),
            power,
            ws_eff,
            ti_eff,
            ct,
            yaw,
            probability: self.site.probability(request.wd, request.ws)?,
            turbine: Arc::clone(&self.turbine),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_layout() -> Layout {
        // Three turbines in a west-east row, 7D apart
        Layout::new(vec![0.0, 560.0, 1120.0], vec![0.0, 0.0, 0.0]).unwrap()
    }

    #[test]
    fn lossless_model_matches_free_stream_power() {
        let model = EngineeringWindFarmModel::from_fidelity(ModelFidelity::Lossless).unwrap();
        let layout = row_layout();
        let res = model
            .run(&SimulationRequest::new(&layout, YawInput::Uniform(0.0), &[8.0], &[270.0]))
            .unwrap();
        for i in 0..3 {
            assert_eq!(res.power.get(i, 0, 0), model.turbine().power(8.0));
            assert_eq!(res.ti_eff.get(i, 0, 0), 0.1);
        }
    }

    #[test]
    fn wakes_reduce_downstream_power_and_raise_turbulence() {
        let layout = row_layout();
        for fidelity in [ModelFidelity::Low, ModelFidelity::High] {
            let model = EngineeringWindFarmModel::from_fidelity(fidelity).unwrap();
            let res = model
                .run(&SimulationRequest::new(&layout, YawInput::Uniform(0.0), &[8.0], &[270.0]))
                .unwrap();
            let p: Vec<f64> = (0..3).map(|i| res.power.get(i, 0, 0)).collect();
            assert_eq!(p[0], model.turbine().power(8.0));
            assert!(p[1] < p[0], "{fidelity}: {:?}", p);
            assert!(res.ti_eff.get(2, 0, 0) > 0.1);
        }
    }

    #[test]
    fn cross_wind_row_is_unwaked() {
        let model = EngineeringWindFarmModel::from_fidelity(ModelFidelity::Low).unwrap();
        let layout = row_layout();
        let res = model
            .run(&SimulationRequest::new(&layout, YawInput::Uniform(0.0), &[8.0], &[0.0]))
            .unwrap();
        let free = model.turbine().power(8.0);
        for i in 0..3 {
            assert!((res.power.get(i, 0, 0) - free).abs() < 1e-6 * free);
        }
    }

    #[test]
    fn parallel_run_matches_serial() {
        let model = EngineeringWindFarmModel::from_fidelity(ModelFidelity::Low).unwrap();
        let layout = row_layout();
        let ws = [6.0, 9.0, 12.0];
        let wd = [0.0, 90.0, 270.0];
        let serial = model.run(&SimulationRequest::new(&layout, YawInput::Uniform(5.0), &ws, &wd)).unwrap();
        let mut request = SimulationRequest::new(&layout, YawInput::Uniform(5.0), &ws, &wd);
        request.n_cpu = 2;
        let parallel = model.run(&request).unwrap();
        assert_eq!(serial.power, parallel.power);
    }

    #[test]
    fn fidelities_assemble_expected_strategies() {
        let high = EngineeringWindFarmModel::from_fidelity(ModelFidelity::High).unwrap().describe();
        assert!(high.contains("deficit=GaussianDeficit"));
        assert!(high.contains("rotor_avg=CGIRotorAvg"));
        assert!(high.contains("All2AllIterative"));

        let low = EngineeringWindFarmModel::from_fidelity(ModelFidelity::Low).unwrap().describe();
        assert!(low.contains("deflection=JimenezWakeDeflection"));
        assert!(low.contains("turbulence=STF2017TurbulenceModel"));
        assert!(low.contains("rotor_avg=RotorCenter"));

        let lossless = EngineeringWindFarmModel::from_fidelity(ModelFidelity::Lossless).unwrap().describe();
        assert!(lossless.contains("deficit=NoWakeDeficit"));
        assert!(lossless.contains("deflection=none"));
        assert!(lossless.contains("turbulence=none"));

        for description in [high, low, lossless] {
            assert!(description.contains("superposition=LinearSum"));
        }
    }

    #[test]
    fn rejects_mismatched_yaw() {
        let model = EngineeringWindFarmModel::from_fidelity(ModelFidelity::Low).unwrap();
        let layout = row_layout();
        let err = model
            .run(&SimulationRequest::new(&layout, YawInput::PerTurbine(vec![0.0]), &[8.0], &[270.0]))
            .unwrap_err();
        assert!(matches!(err, SimulationError::DimensionMismatch { .. }));
    }
}
