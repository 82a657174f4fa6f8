use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser};

use crate::config::constants::{DEFAULT_N_CPU, WD_DEFAULT_STEP, WS_DEFAULT_MAX, WS_DEFAULT_MIN};
use crate::core::wind_farm_model::ModelFidelity;
use crate::models::layout::LayoutPreset;

#[derive(Parser, Debug)]
#[command(author, version, about = "Wake steering yaw optimisation and wind farm economics", long_about = None)]
pub struct Args {
    #[arg(short, long, value_enum, default_value_t = ModelFidelity::Low)]
    model: ModelFidelity,

    #[arg(short, long, value_enum, default_value_t = LayoutPreset::Wt9)]
    layout: LayoutPreset,

    #[arg(long, default_value_t = WS_DEFAULT_MIN)]
    ws_min: f64,

    #[arg(long, default_value_t = WS_DEFAULT_MAX)]
    ws_max: f64,

    #[arg(long, default_value_t = WD_DEFAULT_STEP, help = "Wind direction grid step in degrees")]
    wd_step: f64,

    #[arg(short, long, value_delimiter = ',', help = "Wind directions to optimise (default: the whole grid)")]
    directions: Vec<f64>,

    #[arg(short, long, help = "JSON file with cost and optimiser settings")]
    config: Option<PathBuf>,

    #[arg(short, long, help = "Directory for CSV export")]
    export_dir: Option<PathBuf>,

    #[arg(long, default_value_t = DEFAULT_N_CPU, help = "Parallelism hint for the baseline, optimiser and metrics runs")]
    n_cpu: usize,

    #[arg(long, default_value_t = false)]
    enable_timing: bool,

    #[arg(long, default_value_t = false)]
    debug_logging: bool,

    #[arg(long, default_value_t = true, action = ArgAction::Set, help = "Print metric summaries")]
    show: bool,
}

impl Args {
    pub fn model(&self) -> ModelFidelity {
        self.model
    }

    pub fn layout(&self) -> LayoutPreset {
        self.layout
    }

    pub fn ws_min(&self) -> f64 {
        self.ws_min
    }

    pub fn ws_max(&self) -> f64 {
        self.ws_max
    }

    pub fn wd_step(&self) -> f64 {
        self.wd_step
    }

    pub fn directions(&self) -> &[f64] {
        &self.directions
    }

    pub fn config(&self) -> Option<&Path> {
        self.config.as_deref()
    }

    pub fn export_dir(&self) -> Option<&Path> {
        self.export_dir.as_deref()
    }

    pub fn n_cpu(&self) -> usize {
        self.n_cpu
    }

    pub fn enable_timing(&self) -> bool {
        self.enable_timing
    }

    pub fn debug_logging(&self) -> bool {
        self.debug_logging
    }

    pub fn show(&self) -> bool {
        self.show
    }
}
