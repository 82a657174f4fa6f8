use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use wake_steering::analysis::aggregation::AggregatedMetrics;
use wake_steering::analysis::metrics_calculation::{calc_metrics, run_sim_and_calculate_metrics, FarmMetrics};
use wake_steering::analysis::reporting::{format_thousands, print_direction_table, print_metrics_summary};
use wake_steering::cli::cli::Args;
use wake_steering::config::const_funcs::{inclusive_range, wind_direction_grid};
use wake_steering::config::constants::WS_DEFAULT_STEP;
use wake_steering::config::simulation_config::RunConfig;
use wake_steering::core::simulation::run_sim_with_cpus;
use wake_steering::core::wind_farm_model::{EngineeringWindFarmModel, WindFarmModel, YawInput};
use wake_steering::optimization::yaw_optimizer::{merge_schedules, optimise_direction};
use wake_steering::utils::csv_export::CsvExporter;
use wake_steering::utils::logging::{self, FileIOType, OperationCategory};

fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_logging(args.enable_timing(), args.debug_logging());

    let mut config = load_config(args.config())?;
    config.optimizer.n_cpu = args.n_cpu();
    config.validate()?;
    let n_cpu = config.optimizer.n_cpu;
    let model = EngineeringWindFarmModel::from_fidelity(args.model())?;
    let layout = args.layout().build()?;
    let ws = inclusive_range(args.ws_min(), args.ws_max(), WS_DEFAULT_STEP);
    let wd = wind_direction_grid(args.wd_step());
    let directions = if args.directions().is_empty() {
        wd.clone()
    } else {
        args.directions().to_vec()
    };

    println!("Wake Steering Simulator");
    println!("Model: {}", model.describe());
    println!(
        "Layout: {} turbines, {} wind speeds, {} wind directions ({} to optimise)",
        layout.len(),
        ws.len(),
        wd.len(),
        directions.len()
    );

    let sector_frequency = model.site().sector_frequency(&wd)?;
    let probability = model.site().probability(&wd, &ws)?;

    let sim_res_base = run_sim_with_cpus(&model, &layout, YawInput::Uniform(0.0), &ws, &wd, n_cpu)
        .context("Baseline simulation failed")?;
    if args.show() {
        println!("\nBaseline");
    }
    let metrics_base = calc_metrics(
        &sim_res_base,
        &sim_res_base,
        &sector_frequency,
        &probability,
        &config.costs,
        args.show(),
    )?;
    let aggregated_base = metrics_base.aggregate()?;
    let lcoe_direction_base = aggregated_base
        .lcoe_direction
        .clone()
        .context("Baseline LCoE by direction is missing")?;

    let progress = ProgressBar::new(directions.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} wd {msg}")?
            .progress_chars("=> "),
    );
    let mut schedules = Vec::with_capacity(directions.len());
    for &direction in &directions {
        progress.set_message(format!("{}", direction));
        let l = sim_res_base
            .wd_index(direction)
            .with_context(|| format!("Wind direction {} is not on the {} degree grid", direction, args.wd_step()))?;
        let schedule = optimise_direction(
            &model,
            &layout,
            direction,
            &sim_res_base,
            &sector_frequency,
            &probability,
            lcoe_direction_base[l],
            &config.costs,
            &config.optimizer,
        )
        .with_context(|| format!("Yaw optimisation failed for wd = {}", direction))?;
        schedules.push(schedule);
        progress.inc(1);
    }
    progress.finish_with_message("done");
    info!("optimised {} wind directions", schedules.len());

    let (yaw_power, yaw_lcoe) = merge_schedules(&schedules, layout.len(), &wd, &ws)?;

    let optimised = |yaw| {
        run_sim_and_calculate_metrics(
            &sim_res_base,
            &sector_frequency,
            &probability,
            &config.costs,
            &model,
            &layout,
            YawInput::Full(yaw),
            &ws,
            &wd,
            n_cpu,
            false,
        )
    };
    let metrics_power = optimised(yaw_power.clone())?;
    let aggregated_power = metrics_power.aggregate()?;
    let metrics_lcoe = optimised(yaw_lcoe.clone())?;
    let aggregated_lcoe = metrics_lcoe.aggregate()?;

    if args.show() {
        report("Power based yaw", &metrics_power, &aggregated_power, &metrics_base, &aggregated_base);
        report("LCoE based yaw", &metrics_lcoe, &aggregated_lcoe, &metrics_base, &aggregated_base);
        print_direction_table("Baseline", &metrics_base, &aggregated_base);
        print_direction_table("LCoE based yaw", &metrics_lcoe, &aggregated_lcoe);
    }

    if let Some(export_dir) = args.export_dir() {
        let exporter = CsvExporter::new(export_dir)?;
        exporter.export_yaw_schedule("yaw_power", &yaw_power, &wd, &ws)?;
        exporter.export_yaw_schedule("yaw_lcoe", &yaw_lcoe, &wd, &ws)?;
        exporter.export_direction_metrics("directions_baseline", &metrics_base, &aggregated_base)?;
        exporter.export_direction_metrics("directions_power", &metrics_power, &aggregated_power)?;
        exporter.export_direction_metrics("directions_lcoe", &metrics_lcoe, &aggregated_lcoe)?;
        exporter.export_turbine_metrics("turbines_lcoe", &metrics_lcoe)?;
        println!("\nCSV export written to {}", exporter.output_dir().display());
    }

    logging::print_timing_report();

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<RunConfig> {
    let _timing = logging::start_timing("load_config",
        OperationCategory::FileIO { subcategory: FileIOType::ConfigLoad });

    match path {
        Some(path) => RunConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(RunConfig::default()),
    }
}

fn report(
    label: &str,
    metrics: &FarmMetrics,
    aggregated: &AggregatedMetrics,
    metrics_base: &FarmMetrics,
    aggregated_base: &AggregatedMetrics,
) {
    println!("\n{}", label);
    print_metrics_summary(metrics, aggregated);

    let aep_gain = 100.0 * (metrics.total_aep() / metrics_base.total_aep() - 1.0);
    println!("AEP change [%]: {}", format_thousands(aep_gain, 3));
    if let (Some(lcoe), Some(lcoe_base)) = (aggregated.lcoe_overall, aggregated_base.lcoe_overall) {
        println!("LCoE change [%]: {}", format_thousands(100.0 * (lcoe / lcoe_base - 1.0), 3));
    }
}
