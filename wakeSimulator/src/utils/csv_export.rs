use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use csv::Writer;
use serde::Serialize;

use crate::analysis::aggregation::AggregatedMetrics;
use crate::analysis::metrics_calculation::FarmMetrics;
use crate::core::tensor::YawTensor;
use crate::utils::logging::{self, FileIOType, OperationCategory};

/// One yaw offset of a schedule
#[derive(Debug, Serialize)]
struct YawRow {
    turbine: usize,
    wd: f64,
    ws: f64,
    yaw_deg: f64,
}

/// Direction-level metrics
#[derive(Debug, Serialize)]
struct DirectionRow {
    wd: f64,
    sector_frequency: f64,
    aep_gwh: f64,
    lcoe_usd_per_mwh: f64,
    cap_fac: f64,
}

/// Per-turbine availability
#[derive(Debug, Serialize)]
struct TurbineRow {
    turbine: usize,
    aep_gwh: f64,
    tke_ratio: f64,
    uptime: f64,
}

/// Writes run outputs into a timestamped subdirectory of the chosen export directory.
pub struct CsvExporter {
    output_dir: PathBuf,
    timestamp: String,
}

impl CsvExporter {
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let full_path = output_dir.as_ref().join(&timestamp);
        std::fs::create_dir_all(&full_path)
            .with_context(|| format!("Failed to create output directory {}", full_path.display()))?;

        Ok(Self {
            output_dir: full_path,
            timestamp,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Long-format yaw schedule: one row per (turbine, wd, ws).
    pub fn export_yaw_schedule(&self, name: &str, yaw: &YawTensor, wd: &[f64], ws: &[f64]) -> Result<PathBuf> {
        let _timing = logging::start_timing("export_yaw_schedule",
            OperationCategory::FileIO { subcategory: FileIOType::ResultsSave });

        let (n_wt, n_wd, n_ws) = yaw.shape();
        anyhow::ensure!(
            n_wd == wd.len() && n_ws == ws.len(),
            "yaw tensor shape {:?} does not match {} directions x {} speeds",
            yaw.shape(),
            wd.len(),
            ws.len()
        );

        let path = self.output_dir.join(format!("{}.csv", name));
        let mut writer = self.writer(&path)?;
        for i in 0..n_wt {
            for (l, direction) in wd.iter().enumerate() {
                for (k, speed) in ws.iter().enumerate() {
                    writer
                        .serialize(YawRow {
                            turbine: i,
                            wd: *direction,
                            ws: *speed,
                            yaw_deg: yaw.get(i, l, k),
                        })
                        .context("Failed to write yaw row")?;
                }
            }
        }
        writer.flush().context("Failed to flush CSV writer")?;
        Ok(path)
    }

    /// Per-direction AEP, LCoE and capacity factor.
    pub fn export_direction_metrics(
        &self,
        name: &str,
        metrics: &FarmMetrics,
        aggregated: &AggregatedMetrics,
    ) -> Result<PathBuf> {
        let _timing = logging::start_timing("export_direction_metrics",
            OperationCategory::FileIO { subcategory: FileIOType::ResultsSave });

        let path = self.output_dir.join(format!("{}.csv", name));
        let mut writer = self.writer(&path)?;
        let aep = metrics.aep.nansum_turbines();
        for (l, wd) in metrics.wd.iter().enumerate() {
            writer
                .serialize(DirectionRow {
                    wd: *wd,
                    sector_frequency: metrics.sector_frequency.weights()[l],
                    aep_gwh: aep[l],
                    lcoe_usd_per_mwh: aggregated.lcoe_direction.as_ref().map_or(f64::NAN, |v| v[l]),
                    cap_fac: aggregated.cap_fac_direction.as_ref().map_or(f64::NAN, |v| v[l]),
                })
                .context("Failed to write direction row")?;
        }
        writer.flush().context("Failed to flush CSV writer")?;
        Ok(path)
    }

    /// Per-turbine AEP and turbulence-driven uptime.
    pub fn export_turbine_metrics(&self, name: &str, metrics: &FarmMetrics) -> Result<PathBuf> {
        let _timing = logging::start_timing("export_turbine_metrics",
            OperationCategory::FileIO { subcategory: FileIOType::ResultsSave });

        let path = self.output_dir.join(format!("{}.csv", name));
        let mut writer = self.writer(&path)?;
        for (i, (tke_ratio, uptime)) in metrics.tke_ratio.iter().zip(&metrics.uptime).enumerate() {
            let aep: f64 = (0..metrics.aep.n_wd()).map(|l| metrics.aep.get(i, l)).sum();
            writer
                .serialize(TurbineRow {
                    turbine: i,
                    aep_gwh: aep,
                    tke_ratio: *tke_ratio,
                    uptime: *uptime,
                })
                .context("Failed to write turbine row")?;
        }
        writer.flush().context("Failed to flush CSV writer")?;
        Ok(path)
    }

    fn writer(&self, path: &Path) -> Result<Writer<File>> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Writer::from_writer(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaw_schedule_is_written_in_long_format() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path()).unwrap();
        assert!(exporter.output_dir().ends_with(exporter.timestamp()));

        let mut yaw = YawTensor::zeros((2, 1, 2));
        yaw.set(1, 0, 1, 12.5);
        let path = exporter.export_yaw_schedule("yaw_power", &yaw, &[270.0], &[6.0, 8.0]).unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "turbine,wd,ws,yaw_deg");
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[4], "1,270.0,8.0,12.5");
    }

    #[test]
    fn mismatched_grid_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path()).unwrap();
        let yaw = YawTensor::zeros((1, 2, 2));
        assert!(exporter.export_yaw_schedule("bad", &yaw, &[0.0], &[6.0, 8.0]).is_err());
    }
}
