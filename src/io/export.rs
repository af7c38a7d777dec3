//! CSV step telemetry and JSON run results.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;

use crate::config::SimulationConfig;
use crate::sim::metrics::MetricsSummary;
use crate::sim::types::StepRecord;

/// Column header for CSV telemetry export.
const HEADER: &str = "timestep,timestamp,load_mw,gpu_mw,cpu_mw,asic_mw,storage_mw,\
                       network_mw,cooling_mw,overhead_mw,wind_generated_mw,\
                       transmission_loss_mw,wind_available_mw,wind_used_mw,\
                       wind_curtailed_mw,solar_available_mw,solar_used_mw,\
                       solar_curtailed_mw,grid_import_mw,battery_charge_mw,\
                       battery_discharge_mw,soc_mwh,deficit_mw,utilization_ratio";

/// Exports step records to a CSV file at the given path.
///
/// Writes a header row followed by one data row per step. Produces
/// deterministic output for identical inputs.
///
/// # Arguments
///
/// * `records` - Complete simulation step records
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(records: &[StepRecord], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(records, buf)
}

/// Writes step records as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(records: &[StepRecord], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in records {
        let l = &r.load;
        let d = &r.decision;
        wtr.write_record(&[
            r.timestep.to_string(),
            r.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string(),
            format!("{:.6}", l.total_mw),
            format!("{:.6}", l.gpu_mw),
            format!("{:.6}", l.cpu_mw),
            format!("{:.6}", l.asic_mw),
            format!("{:.6}", l.storage_mw),
            format!("{:.6}", l.network_mw),
            format!("{:.6}", l.cooling_mw),
            format!("{:.6}", l.overhead_mw),
            format!("{:.6}", r.wind.generated_mw),
            format!("{:.6}", r.wind.loss_mw),
            format!("{:.6}", r.wind.delivered_mw),
            format!("{:.6}", d.wind_used_mw),
            format!("{:.6}", d.wind_curtailed_mw),
            format!("{:.6}", r.solar_available_mw),
            format!("{:.6}", d.solar_used_mw),
            format!("{:.6}", d.solar_curtailed_mw),
            format!("{:.6}", d.grid_import_mw),
            format!("{:.6}", d.battery_charge_mw),
            format!("{:.6}", d.battery_discharge_mw),
            format!("{:.6}", d.soc_mwh),
            format!("{:.6}", r.deficit_mw),
            format!("{:.4}", r.utilization_ratio),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Everything a run produced, as written to the results file.
#[derive(Debug, Serialize)]
pub struct RunResults<'a> {
    pub config: &'a SimulationConfig,
    pub summary: &'a MetricsSummary,
    pub steps: &'a [StepRecord],
}

/// Writes run results as pretty-printed JSON to a file at the given path.
///
/// # Errors
///
/// Returns an `io::Error` if file creation, serialization or writing fails.
pub fn export_json(results: &RunResults<'_>, path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_json(results, io::BufWriter::new(file))
}

/// Writes run results as pretty-printed JSON to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if serialization or writing fails.
pub fn write_json(results: &RunResults<'_>, mut writer: impl Write) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut writer, results)?;
    writeln!(writer)?;
    writer.flush()
}
