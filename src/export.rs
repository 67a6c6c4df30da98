//! Writes the CSV, JSON and HTML artifacts of a finished run.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::OutputConfig;
use crate::error::ExportError;
use crate::report::{ReportBuilder, RunInfo};

#[derive(Debug, Clone, PartialEq)]
pub struct Artifacts {
    pub csv: PathBuf,
    pub json: PathBuf,
    pub html: PathBuf,
}

impl Artifacts {
    pub fn new(output: &OutputConfig) -> Self {
        let path = |ext: &str| output.dir.join(format!("{}.{ext}", output.base_name));
        Self {
            csv: path("csv"),
            json: path("json"),
            html: path("html"),
        }
    }
}

/// Creates the output directory and writes all three artifacts.
pub fn write_all(
    output: &OutputConfig,
    report: &ReportBuilder<'_>,
    run: &RunInfo,
) -> Result<Artifacts, ExportError> {
    fs::create_dir_all(&output.dir).map_err(|source| ExportError::Io {
        path: output.dir.clone(),
        source,
    })?;
    let artifacts = Artifacts::new(output);

    write_csv(&artifacts.csv, report)?;
    info!(path = %artifacts.csv.display(), "Results saved");

    let json = serde_json::to_string_pretty(&report.tree()?)?;
    write_file(&artifacts.json, json)?;
    info!(path = %artifacts.json.display(), "Results saved");

    write_file(&artifacts.html, report.html(run))?;
    info!(path = %artifacts.html.display(), "HTML report saved");

    Ok(artifacts)
}

fn write_csv(path: &Path, report: &ReportBuilder<'_>) -> Result<(), ExportError> {
    let table = report.table();
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(table.headers)?;
    for row in &table.rows {
        wtr.write_record(row)?;
    }
    wtr.flush().map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

fn write_file(path: &Path, contents: String) -> Result<(), ExportError> {
    fs::write(path, contents).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}
