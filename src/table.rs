//! Comma-delimited summary table, written once per run as `<experiment>.csv`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Error, Result};
use crate::schema::{Column, Row, Summary};
use crate::Experiment;

pub const OFFCHAIN_COLUMNS: [Column; 13] = [
    Column::Name,
    Column::Step,
    Column::Client,
    Column::TreeHeight,
    Column::NumConditions,
    Column::ExecutionTimeMean,
    Column::ExecutionTimeStd,
    Column::PeakMemoryUsageMean,
    Column::PeakMemoryUsageStd,
    Column::MeanMemoryUsageMean,
    Column::MeanMemoryUsageStd,
    Column::StdMemoryUsageMean,
    Column::StdMemoryUsageStd,
];

pub const ONCHAIN_COLUMNS: [Column; 5] = [
    Column::Mode,
    Column::TreeHeight,
    Column::NumConditions,
    Column::NetworkName,
    Column::GasUsed,
];

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn render_rows<R: Row>(columns: &[Column], rows: &[R]) -> String {
    let mut out = columns
        .iter()
        .map(|c| c.name())
        .collect::<Vec<_>>()
        .join(",");
    out.push('\n');

    for row in rows {
        let line = columns
            .iter()
            .map(|&c| {
                row.value(c)
                    .map(|v| escape(&v.to_string()))
                    .unwrap_or_default()
            })
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Render the summary as CSV text. Missing values (an undefined std) are empty fields.
pub fn to_csv(summary: &Summary) -> String {
    match summary {
        Summary::Offchain(rows) => render_rows(&OFFCHAIN_COLUMNS, rows),
        Summary::Onchain(rows) => render_rows(&ONCHAIN_COLUMNS, rows),
    }
}

pub fn table_path(dir: &Path, experiment: Experiment) -> PathBuf {
    dir.join(format!("{}.csv", experiment.as_str()))
}

/// Write the summary table, replacing any previous one.
pub fn write_summary(dir: &Path, experiment: Experiment, summary: &Summary) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    let path = table_path(dir, experiment);
    fs::write(&path, to_csv(summary)).map_err(|e| Error::io(&path, e))?;
    info!("wrote summary table {} ({} rows)", path.display(), summary.len());
    Ok(path)
}
