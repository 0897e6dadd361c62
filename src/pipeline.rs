//! Load, aggregate, write the table, derive display columns, chart.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::aggregate::aggregate;
use crate::config::ReportConfig;
use crate::dataset;
use crate::derive;
use crate::error::Result;
use crate::logging::LogContext;
use crate::schema::Summary;
use crate::table;
use crate::visualize::visualize;

#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub table: PathBuf,
    pub charts: Vec<PathBuf>,
    /// Aggregated rows with display columns filled in.
    pub summary: Summary,
}

/// Run the whole report once. The first error aborts the run.
pub fn run(log: &LogContext, cfg: &ReportConfig) -> Result<ReportOutcome> {
    log.scope(|| {
        debug!("log level {}", log.level());
        run_stages(cfg)
    })
}

fn run_stages(cfg: &ReportConfig) -> Result<ReportOutcome> {
    let exp = cfg.experiment;
    info!("report {exp}: data under {}", cfg.data_root.display());

    let data = dataset::load(&cfg.data_root, exp)?;
    info!("{exp}: loaded {} records", data.len());

    let mut summary = aggregate(exp, data)?;
    let table = table::write_summary(&cfg.table_dir, exp, &summary)?;

    derive::apply(&mut summary);

    let charts = visualize(exp, &summary, &cfg.image_dir, cfg.show)?;
    info!("{exp}: {} charts written", charts.len());

    Ok(ReportOutcome {
        table,
        charts,
        summary,
    })
}
