//! Chart routines for each experiment.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::chart::{self, render_line_chart, ChartSpec};
use crate::error::{Error, Result};
use crate::schema::{Column, OffchainSummary, OnchainRow, Row, Summary};
use crate::Experiment;

/// Clients compared in the off-chain charts.
pub const OFFCHAIN_CLIENTS: [&str; 2] = ["noir_rs", "nargo"];
/// Metrics charted for every off-chain client.
pub const OFFCHAIN_METRICS: [Column; 2] = [Column::ExecutionTimeMeanS, Column::PeakMemoryUsageMeanG];

/// On-chain charts only cover this tree height on this network.
pub const ONCHAIN_TREE_HEIGHT: u32 = 32;
pub const ONCHAIN_NETWORK: &str = "local";

/// Figure name: `<prefix>-<metric>-<subset>`.
pub fn figure_name(prefix: &str, metric: Column, subset: &str) -> String {
    format!("{prefix}-{}-{subset}", metric.name())
}

fn offchain_prefix(experiment: Experiment) -> &'static str {
    match experiment {
        Experiment::OffchainProve => "offchain_prove",
        _ => "offchain_verify",
    }
}

/// Render one chart, then open it right away when `show` is set.
fn render<R: Row>(
    rows: &[R],
    spec: &ChartSpec,
    out_dir: &Path,
    show: bool,
) -> Result<Option<PathBuf>> {
    let path = render_line_chart(rows, spec, out_dir)?;
    if show {
        if let Some(path) = &path {
            chart::show(path)?;
        }
    }
    Ok(path)
}

fn visualize_offchain(
    experiment: Experiment,
    rows: &[OffchainSummary],
    out_dir: &Path,
    show: bool,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for client in OFFCHAIN_CLIENTS {
        let subset: Vec<OffchainSummary> = rows.iter().filter(|r| r.client == client).cloned().collect();
        debug!("{experiment}/{client}: {} rows", subset.len());

        for metric in OFFCHAIN_METRICS {
            let spec = ChartSpec {
                x: Column::NumConditions,
                y: metric,
                hue: Column::TreeHeight,
                style: Column::Mode,
                name: figure_name(offchain_prefix(experiment), metric, client),
            };
            written.extend(render(&subset, &spec, out_dir, show)?);
        }
    }
    Ok(written)
}

fn visualize_onchain(rows: &[OnchainRow], out_dir: &Path, show: bool) -> Result<Vec<PathBuf>> {
    let subset: Vec<OnchainRow> = rows
        .iter()
        .filter(|r| {
            r.record.tree_height == ONCHAIN_TREE_HEIGHT && r.record.network_name == ONCHAIN_NETWORK
        })
        .cloned()
        .collect();
    info!(
        "onchain-verify: {} rows at treeHeight={ONCHAIN_TREE_HEIGHT} on {ONCHAIN_NETWORK}",
        subset.len()
    );
    for r in &subset {
        debug!("{:?}", r);
    }

    let spec = ChartSpec {
        x: Column::NumConditions,
        y: Column::GasUsedK,
        hue: Column::Mode,
        style: Column::Mode,
        name: figure_name("onchain_verify", Column::GasUsed, ONCHAIN_NETWORK),
    };
    Ok(render(&subset, &spec, out_dir, show)?.into_iter().collect())
}

/// Render every chart of `experiment` into `out_dir`. Expects derived columns.
/// With `show`, each chart is opened as soon as it is saved.
pub fn visualize(
    experiment: Experiment,
    summary: &Summary,
    out_dir: &Path,
    show: bool,
) -> Result<Vec<PathBuf>> {
    match (experiment, summary) {
        (Experiment::OffchainProve | Experiment::OffchainVerify, Summary::Offchain(rows)) => {
            visualize_offchain(experiment, rows, out_dir, show)
        }
        (Experiment::OnchainVerify, Summary::Onchain(rows)) => visualize_onchain(rows, out_dir, show),
        _ => Err(Error::UnsupportedExperiment(format!(
            "{experiment} cannot chart this summary"
        ))),
    }
}
