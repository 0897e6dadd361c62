//! Presentation-only columns added in place to an aggregated summary.

use tracing::debug;

use crate::schema::{OffchainDisplay, OffchainSummary, OnchainDisplay, OnchainRow, Summary};

const MS_PER_S: f64 = 1000.0;
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;
const GAS_PER_KGAS: f64 = 1000.0;

/// Display label for an on-chain mode code. Codes other than 0 and 1 are shown
/// as the number itself.
pub fn mode_label(code: u32) -> String {
    match code {
        0 => "SingleProof".to_string(),
        1 => "MultiProof".to_string(),
        other => {
            debug!("no label for mode code {other}, keeping it as is");
            other.to_string()
        }
    }
}

fn offchain_display(row: &OffchainSummary) -> OffchainDisplay {
    let seconds = row.execution_time.mean / MS_PER_S;
    OffchainDisplay {
        execution_time_mean_s: seconds,
        peak_memory_usage_mean_m: row.peak_memory_usage.mean / BYTES_PER_MB,
        peak_memory_usage_mean_g: row.peak_memory_usage.mean / BYTES_PER_GB,
        mode: row.name.clone(),
        verify_time_s: seconds,
        prove_time_s: seconds,
    }
}

fn onchain_display(row: &OnchainRow) -> OnchainDisplay {
    OnchainDisplay {
        mode_id: row.record.mode,
        gas_used_k: row.record.gas_used as f64 / GAS_PER_KGAS,
        mode: mode_label(row.record.mode),
    }
}

/// Fill the display columns of every row. Row count and order are unchanged.
pub fn apply(summary: &mut Summary) {
    match summary {
        Summary::Offchain(rows) => {
            for row in rows.iter_mut() {
                row.display = Some(offchain_display(row));
            }
        }
        Summary::Onchain(rows) => {
            for row in rows.iter_mut() {
                row.display = Some(onchain_display(row));
            }
        }
    }
}
