use std::fmt;

use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};

/// Metrics serialized as `null` (e.g. a std over a single sample) load as NaN
/// and are skipped by aggregation.
fn nullable_metric<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// One off-chain trial (`data/offchain/*.json`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffchainRecord {
    pub name: String,
    pub step: String,
    pub client: String,
    pub tree_height: u32,
    pub num_conditions: u32,

    /// Milliseconds.
    #[serde(deserialize_with = "nullable_metric")]
    pub execution_time: f64,
    /// Bytes.
    #[serde(deserialize_with = "nullable_metric")]
    pub peak_memory_usage: f64,
    #[serde(deserialize_with = "nullable_metric")]
    pub mean_memory_usage: f64,
    #[serde(deserialize_with = "nullable_metric")]
    pub std_memory_usage: f64,
}

/// One on-chain gas measurement (`data/onchain-ver/*.json`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnchainRecord {
    /// 0 = single proof, 1 = multi proof.
    pub mode: u32,
    pub tree_height: u32,
    pub num_conditions: u32,
    pub network_name: String,
    pub gas_used: u64,
}

/// Mean and sample standard deviation of one metric within a group.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Stat {
    pub mean: f64,
    /// `None` when fewer than two samples were available.
    pub std: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OffchainSummary {
    pub name: String,
    pub step: String,
    pub client: String,
    pub tree_height: u32,
    pub num_conditions: u32,

    pub execution_time: Stat,
    pub peak_memory_usage: Stat,
    pub mean_memory_usage: Stat,
    pub std_memory_usage: Stat,

    /// Presentation columns, filled in by [`crate::derive`].
    pub display: Option<OffchainDisplay>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OffchainDisplay {
    pub execution_time_mean_s: f64,
    pub peak_memory_usage_mean_m: f64,
    pub peak_memory_usage_mean_g: f64,
    pub mode: String,
    pub verify_time_s: f64,
    pub prove_time_s: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OnchainRow {
    pub record: OnchainRecord,
    pub display: Option<OnchainDisplay>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OnchainDisplay {
    pub mode_id: u32,
    pub gas_used_k: f64,
    /// Relabelled mode (`SingleProof` / `MultiProof`).
    pub mode: String,
}

impl From<OnchainRecord> for OnchainRow {
    fn from(record: OnchainRecord) -> Self {
        Self {
            record,
            display: None,
        }
    }
}

/// Aggregated table for one experiment.
#[derive(Debug, Clone, PartialEq)]
pub enum Summary {
    Offchain(Vec<OffchainSummary>),
    Onchain(Vec<OnchainRow>),
}

impl Summary {
    pub fn len(&self) -> usize {
        match self {
            Summary::Offchain(rows) => rows.len(),
            Summary::Onchain(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Every column a summary row can expose, under its flattened table name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Column {
    Name,
    Step,
    Client,
    TreeHeight,
    NumConditions,
    ExecutionTimeMean,
    ExecutionTimeStd,
    PeakMemoryUsageMean,
    PeakMemoryUsageStd,
    MeanMemoryUsageMean,
    MeanMemoryUsageStd,
    StdMemoryUsageMean,
    StdMemoryUsageStd,
    ExecutionTimeMeanS,
    PeakMemoryUsageMeanM,
    PeakMemoryUsageMeanG,
    VerifyTimeS,
    ProveTimeS,
    Mode,
    ModeId,
    NetworkName,
    GasUsed,
    GasUsedK,
}

impl Column {
    pub fn name(&self) -> &'static str {
        match self {
            Column::Name => "name",
            Column::Step => "step",
            Column::Client => "client",
            Column::TreeHeight => "treeHeight",
            Column::NumConditions => "numConditions",
            Column::ExecutionTimeMean => "executionTime_mean",
            Column::ExecutionTimeStd => "executionTime_std",
            Column::PeakMemoryUsageMean => "peakMemoryUsage_mean",
            Column::PeakMemoryUsageStd => "peakMemoryUsage_std",
            Column::MeanMemoryUsageMean => "meanMemoryUsage_mean",
            Column::MeanMemoryUsageStd => "meanMemoryUsage_std",
            Column::StdMemoryUsageMean => "stdMemoryUsage_mean",
            Column::StdMemoryUsageStd => "stdMemoryUsage_std",
            Column::ExecutionTimeMeanS => "executionTime_meanS",
            Column::PeakMemoryUsageMeanM => "peakMemoryUsage_meanM",
            Column::PeakMemoryUsageMeanG => "peakMemoryUsage_meanG",
            Column::VerifyTimeS => "verifyTimeS",
            Column::ProveTimeS => "proveTimeS",
            Column::Mode => "mode",
            Column::ModeId => "modeId",
            Column::NetworkName => "networkName",
            Column::GasUsed => "gasUsed",
            Column::GasUsedK => "gasUsedK",
        }
    }

    /// Axis and legend title. Only columns that are charted have one.
    pub fn title(&self) -> Result<&'static str> {
        let title = match self {
            Column::ExecutionTimeMeanS => "Execution Time (seconds)",
            Column::NumConditions => "Conditions",
            Column::Mode => "Mode",
            Column::TreeHeight => "Revocation Tree Height",
            Column::PeakMemoryUsageMean => "Peak Memory (bytes)",
            Column::PeakMemoryUsageMeanM => "Peak Memory (MBs)",
            Column::PeakMemoryUsageMeanG => "Peak Memory (GBs)",
            Column::GasUsed => "Gas Consumption",
            Column::GasUsedK => "Gas Consumption (kGas)",
            _ => return Err(Error::UnknownColumn(self.name().to_string())),
        };
        Ok(title)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Text(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(v) => f.write_str(v),
        }
    }
}

/// Column access used by the table writer and the chart renderer.
pub trait Row {
    /// `None` when the row does not carry `column` (e.g. a derived column before
    /// [`crate::derive`] ran, or an undefined std).
    fn value(&self, column: Column) -> Option<Value>;
}

fn text(s: &str) -> Option<Value> {
    Some(Value::Text(s.to_string()))
}

impl Row for OffchainSummary {
    fn value(&self, column: Column) -> Option<Value> {
        let display = self.display.as_ref();
        match column {
            Column::Name => text(&self.name),
            Column::Step => text(&self.step),
            Column::Client => text(&self.client),
            Column::TreeHeight => Some(Value::Int(self.tree_height.into())),
            Column::NumConditions => Some(Value::Int(self.num_conditions.into())),
            Column::ExecutionTimeMean => Some(Value::Float(self.execution_time.mean)),
            Column::ExecutionTimeStd => self.execution_time.std.map(Value::Float),
            Column::PeakMemoryUsageMean => Some(Value::Float(self.peak_memory_usage.mean)),
            Column::PeakMemoryUsageStd => self.peak_memory_usage.std.map(Value::Float),
            Column::MeanMemoryUsageMean => Some(Value::Float(self.mean_memory_usage.mean)),
            Column::MeanMemoryUsageStd => self.mean_memory_usage.std.map(Value::Float),
            Column::StdMemoryUsageMean => Some(Value::Float(self.std_memory_usage.mean)),
            Column::StdMemoryUsageStd => self.std_memory_usage.std.map(Value::Float),
            Column::ExecutionTimeMeanS => display.map(|d| Value::Float(d.execution_time_mean_s)),
            Column::PeakMemoryUsageMeanM => {
                display.map(|d| Value::Float(d.peak_memory_usage_mean_m))
            }
            Column::PeakMemoryUsageMeanG => {
                display.map(|d| Value::Float(d.peak_memory_usage_mean_g))
            }
            Column::VerifyTimeS => display.map(|d| Value::Float(d.verify_time_s)),
            Column::ProveTimeS => display.map(|d| Value::Float(d.prove_time_s)),
            Column::Mode => display.map(|d| Value::Text(d.mode.clone())),
            Column::ModeId
            | Column::NetworkName
            | Column::GasUsed
            | Column::GasUsedK => None,
        }
    }
}

impl Row for OnchainRow {
    fn value(&self, column: Column) -> Option<Value> {
        let r = &self.record;
        let display = self.display.as_ref();
        match column {
            Column::Mode => Some(match display {
                Some(d) => Value::Text(d.mode.clone()),
                None => Value::Int(r.mode.into()),
            }),
            Column::TreeHeight => Some(Value::Int(r.tree_height.into())),
            Column::NumConditions => Some(Value::Int(r.num_conditions.into())),
            Column::NetworkName => text(&r.network_name),
            Column::GasUsed => i64::try_from(r.gas_used).ok().map(Value::Int),
            Column::ModeId => display.map(|d| Value::Int(d.mode_id.into())),
            Column::GasUsedK => display.map(|d| Value::Float(d.gas_used_k)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offchain_record_parses_camel_case() {
        let json = r#"{
            "name": "SingleProof", "step": "verify", "client": "nargo",
            "treeHeight": 8, "numConditions": 3, "executionTime": 120,
            "peakMemoryUsage": 1048576, "meanMemoryUsage": 524288.5,
            "stdMemoryUsage": null, "trial": 2
        }"#;
        let rec: OffchainRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.client, "nargo");
        assert_eq!(rec.tree_height, 8);
        assert_eq!(rec.execution_time, 120.0);
        assert!(rec.std_memory_usage.is_nan());
    }

    #[test]
    fn test_offchain_record_requires_fields() {
        let json = r#"{"name": "SingleProof", "step": "verify", "client": "nargo",
            "treeHeight": 8, "executionTime": 1, "peakMemoryUsage": 1,
            "meanMemoryUsage": 1, "stdMemoryUsage": 1}"#;
        let err = serde_json::from_str::<OffchainRecord>(json).unwrap_err();
        assert!(err.to_string().contains("numConditions"), "{err}");
    }

    #[test]
    fn test_onchain_record_rejects_text_mode() {
        let json = r#"{"mode": "single", "treeHeight": 32, "numConditions": 1,
            "networkName": "local", "gasUsed": 300000}"#;
        assert!(serde_json::from_str::<OnchainRecord>(json).is_err());
    }

    #[test]
    fn test_display_titles() {
        assert_eq!(Column::GasUsedK.title().unwrap(), "Gas Consumption (kGas)");
        assert_eq!(Column::TreeHeight.title().unwrap(), "Revocation Tree Height");
        assert!(
            matches!(Column::Client.title(), Err(Error::UnknownColumn(ref c)) if c == "client")
        );
    }

    #[test]
    fn test_onchain_mode_before_and_after_display() {
        let mut row = OnchainRow::from(OnchainRecord {
            mode: 1,
            tree_height: 32,
            num_conditions: 2,
            network_name: "local".into(),
            gas_used: 420_000,
        });
        assert_eq!(row.value(Column::Mode), Some(Value::Int(1)));
        assert_eq!(row.value(Column::GasUsedK), None);

        row.display = Some(OnchainDisplay {
            mode_id: 1,
            gas_used_k: 420.0,
            mode: "MultiProof".into(),
        });
        assert_eq!(row.value(Column::Mode), Some(Value::Text("MultiProof".into())));
        assert_eq!(row.value(Column::ModeId), Some(Value::Int(1)));
    }
}
