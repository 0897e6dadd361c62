use std::collections::BTreeMap;

use tracing::debug;

use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::schema::{OffchainRecord, OffchainSummary, OnchainRecord, OnchainRow, Stat, Summary};
use crate::Experiment;

/// (name, step, client, treeHeight, numConditions)
type GroupKey = (String, String, String, u32, u32);

#[derive(Default)]
struct Samples {
    execution_time: Vec<f64>,
    peak_memory_usage: Vec<f64>,
    mean_memory_usage: Vec<f64>,
    std_memory_usage: Vec<f64>,
}

/// Mean and sample standard deviation (n - 1), ignoring NaN samples.
pub fn stat(values: &[f64]) -> Stat {
    let vs: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    let n = vs.len();
    if n == 0 {
        return Stat {
            mean: f64::NAN,
            std: None,
        };
    }

    let mean = vs.iter().sum::<f64>() / n as f64;
    let std = (n > 1).then(|| {
        let variance = vs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        variance.sqrt()
    });
    Stat { mean, std }
}

/// Groups off-chain trials of one step and reduces each group to statistics.
pub struct OffchainAggregator {
    step: String,
    groups: BTreeMap<GroupKey, Samples>,
}

impl OffchainAggregator {
    pub fn new(step: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            groups: BTreeMap::new(),
        }
    }

    /// Records of another step are ignored.
    pub fn push(&mut self, r: &OffchainRecord) {
        if r.step != self.step {
            return;
        }
        let key = (
            r.name.clone(),
            r.step.clone(),
            r.client.clone(),
            r.tree_height,
            r.num_conditions,
        );
        let s = self.groups.entry(key).or_default();
        s.execution_time.push(r.execution_time);
        s.peak_memory_usage.push(r.peak_memory_usage);
        s.mean_memory_usage.push(r.mean_memory_usage);
        s.std_memory_usage.push(r.std_memory_usage);
    }

    /// One row per group, sorted by (name, treeHeight, numConditions, client).
    pub fn finish(self) -> Vec<OffchainSummary> {
        let mut rows: Vec<OffchainSummary> = self
            .groups
            .into_iter()
            .map(|((name, step, client, tree_height, num_conditions), s)| {
                debug!(
                    "group {name}/{step}/{client} h={tree_height} c={num_conditions}: {} trials",
                    s.execution_time.len()
                );
                OffchainSummary {
                    name,
                    step,
                    client,
                    tree_height,
                    num_conditions,
                    execution_time: stat(&s.execution_time),
                    peak_memory_usage: stat(&s.peak_memory_usage),
                    mean_memory_usage: stat(&s.mean_memory_usage),
                    std_memory_usage: stat(&s.std_memory_usage),
                    display: None,
                }
            })
            .collect();
        sort_offchain(&mut rows);
        rows
    }
}

pub fn sort_offchain(rows: &mut [OffchainSummary]) {
    rows.sort_by(|a, b| {
        (&a.name, a.tree_height, a.num_conditions, &a.client).cmp(&(
            &b.name,
            b.tree_height,
            b.num_conditions,
            &b.client,
        ))
    });
}

/// On-chain records are not grouped, only ordered by
/// (mode, treeHeight, numConditions, networkName).
pub fn sort_onchain(mut records: Vec<OnchainRecord>) -> Vec<OnchainRow> {
    records.sort_by(|a, b| {
        (a.mode, a.tree_height, a.num_conditions, &a.network_name).cmp(&(
            b.mode,
            b.tree_height,
            b.num_conditions,
            &b.network_name,
        ))
    });
    records.into_iter().map(OnchainRow::from).collect()
}

pub fn aggregate(experiment: Experiment, dataset: Dataset) -> Result<Summary> {
    let summary = match (experiment.step(), dataset) {
        (Some(step), Dataset::Offchain(records)) => {
            let mut agg = OffchainAggregator::new(step);
            for r in &records {
                agg.push(r);
            }
            Summary::Offchain(agg.finish())
        }
        (None, Dataset::Onchain(records)) => Summary::Onchain(sort_onchain(records)),
        (_, dataset) => {
            let kind = match dataset {
                Dataset::Offchain(_) => "off-chain",
                Dataset::Onchain(_) => "on-chain",
            };
            return Err(Error::UnsupportedExperiment(format!(
                "{experiment} cannot aggregate {kind} records"
            )));
        }
    };
    debug!("{experiment}: {} summary rows", summary.len());
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rand_chacha::rand_core::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    fn offchain(client: &str, step: &str, h: u32, c: u32, time: f64) -> OffchainRecord {
        OffchainRecord {
            name: "SingleProof".into(),
            step: step.into(),
            client: client.into(),
            tree_height: h,
            num_conditions: c,
            execution_time: time,
            peak_memory_usage: 2.0 * time,
            mean_memory_usage: 3.0 * time,
            std_memory_usage: 4.0 * time,
        }
    }

    fn random_offchain(rng: &mut ChaCha8Rng) -> OffchainRecord {
        let names = ["SingleProof", "MultiProof"];
        let steps = ["prove", "verify"];
        let clients = ["nargo", "noir_rs"];
        OffchainRecord {
            name: names[rng.gen_range(0..names.len())].into(),
            step: steps[rng.gen_range(0..steps.len())].into(),
            client: clients[rng.gen_range(0..clients.len())].into(),
            tree_height: [8, 16, 32][rng.gen_range(0..3)],
            num_conditions: rng.gen_range(1..=5),
            execution_time: rng.gen_range(10.0..5_000.0),
            peak_memory_usage: rng.gen_range(1e6..4e9),
            mean_memory_usage: rng.gen_range(1e6..4e9),
            std_memory_usage: rng.gen_range(0.0..1e6),
        }
    }

    #[test]
    fn test_stat_two_samples() {
        let s = stat(&[100.0, 200.0]);
        assert_eq!(s.mean, 150.0);
        let std = s.std.unwrap();
        assert!((std - 50.0 * 2f64.sqrt()).abs() < 1e-9, "std={std}");
    }

    #[test]
    fn test_stat_single_sample_has_no_std() {
        let s = stat(&[42.0]);
        assert_eq!(s.mean, 42.0);
        assert_eq!(s.std, None);
    }

    #[test]
    fn test_stat_skips_nan() {
        let s = stat(&[f64::NAN, 10.0, 20.0]);
        assert_eq!(s.mean, 15.0);
        assert!(stat(&[f64::NAN]).mean.is_nan());
    }

    #[test]
    fn test_two_trials_average_every_metric() {
        let records = vec![
            offchain("nargo", "verify", 8, 3, 100.0),
            offchain("nargo", "verify", 8, 3, 200.0),
        ];
        let Summary::Offchain(rows) =
            aggregate(Experiment::OffchainVerify, Dataset::Offchain(records)).unwrap()
        else {
            panic!("expected off-chain summary");
        };
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.execution_time.mean, 150.0);
        assert_eq!(row.peak_memory_usage.mean, 300.0);
        assert_eq!(row.mean_memory_usage.mean, 450.0);
        assert_eq!(row.std_memory_usage.mean, 600.0);
        let expected = stat(&[200.0, 400.0]).std.unwrap();
        assert_eq!(row.peak_memory_usage.std, Some(expected));
    }

    #[test]
    fn test_step_filter() {
        let records = vec![
            offchain("nargo", "verify", 8, 1, 10.0),
            offchain("nargo", "prove", 8, 1, 1_000.0),
        ];
        let prove = aggregate(Experiment::OffchainProve, Dataset::Offchain(records)).unwrap();
        let Summary::Offchain(rows) = prove else {
            panic!("expected off-chain summary");
        };
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].step, "prove");
        assert_eq!(rows[0].execution_time.mean, 1_000.0);
    }

    #[test]
    fn test_one_row_per_group_and_sorted() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let records: Vec<OffchainRecord> = (0..500).map(|_| random_offchain(&mut rng)).collect();

        let expected: HashSet<GroupKey> = records
            .iter()
            .filter(|r| r.step == "verify")
            .map(|r| {
                (
                    r.name.clone(),
                    r.step.clone(),
                    r.client.clone(),
                    r.tree_height,
                    r.num_conditions,
                )
            })
            .collect();

        let Summary::Offchain(rows) =
            aggregate(Experiment::OffchainVerify, Dataset::Offchain(records)).unwrap()
        else {
            panic!("expected off-chain summary");
        };
        assert_eq!(rows.len(), expected.len());

        for pair in rows.windows(2) {
            let a = (&pair[0].name, pair[0].tree_height, pair[0].num_conditions, &pair[0].client);
            let b = (&pair[1].name, pair[1].tree_height, pair[1].num_conditions, &pair[1].client);
            assert!(a <= b, "{a:?} > {b:?}");
        }
    }

    #[test]
    fn test_onchain_rows_sorted_without_grouping() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let networks = ["local", "sepolia"];
        let records: Vec<OnchainRecord> = (0..200)
            .map(|_| OnchainRecord {
                mode: rng.gen_range(0..2),
                tree_height: [16, 32][rng.gen_range(0..2)],
                num_conditions: rng.gen_range(1..=5),
                network_name: networks[rng.gen_range(0..2)].into(),
                gas_used: rng.gen_range(200_000..2_000_000),
            })
            .collect();

        let Summary::Onchain(rows) =
            aggregate(Experiment::OnchainVerify, Dataset::Onchain(records)).unwrap()
        else {
            panic!("expected on-chain summary");
        };
        assert_eq!(rows.len(), 200);
        for pair in rows.windows(2) {
            let (a, b) = (&pair[0].record, &pair[1].record);
            assert!(
                (a.mode, a.tree_height, a.num_conditions, &a.network_name)
                    <= (b.mode, b.tree_height, b.num_conditions, &b.network_name)
            );
        }
    }

    #[test]
    fn test_mismatched_dataset_is_unsupported() {
        let err = aggregate(Experiment::OnchainVerify, Dataset::Offchain(Vec::new())).unwrap_err();
        assert!(matches!(err, Error::UnsupportedExperiment(_)));
    }
}
