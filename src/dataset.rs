//! Discovery and loading of raw benchmark records.
//!
//! Each experiment reads every `*.json` file directly under its data directory:
//!
//! ```text
//! <data_root>/offchain/*.json     offchain-verify, offchain-prove
//! <data_root>/onchain-ver/*.json  onchain-verify
//! ```
//!
//! Every file holds a JSON array of flat records. Arrays are concatenated in
//! path order so repeated runs see the same row order.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::schema::{OffchainRecord, OnchainRecord};
use crate::Experiment;

/// Extension of raw result files.
const DATA_EXTENSION: &str = "json";

/// Raw records of one experiment category.
#[derive(Debug, Clone, PartialEq)]
pub enum Dataset {
    Offchain(Vec<OffchainRecord>),
    Onchain(Vec<OnchainRecord>),
}

impl Dataset {
    pub fn len(&self) -> usize {
        match self {
            Dataset::Offchain(v) => v.len(),
            Dataset::Onchain(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn data_dir(root: &Path, experiment: Experiment) -> PathBuf {
    root.join(experiment.data_dir())
}

/// List result files for `experiment`, sorted by path.
///
/// A missing directory is not an error: it yields no files.
pub fn discover(root: &Path, experiment: Experiment) -> Result<Vec<PathBuf>> {
    let dir = data_dir(root, experiment);
    if !dir.is_dir() {
        warn!("data directory {} does not exist", dir.display());
        return Ok(Vec::new());
    }

    let mut out = Vec::new();
    for entry in WalkDir::new(&dir).min_depth(1).max_depth(1).follow_links(true) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir.as_path()).to_path_buf();
            Error::io(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        // Shell globs skip dotfiles.
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        let is_json = entry
            .path()
            .extension()
            .is_some_and(|ext| ext == DATA_EXTENSION);
        if is_json && !hidden {
            out.push(entry.into_path());
        }
    }
    out.sort();
    Ok(out)
}

/// Read one file as a JSON array of `T`. The file is closed before returning,
/// whether or not parsing succeeded.
pub fn load_file<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|e| Error::json(path, e))
}

pub fn load_records<T: DeserializeOwned>(paths: &[PathBuf]) -> Result<Vec<T>> {
    let mut records = Vec::new();
    for path in paths {
        let batch: Vec<T> = load_file(path)?;
        debug!("{}: {} records", path.display(), batch.len());
        records.extend(batch);
    }
    Ok(records)
}

/// Discover and load every record for `experiment`.
pub fn load(root: &Path, experiment: Experiment) -> Result<Dataset> {
    let paths = discover(root, experiment)?;
    info!(
        "{}: {} result files under {}",
        experiment,
        paths.len(),
        data_dir(root, experiment).display()
    );

    let dataset = if experiment.is_offchain() {
        Dataset::Offchain(load_records(&paths)?)
    } else {
        Dataset::Onchain(load_records(&paths)?)
    };

    if dataset.is_empty() {
        warn!("{}: no records found, continuing with an empty dataset", experiment);
    }
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, contents: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(name), contents).unwrap();
    }

    fn onchain_json(mode: u32, gas: u64) -> String {
        format!(
            r#"[{{"treeHeight": 32, "numConditions": 1, "mode": {mode}, "networkName": "local", "gasUsed": {gas}}}]"#
        )
    }

    #[test]
    fn test_discover_filters_and_sorts() {
        let dir = tempdir().unwrap();
        let data = dir.path().join("onchain-ver");
        write(&data, "b.json", "[]");
        write(&data, "a.json", "[]");
        write(&data, "notes.txt", "ignored");
        write(&data, ".hidden.json", "[]");
        write(&data.join("nested"), "c.json", "[]");

        let files = discover(dir.path(), Experiment::OnchainVerify).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.json", "b.json"]);
    }

    #[test]
    fn test_missing_directory_yields_empty_dataset() {
        let dir = tempdir().unwrap();
        let dataset = load(dir.path(), Experiment::OffchainProve).unwrap();
        assert_eq!(dataset, Dataset::Offchain(Vec::new()));
        assert!(dataset.is_empty());
    }

    #[test]
    fn test_arrays_are_concatenated_in_path_order() {
        let dir = tempdir().unwrap();
        let data = dir.path().join("onchain-ver");
        write(&data, "2.json", &onchain_json(1, 200));
        write(&data, "1.json", &onchain_json(0, 100));

        let Dataset::Onchain(records) = load(dir.path(), Experiment::OnchainVerify).unwrap() else {
            panic!("expected on-chain dataset");
        };
        let gas: Vec<u64> = records.iter().map(|r| r.gas_used).collect();
        assert_eq!(gas, vec![100, 200]);
    }

    #[test]
    fn test_malformed_json_reports_path() {
        let dir = tempdir().unwrap();
        let data = dir.path().join("offchain");
        write(&data, "broken.json", "[{\"name\": ");

        let err = load(dir.path(), Experiment::OffchainVerify).unwrap_err();
        match err {
            Error::Json { path, .. } => assert!(path.ends_with("broken.json")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_required_field_fails_at_load() {
        let dir = tempdir().unwrap();
        let data = dir.path().join("onchain-ver");
        write(
            &data,
            "partial.json",
            r#"[{"treeHeight": 32, "numConditions": 1, "networkName": "local", "gasUsed": 1}]"#,
        );

        let err = load(dir.path(), Experiment::OnchainVerify).unwrap_err();
        assert!(matches!(err, Error::Json { .. }));
        assert!(err.to_string().contains("mode"), "{err}");
    }
}
