use std::path::PathBuf;

use crate::Experiment;

/// Default locations, relative to the working directory.
pub const DEFAULT_DATA_ROOT: &str = "data";
pub const DEFAULT_TABLE_DIR: &str = ".";
pub const DEFAULT_IMAGE_DIR: &str = "images";

#[derive(Clone, Debug)]
pub struct ReportConfig {
    pub experiment: Experiment,
    /// Holds the per-category result directories (`offchain/`, `onchain-ver/`).
    pub data_root: PathBuf,
    /// Where `<experiment>.csv` is written.
    pub table_dir: PathBuf,
    pub image_dir: PathBuf,
    /// Open each saved chart in the platform viewer.
    pub show: bool,
}

impl ReportConfig {
    pub fn new(experiment: Experiment) -> Self {
        Self {
            experiment,
            data_root: PathBuf::from(DEFAULT_DATA_ROOT),
            table_dir: PathBuf::from(DEFAULT_TABLE_DIR),
            image_dir: PathBuf::from(DEFAULT_IMAGE_DIR),
            show: false,
        }
    }

    /// Same layout rooted at `root` instead of the working directory.
    pub fn rooted_at(experiment: Experiment, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            experiment,
            data_root: root.join(DEFAULT_DATA_ROOT),
            table_dir: root.clone(),
            image_dir: root.join(DEFAULT_IMAGE_DIR),
            show: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_default_layout() {
        let cfg = ReportConfig::new(Experiment::OnchainVerify);
        assert_eq!(cfg.data_root, Path::new("data"));
        assert_eq!(cfg.table_dir, Path::new("."));
        assert_eq!(cfg.image_dir, Path::new("images"));
        assert!(!cfg.show);
    }

    #[test]
    fn test_rooted_layout() {
        let cfg = ReportConfig::rooted_at(Experiment::OffchainProve, "/tmp/run");
        assert_eq!(cfg.data_root, Path::new("/tmp/run/data"));
        assert_eq!(cfg.table_dir, Path::new("/tmp/run"));
        assert_eq!(cfg.image_dir, Path::new("/tmp/run/images"));
    }
}
