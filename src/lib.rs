use std::fmt;
use std::str::FromStr;

pub mod aggregate;
pub mod chart;
pub mod config;
pub mod dataset;
pub mod derive;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod schema;
pub mod table;
pub mod visualize;

pub use error::{Error, Result};

/// Benchmark experiment to report on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Experiment {
    /// Off-chain verification time and memory.
    OffchainVerify,
    /// On-chain verification gas.
    OnchainVerify,
    /// Off-chain proof generation time and memory.
    OffchainProve,
}

impl Experiment {
    pub const ALL: [Experiment; 3] = [
        Experiment::OffchainVerify,
        Experiment::OnchainVerify,
        Experiment::OffchainProve,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Experiment::OffchainVerify => "offchain-verify",
            Experiment::OnchainVerify => "onchain-verify",
            Experiment::OffchainProve => "offchain-prove",
        }
    }

    /// Directory under the data root holding this experiment's `*.json` files.
    /// Both off-chain experiments read the same files.
    pub fn data_dir(&self) -> &'static str {
        match self {
            Experiment::OffchainVerify | Experiment::OffchainProve => "offchain",
            Experiment::OnchainVerify => "onchain-ver",
        }
    }

    /// The `step` value off-chain rows are filtered on.
    pub fn step(&self) -> Option<&'static str> {
        match self {
            Experiment::OffchainVerify => Some("verify"),
            Experiment::OffchainProve => Some("prove"),
            Experiment::OnchainVerify => None,
        }
    }

    pub fn is_offchain(&self) -> bool {
        self.step().is_some()
    }
}

impl fmt::Display for Experiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Experiment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Experiment::ALL
            .into_iter()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| Error::UnsupportedExperiment(s.to_string()))
    }
}
