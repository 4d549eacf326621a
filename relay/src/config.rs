use crate::Error;
use bridge_types::Address;
use serde::Deserialize;
use std::{
    fs::File,
    path::{Path, PathBuf},
    time::Duration,
};

/// Configuration for the [super::Relay].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Address of the contract withdraws are submitted to.
    pub contract: Address,

    /// Path of the file the cursor is persisted to.
    pub state_path: PathBuf,

    /// Height to start relaying from if no cursor has been persisted.
    pub start_height: u64,

    /// Time to wait between steps.
    pub poll_interval: Duration,
}

/// Serialized form of [Config].
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Yaml {
    contract: String,
    state_path: PathBuf,
    #[serde(default)]
    start_height: u64,
    poll_interval_ms: u64,
}

impl TryFrom<Yaml> for Config {
    type Error = Error;

    fn try_from(yaml: Yaml) -> Result<Self, Error> {
        Ok(Self {
            contract: yaml.contract.parse()?,
            state_path: yaml.state_path,
            start_height: yaml.start_height,
            poll_interval: Duration::from_millis(yaml.poll_interval_ms),
        })
    }
}

impl Config {
    /// Parse a [Config] from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, Error> {
        serde_yaml::from_str::<Yaml>(yaml)?.try_into()
    }

    /// Load a [Config] from the YAML file at `path`.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let file = File::open(path)?;
        serde_yaml::from_reader::<_, Yaml>(file)?.try_into()
    }
}
