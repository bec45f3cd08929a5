use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::{ConfigError, HitError};
use super::hit::HitSet;

/// What a job does with each of its cases
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Write a packet file for each case
    #[default]
    Encode,
    /// Read each packet file back and compare it with the case's hits
    Check,
    /// Like Check, but explain mismatches in terms of swapped fibers
    Diagnose,
}

/// One packet: where it lives, the hits it should carry, and its BCID and region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseConfig {
    pub packet_file: PathBuf,
    pub hits: Vec<f64>,
    pub channels: Vec<u32>,
    pub bcid: u32,
    pub region: u32,
}

impl CaseConfig {
    /// The intended hits in canonical order
    pub fn intended_hits(&self) -> Result<HitSet, HitError> {
        HitSet::from_parallel(&self.hits, &self.channels)
    }
}

/// Structure representing a job. Contains pathing and the cases to run.
/// Configs are seralizable and deserializable to YAML using serde and serde_yaml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub mode: Mode,
    pub packet_dir: PathBuf,
    pub append_sentinel: bool,
    pub cases: Vec<CaseConfig>,
}

impl Default for Config {
    /// Generate a template Config holding a single example case, set to encode
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            packet_dir: PathBuf::from("packets"),
            append_sentinel: true,
            cases: vec![CaseConfig {
                packet_file: PathBuf::from("case_0.txt"),
                hits: vec![0.0, 0.4, 1.5, 2.6, 3.7],
                channels: vec![1, 2, 4, 8, 13],
                bcid: 32,
                region: 20,
            }],
        }
    }
}

impl Config {
    /// Read the configuration in a YAML file
    /// Returns a Config if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        Ok(serde_yaml::from_str::<Self>(&yaml_str)?)
    }

    /// Write the configuration to a YAML file
    pub fn write_config_file(&self, config_path: &Path) -> Result<(), ConfigError> {
        let yaml_str = serde_yaml::to_string(self)?;
        std::fs::write(config_path, yaml_str)?;
        Ok(())
    }

    /// Get the path to the packet file of a case
    pub fn packet_path(&self, case: &CaseConfig) -> PathBuf {
        self.packet_dir.join(&case.packet_file)
    }
}
