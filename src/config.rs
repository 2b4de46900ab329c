//! Benchmark suites read from TOML files.
//!
//! ```toml
//! seed = 42
//!
//! [[model]]
//! kind = "lstm"
//! input_dim = 5
//! hidden_dim = 64
//! output_dim = 1
//! num_layers = 2
//! dropout = 0.2
//! ```

use std::{fs, io, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::ModelConfig;

/// Errors from loading a suite.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read suite file: {0}")]
    Io(#[from] io::Error),
    /// The contents are not a valid suite.
    #[error("invalid suite: {0}")]
    Parse(#[from] toml::de::Error),
}

/// A set of models to build and run together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Suite {
    /// Seed for parameter initialization and generated inputs.
    #[serde(default)]
    pub seed: Option<u64>,
    /// The models, in file order.
    #[serde(rename = "model", default)]
    pub models: Vec<ModelConfig>,
}

impl Suite {
    /// Parse a suite from TOML text.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Read and parse a suite file.
    pub fn load<P>(path: P) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
    {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
