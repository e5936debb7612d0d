//! Execution configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::device::ComputeDevice;
use crate::error::TableError;
use crate::exec::parallel::DEFAULT_PARALLEL_THRESHOLD;
use crate::Result;

/// Environment variable naming the preferred compute device.
pub const ENV_COMPUTE_DEVICE: &str = "DAL_COMPUTE_DEVICE";

/// Environment variable overriding the parallel chunk threshold.
pub const ENV_PARALLEL_THRESHOLD: &str = "DAL_PARALLEL_THRESHOLD";

/// Tuning for an [`ExecutionContext`](crate::exec::ExecutionContext).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Minimum number of output elements per rayon chunk on `cpu`.
    pub parallel_threshold: usize,

    /// Device callers should target when they have no reason to pick one.
    ///
    /// Advisory only. Accessors never read it; every `*_on` call names its
    /// device explicitly.
    pub preferred_device: ComputeDevice,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            preferred_device: ComputeDevice::Host,
        }
    }
}

impl ExecutionConfig {
    /// Reject settings no context can run with.
    pub fn validate(&self) -> Result<()> {
        if self.parallel_threshold == 0 {
            return Err(TableError::Config("parallel_threshold must be at least 1".into()));
        }
        Ok(())
    }

    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).map_err(|e| TableError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| TableError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }

    /// Defaults overridden by `DAL_COMPUTE_DEVICE` and `DAL_PARALLEL_THRESHOLD`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) but with a caller-supplied variable source.
    ///
    /// Present but malformed values are errors, not silently replaced by defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(device) = lookup(ENV_COMPUTE_DEVICE) {
            config.preferred_device = device.parse()?;
        }
        if let Some(threshold) = lookup(ENV_PARALLEL_THRESHOLD) {
            config.parallel_threshold = threshold.trim().parse().map_err(|_| {
                TableError::Config(format!("{}: '{}' is not a count", ENV_PARALLEL_THRESHOLD, threshold))
            })?;
        }
        config.validate()?;
        tracing::debug!(
            "execution config: preferred_device={}, parallel_threshold={}",
            config.preferred_device,
            config.parallel_threshold
        );
        Ok(config)
    }
}
