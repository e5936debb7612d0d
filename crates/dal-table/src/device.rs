use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TableError;

/// Execution target for a pull or merge.
///
/// The device picks where the work runs. It never changes the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputeDevice {
    /// Plain scalar loop on the calling thread.
    #[default]
    Host,
    /// Multi-threaded CPU execution (rayon).
    Cpu,
    /// Accelerator registered on the execution context.
    Gpu,
}

impl ComputeDevice {
    pub const ALL: [ComputeDevice; 3] = [ComputeDevice::Host, ComputeDevice::Cpu, ComputeDevice::Gpu];

    /// Whether this device needs an accelerator.
    pub fn is_accelerator(&self) -> bool {
        matches!(self, ComputeDevice::Gpu)
    }
}

impl TryFrom<u32> for ComputeDevice {
    type Error = TableError;

    fn try_from(ordinal: u32) -> Result<Self, Self::Error> {
        match ordinal {
            0 => Ok(ComputeDevice::Host),
            1 => Ok(ComputeDevice::Cpu),
            2 => Ok(ComputeDevice::Gpu),
            other => Err(TableError::InvalidName {
                kind: "compute device",
                name: other.to_string(),
            }),
        }
    }
}

impl FromStr for ComputeDevice {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "host" => Ok(ComputeDevice::Host),
            "cpu" => Ok(ComputeDevice::Cpu),
            "gpu" => Ok(ComputeDevice::Gpu),
            _ => Err(TableError::InvalidName {
                kind: "compute device",
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ComputeDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputeDevice::Host => write!(f, "host"),
            ComputeDevice::Cpu => write!(f, "cpu"),
            ComputeDevice::Gpu => write!(f, "gpu"),
        }
    }
}
