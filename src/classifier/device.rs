use std::{fmt, str::FromStr};

use candle_core::Device;
use serde::{Deserialize, Serialize};

use super::error::ModelError;

/// Where inference runs. Written as `cpu` or `cuda:N` in settings and flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DeviceSetting {
    #[default]
    Cpu,
    Cuda(usize),
}

impl DeviceSetting {
    pub fn resolve(self) -> Result<Device, ModelError> {
        match self {
            DeviceSetting::Cpu => Ok(Device::Cpu),
            DeviceSetting::Cuda(i) => Device::new_cuda(i).map_err(|e| {
                ModelError::Device(format!(
                    "Failed to init CUDA device {i}: {e}. Try `--device cpu` as fallback."
                ))
            }),
        }
    }
}

impl fmt::Display for DeviceSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceSetting::Cpu => f.write_str("cpu"),
            DeviceSetting::Cuda(i) => write!(f, "cuda:{i}"),
        }
    }
}

impl FromStr for DeviceSetting {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim().to_ascii_lowercase();
        match value.as_str() {
            "cpu" => Ok(DeviceSetting::Cpu),
            "cuda" => Ok(DeviceSetting::Cuda(0)),
            other => other
                .strip_prefix("cuda:")
                .and_then(|index| index.parse().ok())
                .map(DeviceSetting::Cuda)
                .ok_or_else(|| format!("unknown device '{other}', expected `cpu` or `cuda:N`")),
        }
    }
}

impl TryFrom<String> for DeviceSetting {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DeviceSetting> for String {
    fn from(value: DeviceSetting) -> Self {
        value.to_string()
    }
}
