//! Compute device selection.
use std::fmt;
use std::str::FromStr;

use candle_core::Device;
use log::info;

use crate::error::Error;

/// Device requested on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceChoice {
    /// CUDA device 0 if available, CPU otherwise.
    #[default]
    Auto,
    Cpu,
    Cuda(usize),
    Metal,
}

impl DeviceChoice {
    /// Resolve into a candle [Device]. Called once at startup.
    pub fn resolve(&self) -> Result<Device, Error> {
        let device = match self {
            DeviceChoice::Auto => Device::cuda_if_available(0)?,
            DeviceChoice::Cpu => Device::Cpu,
            DeviceChoice::Cuda(ordinal) => Device::new_cuda(*ordinal)?,
            DeviceChoice::Metal => Device::new_metal(0)?,
        };
        info!("using device {:?}", device);
        Ok(device)
    }
}

impl FromStr for DeviceChoice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "" | "auto" => Ok(DeviceChoice::Auto),
            "cpu" => Ok(DeviceChoice::Cpu),
            "cuda" | "gpu" => Ok(DeviceChoice::Cuda(0)),
            "metal" | "mps" => Ok(DeviceChoice::Metal),
            other => match other.strip_prefix("cuda:") {
                Some(ordinal) => ordinal
                    .parse()
                    .map(DeviceChoice::Cuda)
                    .map_err(|_| Error::Config(format!("invalid cuda ordinal in {other:?}"))),
                None => Err(Error::Config(format!("unknown device {other:?}"))),
            },
        }
    }
}

impl fmt::Display for DeviceChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceChoice::Auto => write!(f, "auto"),
            DeviceChoice::Cpu => write!(f, "cpu"),
            DeviceChoice::Cuda(n) => write!(f, "cuda:{n}"),
            DeviceChoice::Metal => write!(f, "metal"),
        }
    }
}
