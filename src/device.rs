//! Device placement and the execution context behind it

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rayon::ThreadPool;
use tracing::debug;

use crate::error::{KnnError, Result};

/// Where slot structures are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    /// Searches run on the caller's thread pool.
    Cpu,
    /// Searches run on a dedicated worker pool shared by all slots.
    Accelerator(usize),
}

impl FromStr for Device {
    type Err = KnnError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cpu" => Ok(Device::Cpu),
            "gpu" => Ok(Device::Accelerator(0)),
            other => match other.strip_prefix("gpu:") {
                Some(ord) => {
                    let ord = ord.parse::<usize>().map_err(|_| {
                        KnnError::Configuration(format!("unknown device {other:?}"))
                    })?;
                    Ok(Device::Accelerator(ord))
                }
                None => Err(KnnError::Configuration(format!("unknown device {other:?}"))),
            },
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Accelerator(ord) => write!(f, "gpu:{ord}"),
        }
    }
}

/// Execution context for one device.
///
/// CPU placement computes inline on the caller's rayon pool. Accelerator
/// placement allocates one worker pool that every slot structure on that
/// device shares; the per-slot loops are sequential, so the shared pool
/// never sees two slots at once.
#[derive(Debug, Clone)]
pub(crate) struct DeviceContext {
    device: Device,
    pool: Option<Arc<ThreadPool>>,
}

impl DeviceContext {
    pub fn new(device: Device) -> Result<Self> {
        let pool = match device {
            Device::Cpu => None,
            Device::Accelerator(ord) => {
                debug!(ordinal = ord, "allocating shared accelerator worker pool");
                let pool = rayon::ThreadPoolBuilder::new()
                    .build()
                    .map_err(|e| KnnError::Configuration(format!("device worker pool: {e}")))?;
                Some(Arc::new(pool))
            }
        };
        Ok(Self { device, pool })
    }

    pub fn device(&self) -> Device {
        self.device
    }

    /// Run `op` inside this device's pool (inline for CPU).
    pub fn run<R, F>(&self, op: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}
