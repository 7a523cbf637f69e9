use super::cost::Tier;
use std::io;
use std::process::Command;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Fraction of the reported free memory the scheduler may plan against.
pub const SAFETY_FRACTION: f64 = 0.95;
/// Budgets below this many MiB are classified as [`Tier::LowMemory`].
pub const TIER_THRESHOLD_MIB: f64 = 17_000.0;
/// Budget used when no device could be queried; classifies as low tier.
pub const FALLBACK_BUDGET_MIB: f64 = 16_000.0;

const NVIDIA_SMI: &str = "nvidia-smi";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryInfo {
    pub free_mib: u64,
    pub total_mib: u64,
}

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("Failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("'{program}' exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("Malformed device query output: {0}")]
    Parse(String),
    #[error("Device {index} not found ({count} present)")]
    NoSuchDevice { index: usize, count: usize },
}

/// Read access to the GPUs visible to this process.
pub trait DeviceQuery {
    fn device_count(&self) -> Result<usize, DeviceError>;
    fn memory_info(&self, index: usize) -> Result<MemoryInfo, DeviceError>;
}

/// Queries NVIDIA devices through `nvidia-smi`.
///
/// A missing `nvidia-smi` executable is reported as zero devices.
#[derive(Debug, Clone)]
pub struct NvidiaSmi {
    program: String,
}

impl Default for NvidiaSmi {
    fn default() -> Self {
        Self {
            program: NVIDIA_SMI.to_string(),
        }
    }
}

impl NvidiaSmi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }

    fn query(&self) -> Result<Option<Vec<MemoryInfo>>, DeviceError> {
        let output = match Command::new(&self.program)
            .args([
                "--query-gpu=memory.free,memory.total",
                "--format=csv,noheader,nounits",
            ])
            .output()
        {
            Ok(output) => output,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(program = %self.program, "Device query tool not found.");
                return Ok(None);
            }
            Err(e) => {
                return Err(DeviceError::Spawn {
                    program: self.program.clone(),
                    source: e,
                });
            }
        };

        if !output.status.success() {
            return Err(DeviceError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        parse_query_output(&String::from_utf8_lossy(&output.stdout)).map(Some)
    }
}

impl DeviceQuery for NvidiaSmi {
    fn device_count(&self) -> Result<usize, DeviceError> {
        Ok(self.query()?.map_or(0, |rows| rows.len()))
    }

    fn memory_info(&self, index: usize) -> Result<MemoryInfo, DeviceError> {
        let rows = self.query()?.unwrap_or_default();
        rows.get(index).copied().ok_or(DeviceError::NoSuchDevice {
            index,
            count: rows.len(),
        })
    }
}

/// Parses `memory.free, memory.total` rows (MiB, no header, no units).
pub fn parse_query_output(output: &str) -> Result<Vec<MemoryInfo>, DeviceError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(output.as_bytes());

    let mut devices = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| DeviceError::Parse(e.to_string()))?;
        if record.len() < 2 {
            return Err(DeviceError::Parse(format!(
                "expected 2 columns, found {}",
                record.len()
            )));
        }
        let parse = |i: usize| -> Result<u64, DeviceError> {
            record[i]
                .parse()
                .map_err(|_| DeviceError::Parse(format!("not a MiB value: '{}'", &record[i])))
        };
        devices.push(MemoryInfo {
            free_mib: parse(0)?,
            total_mib: parse(1)?,
        });
    }
    Ok(devices)
}

/// A fixed device list, for simulation and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticDevices {
    pub devices: Vec<MemoryInfo>,
}

impl StaticDevices {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn single(free_mib: u64, total_mib: u64) -> Self {
        Self {
            devices: vec![MemoryInfo {
                free_mib,
                total_mib,
            }],
        }
    }
}

impl DeviceQuery for StaticDevices {
    fn device_count(&self) -> Result<usize, DeviceError> {
        Ok(self.devices.len())
    }

    fn memory_info(&self, index: usize) -> Result<MemoryInfo, DeviceError> {
        self.devices
            .get(index)
            .copied()
            .ok_or(DeviceError::NoSuchDevice {
                index,
                count: self.devices.len(),
            })
    }
}

/// The memory ceiling every batch is planned against. Computed once per run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceBudget {
    /// Budget in MiB the planner admits against.
    pub effective_mib: f64,
    /// Budget derived from the device alone (or the fallback), before any user ceiling.
    pub device_mib: f64,
    pub user_limit_mib: Option<f64>,
    pub tier: Tier,
    /// The queried device 0, if any.
    pub device: Option<MemoryInfo>,
}

/// `LowMemory` strictly below the threshold; the threshold itself is high tier.
pub fn classify_tier(budget_mib: f64) -> Tier {
    if budget_mib < TIER_THRESHOLD_MIB {
        Tier::LowMemory
    } else {
        Tier::HighMemory
    }
}

/// Combines the device-derived budget with an optional user ceiling. The ceiling can
/// only tighten the budget; non-positive ceilings are ignored.
pub fn effective_budget(device_mib: f64, user_limit_mib: Option<f64>) -> f64 {
    match user_limit_mib {
        Some(limit) if limit > 0.0 && limit < device_mib => limit,
        _ => device_mib,
    }
}

pub struct DeviceProfiler;

impl DeviceProfiler {
    /// Queries device 0 once and derives the run's [`DeviceBudget`].
    ///
    /// Never fails: an absent device or a failed query falls back to
    /// [`FALLBACK_BUDGET_MIB`]. The tier reflects the device class and is decided from
    /// the device-derived budget, before the user ceiling is applied.
    pub fn profile(query: &impl DeviceQuery, user_limit_mib: Option<f64>) -> DeviceBudget {
        let device = match query.device_count() {
            Ok(0) => {
                info!("No GPU device found; using the fallback memory budget.");
                None
            }
            Ok(count) => match query.memory_info(0) {
                Ok(info) => {
                    info!(
                        devices = count,
                        free_mib = info.free_mib,
                        total_mib = info.total_mib,
                        "Queried GPU device 0."
                    );
                    Some(info)
                }
                Err(e) => {
                    warn!("Failed to query device 0 memory ({}); using the fallback budget.", e);
                    None
                }
            },
            Err(e) => {
                warn!("Device query failed ({}); using the fallback memory budget.", e);
                None
            }
        };

        let device_mib = device
            .map(|info| info.free_mib as f64 * SAFETY_FRACTION)
            .unwrap_or(FALLBACK_BUDGET_MIB);
        let tier = classify_tier(device_mib);
        let effective_mib = effective_budget(device_mib, user_limit_mib);

        info!(
            effective_mib,
            device_mib,
            tier = ?tier,
            "Device memory budget established."
        );

        DeviceBudget {
            effective_mib,
            device_mib,
            user_limit_mib,
            tier,
            device,
        }
    }
}
