use rackprobe_core::DeviceInfo;
use rackprobe_log::Logger;
use rackprobe_tools::ToolRunner;
use std::fs;
use std::os::unix::fs::FileTypeExt;
use std::path::Path;
use thiserror::Error;

const MOUNT_TABLE: &str = "/proc/mounts";
const SYSFS_BLOCK: &str = "/sys/class/block";

/// Faults the inventory can hit past the existence check. These never reach
/// the caller: `get_disk_info` logs the reason and collapses to `None`.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("stat {device}: {source}")]
    Stat {
        device: String,
        source: std::io::Error,
    },
    #[error("read capacity for {device}: {reason}")]
    Capacity { device: String, reason: String },
    #[error("read mount table: {0}")]
    MountTable(std::io::Error),
}

/// Resolves a block device path to descriptive metadata. Stateless; every
/// call inspects the live system.
pub struct DiskInventory<T: ToolRunner> {
    tools: T,
    logger: Logger,
}

impl<T: ToolRunner> DiskInventory<T> {
    pub fn new(tools: T, logger: Logger) -> Self {
        Self { tools, logger }
    }

    /// `None` when the path does not exist, is not a block special file, or
    /// any unexpected fault occurs (logged at WARNING, never propagated).
    pub fn get_disk_info(&self, device: &str) -> Option<DeviceInfo> {
        match self.inspect(device) {
            Ok(info) => info,
            Err(err) => {
                self.logger
                    .warning(&format!("Disk info for {} unavailable: {}", device, err));
                None
            }
        }
    }

    fn inspect(&self, device: &str) -> Result<Option<DeviceInfo>, InventoryError> {
        let metadata = match fs::metadata(device) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(InventoryError::Stat {
                    device: device.to_string(),
                    source: err,
                })
            }
        };
        if !metadata.file_type().is_block_device() {
            return Ok(None);
        }

        let size_gb = gb_floor(self.capacity_bytes(device)?);

        let table = fs::read_to_string(MOUNT_TABLE).map_err(InventoryError::MountTable)?;
        let mounted = is_mounted_in(&table, device);

        let model = self.resolve_model(device);

        Ok(Some(DeviceInfo {
            device: device.to_string(),
            size_gb,
            mounted,
            model,
        }))
    }

    // stat on a block node reports size 0 on Linux; sysfs carries the real
    // capacity as a 512-byte sector count.
    fn capacity_bytes(&self, device: &str) -> Result<u64, InventoryError> {
        let capacity = || -> Option<u64> {
            let name = Path::new(device).file_name()?.to_str()?.to_string();
            let raw = fs::read_to_string(Path::new(SYSFS_BLOCK).join(name).join("size")).ok()?;
            let sectors = raw.trim().parse::<u64>().ok()?;
            Some(sectors.saturating_mul(512))
        };
        capacity().ok_or_else(|| InventoryError::Capacity {
            device: device.to_string(),
            reason: format!("no readable sector count under {}", SYSFS_BLOCK),
        })
    }

    /// hdparm first; an NVMe namespace path falls back to `nvme id-ctrl`
    /// when hdparm yields nothing. Both failing is an empty model, not an
    /// error.
    fn resolve_model(&self, device: &str) -> String {
        let ata = match self.tools.run("hdparm", &["-I", device]) {
            Ok(out) if out.success => ata_model_from(&out.stdout),
            _ => None,
        };
        if let Some(model) = ata {
            return model;
        }
        if device.starts_with("/dev/nvme") {
            if let Ok(out) = self.tools.run("nvme", &["id-ctrl", device]) {
                if out.success {
                    if let Some(model) = nvme_model_from(&out.stdout) {
                        return model;
                    }
                }
            }
        }
        String::new()
    }
}

/// Substring scan of the live mount table. Deliberately imprecise: a table
/// line for /dev/sda1 makes /dev/sda report mounted as well.
pub fn is_mounted_in(table: &str, device: &str) -> bool {
    table.lines().any(|line| line.contains(device))
}

/// Scans `hdparm -I` output for a `Model Number:` line and extracts the
/// trailing field.
pub fn ata_model_from(output: &str) -> Option<String> {
    output
        .lines()
        .find(|line| line.contains("Model Number:"))
        .and_then(|line| line.splitn(2, ':').nth(1))
        .map(|value| value.trim().to_string())
}

/// Scans `nvme id-ctrl` output for the `mn` field line and extracts the
/// trailing value.
pub fn nvme_model_from(output: &str) -> Option<String> {
    output
        .lines()
        .find(|line| line.starts_with("mn"))
        .and_then(|line| line.splitn(2, ':').nth(1))
        .map(|value| value.trim().to_string())
}

fn gb_floor(bytes: u64) -> u64 {
    bytes >> 30
}
