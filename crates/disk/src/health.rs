use anyhow::{Context, Result};
use rackprobe_log::Logger;
use rackprobe_tools::ToolRunner;

/// What to do when the diagnostic binary cannot be spawned at all (missing
/// from PATH, permission denied). A tool that ran and exited non-zero is
/// always an unhealthy verdict; this policy only covers spawn faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnFaultPolicy {
    /// Log the failure and report the device unhealthy.
    TreatAsUnhealthy,
    /// Surface the fault to the caller.
    Propagate,
}

/// One-shot disk health check: reduces a vendor tool's exit status to a
/// boolean. Tool selection is purely syntactic on the device path and does
/// not depend on the device existing.
pub struct DiskHealthChecker<T: ToolRunner> {
    tools: T,
    logger: Logger,
    spawn_fault_policy: SpawnFaultPolicy,
}

impl<T: ToolRunner> DiskHealthChecker<T> {
    pub fn new(tools: T, logger: Logger, spawn_fault_policy: SpawnFaultPolicy) -> Self {
        Self {
            tools,
            logger,
            spawn_fault_policy,
        }
    }

    pub fn check(&self, device: &str) -> Result<bool> {
        self.logger.info(&format!("Checking health of {}", device));

        let (program, args): (&str, Vec<&str>) = if device.contains("nvme") {
            ("nvme", vec!["smart-log", device])
        } else {
            ("smartctl", vec!["-H", device])
        };

        match self.tools.run(program, &args) {
            Ok(out) if out.success => Ok(true),
            Ok(_) => {
                self.logger
                    .error(&format!("Failed to get health status for {}", device));
                Ok(false)
            }
            Err(err) => match self.spawn_fault_policy {
                SpawnFaultPolicy::TreatAsUnhealthy => {
                    self.logger.error(&format!(
                        "Failed to get health status for {}: {}",
                        device, err
                    ));
                    Ok(false)
                }
                SpawnFaultPolicy::Propagate => {
                    Err(err).with_context(|| format!("health check for {}", device))
                }
            },
        }
    }
}
