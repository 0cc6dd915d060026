use anyhow::{Context, Result};
use std::process::Command;

/// Captured result of one external tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Seam over the vendor diagnostic binaries (hdparm, nvme, smartctl,
/// ipmitool). `Err` means the tool could not be spawned at all; a tool that
/// ran and exited non-zero is `Ok` with `success == false`.
pub trait ToolRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<ToolOutput>;
}

/// Production runner shelling out via `std::process::Command`, one-shot,
/// output fully captured.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTools;

impl ToolRunner for SystemTools {
    fn run(&self, program: &str, args: &[&str]) -> Result<ToolOutput> {
        let output = Command::new(program)
            .args(args)
            .output()
            .with_context(|| format!("run {}", program))?;
        Ok(ToolOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}
