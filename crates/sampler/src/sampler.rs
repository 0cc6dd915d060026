use crate::cpu::CpuPercent;
use crate::csv::CsvSink;
use crate::fan::FanRpm;
use crate::memory::MemoryMb;
use anyhow::{Context, Result};
use rackprobe_core::now_stamp;
use rackprobe_log::Logger;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

pub const CPU_HEADER: &str = "Timestamp,User%,System%,Idle%";
pub const MEM_HEADER: &str = "Timestamp,Total_Memory_MB,Used_Memory_MB,Free_Memory_MB,Shared_Memory_MB,Buffer_Cache_MB,Available_Memory_MB";
pub const FAN_HEADER: &str = "Timestamp,FAN1_RPM,FAN2_RPM,FAN3_RPM,FAN4_RPM,FANA_RPM";

pub trait CpuSource {
    fn sample(&mut self) -> Result<CpuPercent>;
}

pub trait MemorySource {
    fn sample(&mut self) -> Result<MemoryMb>;
}

pub trait FanSource {
    fn sample(&mut self) -> Result<FanRpm>;
}

/// What a CPU/memory capture fault does to the loop. Fan capture is always
/// best-effort and is not governed by this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureFaultPolicy {
    /// Propagate the fault and terminate the loop.
    Halt,
    /// Log a WARNING and write nothing this tick.
    SkipTick,
}

#[derive(Debug, Clone)]
pub struct SamplerConfig {
    pub output_dir: PathBuf,
    pub interval: Duration,
    pub capture_fault_policy: CaptureFaultPolicy,
}

/// The periodic sampling loop. Every tick captures one timestamp, writes a
/// CPU row and a memory row unconditionally, and a fan row only when the
/// sensor readout succeeds. Single-threaded; the end-of-tick sleep is the
/// only cancellation point.
pub struct MetricSampler {
    config: SamplerConfig,
    logger: Logger,
    cpu: Box<dyn CpuSource>,
    memory: Box<dyn MemorySource>,
    fan: Box<dyn FanSource>,
}

impl MetricSampler {
    pub fn new(
        config: SamplerConfig,
        logger: Logger,
        cpu: Box<dyn CpuSource>,
        memory: Box<dyn MemorySource>,
        fan: Box<dyn FanSource>,
    ) -> Self {
        Self {
            config,
            logger,
            cpu,
            memory,
            fan,
        }
    }

    /// Runs until a message arrives on `stop` (or its sender is dropped),
    /// observed only during the end-of-tick sleep. Logs INFO on both start
    /// and stop; a stopped loop performs no further writes.
    pub fn run(&mut self, stop: Receiver<()>) -> Result<()> {
        std::fs::create_dir_all(&self.config.output_dir)
            .with_context(|| format!("create {}", self.config.output_dir.display()))?;
        let cpu_sink = CsvSink::create(self.config.output_dir.join("cpu.csv"), CPU_HEADER)?;
        let fan_sink = CsvSink::create(self.config.output_dir.join("fan.csv"), FAN_HEADER)?;
        let mem_sink = CsvSink::create(self.config.output_dir.join("mem.csv"), MEM_HEADER)?;

        self.logger.info(&format!(
            "Monitoring started, interval {}s, output {}",
            self.config.interval.as_secs_f64(),
            self.config.output_dir.display()
        ));

        loop {
            let stamp = now_stamp();
            self.tick(&stamp, &cpu_sink, &mem_sink, &fan_sink)?;

            match stop.recv_timeout(self.config.interval) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    self.logger.info("Monitoring stopped");
                    return Ok(());
                }
            }
        }
    }

    fn tick(
        &mut self,
        stamp: &str,
        cpu_sink: &CsvSink,
        mem_sink: &CsvSink,
        fan_sink: &CsvSink,
    ) -> Result<()> {
        // Both mandatory captures happen before either row is written, so a
        // halt never leaves a CPU row without its memory row.
        let captured = self
            .cpu
            .sample()
            .context("capture cpu sample")
            .and_then(|cpu| {
                let mem = self.memory.sample().context("capture memory sample")?;
                Ok((cpu, mem))
            });
        match (captured, self.config.capture_fault_policy) {
            (Ok((cpu, mem)), _) => {
                cpu_sink.append(&format!(
                    "{},{:.1},{:.1},{:.1}",
                    stamp, cpu.user, cpu.system, cpu.idle
                ))?;
                mem_sink.append(&format!(
                    "{},{:.1},{:.1},{:.1},{:.1},{:.1},{:.1}",
                    stamp, mem.total, mem.used, mem.free, mem.shared, mem.buffer_cache,
                    mem.available
                ))?;
            }
            (Err(err), CaptureFaultPolicy::Halt) => return Err(err),
            (Err(err), CaptureFaultPolicy::SkipTick) => {
                self.logger
                    .warning(&format!("Failed to capture CPU/memory sample: {:#}", err));
                return Ok(());
            }
        }

        match self.fan.sample() {
            Ok(fans) => {
                let mut row = stamp.to_string();
                for rpm in fans.rpm {
                    row.push(',');
                    row.push_str(&rpm.to_string());
                }
                fan_sink.append(&row)?;
            }
            Err(_) => {
                self.logger.warning("Failed to get fan information");
            }
        }

        Ok(())
    }
}
