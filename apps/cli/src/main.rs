use anyhow::Result;
use clap::{Parser, Subcommand};
use rackprobe_core::HealthStatus;
use rackprobe_disk::{DiskHealthChecker, DiskInventory, SpawnFaultPolicy};
use rackprobe_log::Logger;
use rackprobe_sampler::{
    CaptureFaultPolicy, IpmiFans, MetricSampler, ProcMeminfo, ProcStatCpu, SamplerConfig,
};
use rackprobe_tools::SystemTools;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "rackprobe", about = "Bare-metal host telemetry probe")]
struct Cli {
    /// Log file appended to by every component.
    #[arg(long, default_value = "logs/servertest.log")]
    log_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sample CPU, memory, and fan telemetry into per-metric CSV files.
    Monitor {
        #[arg(long, default_value = "metrics")]
        output_dir: PathBuf,
        /// Seconds between ticks.
        #[arg(long, default_value_t = 10.0)]
        interval: f64,
        /// Keep sampling when a CPU/memory capture fails instead of halting.
        #[arg(long)]
        keep_going: bool,
    },
    /// Inventory a block device (size, mount state, model).
    DiskInfo { device: String },
    /// Health-check a block device via its vendor diagnostic tool.
    DiskHealth {
        device: String,
        /// Abort on a missing or unspawnable diagnostic tool instead of
        /// reporting the device unhealthy.
        #[arg(long)]
        strict: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let logger = Logger::new(&cli.log_file);

    match cli.command {
        Command::Monitor {
            output_dir,
            interval,
            keep_going,
        } => {
            let config = SamplerConfig {
                output_dir,
                interval: Duration::from_secs_f64(interval),
                capture_fault_policy: if keep_going {
                    CaptureFaultPolicy::SkipTick
                } else {
                    CaptureFaultPolicy::Halt
                },
            };
            let mut sampler = MetricSampler::new(
                config,
                logger,
                Box::new(ProcStatCpu::new()),
                Box::new(ProcMeminfo::new()),
                Box::new(IpmiFans::new(SystemTools)),
            );
            // Signal wiring belongs to the supervisor; keeping the sender
            // alive here means the loop runs until the process is killed.
            let (stop_tx, stop_rx) = mpsc::channel();
            let result = sampler.run(stop_rx);
            drop(stop_tx);
            result
        }
        Command::DiskInfo { device } => {
            let inventory = DiskInventory::new(SystemTools, logger);
            match inventory.get_disk_info(&device) {
                Some(info) => {
                    println!("{}", serde_json::to_string_pretty(&info)?);
                    Ok(())
                }
                None => {
                    eprintln!("{}: not an available block device", device);
                    std::process::exit(1);
                }
            }
        }
        Command::DiskHealth { device, strict } => {
            let policy = if strict {
                SpawnFaultPolicy::Propagate
            } else {
                SpawnFaultPolicy::TreatAsUnhealthy
            };
            let checker = DiskHealthChecker::new(SystemTools, logger, policy);
            let healthy = checker.check(&device)?;
            let status = HealthStatus { device, healthy };
            println!("{}", serde_json::to_string_pretty(&status)?);
            if !healthy {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
