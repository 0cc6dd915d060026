use crate::sampler::CpuSource;
use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;

/// Aggregate jiffy counters from the `cpu` line of /proc/stat.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuTimes {
    pub fn total(&self) -> u64 {
        self.user
            + self.nice
            + self.system
            + self.idle
            + self.iowait
            + self.irq
            + self.softirq
            + self.steal
    }

    fn delta(&self, earlier: &CpuTimes) -> CpuTimes {
        CpuTimes {
            user: self.user.saturating_sub(earlier.user),
            nice: self.nice.saturating_sub(earlier.nice),
            system: self.system.saturating_sub(earlier.system),
            idle: self.idle.saturating_sub(earlier.idle),
            iowait: self.iowait.saturating_sub(earlier.iowait),
            irq: self.irq.saturating_sub(earlier.irq),
            softirq: self.softirq.saturating_sub(earlier.softirq),
            steal: self.steal.saturating_sub(earlier.steal),
        }
    }
}

/// CPU utilization shares of one sampling window, in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CpuPercent {
    pub user: f64,
    pub system: f64,
    pub idle: f64,
}

impl CpuPercent {
    fn from_delta(delta: CpuTimes) -> CpuPercent {
        let total = delta.total() as f64;
        if total == 0.0 {
            return CpuPercent {
                user: 0.0,
                system: 0.0,
                idle: 0.0,
            };
        }
        CpuPercent {
            user: delta.user as f64 / total * 100.0,
            system: delta.system as f64 / total * 100.0,
            idle: delta.idle as f64 / total * 100.0,
        }
    }
}

/// Extracts the aggregate `cpu ` line from /proc/stat contents.
pub fn parse_proc_stat(text: &str) -> Option<CpuTimes> {
    let line = text.lines().find(|line| line.starts_with("cpu "))?;
    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .map(|field| field.parse().unwrap_or(0))
        .collect();
    if fields.len() < 4 {
        return None;
    }
    let field = |idx: usize| fields.get(idx).copied().unwrap_or(0);
    Some(CpuTimes {
        user: field(0),
        nice: field(1),
        system: field(2),
        idle: field(3),
        iowait: field(4),
        irq: field(5),
        softirq: field(6),
        steal: field(7),
    })
}

/// Stateful /proc/stat sampler: percentages are computed over the delta from
/// the previous call; the first call uses the since-boot totals.
#[derive(Debug)]
pub struct ProcStatCpu {
    path: PathBuf,
    last: Option<CpuTimes>,
}

impl ProcStatCpu {
    pub fn new() -> Self {
        Self::from_path("/proc/stat")
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last: None,
        }
    }
}

impl Default for ProcStatCpu {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuSource for ProcStatCpu {
    fn sample(&mut self) -> Result<CpuPercent> {
        let text = std::fs::read_to_string(&self.path)
            .with_context(|| format!("read {}", self.path.display()))?;
        let times = parse_proc_stat(&text)
            .ok_or_else(|| anyhow!("no aggregate cpu line in {}", self.path.display()))?;
        let delta = match self.last {
            Some(last) => times.delta(&last),
            None => times,
        };
        self.last = Some(times);
        Ok(CpuPercent::from_delta(delta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROC_STAT_T0: &str = "\
cpu  100 0 50 850 0 0 0 0 0 0
cpu0 50 0 25 425 0 0 0 0 0 0
intr 12345
";

    const PROC_STAT_T1: &str = "\
cpu  130 0 60 910 0 0 0 0 0 0
cpu0 65 0 30 455 0 0 0 0 0 0
intr 23456
";

    #[test]
    fn parses_aggregate_line_only() {
        let times = parse_proc_stat(PROC_STAT_T0).unwrap();
        assert_eq!(
            times,
            CpuTimes {
                user: 100,
                nice: 0,
                system: 50,
                idle: 850,
                iowait: 0,
                irq: 0,
                softirq: 0,
                steal: 0,
            }
        );
    }

    #[test]
    fn rejects_text_without_cpu_line() {
        assert_eq!(parse_proc_stat("intr 12345\nctxt 999\n"), None);
    }

    #[test]
    fn percentages_over_delta_between_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stat");
        std::fs::write(&path, PROC_STAT_T0).unwrap();

        let mut source = ProcStatCpu::from_path(&path);
        // First sample covers boot-to-now: 100/50/850 of 1000.
        let first = source.sample().unwrap();
        assert!((first.user - 10.0).abs() < 1e-9);
        assert!((first.system - 5.0).abs() < 1e-9);
        assert!((first.idle - 85.0).abs() < 1e-9);

        // Delta: user 30, system 10, idle 60 of 100.
        std::fs::write(&path, PROC_STAT_T1).unwrap();
        let second = source.sample().unwrap();
        assert!((second.user - 30.0).abs() < 1e-9);
        assert!((second.system - 10.0).abs() < 1e-9);
        assert!((second.idle - 60.0).abs() < 1e-9);
    }

    #[test]
    fn zero_delta_yields_zero_percentages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stat");
        std::fs::write(&path, PROC_STAT_T0).unwrap();

        let mut source = ProcStatCpu::from_path(&path);
        source.sample().unwrap();
        let repeat = source.sample().unwrap();
        assert_eq!(repeat.user, 0.0);
        assert_eq!(repeat.idle, 0.0);
    }
}
