use crate::sampler::MemorySource;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;

/// Memory usage figures in megabytes, mirroring the `free`-style breakdown
/// written to mem.csv.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemoryMb {
    pub total: f64,
    pub used: f64,
    pub free: f64,
    pub shared: f64,
    pub buffer_cache: f64,
    pub available: f64,
}

/// Parses /proc/meminfo into a key -> kB map.
pub fn parse_meminfo(text: &str) -> HashMap<String, u64> {
    let mut map = HashMap::new();
    for line in text.lines() {
        let mut parts = line.split_whitespace();
        let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        let key = key.trim_end_matches(':');
        map.insert(key.to_string(), value.parse().unwrap_or(0));
    }
    map
}

pub fn snapshot_from(meminfo: &HashMap<String, u64>) -> MemoryMb {
    let mb = |key: &str| meminfo.get(key).copied().unwrap_or(0) as f64 / 1024.0;
    let total = mb("MemTotal");
    let free = mb("MemFree");
    let buffers = mb("Buffers");
    let cached = mb("Cached");
    MemoryMb {
        total,
        used: (total - free - buffers - cached).max(0.0),
        free,
        shared: mb("Shmem"),
        buffer_cache: buffers + cached,
        available: mb("MemAvailable"),
    }
}

#[derive(Debug)]
pub struct ProcMeminfo {
    path: PathBuf,
}

impl ProcMeminfo {
    pub fn new() -> Self {
        Self::from_path("/proc/meminfo")
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for ProcMeminfo {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySource for ProcMeminfo {
    fn sample(&mut self) -> Result<MemoryMb> {
        let text = std::fs::read_to_string(&self.path)
            .with_context(|| format!("read {}", self.path.display()))?;
        Ok(snapshot_from(&parse_meminfo(&text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEMINFO: &str = "\
MemTotal:       32499764 kB
MemFree:        21048968 kB
MemAvailable:   27735004 kB
Buffers:            2672 kB
Cached:          6205420 kB
SwapCached:            0 kB
Shmem:             86232 kB
Slab:             406816 kB
";

    #[test]
    fn parses_key_value_lines() {
        let map = parse_meminfo(MEMINFO);
        assert_eq!(map.get("MemTotal"), Some(&32_499_764));
        assert_eq!(map.get("Shmem"), Some(&86_232));
        assert_eq!(map.get("Cached"), Some(&6_205_420));
    }

    #[test]
    fn snapshot_arithmetic_in_mb() {
        let snap = snapshot_from(&parse_meminfo(MEMINFO));
        let kb = |v: u64| v as f64 / 1024.0;
        assert_eq!(snap.total, kb(32_499_764));
        assert_eq!(snap.free, kb(21_048_968));
        assert_eq!(snap.available, kb(27_735_004));
        assert_eq!(snap.shared, kb(86_232));
        assert_eq!(snap.buffer_cache, kb(2_672) + kb(6_205_420));
        assert_eq!(
            snap.used,
            kb(32_499_764) - kb(21_048_968) - kb(2_672) - kb(6_205_420)
        );
    }

    #[test]
    fn missing_keys_read_as_zero() {
        let snap = snapshot_from(&parse_meminfo("MemTotal: 1024 kB\n"));
        assert_eq!(snap.total, 1.0);
        assert_eq!(snap.available, 0.0);
        assert_eq!(snap.used, 1.0);
    }
}
