mod cpu;
mod csv;
mod fan;
mod memory;
mod sampler;

pub use cpu::{parse_proc_stat, CpuPercent, CpuTimes, ProcStatCpu};
pub use csv::CsvSink;
pub use fan::{parse_fan_table, FanRpm, IpmiFans, FAN_CHANNELS};
pub use memory::{parse_meminfo, snapshot_from, MemoryMb, ProcMeminfo};
pub use sampler::{
    CaptureFaultPolicy, CpuSource, FanSource, MemorySource, MetricSampler, SamplerConfig,
    CPU_HEADER, FAN_HEADER, MEM_HEADER,
};
