use crate::sampler::FanSource;
use anyhow::{anyhow, bail, Context, Result};
use rackprobe_tools::ToolRunner;
use std::collections::HashMap;

/// Fixed ordered channel set written to fan.csv. Channels absent from the
/// sensor readout are reported as 0.
pub const FAN_CHANNELS: [&str; 5] = ["FAN1", "FAN2", "FAN3", "FAN4", "FANA"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanRpm {
    pub rpm: [u64; 5],
}

impl FanRpm {
    pub fn from_readings(readings: &HashMap<String, u64>) -> Self {
        let mut rpm = [0u64; 5];
        for (slot, channel) in FAN_CHANNELS.iter().enumerate() {
            rpm[slot] = readings.get(*channel).copied().unwrap_or(0);
        }
        Self { rpm }
    }
}

/// Parses the `ipmitool sdr type fan` table. Candidate lines are those
/// containing both FAN and RPM, with the layout
/// `NAME | READING RPM | ...`; a candidate line that does not fit that
/// layout fails the whole readout (no fan row for the tick).
pub fn parse_fan_table(text: &str) -> Result<HashMap<String, u64>> {
    let mut readings = HashMap::new();
    for line in text.lines() {
        if !(line.contains("FAN") && line.contains("RPM")) {
            continue;
        }
        let mut fields = line.split('|');
        let name = fields
            .next()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| anyhow!("fan sensor line without a name: {:?}", line))?;
        let reading = fields
            .next()
            .ok_or_else(|| anyhow!("fan sensor line without a reading field: {:?}", line))?;
        let token = reading
            .trim()
            .split_whitespace()
            .next()
            .ok_or_else(|| anyhow!("empty fan reading: {:?}", line))?;
        let rpm = token
            .parse::<u64>()
            .with_context(|| format!("non-numeric fan reading {:?}", token))?;
        readings.insert(name.to_string(), rpm);
    }
    Ok(readings)
}

/// Fan readout through the privileged IPMI sensor tool.
#[derive(Debug)]
pub struct IpmiFans<T: ToolRunner> {
    tools: T,
}

impl<T: ToolRunner> IpmiFans<T> {
    pub fn new(tools: T) -> Self {
        Self { tools }
    }
}

impl<T: ToolRunner> FanSource for IpmiFans<T> {
    fn sample(&mut self) -> Result<FanRpm> {
        let out = self
            .tools
            .run("ipmitool", &["sdr", "type", "fan"])
            .context("run ipmitool")?;
        if !out.success {
            bail!("ipmitool exited with failure: {}", out.stderr.trim());
        }
        let readings = parse_fan_table(&out.stdout)?;
        Ok(FanRpm::from_readings(&readings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rackprobe_tools::ToolOutput;

    const SDR_OUTPUT: &str = "\
FAN1             | 4800 RPM          | ok
FAN2             | 4680 RPM          | ok
FAN4             | 4920 RPM          | ok
FANA             | 3120 RPM          | ok
Inlet Temp       | 24 degrees C      | ok
";

    #[test]
    fn parses_named_channels() {
        let readings = parse_fan_table(SDR_OUTPUT).unwrap();
        assert_eq!(readings.get("FAN1"), Some(&4800));
        assert_eq!(readings.get("FANA"), Some(&3120));
        assert_eq!(readings.get("FAN3"), None);
        assert!(!readings.contains_key("Inlet Temp"));
    }

    #[test]
    fn absent_channels_read_zero() {
        let readings = parse_fan_table(SDR_OUTPUT).unwrap();
        let row = FanRpm::from_readings(&readings);
        assert_eq!(row.rpm, [4800, 4680, 0, 4920, 3120]);
    }

    #[test]
    fn empty_table_is_all_zero_not_an_error() {
        let readings = parse_fan_table("Inlet Temp | 24 degrees C | ok\n").unwrap();
        assert_eq!(FanRpm::from_readings(&readings).rpm, [0; 5]);
    }

    #[test]
    fn candidate_line_without_separator_is_a_parse_error() {
        assert!(parse_fan_table("FAN1 4800 RPM ok\n").is_err());
    }

    #[test]
    fn candidate_line_with_empty_reading_is_a_parse_error() {
        assert!(parse_fan_table("FAN1 RPM |   | ok\n").is_err());
    }

    struct FixedTools(Option<ToolOutput>);

    impl ToolRunner for FixedTools {
        fn run(&self, program: &str, _args: &[&str]) -> Result<ToolOutput> {
            self.0
                .clone()
                .ok_or_else(|| anyhow!("{}: command not found", program))
        }
    }

    #[test]
    fn sensor_tool_failure_fails_the_sample() {
        let mut source = IpmiFans::new(FixedTools(None));
        assert!(source.sample().is_err());

        let mut source = IpmiFans::new(FixedTools(Some(ToolOutput::failed(
            "Could not open device at /dev/ipmi0",
        ))));
        assert!(source.sample().is_err());
    }

    #[test]
    fn successful_readout_maps_channels() {
        let mut source = IpmiFans::new(FixedTools(Some(ToolOutput::ok(SDR_OUTPUT))));
        let row = source.sample().unwrap();
        assert_eq!(row.rpm, [4800, 4680, 0, 4920, 3120]);
    }
}
