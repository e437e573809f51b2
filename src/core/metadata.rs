//! Station identity for the run metadata

use airpi_core::RunMetadata;
use sysinfo::System;

const CPUINFO: &str = "/proc/cpuinfo";
const UNKNOWN: &str = "unknown";

/// The `Serial` line of `/proc/cpuinfo`, present on Raspberry Pis
fn parse_cpu_serial(cpuinfo: &str) -> Option<String> {
    cpuinfo
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("serial"))
        .map(|(_, value)| value.trim().to_string())
        .filter(|serial| !serial.is_empty())
}

pub fn cpu_serial() -> String {
    std::fs::read_to_string(CPUINFO)
        .ok()
        .and_then(|text| parse_cpu_serial(&text))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

pub fn hostname() -> String {
    System::host_name().unwrap_or_else(|| UNKNOWN.to_string())
}

/// Metadata for a run starting now
pub fn collect(operator: &str) -> RunMetadata {
    RunMetadata::new(operator, hostname(), cpu_serial())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_from_cpuinfo() {
        let text = "processor\t: 0\nHardware\t: BCM2835\nRevision\t: a02082\nSerial\t\t: 00000000abcdef01\nModel\t\t: Raspberry Pi 3 Model B Rev 1.2\n";
        assert_eq!(parse_cpu_serial(text).as_deref(), Some("00000000abcdef01"));
    }

    #[test]
    fn test_no_serial_on_other_machines() {
        let text = "processor\t: 0\nvendor_id\t: GenuineIntel\n";
        assert_eq!(parse_cpu_serial(text), None);
    }
}
