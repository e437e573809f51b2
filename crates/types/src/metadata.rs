//! Per-run station metadata

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Describes the current run of the station
///
/// Built once at startup and shown to the operator by outputs that
/// support metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Unique id of this run
    pub run_id: Uuid,
    pub start_time: DateTime<Local>,
    /// Person responsible for the run (from settings)
    pub operator: String,
    /// Hostname of the Raspberry Pi
    pub pi_name: String,
    /// CPU serial number of the Raspberry Pi
    pub pi_id: String,
}

impl RunMetadata {
    pub fn new(
        operator: impl Into<String>,
        pi_name: impl Into<String>,
        pi_id: impl Into<String>,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            start_time: Local::now(),
            operator: operator.into(),
            pi_name: pi_name.into(),
            pi_id: pi_id.into(),
        }
    }

    /// Start time formatted for human consumption
    pub fn start_time_text(&self) -> String {
        self.start_time.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

impl Default for RunMetadata {
    fn default() -> Self {
        Self::new("unknown", "airpi", "unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_run_gets_its_own_id() {
        let a = RunMetadata::new("Alice", "airpi", "0000000012345678");
        let b = RunMetadata::new("Alice", "airpi", "0000000012345678");
        assert_ne!(a.run_id, b.run_id);
        assert_eq!(a.operator, "Alice");
        assert_eq!(a.start_time_text().len(), 19);
    }
}
