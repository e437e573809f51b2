//! One cycle's complete sample set

use crate::reading::Reading;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Ordered readings gathered in a single cycle
///
/// Reading order follows sensor registration order. A frame is never
/// modified after it has been handed to the outputs; calibration works on
/// a copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Sequence number of the cycle that produced this frame
    pub cycle: u64,
    /// When the readings were captured
    pub sampled_at: DateTime<Local>,
    pub readings: Vec<Reading>,
}

impl Frame {
    pub fn new(cycle: u64, sampled_at: DateTime<Local>) -> Self {
        Self {
            cycle,
            sampled_at,
            readings: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Reading> {
        self.readings.iter()
    }

    /// First reading with the given measurement name
    pub fn find(&self, name: &str) -> Option<&Reading> {
        self.readings.iter().find(|r| r.name() == name)
    }
}

impl<'a> IntoIterator for &'a Frame {
    type Item = &'a Reading;
    type IntoIter = std::slice::Iter<'a, Reading>;

    fn into_iter(self) -> Self::IntoIter {
        self.readings.iter()
    }
}
