//! Debounced pulse accumulator
//!
//! This is the only state in the station mutated from two threads: an
//! edge watcher (or interrupt handler) adds pulses while the sample loop
//! drains the count once per cycle.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Sentinel for "no pulse accepted yet"
const NO_PULSE: u64 = u64::MAX;

/// Counts pulses between two reads of the sample loop
#[derive(Debug)]
pub struct PulseCounter {
    count: AtomicU64,
    /// Microseconds since `epoch` of the last accepted pulse
    last_pulse_us: AtomicU64,
    debounce: Duration,
    epoch: Instant,
}

impl PulseCounter {
    pub fn new(debounce: Duration) -> Self {
        Self {
            count: AtomicU64::new(0),
            last_pulse_us: AtomicU64::new(NO_PULSE),
            debounce,
            epoch: Instant::now(),
        }
    }

    /// Add one pulse unconditionally
    pub fn increment(&self) {
        self.count.fetch_add(1, Ordering::AcqRel);
    }

    /// Record an edge seen at `at`, ignoring it if it falls inside the
    /// debounce window of the previous accepted pulse.
    ///
    /// Returns whether the pulse was counted.
    pub fn pulse_at(&self, at: Instant) -> bool {
        let now_us = at.saturating_duration_since(self.epoch).as_micros() as u64;
        let window_us = self.debounce.as_micros() as u64;

        let mut last = self.last_pulse_us.load(Ordering::Acquire);
        loop {
            if last != NO_PULSE && now_us.saturating_sub(last) < window_us {
                return false;
            }
            match self.last_pulse_us.compare_exchange_weak(
                last,
                now_us,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(current) => last = current,
            }
        }

        self.increment();
        true
    }

    /// Record an edge seen now
    pub fn pulse(&self) -> bool {
        self.pulse_at(Instant::now())
    }

    /// Pulses counted since the last drain, without resetting
    pub fn peek(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }

    /// Take the count accumulated since the last drain and reset it to zero
    pub fn drain_and_reset(&self) -> f64 {
        self.count.swap(0, Ordering::AcqRel) as f64
    }
}

impl Default for PulseCounter {
    fn default() -> Self {
        Self::new(crate::constants::PULSE_DEBOUNCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_drain_resets() {
        let counter = PulseCounter::new(Duration::ZERO);
        counter.increment();
        counter.increment();
        assert_eq!(counter.drain_and_reset(), 2.0);
        assert_eq!(counter.drain_and_reset(), 0.0);
    }

    #[test]
    fn test_debounce_window() {
        let counter = PulseCounter::new(Duration::from_millis(300));
        let start = Instant::now();

        assert!(counter.pulse_at(start));
        assert!(!counter.pulse_at(start + Duration::from_millis(100)));
        assert!(!counter.pulse_at(start + Duration::from_millis(299)));
        assert!(counter.pulse_at(start + Duration::from_millis(300)));
        assert_eq!(counter.peek(), 2);
    }

    #[test]
    fn test_no_lost_updates_across_threads() {
        let counter = Arc::new(PulseCounter::new(Duration::ZERO));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let counter = Arc::clone(&counter);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        counter.increment();
                    }
                })
            })
            .collect();

        let mut drained = 0.0;
        for handle in handles {
            handle.join().unwrap();
            drained += counter.drain_and_reset();
        }
        drained += counter.drain_and_reset();
        assert_eq!(drained, 4000.0);
    }
}
