//! Shared constants for the station

use std::time::Duration;

/// Sample interval used when settings do not provide a usable one
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(5);

/// Subtracted from every inter-cycle sleep so the loop wakes just before
/// the next tick instead of just after it
pub const SLEEP_GUARD_BAND: Duration = Duration::from_millis(10);

/// How long a status LED stays lit after a cycle
pub const INDICATOR_PULSE: Duration = Duration::from_secs(1);

/// Endpoint probed by the connectivity gate
pub const CONNECTIVITY_PROBE_URL: &str = "http://www.google.com";

/// Connectivity probe timeout (5 seconds)
pub const CONNECTIVITY_TIMEOUT: Duration = Duration::from_secs(5);

/// Debounce window applied to GPIO pulse inputs (300ms)
pub const PULSE_DEBOUNCE: Duration = Duration::from_millis(300);

/// Value reported by a pulse counter that saw no pulses.
/// Keeps an idle rain gauge from reading as a failed sensor.
pub const PULSE_FLOOR: f64 = 0.0000001;

/// Section of the notifications config that holds shared parameters
pub const COMMON_SECTION: &str = "Common";
