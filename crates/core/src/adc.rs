//! Shared analogue-to-digital converter bus

use anyhow::Result;

/// An ADC shared by several analogue sensors
///
/// Provided once per run by a support plugin and handed to every analogue
/// sensor through the plugin context.
pub trait AdcBus: Send + Sync {
    /// Read the raw count on one input channel
    fn read_channel(&self, channel: u8) -> Result<u16>;

    /// Highest raw count the converter can report (1023 for 10-bit parts)
    fn full_scale(&self) -> u16;

    /// Number of input channels
    fn channels(&self) -> u8;
}
