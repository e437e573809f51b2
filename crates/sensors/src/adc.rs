//! MCP3008 ADC through the Linux IIO subsystem
//!
//! With the `mcp3008` device-tree overlay loaded, the kernel's mcp320x
//! driver exposes each channel as `in_voltageN_raw`. This support plugin
//! opens the device once and provides it to the analogue sensors.

use airpi_core::{AdcBus, PluginContext, PluginDescriptor, PluginInstance, PluginParams};
use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

pub const DESCRIPTOR: PluginDescriptor = PluginDescriptor::new("mcp3008", "MCP3008 ADC")
    .description("Shared 8-channel 10-bit ADC used by analogue sensors")
    .optional(&["device", "iioroot"])
    .support();

const DEFAULT_IIO_ROOT: &str = "/sys/bus/iio/devices";
const MCP3008_CHANNELS: u8 = 8;
const MCP3008_FULL_SCALE: u16 = 1023;

/// ADC read through IIO sysfs files
#[derive(Debug)]
pub struct IioAdc {
    device_dir: PathBuf,
}

impl IioAdc {
    pub fn new(device_dir: impl Into<PathBuf>) -> Self {
        Self {
            device_dir: device_dir.into(),
        }
    }
}

impl AdcBus for IioAdc {
    fn read_channel(&self, channel: u8) -> Result<u16> {
        if channel >= MCP3008_CHANNELS {
            bail!("ADC channel {} out of range 0-{}", channel, MCP3008_CHANNELS - 1);
        }
        let path = self.device_dir.join(format!("in_voltage{}_raw", channel));
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        text.trim()
            .parse::<u16>()
            .with_context(|| format!("Unexpected ADC output '{}' from {}", text.trim(), path.display()))
    }

    fn full_scale(&self) -> u16 {
        MCP3008_FULL_SCALE
    }

    fn channels(&self) -> u8 {
        MCP3008_CHANNELS
    }
}

pub fn create(params: &PluginParams, context: &mut PluginContext) -> Result<PluginInstance> {
    let root = PathBuf::from(params.get("iioroot").unwrap_or(DEFAULT_IIO_ROOT));
    let device: u32 = params.parse_or("device", 0)?;
    let device_dir = root.join(format!("iio:device{}", device));
    if !device_dir.is_dir() {
        bail!(
            "IIO device {} not found; is the mcp3008 overlay loaded?",
            device_dir.display()
        );
    }

    let adc = Arc::new(IioAdc::new(device_dir));
    context.provide_adc(adc.clone());
    Ok(PluginInstance::Support(Box::new(adc)))
}
