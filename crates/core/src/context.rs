//! Services shared between plugins for the lifetime of a run

use crate::adc::AdcBus;
use crate::calibration::Calibration;
use crate::error::PluginError;
use airpi_types::RunMetadata;
use std::sync::Arc;

/// Shared services handed to every plugin factory
///
/// Support plugins provide services (the calibration, the ADC bus) and
/// plugins configured after them take those services at construction.
/// The context lives for the whole run and is never rebuilt per cycle.
#[derive(Default)]
pub struct PluginContext {
    metadata: RunMetadata,
    calibration: Option<Arc<Calibration>>,
    adc: Option<Arc<dyn AdcBus>>,
}

impl PluginContext {
    pub fn new(metadata: RunMetadata) -> Self {
        Self {
            metadata,
            calibration: None,
            adc: None,
        }
    }

    pub fn metadata(&self) -> &RunMetadata {
        &self.metadata
    }

    pub fn provide_calibration(&mut self, calibration: Arc<Calibration>) {
        if self.calibration.is_some() {
            log::warn!("A second calibration plugin replaces the first");
        }
        self.calibration = Some(calibration);
    }

    pub fn calibration(&self) -> Option<Arc<Calibration>> {
        self.calibration.clone()
    }

    pub fn provide_adc(&mut self, adc: Arc<dyn AdcBus>) {
        if self.adc.is_some() {
            log::warn!("A second ADC plugin replaces the first");
        }
        self.adc = Some(adc);
    }

    /// The shared ADC bus, or an error naming the plugin that needed it
    pub fn require_adc(&self, plugin: &str) -> Result<Arc<dyn AdcBus>, PluginError> {
        self.adc.clone().ok_or_else(|| PluginError::MissingService {
            plugin: plugin.to_string(),
            service: "ADC bus",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    struct FixedAdc;

    impl AdcBus for FixedAdc {
        fn read_channel(&self, _channel: u8) -> Result<u16> {
            Ok(512)
        }
        fn full_scale(&self) -> u16 {
            1023
        }
        fn channels(&self) -> u8 {
            8
        }
    }

    #[test]
    fn test_adc_must_be_provided_first() {
        let mut context = PluginContext::default();
        assert!(matches!(
            context.require_adc("Air_Quality"),
            Err(PluginError::MissingService { .. })
        ));

        context.provide_adc(Arc::new(FixedAdc));
        let adc = context.require_adc("Air_Quality").unwrap();
        assert_eq!(adc.read_channel(0).unwrap(), 512);
    }

    #[test]
    fn test_calibration_is_shared() {
        let mut context = PluginContext::default();
        assert!(context.calibration().is_none());

        let cal = Arc::new(Calibration::new(Vec::new()));
        context.provide_calibration(cal.clone());
        let taken = context.calibration().unwrap();
        assert!(Arc::ptr_eq(&cal, &taken));
    }
}
