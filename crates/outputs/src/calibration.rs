//! Calibration support plugin
//!
//! Lives in the outputs configuration so it is set up before the outputs
//! that ask for calibrated data. Each optional parameter is a rule for the
//! measurement of the same name.

use airpi_core::{Calibration, CalibrationRule, PluginContext, PluginDescriptor, PluginInstance, PluginParams};
use anyhow::Result;
use std::sync::Arc;

/// Measurements that can be calibrated
const CALIBRATED_MEASUREMENTS: &[&str] = &[
    "Light_Level",
    "Air_Quality",
    "Nitrogen_Dioxide",
    "Carbon_Monoxide",
    "Volume",
    "UVI",
    "Bucket_tips",
];

pub const DESCRIPTOR: PluginDescriptor = PluginDescriptor::new("calibration", "Calibration")
    .description("Per-measurement polynomial calibration shared by outputs")
    .optional(CALIBRATED_MEASUREMENTS)
    .support();

pub fn create(params: &PluginParams, context: &mut PluginContext) -> Result<PluginInstance> {
    let mut rules = Vec::new();
    for name in CALIBRATED_MEASUREMENTS {
        if let Some(text) = params.get(name) {
            let rule = CalibrationRule::parse(name, text).map_err(|reason| params.invalid(name, text, reason))?;
            log::debug!("Calibrating {} with {:?}", name, rule.coefficients);
            rules.push(rule);
        }
    }
    log::info!("Calibration loaded with {} rules", rules.len());

    let calibration = Arc::new(Calibration::new(rules));
    context.provide_calibration(calibration.clone());
    Ok(PluginInstance::Support(Box::new(calibration)))
}

/// The shared calibration for an output whose `calibration` flag is set.
///
/// Returns `None` when the flag is off, or when it is on but no
/// calibration plugin was loaded before the output.
pub fn requested(params: &PluginParams, context: &PluginContext) -> Option<Arc<Calibration>> {
    if !params.flag("calibration") {
        return None;
    }
    let calibration = context.calibration();
    if calibration.is_none() {
        log::warn!(
            "{} asks for calibrated data but no calibration plugin is loaded before it; using raw values",
            params.plugin_name()
        );
    }
    calibration
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provides_calibration_to_later_outputs() {
        let params = PluginParams::new("Calibration")
            .with("Light_Level", "0 2,lux")
            .with("UVI", "1,UVI");
        let mut context = PluginContext::default();

        let instance = create(&params, &mut context).unwrap();
        assert_eq!(instance.kind(), "support");

        let shared = context.calibration().unwrap();
        assert_eq!(shared.rules().len(), 2);
        assert_eq!(shared.rules()[0].name, "Light_Level");
    }

    #[test]
    fn test_bad_rule_rejected() {
        let params = PluginParams::new("Calibration").with("Volume", "loud");
        let mut context = PluginContext::default();
        assert!(create(&params, &mut context).is_err());
    }

    #[test]
    fn test_requested_needs_flag_and_plugin() {
        let mut context = PluginContext::default();
        let with_flag = PluginParams::new("CSVOutput").with("calibration", "on");
        let without = PluginParams::new("CSVOutput");

        assert!(requested(&with_flag, &context).is_none());

        context.provide_calibration(Arc::new(Calibration::new(Vec::new())));
        assert!(requested(&with_flag, &context).is_some());
        assert!(requested(&without, &context).is_none());
    }
}
