//! Static plugin declarations

/// What a plugin type declares about itself before it is instantiated
///
/// Descriptors are `const` values built with the chained constructors
/// below, e.g.
///
/// ```
/// use airpi_core::PluginDescriptor;
///
/// const CSV: PluginDescriptor = PluginDescriptor::new("csvoutput", "CSV file")
///     .required(&["outputdir", "outputfile"])
///     .optional(&["calibration", "metadata"]);
/// assert!(CSV.produces_data);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginDescriptor {
    /// Identifier matched against the `filename` key of a config section
    pub id: &'static str,
    /// Human-readable name
    pub name: &'static str,
    pub description: &'static str,
    /// Parameters that must be present in the plugin's section
    pub required: &'static [&'static str],
    /// Parameters that may be present in the plugin's section
    pub optional: &'static [&'static str],
    /// Parameters taken from the shared `Common` section (notifications only)
    pub common: &'static [&'static str],
    /// Skip this plugin when the internet is unreachable
    pub needs_internet: bool,
    /// False for support plugins that only provide shared services
    pub produces_data: bool,
    pub is_async: bool,
    /// The plugin is the station's location source
    pub reports_location: bool,
}

impl PluginDescriptor {
    pub const fn new(id: &'static str, name: &'static str) -> Self {
        Self {
            id,
            name,
            description: "",
            required: &[],
            optional: &[],
            common: &[],
            needs_internet: false,
            produces_data: true,
            is_async: false,
            reports_location: false,
        }
    }

    pub const fn description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub const fn required(mut self, params: &'static [&'static str]) -> Self {
        self.required = params;
        self
    }

    pub const fn optional(mut self, params: &'static [&'static str]) -> Self {
        self.optional = params;
        self
    }

    pub const fn common(mut self, params: &'static [&'static str]) -> Self {
        self.common = params;
        self
    }

    pub const fn needs_internet(mut self) -> Self {
        self.needs_internet = true;
        self
    }

    pub const fn support(mut self) -> Self {
        self.produces_data = false;
        self
    }

    pub const fn reports_location(mut self) -> Self {
        self.reports_location = true;
        self
    }

    /// Whether `param` is declared anywhere in this descriptor
    pub fn declares(&self, param: &str) -> bool {
        self.required
            .iter()
            .chain(self.optional)
            .chain(self.common)
            .any(|p| p.eq_ignore_ascii_case(param))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CALIBRATION: PluginDescriptor = PluginDescriptor::new("calibration", "Calibration")
        .optional(&["Light_Level", "UVI"])
        .support();

    #[test]
    fn test_defaults() {
        let d = PluginDescriptor::new("print", "Print");
        assert!(d.produces_data);
        assert!(!d.needs_internet);
        assert!(!d.is_async);
        assert!(d.required.is_empty());
    }

    #[test]
    fn test_support_descriptor() {
        assert!(!CALIBRATION.produces_data);
        assert!(CALIBRATION.declares("light_level"));
        assert!(!CALIBRATION.declares("Volume"));
    }
}
