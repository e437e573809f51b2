//! `<placeholder>` substitution for file names and messages

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<([A-Za-z_]+)>").expect("placeholder pattern is valid")
});

/// Whether `template` contains any `<name>` placeholder
pub fn has_placeholders(template: &str) -> bool {
    PLACEHOLDER.is_match(template)
}

/// Replace every `<name>` whose name is in `values`; unknown placeholders
/// are left as they are.
pub fn expand(template: &str, values: &HashMap<&str, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            values
                .get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
