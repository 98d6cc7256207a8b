use anyhow::{anyhow, Result};
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use unic_langid::LanguageIdentifier;

/// Message catalog compiled into the binary
const MAIN_RESOURCE: &str = include_str!("../locales/en/main.ftl");

/// Message catalog for the shop's user- and operator-facing texts
pub struct Messages {
    bundle: FluentBundle<FluentResource>,
}

impl std::fmt::Debug for Messages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Messages").finish_non_exhaustive()
    }
}

impl Messages {
    /// Create the catalog from the bundled English resource
    pub fn new() -> Result<Self> {
        Self::from_source(MAIN_RESOURCE)
    }

    /// Create a catalog from Fluent source text
    pub fn from_source(source: &str) -> Result<Self> {
        let locale: LanguageIdentifier = "en".parse()?;
        let mut bundle = FluentBundle::new_concurrent(vec![locale]);
        // Keep interpolated values free of bidi isolation marks
        bundle.set_use_isolating(false);

        let resource = FluentResource::try_new(source.to_string())
            .map_err(|(_, errors)| anyhow!("Failed to parse message catalog: {errors:?}"))?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow!("Failed to load message catalog: {errors:?}"))?;

        Ok(Self { bundle })
    }

    /// Get a message
    pub fn get(&self, key: &str) -> String {
        self.format(key, None)
    }

    /// Get a message with simple string arguments
    pub fn get_with_args(&self, key: &str, args: &[(&str, &str)]) -> String {
        let fluent_args = FluentArgs::from_iter(
            args.iter()
                .map(|(k, v)| (*k, FluentValue::from(v.to_string()))),
        );
        self.format(key, Some(&fluent_args))
    }

    fn format(&self, key: &str, args: Option<&FluentArgs<'_>>) -> String {
        let msg = match self.bundle.get_message(key) {
            Some(msg) => msg,
            None => return format!("Missing translation: {key}"),
        };

        let pattern = match msg.value() {
            Some(pattern) => pattern,
            None => return format!("Missing value for key: {key}"),
        };

        let mut errors = vec![];
        self.bundle
            .format_pattern(pattern, args, &mut errors)
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_catalog_loads() {
        let messages = Messages::new().unwrap();
        assert_eq!(messages.get("main-menu"), "Main menu:");
    }

    #[test]
    fn test_arguments_are_interpolated_without_isolation_marks() {
        let messages = Messages::new().unwrap();
        assert_eq!(
            messages.get_with_args("cart-total", &[("total", "2400")]),
            "💵 Total: 2400 RUB"
        );
    }

    #[test]
    fn test_missing_key() {
        let messages = Messages::new().unwrap();
        assert_eq!(messages.get("no-such-key"), "Missing translation: no-such-key");
    }

    #[test]
    fn test_invalid_source_is_rejected() {
        assert!(Messages::from_source("broken = { $").is_err());
    }
}
