//! Runtime configuration for step invocation.
//!
//! Values come from serialized defaults overlaid by `STEPCALL_*` environment
//! variables, merged with the `figment` layer shipped by `ortho_config`.

use ortho_config::figment::Figment;
use ortho_config::figment::providers::{Env, Serialized};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix of environment variables read by [`StepcallConfig::load`].
pub const ENV_PREFIX: &str = "STEPCALL_";

/// Options controlling how steps are invoked and how failures are reported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepcallConfig {
    /// Locale for converting captured text (`STEPCALL_LOCALE`), applied to a
    /// definition with `StepFn::with_config`. When unset the host locale is
    /// used.
    pub locale: Option<String>,
    /// Keep every frame of a failure instead of truncating at the step
    /// definition (`STEPCALL_FULL_BACKTRACE`).
    pub full_backtrace: bool,
}

/// Raised when configuration layers cannot be merged.
#[derive(Debug, Error)]
#[error("failed to load stepcall configuration: {0}")]
pub struct ConfigError(#[from] Box<ortho_config::figment::Error>);

impl StepcallConfig {
    /// Layered configuration sources: defaults, then environment.
    #[must_use]
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default())).merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable holds a value of the wrong
    /// type.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment())
    }

    /// Extract configuration from explicit layers.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the layers do not describe a valid
    /// configuration.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(Box::new)?;
        tracing::debug!(?config, "loaded stepcall configuration");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn defaults_filter_traces() {
        let config = StepcallConfig::from_figment(&Figment::from(Serialized::defaults(
            StepcallConfig::default(),
        )))
        .ok();
        assert_eq!(config, Some(StepcallConfig::default()));
    }

    #[rstest]
    fn later_layers_override_defaults() {
        let figment = Figment::from(Serialized::defaults(StepcallConfig::default()))
            .merge(Serialized::default("locale", "de-DE"))
            .merge(Serialized::default("full_backtrace", true));

        let config = StepcallConfig::from_figment(&figment).ok();

        assert_eq!(
            config,
            Some(StepcallConfig {
                locale: Some(String::from("de-DE")),
                full_backtrace: true,
            })
        );
    }

    #[rstest]
    fn wrong_types_are_reported() {
        let figment = Figment::from(Serialized::default("full_backtrace", "sometimes"));
        assert!(StepcallConfig::from_figment(&figment).is_err());
    }
}
