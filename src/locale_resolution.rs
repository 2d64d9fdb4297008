//! Locale resolution for argument conversion.
//!
//! Step definitions convert captured text under a locale. These helpers pick
//! that locale from configuration or the host, normalising whatever raw tag
//! they find.

use std::str::FromStr;

use ortho_config::LanguageIdentifier;

use crate::config::StepcallConfig;

/// Locale used when neither configuration nor the host supplies one.
pub const FALLBACK_LOCALE: &str = "en-US";

/// System locale provider for the current host.
pub trait SystemLocale {
    /// Return the system locale string when available.
    fn system_locale(&self) -> Option<String>;
}

/// System locale provider backed by `sys-locale`.
#[derive(Debug, Default, Copy, Clone)]
pub struct SysLocale;

impl SystemLocale for SysLocale {
    fn system_locale(&self) -> Option<String> {
        sys_locale::get_locale()
    }
}

/// Normalize a raw locale string into a valid BCP 47 language tag.
///
/// This strips encoding suffixes (for example `.UTF-8`), removes variant
/// sections (for example `@latin`), replaces underscores with hyphens, and
/// validates the result using `LanguageIdentifier`.
///
/// # Examples
///
/// ```rust
/// use stepcall::locale_resolution::normalize_locale_tag;
///
/// assert_eq!(normalize_locale_tag("en_US.UTF-8"), Some("en-US".to_string()));
/// assert_eq!(normalize_locale_tag("es-ES"), Some("es-ES".to_string()));
/// assert_eq!(normalize_locale_tag("??"), None);
/// ```
#[must_use]
pub fn normalize_locale_tag(raw: &str) -> Option<String> {
    parse_locale(raw).map(|lang| lang.to_string())
}

fn parse_locale(raw: &str) -> Option<LanguageIdentifier> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let stripped = trimmed.split(['.', '@']).next().unwrap_or_default().trim();
    if stripped.is_empty() {
        return None;
    }
    let candidate = stripped.replace('_', "-");
    LanguageIdentifier::from_str(&candidate).ok()
}

/// The `en-US` locale.
#[must_use]
pub fn fallback_locale() -> LanguageIdentifier {
    LanguageIdentifier::from_str(FALLBACK_LOCALE).unwrap_or_default()
}

/// Resolve the locale step definitions convert arguments under.
///
/// Precedence is the configured locale (which already includes the
/// `STEPCALL_LOCALE` environment override), then the system locale, then
/// [`FALLBACK_LOCALE`]. Invalid candidates are skipped.
///
/// # Examples
///
/// ```rust
/// use stepcall::StepcallConfig;
/// use stepcall::locale_resolution::{resolve_locale, SystemLocale};
///
/// struct StubSystem(Option<String>);
/// impl SystemLocale for StubSystem {
///     fn system_locale(&self) -> Option<String> {
///         self.0.clone()
///     }
/// }
///
/// let config = StepcallConfig { locale: Some("es_ES.UTF-8".into()), ..StepcallConfig::default() };
/// let locale = resolve_locale(&config, &StubSystem(Some("fr_FR".into())));
/// assert_eq!(locale.to_string(), "es-ES");
/// ```
#[must_use]
pub fn resolve_locale(config: &StepcallConfig, system: &impl SystemLocale) -> LanguageIdentifier {
    let system_locale = system.system_locale();
    [config.locale.as_deref(), system_locale.as_deref()]
        .into_iter()
        .flatten()
        .find_map(parse_locale)
        .unwrap_or_else(fallback_locale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    struct StubSystem(Option<&'static str>);

    impl SystemLocale for StubSystem {
        fn system_locale(&self) -> Option<String> {
            self.0.map(str::to_owned)
        }
    }

    #[rstest]
    #[case(Some("de_DE.UTF-8"), Some("fr_FR"), "de-DE")]
    #[case(None, Some("fr_FR@euro"), "fr-FR")]
    #[case(Some("not a locale"), Some("pt_BR"), "pt-BR")]
    #[case(None, None, "en-US")]
    #[case(Some(""), Some("C.UTF-8"), "en-US")]
    fn precedence_and_fallback(
        #[case] configured: Option<&str>,
        #[case] system: Option<&'static str>,
        #[case] expected: &str,
    ) {
        let config = StepcallConfig {
            locale: configured.map(str::to_owned),
            ..StepcallConfig::default()
        };
        let locale = resolve_locale(&config, &StubSystem(system));
        assert_eq!(locale.to_string(), expected);
    }
}
