//! Locale-aware normalisation of numeric text.
//!
//! Captured numbers are written the way the feature's language writes them
//! (`1,234.5` in English, `1.234,5` in German). Before handing text to
//! `str::parse` the grouping separators are dropped and the decimal separator
//! is rewritten to `.`.

use ortho_config::LanguageIdentifier;
use thiserror::Error;

/// Separators used when writing numbers in one language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NumberFormat {
    grouping: &'static [char],
    decimal: char,
}

/// Why numeric text could not be normalised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum NumberError {
    #[error("empty number")]
    Empty,
    #[error("unexpected decimal separator '{0}' in an integer")]
    DecimalInInteger(char),
    #[error("more than one decimal separator '{0}'")]
    RepeatedDecimal(char),
}

const COMMA_DECIMAL_DOT_GROUPING: &[&str] = &[
    "da", "de", "el", "es", "id", "it", "nl", "pt", "ro", "sl", "tr", "vi",
];
const COMMA_DECIMAL_SPACE_GROUPING: &[&str] = &[
    "bg", "cs", "et", "fi", "fr", "hu", "lt", "lv", "nb", "no", "pl", "ru", "sk", "sv", "uk",
];

impl NumberFormat {
    pub(crate) fn for_locale(locale: &LanguageIdentifier) -> Self {
        let language = locale.language.as_str();
        if COMMA_DECIMAL_DOT_GROUPING.contains(&language) {
            Self {
                grouping: &['.'],
                decimal: ',',
            }
        } else if COMMA_DECIMAL_SPACE_GROUPING.contains(&language) {
            Self {
                grouping: &[' ', '\u{a0}', '\u{202f}'],
                decimal: ',',
            }
        } else {
            Self {
                grouping: &[','],
                decimal: '.',
            }
        }
    }

    /// Strip grouping separators from an integer.
    pub(crate) fn normalise_integer(self, raw: &str) -> Result<String, NumberError> {
        let text = raw.trim();
        if text.contains(self.decimal) {
            return Err(NumberError::DecimalInInteger(self.decimal));
        }
        let digits: String = text.chars().filter(|c| !self.grouping.contains(c)).collect();
        if digits.is_empty() {
            return Err(NumberError::Empty);
        }
        Ok(digits)
    }

    /// Strip grouping separators and rewrite the decimal separator to `.`.
    pub(crate) fn normalise_decimal(self, raw: &str) -> Result<String, NumberError> {
        let text = raw.trim();
        if text.matches(self.decimal).count() > 1 {
            return Err(NumberError::RepeatedDecimal(self.decimal));
        }
        let normalised: String = text
            .chars()
            .filter(|c| !self.grouping.contains(c))
            .map(|c| if c == self.decimal { '.' } else { c })
            .collect();
        if normalised.is_empty() {
            return Err(NumberError::Empty);
        }
        Ok(normalised)
    }
}
