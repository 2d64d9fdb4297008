//! Pluggable conversion of captured text into typed argument values.
//!
//! The binder only knows the [`Converter`] contract. [`TransformerRegistry`]
//! is the stock implementation: a table of per-type transforms that callers
//! extend with [`TransformerRegistry::register`] instead of touching the
//! binder.
//
// FIXME: remove unused_assignments suppression once miette/thiserror derive
// false positive is fixed upstream.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

mod number;
mod registry;

pub use registry::TransformerRegistry;

use miette::Diagnostic;
use ortho_config::LanguageIdentifier;
use thiserror::Error;

use crate::argument::{Argument, CapturedFragment, ParamKind};

/// Turns one captured fragment into a value of the requested kind.
///
/// Implementations must be deterministic for a given fragment text, kind and
/// locale. The binder calls `transform` once per fragment and neither caches
/// nor retries the result.
pub trait Converter: Send + Sync {
    /// Convert `fragment` into a value of `kind` using `locale`.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError`] when the text cannot be represented as
    /// `kind`, or when `kind` is not supported.
    fn transform(
        &self,
        fragment: &CapturedFragment,
        kind: ParamKind,
        locale: &LanguageIdentifier,
    ) -> Result<Argument, ConversionError>;
}

impl<F> Converter for F
where
    F: Fn(&CapturedFragment, ParamKind, &LanguageIdentifier) -> Result<Argument, ConversionError>
        + Send
        + Sync,
{
    fn transform(
        &self,
        fragment: &CapturedFragment,
        kind: ParamKind,
        locale: &LanguageIdentifier,
    ) -> Result<Argument, ConversionError> {
        self(fragment, kind, locale)
    }
}

/// Raised when a fragment cannot be converted.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ConversionError {
    /// No conversion is known for the requested kind.
    #[error("no conversion to {kind} is registered (argument {fragment})")]
    #[diagnostic(
        code(stepcall::convert::unsupported),
        help("register a transform for this type on the converter")
    )]
    Unsupported {
        /// Fragment that was being converted.
        fragment: CapturedFragment,
        /// Requested parameter kind.
        kind: ParamKind,
    },
    /// The fragment text is not a valid value of the requested kind.
    #[error("cannot convert {fragment} to {kind} for locale {locale}: {reason}")]
    #[diagnostic(code(stepcall::convert::invalid))]
    Invalid {
        /// Fragment that was being converted.
        fragment: CapturedFragment,
        /// Requested parameter kind.
        kind: ParamKind,
        /// Locale the conversion ran under.
        locale: String,
        /// Why the text was rejected.
        reason: String,
    },
}

impl ConversionError {
    /// The fragment whose conversion failed.
    #[must_use]
    pub const fn fragment(&self) -> &CapturedFragment {
        match self {
            Self::Unsupported { fragment, .. } | Self::Invalid { fragment, .. } => fragment,
        }
    }

    /// The kind the fragment was being converted to.
    #[must_use]
    pub const fn kind(&self) -> ParamKind {
        match self {
            Self::Unsupported { kind, .. } | Self::Invalid { kind, .. } => *kind,
        }
    }
}
