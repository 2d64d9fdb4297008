//! Binding captured fragments and step payloads to parameter slots.

use ortho_config::LanguageIdentifier;

use crate::argument::{Arguments, CapturedFragment, ParamKind};
use crate::convert::Converter;
use crate::error::StepError;
use crate::step::StepPayload;

/// Build the argument list for a call.
///
/// Each fragment is converted to the parameter kind in the same position;
/// the payload, when present, fills the final slot unconverted. The arity
/// check runs before any conversion.
///
/// # Errors
///
/// Returns [`StepError::ArityMismatch`] when `kinds` does not have exactly
/// one entry per fragment plus one for a payload, and
/// [`StepError::Conversion`] for the first fragment the converter rejects.
///
/// # Examples
/// ```rust
/// use stepcall::{CapturedFragment, ParamKind, TransformerRegistry, bind};
///
/// let fragments = [CapturedFragment::new("42", 3), CapturedFragment::new("red", 10)];
/// let kinds = [ParamKind::of::<i64>(), ParamKind::of::<String>()];
/// let locale = "en-US".parse().unwrap_or_default();
/// let args = bind(&fragments, &kinds, None, &TransformerRegistry::with_defaults(), &locale);
/// let args = args.ok();
/// assert_eq!(args.as_ref().and_then(|a| a.get::<i64>(0)), Some(&42));
/// assert_eq!(args.as_ref().and_then(|a| a.get::<String>(1)).map(String::as_str), Some("red"));
/// ```
pub fn bind(
    fragments: &[CapturedFragment],
    kinds: &[ParamKind],
    payload: Option<&StepPayload>,
    converter: &dyn Converter,
    locale: &LanguageIdentifier,
) -> Result<Arguments, StepError> {
    let expected = fragments.len() + usize::from(payload.is_some());
    if kinds.len() != expected {
        return Err(StepError::ArityMismatch {
            parameters: kinds.to_vec(),
            arguments: fragments.to_vec(),
        });
    }

    let mut bound = Vec::with_capacity(expected);
    for (fragment, kind) in fragments.iter().zip(kinds) {
        bound.push(converter.transform(fragment, *kind, locale)?);
    }
    if let Some(data) = payload {
        bound.push(data.to_argument());
    }
    tracing::debug!(arity = bound.len(), %locale, "bound step arguments");
    Ok(Arguments::from(bound))
}
