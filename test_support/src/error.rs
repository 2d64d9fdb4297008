//! Error formatting helpers for stable, deterministic test assertions.

use std::error::Error;

/// Join an error and its sources, outermost first, with `": "`.
///
/// A [`stepcall::StepFailure`] exposes its cause through `source`, so the
/// whole cause chain is shown.
///
/// # Examples
///
/// ```rust
/// use stepcall::StepFailure;
/// use test_support::display_error_chain;
///
/// let failure = StepFailure::new("outer").caused_by(StepFailure::new("inner"));
/// assert_eq!(display_error_chain(&failure), "outer: inner");
/// ```
#[must_use]
pub fn display_error_chain(e: &(dyn Error + 'static)) -> String {
    let mut current: Option<&(dyn Error + 'static)> = Some(e);
    std::iter::from_fn(|| {
        let err = current?;
        current = err.source();
        Some(err.to_string())
    })
    .collect::<Vec<_>>()
    .join(": ")
}
