//! The step definition contract and a closure-backed implementation.

use std::any::Any;
use std::fmt;
use std::panic::Location;

use ortho_config::LanguageIdentifier;
use thiserror::Error;

use crate::argument::{Arguments, ParamKind};
use crate::config::StepcallConfig;
use crate::error::StepError;
use crate::frame;
use crate::locale_resolution::{SysLocale, fallback_locale, resolve_locale};
use crate::trace::{Frame, StepFailure};

/// A callable step definition discovered elsewhere in the runner.
///
/// Implementations must be safe to share across threads; the invoker holds
/// only a borrow for the duration of one step.
pub trait StepDefinition: Send + Sync {
    /// Declared parameter kinds, in order. A payload parameter, when
    /// present, is last.
    fn parameter_kinds(&self) -> &[ParamKind];

    /// Locale used to convert captured text.
    fn locale(&self) -> &LanguageIdentifier;

    /// Source location of the definition.
    fn location(&self) -> &Frame;

    /// Whether `frame` lies inside the definition's own code.
    fn is_defined_at(&self, frame: &Frame) -> bool;

    /// Run the definition with bound arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ExecuteError`] describing how the call failed.
    fn execute(&self, args: Arguments) -> Result<(), ExecuteError>;
}

/// How a call to [`StepDefinition::execute`] failed.
#[derive(Debug, Error)]
pub enum ExecuteError {
    /// The runner rejected the call; reported as-is.
    #[error(transparent)]
    Runner(#[from] StepError),
    /// The body failed and the dispatcher wrapped its failure.
    #[error("step body failed: {0}")]
    Target(StepFailure),
    /// The call failed without a dispatch wrapper.
    #[error(transparent)]
    Failure(#[from] StepFailure),
}

type StepBody = dyn Fn(&Arguments) -> Result<(), StepFailure> + Send + Sync;

/// A step definition backed by a closure.
///
/// The closure receives the bound arguments and reads them by slot with
/// [`Arguments::arg`]. Frames raised in the file that constructed the
/// `StepFn` count as the definition's own code.
///
/// # Examples
/// ```rust
/// use stepcall::{StepFailure, StepFn};
///
/// let definition = StepFn::new("i_have_n_balls", |args| {
///     let count: &i64 = args.arg(0)?;
///     if count % 2 == 1 {
///         return Err(StepFailure::new("odd number of balls"));
///     }
///     Ok(())
/// })
/// .param::<i64>();
/// # let _ = definition;
/// ```
pub struct StepFn {
    location: Frame,
    kinds: Vec<ParamKind>,
    locale: LanguageIdentifier,
    body: Box<StepBody>,
}

impl StepFn {
    /// Wrap `body` as the definition named `name`, located at the caller.
    #[must_use]
    #[track_caller]
    pub fn new<F>(name: &str, body: F) -> Self
    where
        F: Fn(&Arguments) -> Result<(), StepFailure> + Send + Sync + 'static,
    {
        let caller = Location::caller();
        Self {
            location: Frame::new(Some(name), caller.file(), caller.line()),
            kinds: Vec::new(),
            locale: fallback_locale(),
            body: Box::new(body),
        }
    }

    /// Declare the next parameter as type `T`.
    #[must_use]
    pub fn param<T: Any>(mut self) -> Self {
        self.kinds.push(ParamKind::of::<T>());
        self
    }

    /// Convert captured text using `locale`.
    #[must_use]
    pub fn with_locale(mut self, locale: LanguageIdentifier) -> Self {
        self.locale = locale;
        self
    }

    /// Convert captured text under the locale `config` selects, falling back
    /// to the host locale and then `en-US`.
    #[must_use]
    pub fn with_config(self, config: &StepcallConfig) -> Self {
        self.with_locale(resolve_locale(config, &SysLocale))
    }

    fn check_types(&self, args: &Arguments) -> Result<(), StepError> {
        for (index, (argument, expected)) in args.iter().zip(&self.kinds).enumerate() {
            if !argument.matches(*expected) {
                return Err(StepError::ArgumentType {
                    index,
                    expected: *expected,
                    actual: argument.type_name(),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Debug for StepFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepFn")
            .field("location", &self.location)
            .field("kinds", &self.kinds)
            .field("locale", &self.locale)
            .finish_non_exhaustive()
    }
}

impl StepDefinition for StepFn {
    fn parameter_kinds(&self) -> &[ParamKind] {
        &self.kinds
    }

    fn locale(&self) -> &LanguageIdentifier {
        &self.locale
    }

    fn location(&self) -> &Frame {
        &self.location
    }

    fn is_defined_at(&self, frame: &Frame) -> bool {
        frame.file() == self.location.file()
    }

    fn execute(&self, args: Arguments) -> Result<(), ExecuteError> {
        self.check_types(&args)?;
        tracing::debug!(definition = %self.location, arity = args.len(), "dispatching step body");
        (self.body)(&args).map_err(|failure| ExecuteError::Target(failure.called_from(frame!())))
    }
}
