//! A step definition whose behaviour is fixed up front.
//!
//! [`ScriptedDefinition`] records the arguments it was called with and then
//! plays back an [`Outcome`]. Frames whose symbol starts with the
//! definition's name count as its own code.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use ortho_config::LanguageIdentifier;
use stepcall::locale_resolution::fallback_locale;
use stepcall::{Arguments, ExecuteError, Frame, ParamKind, StepDefinition, StepError, StepFailure};

/// File the scripted definition claims to live in.
pub const SCRIPTED_FILE: &str = "steps/scripted.rs";

/// What a [`ScriptedDefinition`] does when executed.
#[derive(Debug)]
pub enum Outcome {
    /// Return successfully.
    Pass,
    /// Return the failure without a dispatch wrapper.
    Fail(StepFailure),
    /// Return the failure wrapped as a dispatched body failure.
    FailDispatched(StepFailure),
    /// Reject the call as the runner would.
    Reject(fn() -> StepError),
    /// Panic with the message.
    Panic(String),
}

/// Step definition that replays a fixed [`Outcome`].
#[derive(Debug)]
pub struct ScriptedDefinition {
    location: Frame,
    kinds: Vec<ParamKind>,
    locale: LanguageIdentifier,
    outcome: Outcome,
    calls: AtomicUsize,
    received: Mutex<Option<Arguments>>,
}

impl ScriptedDefinition {
    /// A definition called `name` that plays back `outcome`.
    #[must_use]
    pub fn new(name: &str, outcome: Outcome) -> Self {
        Self {
            location: Frame::new(Some(name), SCRIPTED_FILE, 1),
            kinds: Vec::new(),
            locale: fallback_locale(),
            outcome,
            calls: AtomicUsize::new(0),
            received: Mutex::new(None),
        }
    }

    /// Declare the next parameter as type `T`.
    #[must_use]
    pub fn param<T: 'static>(mut self) -> Self {
        self.kinds.push(ParamKind::of::<T>());
        self
    }

    /// Convert captured text using `locale`.
    #[must_use]
    pub fn with_locale(mut self, locale: LanguageIdentifier) -> Self {
        self.locale = locale;
        self
    }

    /// A frame inside the definition's body.
    #[must_use]
    pub fn body_frame(&self, line: u32) -> Frame {
        let symbol = format!("{}::body", self.name());
        Frame::new(Some(&symbol), SCRIPTED_FILE, line)
    }

    /// Number of times the definition was executed.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Arguments of the most recent call.
    pub fn take_received(&self) -> Option<Arguments> {
        self.received
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn name(&self) -> &str {
        self.location.symbol().unwrap_or_default()
    }
}

impl StepDefinition for ScriptedDefinition {
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
        frame
            .symbol()
            .is_some_and(|symbol| symbol.starts_with(self.name()))
    }

    fn execute(&self, args: Arguments) -> Result<(), ExecuteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.received.lock().unwrap_or_else(PoisonError::into_inner) = Some(args);
        match &self.outcome {
            Outcome::Pass => Ok(()),
            Outcome::Fail(failure) => Err(ExecuteError::Failure(failure.clone())),
            Outcome::FailDispatched(failure) => Err(ExecuteError::Target(failure.clone())),
            Outcome::Reject(make) => Err(ExecuteError::Runner(make())),
            Outcome::Panic(message) => panic!("{message}"),
        }
    }
}
