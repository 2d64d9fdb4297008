//! Running a matched step.
//!
//! [`StepDefinitionMatch`] pairs a step definition with the fragments the
//! matcher captured. [`StepDefinitionMatch::run_step`] binds arguments,
//! dispatches the call and turns any failure into a [`StepError`] whose
//! trace ends at the step's line in its feature file.

use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe, PanicHookInfo};
use std::sync::Once;

use camino::Utf8Path;

use crate::argument::{Arguments, CapturedFragment};
use crate::binder::bind;
use crate::config::StepcallConfig;
use crate::convert::Converter;
use crate::definition::{ExecuteError, StepDefinition};
use crate::error::StepError;
use crate::step::Step;
use crate::trace::{Frame, StepFailure, append_step_location, filter_stacktrace};

/// A step definition matched against a step, ready to run.
pub struct StepDefinitionMatch<'a> {
    arguments: Vec<CapturedFragment>,
    definition: &'a dyn StepDefinition,
    converter: &'a dyn Converter,
    full_backtrace: bool,
}

impl<'a> StepDefinitionMatch<'a> {
    /// Pair `definition` with the fragments captured from a step's text.
    #[must_use]
    pub fn new(
        arguments: Vec<CapturedFragment>,
        definition: &'a dyn StepDefinition,
        converter: &'a dyn Converter,
    ) -> Self {
        Self {
            arguments,
            definition,
            converter,
            full_backtrace: false,
        }
    }

    /// Apply reporting options from `config`.
    #[must_use]
    pub fn with_config(mut self, config: &StepcallConfig) -> Self {
        self.full_backtrace = config.full_backtrace;
        self
    }

    /// Fragments captured from the step text.
    #[must_use]
    pub fn arguments(&self) -> &[CapturedFragment] {
        &self.arguments
    }

    /// Source location of the matched definition.
    #[must_use]
    pub fn location(&self) -> &Frame {
        self.definition.location()
    }

    /// Bind arguments for `step` and run the definition.
    ///
    /// `stack_trace_path` is the feature file `step` came from; it names the
    /// synthetic frame appended to failure traces.
    ///
    /// # Errors
    ///
    /// Binding errors and runner errors raised by the definition are returned
    /// unchanged. Any other failure, including a panic in the step body, is
    /// reduced to its root cause, trace-filtered and returned as
    /// [`StepError::Execution`]. A panic's failure carries the panic site as
    /// its frame.
    pub fn run_step(&self, step: &Step, stack_trace_path: &Utf8Path) -> Result<(), StepError> {
        let args = self.transformed_args(step)?;
        let (outcome, panic_site) = capture_panic_site(|| self.definition.execute(args));
        let failure = match outcome {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(ExecuteError::Runner(err))) => return Err(err),
            Ok(Err(ExecuteError::Target(target))) => {
                tracing::debug!(failure = %target, "unwrapping dispatched step failure");
                target
            }
            Ok(Err(ExecuteError::Failure(failure))) => failure,
            Err(payload) => StepFailure::from_panic(&*payload, panic_site),
        };
        Err(self.attribute(&failure, step, stack_trace_path))
    }

    fn transformed_args(&self, step: &Step) -> Result<Arguments, StepError> {
        bind(
            &self.arguments,
            self.definition.parameter_kinds(),
            step.payload(),
            self.converter,
            self.definition.locale(),
        )
    }

    fn attribute(&self, failure: &StepFailure, step: &Step, path: &Utf8Path) -> StepError {
        let location = step.stack_trace_frame(path);
        let reported = if self.full_backtrace {
            append_step_location(failure, &location)
        } else {
            filter_stacktrace(failure, self.definition, &location)
        };
        tracing::debug!(
            step = %location,
            definition = %self.definition.location(),
            "step failed"
        );
        StepError::execution(reported, location)
    }
}

thread_local! {
    static CAPTURING: Cell<bool> = const { Cell::new(false) };
    static PANIC_SITE: RefCell<Option<Frame>> = const { RefCell::new(None) };
}

static PANIC_HOOK: Once = Once::new();

/// Chain a hook in front of the current one that records where a panic was
/// raised while this thread is running a step. Such panics are reported as
/// step failures, so the previous hook is not called for them.
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info: &PanicHookInfo<'_>| {
            if CAPTURING.with(Cell::get) {
                let site = info.location().map(Frame::from_location);
                PANIC_SITE.with(|slot| *slot.borrow_mut() = site);
            } else {
                previous(info);
            }
        }));
    });
}

fn capture_panic_site<R>(call: impl FnOnce() -> R) -> (std::thread::Result<R>, Option<Frame>) {
    install_panic_hook();
    PANIC_SITE.with(|slot| slot.borrow_mut().take());
    let outer = CAPTURING.with(|flag| flag.replace(true));
    let outcome = panic::catch_unwind(AssertUnwindSafe(call));
    CAPTURING.with(|flag| flag.set(outer));
    let site = PANIC_SITE.with(|slot| slot.borrow_mut().take());
    (outcome, site)
}

impl std::fmt::Debug for StepDefinitionMatch<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepDefinitionMatch")
            .field("arguments", &self.arguments)
            .field("location", self.definition.location())
            .field("full_backtrace", &self.full_backtrace)
            .finish_non_exhaustive()
    }
}
