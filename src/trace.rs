//! Failure records and stack-trace filtering.
//!
//! A [`StepFailure`] is an explicit record of what went wrong inside a step
//! body: a message, the frames the failure passed through (most recent
//! first) and an optional wrapped cause. [`filter_stacktrace`] rewrites those
//! frames so a report ends at the step definition followed by one synthetic
//! frame for the step's line in the feature file, rather than at the runner
//! frames that dispatched the call.

use std::any::Any;
use std::error::Error;
use std::fmt;
use std::panic::Location;

use camino::{Utf8Path, Utf8PathBuf};

use crate::definition::StepDefinition;

/// Record a [`Frame`] for the current module, file and line.
///
/// # Examples
/// ```rust
/// let frame = stepcall::frame!();
/// assert_eq!(frame.symbol(), Some(module_path!()));
/// ```
#[macro_export]
macro_rules! frame {
    () => {
        $crate::trace::Frame::new(Some(module_path!()), file!(), line!())
    };
}

/// One entry of a failure's stack.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Frame {
    symbol: Option<String>,
    file: Utf8PathBuf,
    line: u32,
}

impl Frame {
    /// Construct a frame from an optional symbol and a source position.
    #[must_use]
    pub fn new(symbol: Option<&str>, file: impl Into<Utf8PathBuf>, line: u32) -> Self {
        Self {
            symbol: symbol.map(str::to_owned),
            file: file.into(),
            line,
        }
    }

    /// Record the caller's source position as an anonymous frame.
    #[must_use]
    #[track_caller]
    pub fn caller() -> Self {
        Self::from_location(Location::caller())
    }

    pub(crate) fn from_location(location: &Location<'_>) -> Self {
        Self::new(None, location.file(), location.line())
    }

    /// Symbol the frame belongs to, when known.
    #[must_use]
    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    /// Source file of the frame.
    #[must_use]
    pub fn file(&self) -> &Utf8Path {
        &self.file
    }

    /// One-based source line of the frame.
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.symbol {
            Some(symbol) => write!(f, "{symbol}({}:{})", self.file, self.line),
            None => write!(f, "{}:{}", self.file, self.line),
        }
    }
}

/// A failure raised while executing a step body.
///
/// Frames are ordered most recent first: index 0 is where the failure was
/// raised and later entries are the callers it propagated through.
///
/// # Examples
/// ```rust
/// use stepcall::StepFailure;
///
/// let failure = StepFailure::new("expected an even number");
/// assert_eq!(failure.message(), "expected an even number");
/// assert_eq!(failure.frames().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    message: String,
    frames: Vec<Frame>,
    cause: Option<Box<StepFailure>>,
}

impl StepFailure {
    /// Raise a failure, recording the caller as its innermost frame.
    #[must_use]
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_frames(message, vec![Frame::caller()])
    }

    /// Build a failure from an explicit list of frames.
    #[must_use]
    pub fn with_frames(message: impl Into<String>, frames: Vec<Frame>) -> Self {
        Self {
            message: message.into(),
            frames,
            cause: None,
        }
    }

    /// Convert a panic payload into a failure.
    ///
    /// `site` is where the panic was raised, when it could be observed; it
    /// becomes the failure's only frame. Without it the failure has no
    /// frames and passes through [`filter_stacktrace`] untouched.
    #[must_use]
    pub fn from_panic(payload: &(dyn Any + Send), site: Option<Frame>) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|msg| (*msg).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| String::from("step panicked"));
        Self::with_frames(message, site.into_iter().collect())
    }

    /// Convert a foreign error and its `source()` chain into a failure chain.
    ///
    /// The caller's position is recorded on the root cause, the only frame
    /// known for a foreign chain. Sources that lead back to an error already
    /// visited end the walk.
    #[must_use]
    #[track_caller]
    pub fn from_error(error: &(dyn Error + 'static)) -> Self {
        let site = Frame::caller();
        let mut messages = vec![error.to_string()];
        let mut visited = vec![error];
        let mut current = error;
        while let Some(next) = current.source() {
            let looped = visited.iter().any(|seen| same_error(*seen, next));
            if looped || visited.len() >= MAX_SOURCE_DEPTH {
                tracing::debug!(error = %next, "stopping at self-referential error source");
                break;
            }
            visited.push(next);
            messages.push(next.to_string());
            current = next;
        }
        let mut chain = messages.into_iter().rev();
        let root = Self::with_frames(chain.next().unwrap_or_default(), vec![site]);
        chain.fold(root, |cause, message| {
            Self::with_frames(message, Vec::new()).caused_by(cause)
        })
    }

    /// Wrap `cause` as the failure underlying `self`.
    #[must_use]
    pub fn caused_by(mut self, cause: Self) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Record an outer frame the failure propagated through.
    #[must_use]
    pub fn called_from(mut self, frame: Frame) -> Self {
        self.push_frame(frame);
        self
    }

    /// Append an outer frame in place.
    pub fn push_frame(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    /// Human-readable failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Frames, most recent first.
    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Directly wrapped cause, if any.
    #[must_use]
    pub fn cause(&self) -> Option<&Self> {
        self.cause.as_deref()
    }

    /// Innermost failure of the cause chain.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        let mut current = self;
        while let Some(cause) = current.cause() {
            current = cause;
        }
        current
    }

    /// Render the message followed by one `at` line per frame.
    #[must_use]
    pub fn backtrace(&self) -> Backtrace<'_> {
        Backtrace(self)
    }
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for StepFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause.as_deref().map(|cause| cause as &(dyn Error + 'static))
    }
}

impl From<anyhow::Error> for StepFailure {
    #[track_caller]
    fn from(error: anyhow::Error) -> Self {
        Self::from_error(&*error)
    }
}

/// Display adapter returned by [`StepFailure::backtrace`].
#[derive(Debug, Clone, Copy)]
pub struct Backtrace<'a>(&'a StepFailure);

impl fmt::Display for Backtrace<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.message())?;
        for frame in self.0.frames() {
            write!(f, "\n\tat {frame}")?;
        }
        Ok(())
    }
}

/// Longest foreign `source()` chain converted before the walk gives up.
const MAX_SOURCE_DEPTH: usize = 256;

/// Same object and same concrete type. A wrapper and the field it exposes
/// as its source can share an address, so the vtable must be compared too.
fn same_error(seen: &(dyn Error + 'static), next: &(dyn Error + 'static)) -> bool {
    std::ptr::eq(seen, next)
}

/// Truncate a failure's frames at the step definition and append the step's
/// location.
///
/// The cause chain is walked to its root first; the root is what gets
/// reported. A root without frames is returned as-is. Otherwise frames are
/// kept up to and including the first one `definition` claims as its own,
/// and `step_location` is appended. When no frame belongs to the definition
/// every frame is kept.
///
/// # Examples
/// ```rust
/// use camino::Utf8Path;
/// use stepcall::{Frame, Step, StepDefinition, StepFailure, StepFn, filter_stacktrace};
///
/// let definition = StepFn::new("count_balls", |_| Ok(()));
/// let body = Frame::new(Some("count_balls"), definition.location().file().to_owned(), 20);
/// let failure = StepFailure::with_frames(
///     "odd number of balls",
///     vec![
///         Frame::new(Some("helpers::check_even"), "src/helpers.rs", 3),
///         body.clone(),
///         Frame::new(Some("runner::dispatch"), "src/runner.rs", 90),
///     ],
/// );
/// let step = Step::new("Then ", "I have 43 balls", 4);
/// let location = step.stack_trace_frame(Utf8Path::new("features/balls.feature"));
///
/// let filtered = filter_stacktrace(&failure, &definition, &location);
///
/// assert_eq!(filtered.message(), "odd number of balls");
/// assert_eq!(filtered.frames().len(), 3);
/// assert_eq!(filtered.frames().get(1), Some(&body));
/// assert_eq!(filtered.frames().last(), Some(&location));
/// ```
#[must_use]
pub fn filter_stacktrace(
    failure: &StepFailure,
    definition: &dyn StepDefinition,
    step_location: &Frame,
) -> StepFailure {
    let root = failure.root_cause();
    if root.frames.is_empty() {
        return root.clone();
    }
    let keep = root
        .frames
        .iter()
        .position(|frame| definition.is_defined_at(frame))
        .map_or(root.frames.len(), |idx| idx + 1);
    tracing::debug!(
        total = root.frames.len(),
        kept = keep,
        step = %step_location,
        "filtering step failure frames"
    );
    let mut frames: Vec<Frame> = root.frames.iter().take(keep).cloned().collect();
    frames.push(step_location.clone());
    StepFailure::with_frames(root.message.clone(), frames)
}

/// Report a failure's root cause with every frame kept and the step's
/// location appended.
///
/// Used instead of [`filter_stacktrace`] when full backtraces are requested.
/// A root without frames is returned as-is.
#[must_use]
pub fn append_step_location(failure: &StepFailure, step_location: &Frame) -> StepFailure {
    let root = failure.root_cause();
    if root.frames.is_empty() {
        return root.clone();
    }
    root.clone().called_from(step_location.clone())
}
