//! Synthetic stack frames for trace assertions.

use stepcall::{Frame, StepFailure};

/// File every synthetic frame points into.
pub const SYNTHETIC_FILE: &str = "src/synthetic.rs";

/// Frames for `symbols`, most recent first, on consecutive lines.
#[must_use]
pub fn stack(symbols: &[&str]) -> Vec<Frame> {
    (1_u32..)
        .zip(symbols)
        .map(|(line, symbol)| Frame::new(Some(symbol), SYNTHETIC_FILE, line))
        .collect()
}

/// Symbols of `frames`, with `""` for frames that have none.
#[must_use]
pub fn symbols(frames: &[Frame]) -> Vec<&str> {
    frames.iter().map(|f| f.symbol().unwrap_or_default()).collect()
}

/// Raise a failure from this file, outside any step definition.
#[must_use]
pub fn helper_failure(message: &str) -> StepFailure {
    StepFailure::new(message)
}
