//! Shared helpers for the stepcall test suites.
//!
//! Provides a scripted step definition, synthetic stack frames, scoped
//! environment overrides and error formatting used by the integration and
//! behavioural tests.

pub mod definition;
pub mod env;
pub mod error;
pub mod frames;

pub use definition::{Outcome, ScriptedDefinition};
pub use env::ScopedEnv;
pub use error::display_error_chain;

/// Route `tracing` output through the test harness's captured writer.
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .try_init();
}
