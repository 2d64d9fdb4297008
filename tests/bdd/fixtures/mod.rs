//! Scenario state for step invocation scenarios.
//!
//! The step definition under test is not `Clone`, so it lives in a
//! `RefCell<Option<_>>`; everything observed about the run is kept in
//! `Slot`s.

// The `#[fixture]` macro generates types that cannot have doc comments attached
#![allow(
    missing_docs,
    reason = "Generated fixture types cannot have doc comments attached"
)]

use std::cell::RefCell;

use rstest::fixture;
use rstest_bdd::Slot;
use stepcall::Frame;
use test_support::ScriptedDefinition;

/// State shared by the steps of one scenario.
#[derive(Default)]
pub struct TestWorld {
    /// Definition the scenario runs steps against.
    pub definition: RefCell<Option<ScriptedDefinition>>,
    /// Whether failures keep every frame.
    pub full_backtrace: Slot<bool>,
    /// Whether the last run succeeded.
    pub passed: Slot<bool>,
    /// Message of the last run's error.
    pub error_message: Slot<String>,
    /// Whether the last error was an arity mismatch.
    pub arity_mismatch: Slot<bool>,
    /// Frames of the last reported execution failure.
    pub reported_frames: Slot<Vec<Frame>>,
}

/// Fixture providing a fresh `TestWorld` for each scenario.
#[fixture]
pub fn world() -> TestWorld {
    test_support::init_tracing();
    TestWorld::default()
}
