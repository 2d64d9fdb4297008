//! Step definitions for step invocation scenarios.
//!
//! These steps run real steps through `StepDefinitionMatch` against a
//! scripted definition and record what the invoker reported.

use anyhow::{Context, Result, ensure};
use camino::Utf8Path;
use rstest_bdd_macros::{given, then, when};
use stepcall::{
    CapturedFragment, Step, StepDefinitionMatch, StepError, StepFailure, StepcallConfig,
    TransformerRegistry,
};
use test_support::frames::stack;
use test_support::{Outcome, ScriptedDefinition};

use crate::bdd::fixtures::TestWorld;

const FEATURE_PATH: &str = "features/balls.feature";

fn typed(definition: ScriptedDefinition) -> ScriptedDefinition {
    definition.param::<i64>().param::<String>()
}

fn failure_below(name: &str, message: &str, depth: usize) -> StepFailure {
    let helpers: Vec<String> = (0..depth).map(|i| format!("helpers::h{i}")).collect();
    let body = format!("{name}::body");
    let symbols: Vec<&str> = helpers
        .iter()
        .map(String::as_str)
        .chain([body.as_str(), "runner::invoke", "runner::main"])
        .collect();
    StepFailure::with_frames(message, stack(&symbols))
}

fn capture(text: &str, fragment: &str) -> Result<CapturedFragment> {
    let offset = text
        .find(fragment)
        .with_context(|| format!("'{fragment}' does not occur in '{text}'"))?;
    Ok(CapturedFragment::new(fragment, offset))
}

fn run(world: &TestWorld, text: &str, line: u32, fragments: Vec<CapturedFragment>) -> Result<()> {
    let converter = TransformerRegistry::with_defaults();
    let config = StepcallConfig {
        full_backtrace: world.full_backtrace.get().unwrap_or_default(),
        ..StepcallConfig::default()
    };
    let step = Step::new("Given ", text, line);
    let definition = world.definition.borrow();
    let definition = definition
        .as_ref()
        .context("a step definition must be configured first")?;

    let result = StepDefinitionMatch::new(fragments, definition, &converter)
        .with_config(&config)
        .run_step(&step, Utf8Path::new(FEATURE_PATH));

    world.passed.set(result.is_ok());
    if let Err(err) = result {
        world.error_message.set(err.to_string());
        world
            .arity_mismatch
            .set(matches!(err, StepError::ArityMismatch { .. }));
        if let Some(failure) = err.failure() {
            world.reported_frames.set(failure.frames().to_vec());
        }
    }
    Ok(())
}

#[given("a step definition {name:string} taking an integer and a string")]
fn typed_definition(world: &TestWorld, name: &str) {
    *world.definition.borrow_mut() = Some(typed(ScriptedDefinition::new(name, Outcome::Pass)));
}

#[given("a step definition {name:string} that fails with {message:string} below {depth:usize} helper frames")]
fn failing_definition(world: &TestWorld, name: &str, message: &str, depth: usize) {
    let outcome = Outcome::Fail(failure_below(name, message, depth));
    *world.definition.borrow_mut() = Some(typed(ScriptedDefinition::new(name, outcome)));
}

#[given("a step definition {name:string} that panics with {message:string}")]
fn panicking_definition(world: &TestWorld, name: &str, message: &str) {
    let outcome = Outcome::Panic(message.to_owned());
    *world.definition.borrow_mut() = Some(typed(ScriptedDefinition::new(name, outcome)));
}

#[given("full backtraces are enabled")]
fn enable_full_backtraces(world: &TestWorld) {
    world.full_backtrace.set(true);
}

#[when("the step {text:string} on line {line:u32} runs with arguments {first:string} and {second:string}")]
fn run_with_two(world: &TestWorld, text: &str, line: u32, first: &str, second: &str) -> Result<()> {
    let fragments = vec![capture(text, first)?, capture(text, second)?];
    run(world, text, line, fragments)
}

#[when("the step {text:string} on line {line:u32} runs with argument {first:string}")]
fn run_with_one(world: &TestWorld, text: &str, line: u32, first: &str) -> Result<()> {
    let fragments = vec![capture(text, first)?];
    run(world, text, line, fragments)
}

#[then("the step passes")]
fn step_passes(world: &TestWorld) -> Result<()> {
    ensure!(
        world.passed.get() == Some(true),
        "expected the step to pass, got {:?}",
        world.error_message.get()
    );
    Ok(())
}

#[then("the definition received {count:i32} and {colour:string}")]
fn definition_received(world: &TestWorld, count: i32, colour: &str) -> Result<()> {
    let definition = world.definition.borrow();
    let received = definition
        .as_ref()
        .and_then(ScriptedDefinition::take_received)
        .context("the definition was not called")?;
    ensure!(
        received.get::<i64>(0) == Some(&i64::from(count)),
        "expected {count} in slot 0, got {:?}",
        received.get::<i64>(0)
    );
    ensure!(
        received.get::<String>(1).map(String::as_str) == Some(colour),
        "expected '{colour}' in slot 1, got {:?}",
        received.get::<String>(1)
    );
    Ok(())
}

#[then("the definition was not called")]
fn definition_not_called(world: &TestWorld) -> Result<()> {
    let calls = world
        .definition
        .borrow()
        .as_ref()
        .map_or(0, ScriptedDefinition::calls);
    ensure!(calls == 0, "expected no calls, got {calls}");
    Ok(())
}

#[then("the step fails with {message:string}")]
fn step_fails_with(world: &TestWorld, message: &str) -> Result<()> {
    ensure!(world.passed.get() == Some(false), "expected the step to fail");
    let actual = world.error_message.get();
    ensure!(
        actual.as_deref() == Some(message),
        "expected failure '{message}', got {actual:?}"
    );
    Ok(())
}

#[then("the step reports an arity mismatch")]
fn step_reports_arity_mismatch(world: &TestWorld) -> Result<()> {
    ensure!(
        world.arity_mismatch.get() == Some(true),
        "expected an arity mismatch, got {:?}",
        world.error_message.get()
    );
    Ok(())
}

#[then("the reported trace has {count:usize} frames")]
fn reported_frame_count(world: &TestWorld, count: usize) -> Result<()> {
    let frames = world.reported_frames.get().unwrap_or_default();
    ensure!(
        frames.len() == count,
        "expected {count} frames, got {}",
        frames.len()
    );
    Ok(())
}

#[then("the last reported frame is line {line:u32} of {path:string}")]
fn last_reported_frame(world: &TestWorld, line: u32, path: &str) -> Result<()> {
    let frames = world.reported_frames.get().unwrap_or_default();
    let last = frames.last().context("no frames were reported")?;
    ensure!(
        last.file() == path && last.line() == line,
        "expected the trace to end at {path}:{line}, got {last}"
    );
    ensure!(
        last.symbol().is_some_and(|s| s.starts_with('✽')),
        "expected a step frame, got {last}"
    );
    Ok(())
}
