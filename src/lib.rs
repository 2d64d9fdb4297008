//! Step-invocation bridge for behaviour-driven test runners.
//!
//! Given a parsed [`Step`] and a matched [`StepDefinition`], this crate binds
//! the captured text fragments to the definition's typed parameters through a
//! pluggable [`Converter`], appends any doc string or table, invokes the
//! definition and, on failure, rewrites the trace so it ends at the step's
//! line in its feature file.
//!
//! # Examples
//! ```rust
//! use camino::Utf8Path;
//! use stepcall::{CapturedFragment, Step, StepDefinitionMatch, StepFailure, StepFn, TransformerRegistry};
//!
//! let definition = StepFn::new("balls", |args| {
//!     let colour: &String = args.arg(1)?;
//!     if colour.is_empty() {
//!         return Err(StepFailure::new("no colour"));
//!     }
//!     Ok(())
//! })
//! .param::<i64>()
//! .param::<String>();
//! let converter = TransformerRegistry::with_defaults();
//! let fragments = vec![CapturedFragment::new("42", 7), CapturedFragment::new("red", 10)];
//! let step = Step::new("Given ", "I have 42 red balls", 3);
//!
//! let matched = StepDefinitionMatch::new(fragments, &definition, &converter);
//! assert!(matched.run_step(&step, Utf8Path::new("features/balls.feature")).is_ok());
//! ```

pub mod argument;
pub mod binder;
pub mod config;
pub mod convert;
pub mod definition;
pub mod error;
pub mod invoke;
pub mod locale_resolution;
pub mod step;
pub mod trace;

pub use argument::{Argument, Arguments, CapturedFragment, ParamKind};
pub use binder::bind;
pub use config::{ConfigError, StepcallConfig};
pub use convert::{ConversionError, Converter, TransformerRegistry};
pub use definition::{ExecuteError, StepDefinition, StepFn};
pub use error::StepError;
pub use invoke::StepDefinitionMatch;
pub use step::{Step, StepPayload};
pub use trace::{Frame, StepFailure, filter_stacktrace};
