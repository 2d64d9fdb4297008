//! Errors surfaced by a step invocation.
//!
//! This module isolates derive-macro-affected code to scope lint suppressions
//! narrowly. The `unused_assignments` lint fires in some Rust versions due to
//! thiserror/miette derive macro expansion.

// Scoped suppression for version-dependent lint false positives from
// miette/thiserror derive macros. Since `#[expect]` fails when the lint doesn't
// fire, we must use `#[allow]` here.
// FIXME(rust-lang/rust#130021): remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use std::fmt::Display;

use itertools::Itertools;
use miette::Diagnostic;
use thiserror::Error;

use crate::argument::{CapturedFragment, ParamKind};
use crate::convert::ConversionError;
use crate::trace::{Frame, StepFailure};

fn bracketed<T: Display>(items: &[T]) -> String {
    format!("[{}]", items.iter().join(", "))
}

/// Errors raised while running a single step.
#[derive(Debug, Error, Diagnostic)]
pub enum StepError {
    /// The definition's parameter count does not match the captured
    /// fragments plus payload.
    #[error(
        "Arity mismatch. Parameters: {}. Matched arguments: {}",
        bracketed(.parameters),
        bracketed(.arguments)
    )]
    #[diagnostic(
        code(stepcall::bind::arity_mismatch),
        help(
            "declare one parameter per captured argument, plus a trailing one when the step carries a doc string or table"
        )
    )]
    ArityMismatch {
        /// Declared parameter kinds of the definition.
        parameters: Vec<ParamKind>,
        /// Fragments captured from the step text.
        arguments: Vec<CapturedFragment>,
    },

    /// A bound argument does not have the type its parameter declares.
    #[error("argument {index} is {actual}, but the step definition expects {expected}")]
    #[diagnostic(code(stepcall::bind::argument_type))]
    ArgumentType {
        /// Zero-based argument slot.
        index: usize,
        /// Declared parameter kind.
        expected: ParamKind,
        /// Type name of the bound value.
        actual: &'static str,
    },

    /// A fragment could not be converted to its parameter kind.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Conversion(#[from] ConversionError),

    /// A step record carried both a doc string and tabular rows.
    #[error("step on line {line} carries both a doc string and a table")]
    #[diagnostic(code(stepcall::step::ambiguous_payload))]
    AmbiguousPayload {
        /// Line of the offending step.
        line: u32,
    },

    /// The step definition failed while executing.
    #[error("{failure}")]
    #[diagnostic(code(stepcall::invoke::execution))]
    Execution {
        /// Root-cause failure with its frames filtered.
        failure: StepFailure,
        /// Frame for the step's line in its feature file.
        location: Frame,
        /// Rendered frames of the failure.
        #[help]
        trace: String,
    },
}

impl StepError {
    pub(crate) fn execution(failure: StepFailure, location: Frame) -> Self {
        let trace = failure.backtrace().to_string();
        Self::Execution {
            failure,
            location,
            trace,
        }
    }

    /// The execution failure, when the step definition itself failed.
    #[must_use]
    pub const fn failure(&self) -> Option<&StepFailure> {
        match self {
            Self::Execution { failure, .. } => Some(failure),
            _ => None,
        }
    }
}
