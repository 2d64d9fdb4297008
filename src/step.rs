//! Parsed test steps as seen by the invoker.

use camino::Utf8Path;

use crate::argument::Argument;
use crate::error::StepError;
use crate::trace::Frame;

/// Symbol prefix of synthetic frames pointing into feature files.
pub const STEP_FRAME_PREFIX: &str = "✽";

/// Multiline data attached to a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepPayload {
    /// Free-form text block.
    DocString(String),
    /// Tabular rows, forwarded to the step definition unconverted.
    Rows(Vec<Vec<String>>),
}

impl StepPayload {
    /// Bind the payload, unmodified, as an argument value.
    ///
    /// Doc strings bind as `String` and rows as `Vec<Vec<String>>`.
    #[must_use]
    pub fn to_argument(&self) -> Argument {
        match self {
            Self::DocString(text) => Argument::new(text.clone()),
            Self::Rows(rows) => Argument::new(rows.clone()),
        }
    }
}

/// A step of a scenario: keyword, text, line and optional payload.
///
/// # Examples
/// ```rust
/// use camino::Utf8Path;
/// use stepcall::Step;
///
/// let step = Step::new("Given ", "I have 42 red balls", 4);
/// let frame = step.stack_trace_frame(Utf8Path::new("features/balls.feature"));
/// assert_eq!(frame.to_string(), "✽.Given I have 42 red balls(features/balls.feature:4)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    keyword: String,
    text: String,
    line: u32,
    payload: Option<StepPayload>,
}

impl Step {
    /// A step without attached data.
    #[must_use]
    pub fn new(keyword: impl Into<String>, text: impl Into<String>, line: u32) -> Self {
        Self {
            keyword: keyword.into(),
            text: text.into(),
            line,
            payload: None,
        }
    }

    /// Build a step from the raw optional fields a parser produces.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::AmbiguousPayload`] when both a doc string and
    /// rows are present.
    pub fn from_parts(
        keyword: impl Into<String>,
        text: impl Into<String>,
        line: u32,
        doc_string: Option<String>,
        rows: Option<Vec<Vec<String>>>,
    ) -> Result<Self, StepError> {
        let payload = match (doc_string, rows) {
            (Some(_), Some(_)) => return Err(StepError::AmbiguousPayload { line }),
            (Some(body), None) => Some(StepPayload::DocString(body)),
            (None, Some(table)) => Some(StepPayload::Rows(table)),
            (None, None) => None,
        };
        Ok(Self {
            payload,
            ..Self::new(keyword, text, line)
        })
    }

    /// Attach a doc string, replacing any previous payload.
    #[must_use]
    pub fn with_doc_string(mut self, text: impl Into<String>) -> Self {
        self.payload = Some(StepPayload::DocString(text.into()));
        self
    }

    /// Attach tabular rows, replacing any previous payload.
    #[must_use]
    pub fn with_rows(mut self, rows: Vec<Vec<String>>) -> Self {
        self.payload = Some(StepPayload::Rows(rows));
        self
    }

    /// Step keyword including its trailing space (`"Given "`).
    #[must_use]
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Step text following the keyword.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// One-based line of the step in its feature file.
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }

    /// Attached payload, if any.
    #[must_use]
    pub const fn payload(&self) -> Option<&StepPayload> {
        self.payload.as_ref()
    }

    /// Attached doc string, if any.
    #[must_use]
    pub fn doc_string(&self) -> Option<&str> {
        match &self.payload {
            Some(StepPayload::DocString(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Attached rows, if any.
    #[must_use]
    pub fn rows(&self) -> Option<&[Vec<String>]> {
        match &self.payload {
            Some(StepPayload::Rows(rows)) => Some(rows.as_slice()),
            _ => None,
        }
    }

    /// Resolve the step to a frame in the feature file at `path`.
    #[must_use]
    pub fn stack_trace_frame(&self, path: &Utf8Path) -> Frame {
        let symbol = format!("{STEP_FRAME_PREFIX}.{}{}", self.keyword, self.text);
        Frame::new(Some(&symbol), path, self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn rows() -> Vec<Vec<String>> {
        vec![vec![String::from("colour"), String::from("count")]]
    }

    #[rstest]
    fn both_payloads_are_rejected() {
        let result = Step::from_parts(
            "Given ",
            "a basket",
            3,
            Some(String::from("text")),
            Some(rows()),
        );
        assert!(matches!(result, Err(StepError::AmbiguousPayload { line: 3 })));
    }

    #[rstest]
    #[case(Some(String::from("text")), None, Some(StepPayload::DocString(String::from("text"))))]
    #[case(None, Some(rows()), Some(StepPayload::Rows(rows())))]
    #[case(None, None, None)]
    fn single_payload_is_kept(
        #[case] doc_string: Option<String>,
        #[case] table: Option<Vec<Vec<String>>>,
        #[case] expected: Option<StepPayload>,
    ) {
        let step = Step::from_parts("When ", "I count", 9, doc_string, table).ok();
        assert_eq!(step.and_then(|s| s.payload().cloned()), expected);
    }

    #[rstest]
    fn later_payload_replaces_earlier() {
        let step = Step::new("Given ", "a basket", 1)
            .with_doc_string("ignored")
            .with_rows(rows());
        assert_eq!(step.doc_string(), None);
        assert_eq!(step.rows(), Some(rows().as_slice()));
    }

    #[rstest]
    fn payload_binds_unconverted() {
        let argument = StepPayload::Rows(rows()).to_argument();
        assert_eq!(argument.downcast::<Vec<Vec<String>>>().ok(), Some(rows()));
    }

    #[rstest]
    fn frame_points_at_feature_line() {
        let step = Step::new("Then ", "the basket is full", 12);
        let frame = step.stack_trace_frame(Utf8Path::new("features/basket.feature"));
        assert_eq!(frame.symbol(), Some("✽.Then the basket is full"));
        assert_eq!(frame.file(), "features/basket.feature");
        assert_eq!(frame.line(), 12);
    }
}
