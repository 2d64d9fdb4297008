//! Captured fragments, parameter kinds and bound argument values.

use std::any::{Any, TypeId, type_name};
use std::fmt;

use crate::trace::StepFailure;

/// A substring captured from the step text by the matcher.
///
/// # Examples
/// ```rust
/// use stepcall::CapturedFragment;
///
/// let fragment = CapturedFragment::new("42", 3);
/// assert_eq!(fragment.to_string(), "\"42\"@3");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CapturedFragment {
    text: String,
    offset: usize,
}

impl CapturedFragment {
    /// Record `text` captured at byte `offset` of the step text.
    #[must_use]
    pub fn new(text: impl Into<String>, offset: usize) -> Self {
        Self {
            text: text.into(),
            offset,
        }
    }

    /// The captured text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Byte offset of the capture within the step text.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }
}

impl fmt::Display for CapturedFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{}", self.text, self.offset)
    }
}

/// The declared type of a step definition parameter.
///
/// Kinds are open: any `'static` type can be a parameter kind, and the
/// binder never inspects them beyond passing them to the converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamKind {
    id: TypeId,
    name: &'static str,
}

impl ParamKind {
    /// Kind describing values of type `T`.
    #[must_use]
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Type identifier of the kind.
    #[must_use]
    pub const fn id(self) -> TypeId {
        self.id
    }

    /// Fully qualified type name of the kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.name
    }

    /// Whether `T` is the type this kind describes.
    #[must_use]
    pub fn is<T: Any>(self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&short_type_name(self.name))
    }
}

/// Strip module paths from every segment of a type name.
///
/// `alloc::vec::Vec<alloc::string::String>` becomes `Vec<String>`.
fn short_type_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut path = String::new();
    for ch in name.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == ':' {
            path.push(ch);
            continue;
        }
        out.push_str(path.rsplit("::").next().unwrap_or_default());
        path.clear();
        out.push(ch);
    }
    out.push_str(path.rsplit("::").next().unwrap_or_default());
    out
}

/// A type-erased value bound to one parameter slot.
pub struct Argument {
    value: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl Argument {
    /// Wrap a converted value.
    #[must_use]
    pub fn new<T: Any + Send>(value: T) -> Self {
        Self {
            value: Box::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Type identifier of the wrapped value.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        (*self.value).type_id()
    }

    /// Fully qualified type name of the wrapped value.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether the wrapped value has the type `kind` describes.
    #[must_use]
    pub fn matches(&self, kind: ParamKind) -> bool {
        self.type_id() == kind.id()
    }

    /// Borrow the wrapped value as `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Take the wrapped value as `T`, handing the argument back on mismatch.
    ///
    /// # Errors
    ///
    /// Returns `self` unchanged when the value is not a `T`.
    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        let Self { value, type_name } = self;
        value
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|value| Self { value, type_name })
    }
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argument")
            .field("type", &short_type_name(self.type_name))
            .finish_non_exhaustive()
    }
}

/// The ordered argument list handed to a step definition.
#[derive(Debug, Default)]
pub struct Arguments(Vec<Argument>);

impl Arguments {
    /// Number of bound arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no arguments were bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the arguments in slot order.
    pub fn iter(&self) -> std::slice::Iter<'_, Argument> {
        self.0.iter()
    }

    /// Borrow argument `index` as `T`.
    #[must_use]
    pub fn get<T: Any>(&self, index: usize) -> Option<&T> {
        self.0.get(index).and_then(Argument::downcast_ref::<T>)
    }

    /// Borrow argument `index` as `T`, failing the step when it is absent or
    /// of another type.
    ///
    /// # Errors
    ///
    /// Returns a [`StepFailure`] raised at the caller.
    #[track_caller]
    pub fn arg<T: Any>(&self, index: usize) -> Result<&T, StepFailure> {
        match self.0.get(index) {
            Some(argument) => argument.downcast_ref::<T>().ok_or_else(|| {
                StepFailure::new(format!(
                    "argument {index} is {}, not {}",
                    short_type_name(argument.type_name()),
                    short_type_name(type_name::<T>()),
                ))
            }),
            None => Err(StepFailure::new(format!(
                "argument {index} is out of range for {} bound argument(s)",
                self.0.len()
            ))),
        }
    }

    /// Take ownership of the bound values.
    #[must_use]
    pub fn into_vec(self) -> Vec<Argument> {
        self.0
    }
}

impl From<Vec<Argument>> for Arguments {
    fn from(value: Vec<Argument>) -> Self {
        Self(value)
    }
}

impl FromIterator<Argument> for Arguments {
    fn from_iter<I: IntoIterator<Item = Argument>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Arguments {
    type Item = Argument;
    type IntoIter = std::vec::IntoIter<Argument>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Arguments {
    type Item = &'a Argument;
    type IntoIter = std::slice::Iter<'a, Argument>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ParamKind::of::<i64>(), "i64")]
    #[case(ParamKind::of::<String>(), "String")]
    #[case(ParamKind::of::<Vec<Vec<String>>>(), "Vec<Vec<String>>")]
    #[case(ParamKind::of::<Option<(u8, String)>>(), "Option<(u8, String)>")]
    fn kinds_display_short_names(#[case] kind: ParamKind, #[case] expected: &str) {
        assert_eq!(kind.to_string(), expected);
    }

    #[rstest]
    fn argument_reports_wrapped_type() {
        let argument = Argument::new(42_i64);
        assert!(argument.matches(ParamKind::of::<i64>()));
        assert!(!argument.matches(ParamKind::of::<i32>()));
        assert_eq!(argument.downcast_ref::<i64>(), Some(&42));
    }

    #[rstest]
    fn downcast_returns_argument_on_mismatch() {
        let argument = Argument::new(String::from("red"));
        let Err(same) = argument.downcast::<i64>() else {
            panic!("String must not downcast to i64");
        };
        assert_eq!(same.downcast::<String>().ok().as_deref(), Some("red"));
    }

    #[rstest]
    fn arg_fails_with_type_names() {
        let args = Arguments::from(vec![Argument::new(1_u8)]);
        let failure = args.arg::<String>(0).err();
        assert_eq!(
            failure.as_ref().map(StepFailure::message),
            Some("argument 0 is u8, not String")
        );
        assert!(args.arg::<u8>(1).is_err());
        assert_eq!(args.arg::<u8>(0).ok(), Some(&1));
    }
}
