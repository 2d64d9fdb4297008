//! Type-indexed table of text transforms.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use ortho_config::LanguageIdentifier;

use super::number::NumberFormat;
use super::{ConversionError, Converter};
use crate::argument::{Argument, CapturedFragment, ParamKind};

type Transform = dyn Fn(&str, &LanguageIdentifier) -> Result<Argument, String> + Send + Sync;

/// A [`Converter`] dispatching on the parameter's type.
///
/// # Examples
/// ```rust
/// use stepcall::{CapturedFragment, Converter, ParamKind, TransformerRegistry};
///
/// let registry = TransformerRegistry::with_defaults();
/// let locale = "de-DE".parse().unwrap_or_default();
/// let value = registry
///     .transform(&CapturedFragment::new("1.234", 0), ParamKind::of::<i64>(), &locale)
///     .ok()
///     .and_then(|arg| arg.downcast::<i64>().ok());
/// assert_eq!(value, Some(1234));
/// ```
#[derive(Default)]
pub struct TransformerRegistry {
    transforms: HashMap<TypeId, Box<Transform>>,
}

macro_rules! register_parsed {
    ($registry:ident, $normalise:ident; $($ty:ty),+ $(,)?) => {
        $(
            $registry.register::<$ty, _, _>(|text, locale| {
                NumberFormat::for_locale(locale)
                    .$normalise(text)
                    .map_err(|err| err.to_string())
                    .and_then(|normalised| {
                        <$ty as FromStr>::from_str(&normalised).map_err(|err| err.to_string())
                    })
            });
        )+
    };
}

impl TransformerRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with text, boolean, character and numeric
    /// transforms.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register::<String, _, _>(|text, _| Ok::<_, String>(text.to_owned()));
        registry.register::<char, _, _>(|text, _| {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => Ok(ch),
                _ => Err(format!("expected exactly one character, got {}", text.chars().count())),
            }
        });
        registry.register::<bool, _, _>(|text, _| {
            if text.eq_ignore_ascii_case("true") {
                Ok(true)
            } else if text.eq_ignore_ascii_case("false") {
                Ok(false)
            } else {
                Err(String::from("expected true or false"))
            }
        });
        register_parsed!(
            registry, normalise_integer;
            i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize,
        );
        register_parsed!(registry, normalise_decimal; f32, f64);
        registry
    }

    /// Register (or replace) the transform producing values of type `T`.
    pub fn register<T, E, F>(&mut self, transform: F) -> &mut Self
    where
        T: Any + Send,
        E: fmt::Display,
        F: Fn(&str, &LanguageIdentifier) -> Result<T, E> + Send + Sync + 'static,
    {
        let erased = move |text: &str, locale: &LanguageIdentifier| {
            transform(text, locale)
                .map(Argument::new)
                .map_err(|err| err.to_string())
        };
        self.transforms.insert(TypeId::of::<T>(), Box::new(erased));
        self
    }

    /// Whether a transform is registered for `kind`.
    #[must_use]
    pub fn supports(&self, kind: ParamKind) -> bool {
        self.transforms.contains_key(&kind.id())
    }
}

impl fmt::Debug for TransformerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformerRegistry")
            .field("transforms", &self.transforms.len())
            .finish()
    }
}

impl Converter for TransformerRegistry {
    fn transform(
        &self,
        fragment: &CapturedFragment,
        kind: ParamKind,
        locale: &LanguageIdentifier,
    ) -> Result<Argument, ConversionError> {
        let Some(transform) = self.transforms.get(&kind.id()) else {
            return Err(ConversionError::Unsupported {
                fragment: fragment.clone(),
                kind,
            });
        };
        transform(fragment.text(), locale).map_err(|reason| ConversionError::Invalid {
            fragment: fragment.clone(),
            kind,
            locale: locale.to_string(),
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn registry() -> TransformerRegistry {
        TransformerRegistry::with_defaults()
    }

    fn convert<T: Any>(registry: &TransformerRegistry, text: &str, tag: &str) -> Option<T> {
        let locale: LanguageIdentifier = tag.parse().unwrap_or_default();
        registry
            .transform(&CapturedFragment::new(text, 0), ParamKind::of::<T>(), &locale)
            .ok()
            .and_then(|arg| arg.downcast::<T>().ok())
    }

    #[rstest]
    fn converts_builtin_kinds(registry: TransformerRegistry) {
        assert_eq!(convert::<i64>(&registry, "42", "en-US"), Some(42));
        assert_eq!(convert::<u32>(&registry, "1,000", "en-US"), Some(1000));
        assert_eq!(convert::<f64>(&registry, "2,5", "de-DE"), Some(2.5));
        assert_eq!(convert::<bool>(&registry, "TRUE", "en-US"), Some(true));
        assert_eq!(convert::<char>(&registry, "x", "en-US"), Some('x'));
        assert_eq!(
            convert::<String>(&registry, " red ", "en-US").as_deref(),
            Some(" red ")
        );
    }

    #[rstest]
    fn invalid_text_names_fragment_and_kind(registry: TransformerRegistry) {
        let locale: LanguageIdentifier = "en-US".parse().unwrap_or_default();
        let fragment = CapturedFragment::new("forty", 7);

        let err = registry
            .transform(&fragment, ParamKind::of::<u8>(), &locale)
            .err();

        let Some(ConversionError::Invalid {
            fragment: seen,
            kind,
            locale: tag,
            ..
        }) = err.clone()
        else {
            panic!("expected an invalid-value error, got {err:?}");
        };
        assert_eq!(seen, fragment);
        assert!(kind.is::<u8>());
        assert_eq!(tag, "en-US");
    }

    #[rstest]
    fn unknown_kinds_are_unsupported(registry: TransformerRegistry) {
        struct Basket;
        let locale = LanguageIdentifier::default();
        let err = registry
            .transform(&CapturedFragment::new("x", 0), ParamKind::of::<Basket>(), &locale)
            .err();
        assert!(matches!(err, Some(ConversionError::Unsupported { .. })));
    }

    #[rstest]
    fn custom_kinds_can_be_registered() {
        #[derive(Debug, PartialEq)]
        struct Colour(String);

        let mut registry = TransformerRegistry::new();
        registry.register::<Colour, String, _>(|text, _| Ok(Colour(text.to_uppercase())));

        assert!(registry.supports(ParamKind::of::<Colour>()));
        assert_eq!(
            convert::<Colour>(&registry, "red", "en-US"),
            Some(Colour(String::from("RED")))
        );
    }
}
