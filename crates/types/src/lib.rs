//! Validated text primitives shared across the clinrec crates.
//!
//! Search criteria, document identifiers and patient identifiers all arrive as free text from
//! HTTP bodies, query strings or the command line. These types make "present and non-blank" a
//! property of the value rather than something every call site has to re-check.

use std::str::FromStr;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// A string type that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during construction, so a value
/// such as `"  4.0 "` is stored as `"4.0"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Errors
    ///
    /// Returns `Err(TextError::Empty)` if the input is empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Like [`NonEmptyText::new`], but maps blank input to `None` instead of an error.
    ///
    /// Useful when blank means "not supplied", as with optional query parameters.
    pub fn from_optional(input: Option<impl AsRef<str>>) -> Option<Self> {
        input.and_then(|s| Self::new(s).ok())
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the trimmed string.
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Lowercased copy of the text, for case-insensitive comparisons.
    pub fn folded(&self) -> String {
        self.0.to_lowercase()
    }

    /// True if this text occurs anywhere in `haystack`, ignoring case.
    pub fn is_contained_in(&self, haystack: &str) -> bool {
        haystack.to_lowercase().contains(&self.folded())
    }
}

impl FromStr for NonEmptyText {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_input() {
        let text = NonEmptyText::new("  POTASSIO \n").expect("non-empty");
        assert_eq!(text.as_str(), "POTASSIO");
    }

    #[test]
    fn rejects_blank_input() {
        assert_eq!(NonEmptyText::new(""), Err(TextError::Empty));
        assert_eq!(NonEmptyText::new(" \t "), Err(TextError::Empty));
    }

    #[test]
    fn optional_blank_is_none() {
        assert!(NonEmptyText::from_optional(Some("   ")).is_none());
        assert!(NonEmptyText::from_optional(None::<&str>).is_none());
        assert_eq!(
            NonEmptyText::from_optional(Some(" abc ")).map(NonEmptyText::into_inner),
            Some("abc".to_string())
        );
    }

    #[test]
    fn containment_ignores_case() {
        let needle = NonEmptyText::new("potassio").unwrap();
        assert!(needle.is_contained_in("K - POTASSIO SIERICO"));
        assert!(!needle.is_contained_in("SODIO"));
    }

    #[test]
    fn deserialize_rejects_blank() {
        let err = serde_json::from_str::<NonEmptyText>("\"  \"").expect_err("blank");
        assert!(err.to_string().contains("empty"));

        let ok: NonEmptyText = serde_json::from_str("\" doc-1 \"").expect("valid");
        assert_eq!(ok.as_str(), "doc-1");
    }
}
