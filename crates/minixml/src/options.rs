//! Parser configuration.

use serde::{Deserialize, Serialize};

/// Options controlling how strictly markup is checked while parsing.
///
/// Options deserialize with defaults for missing fields, so they can be
/// embedded in a host application's configuration file:
///
/// ```rust
/// use minixml::ParseOptions;
///
/// let options: ParseOptions = serde_json::from_str(r#"{ "max_depth": 64 }"#).unwrap();
/// assert!(options.check_end_tags);
/// assert_eq!(options.max_depth, Some(64));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Require every end tag to name the element it closes.
    ///
    /// When disabled, an end tag closes whatever element is open regardless
    /// of its name, and a stray end tag with nothing open is ignored with a
    /// warning.
    pub check_end_tags: bool,

    /// Maximum element nesting depth. `None` means unlimited.
    pub max_depth: Option<usize>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            check_end_tags: true,
            max_depth: None,
        }
    }
}

impl ParseOptions {
    /// Create the default (strict) options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options that close elements blindly on any end tag.
    pub fn lenient() -> Self {
        Self::default().with_check_end_tags(false)
    }

    pub fn with_check_end_tags(mut self, check: bool) -> Self {
        self.check_end_tags = check;
        self
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_strict() {
        let options = ParseOptions::default();
        assert!(options.check_end_tags);
        assert_eq!(options.max_depth, None);
    }

    #[test]
    fn test_lenient() {
        let options = ParseOptions::lenient().with_max_depth(Some(8));
        assert!(!options.check_end_tags);
        assert_eq!(options.max_depth, Some(8));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let options = ParseOptions::lenient();
        let json = serde_json::to_string(&options).unwrap();
        let deserialized: ParseOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(options, deserialized);
    }
}
