//! Validated identifiers

use std::borrow::Borrow;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::diagnostics::RuntimeError;
use crate::types::{MAIN, is_flag_keyword, is_keyword, is_type_keyword};

/// An identifier that passed the name check.
///
/// A name consists of word characters (`[A-Za-z0-9_]`) with at least one ASCII
/// letter, and is none of the language's keywords, type names or flags. The one
/// exception is `main`, which names the program's entry point.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Name(Rc<str>);

impl Name {
    pub fn new(name: impl AsRef<str>) -> Result<Self, RuntimeError> {
        let name = name.as_ref();
        if name == MAIN || Self::is_valid(name) {
            Ok(Name(Rc::from(name)))
        } else {
            Err(RuntimeError::InvalidName {
                name: name.to_string(),
            })
        }
    }

    /// Check `candidate` against the name rules without constructing a `Name`
    pub fn is_valid(candidate: &str) -> bool {
        let word_chars = candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
        let has_letter = candidate.chars().any(|c| c.is_ascii_alphabetic());
        word_chars
            && has_letter
            && !is_keyword(candidate)
            && !is_type_keyword(candidate)
            && !is_flag_keyword(candidate)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// `Rc<str>` hashes like `str`, so lookups by `&str` hit the same buckets.
impl Borrow<str> for Name {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Name {
    type Error = RuntimeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Name::new(value)
    }
}

impl From<Name> for String {
    fn from(name: Name) -> Self {
        name.0.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        for ok in ["x", "total", "_tmp1", "a_b_c", "x2", "__A__", "main"] {
            assert!(Name::new(ok).is_ok(), "{ok} should be a valid name");
        }
    }

    #[test]
    fn test_invalid_names() {
        for bad in ["", "1", "_", "12_", "a-b", "white space", "ünïcode"] {
            assert!(Name::new(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_reserved_words_rejected() {
        for bad in ["if", "return", "number", "text", "var", "const", "final", "true"] {
            let err = Name::new(bad).unwrap_err();
            assert_eq!(
                err,
                RuntimeError::InvalidName {
                    name: bad.to_string()
                }
            );
        }
    }

    #[test]
    fn test_equality_by_text() {
        assert_eq!(Name::new("abc").unwrap(), Name::new("abc").unwrap());
        assert_ne!(Name::new("abc").unwrap(), Name::new("abd").unwrap());
    }
}
