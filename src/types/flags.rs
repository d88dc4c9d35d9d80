//! Declaration flags and reserved words

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Modifier flag written in front of a declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Flag {
    /// Immutable after initialization, documents intent (implies `final`)
    Const,
    /// Value may be set exactly once
    Final,
    /// Body supplied by the runtime's native table (functions only)
    Native,
}

impl Flag {
    pub const ALL: [Flag; 3] = [Flag::Const, Flag::Final, Flag::Native];

    pub fn keyword(self) -> &'static str {
        match self {
            Flag::Const => "const",
            Flag::Final => "final",
            Flag::Native => "native",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A word that is not a known flag
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown flag `{0}`")]
pub struct UnknownFlag(pub String);

impl FromStr for Flag {
    type Err = UnknownFlag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Flag::ALL
            .into_iter()
            .find(|f| f.keyword() == s)
            .ok_or_else(|| UnknownFlag(s.to_string()))
    }
}

impl TryFrom<String> for Flag {
    type Error = UnknownFlag;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Flag> for String {
    fn from(flag: Flag) -> Self {
        flag.keyword().to_string()
    }
}

/// Statement and operator keywords of the language
pub const KEYWORDS: &[&str] = &[
    "if", "else", "repeat", "while", "until", "for", "from", "to", "func", "return", "break",
    "continue", "main", "true", "false", "null", "and", "or", "not", "xor", "in", "is",
];

/// `main` is a keyword that is still a legal function name
pub const MAIN: &str = "main";

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

pub fn is_flag_keyword(word: &str) -> bool {
    word.parse::<Flag>().is_ok()
}
