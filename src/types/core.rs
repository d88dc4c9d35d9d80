//! Core type definitions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Scalar value kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScalarType {
    /// Untyped: every value is assignable to it
    Dynamic,
    Bool,
    /// Arbitrary real number (NaN is the "not-a-number" sentinel)
    Number,
    /// Integral number
    Int,
    Text,
    Char,
    /// Reference to a function
    Def,
    Object,
}

impl ScalarType {
    /// All scalar kinds, in declaration order
    pub const ALL: [ScalarType; 8] = [
        ScalarType::Dynamic,
        ScalarType::Bool,
        ScalarType::Number,
        ScalarType::Int,
        ScalarType::Text,
        ScalarType::Char,
        ScalarType::Def,
        ScalarType::Object,
    ];

    /// Source keyword for this kind
    pub fn keyword(self) -> &'static str {
        match self {
            ScalarType::Dynamic => "var",
            ScalarType::Bool => "bool",
            ScalarType::Number => "number",
            ScalarType::Int => "int",
            ScalarType::Text => "text",
            ScalarType::Char => "char",
            ScalarType::Def => "def",
            ScalarType::Object => "obj",
        }
    }

    fn from_keyword(word: &str) -> Option<Self> {
        ScalarType::ALL.into_iter().find(|t| t.keyword() == word)
    }
}

/// Runtime data type: a scalar kind or a homogeneous array of one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DataType {
    Scalar(ScalarType),
    Array(ScalarType),
}

impl DataType {
    pub const DYNAMIC: DataType = DataType::Scalar(ScalarType::Dynamic);
    pub const BOOL: DataType = DataType::Scalar(ScalarType::Bool);
    pub const NUMBER: DataType = DataType::Scalar(ScalarType::Number);
    pub const INT: DataType = DataType::Scalar(ScalarType::Int);
    pub const TEXT: DataType = DataType::Scalar(ScalarType::Text);
    pub const CHAR: DataType = DataType::Scalar(ScalarType::Char);
    pub const DEF: DataType = DataType::Scalar(ScalarType::Def);
    pub const OBJECT: DataType = DataType::Scalar(ScalarType::Object);

    /// Every data type the language knows: all scalars, then all arrays
    pub fn all() -> impl Iterator<Item = DataType> {
        ScalarType::ALL
            .into_iter()
            .map(DataType::Scalar)
            .chain(ScalarType::ALL.into_iter().map(DataType::Array))
    }

    /// The array type whose elements are of this scalar kind
    pub fn array_of(elem: ScalarType) -> Self {
        DataType::Array(elem)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Scalar(s) => write!(f, "{}", s.keyword()),
            DataType::Array(s) => write!(f, "{}[]", s.keyword()),
        }
    }
}

/// Error for a type keyword that names no data type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown type `{0}`")]
pub struct UnknownType(pub String);

impl FromStr for DataType {
    type Err = UnknownType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = match s.strip_suffix("[]") {
            Some(elem) => ScalarType::from_keyword(elem).map(DataType::Array),
            None => ScalarType::from_keyword(s).map(DataType::Scalar),
        };
        parsed.ok_or_else(|| UnknownType(s.to_string()))
    }
}

impl TryFrom<String> for DataType {
    type Error = UnknownType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DataType> for String {
    fn from(ty: DataType) -> Self {
        ty.to_string()
    }
}

/// Check if `word` is spelled like a type keyword
pub fn is_type_keyword(word: &str) -> bool {
    word.parse::<DataType>().is_ok()
}
