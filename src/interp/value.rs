//! Runtime values for the interpreter

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::cast::integral;
use super::name::Name;
use crate::types::{DataType, ScalarType};

/// Runtime value.
///
/// Values are immutable; compound payloads are shared behind `Rc` so cloning a
/// value never copies its contents.
#[derive(Debug, Clone)]
pub enum Value {
    /// Absent value, what an uninitialized variable reads as
    Null,
    Bool(bool),
    /// Real number; `NaN` stands in for "not a number"
    Number(f64),
    Int(i64),
    Text(Rc<str>),
    Char(char),
    /// Reference to a function by name
    Def(Name),
    Object(Rc<ObjectValue>),
    Array(ArrayValue),
}

/// Homogeneous array payload
#[derive(Debug, Clone)]
pub struct ArrayValue {
    elem: ScalarType,
    items: Rc<[Value]>,
}

impl ArrayValue {
    /// Build an array of `elem` kind. Callers guarantee every item already has
    /// that kind (or `elem` is dynamic).
    pub fn new(elem: ScalarType, items: Vec<Value>) -> Self {
        debug_assert!(
            elem == ScalarType::Dynamic
                || items.iter().all(|v| v.data_type() == DataType::Scalar(elem)
                    || matches!(v, Value::Null)),
            "array of {} built from mixed items",
            elem.keyword()
        );
        ArrayValue {
            elem,
            items: items.into(),
        }
    }

    pub fn elem(&self) -> ScalarType {
        self.elem
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Object payload: a class name and its fields in declaration order
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectValue {
    pub class: Name,
    pub fields: IndexMap<Name, Value>,
}

impl Value {
    pub fn text(text: impl Into<Rc<str>>) -> Self {
        Value::Text(text.into())
    }

    pub fn array(elem: ScalarType, items: Vec<Value>) -> Self {
        Value::Array(ArrayValue::new(elem, items))
    }

    pub fn object(class: Name, fields: IndexMap<Name, Value>) -> Self {
        Value::Object(Rc::new(ObjectValue { class, fields }))
    }

    /// One element per character of `text`
    pub(crate) fn chars_of(text: &str, elem: ScalarType) -> Self {
        Value::array(elem, text.chars().map(Value::Char).collect())
    }

    /// The data type of this value. `null` is the absent object.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null | Value::Object(_) => DataType::OBJECT,
            Value::Bool(_) => DataType::BOOL,
            Value::Number(_) => DataType::NUMBER,
            Value::Int(_) => DataType::INT,
            Value::Text(_) => DataType::TEXT,
            Value::Char(_) => DataType::CHAR,
            Value::Def(_) => DataType::DEF,
            Value::Array(arr) => DataType::array_of(arr.elem),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Render a number the way scripts print it
pub(crate) fn render_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        format!("{}", n)
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, v) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", v)?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", render_number(*n)),
            Value::Int(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
            Value::Char(c) => write!(f, "{}", c),
            Value::Def(name) => write!(f, "<def {}>", name),
            Value::Object(obj) => {
                write!(f, "{} {{ ", obj.class)?;
                for (i, (k, v)) in obj.fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, " }}")
            }
            Value::Array(arr) => {
                write!(f, "[")?;
                write_joined(f, arr.items())?;
                write!(f, "]")
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Int(a), Value::Number(b)) | (Value::Number(b), Value::Int(a)) => {
                integral(*b) == Some(*a)
            }
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Def(a), Value::Def(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a.items() == b.items(),
            _ => false,
        }
    }
}

/// Exact ordering of an int against a number
fn cmp_int_number(a: i64, b: f64) -> Option<Ordering> {
    if let Some(b) = integral(b) {
        return Some(a.cmp(&b));
    }
    // `a` rounds onto `b` only when `b` is integral but outside the int range
    match (a as f64).partial_cmp(&b)? {
        Ordering::Equal if b > 0.0 => Some(Ordering::Less),
        Ordering::Equal => Some(Ordering::Greater),
        ord => Some(ord),
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
            (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Number(b)) => cmp_int_number(*a, *b),
            (Value::Number(a), Value::Int(b)) => cmp_int_number(*b, *a).map(Ordering::reverse),
            (Value::Text(a), Value::Text(b)) => a.partial_cmp(b),
            (Value::Char(a), Value::Char(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Control flow signal (not an error, just flow control)
#[derive(Debug, Clone)]
pub enum ControlFlow {
    /// Return from function with an optional value
    Return(Option<Value>),
    /// Leave the innermost loop
    Break,
    /// Continue with the next iteration
    Continue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_types() {
        assert_eq!(Value::Int(1).data_type(), DataType::INT);
        assert_eq!(Value::Null.data_type(), DataType::OBJECT);
        assert_eq!(
            Value::array(ScalarType::Bool, vec![Value::Bool(true)]).data_type(),
            DataType::Array(ScalarType::Bool)
        );
    }

    #[test]
    fn test_rendering() {
        assert_eq!(Value::Number(5.0).to_string(), "5");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Number(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::Number(f64::NEG_INFINITY).to_string(), "-Infinity");
        let arr = Value::array(ScalarType::Int, vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(arr.to_string(), "[1, 2]");
    }

    #[test]
    fn test_value_wise_equality() {
        assert_eq!(Value::Int(5), Value::Number(5.0));
        assert_ne!(Value::Int(5), Value::Number(5.5));
        assert_eq!(Value::text("ab"), Value::text(String::from("ab")));
        assert_ne!(Value::Number(f64::NAN), Value::Number(f64::NAN));
        assert_ne!(Value::Null, Value::Int(0));
    }

    #[test]
    fn test_int_number_equality_is_exact() {
        let two_63 = 9_223_372_036_854_775_808.0;
        assert_ne!(Value::Int(i64::MAX), Value::Number(two_63));
        assert_ne!(Value::Number(two_63), Value::Int(i64::MAX));
        assert_eq!(Value::Int(i64::MIN), Value::Number(-two_63));
        assert!(Value::Int(i64::MAX) < Value::Number(two_63));
        assert!(Value::Number(two_63) > Value::Int(i64::MAX));
        assert!(Value::Int(i64::MIN) > Value::Number(-two_63 * 2.0));
    }

    #[test]
    fn test_ordering() {
        assert!(Value::Int(2) < Value::Number(2.5));
        assert!(Value::text("abc") < Value::text("abd"));
        assert_eq!(Value::Bool(true).partial_cmp(&Value::Int(1)), None);
    }
}
