//! The cast contract between value kinds
//!
//! Every target type has one dispatch function that matches over all value
//! kinds. Kinds without a meaningful conversion fall through to the default
//! behaviour of that target:
//!
//! | target              | default                                   |
//! |---------------------|-------------------------------------------|
//! | `var`               | identity                                  |
//! | `number`            | `NaN`                                     |
//! | `text`              | the value's rendering                     |
//! | `char[]`, `var[]`   | one `char` per character of the rendering |
//! | everything else     | `CastError::Unsupported`                  |
//!
//! `can_cast_to` answers through the same dispatch functions, so it agrees
//! with `cast_to` for every value and target.

use std::rc::Rc;

use super::name::Name;
use super::value::{ArrayValue, Value, render_number};
use crate::diagnostics::CastError;
use crate::types::{DataType, ScalarType};

// 2^63, the first f64 above the i64 range
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

impl Value {
    /// Check if this value converts to `target`
    pub fn can_cast_to(&self, target: DataType) -> bool {
        match target {
            DataType::Scalar(ScalarType::Dynamic)
            | DataType::Scalar(ScalarType::Number)
            | DataType::Scalar(ScalarType::Text) => true,
            DataType::Scalar(ScalarType::Bool) => self.cast_bool().is_ok(),
            DataType::Scalar(ScalarType::Int) => self.cast_int().is_ok(),
            DataType::Scalar(ScalarType::Char) => self.cast_char().is_ok(),
            DataType::Scalar(ScalarType::Def) => self.cast_def().is_ok(),
            DataType::Scalar(ScalarType::Object) => self.cast_object().is_ok(),
            DataType::Array(elem) => match self {
                Value::Array(arr) => arr
                    .items()
                    .iter()
                    .all(|v| v.can_cast_to(DataType::Scalar(elem))),
                _ => decomposes_into(elem),
            },
        }
    }

    /// Convert this value to `target`
    pub fn cast_to(&self, target: DataType) -> Result<Value, CastError> {
        match target {
            DataType::Scalar(ScalarType::Dynamic) => Ok(self.clone()),
            DataType::Scalar(ScalarType::Bool) => self.cast_bool().map(Value::Bool),
            DataType::Scalar(ScalarType::Number) => Ok(Value::Number(self.cast_number())),
            DataType::Scalar(ScalarType::Int) => self.cast_int().map(Value::Int),
            DataType::Scalar(ScalarType::Text) => Ok(Value::Text(self.cast_text())),
            DataType::Scalar(ScalarType::Char) => self.cast_char().map(Value::Char),
            DataType::Scalar(ScalarType::Def) => self.cast_def().map(Value::Def),
            DataType::Scalar(ScalarType::Object) => self.cast_object(),
            DataType::Array(elem) => self.cast_array(elem),
        }
    }

    fn unsupported(&self, to: DataType) -> CastError {
        CastError::Unsupported {
            from: self.data_type(),
            to,
        }
    }

    pub(crate) fn cast_bool(&self) -> Result<bool, CastError> {
        let lossy = || CastError::Lossy {
            value: self.to_string(),
            to: DataType::BOOL,
        };
        match self {
            Value::Bool(b) => Ok(*b),
            Value::Int(0) => Ok(false),
            Value::Int(1) => Ok(true),
            Value::Int(_) => Err(lossy()),
            Value::Number(n) if *n == 0.0 => Ok(false),
            Value::Number(n) if *n == 1.0 => Ok(true),
            Value::Number(_) => Err(lossy()),
            Value::Text(t) => match &**t {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(CastError::Unparsable {
                    text: t.to_string(),
                    to: DataType::BOOL,
                }),
            },
            _ => Err(self.unsupported(DataType::BOOL)),
        }
    }

    /// Never fails: whatever has no numeric reading becomes `NaN`
    pub(crate) fn cast_number(&self) -> f64 {
        match self {
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::Int(n) => *n as f64,
            Value::Text(t) => t.trim().parse().unwrap_or(f64::NAN),
            Value::Char(c) => c.to_digit(10).map_or(f64::NAN, f64::from),
            _ => f64::NAN,
        }
    }

    pub(crate) fn cast_int(&self) -> Result<i64, CastError> {
        match self {
            Value::Bool(b) => Ok(i64::from(*b)),
            Value::Int(n) => Ok(*n),
            Value::Number(n) => integral(*n).ok_or_else(|| CastError::Lossy {
                value: render_number(*n),
                to: DataType::INT,
            }),
            Value::Text(t) => t.trim().parse().map_err(|_| CastError::Unparsable {
                text: t.to_string(),
                to: DataType::INT,
            }),
            Value::Char(c) => c
                .to_digit(10)
                .map(i64::from)
                .ok_or_else(|| CastError::Unparsable {
                    text: c.to_string(),
                    to: DataType::INT,
                }),
            _ => Err(self.unsupported(DataType::INT)),
        }
    }

    /// Never fails: every kind has a rendering
    pub(crate) fn cast_text(&self) -> Rc<str> {
        match self {
            Value::Text(t) => Rc::clone(t),
            Value::Array(arr) if arr.elem() == ScalarType::Char => arr
                .items()
                .iter()
                .map(|v| v.to_string())
                .collect::<String>()
                .into(),
            _ => self.to_string().into(),
        }
    }

    fn cast_char(&self) -> Result<char, CastError> {
        let digit = |n: i64| {
            u32::try_from(n)
                .ok()
                .and_then(|d| char::from_digit(d, 10))
                .ok_or_else(|| CastError::Lossy {
                    value: n.to_string(),
                    to: DataType::CHAR,
                })
        };
        match self {
            Value::Char(c) => Ok(*c),
            Value::Int(n) => digit(*n),
            Value::Number(n) => match integral(*n) {
                Some(i) => digit(i),
                None => Err(CastError::Lossy {
                    value: render_number(*n),
                    to: DataType::CHAR,
                }),
            },
            Value::Text(t) => {
                let mut chars = t.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(c),
                    _ => Err(CastError::Unparsable {
                        text: t.to_string(),
                        to: DataType::CHAR,
                    }),
                }
            }
            _ => Err(self.unsupported(DataType::CHAR)),
        }
    }

    fn cast_def(&self) -> Result<Name, CastError> {
        match self {
            Value::Def(name) => Ok(name.clone()),
            _ => Err(self.unsupported(DataType::DEF)),
        }
    }

    fn cast_object(&self) -> Result<Value, CastError> {
        match self {
            Value::Null | Value::Object(_) => Ok(self.clone()),
            _ => Err(self.unsupported(DataType::OBJECT)),
        }
    }

    fn cast_array(&self, elem: ScalarType) -> Result<Value, CastError> {
        let target = DataType::Scalar(elem);
        match self {
            Value::Array(arr) => {
                let mut items = Vec::with_capacity(arr.len());
                for (index, item) in arr.items().iter().enumerate() {
                    let cast = item.cast_to(target).map_err(|cause| CastError::Element {
                        index,
                        from: self.data_type(),
                        to: DataType::array_of(elem),
                        cause: Box::new(cause),
                    })?;
                    items.push(cast);
                }
                Ok(Value::Array(ArrayValue::new(elem, items)))
            }
            _ if decomposes_into(elem) => Ok(Value::chars_of(&self.cast_text(), elem)),
            _ => Err(self.unsupported(DataType::array_of(elem))),
        }
    }
}

/// Scalars cast to these array kinds by splitting their rendering into chars
fn decomposes_into(elem: ScalarType) -> bool {
    matches!(elem, ScalarType::Char | ScalarType::Dynamic)
}

/// `n` as an integer, if that loses nothing
pub(crate) fn integral(n: f64) -> Option<i64> {
    (n.is_finite() && n.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(&n)).then(|| n as i64)
}
