//! Typed storage cells

use super::name::Name;
use super::value::Value;
use crate::diagnostics::RuntimeError;
use crate::types::{DataType, Flag};

/// Immutability modifiers of a variable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub is_final: bool,
    pub is_constant: bool,
}

impl Modifiers {
    /// Collect modifiers from declaration flags. Only `const` and `final`
    /// apply to variables.
    pub fn from_flags(name: &Name, flags: &[Flag]) -> Result<Self, RuntimeError> {
        let mut modifiers = Modifiers::default();
        for flag in flags {
            match flag {
                Flag::Const => {
                    modifiers.is_constant = true;
                    modifiers.is_final = true;
                }
                Flag::Final => modifiers.is_final = true,
                other => {
                    return Err(RuntimeError::UnexpectedFlag {
                        flag: other.to_string(),
                        target: format!("the variable `{}`", name),
                    });
                }
            }
        }
        Ok(modifiers)
    }
}

/// A named cell holding values of one contract type.
///
/// Stored values are always cast to the contract type first. A `final`
/// variable accepts one non-null assignment.
#[derive(Debug, Clone)]
pub struct Variable {
    name: Name,
    contract: DataType,
    value: Option<Value>,
    modifiers: Modifiers,
}

impl Variable {
    /// Uninitialized, mutable variable
    pub fn new(name: Name, contract: DataType) -> Self {
        Variable {
            name,
            contract,
            value: None,
            modifiers: Modifiers::default(),
        }
    }

    /// Variable carrying the given declaration flags
    pub fn with_flags(name: Name, contract: DataType, flags: &[Flag]) -> Result<Self, RuntimeError> {
        let modifiers = Modifiers::from_flags(&name, flags)?;
        Ok(Variable {
            modifiers,
            ..Variable::new(name, contract)
        })
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    /// The declared type every stored value is cast to
    pub fn contract(&self) -> DataType {
        self.contract
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn is_final(&self) -> bool {
        self.modifiers.is_final
    }

    pub fn is_constant(&self) -> bool {
        self.modifiers.is_constant
    }

    /// Whether a non-null value was ever stored
    pub fn is_initialized(&self) -> bool {
        self.value.as_ref().is_some_and(|v| !v.is_null())
    }

    /// Current value; `null` until something was assigned
    pub fn get_value(&self) -> Value {
        self.value.clone().unwrap_or(Value::Null)
    }

    /// Cast `value` to the contract type and store it
    pub fn set_value(&mut self, value: Value) -> Result<(), RuntimeError> {
        let value = value.cast_to(self.contract)?;
        if self.modifiers.is_final && self.is_initialized() {
            return Err(RuntimeError::FinalReassignment {
                name: self.name.to_string(),
                constant: self.modifiers.is_constant,
            });
        }
        tracing::trace!(name = %self.name, contract = %self.contract, value = %value, "assign");
        self.value = Some(value);
        Ok(())
    }
}
