//! Ember scripting language runtime
//!
//! The execution core of a small imperative scripting language:
//! - Dynamically tagged values with a fixed cast contract between kinds
//! - A LIFO stack of variable frames with shadowing and reserved loop counters
//! - Typed variables with `final` and `const` modifiers
//! - Function invocation with arity checks, parameter binding and return contracts
//!
//! # Architecture
//!
//! ```text
//! JSON → HIR → Interpreter ⇄ Runtime (scopes, natives, call engine)
//! ```
//!
//! # Example
//!
//! ```
//! use ember::{Hir, RuntimeConfig};
//!
//! let hir = Hir::from_json(r#"{ "main": [{ "stmt": "return", "value": {
//!     "expr": "binary", "op": "div",
//!     "left": { "expr": "literal", "value": { "int": 7 } },
//!     "right": { "expr": "literal", "value": { "int": 2 } }
//! }}]}"#).unwrap();
//! let outcome = ember::run(&hir, RuntimeConfig::quiet()).unwrap();
//! assert_eq!(outcome.value.unwrap().to_string(), "3.5");
//! ```

pub mod config;
pub mod diagnostics;
pub mod hir;
pub mod interp;
pub mod types;

// Re-export diagnostics for convenience
pub use diagnostics::{CastError, ErrorKind, RuntimeError};

// Re-exports for convenience
pub use config::RuntimeConfig;
pub use hir::Hir;
pub use interp::{Interpreter, NativeTable, Runtime, Value};
pub use types::DataType;

/// Runtime version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result of a program run
#[derive(Debug)]
pub struct Outcome {
    /// What `main` returned
    pub value: Option<Value>,
    /// Lines written by `print`
    pub output: Vec<String>,
}

/// Run a program with the standard natives
pub fn run(hir: &Hir, config: RuntimeConfig) -> Result<Outcome, RuntimeError> {
    run_with_natives(hir, config, NativeTable::standard())
}

/// Run a program against a custom native table
pub fn run_with_natives(
    hir: &Hir,
    config: RuntimeConfig,
    natives: NativeTable,
) -> Result<Outcome, RuntimeError> {
    let mut runtime = Runtime::with_natives(config, natives);
    let mut interpreter = Interpreter::new(hir, runtime.natives())?;
    let value = interpreter.interpret(&mut runtime)?;
    Ok(Outcome {
        value,
        output: runtime.take_output(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_empty_program() {
        let outcome = run(&Hir::default(), RuntimeConfig::quiet()).unwrap();
        assert!(outcome.value.is_none());
        assert!(outcome.output.is_empty());
    }
}
