//! Runtime diagnostics
//!
//! Every error a script can provoke is a `RuntimeError`. They are reported to the
//! user through miette; none of them are retried. Defects in the runtime itself
//! (unbalanced frame pops and the like) are panics and never show up here.

use miette::Diagnostic;
use thiserror::Error;

use crate::types::DataType;

/// A value could not be converted to a requested data type
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum CastError {
    #[error("a {from} cannot be cast to {to}")]
    #[diagnostic(code(runtime::cast::unsupported))]
    Unsupported { from: DataType, to: DataType },

    #[error("{value} cannot be cast to {to} without loss")]
    #[diagnostic(
        code(runtime::cast::lossy),
        help("round the value explicitly before narrowing it")
    )]
    Lossy { value: String, to: DataType },

    #[error("\"{text}\" is not a valid {to}")]
    #[diagnostic(code(runtime::cast::unparsable))]
    Unparsable { text: String, to: DataType },

    #[error("element {index} of the {from} cannot be cast to {to}")]
    #[diagnostic(code(runtime::cast::element))]
    Element {
        index: usize,
        from: DataType,
        to: DataType,
        #[source]
        cause: Box<CastError>,
    },
}

/// Error categories a script can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Casting,
    Declaration,
    UnexpectedFlag,
    IllegalCall,
    IllegalReturn,
    IllegalCodeFormat,
    UnresolvedName,
    CallDepth,
}

/// Runtime diagnostic
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum RuntimeError {
    // === Casting ===
    #[error(transparent)]
    #[diagnostic(transparent)]
    Casting(#[from] CastError),

    // === Declaration ===
    #[error("`{name}` is not a valid name")]
    #[diagnostic(
        code(runtime::declaration::invalid_name),
        help("names contain at least one letter and may not be a keyword, type or flag")
    )]
    InvalidName { name: String },

    #[error("`{name}` is already declared in scope {scope}")]
    #[diagnostic(code(runtime::declaration::redeclared))]
    Redeclaration { name: String, scope: String },

    #[error("`{name}` is reserved for loop counters and cannot be declared manually")]
    #[diagnostic(
        code(runtime::declaration::counter_name),
        help("the names i, j, k, l, m, n, o and p belong to counted loops")
    )]
    ReservedCounterName { name: String },

    #[error("trying to modify the {} `{name}`", modifier_word(.constant))]
    #[diagnostic(code(runtime::declaration::immutable))]
    FinalReassignment { name: String, constant: bool },

    #[error("passed a value of the wrong kind to `{function}` for parameter `{param}`")]
    #[diagnostic(code(runtime::declaration::argument))]
    WrongArgumentKind {
        function: String,
        param: String,
        #[source]
        cause: CastError,
    },

    #[error("`{flag}` is not a valid flag for {target}")]
    #[diagnostic(code(runtime::unexpected_flag))]
    UnexpectedFlag { flag: String, target: String },

    // === Calls ===
    #[error("`{function}` expects {expected} argument(s) but was called with {found}")]
    #[diagnostic(code(runtime::call::arity))]
    IllegalCall {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("`{name}` does not refer to a function")]
    #[diagnostic(code(runtime::call::not_callable))]
    NotCallable { name: String },

    #[error("`{function}` was defined to return a value of type {expected}, but returned nothing")]
    #[diagnostic(code(runtime::call::missing_return))]
    IllegalReturn { function: String, expected: DataType },

    #[error("`{function}` returned a value but does not specify a return type")]
    #[diagnostic(
        code(runtime::format::return_type),
        help("declare the return type with `-> <type>`")
    )]
    MissingReturnType { function: String },

    #[error("`{function}` specifies the return type {declared} but had no return value")]
    #[diagnostic(code(runtime::format::return_value))]
    MissingReturnValue { function: String, declared: DataType },

    #[error("calling `{function}` exceeds the maximum call depth of {limit}")]
    #[diagnostic(
        code(runtime::call::depth),
        help("check for unbounded recursion or raise `max_call_depth`")
    )]
    CallDepth { function: String, limit: usize },

    #[error("`{function}` is declared with {declared} parameter(s) but the native takes {expected}")]
    #[diagnostic(
        code(runtime::format::native_signature),
        help("a native declaration must list the same parameters as the native itself")
    )]
    NativeSignature {
        function: String,
        expected: usize,
        declared: usize,
    },

    #[error("`{keyword}` used outside of a loop")]
    #[diagnostic(code(runtime::format::stray_control))]
    StrayControl { keyword: &'static str },

    // === Lookup ===
    #[error("`{name}` does not exist")]
    #[diagnostic(
        code(runtime::unresolved_name),
        help("did you mean to declare this variable first?")
    )]
    UnresolvedName { name: String },

    #[error("line {line}: {error}")]
    #[diagnostic(code(runtime::located))]
    Located { line: u32, error: Box<RuntimeError> },
}

fn modifier_word(constant: &bool) -> &'static str {
    if *constant { "constant" } else { "final variable" }
}

impl RuntimeError {
    /// Category of this error, seen through any line information
    pub fn kind(&self) -> ErrorKind {
        match self {
            RuntimeError::Casting(_) => ErrorKind::Casting,
            RuntimeError::InvalidName { .. }
            | RuntimeError::Redeclaration { .. }
            | RuntimeError::ReservedCounterName { .. }
            | RuntimeError::FinalReassignment { .. }
            | RuntimeError::WrongArgumentKind { .. } => ErrorKind::Declaration,
            RuntimeError::UnexpectedFlag { .. } => ErrorKind::UnexpectedFlag,
            RuntimeError::IllegalCall { .. } | RuntimeError::NotCallable { .. } => {
                ErrorKind::IllegalCall
            }
            RuntimeError::IllegalReturn { .. } => ErrorKind::IllegalReturn,
            RuntimeError::MissingReturnType { .. }
            | RuntimeError::MissingReturnValue { .. }
            | RuntimeError::NativeSignature { .. }
            | RuntimeError::StrayControl { .. } => ErrorKind::IllegalCodeFormat,
            RuntimeError::CallDepth { .. } => ErrorKind::CallDepth,
            RuntimeError::UnresolvedName { .. } => ErrorKind::UnresolvedName,
            RuntimeError::Located { error, .. } => error.kind(),
        }
    }

    /// Attach the originating source line. The innermost line wins.
    pub fn at_line(self, line: u32) -> Self {
        match self {
            RuntimeError::Located { .. } => self,
            error => RuntimeError::Located {
                line,
                error: Box::new(error),
            },
        }
    }

    /// Source line, if one was attached
    pub fn line(&self) -> Option<u32> {
        match self {
            RuntimeError::Located { line, .. } => Some(*line),
            _ => None,
        }
    }

    /// The error without line information
    pub fn inner(&self) -> &RuntimeError {
        match self {
            RuntimeError::Located { error, .. } => error,
            error => error,
        }
    }
}
