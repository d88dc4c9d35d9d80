//! Execution core
//!
//! Values and their cast contract, the scope stack, typed variables, and the
//! invocation engine, plus a tree-walking statement executor over HIR.

pub mod call;
pub mod cast;
pub mod env;
pub mod eval;
pub mod name;
pub mod natives;
pub mod runtime;
pub mod stack;
pub mod value;
pub mod variable;

pub use call::{BodyId, Executor, FunctionBody, FunctionDescriptor, Param, ValueHolder};
pub use env::{FrameHandle, GLOBAL_SCOPE, ScopeStack};
pub use eval::Interpreter;
pub use name::Name;
pub use natives::{NativeFn, NativeTable, Output};
pub use runtime::Runtime;
pub use stack::ensure_sufficient_stack;
pub use value::Value;
pub use variable::{Modifiers, Variable};
