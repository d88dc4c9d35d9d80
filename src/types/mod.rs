//! Type system for the Ember language
//!
//! This module holds the closed set of runtime kinds the language recognizes:
//! - Scalar kinds and one array kind per scalar
//! - Modifier flags for declarations
//! - The reserved words a `Name` may never collide with

pub mod core;
pub mod flags;

pub use self::core::*;
pub use flags::*;
