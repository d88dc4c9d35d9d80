//! Execution context shared by every call of one program run

use super::env::ScopeStack;
use super::natives::{NativeTable, Output};
use crate::config::RuntimeConfig;

/// Mutable state of one run: the scope stack, natives, call depth and output.
///
/// Invocations and the statement executor thread this through explicitly.
#[derive(Debug)]
pub struct Runtime {
    pub(crate) scopes: ScopeStack,
    pub(crate) natives: NativeTable,
    pub(crate) config: RuntimeConfig,
    pub(crate) call_depth: usize,
    pub(crate) output: Output,
}

impl Runtime {
    /// Runtime with the standard natives
    pub fn new(config: RuntimeConfig) -> Self {
        Self::with_natives(config, NativeTable::standard())
    }

    /// Runtime with a custom native table. The table cannot change afterwards.
    pub fn with_natives(config: RuntimeConfig, natives: NativeTable) -> Self {
        Runtime {
            scopes: ScopeStack::new(config.loop_counter_slots),
            output: Output::new(config.echo_output),
            natives,
            config,
            call_depth: 0,
        }
    }

    pub fn scopes(&self) -> &ScopeStack {
        &self.scopes
    }

    pub fn scopes_mut(&mut self) -> &mut ScopeStack {
        &mut self.scopes
    }

    pub fn natives(&self) -> &NativeTable {
        &self.natives
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Number of invocations currently in progress
    pub fn call_depth(&self) -> usize {
        self.call_depth
    }

    pub fn output(&self) -> &[String] {
        self.output.lines()
    }

    pub fn take_output(&mut self) -> Vec<String> {
        self.output.take()
    }
}
