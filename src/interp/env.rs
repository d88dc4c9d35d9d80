//! Scope stack for the interpreter
//!
//! Frames are pushed and popped in strict LIFO order. Frame 0 is the global
//! frame; it exists for the whole run and is never popped. Lookups scan from the
//! top frame down, so inner declarations shadow outer ones.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::name::Name;
use super::value::Value;
use super::variable::Variable;
use crate::config::COUNTER_ALPHABET_LEN;
use crate::diagnostics::RuntimeError;
use crate::types::DataType;

/// Label of the global frame
pub const GLOBAL_SCOPE: &str = "global";

const FIRST_COUNTER_NAME: char = 'i';

/// Proof of a push, redeemed by the matching `pop`
#[must_use = "a pushed frame has to be popped with its handle"]
#[derive(Debug, PartialEq, Eq)]
pub struct FrameHandle {
    label: Rc<str>,
    depth: usize,
}

impl FrameHandle {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Index of the frame on the stack (the global frame is 0)
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// One level of the scope stack
#[derive(Debug)]
pub struct Frame {
    label: Rc<str>,
    vars: IndexMap<Name, Variable>,
    is_loop: bool,
    /// Loop counter owned by this frame
    counter: Option<Name>,
}

impl Frame {
    fn new(label: Rc<str>) -> Self {
        Frame {
            label,
            vars: IndexMap::new(),
            is_loop: false,
            counter: None,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Variables in declaration order
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.vars.values()
    }

    pub fn counter(&self) -> Option<&Name> {
        self.counter.as_ref()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[scope {}:", self.label)?;
        for var in self.vars.values() {
            write!(f, " {}={}", var.name(), var.get_value())?;
        }
        write!(f, "]")
    }
}

/// Hands out the reserved counter names `i`..`p` to nested counted loops.
///
/// Names are taken bottom-up as loops are entered and returned top-down as they
/// exit. Once every slot is taken, further loops run without a counter.
#[derive(Debug)]
pub struct LoopCounters {
    slots: u8,
    in_use: u8,
    /// Loops entered while every slot was taken
    overflow: usize,
}

impl LoopCounters {
    pub fn new(slots: u8) -> Self {
        LoopCounters {
            slots: slots.min(COUNTER_ALPHABET_LEN),
            in_use: 0,
            overflow: 0,
        }
    }

    /// Check if `name` belongs to the reserved counter alphabet
    pub fn is_reserved(name: &str) -> bool {
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => {
                let last = (FIRST_COUNTER_NAME as u8 + COUNTER_ALPHABET_LEN - 1) as char;
                (FIRST_COUNTER_NAME..=last).contains(&c)
            }
            _ => false,
        }
    }

    fn slot_name(slot: u8) -> Name {
        let c = (FIRST_COUNTER_NAME as u8 + slot) as char;
        match Name::new(c.to_string()) {
            Ok(name) => name,
            Err(_) => unreachable!("counter names are single letters"),
        }
    }

    /// Next free counter name, or `None` once the budget is spent
    pub fn acquire(&mut self) -> Option<Name> {
        if self.in_use < self.slots {
            let name = Self::slot_name(self.in_use);
            self.in_use += 1;
            Some(name)
        } else {
            self.overflow += 1;
            tracing::warn!(
                depth = self.in_use as usize + self.overflow,
                "DISCOURAGED BEHAVIOUR: more than {} nested loops, no counter name left",
                self.slots
            );
            None
        }
    }

    /// Return a counter name. Only the most recently acquired one may be released.
    pub fn release(&mut self, name: &Name) {
        assert!(self.in_use > 0, "released counter {} that was never acquired", name);
        let expected = Self::slot_name(self.in_use - 1);
        assert_eq!(
            name, &expected,
            "loop counters must be released in reverse order"
        );
        self.in_use -= 1;
    }

    /// Note that a loop without a counter exited
    fn release_overflow(&mut self) {
        self.overflow = self.overflow.saturating_sub(1);
    }

    pub fn in_use(&self) -> u8 {
        self.in_use
    }
}

/// The stack of variable frames for one program run
#[derive(Debug)]
pub struct ScopeStack {
    frames: Vec<Frame>,
    counters: LoopCounters,
}

impl ScopeStack {
    pub fn new(counter_slots: u8) -> Self {
        tracing::debug!("initialising {} scope", GLOBAL_SCOPE);
        ScopeStack {
            frames: vec![Frame::new(Rc::from(GLOBAL_SCOPE))],
            counters: LoopCounters::new(counter_slots),
        }
    }

    /// Number of frames, the global frame included
    pub fn height(&self) -> usize {
        self.frames.len()
    }

    fn top(&self) -> &Frame {
        match self.frames.last() {
            Some(frame) => frame,
            None => unreachable!("the global frame is never popped"),
        }
    }

    fn top_mut(&mut self) -> &mut Frame {
        match self.frames.last_mut() {
            Some(frame) => frame,
            None => unreachable!("the global frame is never popped"),
        }
    }

    pub fn top_label(&self) -> &str {
        &self.top().label
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Append an empty frame
    pub fn push(&mut self, label: impl Into<Rc<str>>) -> FrameHandle {
        let label = label.into();
        self.frames.push(Frame::new(Rc::clone(&label)));
        tracing::debug!(scope = %label, height = self.frames.len(), "registered scope");
        FrameHandle {
            label,
            depth: self.frames.len() - 1,
        }
    }

    /// Append a loop frame and declare the next free counter in it, starting at `start`.
    pub fn push_loop(&mut self, label: impl Into<Rc<str>>, start: i64) -> FrameHandle {
        let handle = self.push(label);
        self.top_mut().is_loop = true;
        if let Some(name) = self.counters.acquire() {
            let mut counter = Variable::new(name.clone(), DataType::INT);
            if counter.set_value(Value::Int(start)).is_err() {
                unreachable!("an int always casts to int");
            }
            tracing::debug!(counter = %name, scope = %handle.label, "assigned loop counter");
            let frame = self.top_mut();
            frame.vars.insert(name.clone(), counter);
            frame.counter = Some(name);
        }
        handle
    }

    /// Counter name of the frame behind `handle`, if it got one
    pub fn counter(&self, handle: &FrameHandle) -> Option<&Name> {
        self.frames
            .get(handle.depth)
            .and_then(|frame| frame.counter.as_ref())
    }

    /// Remove the top frame.
    ///
    /// # Panics
    ///
    /// Panics if `handle` does not belong to the top frame or names the global
    /// frame. Both mean the runtime itself pushed and popped out of order.
    pub fn pop(&mut self, handle: FrameHandle) {
        assert!(handle.depth > 0, "the {} scope cannot be popped", GLOBAL_SCOPE);
        let top = self.top();
        assert!(
            handle.depth == self.frames.len() - 1 && handle.label == top.label,
            "trying to delete non-top scope {} (depth {}), top scope was {} (depth {})\n{}",
            handle.label,
            handle.depth,
            top.label,
            self.frames.len() - 1,
            self
        );
        if let Some(frame) = self.frames.pop() {
            match &frame.counter {
                Some(name) => self.counters.release(name),
                None if frame.is_loop => self.counters.release_overflow(),
                None => {}
            }
            tracing::debug!(scope = %frame.label, "deleted scope");
        }
    }

    /// Declare `variable` in the top frame.
    ///
    /// Shadowing a name from an outer frame is fine; a second declaration in the
    /// same frame, or a reserved counter name, is a `DeclarationError`.
    pub fn declare(&mut self, variable: Variable) -> Result<(), RuntimeError> {
        let name = variable.name().clone();
        if LoopCounters::is_reserved(name.as_str()) {
            return Err(RuntimeError::ReservedCounterName {
                name: name.to_string(),
            });
        }
        let frame = self.top_mut();
        if frame.vars.contains_key(&name) {
            return Err(RuntimeError::Redeclaration {
                name: name.to_string(),
                scope: frame.label.to_string(),
            });
        }
        tracing::debug!(name = %name, contract = %variable.contract(), scope = %frame.label, "declared variable");
        frame.vars.insert(name, variable);
        Ok(())
    }

    /// Innermost variable called `name`
    pub fn lookup(&self, name: &str) -> Result<&Variable, RuntimeError> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.vars.get(name))
            .ok_or_else(|| RuntimeError::UnresolvedName {
                name: name.to_string(),
            })
    }

    /// Innermost variable called `name`, for assignment
    pub fn lookup_mut(&mut self, name: &str) -> Result<&mut Variable, RuntimeError> {
        self.frames
            .iter_mut()
            .rev()
            .find_map(|frame| frame.vars.get_mut(name))
            .ok_or_else(|| RuntimeError::UnresolvedName {
                name: name.to_string(),
            })
    }

    /// Check if any frame declares `name`
    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_ok()
    }

    pub fn counters(&self) -> &LoopCounters {
        &self.counters
    }
}

impl fmt::Display for ScopeStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, frame) in self.frames.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", frame)?;
        }
        Ok(())
    }
}
