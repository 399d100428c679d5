//! Activation records.

use std::collections::HashMap;
use std::sync::Arc;

use lingo_common::{Datum, Handler, Instruction, Script, ScriptLibrary};

use crate::resolver::HandlerLocation;

/// Local slots a handler can address. Local counts are 16-bit in compiled
/// scripts.
pub const MAX_LOCAL_SLOTS: usize = 1 << 16;

/// One handler invocation: operand stack, variable slots, cursor and return
/// slot. Created when the call starts, dropped when it returns or raises.
#[derive(Debug)]
pub struct Scope {
    location: HandlerLocation,
    /// Argument snapshot. When the call has a receiver it is slot 0.
    args: Vec<Datum>,
    /// Arguments overwritten by SET_PARAM.
    params: HashMap<usize, Datum>,
    locals: Vec<Datum>,
    stack: Vec<Datum>,
    receiver: Datum,
    bytecode_index: usize,
    returned: bool,
    return_value: Datum,
    /// Re-entry indices for `repeat` loops, innermost last.
    loop_returns: Vec<usize>,
    /// Targets of enclosing `tell` blocks, innermost last.
    tell_targets: Vec<Datum>,
}

impl Scope {
    pub fn new(location: HandlerLocation, args: Vec<Datum>, receiver: Datum) -> Self {
        let local_count = location.handler().local_count;
        Self {
            location,
            args,
            params: HashMap::new(),
            locals: vec![Datum::Void; local_count],
            stack: Vec::new(),
            receiver,
            bytecode_index: 0,
            returned: false,
            return_value: Datum::Void,
            loop_returns: Vec::new(),
            tell_targets: Vec::new(),
        }
    }

    pub fn location(&self) -> &HandlerLocation {
        &self.location
    }

    pub fn script(&self) -> &Arc<Script> {
        self.location.script()
    }

    pub fn library(&self) -> &Arc<ScriptLibrary> {
        self.location.library()
    }

    pub fn handler(&self) -> &Handler {
        self.location.handler()
    }

    pub fn args(&self) -> &[Datum] {
        &self.args
    }

    pub fn receiver(&self) -> &Datum {
        &self.receiver
    }

    // ---- Cursor ----

    pub fn bytecode_index(&self) -> usize {
        self.bytecode_index
    }

    pub fn set_bytecode_index(&mut self, index: usize) {
        self.bytecode_index = index;
    }

    pub fn advance(&mut self) {
        self.bytecode_index += 1;
    }

    pub fn has_more_instructions(&self) -> bool {
        self.bytecode_index < self.handler().instructions.len()
    }

    pub fn current_instruction(&self) -> Option<Instruction> {
        self.handler().instructions.get(self.bytecode_index).copied()
    }

    // ---- Operand stack ----

    pub fn push(&mut self, value: Datum) {
        self.stack.push(value);
    }

    /// Pop the top value; an empty stack yields void.
    pub fn pop(&mut self) -> Datum {
        self.stack.pop().unwrap_or_default()
    }

    /// Pop up to `n` values, returned in push order. Never takes more than
    /// the stack holds.
    pub fn pop_many(&mut self, n: usize) -> Vec<Datum> {
        let keep = self.stack.len().saturating_sub(n);
        self.stack.split_off(keep)
    }

    /// Drop up to `n` values from the top.
    pub fn discard(&mut self, n: usize) {
        let keep = self.stack.len().saturating_sub(n);
        self.stack.truncate(keep);
    }

    /// Value `depth` slots below the top (0 is the top), or void.
    pub fn peek(&self, depth: usize) -> Datum {
        self.stack
            .len()
            .checked_sub(depth + 1)
            .and_then(|i| self.stack.get(i))
            .cloned()
            .unwrap_or_default()
    }

    /// Exchange the top two values. No-op with fewer than two.
    pub fn swap(&mut self) {
        let n = self.stack.len();
        if n >= 2 {
            self.stack.swap(n - 1, n - 2);
        }
    }

    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    /// Up to `n` values from the top down.
    pub fn top_values(&self, n: usize) -> Vec<Datum> {
        self.stack.iter().rev().take(n).cloned().collect()
    }

    // ---- Variables ----

    pub fn param(&self, index: usize) -> Datum {
        if let Some(v) = self.params.get(&index) {
            return v.clone();
        }
        self.args.get(index).cloned().unwrap_or_default()
    }

    pub fn set_param(&mut self, index: usize, value: Datum) {
        self.params.insert(index, value);
    }

    pub fn local(&self, index: usize) -> Datum {
        self.locals.get(index).cloned().unwrap_or_default()
    }

    /// Store a local. Slots beyond the declared count are created on demand,
    /// up to [`MAX_LOCAL_SLOTS`]; writes past that are dropped.
    pub fn set_local(&mut self, index: usize, value: Datum) {
        if index >= MAX_LOCAL_SLOTS {
            return;
        }
        if index >= self.locals.len() {
            self.locals.resize(index + 1, Datum::Void);
        }
        self.locals[index] = value;
    }

    // ---- Return ----

    pub fn is_returned(&self) -> bool {
        self.returned
    }

    pub fn set_returned(&mut self, returned: bool) {
        self.returned = returned;
    }

    pub fn return_value(&self) -> &Datum {
        &self.return_value
    }

    /// Store the result and finish the call.
    pub fn set_return_value(&mut self, value: Datum) {
        self.return_value = value;
        self.returned = true;
    }

    pub fn take_return_value(&mut self) -> Datum {
        std::mem::take(&mut self.return_value)
    }

    // ---- Loops ----

    pub fn push_loop_return(&mut self, index: usize) {
        self.loop_returns.push(index);
    }

    pub fn pop_loop_return(&mut self) -> Option<usize> {
        self.loop_returns.pop()
    }

    pub fn is_in_loop(&self) -> bool {
        !self.loop_returns.is_empty()
    }

    /// Innermost loop re-entry index.
    pub fn loop_return(&self) -> Option<usize> {
        self.loop_returns.last().copied()
    }

    // ---- Tell blocks ----

    pub fn push_tell_target(&mut self, target: Datum) {
        self.tell_targets.push(target);
    }

    pub fn pop_tell_target(&mut self) -> Option<Datum> {
        self.tell_targets.pop()
    }

    pub fn tell_target(&self) -> Option<&Datum> {
        self.tell_targets.last()
    }
}
