//! Group: constants and stack shuffling.

use lingo_common::{Datum, Instruction};

use crate::machine::LingoVM;

impl LingoVM {
    /// The argument is the bit pattern of an `f32`.
    pub(crate) fn exec_push_float32(&mut self, instr: &Instruction) {
        let value = f32::from_bits(instr.argument as u32);
        self.push(Datum::Float(f64::from(value)));
    }

    /// Push a literal of the running script; out of range pushes void.
    pub(crate) fn exec_push_cons(&mut self, instr: &Instruction) {
        let value = self
            .call_stack
            .last()
            .and_then(|scope| {
                let index = usize::try_from(instr.argument).ok()?;
                scope.script().literals.get(index).map(Datum::from)
            })
            .unwrap_or_default();
        self.push(value);
    }

    pub(crate) fn exec_push_symb(&mut self, instr: &Instruction) {
        let name = self.resolve_name(instr.argument);
        self.push(Datum::symbol(name));
    }

    pub(crate) fn exec_push_var_ref(&mut self, instr: &Instruction) {
        self.push(Datum::VarRef {
            var_type: 0,
            index: instr.argument,
        });
    }

    pub(crate) fn exec_swap(&mut self) {
        if let Some(scope) = self.call_stack.last_mut() {
            scope.swap();
        }
    }

    /// Discard `argument` values, at least one, and never more than the
    /// stack holds.
    pub(crate) fn exec_pop(&mut self, instr: &Instruction) {
        let count = usize::try_from(instr.argument.max(1)).unwrap_or(1);
        if let Some(scope) = self.call_stack.last_mut() {
            scope.discard(count);
        }
    }

    /// Duplicate the value `argument` slots below the top.
    pub(crate) fn exec_peek(&mut self, instr: &Instruction) {
        let depth = usize::try_from(instr.argument).unwrap_or(0);
        let value = self
            .call_stack
            .last()
            .map(|scope| scope.peek(depth))
            .unwrap_or_default();
        self.push(value);
    }
}
