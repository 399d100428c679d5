//! Group: returns and jumps.
//!
//! Jump arguments are byte distances relative to the jumping instruction.
//! Targets are mapped back to instruction indices through the handler's
//! offset table; a target exactly at the end of the bytecode finishes the
//! handler.

use lingo_common::{Datum, Instruction};

use crate::machine::LingoVM;

impl LingoVM {
    pub(crate) fn exec_ret(&mut self) {
        let value = self.pop();
        if let Some(scope) = self.call_stack.last_mut() {
            scope.set_return_value(value);
        }
    }

    pub(crate) fn exec_ret_factory(&mut self) {
        if let Some(scope) = self.call_stack.last_mut() {
            scope.set_return_value(Datum::Void);
        }
    }

    /// Move the cursor `distance` bytes from `instr`.
    pub(crate) fn exec_jump(&mut self, instr: &Instruction, distance: i32) {
        let target = instr.offset as i64 + i64::from(distance);
        if let Some(index) = self.jump_index(target) {
            if let Some(scope) = self.call_stack.last_mut() {
                scope.set_bytecode_index(index);
            }
        } else {
            tracing::warn!(
                target: "lingo::vm",
                "jump from offset {} to {target} does not land on an instruction in {}",
                instr.offset,
                self.current_handler_name()
            );
        }
    }

    pub(crate) fn exec_jmp_if_z(&mut self, instr: &Instruction) {
        if !self.pop().truthy() {
            self.exec_jump(instr, instr.argument);
        }
    }

    /// Jump back to the loop head and record it as the innermost loop.
    pub(crate) fn exec_end_repeat(&mut self, instr: &Instruction) {
        let target = instr.offset as i64 - i64::from(instr.argument);
        let Some(index) = self.jump_index(target) else {
            self.exec_jump(instr, -instr.argument);
            return;
        };
        if let Some(scope) = self.call_stack.last_mut() {
            while scope.loop_return().is_some_and(|head| head > index) {
                scope.pop_loop_return();
            }
            if scope.loop_return() != Some(index) {
                scope.push_loop_return(index);
            }
            scope.set_bytecode_index(index);
        }
    }

    fn jump_index(&self, target: i64) -> Option<usize> {
        let handler = self.call_stack.last()?.handler();
        let target = usize::try_from(target).ok()?;
        if target == handler.bytecode_len() {
            return Some(handler.instructions.len());
        }
        handler.instruction_index(target)
    }
}
