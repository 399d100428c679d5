//! Group: calls.
//!
//! Every call opcode pops one argument list. The list's flavor decides
//! whether the result is pushed.

use lingo_common::{Datum, Instruction, ScriptRef};

use super::{arg_items, is_no_ret};
use crate::dispatch::dispatch_method;
use crate::error::VmError;
use crate::machine::LingoVM;
use crate::resolver::HandlerLocation;

impl LingoVM {
    fn pop_call_args(&mut self) -> (Vec<Datum>, bool) {
        let list = self.pop();
        (arg_items(&list), is_no_ret(&list))
    }

    fn push_result(&mut self, result: Datum, no_ret: bool) {
        if !no_ret {
            self.push(result);
        }
    }

    /// Call a handler of the running script by vector position, keeping the
    /// current receiver.
    pub(crate) fn exec_local_call(&mut self, instr: &Instruction) -> Result<(), VmError> {
        let (args, no_ret) = self.pop_call_args();
        let Some(location) = self.local_handler(instr.argument) else {
            tracing::debug!(
                target: "lingo::call",
                "no local handler {} in {}",
                instr.argument,
                self.current_handler_name()
            );
            self.push_result(Datum::Void, no_ret);
            return Ok(());
        };
        let receiver = self.receiver();
        let result = self.run_handler(&location, args, receiver)?;
        self.push_result(result, no_ret);
        Ok(())
    }

    fn local_handler(&self, position: i32) -> Option<HandlerLocation> {
        let scope = self.call_stack.last()?;
        let script = scope.script();
        let index = script
            .handlers
            .iter()
            .position(|h| h.vector_pos == position)
            .or_else(|| usize::try_from(position).ok())?;
        HandlerLocation::new(script.clone(), index, scope.library().clone())
    }

    pub(crate) fn exec_ext_call(&mut self, instr: &Instruction) -> Result<(), VmError> {
        let name = self.resolve_name(instr.argument);
        let (args, no_ret) = self.pop_call_args();
        let result = self.call_handler(&name, &args)?;
        self.push_result(result, no_ret);
        Ok(())
    }

    /// The first argument is the receiver of the method.
    pub(crate) fn exec_obj_call(&mut self, instr: &Instruction) -> Result<(), VmError> {
        let name = self.resolve_name(instr.argument);
        let (mut args, no_ret) = self.pop_call_args();
        let target = if args.is_empty() {
            Datum::Void
        } else {
            args.remove(0)
        };
        let result = dispatch_method(self, &target, &name, &args)?;
        self.push_result(result, no_ret);
        Ok(())
    }

    /// A call inside a `tell` block goes to the told object when it can
    /// receive methods.
    pub(crate) fn exec_tell_call(&mut self, instr: &Instruction) -> Result<(), VmError> {
        let name = self.resolve_name(instr.argument);
        let (args, no_ret) = self.pop_call_args();
        let target = self
            .call_stack
            .last()
            .and_then(|scope| scope.tell_target().cloned());
        let result = match target {
            Some(target @ (Datum::Instance(_) | Datum::Script(_))) => {
                dispatch_method(self, &target, &name, &args)?
            }
            _ => self.call_handler(&name, &args)?,
        };
        self.push_result(result, no_ret);
        Ok(())
    }

    pub(crate) fn exec_start_tell(&mut self) {
        let target = self.pop();
        if let Some(scope) = self.call_stack.last_mut() {
            scope.push_tell_target(target);
        }
    }

    pub(crate) fn exec_end_tell(&mut self) {
        if let Some(scope) = self.call_stack.last_mut() {
            scope.pop_tell_target();
        }
    }

    /// Instantiate the script named by the argument.
    pub(crate) fn exec_new_obj(&mut self, instr: &Instruction) -> Result<(), VmError> {
        let name = self.resolve_name(instr.argument);
        let (args, no_ret) = self.pop_call_args();
        let result = match self.script_ref_by_name(&name) {
            Some(script) => self.instantiate(script, &args)?,
            None => {
                tracing::warn!(target: "lingo::vm", "NEW_OBJ: no script named {name:?}");
                Datum::Void
            }
        };
        self.push_result(result, no_ret);
        Ok(())
    }

    fn instantiate(&mut self, script: ScriptRef, args: &[Datum]) -> Result<Datum, VmError> {
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push(Datum::Script(script));
        full.extend_from_slice(args);
        self.invoke_builtin("new", &full)
    }
}
