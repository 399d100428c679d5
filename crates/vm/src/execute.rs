//! Call discipline and the fetch-dispatch loop.

use std::cmp::Ordering;

use lingo_common::{Datum, Instruction, Opcode};

use crate::error::VmError;
use crate::machine::{LingoVM, ERROR_HANDLER_NAMES};
use crate::ops::arith::ArithOp;
use crate::resolver::HandlerLocation;
use crate::scope::Scope;
use crate::trace::{HandlerInfo, InstructionInfo, STACK_SNAPSHOT_LEN};

impl LingoVM {
    /// Call a builtin or handler by name. A missing handler yields void.
    pub fn call_handler(&mut self, name: &str, args: &[Datum]) -> Result<Datum, VmError> {
        if self.error_state {
            return Ok(Datum::Void);
        }
        if self.has_builtin(name) {
            return self.invoke_builtin(name, args);
        }
        match self.find_handler(name) {
            Some(location) => self.execute_handler(&location, args, None),
            None => {
                tracing::trace!(target: "lingo::call", "no handler named {name}");
                Ok(Datum::Void)
            }
        }
    }

    /// Call `name` with `receiver` as `me`.
    ///
    /// An instance receiver is searched along its ancestor chain, a script
    /// receiver in its own script; otherwise the global lookup applies.
    pub fn call_handler_with_receiver(
        &mut self,
        name: &str,
        args: &[Datum],
        receiver: Datum,
    ) -> Result<Datum, VmError> {
        if self.error_state {
            return Ok(Datum::Void);
        }
        let location = match &receiver {
            Datum::Instance(id) => self.find_instance_handler(*id, name),
            Datum::Script(script) => self.find_handler_in_script(*script, name),
            _ => None,
        }
        .or_else(|| self.find_handler(name));
        match location {
            Some(location) => self.execute_handler(&location, args, Some(receiver)),
            None => Ok(Datum::Void),
        }
    }

    /// Run one handler. A receiver becomes argument 0 as well as `me`.
    pub fn execute_handler(
        &mut self,
        location: &HandlerLocation,
        args: &[Datum],
        receiver: Option<Datum>,
    ) -> Result<Datum, VmError> {
        match receiver {
            Some(receiver) => {
                let mut full = Vec::with_capacity(args.len() + 1);
                full.push(receiver.clone());
                full.extend_from_slice(args);
                self.run_handler(location, full, receiver)
            }
            None => self.run_handler(location, args.to_vec(), Datum::Void),
        }
    }

    /// [`execute_handler`](Self::execute_handler) with the error contained:
    /// it is logged, the VM enters its stop state and the call yields void.
    pub fn execute_contained(&mut self, location: &HandlerLocation, args: &[Datum], receiver: Datum) -> Datum {
        match self.execute_handler(location, args, Some(receiver)) {
            Ok(value) => value,
            Err(err) => {
                tracing::error!(target: "lingo::vm", "Error in {}: {err}", location.name());
                self.error_state = true;
                Datum::Void
            }
        }
    }

    /// Push a scope for `location`, run it and pop it. `args` already holds
    /// the receiver when there is one.
    pub(crate) fn run_handler(
        &mut self,
        location: &HandlerLocation,
        args: Vec<Datum>,
        receiver: Datum,
    ) -> Result<Datum, VmError> {
        if self.error_state {
            return Ok(Datum::Void);
        }
        let name = location.name();
        if self.call_stack.len() >= self.config.max_call_depth {
            return Err(VmError::CallStackOverflow {
                handler: name,
                depth: self.config.max_call_depth,
            });
        }
        let is_error_handler = ERROR_HANDLER_NAMES
            .iter()
            .any(|n| n.eq_ignore_ascii_case(&name));
        if is_error_handler {
            if self.error_handler_depth > 0 {
                tracing::debug!(target: "lingo::call", "skipping nested {name}");
                return Ok(Datum::Void);
            }
            self.error_handler_depth += 1;
        }

        self.call_stack.push(Scope::new(location.clone(), args, receiver));
        tracing::trace!(target: "lingo::call", depth = self.call_stack.len(), "enter {name}");
        let info = self.trace.is_some().then(|| self.handler_info(&name));
        if let (Some(trace), Some(info)) = (self.trace.as_mut(), info.as_ref()) {
            trace.on_handler_enter(info);
        }

        let result = self.run_scope(&name);

        match (&result, self.trace.as_mut()) {
            (Ok(value), Some(trace)) => {
                if let Some(info) = info.as_ref() {
                    trace.on_handler_exit(info, value);
                }
            }
            (Err(err), Some(trace)) => trace.on_error(&format!("Error in {name}"), err),
            _ => {}
        }
        tracing::trace!(target: "lingo::call", depth = self.call_stack.len(), "exit {name}");
        self.call_stack.pop();
        if is_error_handler {
            self.error_handler_depth -= 1;
        }
        result
    }

    /// Execute the top scope until it returns, runs out of instructions,
    /// or the VM stops.
    fn run_scope(&mut self, name: &str) -> Result<Datum, VmError> {
        let limit = self.config.step_limit;
        let mut steps: u64 = 0;

        loop {
            if self.error_state {
                break;
            }
            let Some(scope) = self.call_stack.last_mut() else {
                break;
            };
            if scope.is_returned() {
                break;
            }
            let index = scope.bytecode_index();
            let Some(instr) = scope.current_instruction() else {
                break;
            };
            if steps >= limit {
                return Err(VmError::StepLimitExceeded {
                    handler: name.to_string(),
                    at: instr.offset,
                    limit,
                });
            }
            steps += 1;
            scope.advance();

            if let Some(trace) = self.trace.as_mut() {
                if let Some(scope) = self.call_stack.last() {
                    trace.on_instruction(&InstructionInfo {
                        bytecode_index: index,
                        offset: instr.offset,
                        opcode: instr.opcode,
                        argument: instr.argument,
                        stack_len: scope.stack_len(),
                        stack_top: scope.top_values(STACK_SNAPSHOT_LEN),
                    });
                }
            }

            self.execute_instruction(&instr)?;
        }

        Ok(self
            .call_stack
            .last_mut()
            .map(Scope::take_return_value)
            .unwrap_or_default())
    }

    fn execute_instruction(&mut self, instr: &Instruction) -> Result<(), VmError> {
        match instr.opcode {
            // Group: stack
            Opcode::PushZero => self.push(Datum::Int(0)),
            Opcode::PushInt8 | Opcode::PushInt16 | Opcode::PushInt32 => {
                self.push(Datum::Int(instr.argument))
            }
            Opcode::PushFloat32 => self.exec_push_float32(instr),
            Opcode::PushCons => self.exec_push_cons(instr),
            Opcode::PushSymb => self.exec_push_symb(instr),
            Opcode::Swap => self.exec_swap(),
            Opcode::Pop => self.exec_pop(instr),
            Opcode::Peek => self.exec_peek(instr),
            Opcode::PushVarRef | Opcode::PushChunkVarRef => self.exec_push_var_ref(instr),

            // Group: arithmetic
            Opcode::Add => self.exec_arith(ArithOp::Add),
            Opcode::Sub => self.exec_arith(ArithOp::Sub),
            Opcode::Mul => self.exec_arith(ArithOp::Mul),
            Opcode::Div => self.exec_div(instr)?,
            Opcode::Mod => self.exec_mod(instr)?,
            Opcode::Inv => self.exec_inv(),

            // Group: strings and chunks
            Opcode::JoinStr => self.exec_join_str(false),
            Opcode::JoinPadStr => self.exec_join_str(true),
            Opcode::ContainsStr => self.exec_contains_str(),
            Opcode::Contains0Str => self.exec_starts_with_str(),
            Opcode::GetChunk => self.exec_get_chunk(),
            Opcode::PutChunk => self.exec_put_chunk(instr),
            Opcode::DeleteChunk => self.exec_delete_chunk(instr),
            Opcode::HiliteChunk => {}

            // Group: comparison and logic
            Opcode::Lt => self.exec_compare(Ordering::is_lt),
            Opcode::LtEq => self.exec_compare(Ordering::is_le),
            Opcode::Gt => self.exec_compare(Ordering::is_gt),
            Opcode::GtEq => self.exec_compare(Ordering::is_ge),
            Opcode::Eq => self.exec_eq(false),
            Opcode::NtEq => self.exec_eq(true),
            Opcode::And => self.exec_logic(|a, b| a && b),
            Opcode::Or => self.exec_logic(|a, b| a || b),
            Opcode::Not => self.exec_not(),

            // Group: control flow
            Opcode::Ret => self.exec_ret(),
            Opcode::RetFactory => self.exec_ret_factory(),
            Opcode::Jmp => self.exec_jump(instr, instr.argument),
            Opcode::EndRepeat => self.exec_end_repeat(instr),
            Opcode::JmpIfZ => self.exec_jmp_if_z(instr),

            // Group: variables
            Opcode::GetGlobal | Opcode::GetGlobal2 => self.exec_get_global(instr),
            Opcode::SetGlobal | Opcode::SetGlobal2 => self.exec_set_global(instr),
            Opcode::GetParam => self.exec_get_param(instr),
            Opcode::SetParam => self.exec_set_param(instr),
            Opcode::GetLocal => self.exec_get_local(instr),
            Opcode::SetLocal => self.exec_set_local(instr),
            Opcode::Put => self.exec_put(instr),

            // Group: list construction
            Opcode::PushList => self.exec_push_list(),
            Opcode::PushPropList => self.exec_push_prop_list(),
            Opcode::PushArgList => self.exec_push_arg_list(instr, false),
            Opcode::PushArgListNoRet => self.exec_push_arg_list(instr, true),

            // Group: calls
            Opcode::LocalCall => self.exec_local_call(instr)?,
            Opcode::ExtCall => self.exec_ext_call(instr)?,
            Opcode::ObjCall | Opcode::ObjCallV4 => self.exec_obj_call(instr)?,
            Opcode::TellCall => self.exec_tell_call(instr)?,
            Opcode::NewObj => self.exec_new_obj(instr)?,
            Opcode::StartTell => self.exec_start_tell(),
            Opcode::EndTell => self.exec_end_tell(),
            Opcode::CallJavaScript => self.push(Datum::Void),

            // Group: properties
            Opcode::GetProp => self.exec_get_prop(instr),
            Opcode::SetProp => self.exec_set_prop(instr),
            Opcode::GetMovieProp => self.exec_get_movie_prop(instr),
            Opcode::SetMovieProp => self.exec_set_movie_prop(instr),
            Opcode::GetObjProp => self.exec_get_obj_prop(instr),
            Opcode::SetObjProp => self.exec_set_obj_prop(instr),
            Opcode::GetChainedProp => self.exec_get_chained_prop(instr),
            Opcode::GetTopLevelProp => self.exec_get_top_level_prop(instr),
            Opcode::TheBuiltin => self.exec_the_builtin(instr),
            Opcode::GetField => self.exec_get_field(),
            Opcode::Get => self.exec_get(instr),
            Opcode::Set => self.exec_set(instr),
            Opcode::OntoSpr | Opcode::IntoSpr => self.exec_sprite_overlap(instr),

            Opcode::Invalid => tracing::warn!(
                target: "lingo::vm",
                "unknown opcode 0x{:02x} at offset {} in {}",
                instr.raw,
                instr.offset,
                self.current_handler_name()
            ),
        }
        Ok(())
    }

    fn handler_info(&self, name: &str) -> HandlerInfo {
        let depth = self.call_stack.len();
        match self.call_stack.last() {
            Some(scope) => HandlerInfo {
                name: name.to_string(),
                script_member: scope.script().member,
                script_kind: scope.script().kind.name(),
                args: scope.args().to_vec(),
                receiver: scope.receiver().clone(),
                local_count: scope.handler().local_count,
                arg_count: scope.handler().arg_name_ids.len(),
                depth,
            },
            None => HandlerInfo {
                name: name.to_string(),
                script_member: 0,
                script_kind: "unknown",
                args: Vec::new(),
                receiver: Datum::Void,
                local_count: 0,
                arg_count: 0,
                depth,
            },
        }
    }
}
