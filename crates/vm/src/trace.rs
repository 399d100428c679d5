//! Execution trace hooks.

use lingo_common::{Datum, Opcode};

use crate::error::VmError;

/// Number of stack values captured per instruction.
pub const STACK_SNAPSHOT_LEN: usize = 10;

/// A handler call as seen on entry and exit.
#[derive(Debug, Clone)]
pub struct HandlerInfo {
    pub name: String,
    /// Member number of the owning script.
    pub script_member: i32,
    pub script_kind: &'static str,
    pub args: Vec<Datum>,
    pub receiver: Datum,
    pub local_count: usize,
    pub arg_count: usize,
    /// Call depth including this call.
    pub depth: usize,
}

/// One instruction about to execute.
#[derive(Debug, Clone)]
pub struct InstructionInfo {
    pub bytecode_index: usize,
    pub offset: usize,
    pub opcode: Opcode,
    pub argument: i32,
    pub stack_len: usize,
    /// Top of stack first.
    pub stack_top: Vec<Datum>,
}

/// Observer of interpreter activity. Every method defaults to a no-op.
pub trait TraceListener {
    fn on_handler_enter(&mut self, _info: &HandlerInfo) {}

    fn on_handler_exit(&mut self, _info: &HandlerInfo, _result: &Datum) {}

    fn on_instruction(&mut self, _info: &InstructionInfo) {}

    /// `kind` is one of `global`, `property`, `param`, `local`, `field`.
    fn on_variable_set(&mut self, _kind: &str, _name: &str, _value: &Datum) {}

    fn on_error(&mut self, _message: &str, _error: &VmError) {}
}

/// Forwards every event to `tracing` at debug level under `lingo::trace`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTrace;

impl TraceListener for LogTrace {
    fn on_handler_enter(&mut self, info: &HandlerInfo) {
        let args: Vec<String> = info.args.iter().map(Datum::to_string).collect();
        tracing::debug!(
            target: "lingo::trace",
            depth = info.depth,
            script = info.script_member,
            kind = info.script_kind,
            "== {}({})",
            info.name,
            args.join(", ")
        );
    }

    fn on_handler_exit(&mut self, info: &HandlerInfo, result: &Datum) {
        tracing::debug!(target: "lingo::trace", depth = info.depth, "== {} returned {result}", info.name);
    }

    fn on_instruction(&mut self, info: &InstructionInfo) {
        let top = info.stack_top.first().map(Datum::to_string).unwrap_or_default();
        tracing::debug!(
            target: "lingo::trace",
            "[{:4}] {:<18} {:>6}  stack={} top={}",
            info.offset,
            info.opcode.mnemonic(),
            info.argument,
            info.stack_len,
            top
        );
    }

    fn on_variable_set(&mut self, kind: &str, name: &str, value: &Datum) {
        tracing::debug!(target: "lingo::trace", "{kind} {name} = {value}");
    }

    fn on_error(&mut self, message: &str, error: &VmError) {
        tracing::debug!(target: "lingo::trace", "{message}: {error}");
    }
}
