//! Group: variables.
//!
//! Local and parameter opcodes carry slot numbers scaled by the library's
//! variable multiplier. PUT and the chunk mutators address a variable by kind
//! and an id popped from the stack instead.

use lingo_common::{Datum, Instruction};

use super::VarKind;
use crate::chunks::PutMode;
use crate::machine::LingoVM;

impl LingoVM {
    /// Unscaled slot number. Negative indices address nothing.
    fn slot(&self, raw: i32) -> Option<usize> {
        let multiplier = usize::try_from(self.variable_multiplier()).unwrap_or(1).max(1);
        usize::try_from(raw).ok().map(|raw| raw / multiplier)
    }

    pub(crate) fn note_variable_set(&mut self, kind: &str, name: &str, value: &Datum) {
        if let Some(trace) = self.trace.as_mut() {
            trace.on_variable_set(kind, name, value);
        }
    }

    pub(crate) fn exec_get_global(&mut self, instr: &Instruction) {
        let name = self.resolve_name(instr.argument);
        let value = self.global(&name);
        self.push(value);
    }

    pub(crate) fn exec_set_global(&mut self, instr: &Instruction) {
        let name = self.resolve_name(instr.argument);
        let value = self.pop();
        self.set_global(&name, value);
    }

    fn param_at(&self, raw: i32) -> Datum {
        self.slot(raw)
            .zip(self.call_stack.last())
            .map(|(slot, scope)| scope.param(slot))
            .unwrap_or_default()
    }

    fn local_at(&self, raw: i32) -> Datum {
        self.slot(raw)
            .zip(self.call_stack.last())
            .map(|(slot, scope)| scope.local(slot))
            .unwrap_or_default()
    }

    fn set_param_at(&mut self, raw: i32, value: Datum) {
        let Some(slot) = self.slot(raw) else {
            tracing::debug!(target: "lingo::vm", "param slot {raw} dropped");
            return;
        };
        self.note_variable_set("param", &format!("param{slot}"), &value);
        if let Some(scope) = self.call_stack.last_mut() {
            scope.set_param(slot, value);
        }
    }

    fn set_local_at(&mut self, raw: i32, value: Datum) {
        let Some(slot) = self.slot(raw) else {
            tracing::debug!(target: "lingo::vm", "local slot {raw} dropped");
            return;
        };
        let name = self.local_name(slot);
        self.note_variable_set("local", &name, &value);
        if let Some(scope) = self.call_stack.last_mut() {
            scope.set_local(slot, value);
        }
    }

    pub(crate) fn exec_get_param(&mut self, instr: &Instruction) {
        let value = self.param_at(instr.argument);
        self.push(value);
    }

    pub(crate) fn exec_set_param(&mut self, instr: &Instruction) {
        let value = self.pop();
        self.set_param_at(instr.argument, value);
    }

    pub(crate) fn exec_get_local(&mut self, instr: &Instruction) {
        let value = self.local_at(instr.argument);
        self.push(value);
    }

    pub(crate) fn exec_set_local(&mut self, instr: &Instruction) {
        let value = self.pop();
        self.set_local_at(instr.argument, value);
    }

    fn local_name(&self, slot: usize) -> String {
        self.call_stack
            .last()
            .and_then(|scope| {
                let id = *scope.handler().local_name_ids.get(slot)?;
                Some(scope.library().names.name_or_placeholder(id))
            })
            .unwrap_or_else(|| format!("local{slot}"))
    }

    /// `put value into|after|before variable`. The argument packs the put
    /// mode in the high nibble and the variable kind in the low one.
    pub(crate) fn exec_put(&mut self, instr: &Instruction) {
        let mode = PutMode::from_code((instr.argument >> 4) & 0xF).unwrap_or(PutMode::Into);
        let var = self.pop_var_target(instr.argument & 0xF);
        let value = self.pop();
        let Some(var) = var else {
            tracing::warn!(target: "lingo::vm", "PUT: unsupported variable kind {}", instr.argument & 0xF);
            return;
        };
        let value = match mode {
            PutMode::Into => value,
            PutMode::After => {
                let current = self.context_var(&var);
                Datum::string(current.to_lingo_string() + &value.to_lingo_string())
            }
            PutMode::Before => {
                let current = self.context_var(&var);
                Datum::string(value.to_lingo_string() + &current.to_lingo_string())
            }
        };
        self.set_context_var(&var, value);
    }

    /// Pop the operands that name a variable: the cast for fields, then
    /// the id.
    pub(crate) fn pop_var_target(&mut self, code: i32) -> Option<VarTarget> {
        let kind = VarKind::from_code(code);
        let cast = match kind {
            Some(VarKind::Field) => self.pop(),
            _ => Datum::Void,
        };
        let id = self.pop();
        Some(VarTarget { kind: kind?, id, cast })
    }

    pub(crate) fn context_var(&self, var: &VarTarget) -> Datum {
        match var.kind {
            VarKind::Global => self.global(&self.resolve_name(var.id.to_int())),
            VarKind::Property => match self.receiver() {
                Datum::Instance(id) => {
                    let name = self.resolve_name(var.id.to_int());
                    crate::ancestor::get_property(self.heap(), id, &name)
                }
                _ => Datum::Void,
            },
            VarKind::Param => self.param_at(var.id.to_int()),
            VarKind::Local => self.local_at(var.id.to_int()),
            VarKind::Field => Datum::string(self.field_text(&var.cast, &var.id)),
        }
    }

    pub(crate) fn set_context_var(&mut self, var: &VarTarget, value: Datum) {
        match var.kind {
            VarKind::Global => {
                let name = self.resolve_name(var.id.to_int());
                self.set_global(&name, value);
            }
            VarKind::Property => {
                let Datum::Instance(id) = self.receiver() else {
                    return;
                };
                let name = self.resolve_name(var.id.to_int());
                self.note_variable_set("property", &name, &value);
                crate::ancestor::set_property(self.heap_mut(), id, &name, value);
            }
            VarKind::Param => self.set_param_at(var.id.to_int(), value),
            VarKind::Local => self.set_local_at(var.id.to_int(), value),
            VarKind::Field => self.set_field_text(&var.cast, &var.id, value),
        }
    }

    /// Text of a field member, or empty without a provider or field.
    pub(crate) fn field_text(&self, cast: &Datum, field: &Datum) -> String {
        self.provider()
            .and_then(|p| p.field_value(cast, field))
            .unwrap_or_default()
    }

    fn set_field_text(&mut self, cast: &Datum, field: &Datum, value: Datum) {
        self.note_variable_set("field", &field.to_lingo_string(), &value);
        let Some(provider) = self.provider_mut() else {
            tracing::warn!(target: "lingo::vm", "field {field} set without a cast provider");
            return;
        };
        let cast_lib = match cast {
            Datum::Int(n) => *n,
            Datum::CastLib(n) => *n,
            Datum::Str(name) => provider.cast_lib_by_name(name),
            _ => 0,
        };
        let member = match field {
            Datum::CastMember { cast_lib, member } => Some((*cast_lib, *member)),
            Datum::Str(name) => match provider.member_by_name(cast_lib, name) {
                Datum::CastMember { cast_lib, member } => Some((cast_lib, member)),
                _ => None,
            },
            other => Some((cast_lib.max(1), other.to_int())),
        };
        let stored = member.is_some_and(|(c, m)| provider.set_member_prop(c, m, "text", value));
        if !stored {
            tracing::warn!(target: "lingo::vm", "no field {field} to put text into");
        }
    }
}

/// A variable addressed by kind and id, as PUT and the chunk opcodes see it.
#[derive(Debug, Clone)]
pub(crate) struct VarTarget {
    pub(crate) kind: VarKind,
    pub(crate) id: Datum,
    pub(crate) cast: Datum,
}

#[cfg(test)]
mod tests {
    use lingo_common::Datum;

    use crate::resolver::{CastLibProvider, StaticCastLibs};
    use crate::LingoVM;

    // Slots are unscaled under capitalx, so PUT ids are plain slot numbers.
    const VARS: &str = "\
library 1 capitalx
script 1 movie
  handler locals
    local t, u
    PUSH_INT8 5
    SET_LOCAL t
    PUSH_CONS \"x\"
    PUSH_INT8 1
    PUT 0x15
    PUSH_CONS \"y\"
    PUSH_INT8 1
    PUT 0x25
    PUSH_CONS \"<\"
    PUSH_INT8 1
    PUT 0x35
    GET_LOCAL u
    RET
  end
  handler params a, b
    PUSH_CONS \"!\"
    PUSH_INT8 1
    PUT 0x24
    GET_PARAM b
    RET
  end
  handler globals
    PUSH_CONS \"one\"
    PUSH_INT8 #gFirst
    PUT 0x11
    PUSH_CONS \"two\"
    PUSH_INT8 #gSecond
    PUT 0x12
    PUSH_CONS \"+\"
    PUSH_INT8 #gFirst
    PUT 0x21
  end
  handler mark me
    PUSH_CONS \"x\"
    PUSH_INT8 #pTag
    PUT 0x13
    PUSH_CONS \"y\"
    PUSH_INT8 #pTag
    PUT 0x23
    PUSH_CONS \"<\"
    PUSH_INT8 #pTag
    PUT 0x33
  end
  handler label
    PUSH_CONS \" there\"
    PUSH_INT8 5
    PUSH_INT8 1
    PUT 0x26
    PUSH_CONS \"<\"
    PUSH_INT8 5
    PUSH_INT8 1
    PUT 0x36
  end
  handler negativeLocal
    local t
    PUSH_INT8 3
    SET_LOCAL t
    GET_LOCAL -1
    RET
  end
  handler farLocal
    local t
    PUSH_INT8 3
    SET_LOCAL t
    GET_LOCAL 40
    RET
  end
  handler negativeParam a
    GET_PARAM -1
    RET
  end
  handler negativeWrites a
    local t
    PUSH_INT8 3
    SET_LOCAL t
    PUSH_INT8 9
    SET_LOCAL -1
    PUSH_INT8 9
    SET_PARAM -1
    PUSH_CONS \"z\"
    PUSH_INT8 -1
    PUT 0x15
    GET_LOCAL t
    GET_PARAM a
    ADD
    RET
  end
end
";

    fn vm() -> LingoVM {
        let mut vm = LingoVM::new();
        match lingo_assembler::assemble(VARS) {
            Ok(library) => vm.set_movie(library),
            Err(err) => panic!("assembly failed: {err}"),
        }
        vm
    }

    #[test]
    fn put_into_after_and_before_a_local() {
        let mut vm = vm();
        assert_eq!(vm.call_handler("locals", &[]), Ok(Datum::string("<xy")));
    }

    #[test]
    fn put_after_a_param() {
        let mut vm = vm();
        let args = [Datum::string("hi"), Datum::string("there")];
        assert_eq!(vm.call_handler("params", &args), Ok(Datum::string("there!")));
    }

    #[test]
    fn put_kinds_one_and_two_are_globals() {
        let mut vm = vm();
        vm.call_handler("globals", &[]).unwrap();
        assert_eq!(vm.global("gFirst"), Datum::string("one+"));
        assert_eq!(vm.global("gSecond"), Datum::string("two"));
    }

    #[test]
    fn put_into_a_property_of_me() {
        let mut vm = vm();
        let id = vm.heap_mut().alloc(None, Default::default());
        vm.call_handler_with_receiver("mark", &[], Datum::Instance(id))
            .unwrap();
        assert_eq!(vm.instance_prop(id, "pTag"), Datum::string("<xy"));
    }

    #[test]
    fn put_into_a_field_goes_through_the_provider() {
        let mut vm = vm();
        let mut casts = StaticCastLibs::new([]);
        casts.set_field(1, 5, "greeting", "hi");
        vm.set_provider(Box::new(casts));
        vm.call_handler("label", &[]).unwrap();

        let text = vm
            .provider()
            .and_then(|p| p.field_value(&Datum::Int(1), &Datum::Int(5)));
        assert_eq!(text.as_deref(), Some("<hi there"));
    }

    #[test]
    fn field_puts_without_a_provider_are_dropped() {
        let mut vm = vm();
        assert_eq!(vm.call_handler("label", &[]), Ok(Datum::Void));
    }

    #[test]
    fn out_of_range_slots_read_void() {
        let mut vm = vm();
        assert_eq!(vm.call_handler("negativeLocal", &[]), Ok(Datum::Void));
        assert_eq!(vm.call_handler("farLocal", &[]), Ok(Datum::Void));
        assert_eq!(vm.call_handler("negativeParam", &[Datum::Int(1)]), Ok(Datum::Void));
    }

    #[test]
    fn negative_slots_never_overwrite_slot_zero() {
        let mut vm = vm();
        assert_eq!(vm.call_handler("negativeWrites", &[Datum::Int(10)]), Ok(Datum::Int(13)));
    }

    #[test]
    fn slots_scale_by_the_multiplier() {
        let mut vm = vm();
        assert_eq!(vm.slot(-1), None);
        assert_eq!(vm.slot(7), Some(7));

        let scaled = "library 1 version=1200\nscript 1 movie\n\
            handler go a, b\nGET_PARAM b\nRET\nend\n\
            handler back a\nGET_PARAM -1\nRET\nend\nend\n";
        match lingo_assembler::assemble(scaled) {
            Ok(library) => vm.set_movie(library),
            Err(err) => panic!("assembly failed: {err}"),
        }
        let args = [Datum::Int(1), Datum::Int(2)];
        assert_eq!(vm.call_handler("go", &args), Ok(Datum::Int(2)));
        assert_eq!(vm.call_handler("back", &args), Ok(Datum::Void));
    }
}
