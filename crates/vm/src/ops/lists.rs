//! Group: list literals and argument lists.

use lingo_common::{Datum, Instruction, PropMap};

use super::arg_items;
use crate::dispatch::key_of;
use crate::machine::LingoVM;

impl LingoVM {
    /// Pop `count` values, returned in push order. A count past the stack
    /// depth takes what is there.
    pub(crate) fn pop_args(&mut self, count: usize) -> Vec<Datum> {
        self.call_stack
            .last_mut()
            .map(|scope| scope.pop_many(count))
            .unwrap_or_default()
    }

    pub(crate) fn exec_push_list(&mut self) {
        let items = arg_items(&self.pop());
        self.push(Datum::list(items));
    }

    /// Arguments alternate key, value. A trailing key without a value is
    /// dropped.
    pub(crate) fn exec_push_prop_list(&mut self) {
        let items = self.pop().arg_items().unwrap_or_default();
        let entries: PropMap = items
            .chunks_exact(2)
            .map(|pair| (key_of(&pair[0]), pair[1].clone()))
            .collect();
        self.push(Datum::prop_list(entries));
    }

    pub(crate) fn exec_push_arg_list(&mut self, instr: &Instruction, no_ret: bool) {
        let count = usize::try_from(instr.argument).unwrap_or(0);
        let items = self.pop_args(count);
        self.push(if no_ret {
            Datum::arg_list_no_ret(items)
        } else {
            Datum::arg_list(items)
        });
    }
}
