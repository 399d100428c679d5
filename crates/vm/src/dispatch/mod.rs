//! Method calls on values (`OBJ_CALL`).
//!
//! Each value kind has its own method table. Tables are keyed by lowercase
//! method name and built on first use. An unknown method is not an error: it
//! yields void so callers can fall back to property lookup.

pub mod instance;
pub mod list;
pub mod prop_list;
pub mod string;

use std::collections::HashMap;
use std::sync::OnceLock;

use lingo_common::Datum;

use crate::error::VmError;
use crate::machine::LingoVM;

/// Lowercase-name lookup table for one value kind's methods.
pub struct MethodTable<M: 'static> {
    entries: &'static [(&'static str, M)],
    index: OnceLock<HashMap<&'static str, M>>,
}

impl<M: Copy + Send + Sync> MethodTable<M> {
    pub const fn new(entries: &'static [(&'static str, M)]) -> Self {
        Self {
            entries,
            index: OnceLock::new(),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<M> {
        let index = self
            .index
            .get_or_init(|| self.entries.iter().copied().collect());
        index.get(name.to_ascii_lowercase().as_str()).copied()
    }

    /// Every registered name, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }
}

/// Property-list key for a datum: a symbol's name, anything else as text.
pub fn key_of(key: &Datum) -> String {
    match key {
        Datum::Symbol(name) => name.to_string(),
        other => other.to_lingo_string(),
    }
}

/// 1-based position argument as a 0-based index, or `None` below 1.
pub(crate) fn position(arg: Option<&Datum>) -> Option<usize> {
    let n = arg?.to_int();
    (n >= 1).then(|| n as usize - 1)
}

/// Route a method call to the receiver's kind.
pub fn dispatch_method(
    vm: &mut LingoVM,
    target: &Datum,
    method: &str,
    args: &[Datum],
) -> Result<Datum, VmError> {
    match target {
        Datum::List(items) => Ok(list::dispatch(vm, items, method, args)),
        Datum::PropList(entries) => Ok(prop_list::dispatch(vm, entries, method, args)),
        Datum::Str(s) => Ok(string::dispatch(vm, s, method, args)),
        Datum::Instance(id) => Ok(instance::dispatch(vm, *id, method, args)),
        Datum::Script(_) if method.eq_ignore_ascii_case("new") => {
            vm.invoke_builtin("new", &with_target(target, args))
        }
        Datum::Script(script) if vm.find_handler_in_script(*script, method).is_some() => {
            vm.call_handler_with_receiver(method, args, target.clone())
        }
        Datum::Point(p) if method.eq_ignore_ascii_case("getAt") => {
            let p = *p.borrow();
            Ok(match args.first().map(Datum::to_int) {
                Some(1) => Datum::Int(p.x),
                Some(2) => Datum::Int(p.y),
                _ => Datum::Void,
            })
        }
        Datum::Rect(r) if method.eq_ignore_ascii_case("getAt") => {
            let r = *r.borrow();
            Ok(match args.first().map(Datum::to_int) {
                Some(1) => Datum::Int(r.left),
                Some(2) => Datum::Int(r.top),
                Some(3) => Datum::Int(r.right),
                Some(4) => Datum::Int(r.bottom),
                _ => Datum::Void,
            })
        }
        _ if vm.has_builtin(method) => vm.invoke_builtin(method, &with_target(target, args)),
        _ => Ok(Datum::Void),
    }
}

fn with_target(target: &Datum, args: &[Datum]) -> Vec<Datum> {
    let mut full = Vec::with_capacity(args.len() + 1);
    full.push(target.clone());
    full.extend_from_slice(args);
    full
}
