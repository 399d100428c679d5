//! Script instance methods.
//!
//! Property-style pseudo-methods win over user handlers, so `getAt` or
//! `count` on an instance never reaches its script. Everything else looks for
//! a handler on the instance's script and then its ancestors, and finally
//! reads a property of the same name.

use lingo_common::{Datum, InstanceId, PROP_ANCESTOR};

use super::{key_of, list, position, MethodTable};
use crate::ancestor::{self, MAX_ANCESTOR_DEPTH};
use crate::machine::LingoVM;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceMethod {
    SetAt,
    SetProp,
    GetAt,
    GetaProp,
    GetProp,
    AddProp,
    DeleteProp,
    Count,
    Ilk,
    AddAt,
}

pub static INSTANCE_METHODS: MethodTable<InstanceMethod> = MethodTable::new(&[
    ("setat", InstanceMethod::SetAt),
    ("setaprop", InstanceMethod::SetAt),
    ("setprop", InstanceMethod::SetProp),
    ("getat", InstanceMethod::GetAt),
    ("getaprop", InstanceMethod::GetaProp),
    ("getprop", InstanceMethod::GetProp),
    ("getpropref", InstanceMethod::GetProp),
    ("addprop", InstanceMethod::AddProp),
    ("deleteprop", InstanceMethod::DeleteProp),
    ("count", InstanceMethod::Count),
    ("ilk", InstanceMethod::Ilk),
    ("addat", InstanceMethod::AddAt),
]);

/// Call `method` on instance `id`.
///
/// Errors raised by a user handler do not escape: they are logged, the VM
/// enters its stop state and the call yields void.
pub fn dispatch(vm: &mut LingoVM, id: InstanceId, method: &str, args: &[Datum]) -> Datum {
    if let Some(builtin) = INSTANCE_METHODS.lookup(method) {
        return call_builtin(vm, id, builtin, args);
    }
    if let Some(location) = vm.find_instance_handler(id, method) {
        return vm.execute_contained(&location, args, Datum::Instance(id));
    }
    chain_lookup(vm, id, method)
}

fn call_builtin(vm: &mut LingoVM, id: InstanceId, method: InstanceMethod, args: &[Datum]) -> Datum {
    match method {
        InstanceMethod::SetAt => {
            if let (Some(key), Some(value)) = (args.first(), args.get(1)) {
                vm.set_instance_prop(id, &key_of(key), value.clone());
            }
            Datum::Void
        }
        InstanceMethod::SetProp => {
            match args {
                [key, value] => vm.set_instance_prop(id, &key_of(key), value.clone()),
                [key, sub, value, ..] => set_nested(vm, id, &key_of(key), sub, value.clone()),
                _ => {}
            }
            Datum::Void
        }
        InstanceMethod::GetAt => match args.first() {
            Some(key) if key_of(key).eq_ignore_ascii_case(PROP_ANCESTOR) => {
                match vm.heap().get(id).and_then(|inst| inst.properties.get(PROP_ANCESTOR)) {
                    Some(ancestor) if !ancestor.is_void() => ancestor.clone(),
                    _ => Datum::Int(0),
                }
            }
            Some(key) => chain_lookup(vm, id, &key_of(key)),
            None => Datum::Void,
        },
        InstanceMethod::GetaProp => args
            .first()
            .map(|key| chain_lookup(vm, id, &key_of(key)))
            .unwrap_or_default(),
        InstanceMethod::GetProp => {
            let Some(key) = args.first() else {
                return Datum::Void;
            };
            let value = chain_lookup(vm, id, &key_of(key));
            match args.get(1) {
                Some(sub) => index_into(&value, sub),
                None => value,
            }
        }
        InstanceMethod::AddProp => {
            if let (Some(key), Some(value)) = (args.first(), args.get(1)) {
                vm.set_instance_prop(id, &key_of(key), value.clone());
            }
            Datum::Void
        }
        InstanceMethod::DeleteProp => {
            if let (Some(key), Some(inst)) = (args.first(), vm.heap_mut().get_mut(id)) {
                inst.properties.shift_remove(&key_of(key));
            }
            Datum::Void
        }
        InstanceMethod::Count => {
            let n = vm.heap().get(id).map_or(0, |inst| inst.properties.len());
            Datum::Int(n as i32)
        }
        InstanceMethod::Ilk => Datum::symbol("instance"),
        InstanceMethod::AddAt => match (args.first(), args.get(1)) {
            (Some(Datum::Int(1)), Some(Datum::List(names))) => {
                let names = names.borrow().clone();
                build_ancestor_chain(vm, id, &names);
                Datum::Void
            }
            _ => Datum::Void,
        },
    }
}

/// Property read through the ancestor chain, trying the exact name first.
fn chain_lookup(vm: &LingoVM, id: InstanceId, name: &str) -> Datum {
    let heap = vm.heap();
    if ancestor::has_property(heap, id, name) {
        return ancestor::get_property(heap, id, name);
    }
    ancestor::chain(heap, id)
        .find_map(|owner| {
            heap.get(owner)?
                .properties
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.clone())
        })
        .unwrap_or_default()
}

/// `setProp(#prop, sub, value)`: write into the container held by `prop`,
/// creating an empty property list when the property is unset.
fn set_nested(vm: &mut LingoVM, id: InstanceId, prop: &str, sub: &Datum, value: Datum) {
    let mut container = ancestor::get_property(vm.heap(), id, prop);
    if container.is_void() {
        container = Datum::prop_list(Default::default());
        ancestor::set_property(vm.heap_mut(), id, prop, container.clone());
    }
    match &container {
        Datum::List(items) => {
            if let Some(i) = position(Some(sub)) {
                list::set_at(items, i, value);
            }
        }
        Datum::PropList(entries) => {
            entries.borrow_mut().insert(key_of(sub), value);
        }
        other => tracing::debug!(
            target: "lingo::vm",
            "setProp: #{prop} holds {}, not a container",
            other.type_name()
        ),
    }
}

fn index_into(container: &Datum, sub: &Datum) -> Datum {
    match container {
        Datum::List(items) => position(Some(sub))
            .and_then(|i| items.borrow().get(i).cloned())
            .unwrap_or_default(),
        Datum::PropList(entries) => {
            let key = key_of(sub);
            let entries = entries.borrow();
            entries
                .get(&key)
                .or_else(|| {
                    entries
                        .iter()
                        .find(|(k, _)| k.eq_ignore_ascii_case(&key))
                        .map(|(_, v)| v)
                })
                .cloned()
                .unwrap_or_default()
        }
        _ => Datum::Void,
    }
}

/// Instantiate each named script in order, link each new instance to the
/// next through `ancestor`, and make the first one the receiver's ancestor.
fn build_ancestor_chain(vm: &mut LingoVM, id: InstanceId, names: &[Datum]) {
    let mut first: Option<InstanceId> = None;
    let mut previous: Option<InstanceId> = None;

    for name in names.iter().take(MAX_ANCESTOR_DEPTH) {
        let name = name.to_lingo_string();
        let Some(script) = vm.script_ref_by_name(&name) else {
            tracing::warn!(target: "lingo::vm", "ancestor chain: no script named {name:?}");
            continue;
        };
        let created = match vm.invoke_builtin("new", &[Datum::Script(script)]) {
            Ok(Datum::Instance(created)) => created,
            Ok(other) => {
                tracing::warn!(
                    target: "lingo::vm",
                    "ancestor chain: new({name}) returned {}",
                    other.type_name()
                );
                continue;
            }
            Err(err) => {
                tracing::error!(target: "lingo::vm", "Error in new: {err}");
                vm.set_error_state(true);
                return;
            }
        };
        if let Some(prev) = previous {
            vm.set_instance_prop(prev, PROP_ANCESTOR, Datum::Instance(created));
        }
        first.get_or_insert(created);
        previous = Some(created);
    }

    if let Some(first) = first {
        vm.set_instance_prop(id, PROP_ANCESTOR, Datum::Instance(first));
    }
}
