//! Builtin functions.
//!
//! Builtins are looked up by lowercase name before any script handler, so a
//! host can override a default by registering the same name again.

use std::collections::HashMap;
use std::rc::Rc;

use lingo_common::{ChunkKind, Color, Datum, InstanceId, PropMap, ScriptRef};

use crate::ancestor;
use crate::chunks;
use crate::dispatch::{self, instance, list, prop_list, string};
use crate::error::VmError;
use crate::machine::LingoVM;

/// A builtin implementation. Arguments arrive unwrapped from their list.
pub type BuiltinFn = Rc<dyn Fn(&mut LingoVM, &[Datum]) -> Result<Datum, VmError>>;

/// Case-insensitive name to implementation map.
#[derive(Clone, Default)]
pub struct BuiltinRegistry {
    entries: HashMap<String, BuiltinFn>,
}

impl std::fmt::Debug for BuiltinRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltinRegistry")
            .field("len", &self.entries.len())
            .finish()
    }
}

impl BuiltinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every default builtin.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        register_control(&mut registry);
        register_construction(&mut registry);
        register_math(&mut registry);
        register_strings(&mut registry);
        register_collections(&mut registry);
        register_predicates(&mut registry);
        register_output(&mut registry);
        registry
    }

    pub fn register(
        &mut self,
        name: &str,
        f: impl Fn(&mut LingoVM, &[Datum]) -> Result<Datum, VmError> + 'static,
    ) {
        self.entries.insert(name.to_ascii_lowercase(), Rc::new(f));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    pub fn get(&self, name: &str) -> Option<BuiltinFn> {
        self.entries.get(&name.to_ascii_lowercase()).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn arg(args: &[Datum], index: usize) -> Datum {
    args.get(index).cloned().unwrap_or_default()
}

fn int_arg(args: &[Datum], index: usize) -> i32 {
    args.get(index).map_or(0, Datum::to_int)
}

/// Handler name from a symbol or string argument.
fn name_arg(args: &[Datum], index: usize) -> String {
    args.get(index).map(Datum::to_lingo_string).unwrap_or_default()
}

// ---- Control flow ----

fn register_control(r: &mut BuiltinRegistry) {
    r.register("return", |vm, args| {
        let value = arg(args, 0);
        if let Some(scope) = vm.current_scope_mut() {
            scope.set_return_value(value.clone());
        }
        Ok(value)
    });
    r.register("abort", |vm, _| {
        tracing::debug!(target: "lingo::vm", "abort in {}", vm.current_handler_name());
        vm.set_error_state(true);
        Ok(Datum::Void)
    });
    r.register("halt", |vm, _| {
        tracing::debug!(target: "lingo::vm", "halt in {}", vm.current_handler_name());
        vm.set_error_state(true);
        Ok(Datum::Void)
    });
    r.register("nothing", |_, _| Ok(Datum::Void));
    r.register("param", |vm, args| {
        let n = int_arg(args, 0);
        Ok(match (vm.current_scope(), usize::try_from(n - 1)) {
            (Some(scope), Ok(index)) => scope.param(index),
            _ => Datum::Void,
        })
    });
    r.register("pass", |vm, _| {
        vm.pass();
        Ok(Datum::Void)
    });
    r.register("call", call);
    r.register("callAncestor", call_ancestor);
}

/// Instances addressed by a `call` or `callAncestor` target.
fn instance_targets(target: &Datum) -> Vec<InstanceId> {
    let pick = |d: &Datum| match d {
        Datum::Instance(id) => Some(*id),
        _ => None,
    };
    match target {
        Datum::Instance(id) => vec![*id],
        Datum::List(items) => items.borrow().iter().filter_map(pick).collect(),
        Datum::PropList(entries) => entries.borrow().values().filter_map(pick).collect(),
        _ => Vec::new(),
    }
}

/// `call(#handler, target, args...)`: run the handler on every instance in
/// `target` that has one. Each call's errors are contained.
fn call(vm: &mut LingoVM, args: &[Datum]) -> Result<Datum, VmError> {
    let name = name_arg(args, 0);
    let target = arg(args, 1);
    let rest = args.get(2..).unwrap_or_default();

    if let Datum::Script(script) = target {
        return match vm.find_handler_in_script(script, &name) {
            Some(location) => Ok(vm.execute_contained(&location, rest, target.clone())),
            None => Ok(Datum::Void),
        };
    }

    let mut result = Datum::Void;
    for id in instance_targets(&target) {
        if vm.error_state() {
            break;
        }
        if let Some(location) = vm.find_instance_handler(id, &name) {
            result = vm.execute_contained(&location, rest, Datum::Instance(id));
        }
    }
    Ok(result)
}

/// `callAncestor(#handler, me, args...)`: skip past the chain level whose
/// script is running and call the handler from its ancestor onwards, still
/// with `me` as the receiver.
fn call_ancestor(vm: &mut LingoVM, args: &[Datum]) -> Result<Datum, VmError> {
    let name = name_arg(args, 0);
    let rest = args.get(2..).unwrap_or_default();
    let running = vm.current_scope().map(|s| s.location().script_ref());

    let mut result = Datum::Void;
    for me in instance_targets(&arg(args, 1)) {
        let level = running
            .and_then(|script| {
                ancestor::chain(vm.heap(), me)
                    .find(|id| vm.heap().get(*id).and_then(|inst| inst.script) == Some(script))
            })
            .unwrap_or(me);
        let Some(start) = vm.heap().ancestor(level) else {
            tracing::debug!(target: "lingo::call", "callAncestor #{name}: no ancestor");
            continue;
        };
        if let Some(location) = vm.find_instance_handler(start, &name) {
            result = vm.execute_handler(&location, rest, Some(Datum::Instance(me)))?;
        }
    }
    Ok(result)
}

// ---- Construction ----

fn register_construction(r: &mut BuiltinRegistry) {
    r.register("new", |vm, args| match arg(args, 0) {
        Datum::Script(script) => instantiate(vm, script, args.get(1..).unwrap_or_default()),
        Datum::Instance(id) => Ok(vm
            .heap_mut()
            .shallow_clone(id)
            .map_or(Datum::Void, Datum::Instance)),
        other => {
            tracing::debug!(target: "lingo::vm", "new: cannot instantiate {}", other.type_name());
            Ok(Datum::Void)
        }
    });
    r.register("point", |_, args| Ok(Datum::point(int_arg(args, 0), int_arg(args, 1))));
    r.register("rect", |_, args| {
        Ok(Datum::rect(
            int_arg(args, 0),
            int_arg(args, 1),
            int_arg(args, 2),
            int_arg(args, 3),
        ))
    });
    r.register("color", |_, args| {
        Ok(Datum::Color(Color::clamped(
            int_arg(args, 0),
            int_arg(args, 1),
            int_arg(args, 2),
        )))
    });
    r.register("list", |_, args| Ok(Datum::list(args.to_vec())));
    r.register("symbol", |_, args| {
        Ok(match arg(args, 0) {
            sym @ Datum::Symbol(_) => sym,
            Datum::Void => Datum::Void,
            other => {
                let name = other.to_lingo_string();
                if name.is_empty() {
                    Datum::Void
                } else {
                    Datum::symbol(name)
                }
            }
        })
    });
    r.register("script", |vm, args| {
        Ok(match arg(args, 0) {
            Datum::Int(v) if v > 0xFFFF => Datum::Script(ScriptRef::new(v >> 16, v & 0xFFFF)),
            Datum::Int(v) => {
                let cast_lib = vm.movie().map_or(1, |m| m.number);
                Datum::Script(ScriptRef::new(cast_lib, v))
            }
            s @ Datum::Script(_) => s,
            Datum::Void => Datum::Void,
            other => vm
                .script_ref_by_name(&other.to_lingo_string())
                .map_or(Datum::Void, Datum::Script),
        })
    });
    r.register("member", member);
    r.register("castLib", |vm, args| {
        let Some(provider) = vm.provider() else {
            return Ok(Datum::Void);
        };
        let number = match arg(args, 0) {
            n @ (Datum::Int(_) | Datum::Float(_)) => provider.cast_lib_by_number(n.to_int()),
            Datum::CastLib(n) => n,
            s @ (Datum::Str(_) | Datum::Symbol(_)) => provider.cast_lib_by_name(&s.to_lingo_string()),
            _ => 0,
        };
        Ok(if number > 0 {
            Datum::CastLib(number)
        } else {
            Datum::Void
        })
    });
}

/// Allocate an instance of `script` and run its `new` handler on it.
fn instantiate(vm: &mut LingoVM, script: ScriptRef, args: &[Datum]) -> Result<Datum, VmError> {
    let properties: PropMap = vm
        .script_property_names(script)
        .into_iter()
        .map(|name| (name, Datum::Void))
        .collect();
    let id = vm.heap_mut().alloc(Some(script), properties);
    let instance = Datum::Instance(id);

    if let Some(location) = vm.find_handler_in_script(script, "new") {
        let result = vm.execute_handler(&location, args, Some(instance.clone()))?;
        if !result.is_void() {
            return Ok(result);
        }
    }
    Ok(instance)
}

/// `member(number|name [, castLib])`.
fn member(vm: &mut LingoVM, args: &[Datum]) -> Result<Datum, VmError> {
    let which = arg(args, 0);
    let cast_lib = match arg(args, 1) {
        Datum::CastLib(n) => n,
        other => other.to_int(),
    };
    let by_number = |number: i32| {
        if cast_lib > 0 {
            Datum::CastMember {
                cast_lib,
                member: number,
            }
        } else if number > 0xFFFF {
            Datum::CastMember {
                cast_lib: number >> 16,
                member: number & 0xFFFF,
            }
        } else {
            Datum::CastMember {
                cast_lib: 1,
                member: number,
            }
        }
    };
    Ok(match which {
        Datum::Int(_) | Datum::Float(_) => by_number(which.to_int()),
        m @ Datum::CastMember { .. } => m,
        Datum::Str(_) | Datum::Symbol(_) => match vm.provider() {
            Some(provider) => provider.member_by_name(cast_lib, &which.to_lingo_string()),
            None => Datum::Void,
        },
        _ => Datum::Void,
    })
}

// ---- Math ----

fn register_math(r: &mut BuiltinRegistry) {
    r.register("abs", |_, args| {
        Ok(match arg(args, 0) {
            Datum::Float(f) => Datum::Float(f.abs()),
            other => Datum::Int(other.to_int().wrapping_abs()),
        })
    });
    r.register("sqrt", |_, args| Ok(Datum::Float(arg(args, 0).to_float().sqrt())));
    r.register("sin", |_, args| Ok(Datum::Float(arg(args, 0).to_float().sin())));
    r.register("cos", |_, args| Ok(Datum::Float(arg(args, 0).to_float().cos())));
    r.register("integer", |_, args| Ok(to_integer(&arg(args, 0))));
    r.register("float", |_, args| {
        Ok(match arg(args, 0) {
            Datum::Int(i) => Datum::Float(i as f64),
            f @ Datum::Float(_) => f,
            Datum::Str(s) => match s.trim().parse::<f64>() {
                Ok(f) => Datum::Float(f),
                Err(_) => Datum::Str(s),
            },
            Datum::Void => Datum::Void,
            other => Datum::Float(other.to_float()),
        })
    });
}

/// `integer()`: floats round half away from zero, numeric text parses,
/// anything else is void.
fn to_integer(value: &Datum) -> Datum {
    match value {
        Datum::Int(i) => Datum::Int(*i),
        Datum::Float(f) => Datum::Int(f.round() as i32),
        Datum::Str(s) => {
            let text = s.trim();
            if let Ok(i) = text.parse::<i32>() {
                Datum::Int(i)
            } else if let Ok(f) = text.parse::<f64>() {
                Datum::Int(f.round() as i32)
            } else {
                Datum::Void
            }
        }
        _ => Datum::Void,
    }
}

// ---- Strings ----

fn register_strings(r: &mut BuiltinRegistry) {
    r.register("string", |_, args| Ok(Datum::string(arg(args, 0).to_lingo_string())));
    r.register("length", |_, args| {
        let n = match arg(args, 0) {
            Datum::Void => 0,
            Datum::List(items) => items.borrow().len(),
            Datum::PropList(entries) => entries.borrow().len(),
            other => other.to_lingo_string().chars().count(),
        };
        Ok(Datum::Int(n as i32))
    });
    r.register("chars", |vm, args| {
        let s = arg(args, 0).to_lingo_string();
        let first = int_arg(args, 1);
        let last = args.get(2).map_or(first, Datum::to_int);
        if first < 1 || last < first {
            return Ok(Datum::string(""));
        }
        let text = chunks::get_range(&s, ChunkKind::Char, first, last, vm.item_delimiter());
        Ok(Datum::string(text))
    });
    r.register("charToNum", |_, args| {
        let code = arg(args, 0).to_lingo_string().chars().next().map_or(0, |c| c as i32);
        Ok(Datum::Int(code))
    });
    r.register("numToChar", |_, args| {
        let c = u32::try_from(int_arg(args, 0)).ok().and_then(char::from_u32);
        Ok(Datum::string(c.map(String::from).unwrap_or_default()))
    });
    r.register("offset", |_, args| {
        let needle = arg(args, 0).to_lingo_string().to_lowercase();
        let haystack = arg(args, 1).to_lingo_string().to_lowercase();
        Ok(Datum::Int(char_offset(&needle, &haystack)))
    });
}

/// 1-based character position of `needle` in `haystack`, 0 when absent.
fn char_offset(needle: &str, haystack: &str) -> i32 {
    if needle.is_empty() {
        return 0;
    }
    haystack
        .find(needle)
        .map_or(0, |byte| haystack[..byte].chars().count() as i32 + 1)
}

// ---- Collections ----

const COLLECTION_METHODS: [&str; 18] = [
    "count", "getAt", "setAt", "addAt", "deleteAt", "append", "add", "getaProp", "setaProp",
    "addProp", "deleteProp", "getPropAt", "findPos", "getOne", "getPos", "deleteOne", "sort",
    "getLast",
];

fn register_collections(r: &mut BuiltinRegistry) {
    for method in COLLECTION_METHODS {
        r.register(method, move |vm, args| collection_call(vm, method, args));
    }
}

/// Route `method(target, args...)` to the target's own method table.
///
/// Only container kinds are routed; the generic method dispatcher falls back
/// to builtins and would call straight back here.
fn collection_call(vm: &mut LingoVM, method: &str, args: &[Datum]) -> Result<Datum, VmError> {
    let Some((target, rest)) = args.split_first() else {
        return Ok(Datum::Void);
    };
    Ok(match target {
        Datum::List(items) => list::dispatch(vm, items, method, rest),
        Datum::PropList(entries) => prop_list::dispatch(vm, entries, method, rest),
        Datum::Str(s) => string::dispatch(vm, s, method, rest),
        Datum::Instance(id) => instance::dispatch(vm, *id, method, rest),
        Datum::Point(_) | Datum::Rect(_) if method.eq_ignore_ascii_case("getAt") => {
            dispatch::dispatch_method(vm, target, method, rest)?
        }
        Datum::Point(_) if method.eq_ignore_ascii_case("count") => Datum::Int(2),
        Datum::Rect(_) if method.eq_ignore_ascii_case("count") => Datum::Int(4),
        other => {
            tracing::trace!(target: "lingo::vm", "{method}: not a container: {}", other.type_name());
            Datum::Void
        }
    })
}

// ---- Type predicates ----

fn register_predicates(r: &mut BuiltinRegistry) {
    r.register("voidp", |_, args| Ok(Datum::bool(arg(args, 0).is_void())));
    r.register("objectp", |_, args| {
        let is_object = !matches!(
            arg(args, 0),
            Datum::Void | Datum::Int(_) | Datum::Float(_) | Datum::Str(_) | Datum::Symbol(_)
        );
        Ok(Datum::bool(is_object))
    });
    r.register("listp", |_, args| {
        Ok(Datum::bool(matches!(arg(args, 0), Datum::List(_) | Datum::PropList(_))))
    });
    r.register("stringp", |_, args| Ok(Datum::bool(matches!(arg(args, 0), Datum::Str(_)))));
    r.register("integerp", |_, args| Ok(Datum::bool(matches!(arg(args, 0), Datum::Int(_)))));
    r.register("floatp", |_, args| Ok(Datum::bool(matches!(arg(args, 0), Datum::Float(_)))));
    r.register("symbolp", |_, args| Ok(Datum::bool(matches!(arg(args, 0), Datum::Symbol(_)))));
    r.register("ilk", |_, args| {
        let value = arg(args, 0);
        let ilk = value.ilk();
        Ok(match args.get(1) {
            None => Datum::symbol(ilk),
            Some(wanted) => {
                let wanted = wanted.to_lingo_string();
                let matches = ilk.eq_ignore_ascii_case(&wanted)
                    || (wanted.eq_ignore_ascii_case("list") && matches!(value, Datum::PropList(_)));
                Datum::bool(matches)
            }
        })
    });
}

// ---- Output ----

fn joined(args: &[Datum]) -> String {
    args.iter()
        .map(Datum::to_lingo_string)
        .collect::<Vec<_>>()
        .join(" ")
}

fn register_output(r: &mut BuiltinRegistry) {
    r.register("put", |_, args| {
        tracing::info!(target: "lingo::put", "{}", joined(args));
        Ok(Datum::Void)
    });
    r.register("alert", |_, args| {
        tracing::warn!(target: "lingo::put", "alert: {}", joined(args));
        Ok(Datum::Void)
    });
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lingo_common::{Script, ScriptKind, ScriptLibrary};

    use super::*;

    fn call(vm: &mut LingoVM, name: &str, args: &[Datum]) -> Datum {
        vm.invoke_builtin(name, args).unwrap()
    }

    #[test]
    fn registry_ignores_case() {
        let registry = BuiltinRegistry::with_defaults();
        assert!(registry.contains("CHARTONUM"));
        assert!(registry.contains("callancestor"));
        assert!(!registry.contains("frobnicate"));
        assert!(registry.get("GetAt").is_some());
    }

    #[test]
    fn host_builtins_override_defaults() {
        let mut vm = LingoVM::new();
        vm.register_builtin("abs", |_, _| Ok(Datum::Int(99)));
        assert_eq!(call(&mut vm, "ABS", &[Datum::Int(-1)]), Datum::Int(99));
        vm.register_builtin("fail", |_, _| Err(VmError::script("nope")));
        assert!(vm.invoke_builtin("fail", &[]).is_err());
    }

    #[test]
    fn math() {
        let mut vm = LingoVM::new();
        assert_eq!(call(&mut vm, "abs", &[Datum::Int(-4)]), Datum::Int(4));
        assert_eq!(call(&mut vm, "abs", &[Datum::Float(-1.5)]), Datum::Float(1.5));
        assert_eq!(call(&mut vm, "sqrt", &[Datum::Int(9)]), Datum::Float(3.0));
        assert_eq!(call(&mut vm, "integer", &[Datum::Float(2.5)]), Datum::Int(3));
        assert_eq!(call(&mut vm, "integer", &[Datum::string("7")]), Datum::Int(7));
        assert_eq!(call(&mut vm, "integer", &[Datum::string("abc")]), Datum::Void);
        assert_eq!(call(&mut vm, "float", &[Datum::Int(2)]), Datum::Float(2.0));
        assert_eq!(call(&mut vm, "float", &[Datum::string("x")]), Datum::string("x"));
        assert_eq!(call(&mut vm, "sin", &[Datum::Int(0)]), Datum::Float(0.0));
    }

    #[test]
    fn strings() {
        let mut vm = LingoVM::new();
        assert_eq!(call(&mut vm, "string", &[Datum::symbol("go")]), Datum::string("go"));
        assert_eq!(call(&mut vm, "length", &[Datum::string("héllo")]), Datum::Int(5));
        assert_eq!(
            call(&mut vm, "chars", &[Datum::string("hello"), Datum::Int(2), Datum::Int(4)]),
            Datum::string("ell")
        );
        assert_eq!(call(&mut vm, "charToNum", &[Datum::string("A")]), Datum::Int(65));
        assert_eq!(call(&mut vm, "charToNum", &[Datum::string("")]), Datum::Int(0));
        assert_eq!(call(&mut vm, "numToChar", &[Datum::Int(97)]), Datum::string("a"));
        assert_eq!(
            call(&mut vm, "offset", &[Datum::string("LO"), Datum::string("hello")]),
            Datum::Int(4)
        );
        assert_eq!(
            call(&mut vm, "offset", &[Datum::string("z"), Datum::string("hello")]),
            Datum::Int(0)
        );
    }

    #[test]
    fn collections_route_to_the_target() {
        let mut vm = LingoVM::new();
        let list = Datum::list(vec![Datum::Int(3), Datum::Int(1)]);
        assert_eq!(call(&mut vm, "count", &[list.clone()]), Datum::Int(2));
        call(&mut vm, "append", &[list.clone(), Datum::Int(2)]);
        call(&mut vm, "sort", &[list.clone()]);
        assert_eq!(list.to_string(), "[1, 2, 3]");

        let props = Datum::prop_list_from([("a", Datum::Int(1))]);
        call(&mut vm, "addProp", &[props.clone(), Datum::symbol("b"), Datum::Int(2)]);
        assert_eq!(call(&mut vm, "getaProp", &[props.clone(), Datum::symbol("b")]), Datum::Int(2));
        assert_eq!(call(&mut vm, "count", &[Datum::string("abc")]), Datum::Int(3));
        assert_eq!(call(&mut vm, "count", &[Datum::point(1, 2)]), Datum::Int(2));
    }

    #[test]
    fn collection_builtins_on_scalars_yield_void() {
        let mut vm = LingoVM::new();
        assert_eq!(call(&mut vm, "count", &[Datum::Int(5)]), Datum::Void);
        assert_eq!(call(&mut vm, "getAt", &[Datum::symbol("x"), Datum::Int(1)]), Datum::Void);
        assert_eq!(call(&mut vm, "count", &[]), Datum::Void);
    }

    #[test]
    fn predicates() {
        let mut vm = LingoVM::new();
        assert_eq!(call(&mut vm, "voidp", &[]), Datum::Int(1));
        assert_eq!(call(&mut vm, "objectp", &[Datum::list(vec![])]), Datum::Int(1));
        assert_eq!(call(&mut vm, "objectp", &[Datum::Int(1)]), Datum::Int(0));
        assert_eq!(call(&mut vm, "listp", &[Datum::prop_list(PropMap::new())]), Datum::Int(1));
        assert_eq!(call(&mut vm, "ilk", &[Datum::Float(1.0)]), Datum::symbol("float"));
        assert_eq!(
            call(&mut vm, "ilk", &[Datum::prop_list(PropMap::new()), Datum::symbol("list")]),
            Datum::Int(1)
        );
    }

    #[test]
    fn construction() {
        let mut vm = LingoVM::new();
        assert_eq!(call(&mut vm, "point", &[Datum::Int(1), Datum::Int(2)]), Datum::point(1, 2));
        assert_eq!(
            call(&mut vm, "color", &[Datum::Int(300), Datum::Int(-1), Datum::Int(7)]),
            Datum::Color(Color { r: 255, g: 0, b: 7 })
        );
        assert_eq!(call(&mut vm, "symbol", &[Datum::string("go")]), Datum::symbol("go"));
        assert_eq!(
            call(&mut vm, "member", &[Datum::Int(3), Datum::Int(2)]),
            Datum::CastMember { cast_lib: 2, member: 3 }
        );
        assert_eq!(
            call(&mut vm, "script", &[Datum::Int(0x0002_0005)]),
            Datum::Script(ScriptRef::new(2, 5))
        );
    }

    #[test]
    fn new_predeclares_properties() {
        let mut vm = LingoVM::new();
        let mut lib = ScriptLibrary::new(1, "Internal", 1200);
        let p = lib.names.intern("pName");
        let mut script = Script::new(4, ScriptKind::Parent);
        script.property_name_ids.push(p);
        lib.scripts.push(Arc::new(script));
        vm.set_movie(lib);

        let made = call(&mut vm, "new", &[Datum::Script(ScriptRef::new(1, 4))]);
        let Datum::Instance(id) = made else {
            panic!("expected an instance, got {made:?}");
        };
        let inst = vm.heap().get(id).unwrap();
        assert_eq!(inst.script, Some(ScriptRef::new(1, 4)));
        assert_eq!(inst.properties.get("pName"), Some(&Datum::Void));
        assert_eq!(call(&mut vm, "new", &[Datum::Int(3)]), Datum::Void);
    }

    #[test]
    fn abort_enters_the_stop_state() {
        let mut vm = LingoVM::new();
        call(&mut vm, "abort", &[]);
        assert!(vm.error_state());
    }
}
