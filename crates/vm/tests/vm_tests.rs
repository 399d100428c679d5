//! Integration tests for the Lingo VM.
//!
//! Handlers are written in assembly and run through the public interface.
//! Organized by concern: calls and limits, arithmetic, strings, collections,
//! objects and ancestors, hosts, then property tests.

use std::cell::RefCell;
use std::rc::Rc;

use lingo_assembler::assemble;
use lingo_common::{Datum, InstanceHeap, InstanceId, PropMap, ScriptLibrary, PROP_ANCESTOR};
use lingo_vm::ancestor::{self, MAX_ANCESTOR_DEPTH};
use lingo_vm::dispatch::dispatch_method;
use lingo_vm::{
    AddAtPolicy, HandlerInfo, InstructionInfo, LingoVM, StaticCastLibs, TraceListener, VmConfig,
    VmError,
};
use proptest::prelude::*;

// ============================================================
// Helpers
// ============================================================

fn library(text: &str) -> ScriptLibrary {
    match assemble(text) {
        Ok(lib) => lib,
        Err(err) => panic!("assembly failed: {err}"),
    }
}

fn vm_with(text: &str) -> LingoVM {
    let mut vm = LingoVM::new();
    vm.set_movie(library(text));
    vm
}

fn instance_id(d: &Datum) -> InstanceId {
    match d {
        Datum::Instance(id) => *id,
        other => panic!("expected an instance, got {other:?}"),
    }
}

fn items(d: &Datum) -> Vec<Datum> {
    match d {
        Datum::List(items) => items.borrow().clone(),
        other => panic!("expected a list, got {other:?}"),
    }
}

fn int_list(values: impl IntoIterator<Item = i32>) -> Datum {
    Datum::list(values.into_iter().map(Datum::Int).collect())
}

/// Instance handles in `heap`, each linked to the next; the last links
/// back to the first when `cyclic`.
fn linked_chain(heap: &mut InstanceHeap, len: usize, cyclic: bool) -> Vec<InstanceId> {
    let ids: Vec<InstanceId> = (0..len).map(|_| heap.alloc(None, PropMap::new())).collect();
    for (i, id) in ids.iter().enumerate() {
        let next = match ids.get(i + 1) {
            Some(next) => *next,
            None if cyclic => ids[0],
            None => break,
        };
        if let Some(inst) = heap.get_mut(*id) {
            inst.properties
                .insert(PROP_ANCESTOR.to_string(), Datum::Instance(next));
        }
    }
    ids
}

const COUNTERS: &str = "\
script 1 movie \"Counters\"
  handler dive
    GET_GLOBAL #gDepth
    PUSH_INT8 1
    ADD
    SET_GLOBAL #gDepth
    PUSH_ARG_LIST 0
    EXT_CALL #dive
    RET
  end
  handler tick
    GET_GLOBAL #gTicks
    PUSH_INT8 1
    ADD
    SET_GLOBAL #gTicks
    GET_GLOBAL #gTicks
    RET
  end
  handler spin
    @top:
    PUSH_ZERO
    POP 1
    END_REPEAT @top
  end
  handler go
    PUSH_CONS \"Bomb\"
    PUSH_ARG_LIST 1
    EXT_CALL #script
    PUSH_ARG_LIST 1
    EXT_CALL #new
    PUSH_ARG_LIST 1
    OBJ_CALL #explode
    PUSH_INT8 7
    RET
  end
end
script 2 parent \"Bomb\"
  handler explode me
    PUSH_INT8 1
    PUSH_ZERO
    DIV
    RET
  end
end
";

// ============================================================
// Calls and limits
// ============================================================

#[test]
fn recursion_overflows_on_the_51st_activation() {
    let mut vm = vm_with(COUNTERS);
    let err = vm.call_handler("dive", &[]).unwrap_err();
    assert_eq!(
        err,
        VmError::CallStackOverflow {
            handler: "dive".into(),
            depth: 50
        }
    );
    assert_eq!(vm.global("gDepth"), Datum::Int(50));
    assert_eq!(vm.call_depth(), 0);
    assert!(!vm.error_state());
}

#[test]
fn call_depth_follows_the_config() {
    let mut vm = LingoVM::with_config(VmConfig {
        max_call_depth: 5,
        ..VmConfig::default()
    });
    vm.set_movie(library(COUNTERS));
    assert!(matches!(
        vm.call_handler("dive", &[]),
        Err(VmError::CallStackOverflow { depth: 5, .. })
    ));
    assert_eq!(vm.global("gDepth"), Datum::Int(5));
}

#[test]
fn instance_errors_are_contained_and_stop_the_vm() {
    let mut vm = vm_with(COUNTERS);
    let result = vm.call_handler("go", &[]).unwrap();
    assert_eq!(result, Datum::Void);
    assert!(vm.error_state());

    // Nothing runs until the host clears the stop state.
    assert_eq!(vm.call_handler("tick", &[]), Ok(Datum::Void));
    assert_eq!(vm.global("gTicks"), Datum::Void);

    vm.set_error_state(false);
    assert_eq!(vm.call_handler("tick", &[]), Ok(Datum::Int(1)));
}

#[test]
fn direct_calls_propagate_errors() {
    let mut vm = vm_with(COUNTERS);
    let bomb = vm.invoke_builtin("script", &[Datum::string("Bomb")]).unwrap();
    let instance = vm.invoke_builtin("new", &[bomb]).unwrap();
    let err = vm
        .call_handler_with_receiver("explode", &[], instance)
        .unwrap_err();
    assert_eq!(
        err,
        VmError::DivisionByZero {
            handler: "explode".into(),
            at: 3
        }
    );
    assert!(!vm.error_state());
}

#[test]
fn step_limit_stops_runaway_loops() {
    let mut vm = vm_with(COUNTERS);
    vm.set_step_limit(100);
    match vm.call_handler("spin", &[]) {
        Err(VmError::StepLimitExceeded { handler, limit, .. }) => {
            assert_eq!(handler, "spin");
            assert_eq!(limit, 100);
        }
        other => panic!("expected a step limit error, got {other:?}"),
    }
    assert_eq!(vm.call_depth(), 0);

    // The limit is per invocation: short handlers still run.
    assert_eq!(vm.call_handler("tick", &[]), Ok(Datum::Int(1)));
}

const BULK: &str = "\
script 1 movie
  handler drain
    PUSH_INT8 9
    POP 400000000
    PUSH_INT8 1
    RET
  end
  handler gather
    PUSH_INT8 7
    PUSH_INT8 8
    PUSH_ARG_LIST 400000000
    PUSH_LIST
    RET
  end
  handler overlap
    PUSH_INT8 40
    PUSH_INT8 1
    PUSH_INT8 2
    ONTO_SPR
    ADD
    PUSH_INT8 3
    PUSH_INT8 4
    INTO_SPR
    ADD
    RET
  end
end
";

#[test]
fn oversized_stack_counts_stop_at_the_stack_depth() {
    let mut vm = vm_with(BULK);
    vm.set_step_limit(8);
    let started = std::time::Instant::now();

    assert_eq!(vm.call_handler("drain", &[]), Ok(Datum::Int(1)));
    let gathered = vm.call_handler("gather", &[]).unwrap();
    assert_eq!(items(&gathered), vec![Datum::Int(7), Datum::Int(8)]);

    assert!(started.elapsed() < std::time::Duration::from_secs(2));
}

#[test]
fn sprite_overlap_tests_are_false_without_a_stage() {
    let mut vm = vm_with(BULK);
    assert_eq!(vm.call_handler("overlap", &[]), Ok(Datum::Int(40)));
}

#[test]
fn missing_handlers_yield_void() {
    let mut vm = vm_with(COUNTERS);
    assert_eq!(vm.call_handler("noSuchHandler", &[]), Ok(Datum::Void));
}

// ============================================================
// Variables and arithmetic
// ============================================================

const SUM_BODY: &str = "\
script 1 movie
  handler sum a, b
    local t
    GET_PARAM a
    GET_PARAM b
    ADD
    SET_LOCAL t
    GET_LOCAL t
    RET
  end
end
";

#[test]
fn variable_slots_follow_the_library_multiplier() {
    for (header, multiplier) in [
        ("library 1 \"M\" version=1200\n", 8),
        ("library 1 \"M\" version=400\n", 6),
        ("library 1 \"M\" version=1200 capitalx\n", 1),
    ] {
        let lib = library(&format!("{header}{SUM_BODY}"));
        assert_eq!(lib.variable_multiplier(), multiplier);
        assert_eq!(lib.scripts[0].handlers[0].instructions[1].argument, multiplier);

        let mut vm = LingoVM::new();
        vm.set_movie(lib);
        let result = vm.call_handler("sum", &[Datum::Int(2), Datum::Int(3)]);
        assert_eq!(result, Ok(Datum::Int(5)), "{header}");
    }
}

#[test]
fn arithmetic_promotes_to_float() {
    let mut vm = vm_with(
        "\
script 1 movie
  handler mixed
    PUSH_INT8 2
    PUSH_FLOAT32 3.5
    ADD
    RET
  end
  handler ints
    PUSH_INT8 2
    PUSH_INT8 3
    ADD
    RET
  end
  handler quotient
    PUSH_INT8 7
    PUSH_INT8 2
    DIV
    RET
  end
end
",
    );
    assert_eq!(vm.call_handler("mixed", &[]), Ok(Datum::Float(5.5)));
    assert_eq!(vm.call_handler("ints", &[]), Ok(Datum::Int(5)));
    assert_eq!(vm.call_handler("quotient", &[]), Ok(Datum::Int(3)));
}

#[test]
fn division_and_modulo_by_zero_fail_for_any_dividend() {
    let mut vm = vm_with(
        "\
script 1 movie
  handler divide a, b
    GET_PARAM a
    GET_PARAM b
    DIV
    RET
  end
  handler remainder a, b
    GET_PARAM a
    GET_PARAM b
    MOD
    RET
  end
end
",
    );
    for x in [Datum::Int(1), Datum::Float(2.5), Datum::string("x")] {
        let args = [x.clone(), Datum::Int(0)];
        assert_eq!(
            vm.call_handler("divide", &args),
            Err(VmError::DivisionByZero {
                handler: "divide".into(),
                at: 4
            })
        );
        assert_eq!(
            vm.call_handler("remainder", &args),
            Err(VmError::ModuloByZero {
                handler: "remainder".into(),
                at: 4
            })
        );
    }
    assert_eq!(
        vm.call_handler("remainder", &[Datum::Int(7), Datum::Int(3)]),
        Ok(Datum::Int(1))
    );
}

// ============================================================
// Strings and chunks
// ============================================================

const CHUNKS: &str = "\
script 1 movie
  handler item n, s
    PUSH_ZERO
    PUSH_ZERO
    PUSH_ZERO
    PUSH_ZERO
    GET_PARAM n
    GET_PARAM n
    PUSH_ZERO
    PUSH_ZERO
    GET_PARAM s
    GET_CHUNK
    RET
  end
  handler has s, part
    GET_PARAM s
    GET_PARAM part
    CONTAINS_STR
    RET
  end
end
";

#[test]
fn empty_items_are_preserved() {
    let mut vm = vm_with(CHUNKS);
    let s = Datum::string("a,b,,d");
    assert_eq!(vm.call_handler("item", &[Datum::Int(3), s.clone()]), Ok(Datum::string("")));
    assert_eq!(vm.call_handler("item", &[Datum::Int(4), s.clone()]), Ok(Datum::string("d")));

    let item = Datum::symbol("item");
    assert_eq!(vm.invoke_builtin("count", &[s.clone(), item.clone()]), Ok(Datum::Int(4)));
    assert_eq!(
        dispatch_method(&mut vm, &s, "getProp", &[item, Datum::Int(3)]),
        Ok(Datum::string(""))
    );
}

#[test]
fn item_delimiter_is_configurable() {
    let mut vm = vm_with(CHUNKS);
    vm.set_item_delimiter(';');
    let s = Datum::string("x;y,z");
    assert_eq!(vm.call_handler("item", &[Datum::Int(2), s]), Ok(Datum::string("y,z")));
}

#[test]
fn contains_ignores_case() {
    let mut vm = vm_with(CHUNKS);
    let args = [Datum::string("Hello World"), Datum::string("WORLD")];
    assert_eq!(vm.call_handler("has", &args), Ok(Datum::Int(1)));
    let args = [Datum::string("Hello"), Datum::string("bye")];
    assert_eq!(vm.call_handler("has", &args), Ok(Datum::Int(0)));
}

// ============================================================
// Collections
// ============================================================

#[test]
fn find_pos_is_case_insensitive_and_one_based() {
    let mut vm = vm_with(
        "\
script 1 movie
  handler find key
    PUSH_SYMB #pName
    PUSH_CONS \"Ann\"
    PUSH_SYMB #pAge
    PUSH_INT8 30
    PUSH_ARG_LIST 4
    PUSH_PROP_LIST
    GET_PARAM key
    PUSH_ARG_LIST 2
    OBJ_CALL #findPos
    RET
  end
end
",
    );
    assert_eq!(vm.call_handler("find", &[Datum::string("PAGE")]), Ok(Datum::Int(2)));
    assert_eq!(vm.call_handler("find", &[Datum::symbol("pname")]), Ok(Datum::Int(1)));
    assert_eq!(vm.call_handler("find", &[Datum::symbol("pMissing")]), Ok(Datum::Void));
}

#[test]
fn list_builtins_mutate_in_place() {
    let mut vm = LingoVM::new();
    let list = int_list([3, 1, 2]);
    vm.invoke_builtin("append", &[list.clone(), Datum::Int(0)]).unwrap();
    vm.invoke_builtin("sort", &[list.clone()]).unwrap();
    assert_eq!(items(&list), items(&int_list([0, 1, 2, 3])));
    assert_eq!(vm.invoke_builtin("getLast", &[list.clone()]), Ok(Datum::Int(3)));
    vm.invoke_builtin("deleteAt", &[list.clone(), Datum::Int(1)]).unwrap();
    assert_eq!(vm.invoke_builtin("count", &[list]), Ok(Datum::Int(3)));
}

// ============================================================
// Objects and ancestors
// ============================================================

const FAMILY: &str = "\
script 1 movie \"Main\"
  handler makeChild
    PUSH_CONS \"Child\"
    PUSH_ARG_LIST 1
    EXT_CALL #script
    PUSH_ARG_LIST 1
    EXT_CALL #new
    RET
  end
end
script 2 parent \"Base\"
  property pName
  handler describe me
    PUSH_CONS \"base\"
    RET
  end
  handler greet me
    PUSH_CONS \"hello \"
    GET_PROP #pName
    JOIN_STR
    RET
  end
  handler rename me, name
    GET_PARAM name
    SET_PROP #pName
    RET_FACTORY
  end
  handler bump me
    GET_GLOBAL #gBumps
    PUSH_INT8 1
    ADD
    SET_GLOBAL #gBumps
    GET_GLOBAL #gBumps
    RET
  end
end
script 3 parent \"Child\"
  property pMood
  handler new me
    PUSH_CONS \"Base\"
    PUSH_ARG_LIST 1
    EXT_CALL #script
    PUSH_ARG_LIST 1
    EXT_CALL #new
    SET_PROP #ancestor
    GET_PARAM me
    RET
  end
  handler describe me
    PUSH_CONS \"child/\"
    PUSH_SYMB #describe
    GET_PARAM me
    PUSH_ARG_LIST 2
    EXT_CALL #callAncestor
    JOIN_STR
    RET
  end
end
";

#[test]
fn new_runs_the_constructor_and_links_the_ancestor() {
    let mut vm = vm_with(FAMILY);
    let child = vm.call_handler("makeChild", &[]).unwrap();
    let child_id = instance_id(&child);
    assert_eq!(vm.heap().len(), 2);

    let base_id = vm.heap().ancestor(child_id).unwrap();
    assert_eq!(vm.instance_prop(child_id, "pMood"), Datum::Void);
    assert!(vm.heap().get(child_id).unwrap().properties.contains_key("pMood"));
    assert!(vm.heap().get(base_id).unwrap().properties.contains_key("pName"));
    assert_eq!(ancestor::chain_depth(vm.heap(), child_id), 1);
}

#[test]
fn call_ancestor_skips_the_running_level() {
    let mut vm = vm_with(FAMILY);
    let child = vm.call_handler("makeChild", &[]).unwrap();
    let result = vm.call_handler_with_receiver("describe", &[], child);
    assert_eq!(result, Ok(Datum::string("child/base")));
}

#[test]
fn inherited_handlers_keep_me_and_write_through() {
    let mut vm = vm_with(FAMILY);
    let child = vm.call_handler("makeChild", &[]).unwrap();
    let child_id = instance_id(&child);
    let base_id = vm.heap().ancestor(child_id).unwrap();

    dispatch_method(&mut vm, &child, "rename", &[Datum::string("Kim")]).unwrap();
    assert_eq!(vm.instance_prop(base_id, "pName"), Datum::string("Kim"));
    assert!(!vm.heap().get(child_id).unwrap().properties.contains_key("pName"));

    let greeting = dispatch_method(&mut vm, &child, "greet", &[]).unwrap();
    assert_eq!(greeting, Datum::string("hello Kim"));

    // Unknown methods fall back to property lookup along the chain.
    let name = dispatch_method(&mut vm, &child, "pName", &[]).unwrap();
    assert_eq!(name, Datum::string("Kim"));
    assert_eq!(dispatch_method(&mut vm, &child, "nothingHere", &[]), Ok(Datum::Void));
}

#[test]
fn instance_pseudo_methods_win_over_handlers() {
    let mut vm = vm_with(FAMILY);
    let child = vm.call_handler("makeChild", &[]).unwrap();
    assert_eq!(dispatch_method(&mut vm, &child, "ilk", &[]), Ok(Datum::symbol("instance")));
    assert_eq!(dispatch_method(&mut vm, &child, "count", &[]), Ok(Datum::Int(2)));

    let ancestor = dispatch_method(&mut vm, &child, "getAt", &[Datum::symbol("ancestor")]).unwrap();
    assert!(matches!(ancestor, Datum::Instance(_)));
    let base = ancestor;
    assert_eq!(
        dispatch_method(&mut vm, &base, "getAt", &[Datum::symbol("ancestor")]),
        Ok(Datum::Int(0))
    );
}

#[test]
fn call_reaches_every_instance_in_a_list() {
    let mut vm = vm_with(FAMILY);
    let a = vm.call_handler("makeChild", &[]).unwrap();
    let b = vm.call_handler("makeChild", &[]).unwrap();
    let targets = Datum::list(vec![a, Datum::Int(5), b]);
    let result = vm.invoke_builtin("call", &[Datum::symbol("bump"), targets]);
    assert_eq!(result, Ok(Datum::Int(2)));
    assert_eq!(vm.global("gBumps"), Datum::Int(2));
}

// ============================================================
// Hosts: providers, builtins and tracing
// ============================================================

#[test]
fn handlers_resolve_through_the_provider() {
    let mut vm = vm_with(
        "\
script 1 movie
  handler go
    PUSH_INT8 4
    PUSH_ARG_LIST 1
    EXT_CALL #triple
    RET
  end
end
",
    );
    let shared = library(
        "\
library 2 \"Shared\" version=1200
script 9 movie \"Tools\"
  handler triple n
    GET_PARAM n
    PUSH_INT8 3
    MUL
    RET
  end
end
",
    );
    vm.set_provider(Box::new(StaticCastLibs::new([shared])));
    assert_eq!(vm.call_handler("go", &[]), Ok(Datum::Int(12)));
    assert_eq!(
        vm.invoke_builtin("script", &[Datum::string("tools")]),
        Ok(Datum::Script(lingo_common::ScriptRef::new(2, 9)))
    );
}

#[test]
fn host_builtins_are_called_by_bytecode() {
    let mut vm = vm_with(
        "\
script 1 movie
  handler go
    PUSH_CONS \"beep\"
    PUSH_ARG_LIST 1
    EXT_CALL #hostSound
    RET
  end
  handler fail
    PUSH_ARG_LIST 0
    EXT_CALL #hostFail
    RET
  end
end
",
    );
    let played = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&played);
    vm.register_builtin("hostSound", move |_, args| {
        log.borrow_mut().push(args[0].to_lingo_string());
        Ok(Datum::Int(1))
    });
    vm.register_builtin("hostFail", |_, _| Err(VmError::script("no sound device")));

    assert_eq!(vm.call_handler("go", &[]), Ok(Datum::Int(1)));
    assert_eq!(*played.borrow(), vec!["beep".to_string()]);
    assert_eq!(vm.call_handler("fail", &[]), Err(VmError::script("no sound device")));
}

#[derive(Default)]
struct Recorder {
    events: Rc<RefCell<Vec<String>>>,
    instructions: Rc<RefCell<usize>>,
}

impl TraceListener for Recorder {
    fn on_handler_enter(&mut self, info: &HandlerInfo) {
        self.events
            .borrow_mut()
            .push(format!("enter {} depth={}", info.name, info.depth));
    }

    fn on_handler_exit(&mut self, info: &HandlerInfo, result: &Datum) {
        self.events
            .borrow_mut()
            .push(format!("exit {} = {result}", info.name));
    }

    fn on_instruction(&mut self, _info: &InstructionInfo) {
        *self.instructions.borrow_mut() += 1;
    }

    fn on_variable_set(&mut self, kind: &str, name: &str, value: &Datum) {
        self.events.borrow_mut().push(format!("{kind} {name} = {value}"));
    }
}

#[test]
fn trace_listener_sees_calls_and_assignments() {
    let mut vm = vm_with(SUM_BODY);
    let recorder = Recorder::default();
    let events = Rc::clone(&recorder.events);
    let instructions = Rc::clone(&recorder.instructions);
    vm.set_trace_listener(Some(Box::new(recorder)));

    vm.call_handler("sum", &[Datum::Int(2), Datum::Int(3)]).unwrap();
    assert_eq!(
        *events.borrow(),
        vec![
            "enter sum depth=1".to_string(),
            "local t = 5".to_string(),
            "exit sum = 5".to_string(),
        ]
    );
    assert_eq!(*instructions.borrow(), 6);
}

// ============================================================
// Properties
// ============================================================

proptest! {
    /// setAt past the end pads with void up to the new position.
    #[test]
    fn set_at_pads_with_void(len in 0usize..16, extra in 1usize..32) {
        let mut vm = LingoVM::new();
        let list = int_list(0..len as i32);
        let index = len + extra;
        vm.invoke_builtin("setAt", &[list.clone(), Datum::Int(index as i32), Datum::string("v")])
            .unwrap();

        let after = items(&list);
        prop_assert_eq!(after.len(), index);
        for (i, item) in after.iter().enumerate().take(len) {
            prop_assert_eq!(item, &Datum::Int(i as i32));
        }
        for item in &after[len..index - 1] {
            prop_assert!(item.is_void());
        }
        prop_assert_eq!(&after[index - 1], &Datum::string("v"));
    }

    /// Lookups on cyclic ancestor chains stop after the walk bound.
    #[test]
    fn cyclic_ancestor_walks_terminate(len in 1usize..250) {
        let mut heap = InstanceHeap::new();
        let ids = linked_chain(&mut heap, len, true);
        prop_assert_eq!(ancestor::get_property(&heap, ids[0], "pMissing"), Datum::Void);
        prop_assert!(!ancestor::has_property(&heap, ids[0], "pMissing"));
        prop_assert_eq!(ancestor::chain(&heap, ids[0]).count(), MAX_ANCESTOR_DEPTH);
    }

    /// Method calls on a cyclic chain also terminate, falling back to void.
    #[test]
    fn cyclic_dispatch_terminates(len in 1usize..150) {
        let mut vm = LingoVM::new();
        let ids = linked_chain(vm.heap_mut(), len, true);
        let target = Datum::Instance(ids[0]);
        prop_assert_eq!(dispatch_method(&mut vm, &target, "pMissing", &[]), Ok(Datum::Void));
    }

    /// Copying an instance copies only its own property map.
    #[test]
    fn instance_copy_ignores_chain_length(len in 1usize..200) {
        let mut heap = InstanceHeap::new();
        let ids = linked_chain(&mut heap, len, false);
        let before = heap.len();
        let copy = Datum::Instance(ids[0]).deep_copy(&mut heap);
        prop_assert_eq!(heap.len(), before + 1);
        prop_assert_eq!(heap.ancestor(instance_id(&copy)), heap.ancestor(ids[0]));
    }

    /// addAt on a void slot: replaced under ReplaceVoid, shifted under
    /// InsertAlways.
    #[test]
    fn add_at_policies(len in 1usize..12, hole in 0usize..12, value in any::<i32>()) {
        let hole = hole % len;
        let mut start: Vec<Datum> = (0..len as i32).map(Datum::Int).collect();
        start[hole] = Datum::Void;
        let position = Datum::Int(hole as i32 + 1);

        let mut vm = LingoVM::new();
        let list = Datum::list(start.clone());
        vm.invoke_builtin("addAt", &[list.clone(), position.clone(), Datum::Int(value)]).unwrap();
        let replaced = items(&list);
        prop_assert_eq!(replaced.len(), len);
        prop_assert_eq!(&replaced[hole], &Datum::Int(value));

        vm.config_mut().add_at_policy = AddAtPolicy::InsertAlways;
        let list = Datum::list(start);
        vm.invoke_builtin("addAt", &[list.clone(), position, Datum::Int(value)]).unwrap();
        let inserted = items(&list);
        prop_assert_eq!(inserted.len(), len + 1);
        prop_assert_eq!(&inserted[hole], &Datum::Int(value));
        prop_assert!(inserted[hole + 1].is_void());
    }
}
