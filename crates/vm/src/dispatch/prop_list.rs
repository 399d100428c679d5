//! Property list methods.

use lingo_common::{Datum, PropListRef};

use super::{key_of, position, MethodTable};
use crate::machine::LingoVM;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropListMethod {
    Count,
    GetAt,
    GetProp,
    SetProp,
    DeleteProp,
    GetPropAt,
    SetAt,
    FindPos,
    GetOne,
    GetLast,
    Duplicate,
}

pub static PROP_LIST_METHODS: MethodTable<PropListMethod> = MethodTable::new(&[
    ("count", PropListMethod::Count),
    ("getat", PropListMethod::GetAt),
    ("getprop", PropListMethod::GetProp),
    ("getaprop", PropListMethod::GetProp),
    ("setprop", PropListMethod::SetProp),
    ("setaprop", PropListMethod::SetProp),
    ("addprop", PropListMethod::SetProp),
    ("deleteprop", PropListMethod::DeleteProp),
    ("getpropat", PropListMethod::GetPropAt),
    ("setat", PropListMethod::SetAt),
    ("findpos", PropListMethod::FindPos),
    ("getone", PropListMethod::GetOne),
    ("getlast", PropListMethod::GetLast),
    ("duplicate", PropListMethod::Duplicate),
]);

pub fn dispatch(vm: &mut LingoVM, props: &PropListRef, method: &str, args: &[Datum]) -> Datum {
    let Some(method) = PROP_LIST_METHODS.lookup(method) else {
        return Datum::Void;
    };
    match method {
        PropListMethod::Count => Datum::Int(props.borrow().len() as i32),
        PropListMethod::GetAt => match args.first() {
            Some(key @ (Datum::Str(_) | Datum::Symbol(_))) => get(props, &key_of(key)),
            other => position(other)
                .and_then(|i| props.borrow().get_index(i).map(|(_, v)| v.clone()))
                .unwrap_or_default(),
        },
        PropListMethod::GetProp => args
            .first()
            .map(|key| get(props, &key_of(key)))
            .unwrap_or_default(),
        PropListMethod::SetProp => {
            if let (Some(key), Some(value)) = (args.first(), args.get(1)) {
                props.borrow_mut().insert(key_of(key), value.clone());
            }
            Datum::Void
        }
        PropListMethod::DeleteProp => {
            if let Some(key) = args.first() {
                props.borrow_mut().shift_remove(&key_of(key));
            }
            Datum::Void
        }
        PropListMethod::GetPropAt => position(args.first())
            .and_then(|i| props.borrow().get_index(i).map(|(k, _)| Datum::symbol(k.as_str())))
            .unwrap_or_default(),
        PropListMethod::SetAt => {
            match (args.first(), args.get(1)) {
                (Some(Datum::Int(n)), Some(value)) => {
                    set_position(props, usize::try_from(n.saturating_sub(1)).ok(), value.clone());
                }
                (Some(key), Some(value)) => {
                    props.borrow_mut().insert(key_of(key), value.clone());
                }
                _ => {}
            }
            Datum::Void
        }
        PropListMethod::FindPos => args
            .first()
            .and_then(|key| find_key_ignore_case(props, &key_of(key)))
            .map_or(Datum::Void, |i| Datum::Int(i as i32 + 1)),
        PropListMethod::GetOne => {
            let found = args.first().and_then(|value| {
                props
                    .borrow()
                    .iter()
                    .find(|(_, v)| *v == value)
                    .map(|(k, _)| Datum::symbol(k.as_str()))
            });
            found.unwrap_or(Datum::Int(0))
        }
        PropListMethod::GetLast => props
            .borrow()
            .last()
            .map(|(_, v)| v.clone())
            .unwrap_or_default(),
        PropListMethod::Duplicate => Datum::PropList(props.clone()).deep_copy(vm.heap_mut()),
    }
}

fn get(props: &PropListRef, key: &str) -> Datum {
    props.borrow().get(key).cloned().unwrap_or_default()
}

/// Overwrite the value at an existing 0-based position. Out of range is a no-op.
fn set_position(props: &PropListRef, index: Option<usize>, value: Datum) {
    let mut props = props.borrow_mut();
    if let Some((_, slot)) = index.and_then(|i| props.get_index_mut(i)) {
        *slot = value;
    }
}

/// 0-based position of `key`, compared case-insensitively.
pub fn find_key_ignore_case(props: &PropListRef, key: &str) -> Option<usize> {
    props
        .borrow()
        .keys()
        .position(|k| k.eq_ignore_ascii_case(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Datum, PropListRef) {
        let datum = Datum::prop_list_from([
            ("pName", Datum::string("bob")),
            ("pAge", Datum::Int(40)),
        ]);
        let Datum::PropList(props) = &datum else {
            unreachable!()
        };
        let props = props.clone();
        (datum, props)
    }

    #[test]
    fn find_pos_is_case_insensitive_and_void_when_absent() {
        let mut vm = LingoVM::new();
        let (_, props) = sample();
        assert_eq!(dispatch(&mut vm, &props, "findPos", &[Datum::symbol("PAGE")]), Datum::Int(2));
        assert_eq!(dispatch(&mut vm, &props, "findPos", &[Datum::string("pname")]), Datum::Int(1));
        assert_eq!(dispatch(&mut vm, &props, "findPos", &[Datum::symbol("pX")]), Datum::Void);
    }

    #[test]
    fn get_at_by_key_or_position() {
        let mut vm = LingoVM::new();
        let (_, props) = sample();
        assert_eq!(dispatch(&mut vm, &props, "getAt", &[Datum::symbol("pAge")]), Datum::Int(40));
        assert_eq!(dispatch(&mut vm, &props, "getAt", &[Datum::Int(1)]), Datum::string("bob"));
        assert_eq!(dispatch(&mut vm, &props, "getAt", &[Datum::Int(3)]), Datum::Void);
        assert_eq!(
            dispatch(&mut vm, &props, "getPropAt", &[Datum::Int(2)]),
            Datum::symbol("pAge")
        );
    }

    #[test]
    fn setters_upsert() {
        let mut vm = LingoVM::new();
        let (datum, props) = sample();
        dispatch(&mut vm, &props, "setaProp", &[Datum::symbol("pAge"), Datum::Int(41)]);
        dispatch(&mut vm, &props, "addProp", &[Datum::symbol("pTown"), Datum::string("x")]);
        dispatch(&mut vm, &props, "setAt", &[Datum::Int(1), Datum::string("al")]);
        dispatch(&mut vm, &props, "setAt", &[Datum::Int(9), Datum::string("ignored")]);
        assert_eq!(datum.to_string(), "[#pName: \"al\", #pAge: 41, #pTown: \"x\"]");

        dispatch(&mut vm, &props, "deleteProp", &[Datum::symbol("pName")]);
        assert_eq!(dispatch(&mut vm, &props, "count", &[]), Datum::Int(2));
        assert_eq!(dispatch(&mut vm, &props, "getLast", &[]), Datum::string("x"));
        assert_eq!(
            dispatch(&mut vm, &props, "getOne", &[Datum::Int(41)]),
            Datum::symbol("pAge")
        );
    }
}
