//! Linear list methods.

use std::cmp::Ordering;

use lingo_common::{Datum, ListRef};

use super::{position, MethodTable};
use crate::config::AddAtPolicy;
use crate::machine::LingoVM;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMethod {
    Count,
    GetAt,
    SetAt,
    Append,
    AddAt,
    DeleteAt,
    FindPos,
    GetLast,
    DeleteOne,
    Join,
    Sort,
    Duplicate,
}

pub static LIST_METHODS: MethodTable<ListMethod> = MethodTable::new(&[
    ("count", ListMethod::Count),
    ("getat", ListMethod::GetAt),
    ("setat", ListMethod::SetAt),
    ("append", ListMethod::Append),
    ("add", ListMethod::Append),
    ("addat", ListMethod::AddAt),
    ("deleteat", ListMethod::DeleteAt),
    ("getone", ListMethod::FindPos),
    ("findpos", ListMethod::FindPos),
    ("getpos", ListMethod::FindPos),
    ("getlast", ListMethod::GetLast),
    ("deleteone", ListMethod::DeleteOne),
    ("join", ListMethod::Join),
    ("sort", ListMethod::Sort),
    ("duplicate", ListMethod::Duplicate),
]);

pub fn dispatch(vm: &mut LingoVM, list: &ListRef, method: &str, args: &[Datum]) -> Datum {
    let Some(method) = LIST_METHODS.lookup(method) else {
        return Datum::Void;
    };
    match method {
        ListMethod::Count => Datum::Int(list.borrow().len() as i32),
        ListMethod::GetAt => position(args.first())
            .and_then(|i| list.borrow().get(i).cloned())
            .unwrap_or_default(),
        ListMethod::SetAt => {
            if let (Some(i), Some(value)) = (position(args.first()), args.get(1)) {
                set_at(list, i, value.clone());
            }
            Datum::Void
        }
        ListMethod::Append => {
            if let Some(value) = args.first() {
                list.borrow_mut().push(value.clone());
            }
            Datum::Void
        }
        ListMethod::AddAt => {
            if let (Some(index), Some(value)) = (args.first(), args.get(1)) {
                let i = (index.to_int() - 1).max(0) as usize;
                add_at(list, i, value.clone(), vm.config().add_at_policy);
            }
            Datum::Void
        }
        ListMethod::DeleteAt => {
            if let Some(i) = position(args.first()) {
                let mut items = list.borrow_mut();
                if i < items.len() {
                    items.remove(i);
                }
            }
            Datum::Void
        }
        ListMethod::FindPos => {
            let found = args
                .first()
                .and_then(|value| list.borrow().iter().position(|item| item == value));
            Datum::Int(found.map_or(0, |i| i as i32 + 1))
        }
        ListMethod::GetLast => list.borrow().last().cloned().unwrap_or_default(),
        ListMethod::DeleteOne => {
            if let Some(value) = args.first() {
                let found = list.borrow().iter().position(|item| item == value);
                if let Some(i) = found {
                    list.borrow_mut().remove(i);
                }
            }
            Datum::Void
        }
        ListMethod::Join => {
            let separator = args.first().map(Datum::to_lingo_string).unwrap_or_default();
            let parts: Vec<String> = list.borrow().iter().map(Datum::to_lingo_string).collect();
            Datum::string(parts.join(&separator))
        }
        ListMethod::Sort => {
            // Sort outside the borrow: comparing may format elements that
            // refer back to this list.
            let mut items = std::mem::take(&mut *list.borrow_mut());
            items.sort_by(compare_for_sort);
            *list.borrow_mut() = items;
            Datum::Void
        }
        ListMethod::Duplicate => Datum::List(list.clone()).deep_copy(vm.heap_mut()),
    }
}

/// Store at 0-based `index`, padding with void up to it.
pub fn set_at(list: &ListRef, index: usize, value: Datum) {
    let mut items = list.borrow_mut();
    if index < items.len() {
        items[index] = value;
    } else {
        items.resize(index, Datum::Void);
        items.push(value);
    }
}

/// Insert at 0-based `index` under `policy`.
pub fn add_at(list: &ListRef, index: usize, value: Datum, policy: AddAtPolicy) {
    let mut items = list.borrow_mut();
    match policy {
        AddAtPolicy::ReplaceVoid => {
            if index < items.len() && items[index].is_void() {
                items[index] = value;
            } else if index >= items.len() {
                items.resize(index, Datum::Void);
                items.push(value);
            } else {
                items.insert(index, value);
            }
        }
        AddAtPolicy::InsertAlways => {
            let index = index.min(items.len());
            items.insert(index, value);
        }
    }
}

fn compare_for_sort(a: &Datum, b: &Datum) -> Ordering {
    match (a, b) {
        (Datum::Int(x), Datum::Int(y)) => x.cmp(y),
        _ if a.is_number() && b.is_number() => a.to_float().total_cmp(&b.to_float()),
        _ => a
            .to_lingo_string()
            .to_lowercase()
            .cmp(&b.to_lingo_string().to_lowercase()),
    }
}
