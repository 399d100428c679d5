//! Opcode implementations.
//!
//! Each group extends [`LingoVM`](crate::LingoVM) with `exec_*` methods that
//! the dispatch loop in `execute.rs` calls. Groups that define value-level
//! semantics (arithmetic, equality) also expose them as free functions.

pub mod arith;
mod calls;
pub mod compare;
mod control;
mod lists;
mod props;
mod stack;
mod strings;
mod vars;

use lingo_common::Datum;

/// Arguments carried by an argument list. Any other value is one argument,
/// void is none.
pub(crate) fn arg_items(datum: &Datum) -> Vec<Datum> {
    match datum.arg_items() {
        Some(items) => items,
        None if datum.is_void() => Vec::new(),
        None => vec![datum.clone()],
    }
}

/// The caller discards the result of a call made with this argument list.
pub(crate) fn is_no_ret(datum: &Datum) -> bool {
    matches!(datum, Datum::ArgListNoRet(_))
}

/// Variable kinds addressed by PUT, PUT_CHUNK and DELETE_CHUNK.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VarKind {
    Global,
    Property,
    Param,
    Local,
    Field,
}

impl VarKind {
    pub(crate) fn from_code(code: i32) -> Option<VarKind> {
        match code {
            1 | 2 => Some(VarKind::Global),
            3 => Some(VarKind::Property),
            4 => Some(VarKind::Param),
            5 => Some(VarKind::Local),
            6 => Some(VarKind::Field),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arg_lists_unwrap() {
        assert_eq!(arg_items(&Datum::arg_list(vec![Datum::Int(1)])), vec![Datum::Int(1)]);
        assert_eq!(arg_items(&Datum::Void), Vec::<Datum>::new());
        assert_eq!(arg_items(&Datum::Int(4)), vec![Datum::Int(4)]);
        assert!(is_no_ret(&Datum::arg_list_no_ret(vec![])));
        assert!(!is_no_ret(&Datum::arg_list(vec![])));
    }

    #[test]
    fn var_kinds() {
        assert_eq!(VarKind::from_code(2), Some(VarKind::Global));
        assert_eq!(VarKind::from_code(6), Some(VarKind::Field));
        assert_eq!(VarKind::from_code(0), None);
    }
}
