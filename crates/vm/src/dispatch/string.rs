//! String methods.

use lingo_common::{ChunkKind, Datum};

use super::MethodTable;
use crate::chunks;
use crate::machine::LingoVM;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringMethod {
    Length,
    Char,
    Count,
    GetPropRef,
    GetProp,
}

pub static STRING_METHODS: MethodTable<StringMethod> = MethodTable::new(&[
    ("length", StringMethod::Length),
    ("char", StringMethod::Char),
    ("count", StringMethod::Count),
    ("getpropref", StringMethod::GetPropRef),
    ("getprop", StringMethod::GetProp),
]);

pub fn dispatch(vm: &mut LingoVM, s: &str, method: &str, args: &[Datum]) -> Datum {
    let Some(method) = STRING_METHODS.lookup(method) else {
        return Datum::Void;
    };
    let delimiter = vm.item_delimiter();
    match method {
        StringMethod::Length => Datum::Int(s.chars().count() as i32),
        StringMethod::Char => {
            let index = args.first().map_or(0, Datum::to_int);
            Datum::string(chunks::get_chunk(s, ChunkKind::Char, index, delimiter))
        }
        StringMethod::Count => {
            let kind = args.first().and_then(chunk_kind).unwrap_or(ChunkKind::Char);
            Datum::Int(count_chunks(s, kind, delimiter) as i32)
        }
        StringMethod::GetPropRef => match (args.first().and_then(chunk_kind), args.get(1)) {
            (Some(kind), Some(index)) => {
                let i = index.to_int();
                chunk_text(s, kind, i, i, delimiter)
            }
            _ => Datum::string(""),
        },
        StringMethod::GetProp => match (args.first().and_then(chunk_kind), args.get(1)) {
            (Some(kind), Some(start)) => {
                let first = start.to_int();
                let last = args.get(2).map_or(first, Datum::to_int);
                chunk_text(s, kind, first, last, delimiter)
            }
            _ => Datum::string(""),
        },
    }
}

/// Chunk count as scripts observe it: a line or item count of an empty
/// string is 1, because the empty string is itself one empty line or item.
pub fn count_chunks(s: &str, kind: ChunkKind, delimiter: char) -> usize {
    match kind {
        ChunkKind::Line | ChunkKind::Item if s.is_empty() => 1,
        _ => chunks::count(s, kind, delimiter),
    }
}

fn chunk_kind(arg: &Datum) -> Option<ChunkKind> {
    match arg {
        Datum::Symbol(name) | Datum::Str(name) => ChunkKind::from_name(name),
        _ => None,
    }
}

fn chunk_text(s: &str, kind: ChunkKind, first: i32, last: i32, delimiter: char) -> Datum {
    if first < 1 {
        return Datum::string("");
    }
    Datum::string(chunks::get_range(s, kind, first, last, delimiter))
}
