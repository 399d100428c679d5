//! Group: string operators and chunk expressions.
//!
//! A chunk expression is eight integers on the stack, a first/last pair for
//! each of char, word, item and line. A pair of zeros means that level is not
//! used.

use lingo_common::{ChunkKind, Datum, Instruction};

use crate::chunks::{self, PutMode};
use crate::machine::LingoVM;

/// One level of a chunk expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChunkSpec {
    kind: ChunkKind,
    first: i32,
    last: i32,
}

/// The eight chunk operands, outermost level first.
#[derive(Debug, Clone, Copy)]
struct ChunkExpr {
    levels: [ChunkSpec; 4],
}

impl ChunkExpr {
    fn used(&self) -> impl Iterator<Item = &ChunkSpec> + '_ {
        self.levels.iter().filter(|c| c.first != 0 || c.last != 0)
    }

    /// The outermost level in use, or the first character.
    fn single(&self) -> ChunkSpec {
        self.used().next().copied().unwrap_or(ChunkSpec {
            kind: ChunkKind::Char,
            first: 1,
            last: 1,
        })
    }
}

impl LingoVM {
    fn pop_chunk_expr(&mut self) -> ChunkExpr {
        let mut levels = [ChunkKind::Line, ChunkKind::Item, ChunkKind::Word, ChunkKind::Char].map(|kind| {
            ChunkSpec {
                kind,
                first: 0,
                last: 0,
            }
        });
        for level in levels.iter_mut() {
            level.last = self.pop().to_int();
            level.first = self.pop().to_int();
        }
        ChunkExpr { levels }
    }

    pub(crate) fn exec_join_str(&mut self, pad: bool) {
        let b = self.pop().to_lingo_string();
        let a = self.pop().to_lingo_string();
        let sep = if pad { " " } else { "" };
        self.push(Datum::string(format!("{a}{sep}{b}")));
    }

    /// `contains`, ignoring case.
    pub(crate) fn exec_contains_str(&mut self) {
        let needle = self.pop().to_lingo_string().to_lowercase();
        let haystack = self.pop().to_lingo_string().to_lowercase();
        self.push(Datum::bool(haystack.contains(&needle)));
    }

    /// `starts`, ignoring case. A void haystack never matches.
    pub(crate) fn exec_starts_with_str(&mut self) {
        let needle = self.pop().to_lingo_string().to_lowercase();
        let haystack = self.pop();
        let result = !haystack.is_void() && haystack.to_lingo_string().to_lowercase().starts_with(&needle);
        self.push(Datum::bool(result));
    }

    /// Narrow the popped string level by level, line to char.
    pub(crate) fn exec_get_chunk(&mut self) {
        let s = self.pop().to_lingo_string();
        let expr = self.pop_chunk_expr();
        let delimiter = self.item_delimiter();
        let result = expr.used().fold(s, |text, level| {
            chunks::get_range(&text, level.kind, level.first, level.last, delimiter)
        });
        self.push(Datum::string(result));
    }

    /// `put value into|after|before chunk of variable`.
    pub(crate) fn exec_put_chunk(&mut self, instr: &Instruction) {
        let mode = PutMode::from_code((instr.argument >> 4) & 0xF).unwrap_or(PutMode::Into);
        let var = self.pop_var_target(instr.argument & 0xF);
        let value = self.pop().to_lingo_string();
        let level = self.pop_chunk_expr().single();
        let Some(var) = var else {
            tracing::warn!(target: "lingo::vm", "PUT_CHUNK: unsupported variable kind {}", instr.argument & 0xF);
            return;
        };
        let current = self.context_var(&var).to_lingo_string();
        let updated = chunks::put_chunk(
            &current,
            level.kind,
            level.first,
            level.last,
            mode,
            &value,
            self.item_delimiter(),
        );
        self.set_context_var(&var, Datum::string(updated));
    }

    pub(crate) fn exec_delete_chunk(&mut self, instr: &Instruction) {
        let var = self.pop_var_target(instr.argument);
        let level = self.pop_chunk_expr().single();
        let Some(var) = var else {
            tracing::warn!(target: "lingo::vm", "DELETE_CHUNK: unsupported variable kind {}", instr.argument);
            return;
        };
        let current = self.context_var(&var).to_lingo_string();
        let updated = chunks::delete_chunk(&current, level.kind, level.first, level.last, self.item_delimiter());
        self.set_context_var(&var, Datum::string(updated));
    }
}
