//! Lingo common types and bytecode decoding.
//!
//! This crate provides the foundational data structures shared by the VM and
//! the assembler:
//!
//! - [`Datum`]: the dynamic runtime value
//! - [`InstanceHeap`]: arena owning script instances
//! - [`Opcode`]: the canonical opcode table
//! - [`Instruction`]: a decoded instruction, plus [`decode_bytecode`] / [`encode_instruction`]
//! - [`ScriptLibrary`], [`Script`], [`Handler`]: decoded script code
//! - [`ChunkKind`]: string chunk units
//! - [`DecodeError`]: errors from decoding byte streams

pub mod chunk;
pub mod datum;
pub mod error;
pub mod instance;
pub mod instruction;
pub mod opcode;
pub mod script;

pub use chunk::ChunkKind;
pub use datum::{
    ChunkRef, Color, Datum, ListRef, Point, PropListRef, PropMap, Rect, ScriptRef, PROP_ANCESTOR,
};
pub use error::DecodeError;
pub use instance::{InstanceHeap, InstanceId, ScriptInstance};
pub use instruction::{decode_bytecode, encode_instruction, Instruction};
pub use opcode::Opcode;
pub use script::{Handler, Literal, NameTable, Script, ScriptKind, ScriptLibrary};
