//! Decoded script libraries.
//!
//! These types are what the container parser hands to the VM: handlers with
//! decoded instructions, per-script literal tables and a per-library name
//! table. Literal and name indices are relative to the owning library.

use std::collections::HashMap;
use std::sync::Arc;

use crate::datum::Datum;
use crate::error::DecodeError;
use crate::instruction::Instruction;

/// A literal table entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Int(i32),
    Float(f64),
}

impl Literal {
    /// Decode a literal from its type code and raw payload.
    ///
    /// Type 1 is a string (trailing NUL stripped), type 4 a big-endian `i32`,
    /// type 9 a big-endian float (4-byte single or 8-byte double).
    pub fn from_type_code(code: u32, payload: &[u8]) -> Result<Literal, DecodeError> {
        match code {
            1 => {
                let bytes = payload.strip_suffix(&[0]).unwrap_or(payload);
                Ok(Literal::Str(String::from_utf8_lossy(bytes).into_owned()))
            }
            4 => Ok(Literal::Int(be_i32(payload))),
            9 => {
                let value = match payload {
                    [a, b, c, d, e, f, g, h, ..] => f64::from_be_bytes([*a, *b, *c, *d, *e, *f, *g, *h]),
                    _ => f32::from_bits(be_i32(payload) as u32) as f64,
                };
                Ok(Literal::Float(value))
            }
            other => Err(DecodeError::UnknownLiteralType(other)),
        }
    }
}

fn be_i32(payload: &[u8]) -> i32 {
    let mut buf = [0u8; 4];
    let n = payload.len().min(4);
    buf[4 - n..].copy_from_slice(&payload[..n]);
    i32::from_be_bytes(buf)
}

impl From<&Literal> for Datum {
    fn from(lit: &Literal) -> Self {
        match lit {
            Literal::Str(s) => Datum::string(s.as_str()),
            Literal::Int(i) => Datum::Int(*i),
            Literal::Float(f) => Datum::Float(*f),
        }
    }
}

/// Identifier table of a library. Ids are positions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameTable {
    names: Vec<String>,
}

impl NameTable {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn get(&self, id: i32) -> Option<&str> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.names.get(i))
            .map(String::as_str)
    }

    /// Name for `id`, or a placeholder for ids outside the table.
    pub fn name_or_placeholder(&self, id: i32) -> String {
        match self.get(id) {
            Some(name) => name.to_string(),
            None => format!("<name:{id}>"),
        }
    }

    /// Case-insensitive reverse lookup.
    pub fn find(&self, name: &str) -> Option<i32> {
        self.names
            .iter()
            .position(|n| n.eq_ignore_ascii_case(name))
            .map(|i| i as i32)
    }

    /// Return the id of `name`, appending it if it is not present.
    pub fn intern(&mut self, name: &str) -> i32 {
        if let Some(id) = self.find(name) {
            return id;
        }
        self.names.push(name.to_string());
        (self.names.len() - 1) as i32
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// One compiled handler.
#[derive(Debug, Clone, PartialEq)]
pub struct Handler {
    pub name_id: i32,
    pub vector_pos: i32,
    pub arg_name_ids: Vec<i32>,
    pub local_name_ids: Vec<i32>,
    pub local_count: usize,
    pub instructions: Vec<Instruction>,
    offset_index: HashMap<usize, usize>,
}

impl Handler {
    pub fn new(
        name_id: i32,
        arg_name_ids: Vec<i32>,
        local_name_ids: Vec<i32>,
        instructions: Vec<Instruction>,
    ) -> Self {
        let offset_index = instructions
            .iter()
            .enumerate()
            .map(|(i, instr)| (instr.offset, i))
            .collect();
        Self {
            name_id,
            vector_pos: -1,
            local_count: local_name_ids.len(),
            arg_name_ids,
            local_name_ids,
            instructions,
            offset_index,
        }
    }

    /// Index of the instruction starting at byte `offset`.
    pub fn instruction_index(&self, offset: usize) -> Option<usize> {
        self.offset_index.get(&offset).copied()
    }

    /// Total bytecode length.
    pub fn bytecode_len(&self) -> usize {
        self.instructions
            .last()
            .map(|i| i.offset + i.width())
            .unwrap_or(0)
    }
}

/// How a script is attached to the movie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptKind {
    Score,
    Behavior,
    Movie,
    Parent,
    Unknown,
}

impl ScriptKind {
    pub fn from_code(code: i32) -> ScriptKind {
        match code {
            1 => ScriptKind::Score,
            2 => ScriptKind::Behavior,
            3 => ScriptKind::Movie,
            7 => ScriptKind::Parent,
            _ => ScriptKind::Unknown,
        }
    }

    pub fn from_name(name: &str) -> Option<ScriptKind> {
        [
            ScriptKind::Score,
            ScriptKind::Behavior,
            ScriptKind::Movie,
            ScriptKind::Parent,
        ]
        .into_iter()
        .find(|k| k.name().eq_ignore_ascii_case(name))
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScriptKind::Score => "score",
            ScriptKind::Behavior => "behavior",
            ScriptKind::Movie => "movie",
            ScriptKind::Parent => "parent",
            ScriptKind::Unknown => "unknown",
        }
    }
}

/// A script cast member's compiled code.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    /// Member number within the owning cast library.
    pub member: i32,
    /// Cast member name, empty when unnamed.
    pub name: String,
    pub kind: ScriptKind,
    pub handlers: Vec<Handler>,
    pub literals: Vec<Literal>,
    /// Declared `property` names, as name ids.
    pub property_name_ids: Vec<i32>,
}

impl Script {
    pub fn new(member: i32, kind: ScriptKind) -> Self {
        Self {
            member,
            name: String::new(),
            kind,
            handlers: Vec::new(),
            literals: Vec::new(),
            property_name_ids: Vec::new(),
        }
    }

    /// Index of the handler called `name`, compared case-insensitively.
    pub fn handler_by_name(&self, names: &NameTable, name: &str) -> Option<usize> {
        self.handlers.iter().position(|h| {
            names
                .get(h.name_id)
                .is_some_and(|n| n.eq_ignore_ascii_case(name))
        })
    }
}

/// A cast library's scripts and the name table they share.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptLibrary {
    pub number: i32,
    pub name: String,
    /// Authoring tool format version.
    pub dir_version: u32,
    /// Variable indices are stored unscaled.
    pub capital_x: bool,
    pub names: NameTable,
    pub scripts: Vec<Arc<Script>>,
}

impl ScriptLibrary {
    pub fn new(number: i32, name: impl Into<String>, dir_version: u32) -> Self {
        Self {
            number,
            name: name.into(),
            dir_version,
            capital_x: false,
            names: NameTable::default(),
            scripts: Vec::new(),
        }
    }

    /// Factor variable-slot arguments are pre-multiplied by.
    pub fn variable_multiplier(&self) -> i32 {
        if self.capital_x {
            1
        } else if self.dir_version >= 500 {
            8
        } else {
            6
        }
    }

    pub fn script_by_member(&self, member: i32) -> Option<&Arc<Script>> {
        self.scripts.iter().find(|s| s.member == member)
    }

    /// Script whose member name matches, compared case-insensitively.
    pub fn script_by_name(&self, name: &str) -> Option<&Arc<Script>> {
        self.scripts
            .iter()
            .find(|s| !s.name.is_empty() && s.name.eq_ignore_ascii_case(name))
    }

    /// Declared property names of a script, resolved through the name table.
    pub fn property_names(&self, script: &Script) -> Vec<String> {
        script
            .property_name_ids
            .iter()
            .map(|id| self.names.name_or_placeholder(*id))
            .collect()
    }
}
