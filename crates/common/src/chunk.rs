//! String chunk kinds.

/// The unit a string chunk expression addresses.
///
/// Discriminants are the codes used by the GET opcode and chunk references.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkKind {
    /// Delimited by the movie's item delimiter.
    Item = 1,
    /// Whitespace-separated.
    Word = 2,
    /// A single character.
    Char = 3,
    /// Delimited by the string's line terminator.
    Line = 4,
}

/// All chunk kinds, in code order.
pub const ALL_CHUNK_KINDS: [ChunkKind; 4] = [
    ChunkKind::Item,
    ChunkKind::Word,
    ChunkKind::Char,
    ChunkKind::Line,
];

impl ChunkKind {
    /// Look up a chunk kind by its numeric code.
    pub fn from_code(code: i32) -> Option<ChunkKind> {
        ALL_CHUNK_KINDS.iter().copied().find(|k| *k as i32 == code)
    }

    /// Look up a chunk kind by its Lingo name (`#char`, `#word`, ...).
    pub fn from_name(name: &str) -> Option<ChunkKind> {
        ALL_CHUNK_KINDS
            .iter()
            .copied()
            .find(|k| k.name().eq_ignore_ascii_case(name))
    }

    /// The Lingo name of this chunk kind.
    pub fn name(&self) -> &'static str {
        match self {
            ChunkKind::Item => "item",
            ChunkKind::Word => "word",
            ChunkKind::Char => "char",
            ChunkKind::Line => "line",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_roundtrip() {
        for kind in ALL_CHUNK_KINDS {
            assert_eq!(ChunkKind::from_code(kind as i32), Some(kind));
        }
        assert_eq!(ChunkKind::from_code(0), None);
        assert_eq!(ChunkKind::from_code(5), None);
    }

    #[test]
    fn names_are_case_insensitive() {
        assert_eq!(ChunkKind::from_name("CHAR"), Some(ChunkKind::Char));
        assert_eq!(ChunkKind::from_name("Line"), Some(ChunkKind::Line));
        assert_eq!(ChunkKind::from_name("paragraph"), None);
    }
}
