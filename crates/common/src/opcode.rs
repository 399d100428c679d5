//! Opcode definitions for Lingo bytecode.
//!
//! Single-byte opcodes live in `0x01..=0x3F` and carry no argument. Multi-byte
//! opcodes are stored in the stream as `0x40 + n`, `0x80 + n` or `0xC0 + n`
//! depending on the argument width; [`Opcode::from_code`] folds all three
//! encodings back to the canonical `0x40 + n` form.

/// Identifies the operation to perform.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Any byte that does not name a known opcode.
    Invalid = 0x00,

    // Single-byte: returns and stack
    /// Pop the top of stack and return it from the handler.
    Ret = 0x01,
    /// Return void from a factory handler.
    RetFactory = 0x02,
    /// Push integer 0.
    PushZero = 0x03,

    // Single-byte: arithmetic
    Mul = 0x04,
    Add = 0x05,
    Sub = 0x06,
    /// Division. A zero divisor is a fatal error.
    Div = 0x07,
    /// Remainder. A zero divisor is a fatal error.
    Mod = 0x08,
    /// Arithmetic negation.
    Inv = 0x09,

    // Single-byte: strings and comparison
    /// `a & b`
    JoinStr = 0x0A,
    /// `a && b` (joined with a space)
    JoinPadStr = 0x0B,
    Lt = 0x0C,
    LtEq = 0x0D,
    NtEq = 0x0E,
    Eq = 0x0F,
    Gt = 0x10,
    GtEq = 0x11,
    And = 0x12,
    Or = 0x13,
    Not = 0x14,
    /// Case-insensitive substring test.
    ContainsStr = 0x15,
    /// Case-insensitive prefix test (`starts`).
    Contains0Str = 0x16,
    /// Extract a chunk expression from a string.
    GetChunk = 0x17,
    HiliteChunk = 0x18,
    OntoSpr = 0x19,
    IntoSpr = 0x1A,
    /// Read the text of a field member.
    GetField = 0x1B,
    StartTell = 0x1C,
    EndTell = 0x1D,
    /// Convert the arglist on top of stack into a list.
    PushList = 0x1E,
    /// Convert the key/value arglist on top of stack into a property list.
    PushPropList = 0x1F,
    Swap = 0x21,
    CallJavaScript = 0x26,

    // Multi-byte: pushes
    /// Push a signed immediate.
    PushInt8 = 0x41,
    /// Pop N values into an argument list whose result is discarded.
    PushArgListNoRet = 0x42,
    /// Pop N values into an argument list.
    PushArgList = 0x43,
    /// Push an entry of the script's literal table.
    PushCons = 0x44,
    /// Push a symbol named by the name table.
    PushSymb = 0x45,
    PushVarRef = 0x46,

    // Multi-byte: variables
    GetGlobal2 = 0x48,
    GetGlobal = 0x49,
    /// Read a property of the receiver through its ancestor chain.
    GetProp = 0x4A,
    GetParam = 0x4B,
    GetLocal = 0x4C,
    SetGlobal2 = 0x4E,
    SetGlobal = 0x4F,
    /// Write a property of the receiver through its ancestor chain.
    SetProp = 0x50,
    SetParam = 0x51,
    SetLocal = 0x52,

    // Multi-byte: control flow
    /// Jump forward by the argument (in bytes).
    Jmp = 0x53,
    /// Jump backward by the argument (in bytes).
    EndRepeat = 0x54,
    /// Pop a condition and jump forward when it is falsy.
    JmpIfZ = 0x55,

    // Multi-byte: calls
    /// Call a handler of the current script by vector position.
    LocalCall = 0x56,
    /// Call a global handler or builtin by name.
    ExtCall = 0x57,
    ObjCallV4 = 0x58,

    // Multi-byte: chunk mutation and "the" properties
    Put = 0x59,
    PutChunk = 0x5A,
    DeleteChunk = 0x5B,
    Get = 0x5C,
    Set = 0x5D,
    GetMovieProp = 0x5F,
    SetMovieProp = 0x60,
    GetObjProp = 0x61,
    SetObjProp = 0x62,
    TellCall = 0x63,
    /// Duplicate the value at the given depth.
    Peek = 0x64,
    /// Discard the given number of values.
    Pop = 0x65,
    TheBuiltin = 0x66,
    /// Call a method on the first argument of the arglist.
    ObjCall = 0x67,
    PushChunkVarRef = 0x6D,
    PushInt16 = 0x6E,
    PushInt32 = 0x6F,
    GetChainedProp = 0x70,
    /// Push the `f32` whose bit pattern is the argument.
    PushFloat32 = 0x71,
    GetTopLevelProp = 0x72,
    NewObj = 0x73,
}

/// Every opcode in code order, followed by [`Opcode::Invalid`].
pub const ALL_OPCODES: [Opcode; 77] = [
    Opcode::Ret,
    Opcode::RetFactory,
    Opcode::PushZero,
    Opcode::Mul,
    Opcode::Add,
    Opcode::Sub,
    Opcode::Div,
    Opcode::Mod,
    Opcode::Inv,
    Opcode::JoinStr,
    Opcode::JoinPadStr,
    Opcode::Lt,
    Opcode::LtEq,
    Opcode::NtEq,
    Opcode::Eq,
    Opcode::Gt,
    Opcode::GtEq,
    Opcode::And,
    Opcode::Or,
    Opcode::Not,
    Opcode::ContainsStr,
    Opcode::Contains0Str,
    Opcode::GetChunk,
    Opcode::HiliteChunk,
    Opcode::OntoSpr,
    Opcode::IntoSpr,
    Opcode::GetField,
    Opcode::StartTell,
    Opcode::EndTell,
    Opcode::PushList,
    Opcode::PushPropList,
    Opcode::Swap,
    Opcode::CallJavaScript,
    Opcode::PushInt8,
    Opcode::PushArgListNoRet,
    Opcode::PushArgList,
    Opcode::PushCons,
    Opcode::PushSymb,
    Opcode::PushVarRef,
    Opcode::GetGlobal2,
    Opcode::GetGlobal,
    Opcode::GetProp,
    Opcode::GetParam,
    Opcode::GetLocal,
    Opcode::SetGlobal2,
    Opcode::SetGlobal,
    Opcode::SetProp,
    Opcode::SetParam,
    Opcode::SetLocal,
    Opcode::Jmp,
    Opcode::EndRepeat,
    Opcode::JmpIfZ,
    Opcode::LocalCall,
    Opcode::ExtCall,
    Opcode::ObjCallV4,
    Opcode::Put,
    Opcode::PutChunk,
    Opcode::DeleteChunk,
    Opcode::Get,
    Opcode::Set,
    Opcode::GetMovieProp,
    Opcode::SetMovieProp,
    Opcode::GetObjProp,
    Opcode::SetObjProp,
    Opcode::TellCall,
    Opcode::Peek,
    Opcode::Pop,
    Opcode::TheBuiltin,
    Opcode::ObjCall,
    Opcode::PushChunkVarRef,
    Opcode::PushInt16,
    Opcode::PushInt32,
    Opcode::GetChainedProp,
    Opcode::PushFloat32,
    Opcode::GetTopLevelProp,
    Opcode::NewObj,
    Opcode::Invalid,
];

impl Opcode {
    /// Decode a raw stream byte, folding the three argument-width encodings
    /// of multi-byte opcodes onto their canonical code.
    pub fn from_code(raw: u8) -> Opcode {
        let code = if raw >= 0x40 { 0x40 + raw % 0x40 } else { raw };
        ALL_OPCODES
            .iter()
            .copied()
            .find(|op| *op != Opcode::Invalid && *op as u8 == code)
            .unwrap_or(Opcode::Invalid)
    }

    /// Look up an opcode by its assembly mnemonic (case-insensitive).
    pub fn from_mnemonic(mnemonic: &str) -> Option<Opcode> {
        ALL_OPCODES
            .iter()
            .copied()
            .filter(|op| *op != Opcode::Invalid)
            .find(|op| op.mnemonic().eq_ignore_ascii_case(mnemonic))
    }

    /// True for multi-byte opcodes, which always carry an argument.
    pub fn takes_argument(&self) -> bool {
        (*self as u8) >= 0x40
    }

    /// Returns the assembly mnemonic for this opcode.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Invalid => "INVALID",
            Opcode::Ret => "RET",
            Opcode::RetFactory => "RET_FACTORY",
            Opcode::PushZero => "PUSH_ZERO",
            Opcode::Mul => "MUL",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Div => "DIV",
            Opcode::Mod => "MOD",
            Opcode::Inv => "INV",
            Opcode::JoinStr => "JOIN_STR",
            Opcode::JoinPadStr => "JOIN_PAD_STR",
            Opcode::Lt => "LT",
            Opcode::LtEq => "LT_EQ",
            Opcode::NtEq => "NT_EQ",
            Opcode::Eq => "EQ",
            Opcode::Gt => "GT",
            Opcode::GtEq => "GT_EQ",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Not => "NOT",
            Opcode::ContainsStr => "CONTAINS_STR",
            Opcode::Contains0Str => "CONTAINS_0_STR",
            Opcode::GetChunk => "GET_CHUNK",
            Opcode::HiliteChunk => "HILITE_CHUNK",
            Opcode::OntoSpr => "ONTO_SPR",
            Opcode::IntoSpr => "INTO_SPR",
            Opcode::GetField => "GET_FIELD",
            Opcode::StartTell => "START_TELL",
            Opcode::EndTell => "END_TELL",
            Opcode::PushList => "PUSH_LIST",
            Opcode::PushPropList => "PUSH_PROP_LIST",
            Opcode::Swap => "SWAP",
            Opcode::CallJavaScript => "CALL_JAVASCRIPT",
            Opcode::PushInt8 => "PUSH_INT8",
            Opcode::PushArgListNoRet => "PUSH_ARG_LIST_NO_RET",
            Opcode::PushArgList => "PUSH_ARG_LIST",
            Opcode::PushCons => "PUSH_CONS",
            Opcode::PushSymb => "PUSH_SYMB",
            Opcode::PushVarRef => "PUSH_VAR_REF",
            Opcode::GetGlobal2 => "GET_GLOBAL2",
            Opcode::GetGlobal => "GET_GLOBAL",
            Opcode::GetProp => "GET_PROP",
            Opcode::GetParam => "GET_PARAM",
            Opcode::GetLocal => "GET_LOCAL",
            Opcode::SetGlobal2 => "SET_GLOBAL2",
            Opcode::SetGlobal => "SET_GLOBAL",
            Opcode::SetProp => "SET_PROP",
            Opcode::SetParam => "SET_PARAM",
            Opcode::SetLocal => "SET_LOCAL",
            Opcode::Jmp => "JMP",
            Opcode::EndRepeat => "END_REPEAT",
            Opcode::JmpIfZ => "JMP_IF_Z",
            Opcode::LocalCall => "LOCAL_CALL",
            Opcode::ExtCall => "EXT_CALL",
            Opcode::ObjCallV4 => "OBJ_CALL_V4",
            Opcode::Put => "PUT",
            Opcode::PutChunk => "PUT_CHUNK",
            Opcode::DeleteChunk => "DELETE_CHUNK",
            Opcode::Get => "GET",
            Opcode::Set => "SET",
            Opcode::GetMovieProp => "GET_MOVIE_PROP",
            Opcode::SetMovieProp => "SET_MOVIE_PROP",
            Opcode::GetObjProp => "GET_OBJ_PROP",
            Opcode::SetObjProp => "SET_OBJ_PROP",
            Opcode::TellCall => "TELL_CALL",
            Opcode::Peek => "PEEK",
            Opcode::Pop => "POP",
            Opcode::TheBuiltin => "THE_BUILTIN",
            Opcode::ObjCall => "OBJ_CALL",
            Opcode::PushChunkVarRef => "PUSH_CHUNK_VAR_REF",
            Opcode::PushInt16 => "PUSH_INT16",
            Opcode::PushInt32 => "PUSH_INT32",
            Opcode::GetChainedProp => "GET_CHAINED_PROP",
            Opcode::PushFloat32 => "PUSH_FLOAT32",
            Opcode::GetTopLevelProp => "GET_TOP_LEVEL_PROP",
            Opcode::NewObj => "NEW_OBJ",
        }
    }
}
