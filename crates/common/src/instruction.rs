//! Instruction decoding and encoding for Lingo bytecode.
//!
//! A handler's bytecode is a stream of variable-width instructions,
//! big-endian:
//! ```text
//! op <  0x40   no argument
//! op >= 0x40   1-byte argument
//! op >= 0x80   2-byte argument
//! op >= 0xC0   4-byte argument
//! ```
//! PUSH_INT8 and PUSH_INT16 arguments are sign-extended; every other 1- and
//! 2-byte argument is unsigned. 4-byte arguments are always signed.

use crate::error::DecodeError;
use crate::opcode::Opcode;

/// A single decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    /// Byte offset of the instruction within its handler.
    pub offset: usize,
    /// The canonical operation.
    pub opcode: Opcode,
    /// The opcode byte as it appeared in the stream.
    pub raw: u8,
    /// Decoded argument, 0 for single-byte opcodes.
    pub argument: i32,
}

impl Instruction {
    /// Create an instruction with its canonical (narrowest) raw encoding.
    pub fn new(offset: usize, opcode: Opcode, argument: i32) -> Self {
        let raw = encode_instruction(opcode, argument)[0];
        Self {
            offset,
            opcode,
            raw,
            argument,
        }
    }

    /// Encoded size in bytes, derived from the raw opcode byte.
    pub fn width(&self) -> usize {
        1 + argument_width(self.raw)
    }
}

fn argument_width(raw: u8) -> usize {
    match raw {
        0xC0..=0xFF => 4,
        0x80..=0xBF => 2,
        0x40..=0x7F => 1,
        _ => 0,
    }
}

fn signed_immediate(opcode: Opcode) -> bool {
    matches!(opcode, Opcode::PushInt8 | Opcode::PushInt16)
}

/// Decode a handler's raw bytecode into instructions.
pub fn decode_bytecode(bytes: &[u8]) -> Result<Vec<Instruction>, DecodeError> {
    let mut instructions = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let offset = pos;
        let raw = bytes[pos];
        let opcode = Opcode::from_code(raw);
        pos += 1;

        let width = argument_width(raw);
        let available = bytes.len() - pos;
        if available < width {
            return Err(DecodeError::TruncatedArgument {
                offset,
                width,
                available,
            });
        }

        let arg = &bytes[pos..pos + width];
        let argument = match width {
            4 => i32::from_be_bytes([arg[0], arg[1], arg[2], arg[3]]),
            2 if signed_immediate(opcode) => i16::from_be_bytes([arg[0], arg[1]]) as i32,
            2 => u16::from_be_bytes([arg[0], arg[1]]) as i32,
            1 if opcode == Opcode::PushInt8 => arg[0] as i8 as i32,
            1 => arg[0] as i32,
            _ => 0,
        };
        pos += width;

        instructions.push(Instruction {
            offset,
            opcode,
            raw,
            argument,
        });
    }

    Ok(instructions)
}

/// Encode one instruction, choosing the narrowest argument width that
/// decodes back to `argument`.
pub fn encode_instruction(opcode: Opcode, argument: i32) -> Vec<u8> {
    let code = opcode as u8;
    if !opcode.takes_argument() {
        return vec![code];
    }

    let base = code - 0x40;
    let signed = signed_immediate(opcode);
    let fits_one = if signed && opcode == Opcode::PushInt8 {
        i8::try_from(argument).is_ok()
    } else {
        u8::try_from(argument).is_ok()
    };
    let fits_two = if signed {
        i16::try_from(argument).is_ok()
    } else {
        u16::try_from(argument).is_ok()
    };

    if fits_one {
        vec![0x40 + base, argument as u8]
    } else if fits_two {
        let mut out = vec![0x80 + base];
        out.extend_from_slice(&(argument as u16).to_be_bytes());
        out
    } else {
        let mut out = vec![0xC0 + base];
        out.extend_from_slice(&argument.to_be_bytes());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_single_byte_ops() {
        let instrs = decode_bytecode(&[0x03, 0x05, 0x01]).unwrap();
        assert_eq!(instrs.len(), 3);
        assert_eq!(instrs[0].opcode, Opcode::PushZero);
        assert_eq!(instrs[1].opcode, Opcode::Add);
        assert_eq!(instrs[2].offset, 2);
        assert_eq!(instrs[2].argument, 0);
    }

    #[test]
    fn push_int8_is_sign_extended() {
        let instrs = decode_bytecode(&[0x41, 0xFF]).unwrap();
        assert_eq!(instrs[0].opcode, Opcode::PushInt8);
        assert_eq!(instrs[0].argument, -1);
    }

    #[test]
    fn other_one_byte_arguments_are_unsigned() {
        let instrs = decode_bytecode(&[0x4C, 0xF0]).unwrap();
        assert_eq!(instrs[0].opcode, Opcode::GetLocal);
        assert_eq!(instrs[0].argument, 0xF0);
    }

    #[test]
    fn two_byte_arguments() {
        let instrs = decode_bytecode(&[0x93, 0x01, 0x00, 0xAE, 0xFF, 0x38]).unwrap();
        assert_eq!(instrs[0].opcode, Opcode::Jmp);
        assert_eq!(instrs[0].argument, 256);
        assert_eq!(instrs[1].opcode, Opcode::PushInt16);
        assert_eq!(instrs[1].offset, 3);
        assert_eq!(instrs[1].argument, -200);
    }

    #[test]
    fn four_byte_arguments() {
        let instrs = decode_bytecode(&[0xEF, 0x00, 0x01, 0x86, 0xA0]).unwrap();
        assert_eq!(instrs[0].opcode, Opcode::PushInt32);
        assert_eq!(instrs[0].argument, 100_000);
        assert_eq!(instrs[0].width(), 5);
    }

    #[test]
    fn truncated_argument_is_rejected() {
        assert_eq!(
            decode_bytecode(&[0x05, 0x93, 0x01]),
            Err(DecodeError::TruncatedArgument {
                offset: 1,
                width: 2,
                available: 1
            })
        );
    }

    #[test]
    fn unknown_opcode_decodes_as_invalid() {
        let instrs = decode_bytecode(&[0x20, 0x47, 0x03]).unwrap();
        assert_eq!(instrs[0].opcode, Opcode::Invalid);
        assert_eq!(instrs[1].opcode, Opcode::Invalid);
        assert_eq!(instrs[1].argument, 3);
    }

    #[test]
    fn encode_picks_narrowest_width() {
        assert_eq!(encode_instruction(Opcode::Add, 0), vec![0x05]);
        assert_eq!(encode_instruction(Opcode::PushInt8, -3), vec![0x41, 0xFD]);
        assert_eq!(encode_instruction(Opcode::GetLocal, 200), vec![0x4C, 200]);
        assert_eq!(
            encode_instruction(Opcode::Jmp, 300),
            vec![0x93, 0x01, 0x2C]
        );
        assert_eq!(
            encode_instruction(Opcode::PushInt16, -300),
            vec![0xAE, 0xFE, 0xD4]
        );
        assert_eq!(
            encode_instruction(Opcode::ExtCall, -1),
            vec![0xD7, 0xFF, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn instruction_new_uses_canonical_raw_byte() {
        let instr = Instruction::new(4, Opcode::PushInt32, 70_000);
        assert_eq!(instr.raw, 0xEF);
        assert_eq!(instr.width(), 5);
        assert_eq!(instr.offset, 4);
    }
}
