//! Error types for the Lingo assembler.

use thiserror::Error;

/// Errors produced while assembling text into a script library.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AsmError {
    /// An unrecognized opcode mnemonic was encountered.
    #[error("line {line}: unknown opcode '{token}'")]
    UnknownOpcode { line: usize, token: String },

    /// An opcode that takes an argument was given none.
    #[error("line {line}: {opcode} expects an argument")]
    MissingArgument { line: usize, opcode: &'static str },

    /// An opcode that takes no argument was given one.
    #[error("line {line}: {opcode} takes no argument")]
    UnexpectedArgument { line: usize, opcode: &'static str },

    /// A numeric literal could not be parsed or is out of range.
    #[error("line {line}: invalid number '{token}'")]
    InvalidNumber { line: usize, token: String },

    /// A token appeared where it was not expected.
    #[error("line {line}: unexpected token '{token}'")]
    UnexpectedToken { line: usize, token: String },

    #[error("line {line}: unterminated string")]
    UnterminatedString { line: usize },

    #[error("line {line}: unknown script kind '{token}'")]
    UnknownScriptKind { line: usize, token: String },

    /// A directive or instruction outside the block it belongs to.
    #[error("line {line}: '{token}' is not allowed here")]
    Misplaced { line: usize, token: String },

    /// The input ended inside a script or handler.
    #[error("line {line}: missing 'end' for {block}")]
    UnclosedBlock { line: usize, block: String },

    #[error("line {line}: label @{label} is defined twice")]
    DuplicateLabel { line: usize, label: String },

    #[error("line {line}: undefined label @{label}")]
    UndefinedLabel { line: usize, label: String },

    #[error("line {line}: script member {member} is defined twice")]
    DuplicateScript { line: usize, member: i32 },

    /// A variable opcode named a slot that the handler does not declare.
    #[error("line {line}: no argument or local named '{name}'")]
    UnknownVariable { line: usize, name: String },
}

impl AsmError {
    /// Source line the error refers to.
    pub fn line(&self) -> usize {
        match self {
            AsmError::UnknownOpcode { line, .. }
            | AsmError::MissingArgument { line, .. }
            | AsmError::UnexpectedArgument { line, .. }
            | AsmError::InvalidNumber { line, .. }
            | AsmError::UnexpectedToken { line, .. }
            | AsmError::UnterminatedString { line }
            | AsmError::UnknownScriptKind { line, .. }
            | AsmError::Misplaced { line, .. }
            | AsmError::UnclosedBlock { line, .. }
            | AsmError::DuplicateLabel { line, .. }
            | AsmError::UndefinedLabel { line, .. }
            | AsmError::DuplicateScript { line, .. }
            | AsmError::UnknownVariable { line, .. } => *line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_unknown_opcode() {
        let e = AsmError::UnknownOpcode {
            line: 3,
            token: "FOO".to_string(),
        };
        assert_eq!(e.to_string(), "line 3: unknown opcode 'FOO'");
    }

    #[test]
    fn error_display_missing_argument() {
        let e = AsmError::MissingArgument {
            line: 7,
            opcode: "GET_LOCAL",
        };
        assert_eq!(e.to_string(), "line 7: GET_LOCAL expects an argument");
    }

    #[test]
    fn error_display_labels() {
        let e = AsmError::UndefinedLabel {
            line: 9,
            label: "loop".to_string(),
        };
        assert_eq!(e.to_string(), "line 9: undefined label @loop");
        assert_eq!(e.line(), 9);
    }

    #[test]
    fn error_display_unclosed_block() {
        let e = AsmError::UnclosedBlock {
            line: 12,
            block: "handler go".to_string(),
        };
        assert_eq!(e.to_string(), "line 12: missing 'end' for handler go");
    }
}
