//! Runtime errors for the Lingo VM.
//!
//! Only conditions that abort the current call chain are errors. A missing
//! handler is not one: event handlers are optional, so lookups that fail
//! yield void instead.

use thiserror::Error;

/// Errors that abort a handler call.
///
/// Variants raised while running bytecode carry the handler name and the byte
/// offset (`at`) of the offending instruction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    /// A call was attempted with the call stack already at its limit.
    #[error("call stack overflow calling {handler} (max {depth} frames)")]
    CallStackOverflow { handler: String, depth: usize },

    /// A single handler invocation ran more instructions than allowed.
    #[error("step limit of {limit} instructions exceeded in {handler} at offset {at}")]
    StepLimitExceeded {
        handler: String,
        at: usize,
        limit: u64,
    },

    /// DIV with a zero divisor.
    #[error("division by zero in {handler} at offset {at}")]
    DivisionByZero { handler: String, at: usize },

    /// MOD with a zero divisor.
    #[error("modulo by zero in {handler} at offset {at}")]
    ModuloByZero { handler: String, at: usize },

    /// Raised by a host-supplied builtin.
    #[error("{message}")]
    Script { message: String },
}

impl VmError {
    /// Build a [`VmError::Script`] from any message.
    pub fn script(message: impl Into<String>) -> Self {
        VmError::Script {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formats() {
        assert_eq!(
            VmError::DivisionByZero {
                handler: "tick".into(),
                at: 12
            }
            .to_string(),
            "division by zero in tick at offset 12"
        );
        assert_eq!(
            VmError::CallStackOverflow {
                handler: "recurse".into(),
                depth: 50
            }
            .to_string(),
            "call stack overflow calling recurse (max 50 frames)"
        );
        assert_eq!(
            VmError::StepLimitExceeded {
                handler: "spin".into(),
                at: 4,
                limit: 100
            }
            .to_string(),
            "step limit of 100 instructions exceeded in spin at offset 4"
        );
        assert_eq!(VmError::script("boom").to_string(), "boom");
    }
}
