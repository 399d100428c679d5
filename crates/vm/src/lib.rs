//! Lingo virtual machine: executes decoded Director script handlers.
//!
//! The VM is a stack machine with:
//! - A per-handler [`Scope`] holding the operand stack, arguments and locals
//! - A call stack bounded by [`VmConfig::max_call_depth`]
//! - An [`InstanceHeap`](lingo_common::InstanceHeap) of script instances linked
//!   through `ancestor` properties
//! - A case-insensitive builtin registry consulted before script handlers
//!
//! Handlers are found in the movie's own library first and then through a
//! [`CastLibProvider`].
//!
//! # Usage
//!
//! ```
//! use lingo_common::Datum;
//! use lingo_vm::LingoVM;
//!
//! let library = lingo_assembler::assemble(
//!     r#"
//!     script 1 movie
//!       handler double n
//!         GET_PARAM 0
//!         PUSH_INT8 2
//!         MUL
//!         RET
//!       end
//!     end
//!     "#,
//! )
//! .unwrap();
//!
//! let mut vm = LingoVM::new();
//! vm.set_movie(library);
//! let result = vm.call_handler("double", &[Datum::Int(21)]).unwrap();
//! assert_eq!(result, Datum::Int(42));
//! ```

pub mod ancestor;
pub mod builtins;
pub mod chunks;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod execute;
pub mod machine;
pub mod ops;
pub mod resolver;
pub mod scope;
pub mod trace;

pub use builtins::{BuiltinFn, BuiltinRegistry};
pub use config::{AddAtPolicy, VmConfig};
pub use error::VmError;
pub use machine::LingoVM;
pub use resolver::{CastLibProvider, HandlerLocation, StaticCastLibs};
pub use scope::Scope;
pub use trace::{HandlerInfo, InstructionInfo, LogTrace, TraceListener};
