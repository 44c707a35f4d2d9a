//! Show-script language for pyramid lighting programs.
//!
//! A show script is a small imperative program: integer arithmetic, lists,
//! loops and functions, plus one builtin per packet command. Running it
//! against a [`lpc_program::Program`] emits packets in execution order.
//!
//! The interpreter is sandboxed. Scripts cannot touch files, the network or
//! the environment; the only side effects are the host's output designation
//! and packet emission. Work is bounded by [`ScriptLimits`].
//!
//! ```
//! use lpc_program::{MemorySink, Program, ProgramConfig};
//! use lpc_script::{run_script, ScriptLimits};
//!
//! let sink = MemorySink::new();
//! let mut program = Program::new(ProgramConfig::default());
//! program.set_output_sink(Box::new(sink.clone())).unwrap();
//!
//! run_script("reset_clock(ALL);", &mut program, &ScriptLimits::default()).unwrap();
//! assert_eq!(sink.contents(), vec![0xC0, 0x00, 0xFF, 0xFF, 0xC0]);
//! ```

pub mod ast;
mod builtins;
pub mod error;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod value;

pub use error::{Pos, Result, ScriptError};
pub use interp::{run, run_script, RunStats, ScriptLimits};
pub use parser::{parse, parse_with_depth};
pub use value::Value;
