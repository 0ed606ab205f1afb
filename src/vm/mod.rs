// src/vm/mod.rs

//! The circuit language: instruction model, source parsing, program
//! loading and the interpreter.

mod frame;
mod interpreter;
mod loader;
pub mod parser;
mod program;

pub use frame::{CallStack, ExecutionFrame, Workspace};
pub use interpreter::{Extraction, QuantumVm, VmStatus};
pub use loader::{Loader, ProgramSet};
pub use parser::{parse_instruction, parse_source, CircuitSource, Include, SourceKind};
pub use program::{CallAction, CircuitProgram, Instruction, ProgramBuilder};
