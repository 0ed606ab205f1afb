// src/lib.rs

//! `qrev` - a state-vector simulator and interpreter for a small
//! reversible-circuit language.
//!
//! Circuit programs are line-oriented `def` blocks of gate, call and
//! measurement instructions over named qubits. Classical programs are
//! single-assignment AND/OR/NOT functions; the [`compiler`] lowers each one
//! to reversible circuits (`if_f_then_toggle_onto`, `if_f_then_toggle`,
//! `if_f_then_minus`) that circuit programs invoke with
//! `if f(args) then toggle t` or `if f(args) then minus`.
//!
//! The [`QuantumVm`] runs a loaded [`ProgramSet`] against one
//! [`StateEngine`], a real-amplitude state vector with Born-rule
//! measurement.

pub mod classical;
pub mod compiler;
pub mod core;
pub mod operations;
pub mod simulation;
pub mod validation;
pub mod vm;

mod syntax;

// Re-export the most common types for easier top-level use
pub use classical::ClassicalProgram;
pub use compiler::{CompiledFunction, Compiler};
pub use crate::core::{EngineConfig, QrevError, Qubit, QubitId, Result, StateVector, VmConfig};
pub use operations::{Operation, Targets};
pub use simulation::StateEngine;
pub use validation::{check_normalization, validate_state};
pub use vm::{
    CircuitProgram, Extraction, Instruction, Loader, ProgramBuilder, ProgramSet, QuantumVm,
    VmStatus,
};

// Deutsch's problem: one query through the minus form decides whether a
// one-bit function is constant or balanced.
/// ```
/// use qrev::{ProgramSet, QuantumVm, VmConfig};
///
/// let circuit = "
/// def main()
/// new qubit x
/// Hadamard x
/// if negate(x) then minus
/// Hadamard x
/// extract x
/// ";
/// let classical = "
/// def negate(a)
/// b := NOT a
/// return b
/// ";
///
/// let programs = ProgramSet::from_sources(circuit, &[classical])?;
/// let mut vm = QuantumVm::new(programs, VmConfig::seeded(42))?;
/// vm.run()?;
///
/// // balanced function: the query qubit always reads 1
/// assert_eq!(vm.extractions()[0].bits, "1");
/// assert_eq!(vm.engine().num_qubits(), 0);
/// # Ok::<(), qrev::QrevError>(())
/// ```
#[doc(hidden)]
const _: () = (); // Attaches the preceding doc comment block to a hidden item
