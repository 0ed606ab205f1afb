// src/core/error.rs

//! Crate error type and qubit identity.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Process-unique identity of a simulated qubit.
///
/// Identities are handed out by a [`QubitAllocator`](super::QubitAllocator)
/// and never reused, so two handles refer to the same qubit exactly when
/// their ids are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QubitId(pub u64);

impl fmt::Display for QubitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q#{}", self.0)
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, QrevError>;

/// Failures raised by the engine, the compiler, the loader and the VM.
///
/// Every variant is terminal for a VM run: the interpreter stops at the
/// first failing instruction and does not retry.
#[derive(Debug, Error)]
pub enum QrevError {
    /// Malformed or unrecognised source line.
    #[error("parse error in `{line}`: {reason}")]
    Parse {
        /// The offending source line, trimmed.
        line: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A local name is not bound in the active workspace.
    #[error("unknown symbol `{name}`")]
    UnknownSymbol {
        /// The name that failed to resolve.
        name: String,
    },

    /// A call or conditional call names an undefined program.
    #[error("unknown program `{name}`")]
    UnknownProgram {
        /// The program name that failed to resolve.
        name: String,
    },

    /// No entry program was loaded.
    #[error("missing entry point `{name}`")]
    MissingEntryPoint {
        /// The entry program name that was expected.
        name: String,
    },

    /// A construct that is recognised but has no execution semantics.
    #[error("unsupported construct: {construct}")]
    UnsupportedConstruct {
        /// Description of the construct.
        construct: String,
    },

    /// Measurement selected an outcome whose probability mass is zero, so
    /// the post-measurement state cannot be renormalised.
    #[error("degenerate measurement of {qubit}: retained probability mass {mass}")]
    DegenerateMeasurement {
        /// Label of the measured qubit.
        qubit: String,
        /// The probability mass that would have been renormalised.
        mass: f64,
    },

    /// The handle's qubit is no longer in the register.
    #[error("qubit `{label}` ({id}) is not live")]
    QubitNotLive {
        /// Diagnostic label of the handle.
        label: String,
        /// Identity of the handle.
        id: QubitId,
    },

    /// The same qubit was passed twice where distinct qubits are required.
    #[error("qubit `{label}` used more than once in {operation}")]
    DuplicateOperand {
        /// Diagnostic label of the repeated qubit.
        label: String,
        /// The primitive that rejected it.
        operation: &'static str,
    },

    /// Positional argument binding count mismatch.
    #[error("`{program}` expects {expected} argument(s), got {found}")]
    ArityMismatch {
        /// The callee.
        program: String,
        /// Number of formals.
        expected: usize,
        /// Number of actuals supplied.
        found: usize,
    },

    /// The frame stack grew past the configured limit.
    #[error("call depth limit of {limit} exceeded")]
    CallDepthExceeded {
        /// The configured limit.
        limit: usize,
    },

    /// Sum of squared amplitudes drifted away from one.
    #[error("state norm {norm} deviates from 1 by more than {tolerance}")]
    NormViolation {
        /// Observed sum of squared amplitudes.
        norm: f64,
        /// Allowed deviation.
        tolerance: f64,
    },

    /// A compiler-managed wire was observed in |1> when discarded.
    #[error("ancilla `{name}` was not restored to |0> before discard")]
    DirtyAncilla {
        /// Local name of the wire.
        name: String,
    },

    /// Two definitions claim the same generated program name.
    #[error("program `{name}` is already defined")]
    DuplicateDefinition {
        /// The contested name.
        name: String,
    },

    /// A classical program violates single assignment or scoping rules.
    #[error("invalid classical program `{program}`: {reason}")]
    InvalidClassicalProgram {
        /// Program name.
        program: String,
        /// The violated rule.
        reason: String,
    },

    /// A program source file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

impl QrevError {
    /// Shorthand for building a [`QrevError::Parse`].
    pub(crate) fn parse(line: &str, reason: impl Into<String>) -> Self {
        QrevError::Parse {
            line: line.trim().to_string(),
            reason: reason.into(),
        }
    }
}
