// src/core/mod.rs

//! Core data structures and types

pub mod config;
pub mod error;
pub mod qubit;
pub mod state;

pub use config::{EngineConfig, VmConfig};
pub use error::{QrevError, QubitId, Result};
pub use qubit::{Qubit, QubitAllocator};
pub use state::{basis_string, StateVector};

pub mod constants;
pub use constants::qrev_constants::{AMPLITUDE_TOLERANCE, HADAMARD, NORM_TOLERANCE};
