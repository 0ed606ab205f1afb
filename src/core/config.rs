// src/core/config.rs

//! Runtime knobs for the engine and the VM.

use super::constants::qrev_constants::NORM_TOLERANCE;

/// Settings for a [`StateEngine`](crate::simulation::StateEngine).
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Seed for the measurement random stream. `None` seeds from the thread RNG.
    pub seed: Option<u64>,
    /// Validate the norm invariant after every gate.
    pub check_norm: bool,
    /// Allowed norm drift when `check_norm` is set.
    pub norm_tolerance: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            check_norm: cfg!(debug_assertions),
            norm_tolerance: NORM_TOLERANCE,
        }
    }
}

impl EngineConfig {
    /// Default configuration with a fixed measurement seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }
}

/// Settings for a [`QuantumVm`](crate::vm::QuantumVm).
#[derive(Debug, Clone, PartialEq)]
pub struct VmConfig {
    /// Engine settings for the single live engine of a run.
    pub engine: EngineConfig,
    /// Name of the program execution starts in.
    pub entry_point: String,
    /// Maximum number of saved frames.
    pub max_call_depth: usize,
    /// Also print each user extraction to stdout.
    pub echo_extractions: bool,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            entry_point: "main".to_string(),
            max_call_depth: 1024,
            echo_extractions: false,
        }
    }
}

impl VmConfig {
    /// Default configuration with a fixed measurement seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            engine: EngineConfig::seeded(seed),
            ..Self::default()
        }
    }

    /// Replaces the entry program name.
    pub fn with_entry_point(mut self, name: impl Into<String>) -> Self {
        self.entry_point = name.into();
        self
    }

    /// Replaces the call depth limit.
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }
}
