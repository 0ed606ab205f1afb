// src/core/qubit.rs

use super::error::QubitId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Handle to a simulated qubit.
///
/// The label is only for diagnostics. Equality and hashing go through the
/// identity, so two handles created from the same label are still distinct
/// qubits. A handle stays valid as a value after its qubit has been
/// extracted, but the engine rejects it from then on.
#[derive(Debug, Clone)]
pub struct Qubit {
    id: QubitId,
    label: String,
}

impl Qubit {
    /// Gets the unique identity of this qubit.
    pub fn id(&self) -> QubitId {
        self.id
    }

    /// Gets the diagnostic label given at creation.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl PartialEq for Qubit {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Qubit {}

impl Hash for Qubit {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Qubit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// Hands out monotonically increasing qubit identities.
///
/// Owned by a [`StateEngine`](crate::simulation::StateEngine); there is no
/// process-global counter.
#[derive(Debug, Default)]
pub struct QubitAllocator {
    next: u64,
}

impl QubitAllocator {
    /// Creates an allocator starting at identity 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an allocator whose first identity is `start`.
    pub fn starting_at(start: u64) -> Self {
        Self { next: start }
    }

    /// Allocates a fresh handle with the given label.
    pub fn allocate(&mut self, label: &str) -> Qubit {
        let id = QubitId(self.next);
        self.next += 1;
        Qubit {
            id,
            label: label.to_string(),
        }
    }

    /// Raw identity the next allocation will receive.
    pub fn peek_next(&self) -> u64 {
        self.next
    }
}
