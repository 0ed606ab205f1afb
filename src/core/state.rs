// src/core/state.rs

use super::constants::qrev_constants::AMPLITUDE_TOLERANCE;
use std::fmt;

/// Real-valued amplitude vector of the whole register.
///
/// Index `k` is the basis state whose binary expansion, read with the
/// first-registered qubit as the most significant bit, assigns 0/1 to every
/// live qubit. The length is always `2^n` for `n` live qubits; with no live
/// qubits the vector is the scalar `[1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct StateVector {
    amplitudes: Vec<f64>,
}

impl StateVector {
    /// The empty-register state, the scalar 1.
    pub fn scalar() -> Self {
        Self {
            amplitudes: vec![1.0],
        }
    }

    pub(crate) fn from_amplitudes(amplitudes: Vec<f64>) -> Self {
        Self { amplitudes }
    }

    /// Read-only view of the amplitudes.
    pub fn amplitudes(&self) -> &[f64] {
        &self.amplitudes
    }

    pub(crate) fn amplitudes_mut(&mut self) -> &mut [f64] {
        &mut self.amplitudes
    }

    /// Number of basis states (`2^n`).
    pub fn dim(&self) -> usize {
        self.amplitudes.len()
    }

    /// Number of qubits encoded by this vector.
    pub fn num_qubits(&self) -> usize {
        self.amplitudes.len().trailing_zeros() as usize
    }

    /// Sum of squared amplitudes.
    pub fn norm_sqr(&self) -> f64 {
        self.amplitudes.iter().map(|a| a * a).sum()
    }

    /// Born-rule probability of every basis state, in index order.
    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(|a| a * a).collect()
    }

    /// Right-tensors a fresh |0> factor onto the state.
    pub(crate) fn tensor_zero(&mut self) {
        let mut next = vec![0.0; self.amplitudes.len() * 2];
        for (i, a) in self.amplitudes.iter().enumerate() {
            next[i << 1] = *a;
        }
        self.amplitudes = next;
    }

    /// Approximate equality within `tolerance` per amplitude.
    pub fn approx_eq(&self, other: &StateVector, tolerance: f64) -> bool {
        self.dim() == other.dim()
            && self
                .amplitudes
                .iter()
                .zip(other.amplitudes.iter())
                .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

impl Default for StateVector {
    fn default() -> Self {
        Self::scalar()
    }
}

/// Renders a basis index as a bit string of `width` characters, most
/// significant (first-registered) qubit first.
pub fn basis_string(index: usize, width: usize) -> String {
    (0..width)
        .map(|pos| {
            if (index >> (width - 1 - pos)) & 1 == 1 {
                '1'
            } else {
                '0'
            }
        })
        .collect()
}

impl fmt::Display for StateVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.num_qubits();
        write!(f, "[")?;
        let mut first = true;
        for (k, a) in self.amplitudes.iter().enumerate() {
            // rounding residue of an unreachable basis state
            if a.abs() < AMPLITUDE_TOLERANCE {
                continue;
            }
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{:+.4}|{}>", a, basis_string(k, width))?;
        }
        write!(f, "]")
    }
}
