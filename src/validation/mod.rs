// src/validation/mod.rs

//! Checks on [`StateVector`] invariants.

use crate::core::{QrevError, Result, StateVector, NORM_TOLERANCE};

/// Checks that the sum of squared amplitudes is within `tolerance` of 1.
///
/// # Errors
/// Returns [`QrevError::NormViolation`] on drift, including a NaN norm.
pub fn check_normalization(state: &StateVector, tolerance: f64) -> Result<()> {
    let norm = state.norm_sqr();
    if (norm - 1.0).abs() <= tolerance {
        Ok(())
    } else {
        Err(QrevError::NormViolation { norm, tolerance })
    }
}

/// Checks that the vector is a valid register state: a power-of-two
/// length, finite amplitudes and unit norm within the default tolerance.
pub fn validate_state(state: &StateVector) -> Result<()> {
    if !state.dim().is_power_of_two() {
        return Err(QrevError::NormViolation {
            norm: f64::NAN,
            tolerance: NORM_TOLERANCE,
        });
    }
    if let Some(bad) = state.amplitudes().iter().find(|a| !a.is_finite()) {
        return Err(QrevError::NormViolation {
            norm: *bad,
            tolerance: NORM_TOLERANCE,
        });
    }
    check_normalization(state, NORM_TOLERANCE)
}
