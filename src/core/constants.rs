// src/core/constants.rs

//! Numeric constants shared by the engine and its validators.

/// Tolerances and fixed matrices used by the simulation.
pub mod qrev_constants {
    /// Allowed drift of the sum of squared amplitudes from 1.
    pub const NORM_TOLERANCE: f64 = 1e-9;
    /// Probability below which a basis state is treated as unreachable.
    pub const AMPLITUDE_TOLERANCE: f64 = 1e-12;
    /// 1/sqrt(2)
    pub const FRAC_1_SQRT_2: f64 = std::f64::consts::FRAC_1_SQRT_2;
    /// Normalised Hadamard matrix.
    pub const HADAMARD: [[f64; 2]; 2] = [
        [FRAC_1_SQRT_2, FRAC_1_SQRT_2],
        [FRAC_1_SQRT_2, -FRAC_1_SQRT_2],
    ];
}
