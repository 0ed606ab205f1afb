// src/simulation/mod.rs

//! State-vector simulation.
//!
//! [`StateEngine`] owns the register and amplitude vector and exposes the
//! gate and measurement primitives. [`reference`] holds a dense
//! tensor-product implementation used to cross-check the engine.

pub mod engine;
pub mod reference;

pub use engine::StateEngine;
