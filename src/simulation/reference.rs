// src/simulation/reference.rs

//! Dense tensor-product construction of single-qubit operators.
//!
//! Builds the full `2^n x 2^n` operator `I ⊗ .. ⊗ U ⊗ .. ⊗ I` and multiplies
//! it into a vector. Exponential in memory; only useful to cross-check the
//! strided application in [`StateEngine`](super::StateEngine).

/// Kronecker product of two square matrices.
pub fn kron(a: &[Vec<f64>], b: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let (na, nb) = (a.len(), b.len());
    let mut out = vec![vec![0.0; na * nb]; na * nb];
    for (i, row_a) in a.iter().enumerate() {
        for (j, x) in row_a.iter().enumerate() {
            for (k, row_b) in b.iter().enumerate() {
                for (l, y) in row_b.iter().enumerate() {
                    out[i * nb + k][j * nb + l] = x * y;
                }
            }
        }
    }
    out
}

/// Full operator applying `op` at register `position` of an `n`-qubit
/// register, position 0 being the leftmost tensor factor.
pub fn tensor_operator(n: usize, position: usize, op: &[[f64; 2]; 2]) -> Vec<Vec<f64>> {
    let identity = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
    let op: Vec<Vec<f64>> = op.iter().map(|row| row.to_vec()).collect();
    (0..n).fold(vec![vec![1.0]], |acc, q| {
        kron(&acc, if q == position { &op } else { &identity })
    })
}

/// Dense matrix-vector product.
pub fn apply_dense(matrix: &[Vec<f64>], state: &[f64]) -> Vec<f64> {
    matrix
        .iter()
        .map(|row| row.iter().zip(state).map(|(m, s)| m * s).sum())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_has_register_dimension() {
        let m = tensor_operator(3, 1, &[[0.0, 1.0], [1.0, 0.0]]);
        assert_eq!(m.len(), 8);
        // flip of the middle qubit maps |000> to |010>
        let out = apply_dense(&m, &[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(out[0b010], 1.0);
    }
}
