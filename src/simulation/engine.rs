// src/simulation/engine.rs
use crate::core::{
    basis_string, EngineConfig, Qubit, QubitAllocator, QubitId, QrevError, Result, StateVector,
    HADAMARD,
};
use crate::operations::{Operation, Targets};
use crate::validation::check_normalization;
use rand::distr::{Distribution, StandardUniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt;
use tracing::{debug, trace};

/// The state-vector engine: an ordered register of live qubits and the real
/// amplitude vector over them.
///
/// Register position 0 is the most significant bit of an amplitude index.
/// Single-qubit operators are applied over index pairs that differ only in
/// the target bit; the reversible gates are index permutations. Nothing
/// outside the engine mutates the state.
///
/// # Examples
///
/// ```
/// use qrev::simulation::StateEngine;
/// use qrev::EngineConfig;
///
/// let mut qc = StateEngine::with_config(EngineConfig::seeded(7));
/// let q = qc.new_qubit(&["a", "b"]);
/// qc.hadamard(&q[0])?;
/// qc.if_a_then_toggle_b(&q[0], &q[1])?;
/// let bits = qc.extract_all()?;
/// assert!(bits == "00" || bits == "11");
/// assert_eq!(qc.num_qubits(), 0);
/// # Ok::<(), qrev::QrevError>(())
/// ```
pub struct StateEngine {
    allocator: QubitAllocator,
    register: Vec<Qubit>,
    state: StateVector,
    rng: StdRng,
    config: EngineConfig,
}

impl StateEngine {
    /// Creates an engine with an empty register and default settings.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Creates an engine with an empty register.
    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_allocator(config, QubitAllocator::new())
    }

    /// Creates an engine drawing qubit identities from `allocator`.
    pub fn with_allocator(config: EngineConfig, allocator: QubitAllocator) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        Self {
            allocator,
            register: Vec::new(),
            state: StateVector::scalar(),
            rng,
            config,
        }
    }

    // --- Register ---

    /// Appends one fresh |0> qubit per label, in order, and returns their
    /// handles. Later labels occupy less significant bits.
    pub fn new_qubit<S: AsRef<str>>(&mut self, labels: &[S]) -> Vec<Qubit> {
        labels
            .iter()
            .map(|label| {
                let qubit = self.allocator.allocate(label.as_ref());
                self.state.tensor_zero();
                self.register.push(qubit.clone());
                trace!(qubit = %qubit, id = %qubit.id(), dim = self.state.dim(), "qubit created");
                qubit
            })
            .collect()
    }

    /// Identity the next declared qubit will receive.
    pub fn next_qubit_id(&self) -> QubitId {
        QubitId(self.allocator.peek_next())
    }

    /// Live qubits in significance order.
    pub fn live_qubits(&self) -> &[Qubit] {
        &self.register
    }

    /// Number of live qubits.
    pub fn num_qubits(&self) -> usize {
        self.register.len()
    }

    /// Whether the handle's qubit is still in the register.
    pub fn is_live(&self, qubit: &Qubit) -> bool {
        self.register.contains(qubit)
    }

    /// Current amplitude vector.
    pub fn state(&self) -> &StateVector {
        &self.state
    }

    /// Born-rule distribution over basis states.
    pub fn probabilities(&self) -> Vec<f64> {
        self.state.probabilities()
    }

    /// Writes the amplitude vector to stdout.
    pub fn print_state(&self) {
        println!("{}", self.state);
    }

    fn position(&self, qubit: &Qubit) -> Result<usize> {
        self.register
            .iter()
            .position(|q| q == qubit)
            .ok_or_else(|| QrevError::QubitNotLive {
                label: qubit.label().to_string(),
                id: qubit.id(),
            })
    }

    /// Bit mask of a qubit inside an amplitude index.
    fn mask(&self, qubit: &Qubit) -> Result<usize> {
        let pos = self.position(qubit)?;
        Ok(1usize << (self.register.len() - 1 - pos))
    }

    fn distinct(operation: &'static str, qubits: &[&Qubit]) -> Result<()> {
        for (i, q) in qubits.iter().enumerate() {
            if qubits[..i].contains(q) {
                return Err(QrevError::DuplicateOperand {
                    label: q.label().to_string(),
                    operation,
                });
            }
        }
        Ok(())
    }

    fn after_gate(&self, gate: &'static str) -> Result<()> {
        trace!(gate, "gate applied");
        if self.config.check_norm {
            check_normalization(&self.state, self.config.norm_tolerance)?;
        }
        Ok(())
    }

    // --- Single-qubit operators ---

    /// Applies a 2x2 real operator to one qubit, identity elsewhere.
    ///
    /// Works on the index pairs `(i, i | stride)` with
    /// `stride = 2^(n-1-position)`; the result equals multiplying by the
    /// full tensor-product operator.
    pub fn single_qubit_op(&mut self, qubit: &Qubit, matrix: &[[f64; 2]; 2]) -> Result<()> {
        let stride = self.mask(qubit)?;
        let amps = self.state.amplitudes_mut();
        for i in 0..amps.len() {
            if i & stride != 0 {
                continue;
            }
            let (a, b) = (amps[i], amps[i | stride]);
            amps[i] = matrix[0][0] * a + matrix[0][1] * b;
            amps[i | stride] = matrix[1][0] * a + matrix[1][1] * b;
        }
        self.after_gate("single_qubit_op")
    }

    /// Applies the normalised Hadamard to one qubit.
    pub fn hadamard(&mut self, qubit: &Qubit) -> Result<()> {
        self.single_qubit_op(qubit, &HADAMARD)
    }

    /// Applies Hadamard to each listed qubit in turn.
    pub fn hadamard_many(&mut self, qubits: &[Qubit]) -> Result<()> {
        for q in qubits {
            self.position(q)?;
        }
        for q in qubits {
            self.hadamard(q)?;
        }
        Ok(())
    }

    /// Applies Hadamard to every live qubit.
    pub fn hadamard_all(&mut self) -> Result<()> {
        let live = self.register.clone();
        self.hadamard_many(&live)
    }

    /// Rotation by `degrees`: `[[cos, -sin], [sin, cos]]`.
    pub fn rotate(&mut self, qubit: &Qubit, degrees: f64) -> Result<()> {
        let theta = degrees.to_radians();
        let (sin, cos) = theta.sin_cos();
        self.single_qubit_op(qubit, &[[cos, -sin], [sin, cos]])
    }

    // --- Reversible permutations ---

    /// Bit flip.
    pub fn toggle(&mut self, qubit: &Qubit) -> Result<()> {
        let m = self.mask(qubit)?;
        let amps = self.state.amplitudes_mut();
        for i in 0..amps.len() {
            if i & m == 0 {
                amps.swap(i, i | m);
            }
        }
        self.after_gate("toggle")
    }

    /// CNOT: flips `b` on every basis state where `a` is 1.
    pub fn if_a_then_toggle_b(&mut self, a: &Qubit, b: &Qubit) -> Result<()> {
        Self::distinct("if A then toggle B", &[a, b])?;
        let (ma, mb) = (self.mask(a)?, self.mask(b)?);
        let amps = self.state.amplitudes_mut();
        for i in 0..amps.len() {
            if i & ma != 0 && i & mb == 0 {
                amps.swap(i, i | mb);
            }
        }
        self.after_gate("cnot")
    }

    /// Toffoli: flips `c` on every basis state where `a` and `b` are 1.
    pub fn if_a_and_b_then_toggle_c(&mut self, a: &Qubit, b: &Qubit, c: &Qubit) -> Result<()> {
        Self::distinct("if A AND B then toggle C", &[a, b, c])?;
        let (ma, mb, mc) = (self.mask(a)?, self.mask(b)?, self.mask(c)?);
        let controls = ma | mb;
        let amps = self.state.amplitudes_mut();
        for i in 0..amps.len() {
            if i & controls == controls && i & mc == 0 {
                amps.swap(i, i | mc);
            }
        }
        self.after_gate("toffoli")
    }

    /// Anti-controlled toggle, as `toggle(a); cnot(a, b); toggle(a)`.
    pub fn if_not_a_then_toggle_b(&mut self, a: &Qubit, b: &Qubit) -> Result<()> {
        Self::distinct("if NOT A then toggle B", &[a, b])?;
        self.toggle(a)?;
        self.if_a_then_toggle_b(a, b)?;
        self.toggle(a)
    }

    /// OR-toggle through De Morgan: the six-step sequence
    /// `toggle a, toggle b, toffoli(a, b, c), toggle c, toggle b, toggle a`.
    pub fn if_a_or_b_then_toggle_c(&mut self, a: &Qubit, b: &Qubit, c: &Qubit) -> Result<()> {
        Self::distinct("if A OR B then toggle C", &[a, b, c])?;
        self.toggle(a)?;
        self.toggle(b)?;
        self.if_a_and_b_then_toggle_c(a, b, c)?;
        self.toggle(c)?;
        self.toggle(b)?;
        self.toggle(a)
    }

    /// Exchanges the values of two qubits.
    pub fn swap(&mut self, a: &Qubit, b: &Qubit) -> Result<()> {
        Self::distinct("swap", &[a, b])?;
        let (ma, mb) = (self.mask(a)?, self.mask(b)?);
        let amps = self.state.amplitudes_mut();
        for i in 0..amps.len() {
            if i & ma != 0 && i & mb == 0 {
                amps.swap(i, i ^ ma ^ mb);
            }
        }
        self.after_gate("swap")
    }

    /// Negates every amplitude where `a` is 1.
    pub fn if_a_then_minus(&mut self, a: &Qubit) -> Result<()> {
        let m = self.mask(a)?;
        for (i, amp) in self.state.amplitudes_mut().iter_mut().enumerate() {
            if i & m != 0 {
                *amp = -*amp;
            }
        }
        self.after_gate("minus")
    }

    /// Applies a resolved [`Operation`].
    pub fn apply_operation(&mut self, op: &Operation<Qubit>) -> Result<()> {
        match op {
            Operation::Hadamard(Targets::All) => self.hadamard_all(),
            Operation::Hadamard(Targets::Named(qs)) => self.hadamard_many(qs),
            Operation::Toggle(q) => self.toggle(q),
            Operation::Rotate { target, degrees } => self.rotate(target, *degrees),
            Operation::IfThenToggle { control, target } => self.if_a_then_toggle_b(control, target),
            Operation::IfNotThenToggle { control, target } => {
                self.if_not_a_then_toggle_b(control, target)
            }
            Operation::IfAndThenToggle { a, b, target } => {
                self.if_a_and_b_then_toggle_c(a, b, target)
            }
            Operation::IfOrThenToggle { a, b, target } => self.if_a_or_b_then_toggle_c(a, b, target),
            Operation::IfThenMinus(q) => self.if_a_then_minus(q),
        }
    }

    // --- Measurement ---

    fn draw(&mut self) -> f64 {
        StandardUniform.sample(&mut self.rng)
    }

    /// Measures the listed qubits one at a time, in order, removing each
    /// from the register, and returns their outcome bits in that order.
    /// An empty list measures the whole register (see [`Self::extract_all`]).
    ///
    /// Each qubit consumes one uniform draw: the outcome is 0 when the draw
    /// is below the marginal probability of 0, and the vector is then
    /// restricted to the matching half and renormalised.
    pub fn extract(&mut self, qubits: &[Qubit]) -> Result<String> {
        if qubits.is_empty() {
            return self.extract_all();
        }
        for q in qubits {
            self.position(q)?;
        }
        Self::distinct("extract", &qubits.iter().collect::<Vec<_>>())?;

        let mut out = String::with_capacity(qubits.len());
        for q in qubits {
            out.push(self.extract_one(q)?);
        }
        Ok(out)
    }

    fn extract_one(&mut self, qubit: &Qubit) -> Result<char> {
        let pos = self.position(qubit)?;
        let mask = self.mask(qubit)?;
        let amps = self.state.amplitudes();

        let (mut p0, mut p1) = (0.0, 0.0);
        for (j, a) in amps.iter().enumerate() {
            if j & mask == 0 {
                p0 += a * a;
            } else {
                p1 += a * a;
            }
        }

        let r = self.draw();
        let outcome_zero = r < p0;
        let mass: f64 = if outcome_zero { p0 } else { p1 };
        if !(mass > 0.0) {
            return Err(QrevError::DegenerateMeasurement {
                qubit: qubit.label().to_string(),
                mass,
            });
        }

        let scale = mass.sqrt();
        let lower = mask - 1;
        let amps = self.state.amplitudes();
        let mut next = vec![0.0; amps.len() / 2];
        for (j, a) in amps.iter().enumerate() {
            if (j & mask == 0) == outcome_zero {
                next[((j >> 1) & !lower) | (j & lower)] = a / scale;
            }
        }
        self.state = StateVector::from_amplitudes(next);
        self.register.remove(pos);

        let bit = if outcome_zero { '0' } else { '1' };
        debug!(qubit = %qubit, p0, draw = r, %bit, "qubit extracted");
        Ok(bit)
    }

    /// Samples one basis state of the whole register from a single draw,
    /// walking the cumulative distribution in index order, then destroys
    /// every live qubit and resets the state to the scalar 1.
    pub fn extract_all(&mut self) -> Result<String> {
        let width = self.register.len();
        let r = self.draw();

        let mut cumulative = 0.0;
        let mut chosen = None;
        let mut last_reachable = None;
        for (i, a) in self.state.amplitudes().iter().enumerate() {
            let p = a * a;
            if p <= 0.0 {
                continue;
            }
            last_reachable = Some(i);
            if r < cumulative + p {
                chosen = Some(i);
                break;
            }
            cumulative += p;
        }

        // Rounding can leave the total mass just below the draw.
        let index = chosen
            .or(last_reachable)
            .ok_or_else(|| QrevError::DegenerateMeasurement {
                qubit: "all".to_string(),
                mass: cumulative,
            })?;

        let bits = basis_string(index, width);
        debug!(qubits = width, draw = r, %bits, "register extracted");
        self.register.clear();
        self.state = StateVector::scalar();
        Ok(bits)
    }
}

impl Default for StateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StateEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateEngine")
            .field("register", &self.register)
            .field("state", &self.state)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
