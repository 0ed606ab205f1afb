// src/vm/interpreter.rs

//! Executes circuit programs against one live state engine.

use super::frame::{CallStack, ExecutionFrame, Workspace};
use super::loader::{Loader, ProgramSet};
use super::program::{CallAction, CircuitProgram, Instruction};
use crate::core::{Qubit, QrevError, Result, StateVector, VmConfig};
use crate::operations::{Operation, Targets};
use crate::simulation::StateEngine;
use std::fmt;
use std::mem;
use std::path::Path;
use std::rc::Rc;
use tracing::{debug, error, info, trace};

/// Execution status of a [`QuantumVm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmStatus {
    /// Executing the entry program.
    Running,
    /// Executing a callee; at least one caller is suspended.
    AwaitingReturn,
    /// The entry program ran to completion.
    HaltedOk,
    /// An instruction failed; the run cannot continue.
    HaltedError,
}

impl VmStatus {
    /// Whether the VM has stopped.
    pub fn is_halted(self) -> bool {
        matches!(self, VmStatus::HaltedOk | VmStatus::HaltedError)
    }
}

/// Outcome of one user-visible `extract` instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Local names of the measured qubits, in measurement order. For
    /// `extract all`, the live qubits of the workspace in register order.
    pub names: Vec<String>,
    /// One `0`/`1` per measured qubit.
    pub bits: String,
}

impl fmt::Display for Extraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Extracted {}: {}", self.names.join(", "), self.bits)
    }
}

/// The circuit interpreter.
///
/// Holds the program tables, the single [`StateEngine`] of the run, the
/// active program with its instruction pointer and workspace, and the stack
/// of suspended callers. A call binds the callee's formals to the caller's
/// qubits positionally; when the callee runs out of instructions the caller
/// resumes with its own workspace.
///
/// # Examples
/// ```
/// # use qrev::{ProgramSet, QuantumVm, VmConfig};
/// let programs = ProgramSet::from_sources(
///     "def main()\nnew qubit a\ntoggle a\nextract a\n",
///     &[],
/// )?;
/// let mut vm = QuantumVm::new(programs, VmConfig::seeded(1))?;
/// vm.run()?;
/// assert_eq!(vm.extractions()[0].bits, "1");
/// # Ok::<(), qrev::QrevError>(())
/// ```
pub struct QuantumVm {
    programs: ProgramSet,
    engine: StateEngine,
    config: VmConfig,
    current: Rc<CircuitProgram>,
    next: usize,
    workspace: Workspace,
    stack: CallStack,
    status: VmStatus,
    extractions: Vec<Extraction>,
    executed: u64,
}

impl QuantumVm {
    /// Prepares a run of `config.entry_point`, compiling every classical
    /// program up front.
    ///
    /// # Errors
    /// [`QrevError::MissingEntryPoint`] when there is no entry program, and
    /// any compilation failure.
    pub fn new(mut programs: ProgramSet, config: VmConfig) -> Result<Self> {
        programs.compile_all()?;
        let entry = programs
            .circuit(&config.entry_point)
            .map_err(|_| QrevError::MissingEntryPoint {
                name: config.entry_point.clone(),
            })?;
        info!(
            entry = %config.entry_point,
            circuits = programs.circuit_names().len(),
            functions = programs.classical_names().len(),
            "vm ready"
        );
        Ok(Self {
            engine: StateEngine::with_config(config.engine.clone()),
            stack: CallStack::new(config.max_call_depth),
            current: entry,
            next: 0,
            workspace: Workspace::new(),
            status: VmStatus::Running,
            extractions: Vec::new(),
            executed: 0,
            programs,
            config,
        })
    }

    /// Loads a circuit source file with its includes and prepares a run.
    pub fn load(path: impl AsRef<Path>, config: VmConfig) -> Result<Self> {
        Self::new(Loader::load(path)?, config)
    }

    /// Runs until the entry program completes or an instruction fails.
    pub fn run(&mut self) -> Result<()> {
        while !self.status.is_halted() {
            self.step()?;
        }
        info!(
            instructions = self.executed,
            extractions = self.extractions.len(),
            live_qubits = self.engine.num_qubits(),
            next_qubit = %self.engine.next_qubit_id(),
            "run finished"
        );
        Ok(())
    }

    /// Executes one instruction, then returns from every callee that has
    /// run out of instructions. Does nothing once halted.
    ///
    /// # Errors
    /// The failure of the instruction; the VM is then
    /// [`VmStatus::HaltedError`].
    pub fn step(&mut self) -> Result<VmStatus> {
        if self.status.is_halted() {
            return Ok(self.status);
        }

        let program = Rc::clone(&self.current);
        if let Some(instruction) = program.instruction(self.next) {
            debug!(
                program = program.name(),
                pc = self.next,
                depth = self.stack.depth(),
                %instruction,
                "execute"
            );
            self.next += 1;
            self.executed += 1;
            if let Err(e) = self.execute(instruction) {
                error!(
                    program = program.name(),
                    pc = self.next - 1,
                    %instruction,
                    operands = ?instruction.names(),
                    callers = ?self.stack.trace(),
                    error = %e,
                    "instruction failed"
                );
                self.status = VmStatus::HaltedError;
                return Err(e);
            }
        }

        while self.current.is_exhausted_at(self.next) {
            let Some(frame) = self.stack.pop() else {
                break;
            };
            debug!(from = self.current.name(), to = frame.program.name(), "return");
            self.current = frame.program;
            self.next = frame.resume_at;
            self.workspace = frame.workspace;
        }

        self.status = if self.current.is_exhausted_at(self.next) {
            VmStatus::HaltedOk
        } else if self.stack.is_empty() {
            VmStatus::Running
        } else {
            VmStatus::AwaitingReturn
        };
        Ok(self.status)
    }

    fn resolve(&self, name: &str) -> Result<Qubit> {
        self.workspace.lookup(name).cloned()
    }

    fn resolve_all(&self, names: &[String]) -> Result<Vec<Qubit>> {
        names.iter().map(|n| self.resolve(n)).collect()
    }

    /// Live qubits bound in the active workspace, in register order, each
    /// under the first of its local names.
    fn local_qubits(&self) -> (Vec<String>, Vec<Qubit>) {
        let bindings = self.workspace.bindings();
        self.engine
            .live_qubits()
            .iter()
            .filter_map(|q| {
                bindings
                    .iter()
                    .find(|(_, bound)| *bound == q)
                    .map(|(name, _)| (name.to_string(), q.clone()))
            })
            .unzip()
    }

    fn execute(&mut self, instruction: &Instruction) -> Result<()> {
        match instruction {
            Instruction::Declare(names) => {
                let qubits = self.engine.new_qubit(names);
                for (name, qubit) in names.iter().zip(qubits) {
                    self.workspace.bind(name.clone(), qubit);
                }
            }
            Instruction::Extract(names) => {
                let qubits = self.resolve_all(names)?;
                let bits = self.engine.extract(&qubits)?;
                self.record(Extraction {
                    names: names.clone(),
                    bits,
                });
            }
            Instruction::ExtractAll => {
                let (names, qubits) = self.local_qubits();
                let bits = if qubits.is_empty() {
                    String::new()
                } else if qubits.len() == self.engine.num_qubits() {
                    self.engine.extract_all()?
                } else {
                    self.engine.extract(&qubits)?
                };
                self.record(Extraction { names, bits });
            }
            Instruction::Discard(names) => {
                let qubits = self.resolve_all(names)?;
                let bits = self.engine.extract(&qubits)?;
                if let Some((name, _)) = names.iter().zip(bits.chars()).find(|(_, b)| *b == '1') {
                    return Err(QrevError::DirtyAncilla { name: name.clone() });
                }
                trace!(wires = names.len(), "work wires discarded");
            }
            Instruction::QuantumOp(Operation::Hadamard(Targets::All)) => {
                let (_, qubits) = self.local_qubits();
                self.engine.hadamard_many(&qubits)?;
            }
            Instruction::QuantumOp(op) => {
                let resolved = op.try_map(|name| self.resolve(name))?;
                self.engine.apply_operation(&resolved)?;
            }
            Instruction::ConditionalCall {
                function,
                args,
                action,
            } => {
                let compiled = self.programs.compile(function)?;
                let program = compiled.for_action(action).cloned().ok_or_else(|| {
                    QrevError::UnsupportedConstruct {
                        construct: format!(
                            "`then minus` on `{function}`, which has more than one output"
                        ),
                    }
                })?;
                let mut actuals = args.clone();
                if let CallAction::Toggle(targets) = action {
                    actuals.extend(targets.iter().cloned());
                }
                self.enter(program, &actuals)?;
            }
            Instruction::Call { program, args } => {
                let program = self.programs.circuit(program)?;
                self.enter(program, args)?;
            }
            Instruction::Print => {
                info!(state = %self.engine.state(), "state");
            }
            Instruction::Repeat(_) | Instruction::End => {
                debug!(%instruction, "loop marker ignored");
            }
            Instruction::ReflectIf(condition) => {
                return Err(QrevError::UnsupportedConstruct {
                    construct: format!("reflection conditional `if {condition}`"),
                });
            }
        }
        Ok(())
    }

    /// Suspends the current program and starts `program` with its formals
    /// bound to the caller's qubits named by `args`.
    fn enter(&mut self, program: Rc<CircuitProgram>, args: &[String]) -> Result<()> {
        if args.len() != program.arguments().len() {
            return Err(QrevError::ArityMismatch {
                program: program.name().to_string(),
                expected: program.arguments().len(),
                found: args.len(),
            });
        }
        let mut callee = Workspace::new();
        for (formal, actual) in program.arguments().iter().zip(args) {
            callee.bind(formal.clone(), self.resolve(actual)?);
        }

        self.stack.push(ExecutionFrame {
            program: Rc::clone(&self.current),
            resume_at: self.next,
            workspace: mem::replace(&mut self.workspace, callee),
        })?;
        debug!(
            from = self.current.name(),
            to = program.name(),
            depth = self.stack.depth(),
            "call"
        );
        self.current = program;
        self.next = 0;
        Ok(())
    }

    fn record(&mut self, extraction: Extraction) {
        info!(names = ?extraction.names, bits = %extraction.bits, "extracted");
        if self.config.echo_extractions {
            println!("{}", extraction);
        }
        self.extractions.push(extraction);
    }

    /// Current status.
    pub fn status(&self) -> VmStatus {
        self.status
    }

    /// Every user extraction so far, in execution order.
    pub fn extractions(&self) -> &[Extraction] {
        &self.extractions
    }

    /// Number of suspended callers.
    pub fn call_depth(&self) -> usize {
        self.stack.depth()
    }

    /// Program currently executing.
    pub fn current_program(&self) -> &CircuitProgram {
        &self.current
    }

    /// Bindings of the active program.
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Current amplitude vector.
    pub fn state(&self) -> &StateVector {
        self.engine.state()
    }

    /// The engine of this run.
    pub fn engine(&self) -> &StateEngine {
        &self.engine
    }

    /// The program tables, compiled programs included.
    pub fn programs(&self) -> &ProgramSet {
        &self.programs
    }

    /// Number of instructions executed so far.
    pub fn executed(&self) -> u64 {
        self.executed
    }
}

impl fmt::Debug for QuantumVm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuantumVm")
            .field("program", &self.current.name())
            .field("next", &self.next)
            .field("depth", &self.stack.depth())
            .field("status", &self.status)
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}
