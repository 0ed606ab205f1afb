// src/vm/program.rs

//! Instruction set and circuit program structure of the VM.

use crate::core::{QrevError, Result};
use crate::operations::Operation;
use std::collections::HashSet;
use std::fmt;

/// What a conditional call on a classical function does with its result.
#[derive(Debug, Clone, PartialEq)]
pub enum CallAction {
    /// XOR the function's outputs onto these target wires.
    Toggle(Vec<String>),
    /// Kick the function's (single) output back as a sign flip.
    Minus,
}

// --- Instruction Set Definition ---

/// A single instruction of a circuit program.
///
/// Produced by the line parser for source programs and by the compiler for
/// generated ones. Operands are local names resolved against the active
/// workspace at execution time.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// `new qubit a, b`: create qubits and bind them in the workspace.
    Declare(Vec<String>),
    /// `extract a, b`: measure and drop the named qubits, in order.
    Extract(Vec<String>),
    /// `extract all`: measure and drop every live qubit.
    ExtractAll,
    /// Measure and drop compiler-managed wires that must read |0>.
    /// Emitted only by the compiler; the outcome is never reported.
    Discard(Vec<String>),
    /// A gate from the engine's vocabulary.
    QuantumOp(Operation<String>),
    /// `if f(args) then toggle T..` / `if f(args) then minus`.
    ConditionalCall {
        /// Classical function name.
        function: String,
        /// Argument wires, bound positionally.
        args: Vec<String>,
        /// Compiled form to invoke.
        action: CallAction,
    },
    /// `call name(args)`.
    Call {
        /// Circuit program name.
        program: String,
        /// Argument wires, bound positionally.
        args: Vec<String>,
    },
    /// `print`: dump the state vector.
    Print,
    /// `repeat ...`: accepted loop marker without execution semantics.
    Repeat(String),
    /// `end`: closes a `repeat`; no execution semantics.
    End,
    /// `if perp(...) then ...`: reflection-conditional, not executable.
    ReflectIf(String),
}

impl Instruction {
    /// Names read from or bound into the workspace by this instruction.
    pub fn names(&self) -> Vec<&str> {
        match self {
            Instruction::Declare(ns) | Instruction::Extract(ns) | Instruction::Discard(ns) => {
                ns.iter().map(String::as_str).collect()
            }
            Instruction::QuantumOp(op) => op.operands().into_iter().map(String::as_str).collect(),
            Instruction::ConditionalCall { args, action, .. } => {
                let mut names: Vec<&str> = args.iter().map(String::as_str).collect();
                if let CallAction::Toggle(targets) = action {
                    names.extend(targets.iter().map(String::as_str));
                }
                names
            }
            Instruction::Call { args, .. } => args.iter().map(String::as_str).collect(),
            Instruction::ExtractAll
            | Instruction::Print
            | Instruction::Repeat(_)
            | Instruction::End
            | Instruction::ReflectIf(_) => Vec::new(),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Declare(ns) => write!(f, "new qubit {}", ns.join(", ")),
            Instruction::Extract(ns) => write!(f, "extract {}", ns.join(", ")),
            Instruction::ExtractAll => write!(f, "extract all"),
            Instruction::Discard(ns) => write!(f, "discard {}", ns.join(", ")),
            Instruction::QuantumOp(op) => write!(f, "{}", op),
            Instruction::ConditionalCall { function, args, action } => {
                write!(f, "if {}({}) then ", function, args.join(", "))?;
                match action {
                    CallAction::Toggle(targets) => write!(f, "toggle {}", targets.join(", ")),
                    CallAction::Minus => write!(f, "minus"),
                }
            }
            Instruction::Call { program, args } => write!(f, "call {}({})", program, args.join(", ")),
            Instruction::Print => write!(f, "print"),
            Instruction::Repeat(rest) if rest.is_empty() => write!(f, "repeat"),
            Instruction::Repeat(rest) => write!(f, "repeat {}", rest),
            Instruction::End => write!(f, "end"),
            Instruction::ReflectIf(cond) => write!(f, "if {}", cond),
        }
    }
}

// --- Program Structure ---

/// A named instruction sequence over ordered formal arguments.
///
/// Immutable once built; shared between the program table and the frames
/// executing it.
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitProgram {
    name: String,
    arguments: Vec<String>,
    instructions: Vec<Instruction>,
}

impl CircuitProgram {
    /// Program name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Formal argument names, in binding order.
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// The instruction sequence.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Gets the instruction at `index`, or `None` past the end.
    pub fn instruction(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    /// Returns the total number of instructions.
    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    /// Whether `index` is past the last instruction.
    pub fn is_exhausted_at(&self, index: usize) -> bool {
        index >= self.instructions.len()
    }
}

impl fmt::Display for CircuitProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "def {}({})", self.name, self.arguments.join(", "))?;
        for instruction in &self.instructions {
            writeln!(f, "{}", instruction)?;
        }
        Ok(())
    }
}

// --- Program Builder ---

/// Fluent construction of [`CircuitProgram`] values.
///
/// # Examples
/// ```
/// # use qrev::vm::{Instruction, ProgramBuilder};
/// # use qrev::Operation;
/// let program = ProgramBuilder::new("flip", ["q"])
///     .add(Instruction::QuantumOp(Operation::Toggle("q".to_string())))
///     .build()?;
/// assert_eq!(program.instruction_count(), 1);
/// assert_eq!(program.to_string(), "def flip(q)\ntoggle q\n");
/// # Ok::<(), qrev::QrevError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ProgramBuilder {
    name: String,
    arguments: Vec<String>,
    instructions: Vec<Instruction>,
}

impl ProgramBuilder {
    /// Starts a program with the given name and formal arguments.
    pub fn new<I, S>(name: impl Into<String>, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            arguments: arguments.into_iter().map(Into::into).collect(),
            instructions: Vec::new(),
        }
    }

    /// Appends an instruction.
    pub fn add(mut self, instruction: Instruction) -> Self {
        self.instructions.push(instruction);
        self
    }

    /// Appends several instructions.
    pub fn add_many<I>(mut self, instructions: I) -> Self
    where
        I: IntoIterator<Item = Instruction>,
    {
        self.instructions.extend(instructions);
        self
    }

    /// Builds the program.
    ///
    /// # Errors
    /// [`QrevError::Parse`] if a formal argument is empty or repeated.
    pub fn build(self) -> Result<CircuitProgram> {
        let mut seen = HashSet::new();
        for arg in &self.arguments {
            if arg.is_empty() || !seen.insert(arg) {
                return Err(QrevError::parse(
                    &format!("def {}({})", self.name, self.arguments.join(", ")),
                    format!("formal argument `{arg}` is empty or repeated"),
                ));
            }
        }
        Ok(CircuitProgram {
            name: self.name,
            arguments: self.arguments,
            instructions: self.instructions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_rejects_repeated_formals() {
        assert!(ProgramBuilder::new("f", ["a", "a"]).build().is_err());
        assert!(ProgramBuilder::new("f", ["a", "b"]).build().is_ok());
    }

    #[test]
    fn conditional_call_display_and_names() {
        let i = Instruction::ConditionalCall {
            function: "and2".to_string(),
            args: vec!["x".to_string(), "y".to_string()],
            action: CallAction::Toggle(vec!["out".to_string()]),
        };
        assert_eq!(i.to_string(), "if and2(x, y) then toggle out");
        assert_eq!(i.names(), vec!["x", "y", "out"]);

        let m = Instruction::ConditionalCall {
            function: "and2".to_string(),
            args: vec!["x".to_string(), "y".to_string()],
            action: CallAction::Minus,
        };
        assert_eq!(m.to_string(), "if and2(x, y) then minus");
    }
}
