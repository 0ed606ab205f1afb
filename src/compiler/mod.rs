// src/compiler/mod.rs

//! Lowers classical programs to reversible circuit programs.
//!
//! For a function `f` with `n` arguments and `m` return wires the compiler
//! emits `if_f_then_toggle_onto(args.., targets..)`, which XORs the `m`
//! outputs onto the targets and leaves every other qubit as it found it.
//! When `m == 1` it also emits `if_f_then_toggle(args.., target)` and
//! `if_f_then_minus(args..)`, the phase-kickback form.
//!
//! The toggle-onto body computes every assigned wire on a fresh |0> qubit,
//! copies the return wires onto the targets, runs the assignments again in
//! reverse to restore the work wires to |0>, and discards them. The discard
//! fails with [`QrevError::DirtyAncilla`] if a work wire did not come back
//! to |0>.

use crate::classical::{Assignment, ClassicalProgram, Expr};
use crate::core::Result;
use crate::operations::{Operation, Targets};
use crate::vm::{CallAction, CircuitProgram, Instruction, ProgramBuilder};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::debug;

/// Scratch wire of the minus form. `$` keeps generated names out of the
/// identifier space of source programs.
const SCRATCH: &str = "$scratch";

/// Name of the compiled toggle-onto program of `function`.
pub fn toggle_onto_name(function: &str) -> String {
    format!("if_{function}_then_toggle_onto")
}

/// Name of the compiled single-target toggle program of `function`.
pub fn toggle_name(function: &str) -> String {
    format!("if_{function}_then_toggle")
}

/// Name of the compiled minus program of `function`.
pub fn minus_name(function: &str) -> String {
    format!("if_{function}_then_minus")
}

fn target_wire(index: usize) -> String {
    format!("$target{index}")
}

/// The circuit programs compiled from one classical function.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFunction {
    /// `if_f_then_toggle_onto`, always present.
    pub toggle_onto: Rc<CircuitProgram>,
    /// `if_f_then_toggle`, present when `f` has one output.
    pub toggle: Option<Rc<CircuitProgram>>,
    /// `if_f_then_minus`, present when `f` has one output.
    pub minus: Option<Rc<CircuitProgram>>,
}

impl CompiledFunction {
    /// Every compiled program, toggle-onto first.
    pub fn programs(&self) -> impl Iterator<Item = &Rc<CircuitProgram>> {
        std::iter::once(&self.toggle_onto)
            .chain(self.toggle.as_ref())
            .chain(self.minus.as_ref())
    }

    /// The program a conditional call with `action` runs.
    ///
    /// A single toggle target uses the dedicated toggle form when there is
    /// one; any other target list runs toggle-onto. Returns `None` for
    /// minus on a function without exactly one output.
    pub fn for_action(&self, action: &CallAction) -> Option<&Rc<CircuitProgram>> {
        match action {
            CallAction::Minus => self.minus.as_ref(),
            CallAction::Toggle(targets) if targets.len() == 1 => {
                Some(self.toggle.as_ref().unwrap_or(&self.toggle_onto))
            }
            CallAction::Toggle(_) => Some(&self.toggle_onto),
        }
    }
}

/// Memoizing classical-to-circuit compiler.
///
/// Each function is compiled once; later requests return the same shared
/// programs.
#[derive(Debug, Default)]
pub struct Compiler {
    cache: HashMap<String, Rc<CompiledFunction>>,
}

impl Compiler {
    /// Creates a compiler with an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles `program`, or returns the cached result for its name.
    pub fn compile(&mut self, program: &ClassicalProgram) -> Result<Rc<CompiledFunction>> {
        if let Some(done) = self.cache.get(program.name()) {
            return Ok(Rc::clone(done));
        }
        let compiled = Rc::new(compile_function(program)?);
        debug!(
            function = program.name(),
            inputs = program.arguments().len(),
            outputs = program.returns().len(),
            programs = compiled.programs().count(),
            "classical function compiled"
        );
        self.cache
            .insert(program.name().to_string(), Rc::clone(&compiled));
        Ok(compiled)
    }

    /// The cached compilation of `function`, if any.
    pub fn get(&self, function: &str) -> Option<Rc<CompiledFunction>> {
        self.cache.get(function).cloned()
    }

    /// Whether `function` has been compiled.
    pub fn is_compiled(&self, function: &str) -> bool {
        self.cache.contains_key(function)
    }

    /// Drops the cached compilation of `function`.
    pub(crate) fn invalidate(&mut self, function: &str) {
        self.cache.remove(function);
    }
}

fn compile_function(program: &ClassicalProgram) -> Result<CompiledFunction> {
    let name = program.name();
    let toggle_onto = Rc::new(build_toggle_onto(program, toggle_onto_name(name))?);
    let (toggle, minus) = if program.returns().len() == 1 {
        (
            Some(Rc::new(build_toggle_onto(program, toggle_name(name))?)),
            Some(Rc::new(build_minus(program)?)),
        )
    } else {
        (None, None)
    };
    Ok(CompiledFunction {
        toggle_onto,
        toggle,
        minus,
    })
}

/// One assignment as a reversible gate onto its |0> target wire.
fn lower(assignment: &Assignment) -> Instruction {
    let target = assignment.target.clone();
    let op = match &assignment.expr {
        Expr::Wire(a) => Operation::IfThenToggle {
            control: a.clone(),
            target,
        },
        Expr::Not(a) => Operation::IfNotThenToggle {
            control: a.clone(),
            target,
        },
        // `x AND x` and `x OR x` are `x`; the three-wire gates need distinct controls
        Expr::And(a, b) | Expr::Or(a, b) if a == b => Operation::IfThenToggle {
            control: a.clone(),
            target,
        },
        Expr::And(a, b) => Operation::IfAndThenToggle {
            a: a.clone(),
            b: b.clone(),
            target,
        },
        Expr::Or(a, b) => Operation::IfOrThenToggle {
            a: a.clone(),
            b: b.clone(),
            target,
        },
    };
    Instruction::QuantumOp(op)
}

fn build_toggle_onto(program: &ClassicalProgram, name: String) -> Result<CircuitProgram> {
    let targets: Vec<String> = (0..program.returns().len()).map(target_wire).collect();
    let formals = program.arguments().iter().cloned().chain(targets.iter().cloned());

    let work: Vec<String> = program.work_wires().into_iter().map(str::to_string).collect();
    let compute: Vec<Instruction> = program.assignments().iter().map(lower).collect();
    let copy_out = program.returns().iter().zip(&targets).map(|(ret, target)| {
        Instruction::QuantumOp(Operation::IfThenToggle {
            control: ret.clone(),
            target: target.clone(),
        })
    });
    let uncompute: Vec<Instruction> = compute.iter().rev().cloned().collect();

    let mut builder = ProgramBuilder::new(name, formals);
    if !work.is_empty() {
        builder = builder.add(Instruction::Declare(work.clone()));
    }
    builder = builder.add_many(compute).add_many(copy_out).add_many(uncompute);
    if !work.is_empty() {
        builder = builder.add(Instruction::Discard(work));
    }
    builder.build()
}

/// Phase kickback: a scratch wire in |-> absorbs the XOR of `f` as a sign.
fn build_minus(program: &ClassicalProgram) -> Result<CircuitProgram> {
    let scratch = SCRATCH.to_string();
    let mut args = program.arguments().to_vec();
    args.push(scratch.clone());

    let prepare = [
        Instruction::QuantumOp(Operation::Toggle(scratch.clone())),
        Instruction::QuantumOp(Operation::Hadamard(Targets::Named(vec![scratch.clone()]))),
    ];
    let restore = [
        Instruction::QuantumOp(Operation::Hadamard(Targets::Named(vec![scratch.clone()]))),
        Instruction::QuantumOp(Operation::Toggle(scratch.clone())),
    ];

    ProgramBuilder::new(minus_name(program.name()), program.arguments().iter().cloned())
        .add(Instruction::Declare(vec![scratch.clone()]))
        .add_many(prepare)
        .add(Instruction::Call {
            program: toggle_onto_name(program.name()),
            args,
        })
        .add_many(restore)
        .add(Instruction::Discard(vec![scratch]))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn and2() -> ClassicalProgram {
        ClassicalProgram::parse("def and2(x, y)\nz := x AND y\nreturn z\n").expect("valid program")
    }

    #[test]
    fn and_compiles_to_compute_copy_uncompute() -> Result<()> {
        let compiled = Compiler::new().compile(&and2())?;
        let listing = compiled.toggle_onto.to_string();
        let expected = "def if_and2_then_toggle_onto(x, y, $target0)
new qubit z
if x AND y then toggle z
if z then toggle $target0
if x AND y then toggle z
discard z
";
        assert_eq!(listing, expected);
        assert_eq!(
            compiled.toggle.as_ref().map(|p| p.name()),
            Some("if_and2_then_toggle")
        );
        Ok(())
    }

    #[test]
    fn minus_wraps_toggle_onto_with_scratch() -> Result<()> {
        let compiled = Compiler::new().compile(&and2())?;
        let minus = compiled.minus.as_ref().expect("single output has a minus form");
        assert_eq!(minus.arguments(), &["x", "y"]);
        let first = minus.instructions().first();
        let last = minus.instructions().last();
        assert_eq!(first, Some(&Instruction::Declare(vec![SCRATCH.to_string()])));
        assert_eq!(last, Some(&Instruction::Discard(vec![SCRATCH.to_string()])));
        assert!(minus.instructions().contains(&Instruction::Call {
            program: "if_and2_then_toggle_onto".to_string(),
            args: vec!["x".to_string(), "y".to_string(), SCRATCH.to_string()],
        }));
        Ok(())
    }

    #[test]
    fn multi_output_has_only_toggle_onto() -> Result<()> {
        let p = ClassicalProgram::parse("def pair(a, b)\nc := a OR b\nd := NOT a\nreturn c, d\n")?;
        let compiled = Compiler::new().compile(&p)?;
        assert!(compiled.toggle.is_none() && compiled.minus.is_none());
        assert_eq!(compiled.toggle_onto.arguments().len(), 4);
        assert!(compiled.for_action(&CallAction::Minus).is_none());
        let onto = compiled.for_action(&CallAction::Toggle(vec!["t".to_string()]));
        assert_eq!(onto.map(|p| p.name()), Some("if_pair_then_toggle_onto"));
        Ok(())
    }

    #[test]
    fn compilation_is_memoized() -> Result<()> {
        let mut compiler = Compiler::new();
        let first = compiler.compile(&and2())?;
        let second = compiler.compile(&and2())?;
        assert!(Rc::ptr_eq(&first, &second));
        assert!(compiler.is_compiled("and2"));
        compiler.invalidate("and2");
        assert!(compiler.get("and2").is_none());
        Ok(())
    }
}
