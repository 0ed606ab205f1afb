// tests/compiler_tests.rs

use qrev::compiler::toggle_onto_name;
use qrev::{ClassicalProgram, Compiler, Instruction, ProgramSet, QrevError, QuantumVm, VmConfig};

const MAJORITY: &str = "
def maj(a, b, c)
ab := a AND b
bc := b AND c
ac := a AND c
t := ab OR bc
m := t OR ac
return m
";

const XOR: &str = "
def xor2(a, b)
o := a OR b
n := a AND b
nn := NOT n
r := o AND nn
return r
";

const FULL_ADDER: &str = "
def adder(a, b, cin)
o := a OR b
n := a AND b
nn := NOT n
s1 := o AND nn
o2 := s1 OR cin
n2 := s1 AND cin
nn2 := NOT n2
sum := o2 AND nn2
carry := n OR n2
return sum, carry
";

const PARITY_GUARD: &str = "
def guard(w, x, y, z)
p := w AND x
q := y OR z
nq := NOT q
g := p OR nq
copy := g
return copy
";

const REPEATED_OPERAND: &str = "
def same(x, y)
a := x AND x
o := y OR y
r := a AND o
return r
";

/// Runs `function` on one basis input through its toggle-onto circuit.
/// Returns the target bits and the input bits read back afterwards.
fn run_on_input(source: &str, program: &ClassicalProgram, input: &[bool]) -> Result<(String, String), QrevError> {
    let n = program.arguments().len();
    let m = program.returns().len();
    let inputs: Vec<String> = (0..n).map(|i| format!("i{i}")).collect();
    let targets: Vec<String> = (0..m).map(|i| format!("t{i}")).collect();

    let mut circuit = format!("def main()\nnew qubit {}, {}\n", inputs.join(", "), targets.join(", "));
    for (name, bit) in inputs.iter().zip(input) {
        if *bit {
            circuit.push_str(&format!("toggle {name}\n"));
        }
    }
    circuit.push_str(&format!(
        "call {}({}, {})\nextract {}\nextract {}\n",
        toggle_onto_name(program.name()),
        inputs.join(", "),
        targets.join(", "),
        targets.join(", "),
        inputs.join(", ")
    ));

    let mut vm = QuantumVm::new(ProgramSet::from_sources(&circuit, &[source])?, VmConfig::seeded(11))?;
    vm.run()?;
    assert_eq!(vm.engine().num_qubits(), 0, "work wires left behind");
    let out = &vm.extractions()[0].bits;
    let back = &vm.extractions()[1].bits;
    Ok((out.clone(), back.clone()))
}

fn to_bits(values: &[bool]) -> String {
    values.iter().map(|b| if *b { '1' } else { '0' }).collect()
}

fn check_truth_table(source: &str) -> Result<(), QrevError> {
    let program = ClassicalProgram::parse(source)?;
    let n = program.arguments().len();
    for row in 0..(1usize << n) {
        let input: Vec<bool> = (0..n).map(|i| row & (1 << (n - 1 - i)) != 0).collect();
        let expected = to_bits(&program.evaluate(&input)?);
        let (got, back) = run_on_input(source, &program, &input)?;
        assert_eq!(got, expected, "{}({})", program.name(), to_bits(&input));
        assert_eq!(back, to_bits(&input), "inputs disturbed by {}", program.name());
    }
    Ok(())
}

#[test]
fn test_majority_truth_table() -> Result<(), QrevError> {
    check_truth_table(MAJORITY)
}

#[test]
fn test_xor_truth_table() -> Result<(), QrevError> {
    check_truth_table(XOR)
}

#[test]
fn test_full_adder_truth_table() -> Result<(), QrevError> {
    check_truth_table(FULL_ADDER)
}

#[test]
fn test_four_input_truth_table() -> Result<(), QrevError> {
    check_truth_table(PARITY_GUARD)
}

#[test]
fn test_repeated_operand_truth_table() -> Result<(), QrevError> {
    check_truth_table(REPEATED_OPERAND)
}

#[test]
fn test_repeated_operand_through_conditional_call() -> Result<(), QrevError> {
    let src = "def main()\nnew qubit x, y, t\ntoggle x\ntoggle y\nif same(x, y) then toggle t\nextract t\n";
    let mut vm = QuantumVm::new(ProgramSet::from_sources(src, &[REPEATED_OPERAND])?, VmConfig::seeded(4))?;
    vm.run()?;
    assert_eq!(vm.extractions()[0].bits, "1");
    Ok(())
}

#[test]
fn test_toggle_onto_accumulates_into_targets() -> Result<(), QrevError> {
    // target already 1, f = 1: XOR leaves 0
    let src = "def main()\nnew qubit a, b, c, t\ntoggle a\ntoggle b\ntoggle t\nif maj(a, b, c) then toggle t\nextract t\n";
    let mut vm = QuantumVm::new(ProgramSet::from_sources(src, &[MAJORITY])?, VmConfig::seeded(2))?;
    vm.run()?;
    assert_eq!(vm.extractions()[0].bits, "0");
    Ok(())
}

#[test]
fn test_uncompute_mirrors_compute() -> Result<(), QrevError> {
    let program = ClassicalProgram::parse(FULL_ADDER)?;
    let compiled = Compiler::new().compile(&program)?;
    let body = compiled.toggle_onto.instructions();
    let k = program.assignments().len();
    let m = program.returns().len();

    assert!(matches!(&body[0], Instruction::Declare(w) if w.len() == k));
    assert!(matches!(body.last(), Some(Instruction::Discard(w)) if w.len() == k));
    let compute = &body[1..=k];
    let uncompute = &body[1 + k + m..1 + 2 * k + m];
    assert!(compute.iter().eq(uncompute.iter().rev()));
    Ok(())
}
