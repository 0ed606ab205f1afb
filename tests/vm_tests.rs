// tests/vm_tests.rs

use qrev::vm::VmStatus;
use qrev::{ProgramSet, QrevError, QuantumVm, VmConfig};

const AND2: &str = "def and2(x, y)\nout := x AND y\nreturn out\n";

fn vm_with(circuit: &str, classical: &[&str], seed: u64) -> Result<QuantumVm, QrevError> {
    let programs = ProgramSet::from_sources(circuit, classical)?;
    QuantumVm::new(programs, VmConfig::seeded(seed))
}

fn run(circuit: &str, classical: &[&str]) -> Result<QuantumVm, QrevError> {
    let mut vm = vm_with(circuit, classical, 17)?;
    vm.run()?;
    Ok(vm)
}

fn bits(vm: &QuantumVm) -> Vec<&str> {
    vm.extractions().iter().map(|e| e.bits.as_str()).collect()
}

#[test]
fn test_vm_bell_pair() -> Result<(), Box<dyn std::error::Error>> {
    let src = "
# entangle two qubits and read both
def main()
new qubit A, B
Hadamard A
if A then toggle B
extract all
";
    for seed in 0..50 {
        let mut vm = vm_with(src, &[], seed)?;
        vm.run()?;
        let outcome = &vm.extractions()[0];
        assert_eq!(outcome.names, vec!["A", "B"]);
        assert!(outcome.bits == "00" || outcome.bits == "11", "got {}", outcome.bits);
    }
    Ok(())
}

#[test]
fn test_vm_deterministic_not() -> Result<(), Box<dyn std::error::Error>> {
    let vm = run("def main()\nnew qubit A\ntoggle A\nextract A\n", &[])?;
    assert_eq!(bits(&vm), vec!["1"]);
    assert_eq!(vm.status(), VmStatus::HaltedOk);
    Ok(())
}

#[test]
fn test_vm_and_compile_check() -> Result<(), Box<dyn std::error::Error>> {
    for (x, y, expected) in [("toggle x", "toggle y", "1"), ("toggle x", "", "0")] {
        let src = format!(
            "def main()\nnew qubit x, y, t\n{x}\n{y}\ncall if_and2_then_toggle_onto(x, y, t)\nextract t\n"
        );
        let vm = run(&src, &[AND2])?;
        assert_eq!(bits(&vm), vec![expected], "inputs `{x}` `{y}`");
    }
    Ok(())
}

#[test]
fn test_vm_uncomputation_leaves_no_ancillas() -> Result<(), Box<dyn std::error::Error>> {
    let classical = "def and_or(x, y)\na := x AND y\nb := x OR y\nn := NOT a\nc := n AND b\nreturn a\n";
    let src = "def main()\nnew qubit x, y, out\nHadamard x, y\nif and_or(x, y) then toggle out\n";
    let vm = run(src, &[classical])?;

    let labels: Vec<&str> = vm.engine().live_qubits().iter().map(|q| q.label()).collect();
    assert_eq!(labels, vec!["x", "y", "out"]);

    // pure state over x, y, out: out = x AND y in every branch
    let amps = vm.state().amplitudes();
    for (index, amp) in amps.iter().enumerate() {
        let expected = match index {
            0b000 | 0b010 | 0b100 | 0b111 => 0.5,
            _ => 0.0,
        };
        assert!((amp - expected).abs() < 1e-12, "amplitude of |{index:03b}> is {amp}");
    }
    Ok(())
}

#[test]
fn test_vm_phase_kickback_decides_balanced() -> Result<(), Box<dyn std::error::Error>> {
    let xor = "def xor2(a, b)\no := a OR b\nn := a AND b\nnn := NOT n\nr := o AND nn\nreturn r\n";
    let zero = "def zero(a, b)\nn := NOT a\nz := a AND n\nreturn z\n";
    let src = |f: &str| {
        format!("def main()\nnew qubit a, b\nHadamard all\nif {f}(a, b) then minus\nHadamard a, b\nextract a, b\n")
    };
    for seed in 0..10 {
        let mut balanced = vm_with(&src("xor2"), &[xor], seed)?;
        balanced.run()?;
        assert_eq!(bits(&balanced), vec!["11"]);

        let mut constant = vm_with(&src("zero"), &[zero], seed)?;
        constant.run()?;
        assert_eq!(bits(&constant), vec!["00"]);
    }
    Ok(())
}

#[test]
fn test_vm_minus_twice_is_identity() -> Result<(), Box<dyn std::error::Error>> {
    // Hadamards on the scratch wire make this equal up to rounding only.
    let src = "
def prepare(x, y)
rotate x, 35
rotate y, -70
if x then toggle y

def once()
new qubit x, y
call prepare(x, y)

def main()
new qubit x, y
call prepare(x, y)
if and2(x, y) then minus
if and2(x, y) then minus
";
    let programs = |entry: &str| -> Result<QuantumVm, QrevError> {
        let set = ProgramSet::from_sources(src, &[AND2])?;
        QuantumVm::new(set, VmConfig::seeded(1).with_entry_point(entry))
    };
    let mut twice = programs("main")?;
    twice.run()?;
    let mut plain = programs("once")?;
    plain.run()?;
    assert!(twice.state().approx_eq(plain.state(), 1e-12));
    assert_eq!(twice.engine().num_qubits(), 2);
    Ok(())
}

#[test]
fn test_vm_call_restores_caller_workspace() -> Result<(), Box<dyn std::error::Error>> {
    let src = "
def helper(q)
new qubit scratch
if q then toggle scratch
extract scratch

def main()
new qubit a, b
toggle b
call helper(b)
extract a, b
";
    let mut vm = vm_with(src, &[], 3)?;
    vm.step()?;
    vm.step()?;
    let before = vm.workspace().clone();
    assert_eq!(vm.step()?, VmStatus::AwaitingReturn);
    assert_eq!(vm.call_depth(), 1);
    while vm.call_depth() > 0 {
        vm.step()?;
    }
    assert_eq!(vm.workspace(), &before);
    vm.run()?;
    assert_eq!(bits(&vm), vec!["1", "01"]);
    Ok(())
}

#[test]
fn test_vm_nested_calls_return_in_order() -> Result<(), Box<dyn std::error::Error>> {
    let src = "
def inner(p)
toggle p

def outer(p, r)
call inner(p)
call inner(r)

def main()
new qubit a, b
call outer(b, a)
call outer(a, b)
call outer(b, a)
extract a, b
";
    let vm = run(src, &[])?;
    assert_eq!(bits(&vm), vec!["11"]);
    assert_eq!(vm.call_depth(), 0);
    Ok(())
}

#[test]
fn test_vm_multi_output_toggle_onto() -> Result<(), Box<dyn std::error::Error>> {
    let classical = "def split(a, b)\nc := a AND b\nd := a OR b\nreturn c, d\n";
    let src = "def main()\nnew qubit a, b, c, d\ntoggle b\nif split(a, b) then toggle c, d\nextract c, d\n";
    let vm = run(src, &[classical])?;
    assert_eq!(bits(&vm), vec!["01"]);
    Ok(())
}

#[test]
fn test_vm_error_kinds() -> Result<(), Box<dyn std::error::Error>> {
    let failures: [(&str, fn(&QrevError) -> bool); 8] = [
        ("def main()\nnew qubit a\ncall nothing(a)\n", |e| {
            matches!(e, QrevError::UnknownProgram { .. })
        }),
        ("def main()\nnew qubit a\nif missing(a) then toggle a\n", |e| {
            matches!(e, QrevError::UnknownProgram { .. })
        }),
        ("def main()\ntoggle nobody\n", |e| matches!(e, QrevError::UnknownSymbol { .. })),
        ("def main()\nnew qubit a, b\nif perp(a) then toggle b\n", |e| {
            matches!(e, QrevError::UnsupportedConstruct { .. })
        }),
        ("def main()\nnew qubit a\nif perp mirror(a)\n", |e| {
            matches!(e, QrevError::UnsupportedConstruct { .. })
        }),
        ("def f(p, q)\n\ndef main()\nnew qubit a\ncall f(a)\n", |e| {
            matches!(e, QrevError::ArityMismatch { expected: 2, found: 1, .. })
        }),
        ("def main()\nnew qubit a\nif a then toggle a\n", |e| {
            matches!(e, QrevError::DuplicateOperand { .. })
        }),
        ("def main()\nnew qubit a\nextract a\nextract a\n", |e| {
            matches!(e, QrevError::QubitNotLive { .. })
        }),
    ];
    for (src, expected) in failures {
        let mut vm = vm_with(src, &[], 0)?;
        let err = vm.run().expect_err("program should fail");
        assert!(expected(&err), "`{src}` failed with {err:?}");
        assert_eq!(vm.status(), VmStatus::HaltedError);
    }
    Ok(())
}

#[test]
fn test_vm_loop_markers_are_inert() -> Result<(), Box<dyn std::error::Error>> {
    let vm = run("def main()\nnew qubit a\nrepeat 3\ntoggle a\nend\nprint\nextract a\n", &[])?;
    assert_eq!(bits(&vm), vec!["1"]);
    Ok(())
}

#[test]
fn test_vm_recursion_hits_depth_limit() -> Result<(), Box<dyn std::error::Error>> {
    let programs = ProgramSet::from_sources("def main()\nnew qubit a\ncall main()\n", &[])?;
    let mut vm = QuantumVm::new(programs, VmConfig::seeded(0).with_max_call_depth(8))?;
    assert!(matches!(vm.run(), Err(QrevError::CallDepthExceeded { limit: 8 })));
    assert_eq!(vm.engine().num_qubits(), 9);
    Ok(())
}

#[test]
fn test_vm_dirty_ancilla_is_reported() -> Result<(), Box<dyn std::error::Error>> {
    let id = "def id(x)\ny := x\nreturn y\n";
    let src = "def main()\nnew qubit x\ntoggle x\nif id(x) then toggle x\n";
    let mut vm = vm_with(src, &[id], 0)?;
    assert!(matches!(vm.run(), Err(QrevError::DirtyAncilla { name }) if name == "y"));
    Ok(())
}

#[test]
fn test_vm_minus_needs_single_output() -> Result<(), Box<dyn std::error::Error>> {
    let classical = "def pair(a)\nb := a\nc := NOT a\nreturn b, c\n";
    let mut vm = vm_with("def main()\nnew qubit a\nif pair(a) then minus\n", &[classical], 0)?;
    assert!(matches!(vm.run(), Err(QrevError::UnsupportedConstruct { .. })));
    Ok(())
}

#[test]
fn test_vm_parse_errors_surface_at_load() {
    let err = ProgramSet::from_sources("def main()\nmeasure a\n", &[]).unwrap_err();
    assert!(matches!(err, QrevError::Parse { .. }));
}

#[test]
fn test_vm_hadamard_all_stays_in_callee_workspace() -> Result<(), Box<dyn std::error::Error>> {
    let src = "
def helper(q)
Hadamard all
Hadamard all

def spread(q)
Hadamard all

def main()
new qubit keep, a
call helper(a)
call spread(a)
extract keep
";
    for seed in 0..40 {
        let mut vm = vm_with(src, &[], seed)?;
        vm.run()?;
        assert_eq!(vm.extractions()[0].bits, "0", "seed {seed}");
        assert_eq!(vm.engine().num_qubits(), 1);
    }
    Ok(())
}

#[test]
fn test_vm_extract_all_stays_in_callee_workspace() -> Result<(), Box<dyn std::error::Error>> {
    let src = "
def helper(q)
extract all

def main()
new qubit keep, a
toggle a
call helper(a)
toggle keep
extract all
";
    let vm = run(src, &[])?;
    let records = vm.extractions();
    assert_eq!(records[0].names, vec!["q"]);
    assert_eq!(records[0].bits, "1");
    assert_eq!(records[1].names, vec!["keep"]);
    assert_eq!(records[1].bits, "1");
    assert_eq!(vm.engine().num_qubits(), 0);
    Ok(())
}
