// src/operations/mod.rs

//! The gate vocabulary shared by the line parser, the compiler and the
//! engine.
//!
//! An [`Operation`] is generic over its operand type: the parser and the
//! compiler produce `Operation<String>` over local wire names, and the VM
//! resolves those names against the active workspace into
//! `Operation<Qubit>` before handing them to the engine.

use std::fmt;

/// Operand list of a Hadamard instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Targets<T> {
    /// Every live qubit.
    All,
    /// The listed operands, in order.
    Named(Vec<T>),
}

/// A unitary or reversible primitive of the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation<T> {
    /// Normalised Hadamard on the targets.
    Hadamard(Targets<T>),
    /// Bit flip.
    Toggle(T),
    /// Real rotation by an angle in degrees.
    Rotate {
        /// Rotated qubit.
        target: T,
        /// Rotation angle in degrees.
        degrees: f64,
    },
    /// CNOT: `if control then toggle target`.
    IfThenToggle {
        /// Control qubit.
        control: T,
        /// Flipped qubit.
        target: T,
    },
    /// Anti-controlled toggle: `if NOT control then toggle target`.
    IfNotThenToggle {
        /// Control qubit, conjugated by a bit flip.
        control: T,
        /// Flipped qubit.
        target: T,
    },
    /// Toffoli: `if a AND b then toggle target`.
    IfAndThenToggle {
        /// First control.
        a: T,
        /// Second control.
        b: T,
        /// Flipped qubit.
        target: T,
    },
    /// `if a OR b then toggle target`, built from a Toffoli by De Morgan.
    IfOrThenToggle {
        /// First control.
        a: T,
        /// Second control.
        b: T,
        /// Flipped qubit.
        target: T,
    },
    /// Sign flip on every amplitude where the qubit is 1.
    IfThenMinus(T),
}

impl<T> Operation<T> {
    /// Every operand mentioned by the operation, in source order.
    pub fn operands(&self) -> Vec<&T> {
        match self {
            Operation::Hadamard(Targets::All) => Vec::new(),
            Operation::Hadamard(Targets::Named(ts)) => ts.iter().collect(),
            Operation::Toggle(t) | Operation::IfThenMinus(t) => vec![t],
            Operation::Rotate { target, .. } => vec![target],
            Operation::IfThenToggle { control, target }
            | Operation::IfNotThenToggle { control, target } => vec![control, target],
            Operation::IfAndThenToggle { a, b, target }
            | Operation::IfOrThenToggle { a, b, target } => vec![a, b, target],
        }
    }

    /// Maps every operand through a fallible resolver, keeping the shape.
    pub fn try_map<U, E, F>(&self, mut f: F) -> Result<Operation<U>, E>
    where
        F: FnMut(&T) -> Result<U, E>,
    {
        Ok(match self {
            Operation::Hadamard(Targets::All) => Operation::Hadamard(Targets::All),
            Operation::Hadamard(Targets::Named(ts)) => {
                Operation::Hadamard(Targets::Named(ts.iter().map(&mut f).collect::<Result<_, _>>()?))
            }
            Operation::Toggle(t) => Operation::Toggle(f(t)?),
            Operation::IfThenMinus(t) => Operation::IfThenMinus(f(t)?),
            Operation::Rotate { target, degrees } => Operation::Rotate {
                target: f(target)?,
                degrees: *degrees,
            },
            Operation::IfThenToggle { control, target } => Operation::IfThenToggle {
                control: f(control)?,
                target: f(target)?,
            },
            Operation::IfNotThenToggle { control, target } => Operation::IfNotThenToggle {
                control: f(control)?,
                target: f(target)?,
            },
            Operation::IfAndThenToggle { a, b, target } => Operation::IfAndThenToggle {
                a: f(a)?,
                b: f(b)?,
                target: f(target)?,
            },
            Operation::IfOrThenToggle { a, b, target } => Operation::IfOrThenToggle {
                a: f(a)?,
                b: f(b)?,
                target: f(target)?,
            },
        })
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Renders the operation in circuit source syntax.
impl<T: fmt::Display> fmt::Display for Operation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Hadamard(Targets::All) => write!(f, "Hadamard all"),
            Operation::Hadamard(Targets::Named(ts)) => write!(f, "Hadamard {}", join(ts)),
            Operation::Toggle(t) => write!(f, "toggle {}", t),
            Operation::Rotate { target, degrees } => write!(f, "rotate {}, {}", target, degrees),
            Operation::IfThenToggle { control, target } => {
                write!(f, "if {} then toggle {}", control, target)
            }
            Operation::IfNotThenToggle { control, target } => {
                write!(f, "if NOT {} then toggle {}", control, target)
            }
            Operation::IfAndThenToggle { a, b, target } => {
                write!(f, "if {} AND {} then toggle {}", a, b, target)
            }
            Operation::IfOrThenToggle { a, b, target } => {
                write!(f, "if {} OR {} then toggle {}", a, b, target)
            }
            Operation::IfThenMinus(t) => write!(f, "if {} then minus", t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_map_preserves_shape() {
        let op = Operation::IfAndThenToggle {
            a: "x".to_string(),
            b: "y".to_string(),
            target: "w".to_string(),
        };
        let mapped: Operation<usize> = op.try_map(|s| Ok::<_, ()>(s.len())).unwrap();
        assert_eq!(mapped, Operation::IfAndThenToggle { a: 1, b: 1, target: 1 });
    }

    #[test]
    fn try_map_stops_at_first_failure() {
        let op = Operation::Hadamard(Targets::Named(vec!["a", "missing", "c"]));
        let mut seen = Vec::new();
        let res: Result<Operation<&str>, String> = op.try_map(|s| {
            seen.push(*s);
            if *s == "missing" { Err(s.to_string()) } else { Ok(*s) }
        });
        assert_eq!(res, Err("missing".to_string()));
        assert_eq!(seen, vec!["a", "missing"]);
    }

    #[test]
    fn display_is_source_syntax() {
        let op = Operation::IfOrThenToggle { a: "a", b: "b", target: "c" };
        assert_eq!(op.to_string(), "if a OR b then toggle c");
        assert_eq!(Operation::<&str>::Hadamard(Targets::All).to_string(), "Hadamard all");
        assert_eq!(op.operands(), vec![&"a", &"b", &"c"]);
    }
}
