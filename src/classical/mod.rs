// src/classical/mod.rs

//! Classical boolean programs: named AND/OR/NOT functions over wires.
//!
//! A [`ClassicalProgram`] is written in single-assignment form:
//!
//! ```text
//! def maj(a, b, c)
//! ab := a AND b
//! bc := b AND c
//! ac := a AND c
//! t := ab OR bc
//! m := t OR ac
//! return m
//! ```
//!
//! The `def` keyword is optional. Programs are immutable once parsed and are
//! lowered to reversible circuits by [`crate::compiler`].

use crate::core::{QrevError, Result};
use crate::syntax::{call_form, identifier, name_list, significant_lines};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Right-hand side of an assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Copy of another wire.
    Wire(String),
    /// Negation.
    Not(String),
    /// Conjunction.
    And(String, String),
    /// Disjunction.
    Or(String, String),
}

impl Expr {
    /// Wires read by the expression.
    pub fn operands(&self) -> Vec<&str> {
        match self {
            Expr::Wire(a) | Expr::Not(a) => vec![a.as_str()],
            Expr::And(a, b) | Expr::Or(a, b) => vec![a.as_str(), b.as_str()],
        }
    }

    fn parse(line: &str, text: &str) -> Result<Self> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        match tokens.as_slice() {
            [a] => Ok(Expr::Wire(identifier(line, a)?)),
            ["NOT", a] => Ok(Expr::Not(identifier(line, a)?)),
            [a, "AND", b] => Ok(Expr::And(identifier(line, a)?, identifier(line, b)?)),
            [a, "OR", b] => Ok(Expr::Or(identifier(line, a)?, identifier(line, b)?)),
            _ => Err(QrevError::parse(
                line,
                "expected `A`, `NOT A`, `A AND B` or `A OR B`",
            )),
        }
    }

    fn eval(&self, wires: &HashMap<&str, bool>) -> bool {
        // operands were checked to be defined when the program was built
        let get = |w: &String| wires.get(w.as_str()).copied().unwrap_or(false);
        match self {
            Expr::Wire(a) => get(a),
            Expr::Not(a) => !get(a),
            Expr::And(a, b) => get(a) && get(b),
            Expr::Or(a, b) => get(a) || get(b),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Wire(a) => write!(f, "{}", a),
            Expr::Not(a) => write!(f, "NOT {}", a),
            Expr::And(a, b) => write!(f, "{} AND {}", a, b),
            Expr::Or(a, b) => write!(f, "{} OR {}", a, b),
        }
    }
}

/// The value list of a `return` line, if `line` is one.
fn return_list(line: &str) -> Option<&str> {
    line.strip_prefix("return")
        .filter(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
}

/// One `wire := expr` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    /// Assigned wire.
    pub target: String,
    /// Value assigned to it.
    pub expr: Expr,
}

/// A named boolean function `{0,1}^n -> {0,1}^m`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassicalProgram {
    name: String,
    arguments: Vec<String>,
    assignments: Vec<Assignment>,
    returns: Vec<String>,
}

impl ClassicalProgram {
    /// Builds and validates a program.
    ///
    /// # Errors
    /// [`QrevError::InvalidClassicalProgram`] when an argument is repeated,
    /// a wire is assigned twice, an argument is assigned, a wire is read
    /// before it is defined, or no return value is declared.
    pub fn new(
        name: impl Into<String>,
        arguments: Vec<String>,
        assignments: Vec<Assignment>,
        returns: Vec<String>,
    ) -> Result<Self> {
        let name = name.into();
        let invalid = |reason: String| QrevError::InvalidClassicalProgram {
            program: name.clone(),
            reason,
        };

        let mut defined: HashSet<&str> = HashSet::new();
        for arg in &arguments {
            if !defined.insert(arg) {
                return Err(invalid(format!("argument `{arg}` declared twice")));
            }
        }
        for assignment in &assignments {
            for operand in assignment.expr.operands() {
                if !defined.contains(operand) {
                    return Err(invalid(format!("wire `{operand}` read before it is assigned")));
                }
            }
            if arguments.contains(&assignment.target) {
                return Err(invalid(format!("argument `{}` is assigned", assignment.target)));
            }
            if !defined.insert(&assignment.target) {
                return Err(invalid(format!("wire `{}` assigned twice", assignment.target)));
            }
        }
        if returns.is_empty() {
            return Err(invalid("no return values".to_string()));
        }
        for ret in &returns {
            if !defined.contains(ret.as_str()) {
                return Err(invalid(format!("return wire `{ret}` is never assigned")));
            }
        }

        Ok(Self {
            name,
            arguments,
            assignments,
            returns,
        })
    }

    /// Parses every definition in a classical source text.
    pub fn parse_all(source: &str) -> Result<Vec<ClassicalProgram>> {
        let mut programs = Vec::new();
        let mut open: Option<(String, Vec<String>, Vec<Assignment>)> = None;

        for line in significant_lines(source) {
            if let Some((target, expr)) = line.split_once(":=") {
                let (_, _, body) = open
                    .as_mut()
                    .ok_or_else(|| QrevError::parse(line, "assignment outside a definition"))?;
                body.push(Assignment {
                    target: identifier(line, target)?,
                    expr: Expr::parse(line, expr)?,
                });
            } else if let Some(rest) = return_list(line) {
                let (name, args, body) = open
                    .take()
                    .ok_or_else(|| QrevError::parse(line, "`return` outside a definition"))?;
                let returns = name_list(line, rest)?;
                programs.push(ClassicalProgram::new(name, args, body, returns)?);
            } else {
                if let Some((name, ..)) = &open {
                    return Err(QrevError::parse(
                        line,
                        format!("definition `{name}` has no `return` line"),
                    ));
                }
                let header = line.strip_prefix("def ").unwrap_or(line);
                let (name, args) = call_form(line, header)?;
                open = Some((name, args, Vec::new()));
            }
        }

        if let Some((name, ..)) = open {
            return Err(QrevError::parse(
                &name,
                format!("definition `{name}` has no `return` line"),
            ));
        }
        Ok(programs)
    }

    /// Parses a source text holding exactly one definition.
    pub fn parse(source: &str) -> Result<ClassicalProgram> {
        let mut programs = Self::parse_all(source)?;
        match programs.len() {
            1 => Ok(programs.remove(0)),
            n => Err(QrevError::parse(
                source.lines().next().unwrap_or_default(),
                format!("expected one definition, found {n}"),
            )),
        }
    }

    /// Function name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Argument wires, in order.
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Assignment lines, in order.
    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// Return wires, in order.
    pub fn returns(&self) -> &[String] {
        &self.returns
    }

    /// Every assigned wire, in assignment order. These are the wires a
    /// compiled circuit allocates, uncomputes and discards.
    pub fn work_wires(&self) -> Vec<&str> {
        self.assignments.iter().map(|a| a.target.as_str()).collect()
    }

    /// Intermediate wires: assigned, and not returned.
    pub fn ancillas(&self) -> Vec<&str> {
        self.work_wires()
            .into_iter()
            .filter(|w| !self.returns.iter().any(|r| r == w))
            .collect()
    }

    /// Evaluates the function on one input assignment.
    ///
    /// # Errors
    /// [`QrevError::ArityMismatch`] when `inputs` does not match the
    /// argument count.
    pub fn evaluate(&self, inputs: &[bool]) -> Result<Vec<bool>> {
        if inputs.len() != self.arguments.len() {
            return Err(QrevError::ArityMismatch {
                program: self.name.clone(),
                expected: self.arguments.len(),
                found: inputs.len(),
            });
        }
        let mut wires: HashMap<&str, bool> = self
            .arguments
            .iter()
            .map(String::as_str)
            .zip(inputs.iter().copied())
            .collect();
        for assignment in &self.assignments {
            let value = assignment.expr.eval(&wires);
            wires.insert(&assignment.target, value);
        }
        Ok(self
            .returns
            .iter()
            .map(|r| wires.get(r.as_str()).copied().unwrap_or(false))
            .collect())
    }
}

impl fmt::Display for ClassicalProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "def {}({})", self.name, self.arguments.join(", "))?;
        for a in &self.assignments {
            writeln!(f, "{} := {}", a.target, a.expr)?;
        }
        write!(f, "return {}", self.returns.join(", "))
    }
}
