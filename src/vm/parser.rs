// src/vm/parser.rs

//! Circuit source text to [`Instruction`]s.
//!
//! A circuit source file is a list of include lines followed by `def` blocks:
//!
//! ```text
//! QCode gates:bell
//! CCode logic:*
//!
//! def main()
//! new qubit a, b
//! call bell(a, b)
//! extract a, b
//! ```

use super::program::{CallAction, CircuitProgram, Instruction, ProgramBuilder};
use crate::core::{QrevError, Result};
use crate::operations::{Operation, Targets};
use crate::syntax::{call_form, identifier, name_list, significant_lines};

/// Which kind of source an include line pulls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Circuit programs, `QCode` lines, `.qcode` files.
    Circuit,
    /// Classical functions, `CCode` lines, `.ccode` files.
    Classical,
}

impl SourceKind {
    /// File extension of this kind of source.
    pub fn extension(self) -> &'static str {
        match self {
            SourceKind::Circuit => "qcode",
            SourceKind::Classical => "ccode",
        }
    }
}

/// One `file:name` entry of an include line. A `None` scope means `*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Include {
    /// Circuit or classical source.
    pub kind: SourceKind,
    /// File as written, relative to the including file.
    pub file: String,
    /// Single definition to take from the file, or all of them.
    pub scope: Option<String>,
}

/// A parsed circuit source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CircuitSource {
    /// Include lines, in order.
    pub includes: Vec<Include>,
    /// Program definitions, in order.
    pub programs: Vec<CircuitProgram>,
}

fn first_word(text: &str) -> (&str, &str) {
    match text.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (text, ""),
    }
}

fn include_line(line: &str) -> Option<Result<Vec<Include>>> {
    let (head, rest) = first_word(line);
    let kind = match head {
        "QCode" => SourceKind::Circuit,
        "CCode" => SourceKind::Classical,
        _ => return None,
    };
    let entries: Result<Vec<Include>> = rest
        .split(',')
        .map(|entry| {
            let (file, scope) = match entry.split_once(':') {
                Some((file, scope)) => (file.trim(), scope.trim()),
                None => (entry.trim(), "*"),
            };
            if file.is_empty() {
                return Err(QrevError::parse(line, "empty file name in include"));
            }
            let scope = match scope {
                "*" => None,
                name => Some(identifier(line, name)?),
            };
            Ok(Include {
                kind,
                file: file.to_string(),
                scope,
            })
        })
        .collect();
    Some(entries)
}

/// Parses a circuit source text.
///
/// # Errors
/// [`QrevError::Parse`] on the first line that is not an include, a `def`
/// header or an instruction inside a definition.
pub fn parse_source(source: &str) -> Result<CircuitSource> {
    let mut parsed = CircuitSource::default();
    let mut open: Option<(String, Vec<String>, Vec<Instruction>)> = None;

    for line in significant_lines(source) {
        if let Some(header) = line.strip_prefix("def ") {
            if let Some((name, args, body)) = open.take() {
                parsed.programs.push(ProgramBuilder::new(name, args).add_many(body).build()?);
            }
            let (name, args) = call_form(line, header)?;
            open = Some((name, args, Vec::new()));
        } else if let Some((_, _, body)) = open.as_mut() {
            body.push(parse_instruction(line)?);
        } else if let Some(includes) = include_line(line) {
            parsed.includes.extend(includes?);
        } else {
            return Err(QrevError::parse(line, "expected an include line or `def`"));
        }
    }
    if let Some((name, args, body)) = open {
        parsed.programs.push(ProgramBuilder::new(name, args).add_many(body).build()?);
    }
    Ok(parsed)
}

/// Parses one instruction line.
pub fn parse_instruction(line: &str) -> Result<Instruction> {
    let (head, rest) = first_word(line);
    match head {
        "new" => {
            let (kind, names) = first_word(rest);
            if kind != "qubit" && kind != "qubits" {
                return Err(QrevError::parse(line, "expected `new qubit NAMES`"));
            }
            Ok(Instruction::Declare(non_empty(line, names)?))
        }
        "extract" if rest == "all" => Ok(Instruction::ExtractAll),
        "extract" => Ok(Instruction::Extract(non_empty(line, rest)?)),
        "Hadamard" if rest == "all" => Ok(Instruction::QuantumOp(Operation::Hadamard(Targets::All))),
        "Hadamard" => Ok(Instruction::QuantumOp(Operation::Hadamard(Targets::Named(
            non_empty(line, rest)?,
        )))),
        "toggle" => Ok(Instruction::QuantumOp(Operation::Toggle(identifier(line, rest)?))),
        "rotate" => {
            let (target, angle) = rest
                .split_once(',')
                .ok_or_else(|| QrevError::parse(line, "expected `rotate NAME, DEGREES`"))?;
            let degrees: f64 = angle
                .trim()
                .parse()
                .map_err(|_| QrevError::parse(line, format!("`{}` is not an angle", angle.trim())))?;
            Ok(Instruction::QuantumOp(Operation::Rotate {
                target: identifier(line, target)?,
                degrees,
            }))
        }
        "call" => {
            let (program, args) = call_form(line, rest)?;
            Ok(Instruction::Call { program, args })
        }
        "print" if rest.is_empty() => Ok(Instruction::Print),
        "repeat" => Ok(Instruction::Repeat(rest.to_string())),
        "end" if rest.is_empty() => Ok(Instruction::End),
        "if" => parse_conditional(line, rest),
        _ => Err(QrevError::parse(line, "unrecognized instruction")),
    }
}

fn non_empty(line: &str, list: &str) -> Result<Vec<String>> {
    let names = name_list(line, list)?;
    if names.is_empty() {
        return Err(QrevError::parse(line, "expected at least one name"));
    }
    Ok(names)
}

fn is_reflection(condition: &str) -> bool {
    condition
        .strip_prefix("perp")
        .is_some_and(|rest| rest.starts_with('(') || rest.starts_with(char::is_whitespace))
}

fn parse_conditional(line: &str, rest: &str) -> Result<Instruction> {
    if is_reflection(rest) {
        return Ok(Instruction::ReflectIf(rest.to_string()));
    }

    let (condition, action) = rest
        .split_once(" then ")
        .map(|(c, a)| (c.trim(), a.trim()))
        .ok_or_else(|| QrevError::parse(line, "expected `if CONDITION then ACTION`"))?;

    let (verb, targets) = first_word(action);
    if condition.contains('(') {
        let (function, args) = call_form(line, condition)?;
        let action = match verb {
            "minus" if targets.is_empty() => CallAction::Minus,
            "toggle" => CallAction::Toggle(non_empty(line, targets)?),
            _ => return Err(QrevError::parse(line, "expected `toggle NAMES` or `minus`")),
        };
        return Ok(Instruction::ConditionalCall {
            function,
            args,
            action,
        });
    }

    let tokens: Vec<&str> = condition.split_whitespace().collect();
    let op = match (tokens.as_slice(), verb) {
        ([a], "minus") if targets.is_empty() => Operation::IfThenMinus(identifier(line, a)?),
        ([a], "toggle") => Operation::IfThenToggle {
            control: identifier(line, a)?,
            target: identifier(line, targets)?,
        },
        (["NOT", a], "toggle") => Operation::IfNotThenToggle {
            control: identifier(line, a)?,
            target: identifier(line, targets)?,
        },
        ([a, "AND", b], "toggle") => Operation::IfAndThenToggle {
            a: identifier(line, a)?,
            b: identifier(line, b)?,
            target: identifier(line, targets)?,
        },
        ([a, "OR", b], "toggle") => Operation::IfOrThenToggle {
            a: identifier(line, a)?,
            b: identifier(line, b)?,
            target: identifier(line, targets)?,
        },
        _ => return Err(QrevError::parse(line, "unsupported condition or action")),
    };
    Ok(Instruction::QuantumOp(op))
}
