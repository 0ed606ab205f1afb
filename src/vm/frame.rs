// src/vm/frame.rs

//! Call frames of the VM.

use super::program::CircuitProgram;
use crate::core::{Qubit, QrevError, Result};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Local name bindings of one activation.
///
/// Names map to qubit handles; several activations may hold handles to the
/// same qubit under different names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workspace {
    bindings: HashMap<String, Qubit>,
}

impl Workspace {
    /// An empty workspace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name`, replacing any earlier binding.
    pub fn bind(&mut self, name: impl Into<String>, qubit: Qubit) {
        self.bindings.insert(name.into(), qubit);
    }

    /// Resolves `name`.
    ///
    /// # Errors
    /// [`QrevError::UnknownSymbol`] when the name is unbound.
    pub fn lookup(&self, name: &str) -> Result<&Qubit> {
        self.bindings.get(name).ok_or_else(|| QrevError::UnknownSymbol {
            name: name.to_string(),
        })
    }

    /// Whether `name` is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bindings sorted by name.
    pub fn bindings(&self) -> Vec<(&str, &Qubit)> {
        let mut all: Vec<_> = self.bindings.iter().map(|(n, q)| (n.as_str(), q)).collect();
        all.sort_by(|a, b| a.0.cmp(b.0));
        all
    }
}

impl fmt::Display for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .bindings()
            .into_iter()
            .map(|(name, q)| format!("{name}={}", q.id()))
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

/// A suspended caller: the program it was running, where to resume, and
/// its workspace.
#[derive(Debug, Clone)]
pub struct ExecutionFrame {
    /// Program to resume.
    pub program: Rc<CircuitProgram>,
    /// Index of the next instruction to execute on resumption.
    pub resume_at: usize,
    /// The caller's bindings.
    pub workspace: Workspace,
}

/// Stack of suspended callers, bounded by a maximum depth.
#[derive(Debug, Clone)]
pub struct CallStack {
    frames: Vec<ExecutionFrame>,
    limit: usize,
}

impl CallStack {
    /// An empty stack allowing at most `limit` suspended frames.
    pub fn new(limit: usize) -> Self {
        Self {
            frames: Vec::new(),
            limit,
        }
    }

    /// Suspends a caller.
    ///
    /// # Errors
    /// [`QrevError::CallDepthExceeded`] when the stack is full.
    pub fn push(&mut self, frame: ExecutionFrame) -> Result<()> {
        if self.frames.len() >= self.limit {
            return Err(QrevError::CallDepthExceeded { limit: self.limit });
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Resumes the most recent caller.
    pub fn pop(&mut self) -> Option<ExecutionFrame> {
        self.frames.pop()
    }

    /// Number of suspended frames.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Whether no caller is suspended.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Names of the suspended programs, outermost first.
    pub fn trace(&self) -> Vec<&str> {
        self.frames.iter().map(|f| f.program.name()).collect()
    }
}
