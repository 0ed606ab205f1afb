// src/vm/loader.rs

//! Program tables and source-file loading.

use super::parser::{parse_source, SourceKind};
use super::program::CircuitProgram;
use crate::classical::ClassicalProgram;
use crate::compiler::{CompiledFunction, Compiler};
use crate::core::{QrevError, Result};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::{debug, warn};

/// Every circuit and classical program known to a VM, plus the compiled
/// forms of the classical ones.
///
/// Compiled programs are entered in the circuit table under their
/// generated names, so `call if_f_then_toggle(..)` reaches them too.
#[derive(Debug, Default)]
pub struct ProgramSet {
    circuits: HashMap<String, Rc<CircuitProgram>>,
    classical: HashMap<String, Rc<ClassicalProgram>>,
    generated: HashMap<String, String>,
    compiler: Compiler,
}

impl ProgramSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from in-memory circuit and classical sources.
    ///
    /// # Errors
    /// Parse failures, and [`QrevError::UnsupportedConstruct`] for include
    /// lines, which need a file to resolve against.
    pub fn from_sources(circuit: &str, classical: &[&str]) -> Result<Self> {
        let mut set = Self::new();
        for source in classical {
            set.add_classical_source(source)?;
        }
        set.add_circuit_source(circuit)?;
        Ok(set)
    }

    /// Registers every definition of a circuit source without includes.
    pub fn add_circuit_source(&mut self, source: &str) -> Result<()> {
        let parsed = parse_source(source)?;
        if let Some(include) = parsed.includes.first() {
            return Err(QrevError::UnsupportedConstruct {
                construct: format!("include of `{}` outside a file", include.file),
            });
        }
        for program in parsed.programs {
            self.add_circuit(program)?;
        }
        Ok(())
    }

    /// Registers every definition of a classical source.
    pub fn add_classical_source(&mut self, source: &str) -> Result<()> {
        for program in ClassicalProgram::parse_all(source)? {
            self.add_classical(program);
        }
        Ok(())
    }

    /// Registers a circuit program. A later definition replaces an earlier
    /// one of the same name.
    ///
    /// # Errors
    /// [`QrevError::DuplicateDefinition`] when the name belongs to a
    /// compiled program.
    pub fn add_circuit(&mut self, program: CircuitProgram) -> Result<()> {
        let name = program.name().to_string();
        if self.generated.contains_key(&name) {
            return Err(QrevError::DuplicateDefinition { name });
        }
        if let Some(old) = self.circuits.get(&name) {
            if **old != program {
                warn!(program = %name, "circuit program redefined");
            }
        }
        self.circuits.insert(name, Rc::new(program));
        Ok(())
    }

    /// Registers a classical program, dropping any compiled forms of an
    /// earlier definition with the same name.
    pub fn add_classical(&mut self, program: ClassicalProgram) {
        let name = program.name().to_string();
        match self.classical.get(&name) {
            Some(old) if **old == program => return,
            Some(_) => {
                warn!(function = %name, "classical program redefined");
                self.compiler.invalidate(&name);
                self.generated.retain(|generated, source| {
                    let stale = *source == name;
                    if stale {
                        self.circuits.remove(generated);
                    }
                    !stale
                });
            }
            None => {}
        }
        self.classical.insert(name, Rc::new(program));
    }

    /// Looks up a circuit program, compiled ones included.
    ///
    /// # Errors
    /// [`QrevError::UnknownProgram`] when no program has that name.
    pub fn circuit(&self, name: &str) -> Result<Rc<CircuitProgram>> {
        self.circuits
            .get(name)
            .cloned()
            .ok_or_else(|| QrevError::UnknownProgram {
                name: name.to_string(),
            })
    }

    /// Looks up a classical program.
    ///
    /// # Errors
    /// [`QrevError::UnknownProgram`] when no function has that name.
    pub fn classical(&self, name: &str) -> Result<Rc<ClassicalProgram>> {
        self.classical
            .get(name)
            .cloned()
            .ok_or_else(|| QrevError::UnknownProgram {
                name: name.to_string(),
            })
    }

    /// Whether a circuit program, compiled or not, has that name.
    pub fn contains_circuit(&self, name: &str) -> bool {
        self.circuits.contains_key(name)
    }

    /// Compiles `function` if needed and enters its circuits in the table.
    ///
    /// # Errors
    /// [`QrevError::UnknownProgram`] for an unknown function and
    /// [`QrevError::DuplicateDefinition`] when a generated name is taken
    /// by a source program.
    pub fn compile(&mut self, function: &str) -> Result<Rc<CompiledFunction>> {
        if let Some(done) = self.compiler.get(function) {
            return Ok(done);
        }
        let program = self.classical(function)?;
        let compiled = self.compiler.compile(&program)?;
        if let Some(taken) = compiled
            .programs()
            .find(|p| self.circuits.contains_key(p.name()))
        {
            self.compiler.invalidate(function);
            return Err(QrevError::DuplicateDefinition {
                name: taken.name().to_string(),
            });
        }
        for generated in compiled.programs() {
            self.circuits
                .insert(generated.name().to_string(), Rc::clone(generated));
            self.generated
                .insert(generated.name().to_string(), function.to_string());
        }
        Ok(compiled)
    }

    /// Compiles every classical program, in name order.
    pub fn compile_all(&mut self) -> Result<()> {
        let mut names: Vec<String> = self.classical.keys().cloned().collect();
        names.sort();
        for name in names {
            self.compile(&name)?;
        }
        Ok(())
    }

    /// Circuit program names, sorted.
    pub fn circuit_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.circuits.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Classical program names, sorted.
    pub fn classical_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.classical.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Reads a circuit source file and, recursively, everything it includes.
///
/// Include paths resolve against the directory of the including file, with
/// `.qcode` / `.ccode` appended when missing. Each (file, definition)
/// pair is read at most once, which also ends include cycles.
#[derive(Debug, Default)]
pub struct Loader {
    programs: ProgramSet,
    visited: HashSet<(PathBuf, Option<String>)>,
}

impl Loader {
    /// A loader with an empty program set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a circuit source file and its includes.
    pub fn load(path: impl AsRef<Path>) -> Result<ProgramSet> {
        let mut loader = Self::new();
        loader.include(SourceKind::Circuit, path.as_ref(), None)?;
        Ok(loader.finish())
    }

    /// Loads one file of `kind`, restricted to the definition `scope` when
    /// given.
    pub fn include(&mut self, kind: SourceKind, path: &Path, scope: Option<&str>) -> Result<()> {
        let path = with_extension(path, kind);
        let key = (
            fs::canonicalize(&path).unwrap_or_else(|_| path.clone()),
            scope.map(str::to_string),
        );
        if !self.visited.insert(key) {
            debug!(path = %path.display(), ?scope, "already loaded");
            return Ok(());
        }

        let source = fs::read_to_string(&path).map_err(|source| QrevError::Io {
            path: path.clone(),
            source,
        })?;
        let count = match kind {
            SourceKind::Circuit => self.circuit_file(&path, &source, scope)?,
            SourceKind::Classical => self.classical_file(&source, scope)?,
        };
        debug!(path = %path.display(), ?scope, definitions = count, "source loaded");
        Ok(())
    }

    /// The accumulated programs.
    pub fn finish(self) -> ProgramSet {
        self.programs
    }

    fn circuit_file(&mut self, path: &Path, source: &str, scope: Option<&str>) -> Result<usize> {
        let parsed = parse_source(source)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        for include in &parsed.includes {
            self.include(include.kind, &base.join(&include.file), include.scope.as_deref())?;
        }
        let selected = select(parsed.programs, CircuitProgram::name, scope)?;
        let count = selected.len();
        for program in selected {
            self.programs.add_circuit(program)?;
        }
        Ok(count)
    }

    fn classical_file(&mut self, source: &str, scope: Option<&str>) -> Result<usize> {
        let selected = select(ClassicalProgram::parse_all(source)?, ClassicalProgram::name, scope)?;
        let count = selected.len();
        for program in selected {
            self.programs.add_classical(program);
        }
        Ok(count)
    }
}

fn with_extension(path: &Path, kind: SourceKind) -> PathBuf {
    if path.extension().is_some_and(|ext| ext == kind.extension()) {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_owned();
        name.push(".");
        name.push(kind.extension());
        PathBuf::from(name)
    }
}

fn select<T>(items: Vec<T>, name: fn(&T) -> &str, scope: Option<&str>) -> Result<Vec<T>> {
    let Some(wanted) = scope else {
        return Ok(items);
    };
    let selected: Vec<T> = items.into_iter().filter(|item| name(item) == wanted).collect();
    if selected.is_empty() {
        return Err(QrevError::UnknownProgram {
            name: wanted.to_string(),
        });
    }
    Ok(selected)
}
