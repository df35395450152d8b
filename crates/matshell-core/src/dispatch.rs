//! Runs parsed commands against a [`Registry`] and the matrix file codec.
//!
//! Every command performs at most one registry mutation, and only after all
//! of its fallible steps succeeded, so a failed command leaves the registry
//! exactly as it was.

use std::fmt;
use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use thiserror::Error;

use crate::codec;
use crate::command::{tokenize, Command, CommandError};
use crate::error::{InvalidArgument, MatrixError};
use crate::matrix::{self, Matrix, MatrixName, ShiftDirection};
use crate::registry::{Insertion, Registry};

#[derive(Error, Debug)]
pub enum ShellError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Matrix(#[from] MatrixError),
}

impl ShellError {
    pub fn code(&self) -> &'static str {
        match self {
            ShellError::Command(e) => e.code(),
            ShellError::Matrix(e) => e.code(),
        }
    }

    pub fn diagnostic(&self) -> Diagnostic {
        Diagnostic {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

/// User-facing form of a failed command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: &'static str,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error: {}", self.message)
    }
}

/// Result of a successful command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command")]
pub enum Outcome {
    #[serde(rename = "create")]
    Created {
        name: MatrixName,
        rows: u32,
        cols: u32,
        slot: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        evicted: Option<MatrixName>,
    },
    #[serde(rename = "display")]
    Displayed {
        name: MatrixName,
        rows: u32,
        cols: u32,
        cells: Vec<u32>,
        text: String,
    },
    #[serde(rename = "add")]
    Added {
        left: MatrixName,
        right: MatrixName,
        out: MatrixName,
        slot: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        evicted: Option<MatrixName>,
    },
    #[serde(rename = "duplicate")]
    Duplicated {
        src: MatrixName,
        dest: MatrixName,
        slot: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        evicted: Option<MatrixName>,
    },
    #[serde(rename = "equal")]
    Compared {
        left: MatrixName,
        right: MatrixName,
        equal: bool,
    },
    #[serde(rename = "shift")]
    Shifted {
        name: MatrixName,
        direction: ShiftDirection,
        amount: u32,
    },
    #[serde(rename = "read")]
    Loaded {
        name: MatrixName,
        path: PathBuf,
        slot: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        evicted: Option<MatrixName>,
    },
    #[serde(rename = "write")]
    Written {
        name: MatrixName,
        path: PathBuf,
        bytes: usize,
    },
    #[serde(rename = "random")]
    Randomized {
        name: MatrixName,
        low: u32,
        high: u32,
    },
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Created {
                name, rows, cols, ..
            } => write!(f, "Created Matrix ({name},{rows},{cols})"),
            Outcome::Displayed { text, .. } => f.write_str(text.trim_end()),
            Outcome::Added {
                left, right, out, ..
            } => write!(f, "Added {left} and {right} into {out}"),
            Outcome::Duplicated { src, dest, .. } => {
                write!(f, "Duplication of {src} into {dest} finished")
            }
            Outcome::Compared { equal: true, .. } => f.write_str("SAME DATA IN BOTH"),
            Outcome::Compared { equal: false, .. } => f.write_str("DIFFERENT DATA IN BOTH"),
            Outcome::Shifted {
                name,
                direction,
                amount,
            } => write!(f, "Matrix ({name}) has been shifted {direction} by {amount}"),
            Outcome::Loaded { name, .. } => {
                write!(f, "Matrix ({name}) is read from the filesystem")
            }
            Outcome::Written { name, .. } => {
                write!(f, "Matrix ({name}) is written out to the filesystem")
            }
            Outcome::Randomized { name, low, high } => {
                write!(f, "Matrix ({name}) is randomized between {low} {high}")
            }
        }
    }
}

pub struct Dispatcher<R = StdRng> {
    registry: Registry,
    rng: R,
    data_dir: PathBuf,
}

impl Dispatcher<StdRng> {
    /// A fixed `seed` makes `random` reproducible; `None` seeds from entropy.
    pub fn new(registry: Registry, data_dir: impl Into<PathBuf>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(registry, data_dir, rng)
    }
}

impl<R: Rng> Dispatcher<R> {
    pub fn with_rng(registry: Registry, data_dir: impl Into<PathBuf>, rng: R) -> Self {
        Self {
            registry,
            rng,
            data_dir: data_dir.into(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Tokenizes and runs one input line. Blank lines yield `None`.
    pub fn execute_line(&mut self, line: &str) -> Option<Result<Outcome, ShellError>> {
        let tokens = tokenize(line);
        if tokens.is_empty() {
            return None;
        }
        let result = Command::parse(&tokens)
            .map_err(ShellError::from)
            .and_then(|cmd| self.execute(&cmd).map_err(ShellError::from));
        if let Err(err) = &result {
            tracing::warn!(command = tokens[0], code = err.code(), "{err}");
        }
        Some(result)
    }

    pub fn execute(&mut self, cmd: &Command) -> Result<Outcome, MatrixError> {
        tracing::debug!(command = %cmd.kind(), "dispatch");
        match cmd {
            Command::Create { name, rows, cols } => self.create(name, *rows, *cols),
            Command::Display { name } => self.display(name),
            Command::Add { left, right, out } => self.add(left, right, out),
            Command::Duplicate { src, dest } => self.duplicate(src, dest),
            Command::Equal { left, right } => self.equal(left, right),
            Command::Shift {
                name,
                direction,
                amount,
            } => self.shift(name, direction, *amount),
            Command::Read { file } => self.read(file),
            Command::Write { name } => self.write(name),
            Command::Random { name, low, high } => self.random(name, *low, *high),
        }
    }

    fn create(&mut self, name: &str, rows: u32, cols: u32) -> Result<Outcome, MatrixError> {
        MatrixName::new(name)?;
        if rows == 0 || cols == 0 {
            return Err(InvalidArgument::ZeroDimension.into());
        }
        let m = Matrix::new(name, rows, cols)?;
        let name = m.name().clone();
        let Insertion { slot, evicted } = self.registry.insert(m);
        Ok(Outcome::Created {
            name,
            rows,
            cols,
            slot,
            evicted,
        })
    }

    fn display(&self, name: &str) -> Result<Outcome, MatrixError> {
        let m = self.registry.lookup(name)?;
        Ok(Outcome::Displayed {
            name: m.name().clone(),
            rows: m.rows(),
            cols: m.cols(),
            cells: m.cells().to_vec(),
            text: m.to_string(),
        })
    }

    fn add(&mut self, left: &str, right: &str, out: &str) -> Result<Outcome, MatrixError> {
        let a = self.registry.lookup(left)?;
        let b = self.registry.lookup(right)?;
        let mut c = Matrix::new(out, a.rows(), a.cols())?;
        matrix::add(a, b, &mut c)?;
        let (left, right) = (a.name().clone(), b.name().clone());
        let out = c.name().clone();
        let Insertion { slot, evicted } = self.registry.insert(c);
        Ok(Outcome::Added {
            left,
            right,
            out,
            slot,
            evicted,
        })
    }

    fn duplicate(&mut self, src: &str, dest: &str) -> Result<Outcome, MatrixError> {
        let s = self.registry.lookup(src)?;
        let mut d = Matrix::new(dest, s.rows(), s.cols())?;
        matrix::duplicate(s, &mut d)?;
        let src = s.name().clone();
        let dest = d.name().clone();
        let Insertion { slot, evicted } = self.registry.insert(d);
        Ok(Outcome::Duplicated {
            src,
            dest,
            slot,
            evicted,
        })
    }

    fn equal(&self, left: &str, right: &str) -> Result<Outcome, MatrixError> {
        let a = self.registry.lookup(left)?;
        let b = self.registry.lookup(right)?;
        Ok(Outcome::Compared {
            left: a.name().clone(),
            right: b.name().clone(),
            equal: a.content_eq(b),
        })
    }

    fn shift(&mut self, name: &str, direction: &str, amount: u32) -> Result<Outcome, MatrixError> {
        self.registry.find_by_name(name)?;
        let direction: ShiftDirection = direction.parse()?;
        let m = self.registry.lookup_mut(name)?;
        m.shift(direction, amount);
        Ok(Outcome::Shifted {
            name: m.name().clone(),
            direction,
            amount,
        })
    }

    fn read(&mut self, file: &str) -> Result<Outcome, MatrixError> {
        let path = self.data_dir.join(file);
        let m = codec::decode_from_path(&path)?;
        let name = m.name().clone();
        let Insertion { slot, evicted } = self.registry.insert(m);
        Ok(Outcome::Loaded {
            name,
            path,
            slot,
            evicted,
        })
    }

    fn write(&self, name: &str) -> Result<Outcome, MatrixError> {
        let m = self.registry.lookup(name)?;
        let path = self.data_dir.join(m.name().as_str());
        let bytes = codec::write_to_path(m, &path)?;
        Ok(Outcome::Written {
            name: m.name().clone(),
            path,
            bytes,
        })
    }

    fn random(&mut self, name: &str, low: u32, high: u32) -> Result<Outcome, MatrixError> {
        let m = self.registry.lookup_mut(name)?;
        m.fill_random(&mut self.rng, low, high)?;
        Ok(Outcome::Randomized {
            name: m.name().clone(),
            low,
            high,
        })
    }

    /// Releases every matrix; returns how many were live.
    pub fn shutdown(&mut self) -> usize {
        let released = self.registry.destroy_all();
        tracing::info!(released, "registry cleared");
        released
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Registry::new(4).unwrap(), ".", Some(1))
    }

    fn run(d: &mut Dispatcher, line: &str) -> Result<Outcome, ShellError> {
        d.execute_line(line).expect("non-blank line")
    }

    #[test]
    fn blank_lines_are_skipped() {
        let mut d = dispatcher();
        assert!(d.execute_line("").is_none());
        assert!(d.execute_line("  \t \n").is_none());
    }

    #[test]
    fn create_reports_slot_and_text() {
        let mut d = dispatcher();
        let out = run(&mut d, "create A 2 3").unwrap();
        assert_eq!(out.to_string(), "Created Matrix (A,2,3)");
        assert!(matches!(out, Outcome::Created { slot: 0, evicted: None, .. }));
    }

    #[test]
    fn create_rejects_zero_and_non_numeric_dims() {
        let mut d = dispatcher();
        for line in ["create A 0 3", "create A two 3", "create A 3 -1"] {
            let err = run(&mut d, line).unwrap_err();
            assert!(
                matches!(
                    err,
                    ShellError::Matrix(MatrixError::InvalidArgument(InvalidArgument::ZeroDimension))
                ),
                "{line}: {err:?}"
            );
        }
        assert!(d.registry().is_empty());
    }

    #[test]
    fn shift_checks_name_before_direction() {
        let mut d = dispatcher();
        let err = run(&mut d, "shift A up 1").unwrap_err();
        assert_eq!(err.code(), "not_found");
        run(&mut d, "create A 1 1").unwrap();
        let err = run(&mut d, "shift A up 1").unwrap_err();
        assert_eq!(err.code(), "invalid_argument");
        let out = run(&mut d, "shift A right 2").unwrap();
        assert_eq!(out.to_string(), "Matrix (A) has been shifted right by 2");
    }

    #[test]
    fn equal_reports_both_outcomes() {
        let mut d = dispatcher();
        run(&mut d, "create A 2 2").unwrap();
        run(&mut d, "create B 2 2").unwrap();
        assert_eq!(run(&mut d, "equal A B").unwrap().to_string(), "SAME DATA IN BOTH");
        run(&mut d, "random B 1 1").unwrap();
        assert_eq!(
            run(&mut d, "equal A B").unwrap().to_string(),
            "DIFFERENT DATA IN BOTH"
        );
        assert_eq!(run(&mut d, "equal A Z").unwrap_err().code(), "not_found");
    }

    #[test]
    fn outcome_serializes_with_command_tag() {
        let mut d = dispatcher();
        let out = run(&mut d, "create A 1 2").unwrap();
        let v = serde_json::to_value(&out).unwrap();
        assert_eq!(v["command"], "create");
        assert_eq!(v["name"], "A");
        assert_eq!(v["slot"], 0);
        assert!(v.get("evicted").is_none());

        let out = run(&mut d, "shift A l 1").unwrap();
        let v = serde_json::to_value(&out).unwrap();
        assert_eq!(v["direction"], "left");
    }

    #[test]
    fn diagnostics_carry_codes() {
        let mut d = dispatcher();
        let err = run(&mut d, "frobnicate A").unwrap_err();
        let diag = err.diagnostic();
        assert_eq!(diag.code, "unknown_command");
        assert_eq!(
            diag.to_string(),
            "error: not a command in this application: \"frobnicate\""
        );
        let err = run(&mut d, "display").unwrap_err();
        assert_eq!(err.code(), "wrong_arity");
    }

    #[test]
    fn shutdown_is_idempotent() {
        let mut d = dispatcher();
        run(&mut d, "create A 1 1").unwrap();
        run(&mut d, "create B 1 1").unwrap();
        assert_eq!(d.shutdown(), 2);
        assert_eq!(d.shutdown(), 0);
        assert!(d.registry().is_empty());
    }
}
