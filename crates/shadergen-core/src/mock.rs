//! Mock compiler for testing
//!
//! Provides a MockCompiler that implements [`BinaryCompiler`] with scripted
//! results and records every call for test assertions, without requiring an
//! external shader compiler.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::compiler::BinaryCompiler;
use crate::error::{Error, Result};

/// Scripted result for one entry path
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Compilation succeeds with these bytes
    Binary(Vec<u8>),
    /// Compiler exits with `status`, printing `stderr`
    Failure { status: i32, stderr: String },
}

/// A compiler that returns scripted results
///
/// Entries are matched by exact path first, then by file name, so scripted
/// results also apply when the pipeline compiles a flattened scratch copy.
/// Unscripted entries fail with [`Error::NotFound`].
#[derive(Debug, Default)]
pub struct MockCompiler {
    outcomes: HashMap<PathBuf, MockOutcome>,
    calls: RefCell<Vec<PathBuf>>,
}

impl MockCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a successful compilation
    pub fn with_binary(mut self, entry: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) -> Self {
        self.outcomes
            .insert(entry.into(), MockOutcome::Binary(bytes.into()));
        self
    }

    /// Script a failing compilation
    pub fn with_failure(
        mut self,
        entry: impl Into<PathBuf>,
        status: i32,
        stderr: impl Into<String>,
    ) -> Self {
        self.outcomes.insert(
            entry.into(),
            MockOutcome::Failure {
                status,
                stderr: stderr.into(),
            },
        );
        self
    }

    /// Entry paths passed to `compile`, in call order
    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    fn outcome(&self, entry: &Path) -> Option<&MockOutcome> {
        self.outcomes.get(entry).or_else(|| {
            let name = entry.file_name()?;
            self.outcomes
                .iter()
                .find(|(path, _)| path.file_name() == Some(name))
                .map(|(_, outcome)| outcome)
        })
    }
}

impl BinaryCompiler for MockCompiler {
    fn compile(&self, entry: &Path) -> Result<Vec<u8>> {
        self.calls.borrow_mut().push(entry.to_path_buf());

        match self.outcome(entry) {
            Some(MockOutcome::Binary(bytes)) => Ok(bytes.clone()),
            Some(MockOutcome::Failure { status, stderr }) => Err(Error::Compilation {
                entry: entry.to_path_buf(),
                status: format!("exit status: {status}"),
                diagnostics: stderr.clone(),
            }),
            None => Err(Error::NotFound {
                path: entry.to_path_buf(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_binary() {
        let mock = MockCompiler::new().with_binary("shaders/a.glsl", vec![1u8, 2]);
        assert_eq!(mock.compile(Path::new("shaders/a.glsl")).unwrap(), vec![1, 2]);
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn test_matches_by_file_name() {
        let mock = MockCompiler::new().with_binary("shaders/compute/pathTracer.glsl", vec![9u8]);
        assert_eq!(
            mock.compile(Path::new("/tmp/shadergen-x/pathTracer.glsl")).unwrap(),
            vec![9]
        );
    }

    #[test]
    fn test_scripted_failure() {
        let mock = MockCompiler::new().with_failure("a.glsl", 2, "error: undefined symbol");
        let err = mock.compile(Path::new("a.glsl")).unwrap_err();
        assert!(err.to_string().contains("undefined symbol"));
        assert!(err.to_string().contains("exit status: 2"));
    }

    #[test]
    fn test_unscripted_entry() {
        let mock = MockCompiler::new();
        assert!(matches!(
            mock.compile(Path::new("x.glsl")),
            Err(Error::NotFound { .. })
        ));
        assert_eq!(mock.calls(), vec![PathBuf::from("x.glsl")]);
    }
}
