//! Error taxonomy for the shader pipeline
//!
//! Every variant is fatal for the run that produced it. Nothing here is
//! retried; the entry point turns the first error into a diagnostic line.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("shader not found ({})", .path.display())]
    NotFound { path: PathBuf },

    #[error("cyclic include of {} ({})", .path.display(), display_chain(.chain))]
    CyclicInclude {
        /// Fragment that was reached a second time
        path: PathBuf,
        /// Fragments being expanded when the repeat was found, outermost first
        chain: Vec<PathBuf>,
    },

    #[error("include directive without a path in {} (line {line})", .path.display())]
    MalformedInclude { path: PathBuf, line: usize },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("compilation of {} failed ({status}): {}", .entry.display(), single_line(.diagnostics))]
    Compilation {
        entry: PathBuf,
        status: String,
        /// Captured diagnostic stream of the compiler
        diagnostics: String,
    },

    #[error("failed to launch shader compiler {}: {source}", .tool.display())]
    CompilerLaunch {
        tool: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to prepare scratch file: {0}")]
    Scratch(#[source] io::Error),

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{mode} cannot embed {reason}")]
    SectionMismatch { mode: &'static str, reason: String },
}

impl Error {
    /// Path of the fragment or artifact the error is about, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            Error::NotFound { path }
            | Error::CyclicInclude { path, .. }
            | Error::MalformedInclude { path, .. }
            | Error::Read { path, .. }
            | Error::Write { path, .. } => Some(path),
            Error::Compilation { entry, .. } => Some(entry),
            Error::CompilerLaunch { .. } | Error::Scratch(_) | Error::SectionMismatch { .. } => {
                None
            }
        }
    }
}

fn display_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

// Compiler output is often multi-line; diagnostics are printed on one line.
fn single_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
}
