//! External shader compiler adapter
//!
//! Binary stages are compiled by an external tool (typically `glslc`) invoked
//! as:
//!
//! ```text
//! <tool> [args...] <entry> -o <scratch output>
//! ```
//!
//! The scratch output lives in a temporary directory owned by a [`Scratch`]
//! guard, so it is removed on every exit path of [`BinaryCompiler::compile`].

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use crate::error::{Error, Result};

/// Turns a shader entry file into its compiled binary form
pub trait BinaryCompiler {
    fn compile(&self, entry: &Path) -> Result<Vec<u8>>;
}

/// Scoped scratch directory, deleted with everything in it when dropped
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    /// Create a scratch directory under `parent`, or the system temp dir
    pub fn create(parent: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("shadergen-");
        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        }
        .map_err(Error::Scratch)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of a file named `name` inside the scratch directory
    pub fn file(&self, name: impl AsRef<OsStr>) -> PathBuf {
        self.dir.path().join(name.as_ref())
    }

    /// Remove the directory now, reporting failures instead of ignoring them
    pub fn release(self) {
        let path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            log::warn!("Failed to remove scratch directory {}: {}", path.display(), e);
        }
    }
}

/// [`BinaryCompiler`] backed by an external process
#[derive(Debug, Clone)]
pub struct ExternalCompiler {
    tool: PathBuf,
    args: Vec<String>,
    scratch_dir: Option<PathBuf>,
}

impl ExternalCompiler {
    pub fn new(tool: impl Into<PathBuf>) -> Self {
        Self {
            tool: tool.into(),
            args: Vec::new(),
            scratch_dir: None,
        }
    }

    /// Extra arguments placed before the entry path
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Parent directory for scratch output (defaults to the system temp dir)
    pub fn scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    pub fn tool(&self) -> &Path {
        &self.tool
    }
}

impl BinaryCompiler for ExternalCompiler {
    fn compile(&self, entry: &Path) -> Result<Vec<u8>> {
        let scratch = Scratch::create(self.scratch_dir.as_deref())?;
        let output_path = scratch.file(output_name(entry));

        log::debug!(
            "Running {} on {} -> {}",
            self.tool.display(),
            entry.display(),
            output_path.display()
        );

        let output = Command::new(&self.tool)
            .args(&self.args)
            .arg(entry)
            .arg("-o")
            .arg(&output_path)
            .output()
            .map_err(|source| Error::CompilerLaunch {
                tool: self.tool.clone(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(Error::Compilation {
                entry: entry.to_path_buf(),
                status: output.status.to_string(),
                diagnostics: stderr.trim().to_string(),
            });
        }
        if !stderr.trim().is_empty() {
            log::warn!("{} ({}): {}", self.tool.display(), entry.display(), stderr.trim());
        }

        let binary = match fs::read(&output_path) {
            Ok(binary) => binary,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::Compilation {
                    entry: entry.to_path_buf(),
                    status: output.status.to_string(),
                    diagnostics: "compiler produced no output".to_string(),
                });
            }
            Err(source) => {
                return Err(Error::Read {
                    path: output_path,
                    source,
                });
            }
        };

        scratch.release();
        Ok(binary)
    }
}

/// Scratch output name derived from the entry, e.g. `pathTracer.glsl` -> `pathTracer.bin`
fn output_name(entry: &Path) -> PathBuf {
    let stem = entry.file_stem().unwrap_or(OsStr::new("shader"));
    Path::new(stem).with_extension("bin")
}
