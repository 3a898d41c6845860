//! Fragment sources
//!
//! The resolver never touches the file system directly. It reads fragments
//! through [`FragmentSource`], which lets tests run against an in-memory tree.
//!
//! Paths handed to a source are relative to the shader root and already
//! normalized (see [`normalize_path`]).

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Read access to shader fragments
pub trait FragmentSource {
    /// Read the complete text of the fragment at `path`
    ///
    /// Must fail with [`Error::NotFound`] when no fragment exists at `path`.
    fn read(&self, path: &Path) -> Result<String>;

    /// Identity of the fragment at `path`, used by the cycle guard
    ///
    /// Two paths naming the same fragment (through `..` or a symlink) must
    /// yield the same value. Fails like [`FragmentSource::read`].
    fn canonical(&self, path: &Path) -> Result<PathBuf>;
}

/// Fragments stored under a shader root directory
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Shader root all fragment paths are relative to
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FragmentSource for FsSource {
    fn read(&self, path: &Path) -> Result<String> {
        fs::read_to_string(self.root.join(path)).map_err(|e| io_error(path, e))
    }

    fn canonical(&self, path: &Path) -> Result<PathBuf> {
        fs::canonicalize(self.root.join(path)).map_err(|e| io_error(path, e))
    }
}

fn io_error(path: &Path, source: io::Error) -> Error {
    if source.kind() == io::ErrorKind::NotFound {
        Error::NotFound {
            path: path.to_path_buf(),
        }
    } else {
        Error::Read {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// In-memory fragment tree
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    fragments: HashMap<PathBuf, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fragment, builder style
    pub fn with(mut self, path: impl AsRef<Path>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    /// Add or replace a fragment
    pub fn insert(&mut self, path: impl AsRef<Path>, text: impl Into<String>) {
        self.fragments
            .insert(normalize_path(path.as_ref()), text.into());
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

impl FragmentSource for MemorySource {
    fn read(&self, path: &Path) -> Result<String> {
        self.fragments
            .get(&normalize_path(path))
            .cloned()
            .ok_or_else(|| Error::NotFound {
                path: path.to_path_buf(),
            })
    }

    fn canonical(&self, path: &Path) -> Result<PathBuf> {
        Ok(normalize_path(path))
    }
}

/// Lexically normalize a path: drop `.` components and fold `..` into
/// the preceding component where one exists.
///
/// Leading `..` components that cannot be folded are kept, so a reference
/// escaping the shader root stays visible in diagnostics.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    normalized.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    normalized.pop();
                } else if !normalized.has_root() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
