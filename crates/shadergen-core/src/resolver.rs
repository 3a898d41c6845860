//! Include resolution
//!
//! Flattens a shader fragment by replacing every include directive with the
//! full expansion of the fragment it names. Expansion is depth-first and
//! pre-order, so the output keeps the textual order of the source tree.
//!
//! A directive is a line starting with the include marker (`#include` by
//! default) followed by whitespace and a path. The path is relative to the
//! directory of the fragment containing the directive:
//!
//! ```text
//! fragment/accumulator.glsl:   #include ../common/random.glsl
//! resolves to:                 common/random.glsl
//! ```
//!
//! The directive line is consumed; every other line is copied verbatim,
//! terminator included.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::source::{FragmentSource, normalize_path};

/// Default include marker token
pub const DEFAULT_INCLUDE_MARKER: &str = "#include";

/// Flattened text plus the fragments it was built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flattened {
    pub text: String,
    /// Every fragment read, in pre-order. A fragment included on two
    /// branches appears twice.
    pub sources: Vec<PathBuf>,
}

/// Recursive include expander over a [`FragmentSource`]
pub struct IncludeResolver<'a> {
    source: &'a dyn FragmentSource,
    marker: String,
}

/// Mutable state of one `resolve` call
#[derive(Default)]
struct Expansion {
    text: String,
    sources: Vec<PathBuf>,
    /// Fragments currently being expanded, outermost first, as
    /// (canonical identity, root-relative path)
    stack: Vec<(PathBuf, PathBuf)>,
}

impl<'a> IncludeResolver<'a> {
    pub fn new(source: &'a dyn FragmentSource) -> Self {
        Self {
            source,
            marker: DEFAULT_INCLUDE_MARKER.to_string(),
        }
    }

    /// Use a different include marker token
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Flatten the fragment at `path`
    pub fn resolve(&self, path: &Path) -> Result<String> {
        Ok(self.resolve_traced(path)?.text)
    }

    /// Flatten the fragment at `path`, keeping provenance
    pub fn resolve_traced(&self, path: &Path) -> Result<Flattened> {
        let mut expansion = Expansion::default();
        self.expand(&normalize_path(path), &mut expansion)?;
        Ok(Flattened {
            text: expansion.text,
            sources: expansion.sources,
        })
    }

    fn expand(&self, path: &Path, state: &mut Expansion) -> Result<()> {
        let identity = self.source.canonical(path)?;
        if state.stack.iter().any(|(active, _)| *active == identity) {
            let mut chain: Vec<PathBuf> =
                state.stack.iter().map(|(_, relative)| relative.clone()).collect();
            chain.push(path.to_path_buf());
            return Err(Error::CyclicInclude {
                path: path.to_path_buf(),
                chain,
            });
        }

        let text = self.source.read(path)?;
        state.sources.push(path.to_path_buf());
        state.stack.push((identity, path.to_path_buf()));

        let dir = path.parent().unwrap_or(Path::new(""));
        for (index, line) in text.split_inclusive('\n').enumerate() {
            match self.directive(line) {
                Some("") => {
                    return Err(Error::MalformedInclude {
                        path: path.to_path_buf(),
                        line: index + 1,
                    });
                }
                Some(reference) => {
                    let included = normalize_path(&dir.join(reference));
                    log::trace!("{} includes {}", path.display(), included.display());
                    self.expand(&included, state)?;
                }
                None => state.text.push_str(line),
            }
        }

        state.stack.pop();
        Ok(())
    }

    /// Reference path of an include directive, or `None` for ordinary lines
    fn directive<'l>(&self, line: &'l str) -> Option<&'l str> {
        let rest = line.strip_prefix(self.marker.as_str())?;
        if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
            return None;
        }
        Some(rest.trim())
    }
}
