//! Per-target pipeline orchestration
//!
//! A run resolves or compiles every stage of a target in declared order and
//! hands the results to the [`CodeEmitter`] once. The first failing stage
//! aborts the run before anything is written.
//!
//! ```text
//! Pending -> Resolving(0) -> ... -> Resolving(n-1) -> AllResolved -> Emitting -> Written | Skipped
//!                 \__________________________________________________________/
//!                                          -> Failed
//! ```

use std::path::{Path, PathBuf};

use crate::compiler::{BinaryCompiler, Scratch};
use crate::emitter::{CodeEmitter, EmbeddingMode, Section, ShaderContent, StageKind};
use crate::error::{Error, Result};
use crate::resolver::{DEFAULT_INCLUDE_MARKER, IncludeResolver};
use crate::source::FragmentSource;

/// One stage of a target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSpec {
    /// Stage identifier, also the stem of the generated symbol
    pub name: String,
    /// Entry fragment, relative to the shader root
    pub entry: PathBuf,
    pub kind: StageKind,
}

impl StageSpec {
    pub fn text(name: impl Into<String>, entry: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            entry: entry.into(),
            kind: StageKind::Text,
        }
    }

    pub fn binary(name: impl Into<String>, entry: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            entry: entry.into(),
            kind: StageKind::Binary,
        }
    }
}

/// Everything needed to produce one artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    pub name: String,
    pub output: PathBuf,
    pub mode: EmbeddingMode,
    /// Stages in emission order
    pub stages: Vec<StageSpec>,
}

/// Result of resolving or compiling one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedShader {
    pub stage: String,
    pub content: ShaderContent,
    /// Fragments consumed, in pre-order. Binary stages compiled directly
    /// record only their entry.
    pub sources: Vec<PathBuf>,
}

/// Summary of a successful run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub target: String,
    pub output: PathBuf,
    /// False when the artifact was already up to date
    pub written: bool,
    pub shaders: Vec<ResolvedShader>,
}

/// Progress of a single run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Pending,
    Resolving { index: usize, stage: String },
    AllResolved,
    Emitting,
    Written,
    Skipped,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Written | RunState::Skipped | RunState::Failed)
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Pending => write!(f, "pending"),
            RunState::Resolving { index, stage } => write!(f, "resolving stage {index} ({stage})"),
            RunState::AllResolved => write!(f, "all stages resolved"),
            RunState::Emitting => write!(f, "emitting"),
            RunState::Written => write!(f, "written"),
            RunState::Skipped => write!(f, "skipped"),
            RunState::Failed => write!(f, "failed"),
        }
    }
}

/// Drives resolution, compilation and emission for targets
pub struct Pipeline<'a> {
    source: &'a dyn FragmentSource,
    compiler: &'a dyn BinaryCompiler,
    emitter: CodeEmitter,
    marker: String,
    compile_root: PathBuf,
    flatten_binaries: bool,
    scratch_dir: Option<PathBuf>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        source: &'a dyn FragmentSource,
        compiler: &'a dyn BinaryCompiler,
        emitter: CodeEmitter,
    ) -> Self {
        Self {
            source,
            compiler,
            emitter,
            marker: DEFAULT_INCLUDE_MARKER.to_string(),
            compile_root: PathBuf::new(),
            flatten_binaries: false,
            scratch_dir: None,
        }
    }

    /// Include marker token used for text stages
    pub fn include_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    /// Directory binary stage entries are joined to before compiling
    pub fn compile_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.compile_root = root.into();
        self
    }

    /// Flatten includes of binary stages before handing them to the compiler
    pub fn flatten_binaries(mut self, flatten: bool) -> Self {
        self.flatten_binaries = flatten;
        self
    }

    /// Parent directory for flattened scratch copies
    pub fn scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    /// Run one target to completion or first failure
    pub fn run(&self, target: &TargetSpec) -> Result<RunReport> {
        self.trace(target, &RunState::Pending);
        let result = self.run_stages(target);
        if result.is_err() {
            self.trace(target, &RunState::Failed);
        }
        result
    }

    fn run_stages(&self, target: &TargetSpec) -> Result<RunReport> {
        let resolver = IncludeResolver::new(self.source).with_marker(self.marker.as_str());
        let mut shaders = Vec::with_capacity(target.stages.len());

        for (index, stage) in target.stages.iter().enumerate() {
            self.trace(
                target,
                &RunState::Resolving {
                    index,
                    stage: stage.name.clone(),
                },
            );
            let shader = self.build_stage(&resolver, stage)?;
            log::info!(
                "Built {} shader ({} bytes from {} fragment(s))",
                stage.name,
                shader.content.len(),
                shader.sources.len()
            );
            for source in &shader.sources {
                log::debug!("  {} <- {}", stage.name, source.display());
            }
            shaders.push(shader);
        }
        self.trace(target, &RunState::AllResolved);

        let sections: Vec<Section> = shaders
            .iter()
            .map(|shader| Section::new(shader.stage.clone(), shader.content.clone()))
            .collect();

        self.trace(target, &RunState::Emitting);
        let written = self.emitter.emit(&target.output, &sections, &target.mode)?;
        if written {
            self.trace(target, &RunState::Written);
            log::info!("Wrote {}", target.output.display());
        } else {
            self.trace(target, &RunState::Skipped);
            log::info!("{} is up to date", target.output.display());
        }

        Ok(RunReport {
            target: target.name.clone(),
            output: target.output.clone(),
            written,
            shaders,
        })
    }

    fn build_stage(&self, resolver: &IncludeResolver<'_>, stage: &StageSpec) -> Result<ResolvedShader> {
        let (content, sources) = match stage.kind {
            StageKind::Text => {
                let flattened = resolver.resolve_traced(&stage.entry)?;
                (ShaderContent::Text(flattened.text), flattened.sources)
            }
            StageKind::Binary if self.flatten_binaries => {
                let flattened = resolver.resolve_traced(&stage.entry)?;
                let bytes = self.compile_flattened(&stage.entry, &flattened.text)?;
                (ShaderContent::Binary(bytes), flattened.sources)
            }
            StageKind::Binary => {
                let bytes = self.compiler.compile(&self.compile_root.join(&stage.entry))?;
                (ShaderContent::Binary(bytes), vec![stage.entry.clone()])
            }
        };

        Ok(ResolvedShader {
            stage: stage.name.clone(),
            content,
            sources,
        })
    }

    /// Compile flattened text through a scratch copy that keeps the entry's
    /// file name, since compilers infer the stage from the extension.
    fn compile_flattened(&self, entry: &Path, text: &str) -> Result<Vec<u8>> {
        let scratch = Scratch::create(self.scratch_dir.as_deref())?;
        let copy = scratch.file(entry.file_name().unwrap_or(entry.as_os_str()));
        std::fs::write(&copy, text).map_err(Error::Scratch)?;

        let bytes = self.compiler.compile(&copy)?;
        scratch.release();
        Ok(bytes)
    }

    fn trace(&self, target: &TargetSpec, state: &RunState) {
        log::debug!("[{}] {}", target.name, state);
    }
}
