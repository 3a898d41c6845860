//! Shadergen Core - shader flattening and C++ artifact generation
//!
//! This crate provides:
//! - Include resolution over an abstract fragment source
//! - External shader compiler invocation with scoped scratch files
//! - Artifact rendering (inline text or byte arrays) with idempotent writes
//! - Per-target pipeline orchestration

pub mod compiler;
pub mod emitter;
pub mod error;
pub mod mock;
pub mod pipeline;
pub mod resolver;
pub mod source;

pub use compiler::{BinaryCompiler, ExternalCompiler, Scratch};
pub use emitter::{
    ArtifactLayout, CodeEmitter, EmbeddingMode, OutputArtifact, Section, ShaderContent, StageKind,
};
pub use error::{Error, Result};
pub use mock::{MockCompiler, MockOutcome};
pub use pipeline::{Pipeline, ResolvedShader, RunReport, RunState, StageSpec, TargetSpec};
pub use resolver::{DEFAULT_INCLUDE_MARKER, Flattened, IncludeResolver};
pub use source::{FragmentSource, FsSource, MemorySource, normalize_path};
