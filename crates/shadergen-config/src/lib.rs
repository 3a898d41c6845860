//! Shadergen Configuration Management
//!
//! Handles loading the project configuration from `shadergen.toml`.
//! The file is located through `SHADERGEN_CONFIG` or by searching upward from
//! the current directory; the directory holding it is the project root. When
//! no file exists the built-in presets are used.

pub mod presets;

pub use presets::{Preset, PresetStage, default_targets, get_preset, preset_names};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use shadergen_core::{
    ArtifactLayout, DEFAULT_INCLUDE_MARKER, EmbeddingMode, StageKind, StageSpec, TargetSpec,
};

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "shadergen.toml";
/// Environment variable holding an explicit configuration file path
pub const CONFIG_ENV_VAR: &str = "SHADERGEN_CONFIG";

/// Embedding mode of a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TargetMode {
    #[default]
    TextMulti,
    TextSingle,
    BinaryBlob,
}

impl TargetMode {
    /// Content kind this mode embeds
    pub fn content_kind(self) -> ContentKind {
        match self {
            TargetMode::TextMulti | TargetMode::TextSingle => ContentKind::Text,
            TargetMode::BinaryBlob => ContentKind::Binary,
        }
    }
}

/// Content kind of a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    #[default]
    Text,
    Binary,
}

impl From<ContentKind> for StageKind {
    fn from(kind: ContentKind) -> Self {
        match kind {
            ContentKind::Text => StageKind::Text,
            ContentKind::Binary => StageKind::Binary,
        }
    }
}

/// Project section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Shader fragment tree, relative to the project root
    #[serde(default = "default_shader_root")]
    pub shader_root: PathBuf,

    /// Token starting an include directive
    #[serde(default = "default_include_marker")]
    pub include_marker: String,
}

fn default_shader_root() -> PathBuf {
    PathBuf::from("core/shaders")
}

fn default_include_marker() -> String {
    DEFAULT_INCLUDE_MARKER.to_string()
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            shader_root: default_shader_root(),
            include_marker: default_include_marker(),
        }
    }
}

/// Names used in generated C++ artifacts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Header declaring the scope type
    #[serde(default = "default_header")]
    pub header: String,

    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Type owning the generated symbols
    #[serde(default = "default_scope")]
    pub scope: String,
}

fn default_header() -> String {
    "TracerX/Renderer.h".to_string()
}

fn default_namespace() -> String {
    "TracerX".to_string()
}

fn default_scope() -> String {
    "Renderer".to_string()
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            header: default_header(),
            namespace: default_namespace(),
            scope: default_scope(),
        }
    }
}

impl ArtifactConfig {
    pub fn layout(&self) -> ArtifactLayout {
        ArtifactLayout {
            header: self.header.clone(),
            namespace: self.namespace.clone(),
            scope: self.scope.clone(),
        }
    }
}

/// External shader compiler section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Compiler executable, looked up on PATH when not a path
    #[serde(default = "default_tool")]
    pub tool: PathBuf,

    /// Extra arguments placed before the entry path
    #[serde(default)]
    pub args: Vec<String>,

    /// Resolve includes before compiling binary stages
    #[serde(default)]
    pub flatten_includes: bool,

    /// Parent directory for scratch files (system temp dir if unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<PathBuf>,
}

fn default_tool() -> PathBuf {
    PathBuf::from("glslc")
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            tool: default_tool(),
            args: vec![],
            flatten_includes: false,
            scratch_dir: None,
        }
    }
}

/// One stage of a target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageConfig {
    pub name: String,
    /// Entry fragment, relative to the shader root
    pub entry: PathBuf,
    #[serde(default)]
    pub kind: ContentKind,
}

/// One generated artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    pub name: String,

    /// Artifact path, relative to the project root
    pub output: PathBuf,

    #[serde(default)]
    pub mode: TargetMode,

    /// Symbol override for text-single targets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,

    /// Feature flag guarding binary-blob targets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard: Option<String>,

    /// Stages in emission order
    pub stages: Vec<StageConfig>,
}

impl TargetConfig {
    pub fn embedding_mode(&self) -> EmbeddingMode {
        match self.mode {
            TargetMode::TextMulti => EmbeddingMode::TextMulti,
            TargetMode::TextSingle => EmbeddingMode::TextSingle {
                symbol: self.symbol.clone(),
            },
            TargetMode::BinaryBlob => EmbeddingMode::BinaryBlob {
                guard: self.guard.clone(),
            },
        }
    }

    /// Pipeline input for this target with paths resolved against `paths`
    pub fn to_spec(&self, paths: &ProjectPaths) -> TargetSpec {
        TargetSpec {
            name: self.name.clone(),
            output: paths.output(&self.output),
            mode: self.embedding_mode(),
            stages: self
                .stages
                .iter()
                .map(|stage| StageSpec {
                    name: stage.name.clone(),
                    entry: stage.entry.clone(),
                    kind: stage.kind.into(),
                })
                .collect(),
        }
    }

    /// Check the target can be emitted in its mode
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidTarget {
            target: self.name.clone(),
            reason,
        };

        if self.stages.is_empty() {
            return Err(invalid("no stages".to_string()));
        }
        if self.mode == TargetMode::TextSingle && self.stages.len() != 1 {
            return Err(invalid(format!(
                "text-single needs exactly one stage, found {}",
                self.stages.len()
            )));
        }

        let mut seen = HashSet::new();
        for stage in &self.stages {
            if !is_identifier(&stage.name) {
                return Err(invalid(format!("stage name '{}' is not an identifier", stage.name)));
            }
            if !seen.insert(stage.name.as_str()) {
                return Err(invalid(format!("duplicate stage '{}'", stage.name)));
            }
            if stage.kind != self.mode.content_kind() {
                return Err(invalid(format!(
                    "stage '{}' is {:?} but the target embeds {:?} content",
                    stage.name,
                    stage.kind,
                    self.mode.content_kind()
                )));
            }
        }

        match (&self.symbol, self.mode) {
            (Some(symbol), TargetMode::TextSingle) if !is_identifier(symbol) => {
                return Err(invalid(format!("symbol '{symbol}' is not an identifier")));
            }
            (Some(_), mode) if mode != TargetMode::TextSingle => {
                return Err(invalid("symbol is only used by text-single targets".to_string()));
            }
            _ => {}
        }
        match (&self.guard, self.mode) {
            (Some(guard), TargetMode::BinaryBlob) if !is_identifier(guard) => {
                return Err(invalid(format!("guard '{guard}' is not an identifier")));
            }
            (Some(_), mode) if mode != TargetMode::BinaryBlob => {
                return Err(invalid("guard is only used by binary-blob targets".to_string()));
            }
            _ => {}
        }

        Ok(())
    }
}

/// Absolute locations derived from the project root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub project_root: PathBuf,
    pub shader_root: PathBuf,
}

impl ProjectPaths {
    /// Resolve an artifact path relative to the project root
    pub fn output(&self, relative: &Path) -> PathBuf {
        self.project_root.join(relative)
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub artifact: ArtifactConfig,

    #[serde(default)]
    pub compiler: CompilerConfig,

    /// Targets in run order
    #[serde(default = "default_targets")]
    pub targets: Vec<TargetConfig>,

    /// Directory the configuration was loaded from
    #[serde(skip)]
    root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project: ProjectConfig::default(),
            artifact: ArtifactConfig::default(),
            compiler: CompilerConfig::default(),
            targets: default_targets(),
            root: PathBuf::new(),
        }
    }
}

impl Config {
    /// Locate and load the configuration, falling back to presets rooted at
    /// the current directory
    pub fn load() -> Result<Self, ConfigError> {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
            return Self::load_from(Path::new(&path));
        }

        let cwd = std::env::current_dir().map_err(ConfigError::CurrentDirError)?;
        match Self::find_config_file(&cwd) {
            Some(path) => Self::load_from(&path),
            None => {
                log::info!("No {} found, using built-in targets", CONFIG_FILE_NAME);
                Ok(Self::default().with_root(cwd))
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e))?;

        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::parse(path, &content, &e))?;

        let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let config = config.with_root(root);
        config.validate()?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Nearest `shadergen.toml` in `start` or one of its ancestors
    pub fn find_config_file(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Set the project root
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn paths(&self) -> ProjectPaths {
        ProjectPaths {
            project_root: self.root.clone(),
            shader_root: self.root.join(&self.project.shader_root),
        }
    }

    /// Look up a target by name
    pub fn target(&self, name: &str) -> Result<&TargetConfig, ConfigError> {
        self.targets
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| ConfigError::UnknownTarget(name.to_string(), self.target_names()))
    }

    pub fn target_names(&self) -> Vec<String> {
        self.targets.iter().map(|t| t.name.clone()).collect()
    }

    /// Check every setting and target before anything runs
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project.include_marker.trim().is_empty() {
            return Err(ConfigError::InvalidSetting(
                "project.include_marker must not be empty".to_string(),
            ));
        }
        if self.artifact.header.trim().is_empty() {
            return Err(ConfigError::InvalidSetting(
                "artifact.header must not be empty".to_string(),
            ));
        }
        if !is_identifier(&self.artifact.scope) {
            return Err(ConfigError::InvalidSetting(format!(
                "artifact.scope '{}' is not an identifier",
                self.artifact.scope
            )));
        }
        if !self.artifact.namespace.split("::").all(is_identifier) {
            return Err(ConfigError::InvalidSetting(format!(
                "artifact.namespace '{}' is not a namespace name",
                self.artifact.namespace
            )));
        }

        if self.targets.is_empty() {
            return Err(ConfigError::NoTargets);
        }
        let mut seen = HashSet::new();
        for target in &self.targets {
            if !seen.insert(target.name.as_str()) {
                return Err(ConfigError::InvalidTarget {
                    target: target.name.clone(),
                    reason: "duplicate target name".to_string(),
                });
            }
            target.validate()?;
        }
        Ok(())
    }
}

/// C identifier check for generated symbol names
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    /// Current directory could not be determined
    CurrentDirError(std::io::Error),
    /// Failed to read config file
    ReadError(PathBuf, std::io::Error),
    /// Failed to parse config file
    ParseError {
        path: PathBuf,
        /// 1-based position of the offending token, when known
        location: Option<(usize, usize)>,
        message: String,
    },
    /// Configuration declares no targets
    NoTargets,
    /// Requested target does not exist
    UnknownTarget(String, Vec<String>),
    /// Target cannot be built as declared
    InvalidTarget { target: String, reason: String },
    /// Invalid project-wide setting
    InvalidSetting(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::CurrentDirError(e) => write!(f, "Could not determine current directory: {}", e),
            ConfigError::ReadError(path, e) => write!(f, "Failed to read {:?}: {}", path, e),
            ConfigError::ParseError {
                path,
                location: Some((line, column)),
                message,
            } => write!(
                f,
                "Failed to parse {:?} at line {}, column {}: {}",
                path, line, column, message
            ),
            ConfigError::ParseError {
                path,
                location: None,
                message,
            } => write!(f, "Failed to parse {:?}: {}", path, message),
            ConfigError::NoTargets => write!(f, "No targets configured"),
            ConfigError::UnknownTarget(name, known) => {
                write!(f, "Unknown target '{}' (available: {})", name, known.join(", "))
            }
            ConfigError::InvalidTarget { target, reason } => {
                write!(f, "Invalid target '{}': {}", target, reason)
            }
            ConfigError::InvalidSetting(reason) => write!(f, "Invalid setting: {}", reason),
        }
    }
}

impl std::error::Error for ConfigError {}

impl ConfigError {
    /// Parse error reduced to one line, without the source excerpt
    fn parse(path: &Path, content: &str, error: &toml::de::Error) -> Self {
        let location = error.span().map(|span| {
            let before = content.get(..span.start).unwrap_or(content);
            let line = before.matches('\n').count() + 1;
            let column = before
                .rfind('\n')
                .map_or(before.chars().count(), |nl| before[nl + 1..].chars().count())
                + 1;
            (line, column)
        });
        ConfigError::ParseError {
            path: path.to_path_buf(),
            location,
            message: error
                .message()
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}
