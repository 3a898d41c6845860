//! Built-in targets
//!
//! These targets are used when no `shadergen.toml` defines its own. They
//! describe the renderer's shader tree under `core/shaders`.

use std::path::PathBuf;

use crate::{ContentKind, StageConfig, TargetConfig, TargetMode};

/// One stage of a preset
pub struct PresetStage {
    pub name: &'static str,
    pub entry: &'static str,
}

/// Built-in target definition
pub struct Preset {
    pub name: &'static str,
    pub output: &'static str,
    pub mode: TargetMode,
    pub symbol: Option<&'static str>,
    pub guard: Option<&'static str>,
    pub kind: ContentKind,
    pub stages: &'static [PresetStage],
}

impl Preset {
    /// Owned target configuration for this preset
    pub fn to_target(&self) -> TargetConfig {
        TargetConfig {
            name: self.name.to_string(),
            output: PathBuf::from(self.output),
            mode: self.mode,
            symbol: self.symbol.map(str::to_string),
            guard: self.guard.map(str::to_string),
            stages: self
                .stages
                .iter()
                .map(|stage| StageConfig {
                    name: stage.name.to_string(),
                    entry: PathBuf::from(stage.entry),
                    kind: self.kind,
                })
                .collect(),
        }
    }
}

/// Rasterization shaders embedded as one raw string per stage
pub const RENDERER: Preset = Preset {
    name: "renderer",
    output: "core/src/RendererShaderSrc.cpp",
    mode: TargetMode::TextMulti,
    symbol: None,
    guard: None,
    kind: ContentKind::Text,
    stages: &[
        PresetStage { name: "accumulator", entry: "fragment/accumulator.glsl" },
        PresetStage { name: "toneMapper", entry: "fragment/toneMapper.glsl" },
        PresetStage { name: "albedo", entry: "fragment/albedo.glsl" },
        PresetStage { name: "normal", entry: "fragment/normal.glsl" },
        PresetStage { name: "vertex", entry: "vertex/main.glsl" },
    ],
};

/// Path tracer compute shader as a single raw string
pub const COMPUTE: Preset = Preset {
    name: "compute",
    output: "core/src/RendererComputeShaderSrc.cpp",
    mode: TargetMode::TextSingle,
    symbol: Some("pathTracerShaderSrc"),
    guard: None,
    kind: ContentKind::Text,
    stages: &[PresetStage { name: "pathTracer", entry: "compute/pathTracer.glsl" }],
};

/// Precompiled path tracer, only built into the engine with SPIR-V support
pub const BINARY: Preset = Preset {
    name: "binary",
    output: "core/src/RendererShaderBin.cpp",
    mode: TargetMode::BinaryBlob,
    symbol: None,
    guard: Some("TRACERX_SPIRV"),
    kind: ContentKind::Binary,
    stages: &[PresetStage { name: "pathTracer", entry: "compute/pathTracer.glsl" }],
};

/// All presets, in default run order
pub const ALL_PRESETS: &[&Preset] = &[&RENDERER, &COMPUTE, &BINARY];

/// Get a preset by name
pub fn get_preset(name: &str) -> Option<&'static Preset> {
    ALL_PRESETS.iter().find(|p| p.name == name).copied()
}

/// List all preset names
pub fn preset_names() -> Vec<&'static str> {
    ALL_PRESETS.iter().map(|p| p.name).collect()
}

/// Targets used when the configuration file declares none
pub fn default_targets() -> Vec<TargetConfig> {
    ALL_PRESETS.iter().map(|p| p.to_target()).collect()
}
