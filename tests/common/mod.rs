//! Common test utilities and harness
//!
//! Provides an isolated project tree for functional testing:
//! - Temporary project root holding `shadergen.toml`
//! - Shader fragment helpers under the shader root
//! - Artifact readers

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use shadergen::Config;
use tempfile::TempDir;

/// Test environment with an isolated project root
pub struct TestEnvironment {
    /// Temporary directory acting as the project root
    pub temp_dir: TempDir,
    /// Path to the project root
    pub root: PathBuf,
}

impl TestEnvironment {
    /// Create a new isolated test environment
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().to_path_buf();

        std::fs::create_dir_all(root.join("core/shaders"))
            .expect("Failed to create shader directory");

        Self { temp_dir, root }
    }

    /// Write a shader fragment relative to the default shader root
    pub fn write_shader(&self, relative: &str, content: &str) {
        let path = self.root.join("core/shaders").join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create shader subdirectory");
        }
        std::fs::write(&path, content).expect("Failed to write test shader");
    }

    /// Write the fragments used by the built-in targets
    pub fn write_renderer_tree(&self) {
        self.write_shader("common/version.glsl", "#version 430 core\n");
        for stage in ["accumulator", "toneMapper", "albedo", "normal"] {
            self.write_shader(
                &format!("fragment/{stage}.glsl"),
                &format!("#include ../common/version.glsl\nvoid {stage}() {{}}\n"),
            );
        }
        self.write_shader(
            "vertex/main.glsl",
            "#include ../common/version.glsl\nvoid main() {}\n",
        );
        self.write_shader(
            "compute/pathTracer.glsl",
            "#include ../common/version.glsl\nlayout(local_size_x = 8) in;\n",
        );
    }

    /// Write `shadergen.toml`
    pub fn write_config(&self, content: &str) {
        std::fs::write(self.config_path(), content).expect("Failed to write test config");
    }

    /// Write a shell script, run through `/bin/sh` rather than executed
    pub fn write_script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.root.join(name);
        std::fs::write(&path, body).expect("Failed to write test script");
        path
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join("shadergen.toml")
    }

    /// Load the configuration written by `write_config`
    pub fn load_config(&self) -> Config {
        if !self.config_path().exists() {
            self.write_config("");
        }
        Config::load_from(&self.config_path()).expect("Failed to load test config")
    }

    /// Absolute path of a file in the project
    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    /// Read a generated artifact
    pub fn read_output(&self, relative: &str) -> String {
        std::fs::read_to_string(self.path(relative)).expect("Failed to read artifact")
    }
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new()
    }
}
