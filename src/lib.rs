//! shadergen - shader embedding for the TracerX renderer
//!
//! Flattens include trees into self-contained shader text, optionally compiles
//! it with an external tool, and writes C++ sources embedding the results.
//! The implementation lives in:
//! - `shadergen-core` - Include resolution, compiler adapter, emitter, pipeline
//! - `shadergen-config` - `shadergen.toml` loading and built-in targets
//!
//! Run a single built-in target:
//! ```sh
//! cargo run --bin build_shaders
//! cargo run --bin build_compute_shader
//! cargo run --bin build_shader_binaries
//! ```

use std::process::ExitCode;

use anyhow::Context;

pub use shadergen_config::{Config, ConfigError};
pub use shadergen_core::RunReport;

use shadergen_core::{CodeEmitter, ExternalCompiler, FsSource, Pipeline};

/// Default log filter, overridden by `RUST_LOG`
pub const LOG_FILTER: &str = "warn,shadergen=info,shadergen_core=info,shadergen_config=info";

/// Initialize logging for a binary
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(LOG_FILTER)).init();
}

/// Run one configured target
pub fn build_target(config: &Config, name: &str) -> anyhow::Result<RunReport> {
    let target = config.target(name)?;
    let paths = config.paths();

    let scratch_dir = config
        .compiler
        .scratch_dir
        .as_ref()
        .map(|dir| paths.project_root.join(dir));

    let source = FsSource::new(&paths.shader_root);
    let mut compiler =
        ExternalCompiler::new(&config.compiler.tool).args(config.compiler.args.iter().cloned());
    if let Some(dir) = &scratch_dir {
        compiler = compiler.scratch_dir(dir);
    }

    let mut pipeline = Pipeline::new(&source, &compiler, CodeEmitter::new(config.artifact.layout()))
        .include_marker(config.project.include_marker.as_str())
        .compile_root(&paths.shader_root)
        .flatten_binaries(config.compiler.flatten_includes);
    if let Some(dir) = scratch_dir {
        pipeline = pipeline.scratch_dir(dir);
    }

    log::info!("Building target '{}' ({} stage(s))", target.name, target.stages.len());
    pipeline
        .run(&target.to_spec(&paths))
        .with_context(|| format!("target '{}' failed", target.name))
}

/// Run every configured target in order, stopping at the first failure
pub fn build_all(config: &Config) -> anyhow::Result<Vec<RunReport>> {
    config
        .target_names()
        .iter()
        .map(|name| build_target(config, name))
        .collect()
}

/// Entry point for single-target binaries
pub fn run_target(name: &str) -> ExitCode {
    exit_code(Config::load().map_err(anyhow::Error::from).and_then(|config| {
        build_target(&config, name)?;
        Ok(())
    }))
}

/// Entry point running every configured target
pub fn run_all() -> ExitCode {
    exit_code(Config::load().map_err(anyhow::Error::from).and_then(|config| {
        let reports = build_all(&config)?;
        let written = reports.iter().filter(|r| r.written).count();
        log::info!(
            "{} target(s) built, {} written, {} up to date",
            reports.len(),
            written,
            reports.len() - written
        );
        Ok(())
    }))
}

/// Print the single diagnostic line for a failed run
pub fn exit_code(result: anyhow::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", diagnostic(&err));
            ExitCode::FAILURE
        }
    }
}

/// `[Error] <message>` with the context chain folded onto one line
pub fn diagnostic(err: &anyhow::Error) -> String {
    let message = format!("{err:#}");
    let lines: Vec<&str> = message
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    format!("[Error] {}", lines.join(" | "))
}
