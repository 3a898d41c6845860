//! shadergen
//!
//! Builds every target in `shadergen.toml` (or the built-in targets) in
//! order, stopping at the first failure.

use std::process::ExitCode;

fn main() -> ExitCode {
    shadergen::init_logging();
    log::info!("shadergen starting");
    shadergen::run_all()
}
