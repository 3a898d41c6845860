//! Embed the rasterization shaders as one raw string per stage

use std::process::ExitCode;

fn main() -> ExitCode {
    shadergen::init_logging();
    shadergen::run_target("renderer")
}
