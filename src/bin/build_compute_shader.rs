//! Embed the path tracer compute shader as a single raw string

use std::process::ExitCode;

fn main() -> ExitCode {
    shadergen::init_logging();
    shadergen::run_target("compute")
}
