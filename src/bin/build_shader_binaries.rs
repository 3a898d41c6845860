//! Compile the path tracer and embed the binary behind its feature flag

use std::process::ExitCode;

fn main() -> ExitCode {
    shadergen::init_logging();
    shadergen::run_target("binary")
}
