//! mcpaint - Command-line tool for building images in Minecraft: Pi Edition

use std::process::ExitCode;

use mcpaint::cli;

fn main() -> ExitCode {
    cli::run()
}
