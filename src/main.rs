//! wasmserve - A live-reloading development server for Go WebAssembly programs.

mod actor;
mod cli;
mod compiler;
mod config;
mod core;
mod embed;
mod logger;
mod reload;
mod utils;

use std::sync::Arc;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::Cli;
use compiler::{Builder, ProcessRunner, Toolchain};
use config::ServeConfig;
use reload::Broadcaster;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = ServeConfig::load(&cli)?;
    let toolchain = Toolchain::locate()?;
    let runtime_script = toolchain.runtime_script();
    if runtime_script.is_none() {
        log!("build"; "{} not found in the Go installation", compiler::RUNTIME_SCRIPT);
    }

    let builder = Builder::new(&config, toolchain.go().to_path_buf(), Arc::new(ProcessRunner));
    // go.mod must exist before the first request; failure here is fatal
    builder.prepare()?;

    let ctx = Arc::new(core::ServerContext::new(
        config,
        builder,
        Broadcaster::new(),
        runtime_script,
    ));

    let server = cli::serve::bind_server(ctx)?;
    server.shutdown_handle().install()?;
    server.run()
}
