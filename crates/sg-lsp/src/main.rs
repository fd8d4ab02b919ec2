//! sg Language Server binary
//!
//! This binary implements a Language Server Protocol server for the `sg`
//! language that can be used with any LSP-compatible editor.
//!
//! Usage:
//!   sg-lsp \[options\]
//!
//! Options:
//!   --stdio        Use stdio for communication (the only transport mode)
//!   --log <path>   Redirect diagnostic logging to a file instead of stderr
//!   --version      Show version information
//!   --help         Show this help message

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use sg_lsp::LspServer;

enum Action {
    Serve,
    Version,
    Help,
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mut action = Action::Serve;
    let mut log_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--stdio" => {}
            "--log" => {
                let Some(path) = args.get(i + 1) else {
                    eprintln!("--log requires a path argument");
                    print_help();
                    process::exit(1);
                };
                log_path = Some(PathBuf::from(path));
                i += 1;
            }
            "--version" => action = Action::Version,
            "--help" | "-h" => action = Action::Help,
            other => {
                eprintln!("Unknown option: {other}");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    match action {
        Action::Version => {
            println!("sg-lsp {}", env!("CARGO_PKG_VERSION"));
            process::exit(0);
        }
        Action::Help => {
            print_help();
            process::exit(0);
        }
        Action::Serve => {}
    }

    if let Some(path) = &log_path {
        if let Err(err) = sg_lsp::util::log::init_log_file(path) {
            eprintln!("sg-lsp: failed to open log file {}: {err}", path.display());
            process::exit(1);
        }
    }

    let server = Arc::new(LspServer::new());
    if let Err(err) = server.run() {
        sg_lsp::log_line!("sg-lsp: server error: {err}");
        process::exit(1);
    }
}

fn print_help() {
    eprintln!("sg Language Server");
    eprintln!();
    eprintln!("Usage: sg-lsp [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --stdio        Use stdio for communication (the only transport mode)");
    eprintln!("  --log <path>   Redirect diagnostic logging to a file instead of stderr");
    eprintln!("  --version      Show version information");
    eprintln!("  --help         Show this help message");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  SG_STDLIB_ROOT  Passed through to the analyzer untouched");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  # Run in stdio mode (for VSCode, Neovim, etc.)");
    eprintln!("  sg-lsp --stdio");
    eprintln!();
    eprintln!("  # Run with logging to a file");
    eprintln!("  sg-lsp --stdio --log /tmp/sg-lsp.log");
}
