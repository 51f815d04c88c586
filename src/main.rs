use clap::Parser;
use std::io::IsTerminal;

mod analysis;
mod cli;
mod commands;
mod config;
mod domain;
mod error;
mod infrastructure;
mod parser;
mod report;
mod services;
mod ui;

use cli::{Cli, Commands};
use commands::{hash, lint, new};

/// Exit code for usage, configuration and I/O errors
const EXIT_ERROR: i32 = 2;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging with LOGGING env var support
    // LOGGING=debug,info,warn,error or just LOGGING=debug
    let log_level = std::env::var("LOGGING")
        .or_else(|_| std::env::var("LOG_LEVEL"))
        .unwrap_or_else(|_| {
            if cli.verbose {
                "debug".to_string()
            } else {
                "warn".to_string()
            }
        });

    // Logs go to stderr so stdout carries only the report
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();

    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let result = match cli.command {
        Commands::Lint {
            dir,
            dev_url,
            latest,
            git_base,
            config,
            format,
        } => lint::execute(dir, dev_url, latest, git_base, config, format).await,
        Commands::Hash { dir } => hash::execute(dir).await.map(|_| 0),
        Commands::New { dir, name, sql } => new::execute(dir, name, sql).await.map(|_| 0),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            ui::print_error(&format!("{:#}", e));
            std::process::exit(EXIT_ERROR);
        }
    }
}
