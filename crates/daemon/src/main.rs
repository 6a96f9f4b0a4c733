// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Accord Daemon (accordd)
//!
//! Background process that owns the scheduler loop and dispatches hub
//! requests to agent workers. Point it at a hub directory containing
//! `config.yaml`; it polls the inboxes until stopped.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use accord_daemon::Daemon;
use std::path::PathBuf;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn print_help() {
    println!("accordd {}", env!("CARGO_PKG_VERSION"));
    println!("Accord Daemon - dispatches hub requests to agent workers");
    println!();
    println!("USAGE:");
    println!("    accordd [HUB_DIR]");
    println!();
    println!("ARGS:");
    println!("    HUB_DIR    Hub directory containing config.yaml (default: cwd)");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Print help information");
    println!("    -v, --version    Print version information");
    println!();
    println!("Logs go to HUB_DIR/accordd.log; set RUST_LOG to adjust verbosity.");
}

fn parse_hub_dir() -> Result<PathBuf, i32> {
    match std::env::args().nth(1) {
        None => std::env::current_dir().map_err(|e| {
            eprintln!("error: cannot determine current directory: {e}");
            1
        }),
        Some(arg) => match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("accordd {}", env!("CARGO_PKG_VERSION"));
                Err(0)
            }
            "--help" | "-h" | "help" => {
                print_help();
                Err(0)
            }
            flag if flag.starts_with('-') => {
                eprintln!("error: unexpected argument '{flag}'");
                eprintln!("Usage: accordd [HUB_DIR]");
                Err(1)
            }
            dir => Ok(PathBuf::from(dir)),
        },
    }
}

fn setup_logging(hub_dir: &PathBuf) -> tracing_appender::non_blocking::WorkerGuard {
    let appender = tracing_appender::rolling::never(hub_dir, "accordd.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    guard
}

#[tokio::main]
async fn main() {
    let hub_dir = match parse_hub_dir() {
        Ok(dir) => dir,
        Err(code) => std::process::exit(code),
    };

    let _log_guard = setup_logging(&hub_dir);

    let daemon = match Daemon::start(hub_dir.clone()) {
        Ok(daemon) => daemon,
        Err(e) => {
            error!(error = %e, "startup failed");
            eprintln!("accordd: {e}");
            std::process::exit(1);
        }
    };
    println!("accordd running on {}", hub_dir.display());

    wait_for_shutdown_signal().await;
    info!("shutdown signal received");
    daemon.shutdown().await;
}

async fn wait_for_shutdown_signal() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            error!(error = %e, "cannot install SIGTERM handler");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}
