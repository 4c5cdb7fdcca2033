// src/lib.rs

pub mod cli;
pub mod clock;
pub mod config;
pub mod daemon;
pub mod errors;
pub mod heartbeat;
pub mod launcher;
pub mod liveness;
pub mod logging;
pub mod netbeat;
pub mod policy;
pub mod registry;
pub mod supervisor;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::{error, info};

use crate::clock::MonotonicClock;
use crate::config::ConfigFile;
use crate::errors::Result;
use crate::heartbeat::HeartbeatChannel;
use crate::launcher::OsLauncher;
use crate::supervisor::Supervisor;

/// High-level entry point used by `main.rs`, called inside the runtime.
///
/// `main` has already, in this order:
/// - loaded and validated the config
/// - created the heartbeat channel
/// - (optionally) daemonized
///
/// This wires together:
/// - the termination signal listener (SIGTERM / SIGINT -> shutdown flag)
/// - launcher, clock, registry and the supervisor state machine
pub async fn run(cfg: ConfigFile, channel: HeartbeatChannel) -> Result<()> {
    let settings = cfg.supervisor.settings();

    // SIGTERM / SIGINT -> graceful shutdown.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    spawn_signal_listener(shutdown_tx);

    let launcher = OsLauncher::new(Some(channel.writer_raw_fd()));
    let clock = MonotonicClock::new();

    let mut supervisor = Supervisor::new(launcher, clock, Box::new(channel), settings, shutdown_rx);

    if let Err(err) = supervisor.init(&cfg).await {
        error!(error = %err, "supervisor startup failed");
        return Err(err);
    }

    supervisor.run().await
}

fn spawn_signal_listener(shutdown_tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        let mut term = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("failed to listen for SIGTERM: {e}");
                return;
            }
        };
        let mut int = match signal(SignalKind::interrupt()) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("failed to listen for SIGINT: {e}");
                return;
            }
        };

        tokio::select! {
            _ = term.recv() => info!("SIGTERM received"),
            _ = int.recv() => info!("SIGINT received"),
        }
        let _ = shutdown_tx.send(true);
    });
}

/// Simple dry-run output: print the roster and effective timings.
pub fn print_dry_run(cfg: &ConfigFile) {
    println!("procwatch dry-run");
    println!(
        "  supervisor.inspect_period_secs = {}",
        cfg.supervisor.inspect_period_secs
    );
    println!(
        "  supervisor.stale_after_secs = {}",
        cfg.supervisor.stale_after_secs
    );
    println!(
        "  supervisor.terminate_budget_secs = {}",
        cfg.supervisor.terminate_budget_secs
    );
    println!();

    println!("programs ({}):", cfg.program.len());
    for prog in &cfg.program {
        println!("  - {}", prog.path);
        if !prog.args.is_empty() {
            println!("      args: {:?}", prog.args);
        }
        println!("      watched: {}", prog.watched);
    }
}
