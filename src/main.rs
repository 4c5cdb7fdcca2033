// src/main.rs

use procwatch::errors::{Result, SupervisorError};
use procwatch::heartbeat::HeartbeatChannel;
use procwatch::{cli, config, daemon, logging, print_dry_run};

fn main() {
    let args = cli::parse();
    if let Err(err) = run_main(args) {
        eprintln!("procwatch error: {err:?}");
        std::process::exit(1);
    }
}

/// `main` stays synchronous: the heartbeat channel and the daemonization
/// fork must both exist before the tokio runtime spins up any threads.
fn run_main(args: cli::CliArgs) -> Result<()> {
    logging::init_logging(args.log_level).map_err(SupervisorError::Other)?;

    let cfg = config::load_and_validate(&args.config)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let channel = HeartbeatChannel::create().map_err(SupervisorError::ChannelCreate)?;

    if args.daemon {
        daemon::daemonize().map_err(SupervisorError::Daemonize)?;
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(procwatch::run(cfg, channel))
}
