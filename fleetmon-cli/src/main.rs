//! fleetmon daemon entry point.

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use fleetmon::config::Config;
use fleetmon::daemon::Daemon;
use fleetmon::domain::{BOARDS_PER_CHASSIS, CHASSIS_COUNT};
use fleetmon::logging;

/// Interval between heartbeat log lines.
const HEARTBEAT_SECS: u64 = 10;

/// Hardware-fleet monitoring daemon.
#[derive(Debug, Parser)]
#[command(name = "fleetmon", version = fleetmon::VERSION, about)]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, default_value = "fleetmon.json")]
    config: String,

    /// Directory for log files.
    #[arg(long, default_value = logging::DEFAULT_LOG_DIR)]
    log_dir: String,
}

fn print_banner(config: &Config) {
    println!("fleetmon {}", fleetmon::VERSION);
    println!(
        "  topology:  {CHASSIS_COUNT} chassis x {BOARDS_PER_CHASSIS} boards = {} boards",
        CHASSIS_COUNT * BOARDS_PER_CHASSIS
    );
    println!("  backend:   {}", config.backend.api_url);
    println!(
        "  multicast: {} (broadcast {}, commands {})",
        config.udp.multicast_address,
        config.udp.state_broadcast_port,
        config.udp.command_listener_port
    );
    println!("  webhook:   0.0.0.0:{}", config.webhook.listen_port);
    println!();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let _guard = match logging::LogOptions::default()
        .with_directory(&cli.log_dir)
        .init()
    {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("failed to initialize logging: {e}");
            std::process::exit(1);
        }
    };

    let config = Config::load(&cli.config);
    print_banner(&config);

    let daemon = match Daemon::new(config) {
        Ok(daemon) => daemon,
        Err(e) => {
            error!(error = %e, "Daemon construction failed");
            std::process::exit(1);
        }
    };

    let shutdown = CancellationToken::new();
    let handle = match daemon.start(shutdown.clone()).await {
        Ok(handle) => handle,
        Err(e) => {
            error!(error = %e, "Daemon startup failed");
            std::process::exit(1);
        }
    };

    info!("fleetmon running, press Ctrl+C to stop");

    let mut heartbeat = tokio::time::interval(std::time::Duration::from_secs(HEARTBEAT_SECS));
    heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    heartbeat.tick().await;

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    error!(error = %e, "Signal handler failed");
                }
                info!("Stop signal received");
                break;
            }

            _ = heartbeat.tick() => {
                if let Some(overview) = handle.query().system_overview().data {
                    info!(
                        normal_boards = overview.normal_boards,
                        abnormal_boards = overview.abnormal_boards,
                        offline_boards = overview.offline_boards,
                        tasks = overview.total_tasks,
                        "Heartbeat"
                    );
                }
            }
        }
    }

    handle.shutdown().await;
}
