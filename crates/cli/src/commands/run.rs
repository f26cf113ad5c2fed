//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::pipeline::{Session, SessionConfig};

/// Execute the `run` command
pub async fn run_session(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    // Every setting has a built-in default, so a missing file is not fatal
    let mut blueprint = if args.config.exists() {
        config_loader::ConfigLoader::load_from_path(&args.config)
            .with_context(|| format!("Failed to load config from {}", args.config.display()))?
    } else {
        warn!(
            config = %args.config.display(),
            "Configuration file not found, using built-in defaults"
        );
        contracts::ClientBlueprint::default()
    };

    // Apply CLI overrides
    if let Some(ref base_url) = args.base_url {
        info!(base_url = %base_url, "Overriding API base URL from CLI");
        blueprint.server.api_base_url = base_url.clone();
    }
    if let Some(interval_ms) = args.interval_ms {
        info!(interval_ms, "Overriding poll interval from CLI");
        blueprint.server.position_update_interval_ms = interval_ms;
    }

    info!(
        base_url = %blueprint.server.api_base_url,
        interval_ms = blueprint.server.position_update_interval_ms,
        companion_radius = blueprint.companion.radius,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let session_config = SessionConfig {
        blueprint,
        max_updates: if args.max_updates == 0 {
            None
        } else {
            Some(args.max_updates)
        },
        timeout: if args.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(args.timeout))
        },
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    let session = Session::new(session_config);

    // Setup graceful shutdown handler
    let shutdown_signal = setup_shutdown_signal();

    info!(mock = args.mock, "Starting session...");

    let run = async {
        if args.mock {
            session.run_mock().await
        } else {
            session.run().await
        }
    };

    tokio::select! {
        result = run => {
            match result {
                Ok(stats) => {
                    info!(
                        updates_applied = stats.updates_applied,
                        companion_met = stats.companion_met,
                        duration_secs = stats.duration.as_secs_f64(),
                        updates_per_second = format!("{:.2}", stats.updates_per_second()),
                        "Session completed successfully"
                    );

                    stats.print_summary();
                }
                Err(e) => {
                    return Err(e).context("Session execution failed");
                }
            }
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, stopping session...");
        }
    }

    info!("Maze Walker finished");
    Ok(())
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &contracts::ClientBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Server:");
    println!("  API base URL: {}", blueprint.server.api_base_url);
    println!(
        "  Poll interval: {} ms",
        blueprint.server.position_update_interval_ms
    );

    println!("\nSync:");
    println!(
        "  Default engine interval: {} ms",
        blueprint.sync.default_interval_ms
    );

    println!("\nCompanion:");
    match blueprint.companion.position {
        Some([x, y]) => println!("  Position: ({x}, {y})"),
        None => println!("  Position: (default placement)"),
    }
    println!("  Meet radius: {}", blueprint.companion.radius);

    println!();
}
