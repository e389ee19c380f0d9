//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::SunshineConfig;
use std::time::Duration;
use tracing::info;

use crate::cli::RunArgs;
use crate::session::{Session, SessionConfig};

/// Execute the `run` command
pub async fn run_session(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let mut config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(ref location) = args.location {
        info!(location = %location, "Overriding preferred location from CLI");
        config.primary.location = location.clone();
    }
    if let Some(units) = args.units {
        info!(units = ?units, "Overriding temperature units from CLI");
        config.primary.units = units.into();
    }
    if let Some(policy) = args.policy {
        info!(policy = ?policy, "Overriding request policy from CLI");
        config.companion.request_policy = policy.into();
    }
    config_loader::ConfigLoader::validate(&config)
        .context("Configuration invalid after CLI overrides")?;

    info!(
        location = %config.primary.location,
        units = ?config.primary.units,
        primary = %config.primary.node,
        companion = %config.companion.node,
        forecasts = config.forecasts.len(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    let session = Session::new(SessionConfig {
        config,
        duration: (args.duration > 0).then(|| Duration::from_secs(args.duration)),
        ambient_every: (args.ambient_every > 0).then(|| Duration::from_secs(args.ambient_every)),
        low_bit_ambient: args.low_bit_ambient,
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
    });

    info!("Starting session...");
    let stats = session
        .run(shutdown_signal())
        .await
        .context("Session failed")?;

    info!(
        duration_secs = stats.duration.as_secs_f64(),
        snapshots = stats.face.snapshots,
        "Session completed"
    );
    stats.print_summary();

    info!("Sunshine Sync finished");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &SunshineConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Primary:");
    println!("  Node: {}", config.primary.node);
    println!("  Location: {}", config.primary.location);
    println!("  Units: {:?}", config.primary.units);
    println!("\nCompanion:");
    println!("  Node: {}", config.companion.node);
    println!("  Request policy: {:?}", config.companion.request_policy);
    println!("  Tick interval: {} ms", config.companion.tick_interval_ms);
    println!(
        "\nForecasts for {} ({}):",
        config.primary.location,
        config.forecasts_for(&config.primary.location).count()
    );
    for row in config.forecasts_for(&config.primary.location) {
        println!(
            "  - {} high {:.1} low {:.1} condition {}",
            row.date, row.high, row.low, row.condition
        );
    }
    println!();
}
