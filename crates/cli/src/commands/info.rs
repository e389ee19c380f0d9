//! `info` command implementation.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use contracts::SunshineConfig;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    primary: PrimaryInfo,
    companion: CompanionInfo,
    channel: ChannelInfo,
    forecast_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    forecasts: Vec<ForecastInfo>,
}

#[derive(Serialize)]
struct PrimaryInfo {
    node: String,
    location: String,
    units: String,
    time_zone_offset_minutes: i32,
}

#[derive(Serialize)]
struct CompanionInfo {
    node: String,
    request_policy: String,
    tick_interval_ms: u64,
    background: String,
    time_zone_offset_minutes: i32,
}

#[derive(Serialize)]
struct ChannelInfo {
    connect_latency_ms: u64,
    delivery_latency_ms: u64,
    batch_delay_ms: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    unreachable_nodes: Vec<String>,
}

#[derive(Serialize)]
struct ForecastInfo {
    location: String,
    date: NaiveDate,
    high: f64,
    low: f64,
    condition: i32,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&config, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&config, args);
    }

    Ok(())
}

fn build_config_info(config: &SunshineConfig, args: &InfoArgs) -> ConfigInfo {
    let forecasts = if args.forecasts {
        config
            .forecasts
            .iter()
            .map(|row| ForecastInfo {
                location: row.location.clone(),
                date: row.date,
                high: row.high,
                low: row.low,
                condition: row.condition,
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", config.version),
        primary: PrimaryInfo {
            node: config.primary.node.clone(),
            location: config.primary.location.clone(),
            units: format!("{:?}", config.primary.units),
            time_zone_offset_minutes: config.primary.time_zone_offset_minutes,
        },
        companion: CompanionInfo {
            node: config.companion.node.clone(),
            request_policy: format!("{:?}", config.companion.request_policy),
            tick_interval_ms: config.companion.tick_interval_ms,
            background: config.companion.background.clone(),
            time_zone_offset_minutes: config.companion.time_zone_offset_minutes,
        },
        channel: ChannelInfo {
            connect_latency_ms: config.channel.connect_latency_ms,
            delivery_latency_ms: config.channel.delivery_latency_ms,
            batch_delay_ms: config.channel.batch_delay_ms,
            unreachable_nodes: config.channel.unreachable_nodes.clone(),
        },
        forecast_count: config.forecasts.len(),
        forecasts,
    }
}

fn print_config_info(config: &SunshineConfig, args: &InfoArgs) {
    println!("=== Sunshine Sync Configuration ===\n");

    println!("Primary");
    println!("   ├─ Version: {:?}", config.version);
    println!("   ├─ Node: {}", config.primary.node);
    println!("   ├─ Location: {}", config.primary.location);
    println!("   ├─ Units: {:?}", config.primary.units);
    println!("   └─ UTC offset: {} min", config.primary.time_zone_offset_minutes);

    let companion = &config.companion;
    println!("\nCompanion");
    println!("   ├─ Node: {}", companion.node);
    println!("   ├─ Request policy: {:?}", companion.request_policy);
    println!("   ├─ Tick interval: {} ms", companion.tick_interval_ms);
    println!("   ├─ Background: {}", companion.background);
    println!("   └─ UTC offset: {} min", companion.time_zone_offset_minutes);

    let channel = &config.channel;
    println!("\nChannel");
    println!("   ├─ Connect latency: {} ms", channel.connect_latency_ms);
    println!("   ├─ Delivery latency: {} ms", channel.delivery_latency_ms);
    println!("   ├─ Batch delay: {} ms", channel.batch_delay_ms);
    if channel.unreachable_nodes.is_empty() {
        println!("   └─ Unreachable nodes: (none)");
    } else {
        println!("   └─ Unreachable nodes: {:?}", channel.unreachable_nodes);
    }

    println!("\nForecasts ({})", config.forecasts.len());
    if args.forecasts {
        for (i, row) in config.forecasts.iter().enumerate() {
            let prefix = if i == config.forecasts.len() - 1 {
                "└─"
            } else {
                "├─"
            };
            println!(
                "   {} {} {} high {:.1} low {:.1} condition {}",
                prefix, row.location, row.date, row.high, row.low, row.condition
            );
        }
    }

    println!();
}
