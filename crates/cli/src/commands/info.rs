//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    server: ServerInfo,
    sync: SyncInfo,
    companion: CompanionInfo,
}

#[derive(Serialize)]
struct ServerInfo {
    api_base_url: String,
    position_update_interval_ms: u64,
}

#[derive(Serialize)]
struct SyncInfo {
    default_interval_ms: u64,
}

#[derive(Serialize)]
struct CompanionInfo {
    radius: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    position: Option<[f64; 2]>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint);
    }

    Ok(())
}

fn build_config_info(blueprint: &contracts::ClientBlueprint) -> ConfigInfo {
    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        server: ServerInfo {
            api_base_url: blueprint.server.api_base_url.clone(),
            position_update_interval_ms: blueprint.server.position_update_interval_ms,
        },
        sync: SyncInfo {
            default_interval_ms: blueprint.sync.default_interval_ms,
        },
        companion: CompanionInfo {
            radius: blueprint.companion.radius,
            position: blueprint.companion.position,
        },
    }
}

fn print_config_info(blueprint: &contracts::ClientBlueprint) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                Maze Walker Configuration                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("🌐 Server");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ API base URL: {}", blueprint.server.api_base_url);
    println!(
        "   └─ Poll interval: {} ms",
        blueprint.server.position_update_interval_ms
    );

    println!("\n⚙️  Sync");
    println!(
        "   └─ Default engine interval: {} ms",
        blueprint.sync.default_interval_ms
    );

    println!("\n🐕 Companion");
    match blueprint.companion.position {
        Some([x, y]) => println!("   ├─ Position: ({x}, {y})"),
        None => println!("   ├─ Position: (default placement)"),
    }
    println!("   └─ Meet radius: {}", blueprint.companion.radius);

    println!();
}
