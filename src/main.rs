use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use tint_sync::bridge::BridgeServer;
use tint_sync::config::loader;
use tint_sync::config::types::SyncSettings;
use tint_sync::consumer::{PageConsumer, ThemeSource};
use tint_sync::host::HostEditor;
use tint_sync::hostname;
use tint_sync::presets;
use tint_sync::replica::ExtensionReplica;
use tint_sync::store::FileStore;
use tint_sync::sync::Replicator;
use tint_sync::util::format_age;

#[derive(Parser)]
#[command(
    name = "tint-sync",
    version,
    about = "Cross-context theme synchronization for Tint"
)]
struct Cli {
    /// Path to config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the host bridge and the replication loop until Ctrl-C.
    Run {
        /// Start without a bridge, as on platforms that deny the capability.
        #[arg(long)]
        no_bridge: bool,
    },
    /// Show replica freshness.
    Status,
    /// Print the styles a page at URL would get, and where they came from.
    Show {
        /// Page URL or hostname.
        url: String,
    },
    /// List built-in presets.
    Presets,
    /// Apply a preset as the global page and keyboard theme.
    SetGlobal {
        /// Preset id; see `presets`.
        preset: String,
    },
    /// Set a site override from a preset.
    SetSite {
        /// Site URL or hostname (normalized before storing).
        host: String,
        /// Preset id; see `presets`.
        preset: String,
    },
    /// Remove a site override.
    RemoveSite {
        host: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let settings = loader::load_settings(cli.config.as_deref())?;
    let store = FileStore::with_namespace(loader::store_root(&settings), &settings.store.namespace);

    match cli.command {
        Commands::Run { no_bridge } => run(&settings, store, no_bridge).await,
        Commands::Status => status(&settings).await,
        Commands::Show { url } => show(&settings, store, &url).await,
        Commands::Presets => {
            for id in presets::list() {
                if let Some(preset) = presets::get(id) {
                    println!("{:<14} {}", preset.id, preset.label);
                }
            }
            Ok(())
        }
        Commands::SetGlobal { preset } => {
            let preset = lookup_preset(&preset)?;
            HostEditor::new(store).apply_preset(&preset).await?;
            println!("global theme set to {:?}", preset.id);
            Ok(())
        }
        Commands::SetSite { host, preset } => {
            let preset = lookup_preset(&preset)?;
            HostEditor::new(store)
                .set_site_override(&host, preset.page.clone())
                .await?;
            println!(
                "site override {:?} set for {}",
                preset.id,
                hostname::normalize(&host)
            );
            Ok(())
        }
        Commands::RemoveSite { host } => {
            let removed = HostEditor::new(store).remove_site_override(&host).await?;
            if removed {
                println!("removed override for {}", hostname::normalize(&host));
            } else {
                println!("no override for {}", hostname::normalize(&host));
            }
            Ok(())
        }
    }
}

fn lookup_preset(id: &str) -> Result<presets::Preset> {
    presets::get(id).with_context(|| {
        let names = presets::list().join(", ");
        format!("unknown preset {id:?}; available: {names}")
    })
}

async fn run(settings: &SyncSettings, store: FileStore, no_bridge: bool) -> Result<()> {
    let editor = HostEditor::new(store.clone());
    editor.ensure_initialized().await?;
    tracing::info!("store document at {}", store.path().display());

    let bridge = if no_bridge {
        tracing::info!("running without bridge capability");
        None
    } else {
        Some(BridgeServer::spawn(Arc::new(store)))
    };

    let replica = ExtensionReplica::open(loader::replica_path(settings)).await;
    let handle = Replicator::with_policy(bridge, replica, settings.policy()).spawn();

    tracing::info!("tint-sync running; Ctrl-C to stop");
    tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;
    handle.shutdown();
    Ok(())
}

async fn status(settings: &SyncSettings) -> Result<()> {
    let path = loader::replica_path(settings);
    let replica = ExtensionReplica::open(&path).await;
    println!("replica file:    {}", path.display());
    match replica.current() {
        Some(record) => {
            let age = record.age();
            let bound = settings.policy().staleness_bound();
            println!("record:          #{} (nonce {})", record.sync_count, record.sync_nonce);
            println!("synced:          {} ago ({})", format_age(age), record.synced_at);
            println!(
                "freshness:       {} (bound {})",
                if age <= bound { "fresh" } else { "stale" },
                format_age(bound)
            );
            println!(
                "global theme:    {}",
                if record.bundle.global_theme.enabled {
                    "enabled"
                } else {
                    "disabled"
                }
            );
            println!("site overrides:  {}", record.bundle.site_themes.len());
            println!("app overrides:   {}", record.bundle.app_themes.len());
        }
        None => println!("record:          none (no pull has ever succeeded)"),
    }
    Ok(())
}

async fn show(settings: &SyncSettings, store: FileStore, url: &str) -> Result<()> {
    // Run the real page startup chain: bridge first, then replica, then
    // compiled defaults.
    let bridge = Some(BridgeServer::spawn(Arc::new(store)));
    let replica = ExtensionReplica::open(loader::replica_path(settings)).await;
    let mut consumer = PageConsumer::new(url, bridge, replica, settings.policy(), None);

    let state = consumer.initialize().await;
    let source = match &state.source {
        ThemeSource::Bridge => "bridge (fresh from host)".to_owned(),
        ThemeSource::Replica { sync_count, .. } => {
            format!("replica (cached record #{sync_count})")
        }
        ThemeSource::Default => "compiled defaults".to_owned(),
    };
    println!("host:   {}", hostname::normalize(url));
    println!("source: {source}");

    match consumer.stylesheet() {
        Some(sheet) => {
            println!();
            println!("{}", sheet.css());
        }
        None => println!("(theming disabled for this page)"),
    }
    Ok(())
}
