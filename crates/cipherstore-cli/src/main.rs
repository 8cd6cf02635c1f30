mod cli;
mod config;
mod prefs;
mod storage;

use crate::cli::ConfigCommand;
use cipherstore_storage::key_provider::KeyProvider;
use clap::Parser;
use color_eyre::Result;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const HEALTH_PAYLOAD: &str = "ok";

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = cli::Cli::parse();
    let config = config::load()?;
    match cli.command.unwrap_or(cli::Command::List) {
        cli::Command::Version => print_version(),
        cli::Command::Health => run_health_check(&config).await?,
        cli::Command::Config(ConfigCommand::Init) => init_config(&config)?,
        cli::Command::List => {
            let store = storage::store_from_config(&config).await?;
            let all = prefs::list(&store).await?;
            if all.is_empty() {
                println!("No preferences yet. Add one with `cipherstore set <key> <value>`.");
            }
            for (key, value) in all {
                println!("{key} = {value}");
            }
        }
        cli::Command::Get { key } => {
            let store = storage::store_from_config(&config).await?;
            match prefs::get(&store, &key).await? {
                Some(value) => println!("{value}"),
                None => color_eyre::eyre::bail!("no preference named `{key}`"),
            }
        }
        cli::Command::Set { key, value } => {
            let store = storage::store_from_config(&config).await?;
            prefs::set(&store, key.clone(), value).await?;
            println!("Stored `{key}`");
        }
        cli::Command::Unset { key } => {
            let store = storage::store_from_config(&config).await?;
            if prefs::unset(&store, &key).await? {
                println!("Removed `{key}`");
            } else {
                println!("`{key}` was not set");
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    // Respect user-provided filters, default to info to avoid noisy stdout.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn print_version() {
    println!("cipherstore {}", env!("CARGO_PKG_VERSION"));
}

/// Runs a quick health check of the keychain and encrypted storage path.
async fn run_health_check(config: &config::Config) -> Result<()> {
    let root = storage::data_root(config)?;
    let provider = storage::key_provider(config)?;
    run_store_health(&root, provider.as_ref()).await?;
    println!("Storage: ok ({})", root.display());
    Ok(())
}

async fn run_store_health<P: KeyProvider + ?Sized>(root: &Path, provider: &P) -> Result<()> {
    let store = storage::probe_store(root, provider).await?;
    store.write(&HEALTH_PAYLOAD.to_string()).await?;
    let round_trip = store.read().await?;
    store.delete().await?;

    if round_trip != HEALTH_PAYLOAD {
        color_eyre::eyre::bail!("storage round-trip failed");
    }
    Ok(())
}

fn init_config(config: &config::Config) -> Result<()> {
    let path = config::write_default_if_missing(config)?;
    println!("Config initialized at {}", path.display());
    Ok(())
}
