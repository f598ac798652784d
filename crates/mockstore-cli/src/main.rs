//! # Mockstore CLI
//!
//! A thin operator tool over the `mockstore` library, used to seed fixtures into a
//! file-backed data directory and to look at what a running mock has written.
//!
//! Every subcommand maps onto exactly one store operation and prints the result as
//! pretty JSON on stdout. Logs go to stderr through `tracing`; `--verbose` or
//! `RUST_LOG` turn them up.

use anyhow::{bail, Context, Result};
use clap::Parser;
use mockstore::config::{StoreConfig, CONFIG_FILE_NAME};
use mockstore::identity::ResourceIdentity;
use mockstore::resource::Resource;
use mockstore::store::resource_store::ResourceStore;
use mockstore::store::DataStore;
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod args;
use args::{Cli, Commands};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let boxed = init_store(&cli)?;
    let store = boxed.as_ref();

    match cli.command {
        Commands::Get { path } => handle_get(store, &path).await,
        Commands::List { collection } => handle_list(store, &collection).await,
        Commands::Save { path, data } => handle_save(store, &path, &data).await,
        Commands::SaveCollection { collection, items } => {
            handle_save_collection(store, &collection, &items).await
        }
        Commands::Delete { path } => handle_delete(store, &path).await,
        Commands::DeleteCollection { collection, names } => {
            handle_delete_collection(store, &collection, names).await
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn init_store(cli: &Cli) -> Result<Box<dyn DataStore>> {
    let data_dir = StoreConfig::resolve_data_dir(cli.data_dir.as_deref())?;
    let config_file = match &cli.config {
        Some(file) => file.clone(),
        None => data_dir.join(CONFIG_FILE_NAME),
    };

    let mut config = StoreConfig::load(Some(&config_file)).context("loading config")?;
    if cli.data_dir.is_some() {
        config.data_dir = cli.data_dir.clone();
    }
    config.case_sensitive |= cli.case_sensitive;
    config.strict |= cli.strict;
    debug!(?config, "resolved config");

    let backend = config.fs_backend()?;
    let store = ResourceStore::with_backend(backend).with_options(config.match_options());
    Ok(Box::new(store))
}

fn parse_json(raw: &str) -> Result<Value> {
    serde_json::from_str(raw).with_context(|| format!("invalid JSON: {}", raw))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn handle_get(store: &dyn DataStore, path: &str) -> Result<()> {
    match store.get_resource(&ResourceIdentity::from_path(path)).await? {
        Some(resource) => print_json(&resource),
        None => bail!("Resource not found: {}", path),
    }
}

async fn handle_list(store: &dyn DataStore, collection: &str) -> Result<()> {
    let resources = store.get_collection(collection).await?;
    print_json(&resources)
}

async fn handle_save(store: &dyn DataStore, path: &str, data: &str) -> Result<()> {
    let resource = Resource::with_data(path, parse_json(data)?);
    let saved = store.save_resource(resource).await?;
    print_json(&saved)
}

async fn handle_save_collection(store: &dyn DataStore, collection: &str, items: &str) -> Result<()> {
    let Value::Object(items) = parse_json(items)? else {
        bail!("Expected a JSON object mapping names to data");
    };

    let resources = items
        .into_iter()
        .map(|(name, data)| Resource::in_collection(collection, name, data))
        .collect::<mockstore::error::Result<Vec<_>>>()?;

    let saved = store.save_collection(collection, resources).await?;
    print_json(&saved)
}

async fn handle_delete(store: &dyn DataStore, path: &str) -> Result<()> {
    match store.delete_resource(&ResourceIdentity::from_path(path)).await? {
        Some(resource) => print_json(&resource),
        None => bail!("Resource not found: {}", path),
    }
}

async fn handle_delete_collection(
    store: &dyn DataStore,
    collection: &str,
    names: Vec<String>,
) -> Result<()> {
    let removed = if names.is_empty() {
        store.delete_collection(collection, None).await?
    } else {
        let targets = names
            .into_iter()
            .map(|name| Resource::in_collection(collection, name, Value::Null))
            .collect::<mockstore::error::Result<Vec<_>>>()?;
        store.delete_collection(collection, Some(targets.as_slice())).await?
    };
    print_json(&removed)
}
