//! tfinv
//!
//! Ansible dynamic inventory built from Terraform state

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::Result;
use eyre::WrapErr;
use serde::Serialize;
use tfinv_exec::LocalExecutor;
use tfinv_inventory::{InventoryCollector, InventoryDocument, TerraformClient, build_inventory};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod config;

use config::Config;

/// Ansible dynamic inventory from Terraform state
#[derive(Parser, Debug)]
#[command(name = "tfinv", version, about)]
struct Args {
    /// Print the whole inventory (the default)
    #[arg(long, conflicts_with = "host")]
    list: bool,

    /// Print the variables of a single host
    #[arg(long, value_name = "HOSTNAME")]
    host: Option<String>,

    /// Read state from a file instead of running terraform ("-" for stdin)
    #[arg(long, value_name = "PATH")]
    state: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Terraform workspace to select
    #[arg(short, long)]
    workspace: Option<String>,

    /// Log level, used when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,

    /// Print JSON on a single line
    #[arg(long)]
    compact: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    config.apply_env();
    if let Some(workspace) = &args.workspace {
        config.terraform.workspace.clone_from(workspace);
    }
    if let Some(level) = &args.log_level {
        config.log_level.clone_from(level);
    }

    init_tracing(&config.log_level);
    debug!(list = args.list, host = ?args.host, config = ?config, "starting");

    let document = match &args.state {
        Some(path) => {
            let text = read_state(path)?;
            build_inventory(&text, &config.inventory.provider_prefix)
                .wrap_err("failed to build inventory")?
        }
        None => collector(&config)
            .collect()
            .await
            .wrap_err("failed to build inventory from terraform")?,
    };

    let output = match &args.host {
        Some(hostname) => render(&host_vars(&document, hostname), args.compact)?,
        None => render(&document, args.compact)?,
    };

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{output}")?;
    stdout.flush()?;

    Ok(())
}

/// Logs go to stderr; stdout carries only the inventory
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn collector(config: &Config) -> InventoryCollector {
    let mut client = TerraformClient::new(Arc::new(LocalExecutor::new()))
        .with_binary(config.terraform.bin.clone())
        .with_workspace(config.terraform.workspace.clone());
    if let Some(dir) = &config.terraform.dir {
        client = client.with_working_dir(dir.clone());
    }
    if let Some(secs) = config.terraform.timeout_secs {
        client = client.with_timeout(Duration::from_secs(secs));
    }

    InventoryCollector::new(client).with_provider_prefix(config.inventory.provider_prefix.clone())
}

fn read_state(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .wrap_err("failed to read state from stdin")?;
        return Ok(text);
    }

    std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read state file {}", path.display()))
}

/// Unknown hosts answer with an empty mapping
fn host_vars(document: &InventoryDocument, hostname: &str) -> tfinv_inventory::Vars {
    document.host_vars(hostname).cloned().unwrap_or_default()
}

fn render<T: Serialize>(value: &T, compact: bool) -> Result<String> {
    let text = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    Ok(text)
}
