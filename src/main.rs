mod cli;

use mediagate::config::{self, Config, InstanceConfig};
use mg_core::{BackendFamily, InstanceKey, UserId};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use serde::Serialize;
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise pick defaults from the verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "mediagate=debug,mg_backend=debug,mg_core=debug".to_string()
        } else {
            "mediagate=info,mg_backend=info,mg_core=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Instances { user, json } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            list_instances(&config, user.as_deref(), json)
        }
        Commands::Version => {
            println!("mediagate {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            config::load_config(p)?
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    let warnings = config.validate();
    println!("✓ Configuration is valid");
    println!(
        "  Aggregation: max_concurrency={}, query_timeout_secs={}",
        config.aggregation.max_concurrency, config.aggregation.query_timeout_secs
    );
    println!("  Instances: {}", config.instances.len());
    println!(
        "    Enabled: {}",
        config.instances.iter().filter(|i| i.enabled).count()
    );
    if !warnings.is_empty() {
        println!("  Warnings:");
        for warning in &warnings {
            println!("    - {warning}");
        }
    }

    Ok(())
}

/// Instance listing without credentials.
#[derive(Serialize)]
struct InstanceView<'a> {
    key: InstanceKey,
    family: BackendFamily,
    name: &'a str,
    url: &'a str,
    user_id: UserId,
    enabled: bool,
    has_credentials: bool,
}

impl<'a> From<&'a InstanceConfig> for InstanceView<'a> {
    fn from(instance: &'a InstanceConfig) -> Self {
        Self {
            key: instance.key(),
            family: instance.kind.family(),
            name: &instance.name,
            url: &instance.url,
            user_id: instance.user_id,
            enabled: instance.enabled,
            has_credentials: instance.has_credentials(),
        }
    }
}

fn list_instances(config: &Config, user: Option<&str>, json: bool) -> Result<()> {
    let user: Option<UserId> = user
        .map(|u| u.parse().with_context(|| format!("Invalid user id: {u}")))
        .transpose()?;

    let views: Vec<InstanceView<'_>> = config
        .instances
        .iter()
        .filter(|i| user.map_or(true, |u| i.user_id == u))
        .map(InstanceView::from)
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    if views.is_empty() {
        println!("No instances configured");
        return Ok(());
    }

    for view in &views {
        println!(
            "{:<14} {:<24} {:<8} {}",
            view.key.to_string(),
            view.name,
            if view.enabled { "enabled" } else { "disabled" },
            view.url
        );
    }

    Ok(())
}
