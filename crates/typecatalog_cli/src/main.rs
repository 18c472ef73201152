//! Catalog inspection entry point.
//!
//! # Responsibility
//! - Bootstrap the process catalog and print lookups for quick sanity checks.
//! - Keep output deterministic by sorting on qualified name.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::debug;
use std::path::PathBuf;
use std::sync::Arc;
use typecatalog_core::{
    catalog, notification_capability, request_capability, LoggingConfig, TypeDescriptor,
};

#[derive(Debug, Parser)]
#[command(name = "typecatalog", version, about = "Inspect the runtime type catalog")]
struct Cli {
    /// Overrides TYPECATALOG_LOG_LEVEL.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Overrides TYPECATALOG_LOG_DIR; must be absolute.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Print descriptors as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Every registered descriptor.
    List,
    /// Descriptors whose name contains a fragment.
    Find { fragment: String },
    /// Descriptors declared in one namespace.
    Namespace { namespace: String },
    /// Descriptors satisfying a marker contract.
    Capable { contract: Contract },
    /// Instantiate a type by qualified name and report what was built.
    New {
        name: String,
        /// Force a reference instance for value-kind types.
        #[arg(long)]
        reference: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Contract {
    Request,
    Notification,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    LoggingConfig::from_env()
        .with_level(cli.log_level.clone())
        .with_log_dir(cli.log_dir.clone())
        .apply()
        .map_err(anyhow::Error::msg)
        .context("failed to initialize logging")?;

    let registry = catalog();
    debug!(
        "event=cli_start module=cli status=ok command={:?} entries={}",
        cli.command,
        registry.len()
    );

    let descriptors = match &cli.command {
        Command::List => registry.all_registered(),
        Command::Find { fragment } => registry.lookup_by_substring(fragment),
        Command::Namespace { namespace } => registry.all_in_namespace(namespace),
        Command::Capable { contract } => registry.implementing(match contract {
            Contract::Request => request_capability(),
            Contract::Notification => notification_capability(),
        }),
        Command::New { name, reference } => {
            let instance = if *reference {
                registry.new_reference_instance(name)
            } else {
                registry.new_instance(name)
            }
            .with_context(|| format!("cannot instantiate `{name}`"))?;
            println!("{} kind={}", instance.type_name(), instance.kind().as_str());
            return Ok(());
        }
    };

    print_descriptors(descriptors, cli.json)
}

fn print_descriptors(mut descriptors: Vec<Arc<TypeDescriptor>>, json: bool) -> Result<()> {
    descriptors.sort_by(|left, right| left.qualified_name().cmp(right.qualified_name()));
    if json {
        let infos: Vec<_> = descriptors.iter().map(|descriptor| descriptor.info()).collect();
        println!("{}", serde_json::to_string_pretty(&infos)?);
        return Ok(());
    }
    for descriptor in &descriptors {
        println!(
            "{}\t{}\t{}",
            descriptor.qualified_name(),
            descriptor.kind().as_str(),
            descriptor.shape().type_name()
        );
    }
    Ok(())
}
