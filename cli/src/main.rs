//! SASE Rules CLI
//!
//! Inspect the subscription condition catalog, compile a filter to the
//! membership query it runs, and manage the rules config file.
//!
//! # Usage
//!
//! ```bash
//! sase-rules catalog --commerce-enabled --recurring
//! sase-rules compile --property has_subscription_active 42 42:7
//! sase-rules compile --property subscription_expiring_7d --now 2026-03-01T22:30:00Z 9
//! sase-rules config set utc_offset_hours 5.5
//! sase-rules --format json catalog
//! ```

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod output;

#[derive(Parser)]
#[command(name = "sase-rules")]
#[command(author = "OpenSASE")]
#[command(version)]
#[command(about = "Subscription segment and automation rules", long_about = None)]
struct Cli {
    /// Rules config file (defaults to ~/.opensase/rules.toml)
    #[arg(long, env = "SASE_RULES_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    format: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List subscription conditions
    Catalog {
        /// Treat the configured commerce provider as enabled
        #[arg(long)]
        commerce_enabled: bool,
        /// Treat recurring billing as available
        #[arg(long)]
        recurring: bool,
    },
    /// Compile a filter to its membership query
    Compile {
        /// Condition key, e.g. has_subscription_active
        #[arg(long)]
        property: String,
        #[arg(long, default_value = "in")]
        operator: String,
        /// Evaluation time, RFC 3339 (defaults to now)
        #[arg(long)]
        now: Option<String>,
        /// Product selectors, `product` or `product:price`
        #[arg(required = true)]
        values: Vec<String>,
    },
    /// Manage the rules config file
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Set configuration value
    Set { key: String, value: String },
    /// Get configuration value
    Get { key: String },
    /// List all configuration
    List,
    /// Initialize configuration
    Init,
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = config::config_path(cli.config).and_then(|path| match cli.command {
        Commands::Catalog { commerce_enabled, recurring } => {
            commands::catalog::handle(&path, commerce_enabled, recurring, cli.format)
        }
        Commands::Compile { property, operator, now, values } => {
            let args = commands::compile::CompileArgs { property, operator, now, values };
            commands::compile::handle(&path, args, cli.format)
        }
        Commands::Config { action } => commands::config::handle(action, &path),
    });

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
