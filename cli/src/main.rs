//! Rehydra CLI - persist and inspect application state from the shell

mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{parse_value, Session};
use config::{default_store_path, CliConfig};
use rehydra_core::{StateMap, StorageConfig};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "rehydra")]
#[command(about = "Rehydra - persisted application state")]
#[command(version)]
struct Cli {
    /// Configuration file path (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// sled database directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Use a volatile in-memory store
    #[arg(long, conflicts_with = "data_dir")]
    memory: bool,

    /// Key prefix in the durable store
    #[arg(long)]
    prefix: Option<String>,

    /// Only persist these fields
    #[arg(long, value_delimiter = ',')]
    whitelist: Option<Vec<String>>,

    /// Never persist these fields
    #[arg(long, value_delimiter = ',')]
    blacklist: Option<Vec<String>>,

    /// Trace every persistence phase
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the rehydrated state
    Show,

    /// Print one field
    Get {
        field: String,
    },

    /// Set a field (value is parsed as JSON, else kept as a string)
    Set {
        field: String,
        value: String,
    },

    /// Remove fields from the state and the durable store
    Unset {
        #[arg(required = true)]
        fields: Vec<String>,
    },

    /// List raw durable entries under the prefix
    Keys,

    /// Delete every durable entry under the prefix
    Purge,

    /// Write a configuration template
    InitConfig {
        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    fn resolve_config(&self) -> anyhow::Result<CliConfig> {
        let mut config = match &self.config {
            Some(path) => CliConfig::load(path)?,
            None => CliConfig {
                storage: StorageConfig::sled(default_store_path()),
                ..Default::default()
            },
        };

        if self.memory {
            config.storage = StorageConfig::Memory;
        } else if let Some(dir) = &self.data_dir {
            config.storage = StorageConfig::sled(dir);
        }
        if let Some(prefix) = &self.prefix {
            config.persist.prefix = prefix.clone();
        }
        if let Some(whitelist) = &self.whitelist {
            config.persist.whitelist = Some(whitelist.clone());
        }
        if let Some(blacklist) = &self.blacklist {
            config.persist.blacklist = Some(blacklist.clone());
        }
        config.persist.log |= self.verbose;
        config.persist.validate()?;

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "warn" };
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = cli.resolve_config()?;

    match cli.command {
        Commands::InitConfig { output } => {
            let json = config.to_json()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &json)?;
                    println!("Configuration saved to: {}", path.display());
                }
                None => println!("{}", json),
            }
        }

        Commands::Show => {
            let session = Session::open(&config).await?;
            let state = serde_json::Value::Object(session.state());
            println!("{}", serde_json::to_string_pretty(&state)?);
            session.close().await?;
        }

        Commands::Get { field } => {
            let session = Session::open(&config).await?;
            match session.get(&field) {
                Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
                None => eprintln!("{} {}", "not set:".yellow(), field),
            }
            session.close().await?;
        }

        Commands::Set { field, value } => {
            let session = Session::open(&config).await?;
            let value = parse_value(&value);

            let mut fields = StateMap::new();
            fields.insert(field.clone(), value.clone());
            session.set(fields).await?;

            println!("{} {} = {}", "set".green().bold(), field.cyan(), value);
            session.close().await?;
        }

        Commands::Unset { fields } => {
            let session = Session::open(&config).await?;
            session.unset(&fields).await?;
            println!("{} {}", "unset".green().bold(), fields.join(", ").cyan());
            session.close().await?;
        }

        Commands::Keys => {
            let session = Session::open(&config).await?;
            for (key, value) in session.entries().await? {
                println!("{} {}", key.cyan(), value);
            }
            session.close().await?;
        }

        Commands::Purge => {
            let session = Session::open(&config).await?;
            session.purge().await?;
            println!("{}", "purged".red().bold());
            session.close().await?;
        }
    }

    Ok(())
}
