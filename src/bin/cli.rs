//! proxypool CLI
//!
//! Fetches proxies from the built-in sources and prints picks or full
//! listings.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use proxypool::{
    collector::{Collector, CollectorOptions},
    error::Result,
    models::Config,
    sources,
    store::FilterOptions,
    utils::http,
};

/// proxypool - free proxy list aggregator
#[derive(Parser, Debug)]
#[command(name = "proxypool", version, about = "Free proxy list aggregator")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, default_value = "proxypool.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch and print one random proxy
    Get {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Fetch and print all matching proxies
    List {
        #[command(flatten)]
        filters: FilterArgs,

        /// Print as JSON instead of host:port lines
        #[arg(long)]
        json: bool,
    },

    /// Show the built-in sources and type groups
    Sources,
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// Only proxies with this country code (repeatable)
    #[arg(long)]
    code: Vec<String>,

    /// Only proxies from this country (repeatable)
    #[arg(long)]
    country: Vec<String>,

    /// Only proxies of this protocol (repeatable)
    #[arg(long = "type")]
    protocol: Vec<String>,

    /// Only anonymous proxies
    #[arg(long)]
    anonymous: bool,
}

impl FilterArgs {
    fn to_options(&self) -> Option<FilterOptions> {
        let mut opts = FilterOptions::new();
        if !self.code.is_empty() {
            opts = opts.with("code", self.code.clone());
        }
        if !self.country.is_empty() {
            opts = opts.with("country", self.country.clone());
        }
        if !self.protocol.is_empty() {
            opts = opts.with("type", self.protocol.clone());
        }
        if self.anonymous {
            opts = opts.with("anonymous", ["true"]);
        }
        (!opts.is_empty()).then_some(opts)
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    config.validate()?;

    let client = http::create_client(&config.client)?;
    let registry = sources::default_registry(client)?;

    match cli.command {
        Command::Get { filters } => {
            let collector =
                Collector::new(&registry, CollectorOptions::from_config(&config.collector))?;
            match collector.get(filters.to_options().as_ref()).await? {
                Some(proxy) => println!("{proxy}"),
                None => log::warn!("No proxy available"),
            }
        }

        Command::List { filters, json } => {
            let collector =
                Collector::new(&registry, CollectorOptions::from_config(&config.collector))?;
            match collector.get_all(filters.to_options().as_ref()).await? {
                Some(proxies) if json => {
                    println!("{}", serde_json::to_string_pretty(&proxies)?);
                }
                Some(proxies) => {
                    log::info!("{} proxies", proxies.len());
                    for proxy in proxies {
                        println!("{proxy}");
                    }
                }
                None => log::warn!("No proxies available"),
            }
        }

        Command::Sources => {
            for type_name in registry.type_names() {
                let mut members: Vec<&String> = registry
                    .sources_for_type(type_name)
                    .map(|s| s.iter().collect())
                    .unwrap_or_default();
                members.sort();
                println!("{type_name}:");
                for member in members {
                    println!("  {member}");
                }
            }
        }
    }

    Ok(())
}
