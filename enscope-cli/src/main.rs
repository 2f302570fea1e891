//! enscope CLI
//!
//! Command-line interface for ENS profile lookups with RPC endpoint failover.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use ethers::types::Address;
use ethers::utils::to_checksum;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use enscope_resolver::{EnsResolver, ResolverConfig};

/// enscope - ENS profile lookup with endpoint failover
#[derive(Parser)]
#[command(name = "enscope")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Ethereum RPC URL (tried before the public fallbacks)
    #[arg(long, global = true, env = "ETH_RPC_URL")]
    rpc_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve an ENS name to an address
    Resolve {
        /// ENS name (e.g. vitalik.eth)
        name: String,
    },

    /// Reverse-resolve an address to its primary ENS name
    Reverse {
        /// Ethereum address (0x...)
        address: String,
    },

    /// Fetch the avatar URI for an ENS name
    Avatar {
        /// ENS name
        name: String,
    },

    /// Fetch one text record for an ENS name
    Text {
        /// ENS name
        name: String,
        /// Record key (e.g. com.twitter)
        key: String,
    },

    /// Resolve a full profile for a name or address
    Profile {
        /// ENS name or 0x address
        query: String,
        /// Print the profile as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "enscope=debug,info"
    } else {
        "enscope=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match cli.rpc_url {
        Some(url) => ResolverConfig::with_rpc(url),
        None => ResolverConfig::default(),
    };
    let resolver = EnsResolver::with_config(config);

    match cli.command {
        Commands::Resolve { name } => cmd_resolve(&resolver, &name).await,
        Commands::Reverse { address } => cmd_reverse(&resolver, &address).await,
        Commands::Avatar { name } => cmd_avatar(&resolver, &name).await,
        Commands::Text { name, key } => cmd_text(&resolver, &name, &key).await,
        Commands::Profile { query, json } => cmd_profile(&resolver, &query, json).await,
    }
}

/// Resolve a name to an address
async fn cmd_resolve(resolver: &EnsResolver, name: &str) -> Result<()> {
    match resolver.resolve_name(name).await {
        Some(address) => println!("{}", to_checksum(&address, None).green()),
        None => println!("{}", "not found".dimmed()),
    }
    Ok(())
}

/// Reverse-resolve an address to its primary name
async fn cmd_reverse(resolver: &EnsResolver, address: &str) -> Result<()> {
    let address: Address = address
        .parse()
        .with_context(|| format!("invalid address: {address}"))?;
    match resolver.lookup_address(address).await {
        Some(name) => println!("{}", name.green()),
        None => println!("{}", "not found".dimmed()),
    }
    Ok(())
}

/// Fetch the avatar URI for a name
async fn cmd_avatar(resolver: &EnsResolver, name: &str) -> Result<()> {
    match resolver.get_avatar(name).await {
        Some(uri) => println!("{uri}"),
        None => println!("{}", "not found".dimmed()),
    }
    Ok(())
}

/// Fetch one text record for a name
async fn cmd_text(resolver: &EnsResolver, name: &str, key: &str) -> Result<()> {
    match resolver.get_text_record(name, key).await {
        Some(value) => println!("{value}"),
        None => println!("{}", "not found".dimmed()),
    }
    Ok(())
}

/// Resolve and print a full profile
async fn cmd_profile(resolver: &EnsResolver, query: &str, json: bool) -> Result<()> {
    let Some(profile) = resolver.resolve_profile(query).await else {
        println!("{}", "not found".dimmed());
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }

    if let Some(name) = &profile.name {
        println!("{}  {}", "name".cyan().bold(), name);
    }
    if let Some(address) = &profile.address {
        println!("{}  {}", "addr".cyan().bold(), address);
    }
    if let Some(avatar) = &profile.avatar {
        println!("{}  {}", "avtr".cyan().bold(), avatar);
    }
    let mut keys: Vec<_> = profile.records.keys().collect();
    keys.sort();
    for key in keys {
        println!("{}  {} = {}", "text".cyan().bold(), key, profile.records[key]);
    }
    Ok(())
}
