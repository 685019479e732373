//! nemrpc CLI: query a NEM node and tail its notification topics.
//!
//! Usage:
//! ```bash
//! # Current chain height
//! nemrpc height --network testnet
//!
//! # Node details
//! nemrpc node --url http://23.228.67.85:7890
//!
//! # Balance and harvesting status
//! nemrpc account --address TBCI2A67UQZAKCR6NS4JWAEICEIGEIM72G3MVW5S
//!
//! # Print every new block as it arrives
//! nemrpc stream blocks
//!
//! # Account-scoped topics need an address
//! nemrpc stream unconfirmed --address TBCI2A67UQZAKCR6NS4JWAEICEIGEIM72G3MVW5S
//! ```

use std::env;
use std::process;

use futures::StreamExt;
use tracing_subscriber::EnvFilter;

use nemrpc_core::Network;
use nemrpc_http::NodeClient;
use nemrpc_ws::{StreamClient, StreamConfig, Topic};

#[tokio::main]
async fn main() {
    init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "height" => cmd_height(&args[2..]).await,
        "node" => cmd_node(&args[2..]).await,
        "account" => cmd_account(&args[2..]).await,
        "stream" => cmd_stream(&args[2..]).await,
        "version" | "--version" | "-V" => {
            println!("nemrpc {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Logs go to stderr so that stdout only carries frames and results.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_usage() {
    println!("nemrpc {}", env!("CARGO_PKG_VERSION"));
    println!("Query a NEM node and tail its notification topics\n");
    println!("USAGE:");
    println!("    nemrpc <COMMAND> [FLAGS]\n");
    println!("COMMANDS:");
    println!("    height           Print the current chain height");
    println!("    node             Print node and NIS details");
    println!("    account          Print balance and status of --address");
    println!("    stream <TOPIC>   Print frames from a topic until the node disconnects");
    println!("    version          Print version");
    println!("    help             Print this help\n");
    println!("TOPICS:");
    println!("    blocks, errors, unconfirmed, transactions, recent, account,");
    println!("    mosaic-definitions, mosaics, namespaces\n");
    println!("FLAGS:");
    println!("    --url <URL>           Node REST URL (default: public node of --network)");
    println!("    --network <NETWORK>   mainnet | testnet  [default: mainnet]");
    println!("    --address <ADDRESS>   Account address for account-scoped topics");
    println!("    --strict              Reject frames missing their trailing NUL\n");
    println!("Set RUST_LOG=debug for connection logs.");
}

fn node_url(args: &[String]) -> Result<String, String> {
    if let Some(url) = parse_flag(args, "--url") {
        return Ok(url);
    }
    let network: Network = match parse_flag(args, "--network") {
        Some(n) => n.parse()?,
        None => Network::default(),
    };
    Ok(network.default_url())
}

async fn cmd_height(args: &[String]) -> Result<(), String> {
    let url = node_url(args)?;
    let client = NodeClient::new(&url, Default::default()).map_err(|e| e.to_string())?;

    let start = std::time::Instant::now();
    let height = client.chain_height().await.map_err(|e| e.to_string())?;

    println!("  Node:    {url}");
    println!("  Height:  {}", height.height);
    println!("  Latency: {}ms", start.elapsed().as_millis());
    Ok(())
}

async fn cmd_node(args: &[String]) -> Result<(), String> {
    let url = node_url(args)?;
    let client = NodeClient::new(&url, Default::default()).map_err(|e| e.to_string())?;
    let info = client.node_info().await.map_err(|e| e.to_string())?;

    println!("  Name:        {}", info.node.identity.name);
    println!("  Public key:  {}", info.node.identity.public_key);
    println!(
        "  Endpoint:    {}://{}:{}",
        info.node.endpoint.protocol, info.node.endpoint.host, info.node.endpoint.port
    );
    println!("  Version:     {}", info.node.meta_data.version);
    println!("  Network id:  {}", info.node.meta_data.network_id);
    println!("  Application: {}", info.nis_info.application);
    Ok(())
}

async fn cmd_account(args: &[String]) -> Result<(), String> {
    let address = parse_flag(args, "--address").ok_or("--address is required")?;
    let url = node_url(args)?;
    let client = NodeClient::new(&url, Default::default()).map_err(|e| e.to_string())?;
    let pair = client.account(&address).await.map_err(|e| e.to_string())?;
    let mosaics = client.owned_mosaics(&address).await.map_err(|e| e.to_string())?;

    println!("  Address:     {}", pair.account.address);
    println!("  Balance:     {} microNEM", pair.account.balance);
    println!("  Vested:      {} microNEM", pair.account.vested_balance);
    println!("  Importance:  {}", pair.account.importance);
    println!("  Harvested:   {} blocks", pair.account.harvested_blocks);
    println!("  Status:      {} / {}", pair.meta.status, pair.meta.remote_status);
    for m in mosaics {
        println!("  Mosaic:      {}:{} x{}", m.mosaic_id.namespace_id, m.mosaic_id.name, m.quantity);
    }
    Ok(())
}

async fn cmd_stream(args: &[String]) -> Result<(), String> {
    let name = args
        .first()
        .filter(|a| !a.starts_with("--"))
        .ok_or("a topic is required (try `nemrpc help`)")?;
    let address = parse_flag(args, "--address");
    let topic = Topic::from_name(name, address.as_deref())?;
    let url = node_url(args)?;

    let config = StreamConfig {
        strict_frames: args.iter().any(|a| a == "--strict"),
        ..StreamConfig::default()
    };
    let client = StreamClient::new(url, config);
    let mut frames = client
        .subscribe_topic(topic.clone())
        .await
        .map_err(|e| e.to_string())?;
    eprintln!("Subscribed to {topic} (id {})", frames.id());

    while let Some(frame) = frames.next().await {
        let body = frame
            .body
            .as_ref()
            .map(|b| b.to_value().to_string())
            .unwrap_or_default();
        println!("{} {}", frame.command, body);
    }

    eprintln!("Node closed the stream");
    Ok(())
}

fn parse_flag(args: &[String], flag: &str) -> Option<String> {
    let pos = args.iter().position(|a| a == flag)?;
    args.get(pos + 1).cloned()
}
