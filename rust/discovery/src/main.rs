use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use netwatch_core::models::{Credential, ProtocolVersion};
use netwatch_core::sink::LogProgressSink;
use netwatch_core::snmp::SnmpClient;
use netwatch_core::store::MemoryStore;
use netwatch_discovery::engine::DiscoveryEngine;
use netwatch_discovery::spec::{DiscoverySpec, MethodFlags, SeedTarget};
use netwatch_discovery::sweep::SnmpPingScanner;

#[derive(Parser, Debug)]
#[command(name = "netwatch-discovery")]
#[command(about = "One-shot NetWatch topology discovery", long_about = None)]
struct Cli {
    /// Seed address or CIDR range
    #[arg(short, long)]
    target: String,

    /// Community string for v1/v2c agents
    #[arg(short, long, default_value = "public")]
    community: String,

    #[arg(long, default_value_t = 3)]
    max_hops: u32,

    #[arg(long, default_value_t = 16)]
    concurrency: usize,

    #[arg(long, default_value_t = 161)]
    port: u16,

    #[arg(long, default_value_t = 5)]
    timeout_secs: u64,

    /// Skip the initial liveness sweep over a range seed
    #[arg(long)]
    no_sweep: bool,

    /// Skip layer-2 neighbor expansion
    #[arg(long)]
    no_l2: bool,

    /// Skip layer-3 neighbor expansion
    #[arg(long)]
    no_l3: bool,
}

fn parse_seed(target: &str) -> Result<SeedTarget> {
    if target.contains('/') {
        Ok(SeedTarget::Range(
            target.parse().context("invalid CIDR range")?,
        ))
    } else {
        Ok(SeedTarget::Address(
            target.parse().context("invalid seed address")?,
        ))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    netwatch_core::telemetry::init_tracing();
    let cli = Cli::parse();

    let spec = DiscoverySpec {
        seed: parse_seed(&cli.target)?,
        methods: MethodFlags {
            liveness_sweep: !cli.no_sweep,
            snmp_probe: true,
            l2_neighbors: !cli.no_l2,
            l3_neighbors: !cli.no_l3,
        },
        max_hops: cli.max_hops,
        concurrency: cli.concurrency,
        version: ProtocolVersion::V2c,
        credential: Credential::Community {
            community: cli.community.clone(),
        },
        port: cli.port,
        timeout_secs: cli.timeout_secs,
        retries: 1,
        walk_max_entries: 1000,
    };

    let store = Arc::new(MemoryStore::new());
    let client = Arc::new(SnmpClient::new());
    let scanner = Arc::new(SnmpPingScanner::new(client.clone()));
    let engine = DiscoveryEngine::new(store, client.clone(), scanner, Arc::new(LogProgressSink));

    let handle = engine.start(&spec).await?;
    let cancel_handle = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_handle.request_cancel();
        }
    });

    let run = engine.execute(&handle, &spec).await?;
    client.shutdown().await;
    println!("{}", serde_json::to_string_pretty(&run)?);
    Ok(())
}
