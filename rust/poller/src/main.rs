use anyhow::Result;
use clap::Parser;
use netwatch_poller::config::PollerConfig;

#[derive(Parser, Debug)]
#[command(name = "netwatch-poller")]
#[command(about = "NetWatch SNMP polling service", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "POLLER_CONFIG")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    netwatch_core::telemetry::init_tracing();
    let cli = Cli::parse();
    let cfg = PollerConfig::from_file(&cli.config)?;
    netwatch_poller::run(cfg).await
}
