/*
 * Copyright 2025 Carver Automation Corporation.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use anyhow::Result;
use clap::Parser;
use netwatch_trapd::config::TrapdConfig;

#[derive(Parser, Debug)]
#[command(name = "netwatch-trapd")]
#[command(about = "NetWatch SNMP trap receiver", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "TRAPD_CONFIG")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    netwatch_core::telemetry::init_tracing();
    let cli = Cli::parse();
    let cfg = TrapdConfig::from_file(&cli.config)?;
    netwatch_trapd::run(cfg).await
}
