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

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

fn default_listen_addr() -> String {
    "0.0.0.0:162".to_string()
}

fn default_community() -> String {
    "public".to_string()
}

const fn default_workers() -> usize {
    4
}

/// Trap receiver configuration.
///
/// The channel is unauthenticated by default: the only check applied to
/// inbound datagrams is the community string, and mismatches are dropped
/// silently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrapdConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default = "default_community")]
    pub community: String,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl TrapdConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let cfg: TrapdConfig =
            serde_json::from_str(&content).context("Failed to parse config file")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.listen_addr.is_empty() {
            anyhow::bail!("listen_addr is required");
        }
        if self.community.is_empty() {
            anyhow::bail!("community is required");
        }
        if self.workers == 0 {
            anyhow::bail!("workers must be greater than zero");
        }
        Ok(())
    }
}

impl Default for TrapdConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            community: default_community(),
            workers: default_workers(),
        }
    }
}
