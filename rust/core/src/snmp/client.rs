use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use snmp2::Oid;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::{ManagementClient, SessionRegistry, SnmpValue, Target};

const MAX_AUTH_RESYNCS: u32 = 2;

/// Production SNMP client over the shared session registry.
pub struct SnmpClient {
    sessions: SessionRegistry,
}

enum Attempt {
    /// Varbinds in response order; `None` values are agent exception
    /// values (noSuchObject, noSuchInstance, endOfMibView).
    Ok(Vec<(String, Option<SnmpValue>)>),
    AgentError(u32),
    Protocol(snmp2::Error),
    TimedOut,
}

impl SnmpClient {
    pub fn new() -> Self {
        Self {
            sessions: SessionRegistry::new(),
        }
    }

    /// Closes every cached session. Callers own this as part of their
    /// shutdown path; nothing closes sessions implicitly.
    pub async fn shutdown(&self) {
        self.sessions.close_all().await;
    }

    pub async fn open_sessions(&self) -> usize {
        self.sessions.len().await
    }

    /// One GET or GETNEXT exchange with per-call timeout, bounded
    /// retries and transparent v3 engine resynchronization.
    async fn request(
        &self,
        target: &Target,
        oid: &Oid<'_>,
        next: bool,
    ) -> Option<Vec<(String, Option<SnmpValue>)>> {
        let session = match self.sessions.session_for(target).await {
            Ok(session) => session,
            Err(e) => {
                warn!(address = %target.address, error = %e, "agent session unavailable");
                return None;
            }
        };

        let mut attempts = 0u32;
        let mut resyncs = 0u32;
        loop {
            let attempt = {
                let mut session = session.lock().await;
                let exchange = async {
                    if next {
                        session.getnext(oid).await
                    } else {
                        session.get(oid).await
                    }
                };
                match timeout(target.timeout, exchange).await {
                    Ok(Ok(pdu)) => {
                        if pdu.error_status != 0 {
                            Attempt::AgentError(pdu.error_status)
                        } else {
                            let varbinds = pdu
                                .varbinds
                                .clone()
                                .map(|(oid, value)| (oid.to_string(), SnmpValue::decode(&value)))
                                .collect();
                            Attempt::Ok(varbinds)
                        }
                    }
                    Ok(Err(e)) => Attempt::Protocol(e),
                    Err(_) => Attempt::TimedOut,
                }
            };

            match attempt {
                Attempt::Ok(varbinds) => return Some(varbinds),
                Attempt::AgentError(status) => {
                    // Agent-reported errors are final for this call.
                    debug!(address = %target.address, status, "agent returned error status");
                    return None;
                }
                Attempt::Protocol(snmp2::Error::AuthUpdated) if resyncs < MAX_AUTH_RESYNCS => {
                    resyncs += 1;
                    continue;
                }
                Attempt::Protocol(e) => {
                    debug!(address = %target.address, error = %e, "request failed");
                }
                Attempt::TimedOut => {
                    debug!(address = %target.address, timeout = ?target.timeout, "request timed out");
                }
            }

            attempts += 1;
            if attempts > target.retries {
                return None;
            }
        }
    }
}

impl Default for SnmpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ManagementClient for SnmpClient {
    async fn get(&self, target: &Target, oid: &str) -> Option<SnmpValue> {
        let oid = parse_oid(oid)?;
        let varbinds = self.request(target, &oid, false).await?;
        varbinds.into_iter().next().and_then(|(_, value)| value)
    }

    async fn get_multiple(&self, target: &Target, oids: &[&str]) -> HashMap<String, SnmpValue> {
        let mut values = HashMap::with_capacity(oids.len());
        for oid in oids {
            match self.get(target, oid).await {
                Some(value) => {
                    values.insert((*oid).to_string(), value);
                }
                // All-or-nothing: one unavailable value empties the batch.
                None => return HashMap::new(),
            }
        }
        values
    }

    async fn walk(&self, target: &Target, root: &str, max_entries: usize)
        -> Vec<(String, SnmpValue)> {
        let Some(root_oid) = parse_oid(root) else {
            return Vec::new();
        };
        let mut entries = Vec::new();
        let mut current = root_oid.clone();
        let mut last_seen = String::new();

        while entries.len() < max_entries {
            let Some(varbinds) = self.request(target, &current, true).await else {
                break;
            };
            let Some((oid_str, value)) = varbinds.into_iter().next() else {
                break;
            };
            let Some(next_oid) = parse_oid(&oid_str) else {
                break;
            };
            if !next_oid.starts_with(&root_oid) {
                break;
            }
            // An agent that fails to advance would loop forever.
            if oid_str == last_seen {
                warn!(address = %target.address, oid = %oid_str, "walk did not advance, stopping");
                break;
            }
            let Some(value) = value else {
                break;
            };
            last_seen = oid_str.clone();
            entries.push((oid_str, value));
            current = next_oid;
        }
        entries
    }
}

fn parse_oid(oid: &str) -> Option<Oid<'static>> {
    match Oid::from_str(oid) {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(%oid, "unparseable OID");
            None
        }
    }
}
