use std::collections::HashMap;
use std::io;
use std::net::IpAddr;
use std::sync::Arc;

use snmp2::{v3, AsyncSession};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::debug;

use super::Target;
use crate::error::{Error, Result};
use crate::models::{AuthAlgorithm, Credential, PrivacyCipher, ProtocolVersion, UsmAuth, UsmPrivacy};

/// Cache key for one agent session. Two endpoints share a session only
/// when address, port, version and credential all match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub address: IpAddr,
    pub port: u16,
    pub version: ProtocolVersion,
    pub credential: Credential,
}

impl SessionKey {
    pub fn for_target(target: &Target) -> Self {
        Self {
            address: target.address,
            port: target.port,
            version: target.version,
            credential: target.credential.clone(),
        }
    }
}

/// Keyed registry of live agent sessions.
///
/// A session binds a local socket and, for v3, runs engine discovery, so
/// sessions are built once per key and reused across calls. The registry
/// never evicts on its own; calling `close_all` on shutdown is the
/// owner's resource-lifecycle obligation.
pub struct SessionRegistry {
    inner: Mutex<HashMap<SessionKey, Arc<Mutex<AsyncSession>>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached session for the target, building it on first
    /// use. The registry lock is held across construction, so concurrent
    /// first use of one key builds exactly one session.
    pub async fn session_for(&self, target: &Target) -> Result<Arc<Mutex<AsyncSession>>> {
        let key = SessionKey::for_target(target);
        let mut sessions = self.inner.lock().await;
        if let Some(existing) = sessions.get(&key) {
            return Ok(existing.clone());
        }
        let session = build_session(target).await?;
        let session = Arc::new(Mutex::new(session));
        sessions.insert(key, session.clone());
        debug!(
            address = %target.address,
            port = target.port,
            version = %target.version,
            credential = %target.credential.identity(),
            "opened agent session"
        );
        Ok(session)
    }

    /// Drops every cached session, closing the underlying sockets.
    pub async fn close_all(&self) {
        let mut sessions = self.inner.lock().await;
        let count = sessions.len();
        sessions.clear();
        if count > 0 {
            debug!(sessions = count, "closed all agent sessions");
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

async fn build_session(target: &Target) -> Result<AsyncSession> {
    let addr = target.socket_addr();
    match (target.version, &target.credential) {
        (ProtocolVersion::V1, Credential::Community { community }) => {
            bounded(target, AsyncSession::new_v1(addr, community.as_bytes(), 0)).await
        }
        (ProtocolVersion::V2c, Credential::Community { community }) => {
            bounded(target, AsyncSession::new_v2c(addr, community.as_bytes(), 0)).await
        }
        (
            ProtocolVersion::V3,
            Credential::Usm {
                security_name,
                auth,
                privacy,
            },
        ) => {
            let security = build_security(security_name, auth, privacy)?;
            let mut session = bounded(target, AsyncSession::new_v3(addr, 0, security)).await?;
            // Engine id and time counters are discovered with a blank
            // unauthenticated exchange before the session is usable.
            match timeout(target.timeout, session.init()).await {
                Ok(Ok(())) => Ok(session),
                Ok(Err(e)) => Err(Error::SessionSetup {
                    address: addr,
                    source: io::Error::new(io::ErrorKind::Other, e),
                }),
                Err(_) => Err(Error::SessionSetup {
                    address: addr,
                    source: io::Error::new(io::ErrorKind::TimedOut, "engine discovery timed out"),
                }),
            }
        }
        (version, _) => Err(Error::CredentialMismatch {
            version: version.to_string(),
            reason: "credential kind does not match protocol version".into(),
        }),
    }
}

async fn bounded<F>(target: &Target, fut: F) -> Result<AsyncSession>
where
    F: std::future::Future<Output = io::Result<AsyncSession>>,
{
    let addr = target.socket_addr();
    match timeout(target.timeout, fut).await {
        Ok(Ok(session)) => Ok(session),
        Ok(Err(source)) => Err(Error::SessionSetup {
            address: addr,
            source,
        }),
        Err(_) => Err(Error::SessionSetup {
            address: addr,
            source: io::Error::new(io::ErrorKind::TimedOut, "session setup timed out"),
        }),
    }
}

fn build_security(
    security_name: &str,
    auth: &Option<UsmAuth>,
    privacy: &Option<UsmPrivacy>,
) -> Result<v3::Security> {
    match (auth, privacy) {
        (None, Some(_)) => Err(Error::CredentialMismatch {
            version: "v3".into(),
            reason: "privacy requires authentication".into(),
        }),
        (None, None) => Ok(v3::Security::new(security_name.as_bytes(), b"")
            .with_auth(v3::Auth::NoAuthNoPriv)),
        (Some(auth), None) => Ok(v3::Security::new(
            security_name.as_bytes(),
            auth.passphrase.as_bytes(),
        )
        .with_auth(v3::Auth::AuthNoPriv)
        .with_auth_protocol(auth_protocol(auth.algorithm))),
        (Some(auth), Some(privacy)) => Ok(v3::Security::new(
            security_name.as_bytes(),
            auth.passphrase.as_bytes(),
        )
        .with_auth_protocol(auth_protocol(auth.algorithm))
        .with_auth(v3::Auth::AuthPriv {
            cipher: privacy_cipher(privacy.cipher),
            privacy_password: privacy.passphrase.clone().into_bytes(),
        })),
    }
}

fn auth_protocol(algorithm: AuthAlgorithm) -> v3::AuthProtocol {
    match algorithm {
        AuthAlgorithm::Md5 => v3::AuthProtocol::Md5,
        AuthAlgorithm::Sha1 => v3::AuthProtocol::Sha1,
        AuthAlgorithm::Sha224 => v3::AuthProtocol::Sha224,
        AuthAlgorithm::Sha256 => v3::AuthProtocol::Sha256,
        AuthAlgorithm::Sha384 => v3::AuthProtocol::Sha384,
        AuthAlgorithm::Sha512 => v3::AuthProtocol::Sha512,
    }
}

fn privacy_cipher(cipher: PrivacyCipher) -> v3::Cipher {
    match cipher {
        PrivacyCipher::Des => v3::Cipher::Des,
        PrivacyCipher::Aes128 => v3::Cipher::Aes128,
        PrivacyCipher::Aes192 => v3::Cipher::Aes192,
        PrivacyCipher::Aes256 => v3::Cipher::Aes256,
    }
}
