//! Session-wide configuration.
//!
//! The credential mode of every operation is derived from
//! [`DirectoryConfig::extended_protocol_enabled`]. Sessions hold the configuration in a
//! [`SharedConfig`] so it can be replaced at runtime; operations read it on every call and
//! never cache it on an entry.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::error::{DirectoryError, DirectoryResult};

/// Configuration shared by every entry opened through a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DirectoryConfig {
    /// Route credential operations through the NMAS extended operations instead of
    /// plain attribute reads and writes.
    pub extended_protocol_enabled: bool,

    /// Per-request timeout applied by network-backed sessions. `None` waits indefinitely.
    pub operation_timeout_ms: Option<u64>,

    /// Attribute holding JSON-encoded challenge responses.
    pub response_set_attribute: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            extended_protocol_enabled: false,
            operation_timeout_ms: None,
            response_set_attribute: "pwmResponseSet".to_string(),
        }
    }
}

impl DirectoryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the extended credential protocol.
    pub fn with_extended_protocol(mut self, enabled: bool) -> Self {
        self.extended_protocol_enabled = enabled;
        self
    }

    /// Set the per-request timeout.
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Set the attribute used to store challenge responses.
    pub fn with_response_set_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.response_set_attribute = attribute.into();
        self
    }

    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout_ms.map(Duration::from_millis)
    }

    /// Load a configuration from its JSON form. Missing keys take their defaults.
    pub fn from_json(json: &str) -> DirectoryResult<Self> {
        serde_json::from_str(json).map_err(|e| {
            DirectoryError::operation(format!("Invalid directory configuration: {}", e))
        })
    }
}

/// A live, replaceable [`DirectoryConfig`].
///
/// Cloning yields another handle to the same configuration.
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<DirectoryConfig>>,
}

impl SharedConfig {
    pub fn new(config: DirectoryConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Copy of the current configuration.
    pub async fn snapshot(&self) -> DirectoryConfig {
        self.inner.read().await.clone()
    }

    pub async fn extended_protocol_enabled(&self) -> bool {
        self.inner.read().await.extended_protocol_enabled
    }

    /// Replace the whole configuration.
    pub async fn replace(&self, config: DirectoryConfig) {
        *self.inner.write().await = config;
    }

    /// Flip the extended protocol flag, leaving the rest untouched.
    pub async fn set_extended_protocol(&self, enabled: bool) {
        self.inner.write().await.extended_protocol_enabled = enabled;
    }
}

impl From<DirectoryConfig> for SharedConfig {
    fn from(config: DirectoryConfig) -> Self {
        Self::new(config)
    }
}
