//! In-memory directory session.
//!
//! [`InMemoryDirectory`] keeps entries in a `HashMap` behind a tokio `RwLock` and implements
//! [`DirectorySession`] over them. It also plays the server side of the NMAS credential
//! extensions, decoding requests with the same codec the client uses, so both credential
//! modes can be exercised without a real directory.
//!
//! # Features
//!
//! * Case-insensitive DNs and attribute names
//! * Server-side password rules (minimum length, reuse) reported as NMAS return codes
//! * Fault injection: whole-directory outage, per-attribute write failures and scripted
//!   extended-operation responses
//! * A request counter for asserting that an operation made no remote call
//!
//! # Example Usage
//!
//! ```rust
//! use ldap_credentials::extended::CredentialOperation;
//! use ldap_credentials::session::{InMemoryDirectory, ScriptedResponse};
//!
//! # async fn example() {
//! let directory = InMemoryDirectory::new();
//! directory
//!     .add_entry("cn=bob,o=org", [("objectClass", "inetOrgPerson"), ("loginGraceLimit", "5")])
//!     .await;
//!
//! // Answer set-password extended operations with "password too short".
//! directory
//!     .script(CredentialOperation::Set, ScriptedResponse::Code(-216))
//!     .await;
//! # }
//! ```

use log::trace;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use super::errors::result_codes;
use super::{DirectorySession, ExtendedRequest, ExtendedResponse, SessionError};
use crate::attributes::names;
use crate::config::{DirectoryConfig, SharedConfig};
use crate::extended::{CredentialOperation, CredentialRequest, CredentialResponse, codec, codes};

/// Server-side password rules applied by the emulated credential extensions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordRules {
    /// Minimum length in characters; 0 disables the check.
    pub min_length: usize,
    /// Reject a new password equal to the current one.
    pub reject_reuse: bool,
}

/// Canned answer for one kind of credential extended operation.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedResponse {
    /// Answer with this return code.
    Code(i32),
    /// Answer successfully with this password (meaningful for `Get`).
    Password(String),
    /// Answer without a response value.
    Null,
    /// Fail the call at the session level.
    Fail(SessionError),
}

type Attributes = HashMap<String, Vec<String>>;

#[derive(Debug, Default)]
struct Faults {
    unavailable: bool,
    failing_attributes: HashMap<String, SessionError>,
    scripted: HashMap<CredentialOperation, ScriptedResponse>,
}

/// Thread-safe in-memory directory.
///
/// Clones share the same entries, faults and configuration.
#[derive(Clone)]
pub struct InMemoryDirectory {
    // Structure: normalized dn -> lowercase attribute name -> values
    entries: Arc<RwLock<HashMap<String, Attributes>>>,
    faults: Arc<RwLock<Faults>>,
    rules: Arc<RwLock<PasswordRules>>,
    requests: Arc<AtomicUsize>,
    config: SharedConfig,
}

impl InMemoryDirectory {
    /// Create an empty directory with the default configuration.
    pub fn new() -> Self {
        Self::with_config(DirectoryConfig::default())
    }

    pub fn with_config(config: impl Into<SharedConfig>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            faults: Arc::new(RwLock::new(Faults::default())),
            rules: Arc::new(RwLock::new(PasswordRules::default())),
            requests: Arc::new(AtomicUsize::new(0)),
            config: config.into(),
        }
    }

    /// Create or replace an entry. A repeated attribute name adds another value.
    pub async fn add_entry<I, K, V>(&self, dn: &str, attributes: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut stored = Attributes::new();
        for (name, value) in attributes {
            stored
                .entry(normalize(name.as_ref()))
                .or_default()
                .push(value.into());
        }
        self.entries.write().await.insert(normalize(dn), stored);
    }

    /// Set every value of one attribute, bypassing fault injection.
    pub async fn set_values<I, V>(&self, dn: &str, attribute: &str, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        let mut entries = self.entries.write().await;
        let entry = entries.entry(normalize(dn)).or_default();
        if values.is_empty() {
            entry.remove(&normalize(attribute));
        } else {
            entry.insert(normalize(attribute), values);
        }
    }

    /// Delete an entry. Returns whether it existed.
    pub async fn remove_entry(&self, dn: &str) -> bool {
        self.entries.write().await.remove(&normalize(dn)).is_some()
    }

    pub async fn contains_entry(&self, dn: &str) -> bool {
        self.entries.read().await.contains_key(&normalize(dn))
    }

    /// Simulate the directory being unreachable.
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.faults.write().await.unavailable = unavailable;
    }

    /// Make every write to `attribute` fail with `error`.
    pub async fn fail_attribute(&self, attribute: &str, error: SessionError) {
        self.faults
            .write()
            .await
            .failing_attributes
            .insert(normalize(attribute), error);
    }

    /// Answer every `operation` extended request with `response` until cleared.
    pub async fn script(&self, operation: CredentialOperation, response: ScriptedResponse) {
        self.faults.write().await.scripted.insert(operation, response);
    }

    /// Remove all injected faults and scripted responses.
    pub async fn clear_faults(&self) {
        *self.faults.write().await = Faults::default();
    }

    pub async fn set_password_rules(&self, rules: PasswordRules) {
        *self.rules.write().await = rules;
    }

    /// Number of session calls served so far.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    async fn begin(&self, operation: &str, dn: &str) -> Result<(), SessionError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        trace!("in-memory {} on {}", operation, dn);
        if self.faults.read().await.unavailable {
            return Err(SessionError::unavailable("in-memory directory is offline"));
        }
        Ok(())
    }

    async fn begin_write(
        &self,
        operation: &str,
        dn: &str,
        attribute: &str,
    ) -> Result<(), SessionError> {
        self.begin(operation, dn).await?;
        if let Some(error) = self
            .faults
            .read()
            .await
            .failing_attributes
            .get(&normalize(attribute))
        {
            return Err(error.clone());
        }
        Ok(())
    }

    async fn emulate(
        &self,
        operation: CredentialOperation,
        request: &ExtendedRequest,
    ) -> Result<CredentialResponse, SessionError> {
        let request = codec::decode_request(request)
            .map_err(|e| SessionError::encoding(e.to_string()))?;
        let rules = self.rules.read().await.clone();
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(&normalize(request.dn()))
            .ok_or_else(|| no_such_object(request.dn()))?;
        let password_key = normalize(names::PASSWORD);
        let current = entry.get(&password_key).and_then(|v| v.first()).cloned();

        let response = match request {
            CredentialRequest::PolicyCheck { password, .. } => {
                check_rules(&rules, &password, current.as_deref())
            }
            CredentialRequest::Get { .. } => match current {
                Some(password) => CredentialResponse::with_password(password),
                None => CredentialResponse::failure(codes::NO_PASSWORD),
            },
            CredentialRequest::Set { password, .. } => {
                let response = check_rules(&rules, &password, current.as_deref());
                if response.is_success() {
                    entry.insert(password_key, vec![password]);
                }
                response
            }
            CredentialRequest::Change {
                old_password,
                new_password,
                ..
            } => {
                if current.as_deref() != Some(old_password.as_str()) {
                    CredentialResponse::failure(codes::FAILED_AUTHENTICATION)
                } else {
                    let response = check_rules(&rules, &new_password, current.as_deref());
                    if response.is_success() {
                        entry.insert(password_key, vec![new_password]);
                    }
                    response
                }
            }
        };

        trace!("in-memory {} answered {:?}", operation, response);
        Ok(response)
    }
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectorySession for InMemoryDirectory {
    async fn read_attribute(
        &self,
        dn: &str,
        attribute: &str,
    ) -> Result<Option<String>, SessionError> {
        Ok(self.read_attribute_values(dn, attribute).await?.into_iter().next())
    }

    async fn read_attribute_values(
        &self,
        dn: &str,
        attribute: &str,
    ) -> Result<Vec<String>, SessionError> {
        self.begin("read", dn).await?;
        let entries = self.entries.read().await;
        let entry = entries.get(&normalize(dn)).ok_or_else(|| no_such_object(dn))?;
        Ok(entry.get(&normalize(attribute)).cloned().unwrap_or_default())
    }

    async fn read_attributes(
        &self,
        dn: &str,
        attributes: &[&str],
    ) -> Result<HashMap<String, String>, SessionError> {
        self.begin("read", dn).await?;
        let entries = self.entries.read().await;
        let entry = entries.get(&normalize(dn)).ok_or_else(|| no_such_object(dn))?;

        let values = attributes
            .iter()
            .filter_map(|name| {
                entry
                    .get(&normalize(name))
                    .and_then(|values| values.first())
                    .map(|value| (name.to_string(), value.clone()))
            })
            .collect();
        Ok(values)
    }

    async fn write_attribute(
        &self,
        dn: &str,
        attribute: &str,
        value: &str,
    ) -> Result<(), SessionError> {
        self.begin_write("write", dn, attribute).await?;
        let mut entries = self.entries.write().await;
        let entry = entries.get_mut(&normalize(dn)).ok_or_else(|| no_such_object(dn))?;
        entry.insert(normalize(attribute), vec![value.to_string()]);
        Ok(())
    }

    async fn replace_attribute_value(
        &self,
        dn: &str,
        attribute: &str,
        old: &str,
        new: &str,
    ) -> Result<(), SessionError> {
        self.begin_write("replace", dn, attribute).await?;
        let mut entries = self.entries.write().await;
        let entry = entries.get_mut(&normalize(dn)).ok_or_else(|| no_such_object(dn))?;
        let Some(position) = entry
            .get(&normalize(attribute))
            .and_then(|values| values.iter().position(|v| v == old))
        else {
            return Err(SessionError::protocol(
                result_codes::NO_SUCH_ATTRIBUTE,
                format!("{} does not hold the expected value", attribute),
            ));
        };
        if let Some(values) = entry.get_mut(&normalize(attribute)) {
            values[position] = new.to_string();
        }
        Ok(())
    }

    async fn add_attribute_value(
        &self,
        dn: &str,
        attribute: &str,
        value: &str,
    ) -> Result<(), SessionError> {
        self.begin_write("add", dn, attribute).await?;
        let mut entries = self.entries.write().await;
        let entry = entries.get_mut(&normalize(dn)).ok_or_else(|| no_such_object(dn))?;
        let values = entry.entry(normalize(attribute)).or_default();
        if !values.iter().any(|v| v.eq_ignore_ascii_case(value)) {
            values.push(value.to_string());
        }
        Ok(())
    }

    async fn remove_attribute_value(
        &self,
        dn: &str,
        attribute: &str,
        value: &str,
    ) -> Result<(), SessionError> {
        self.begin_write("remove", dn, attribute).await?;
        let mut entries = self.entries.write().await;
        let entry = entries.get_mut(&normalize(dn)).ok_or_else(|| no_such_object(dn))?;
        let key = normalize(attribute);

        let values = entry.get_mut(&key).ok_or_else(|| {
            SessionError::protocol(
                result_codes::NO_SUCH_ATTRIBUTE,
                format!("{} is not present", attribute),
            )
        })?;
        let before = values.len();
        values.retain(|v| !v.eq_ignore_ascii_case(value));
        if values.len() == before {
            return Err(SessionError::protocol(
                result_codes::NO_SUCH_ATTRIBUTE,
                format!("{} does not hold '{}'", attribute, value),
            ));
        }
        if values.is_empty() {
            entry.remove(&key);
        }
        Ok(())
    }

    async fn compare_attribute(
        &self,
        dn: &str,
        attribute: &str,
        candidate: &str,
    ) -> Result<bool, SessionError> {
        self.begin("compare", dn).await?;
        let entries = self.entries.read().await;
        let entry = entries.get(&normalize(dn)).ok_or_else(|| no_such_object(dn))?;
        Ok(entry
            .get(&normalize(attribute))
            .is_some_and(|values| values.iter().any(|v| v == candidate)))
    }

    async fn extended_operation(
        &self,
        request: ExtendedRequest,
    ) -> Result<Option<ExtendedResponse>, SessionError> {
        self.begin("extended operation", &request.oid).await?;
        let operation = CredentialOperation::from_request_oid(&request.oid).ok_or_else(|| {
            SessionError::protocol(
                result_codes::UNWILLING_TO_PERFORM,
                format!("unsupported extended operation {}", request.oid),
            )
        })?;

        let scripted = self.faults.read().await.scripted.get(&operation).cloned();
        let response = match scripted {
            Some(ScriptedResponse::Null) => return Ok(None),
            Some(ScriptedResponse::Fail(error)) => return Err(error),
            Some(ScriptedResponse::Code(code)) => CredentialResponse::failure(code),
            Some(ScriptedResponse::Password(password)) => {
                CredentialResponse::with_password(password)
            }
            None => self.emulate(operation, &request).await?,
        };

        codec::encode_response(operation, &response)
            .map(Some)
            .map_err(|e| SessionError::encoding(e.to_string()))
    }

    fn config(&self) -> &SharedConfig {
        &self.config
    }
}

fn check_rules(rules: &PasswordRules, password: &str, current: Option<&str>) -> CredentialResponse {
    if password.chars().count() < rules.min_length {
        CredentialResponse::failure(codes::PASSWORD_TOO_SHORT)
    } else if rules.reject_reuse && current == Some(password) {
        CredentialResponse::failure(codes::DUPLICATE_PASSWORD)
    } else {
        CredentialResponse::success()
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

fn no_such_object(dn: &str) -> SessionError {
    SessionError::protocol(result_codes::NO_SUCH_OBJECT, format!("no such entry '{}'", dn))
}
