//! Directory session over an `ldap3` connection.
//!
//! The session takes an already connected and bound [`Ldap`] handle; connection setup and
//! binding stay with the caller. Every call clones the handle (a cheap channel clone) so
//! the session can be shared across tasks, and applies the configured operation timeout.

use ldap3::exop::Exop;
use ldap3::{Ldap, LdapError, Mod, Scope, SearchEntry};
use log::debug;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use super::errors::result_codes;
use super::{DirectorySession, ExtendedRequest, ExtendedResponse, SessionError};
use crate::config::SharedConfig;

const ANY_OBJECT: &str = "(objectClass=*)";

/// [`DirectorySession`] backed by a live LDAP connection.
#[derive(Clone)]
pub struct LdapSession {
    ldap: Ldap,
    config: SharedConfig,
}

impl LdapSession {
    /// Wrap a bound connection.
    ///
    /// ```rust,no_run
    /// use ldap3::LdapConnAsync;
    /// use ldap_credentials::DirectoryConfig;
    /// use ldap_credentials::session::LdapSession;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let (conn, mut ldap) = LdapConnAsync::new("ldap://directory.example.com:389").await?;
    /// ldap3::drive!(conn);
    /// ldap.simple_bind("cn=admin,o=org", "secret").await?.success()?;
    ///
    /// let session = LdapSession::new(ldap, DirectoryConfig::new().with_extended_protocol(true));
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(ldap: Ldap, config: impl Into<SharedConfig>) -> Self {
        Self {
            ldap,
            config: config.into(),
        }
    }

    async fn handle(&self) -> (Ldap, Option<Duration>) {
        let mut ldap = self.ldap.clone();
        let timeout = self.config.snapshot().await.operation_timeout();
        if let Some(timeout) = timeout {
            ldap.with_timeout(timeout);
        }
        (ldap, timeout)
    }

    async fn read_entry(&self, dn: &str, attributes: &[&str]) -> Result<SearchEntry, SessionError> {
        let (mut ldap, timeout) = self.handle().await;
        let (mut entries, _) = ldap
            .search(dn, Scope::Base, ANY_OBJECT, attributes.to_vec())
            .await
            .and_then(|result| result.success())
            .map_err(|e| map_error("search", timeout, e))?;

        entries
            .pop()
            .map(SearchEntry::construct)
            .ok_or_else(|| {
                SessionError::protocol(
                    result_codes::NO_SUCH_OBJECT,
                    format!("no such entry '{}'", dn),
                )
            })
    }

    async fn modify(
        &self,
        operation: &str,
        dn: &str,
        mods: Vec<Mod<&str>>,
    ) -> Result<(), SessionError> {
        let (mut ldap, timeout) = self.handle().await;
        ldap.modify(dn, mods)
            .await
            .and_then(|result| result.success())
            .map(|_| ())
            .map_err(|e| map_error(operation, timeout, e))
    }
}

impl DirectorySession for LdapSession {
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
        let entry = self.read_entry(dn, &[attribute]).await?;
        Ok(values_of(&entry, attribute).cloned().unwrap_or_default())
    }

    async fn read_attributes(
        &self,
        dn: &str,
        attributes: &[&str],
    ) -> Result<HashMap<String, String>, SessionError> {
        if attributes.is_empty() {
            return Ok(HashMap::new());
        }
        let entry = self.read_entry(dn, attributes).await?;
        Ok(attributes
            .iter()
            .filter_map(|name| {
                values_of(&entry, name)
                    .and_then(|values| values.first())
                    .map(|value| (name.to_string(), value.clone()))
            })
            .collect())
    }

    async fn write_attribute(
        &self,
        dn: &str,
        attribute: &str,
        value: &str,
    ) -> Result<(), SessionError> {
        let mods = vec![Mod::Replace(attribute, HashSet::from([value]))];
        self.modify("modify", dn, mods).await
    }

    async fn replace_attribute_value(
        &self,
        dn: &str,
        attribute: &str,
        old: &str,
        new: &str,
    ) -> Result<(), SessionError> {
        // Delete and add in one modify request, so the server applies both or neither.
        let mods = vec![
            Mod::Delete(attribute, HashSet::from([old])),
            Mod::Add(attribute, HashSet::from([new])),
        ];
        self.modify("modify", dn, mods).await
    }

    async fn add_attribute_value(
        &self,
        dn: &str,
        attribute: &str,
        value: &str,
    ) -> Result<(), SessionError> {
        let mods = vec![Mod::Add(attribute, HashSet::from([value]))];
        self.modify("modify", dn, mods).await
    }

    async fn remove_attribute_value(
        &self,
        dn: &str,
        attribute: &str,
        value: &str,
    ) -> Result<(), SessionError> {
        let mods = vec![Mod::Delete(attribute, HashSet::from([value]))];
        self.modify("modify", dn, mods).await
    }

    async fn compare_attribute(
        &self,
        dn: &str,
        attribute: &str,
        candidate: &str,
    ) -> Result<bool, SessionError> {
        let (mut ldap, timeout) = self.handle().await;
        ldap.compare(dn, attribute, candidate)
            .await
            .and_then(|result| result.equal())
            .map_err(|e| map_error("compare", timeout, e))
    }

    async fn extended_operation(
        &self,
        request: ExtendedRequest,
    ) -> Result<Option<ExtendedResponse>, SessionError> {
        let (mut ldap, timeout) = self.handle().await;
        let exop = Exop {
            name: Some(request.oid),
            val: request.value,
        };
        let (response, _) = ldap
            .extended(exop)
            .await
            .and_then(|result| result.success())
            .map_err(|e| map_error("extended operation", timeout, e))?;

        if response.name.is_none() && response.val.is_none() {
            return Ok(None);
        }
        Ok(Some(ExtendedResponse {
            oid: response.name,
            value: response.val,
        }))
    }

    fn config(&self) -> &SharedConfig {
        &self.config
    }
}

fn values_of<'a>(entry: &'a SearchEntry, attribute: &str) -> Option<&'a Vec<String>> {
    entry
        .attrs
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(attribute))
        .map(|(_, values)| values)
}

fn map_error(operation: &str, timeout: Option<Duration>, error: LdapError) -> SessionError {
    debug!("LDAP {} failed: {}", operation, error);
    match error {
        LdapError::LdapResult { result } => SessionError::protocol(result.rc as i32, result.text),
        LdapError::Timeout { .. } => SessionError::Timeout {
            operation: operation.to_string(),
            duration: timeout,
        },
        LdapError::Io { source } => SessionError::unavailable(source.to_string()),
        LdapError::EndOfStream { .. } => SessionError::unavailable("connection closed"),
        other => SessionError::protocol(result_codes::OTHER, other.to_string()),
    }
}
