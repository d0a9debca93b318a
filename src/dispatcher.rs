//! Credential operation dispatcher.
//!
//! Every credential operation first resolves the [`CredentialMode`] from the session's
//! live configuration, then either works on attributes directly or goes through the NMAS
//! extended operations. The mode is never cached: two calls on the same entry can observe
//! different modes if the configuration changes between them.
//!
//! # Error mapping
//!
//! - Password writes and compares that fail are re-raised as
//!   [`DirectoryError::PasswordPolicyViolation`], keeping the underlying code and message.
//! - A nonzero extended-operation return code is a policy violation for set, change and
//!   policy check, and an operation error for reading the password.
//! - [`DirectoryError::TransportUnavailable`] is always surfaced, except by
//!   [`CredentialDispatcher::test_password_policy`], which treats any failure to reach the
//!   server as "policy satisfied".
//!
//! Multi-step operations ([`unlock`](CredentialDispatcher::unlock)) are sequential and are
//! not rolled back when a later step fails.

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::attributes::{names, parse_int};
use crate::entry::DirectoryEntry;
use crate::error::{DirectoryError, DirectoryResult};
use crate::extended::{self, CredentialRequest, codec, describe_code};
use crate::generalized_time::{self, EPOCH_SENTINEL};
use crate::session::DirectorySession;

/// How credential operations reach the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialMode {
    /// Plain attribute reads, writes and compares.
    Attribute,
    /// NMAS extended operations.
    ExtendedProtocol,
}

/// Routes credential operations for one entry.
pub struct CredentialDispatcher<'a, S> {
    entry: &'a DirectoryEntry<S>,
}

impl<'a, S: DirectorySession> CredentialDispatcher<'a, S> {
    pub fn new(entry: &'a DirectoryEntry<S>) -> Self {
        Self { entry }
    }

    /// Resolve the mode for the operation about to run.
    pub async fn mode(&self) -> CredentialMode {
        if self.entry.session().is_extended_protocol_enabled().await {
            CredentialMode::ExtendedProtocol
        } else {
            CredentialMode::Attribute
        }
    }

    fn dn(&self) -> &str {
        self.entry.dn()
    }

    /// Ask the server whether `password` would be accepted.
    ///
    /// Without the extended protocol there is nothing to ask and the answer is `true`.
    /// Failing to reach the server is logged and also answers `true`.
    pub async fn test_password_policy(&self, password: &str) -> DirectoryResult<bool> {
        if self.mode().await == CredentialMode::Attribute {
            return Ok(true);
        }

        let request = CredentialRequest::PolicyCheck {
            dn: self.dn().to_string(),
            password: password.to_string(),
        };
        let raw = codec::encode(&request)?;
        let response = match extended::invoke(self.entry.session(), raw).await {
            Ok(response) => response,
            Err(e) => {
                debug!(
                    "unexpected error while checking password policy for {}: {}",
                    self.dn(),
                    e
                );
                return Ok(true);
            }
        };

        if let Some(response) = response {
            if let Some(decoded) = codec::decode(request.operation(), &response)? {
                if !decoded.is_success() {
                    debug!(
                        "password policy check for {} failed: {}",
                        self.dn(),
                        describe_code(decoded.code)
                    );
                    return Err(DirectoryError::policy_violation_code(decoded.code));
                }
            }
        }
        Ok(true)
    }

    /// Compare `password` against the stored one, in either mode.
    pub async fn test_password(&self, password: &str) -> DirectoryResult<bool> {
        self.entry
            .compare_string_attribute(names::PASSWORD, password)
            .await
            .map_err(DirectoryError::into_policy_violation)
    }

    /// Retrieve the current password. Only possible with the extended protocol.
    pub async fn read_password(&self) -> DirectoryResult<String> {
        if self.mode().await == CredentialMode::Attribute {
            return Err(DirectoryError::unsupported(
                "read password",
                "the extended credential protocol is disabled",
            ));
        }

        let request = CredentialRequest::Get {
            dn: self.dn().to_string(),
        };
        match extended::exchange(self.entry.session(), &request).await? {
            Some(response) if response.is_success() => response.password.ok_or_else(|| {
                DirectoryError::operation_code(
                    response.code,
                    "password response carried no password",
                )
            }),
            Some(response) => {
                debug!("error reading password for {}: {}", self.dn(), response.code);
                Err(DirectoryError::operation_code(
                    response.code,
                    format!("error reading password: {}", describe_code(response.code)),
                ))
            }
            None => {
                debug!("unknown error retrieving password for {} (null response)", self.dn());
                Err(DirectoryError::operation("unknown, null response"))
            }
        }
    }

    /// Administratively set the password.
    pub async fn set_password(&self, new_password: &str) -> DirectoryResult<()> {
        match self.mode().await {
            CredentialMode::Attribute => self
                .entry
                .write_string_attribute(names::PASSWORD, new_password)
                .await
                .map_err(DirectoryError::into_policy_violation),
            CredentialMode::ExtendedProtocol => {
                self.submit_password(CredentialRequest::Set {
                    dn: self.dn().to_string(),
                    password: new_password.to_string(),
                })
                .await
            }
        }
    }

    /// Change the password, proving knowledge of the old one.
    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> DirectoryResult<()> {
        match self.mode().await {
            CredentialMode::Attribute => self
                .entry
                .replace_attribute_value(names::PASSWORD, old_password, new_password)
                .await
                .map_err(DirectoryError::into_policy_violation),
            CredentialMode::ExtendedProtocol => {
                self.submit_password(CredentialRequest::Change {
                    dn: self.dn().to_string(),
                    old_password: old_password.to_string(),
                    new_password: new_password.to_string(),
                })
                .await
            }
        }
    }

    // Set and Change share response handling: a null response is success.
    async fn submit_password(&self, request: CredentialRequest) -> DirectoryResult<()> {
        let operation = request.operation();
        let raw = codec::encode(&request)?;
        let response = extended::invoke(self.entry.session(), raw)
            .await
            .map_err(DirectoryError::into_policy_violation)?;

        let Some(response) = response else {
            return Ok(());
        };
        match codec::decode(operation, &response)? {
            Some(decoded) if !decoded.is_success() => {
                debug!("error during {} for {}: {}", operation, self.dn(), decoded.code);
                Err(DirectoryError::policy_violation_code(decoded.code))
            }
            _ => Ok(()),
        }
    }

    /// Clear intruder lockout and restore the grace-login allowance.
    ///
    /// Four independent writes; a failure part way leaves the earlier ones applied.
    pub async fn unlock(&self) -> DirectoryResult<()> {
        self.entry
            .write_boolean_attribute(names::LOCKED_BY_INTRUDER, false)
            .await?;
        self.entry
            .write_string_attribute(names::LOGIN_INTRUDER_ATTEMPTS, "0")
            .await?;
        self.entry
            .write_string_attribute(names::LOGIN_INTRUDER_RESET_TIME, EPOCH_SENTINEL)
            .await?;

        if let Some(limit) = self
            .entry
            .read_string_attribute(names::LOGIN_GRACE_LIMIT)
            .await?
        {
            self.entry
                .write_string_attribute(names::LOGIN_GRACE_REMAINING, &limit)
                .await?;
        }
        info!("unlocked {}", self.dn());
        Ok(())
    }

    /// Mark the password as needing a change at next login.
    pub async fn expire_password(&self) -> DirectoryResult<()> {
        // Same attribute and sentinel as the reset step of unlock().
        self.entry
            .write_string_attribute(names::LOGIN_INTRUDER_RESET_TIME, EPOCH_SENTINEL)
            .await
    }

    /// Expired when grace logins have been consumed, or the expiration time has passed.
    pub async fn is_password_expired(&self) -> DirectoryResult<bool> {
        let values = self
            .entry
            .read_string_attributes(&[
                names::LOGIN_GRACE_LIMIT,
                names::LOGIN_GRACE_REMAINING,
                names::PASSWORD_EXPIRE_TIME,
            ])
            .await?;

        let limit = parse_int(values.get(names::LOGIN_GRACE_LIMIT).map(String::as_str), 0);
        let remaining = parse_int(
            values.get(names::LOGIN_GRACE_REMAINING).map(String::as_str),
            0,
        );
        if remaining != limit {
            debug!(
                "{} has {} of {} grace logins remaining, marking as expired",
                self.dn(),
                remaining,
                limit
            );
            return Ok(true);
        }

        let expire_time = values
            .get(names::PASSWORD_EXPIRE_TIME)
            .map(|v| v.trim())
            .unwrap_or_default();
        if !expire_time.is_empty() {
            let expire_date = generalized_time::parse(expire_time)?;
            let now = Utc::now();
            if expire_date <= now {
                debug!(
                    "{} password expired {} seconds ago ({}), marking as expired",
                    self.dn(),
                    (now - expire_date).num_seconds(),
                    expire_date
                );
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// The stored expiration time, or now if the password is expired without one.
    pub async fn read_password_expiration_date(&self) -> DirectoryResult<Option<DateTime<Utc>>> {
        if let Some(date) = self
            .entry
            .read_date_attribute(names::PASSWORD_EXPIRE_TIME)
            .await?
        {
            return Ok(Some(date));
        }
        if self.is_password_expired().await? {
            return Ok(Some(Utc::now()));
        }
        Ok(None)
    }

    pub async fn is_locked(&self) -> DirectoryResult<bool> {
        self.entry
            .read_boolean_attribute(names::LOCKED_BY_INTRUDER)
            .await
    }
}
