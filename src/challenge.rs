//! Challenge/response metadata.
//!
//! A challenge set is a directory entry listing required questions, optional ("random")
//! questions and how many of the random ones a user must answer. Users reference their set
//! through `nsimAssignedChallengeSetDN`. Stored answers are a JSON document in a single
//! attribute of the user entry.

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;

use crate::attributes::names;
use crate::entry::DirectoryEntry;
use crate::error::{DirectoryError, DirectoryResult, ValidationError};
use crate::session::DirectorySession;

/// Challenge set entry attribute names.
pub mod settings {
    pub const REQUIRED_QUESTIONS: &str = "nsimRequiredQuestions";
    pub const RANDOM_QUESTIONS: &str = "nsimRandomQuestions";
    pub const RANDOM_COUNT: &str = "nsimNumberRandomQuestions";
}

/// A single question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub text: String,
    pub required: bool,
}

/// The questions assigned to a user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChallengeSet {
    source_dn: Option<String>,
    challenges: Vec<Challenge>,
    min_random_required: usize,
}

impl ChallengeSet {
    pub fn new(
        source_dn: Option<String>,
        challenges: Vec<Challenge>,
        min_random_required: usize,
    ) -> Self {
        Self {
            source_dn,
            challenges,
            min_random_required,
        }
    }

    pub fn source_dn(&self) -> Option<&str> {
        self.source_dn.as_deref()
    }

    pub fn challenges(&self) -> &[Challenge] {
        &self.challenges
    }

    pub fn required_challenges(&self) -> impl Iterator<Item = &Challenge> {
        self.challenges.iter().filter(|c| c.required)
    }

    pub fn random_challenges(&self) -> impl Iterator<Item = &Challenge> {
        self.challenges.iter().filter(|c| !c.required)
    }

    /// How many random questions must be answered.
    pub fn min_random_required(&self) -> usize {
        self.min_random_required
    }
}

/// One stored answer.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResponse {
    pub challenge: String,
    pub answer: String,
}

impl fmt::Debug for ChallengeResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChallengeResponse")
            .field("challenge", &self.challenge)
            .field("answer", &"<redacted>")
            .finish()
    }
}

/// A user's stored answers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub responses: Vec<ChallengeResponse>,
}

impl ResponseSet {
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::malformed("response set", e.to_string()))
    }

    pub fn to_json(&self) -> DirectoryResult<String> {
        serde_json::to_string(self)
            .map_err(|e| ValidationError::malformed("response set", e.to_string()).into())
    }

    fn answers(&self, challenge: &Challenge) -> bool {
        self.responses
            .iter()
            .any(|r| r.challenge == challenge.text && !r.answer.is_empty())
    }

    /// Whether these answers cover every required question and enough random ones.
    pub fn satisfies(&self, set: &ChallengeSet) -> bool {
        let required = set.required_challenges().all(|c| self.answers(c));
        let random = set.random_challenges().filter(|c| self.answers(c)).count();
        required && random >= set.min_random_required()
    }
}

/// Looks up challenge sets and stored responses for an entry.
///
/// "Nothing assigned" and unreadable data are reported as [`ValidationError`].
pub trait ChallengeResponseSource: Send + Sync {
    fn read_assigned_challenge_set<S: DirectorySession>(
        &self,
        entry: &DirectoryEntry<S>,
    ) -> impl Future<Output = DirectoryResult<ChallengeSet>> + Send;

    fn read_response_set<S: DirectorySession>(
        &self,
        entry: &DirectoryEntry<S>,
    ) -> impl Future<Output = DirectoryResult<ResponseSet>> + Send;
}

/// Reads challenge data from directory attributes.
#[derive(Debug, Clone, Default)]
pub struct AttributeChallengeSource {
    response_attribute: Option<String>,
}

impl AttributeChallengeSource {
    /// Use the response attribute named by the session configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the attribute holding stored responses.
    pub fn with_response_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.response_attribute = Some(attribute.into());
        self
    }

    async fn response_attribute<S: DirectorySession>(&self, entry: &DirectoryEntry<S>) -> String {
        match &self.response_attribute {
            Some(attribute) => attribute.clone(),
            None => entry.session().config().snapshot().await.response_set_attribute,
        }
    }
}

impl ChallengeResponseSource for AttributeChallengeSource {
    async fn read_assigned_challenge_set<S: DirectorySession>(
        &self,
        entry: &DirectoryEntry<S>,
    ) -> DirectoryResult<ChallengeSet> {
        let set_dn = entry
            .read_string_attribute(names::CHALLENGE_SET_DN)
            .await?
            .filter(|dn| !dn.trim().is_empty())
            .ok_or_else(|| ValidationError::NoChallengeSet {
                dn: entry.dn().to_string(),
            })?;

        debug!("reading challenge set {} for {}", set_dn, entry.dn());
        let set_entry = entry.sibling(set_dn.clone());
        let required = set_entry
            .read_multi_string_attribute(settings::REQUIRED_QUESTIONS)
            .await?;
        let random = set_entry
            .read_multi_string_attribute(settings::RANDOM_QUESTIONS)
            .await?;
        let count = set_entry.read_int_attribute(settings::RANDOM_COUNT, 0).await?;

        let challenges: Vec<Challenge> = required
            .into_iter()
            .map(|text| Challenge { text, required: true })
            .chain(random.into_iter().map(|text| Challenge { text, required: false }))
            .collect();
        if challenges.is_empty() {
            return Err(ValidationError::malformed(
                "challenge set",
                format!("'{}' defines no questions", set_dn),
            )
            .into());
        }

        let available = challenges.iter().filter(|c| !c.required).count();
        let min_random = usize::try_from(count).unwrap_or(0);
        if min_random > available {
            return Err(ValidationError::malformed(
                "challenge set",
                format!(
                    "'{}' requires {} random answers but offers {} random questions",
                    set_dn, min_random, available
                ),
            )
            .into());
        }

        Ok(ChallengeSet::new(Some(set_dn), challenges, min_random))
    }

    async fn read_response_set<S: DirectorySession>(
        &self,
        entry: &DirectoryEntry<S>,
    ) -> DirectoryResult<ResponseSet> {
        let attribute = self.response_attribute(entry).await;
        let stored = entry
            .read_string_attribute(&attribute)
            .await?
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ValidationError::NoResponseSet {
                dn: entry.dn().to_string(),
            })?;
        ResponseSet::from_json(&stored).map_err(DirectoryError::from)
    }
}
