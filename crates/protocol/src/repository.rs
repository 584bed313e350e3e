//! Repository metadata as returned by the GitHub REST API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An immutable snapshot of a repository's metadata.
///
/// Only the fields needed to plan a stargazer fetch are kept; the API
/// returns many more which are ignored during deserialization.
///
/// # Examples
///
/// ```
/// use starchart_protocol::Repository;
///
/// let json = r#"{
///     "full_name": "rust-lang/rust",
///     "stargazers_count": 250,
///     "created_at": "2010-06-16T20:39:03Z",
///     "forks_count": 12
/// }"#;
/// let repo: Repository = serde_json::from_str(json).unwrap();
/// assert_eq!(repo.full_name, "rust-lang/rust");
/// assert_eq!(repo.stargazers_count, 250);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// The `owner/name` identifier of the repository.
    pub full_name: String,
    /// Number of stargazers at the time of the fetch.
    pub stargazers_count: u64,
    /// When the repository was created.
    pub created_at: DateTime<Utc>,
}

impl Repository {
    /// Creates a repository snapshot.
    #[must_use]
    pub fn new(
        full_name: impl Into<String>,
        stargazers_count: u64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            full_name: full_name.into(),
            stargazers_count,
            created_at,
        }
    }

    /// Returns the owner part of the full name, if the name is well formed.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::Utc;
    /// use starchart_protocol::Repository;
    ///
    /// let repo = Repository::new("tokio-rs/tokio", 0, Utc::now());
    /// assert_eq!(repo.owner(), Some("tokio-rs"));
    /// ```
    #[must_use]
    pub fn owner(&self) -> Option<&str> {
        self.full_name.split_once('/').map(|(owner, _)| owner)
    }

    /// Returns the name part of the full name, if the name is well formed.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.full_name.split_once('/').map(|(_, name)| name)
    }
}
