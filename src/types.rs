//! types
//!
//! Normalized, forge-agnostic value objects.
//!
//! # Design
//!
//! Every forge backend maps its own JSON schema into this closed set of
//! record types. Fields that a forge may omit are explicit `Option`s;
//! nothing here is structurally dynamic. All types serialize, so recorded
//! fixtures can round-trip them byte-for-byte.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Issue state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueStatus {
    /// Issue is open.
    Open,
    /// Issue has been closed.
    Closed,
}

impl std::fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueStatus::Open => write!(f, "open"),
            IssueStatus::Closed => write!(f, "closed"),
        }
    }
}

/// Pull/merge request state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrStatus {
    /// Request is open and awaiting review/merge.
    Open,
    /// Request was closed without being merged.
    Closed,
    /// Request has been merged.
    Merged,
}

impl std::fmt::Display for PrStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrStatus::Open => write!(f, "open"),
            PrStatus::Closed => write!(f, "closed"),
            PrStatus::Merged => write!(f, "merged"),
        }
    }
}

/// Issue information returned from a forge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Issue number, scoped to the project.
    pub id: u64,
    /// Issue title.
    pub title: String,
    /// Issue description; empty when the forge reports none.
    pub description: String,
    /// Issue state.
    pub status: IssueStatus,
    /// Author username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Web URL for viewing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Pull/merge request information returned from a forge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    /// Request number, scoped to the project.
    pub id: u64,
    /// Request title.
    pub title: String,
    /// Request description; empty when the forge reports none.
    pub description: String,
    /// Request state.
    pub status: PrStatus,
    /// Source (head) branch name.
    pub source_branch: String,
    /// Target (base) branch name.
    pub target_branch: String,
    /// Author username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Web URL for viewing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A comment on an issue or pull request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment text.
    pub body: String,
    /// Author username.
    pub author: String,
    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A git tag with its target commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitTag {
    /// Tag name.
    pub name: String,
    /// Full sha of the tagged commit.
    pub commit_sha: String,
}

/// A release published on a forge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    /// Release title.
    pub title: String,
    /// Release notes body; empty when the forge reports none.
    pub body: String,
    /// Name of the tag the release points at.
    pub tag_name: String,
    /// Web URL for viewing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// The authenticated user as reported by a forge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForgeUser {
    /// Username (login).
    pub username: String,
    /// Public email, when the forge exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Request to create a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateReleaseRequest {
    /// Release title.
    pub name: String,
    /// Tag to release; created from `git_ref` if it does not exist.
    pub tag_name: String,
    /// Release notes body.
    pub description: String,
    /// Ref to create the tag from (branch name or sha).
    pub git_ref: String,
}
