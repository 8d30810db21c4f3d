//! forge::traits
//!
//! Service and project trait definitions for interacting with hosted forges.
//!
//! # Design
//!
//! A [`Service`] authenticates against one forge instance and hands out
//! [`Project`] handles. Both traits are async because project operations
//! involve network I/O, and all methods return `Result` so API failures
//! surface to the caller instead of being retried or swallowed.
//!
//! The traits are the seam the record/replay harness wraps: the
//! [`crate::replay`] module provides `Service`/`Project` implementations
//! that intercept every call, so callers never know whether they are
//! talking to a live forge or to a fixture store.
//!
//! # Example
//!
//! ```ignore
//! use forgery::forge::{ForgeError, Service};
//!
//! async fn latest_tag(service: &dyn Service) -> Result<String, ForgeError> {
//!     let project = service.get_project("mygroup", "myrepo")?;
//!     let tags = project.get_tags().await?;
//!     Ok(tags.last().map(|t| t.name.clone()).unwrap_or_default())
//! }
//! ```

use async_trait::async_trait;
use thiserror::Error;

use crate::replay::FixtureError;
use crate::types::{Comment, CreateReleaseRequest, ForgeUser, GitTag, Issue, PullRequest, Release};

/// Errors from forge operations.
///
/// These error types map to common failure modes when interacting with
/// remote hosting services. The harness captures every variant except
/// [`Fixture`] into fixture files and reconstructs it on replay.
///
/// [`Fixture`]: ForgeError::Fixture
#[derive(Debug, Error)]
pub enum ForgeError {
    /// Authentication is required but not available.
    #[error("authentication required")]
    AuthRequired,

    /// Authentication failed (invalid token, expired, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The requested file does not exist in the repository.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The operation is not supported by this forge.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// Record/replay harness failure. Never captured into fixtures;
    /// always fatal to the surrounding test.
    #[error(transparent)]
    Fixture(#[from] FixtureError),
}

/// An authenticated connection to one forge instance.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow use across async tasks.
#[async_trait]
pub trait Service: Send + Sync {
    /// Get the forge name (e.g., "gitlab", "github").
    fn name(&self) -> &str;

    /// Get a handle to a project on this forge.
    ///
    /// This performs no I/O; the project is validated lazily by the first
    /// operation invoked on it.
    fn get_project(&self, namespace: &str, repo: &str) -> Result<Box<dyn Project>, ForgeError>;

    /// Get the authenticated user.
    async fn get_user(&self) -> Result<ForgeUser, ForgeError>;
}

/// CRUD surface over one project on a forge.
///
/// Responses are normalized into the forge-agnostic records in
/// [`crate::types`]; nothing forge-specific leaks through this trait.
///
/// # Errors
///
/// All methods return `Result<T, ForgeError>`. Callers should handle:
/// - `AuthRequired` / `AuthFailed`: fix the configured token
/// - `NotFound` / `FileNotFound`: resource doesn't exist
/// - `RateLimited`: back off and retry
/// - `ApiError` / `NetworkError`: transport-level failures
/// - `Fixture`: harness failure, fatal to the test run
#[async_trait]
pub trait Project: Send + Sync {
    /// List branch names.
    async fn get_branches(&self) -> Result<Vec<String>, ForgeError>;

    /// Get the content of a file on the default branch.
    ///
    /// # Errors
    ///
    /// - `FileNotFound` if the path does not exist
    async fn get_file_content(&self, path: &str) -> Result<String, ForgeError>;

    /// List issues.
    async fn get_issue_list(&self) -> Result<Vec<Issue>, ForgeError>;

    /// Get one issue by number.
    async fn get_issue_info(&self, issue_id: u64) -> Result<Issue, ForgeError>;

    /// List comments on an issue, oldest first.
    async fn get_issue_comments(&self, issue_id: u64) -> Result<Vec<Comment>, ForgeError>;

    /// Create a new issue.
    async fn create_issue(&self, title: &str, description: &str) -> Result<Issue, ForgeError>;

    /// Close an issue and return its updated state.
    async fn close_issue(&self, issue_id: u64) -> Result<Issue, ForgeError>;

    /// List pull/merge requests.
    async fn list_pull_requests(&self) -> Result<Vec<PullRequest>, ForgeError>;

    /// Get one pull/merge request by number.
    async fn get_pr_info(&self, pr_id: u64) -> Result<PullRequest, ForgeError>;

    /// Update the description of a pull/merge request.
    async fn update_pr_info(
        &self,
        pr_id: u64,
        description: &str,
    ) -> Result<PullRequest, ForgeError>;

    /// List the commit shas of a pull/merge request, in order.
    async fn get_pr_commits(&self, pr_id: u64) -> Result<Vec<String>, ForgeError>;

    /// List comments on a pull/merge request, oldest first.
    async fn get_pr_comments(&self, pr_id: u64) -> Result<Vec<Comment>, ForgeError>;

    /// List tags.
    async fn get_tags(&self) -> Result<Vec<GitTag>, ForgeError>;

    /// Get one tag by name.
    async fn get_tag(&self, tag_name: &str) -> Result<GitTag, ForgeError>;

    /// List releases.
    async fn get_releases(&self) -> Result<Vec<Release>, ForgeError>;

    /// Publish a release.
    async fn create_release(&self, request: CreateReleaseRequest) -> Result<Release, ForgeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forge_error_display() {
        assert_eq!(
            format!("{}", ForgeError::AuthRequired),
            "authentication required"
        );
        assert_eq!(
            format!("{}", ForgeError::AuthFailed("expired token".into())),
            "authentication failed: expired token"
        );
        assert_eq!(
            format!("{}", ForgeError::NotFound("issue #42".into())),
            "not found: issue #42"
        );
        assert_eq!(
            format!("{}", ForgeError::FileNotFound("README.md".into())),
            "file not found: README.md"
        );
        assert_eq!(format!("{}", ForgeError::RateLimited), "rate limited");
        assert_eq!(
            format!(
                "{}",
                ForgeError::ApiError {
                    status: 422,
                    message: "Validation failed".into()
                }
            ),
            "API error: 422 - Validation failed"
        );
        assert_eq!(
            format!("{}", ForgeError::NetworkError("connection refused".into())),
            "network error: connection refused"
        );
        assert_eq!(
            format!("{}", ForgeError::NotImplemented("GitHub".into())),
            "not implemented: GitHub"
        );
    }

    #[test]
    fn fixture_error_passes_through_display() {
        let err = ForgeError::from(FixtureError::MissingFixture {
            signature: "gitlab.get_tags()".into(),
        });
        assert!(err.to_string().contains("gitlab.get_tags()"));
    }
}
