//! forge::github
//!
//! GitHub forge stub implementation.
//!
//! # Design
//!
//! This module provides a stub implementation of the `Service` and
//! `Project` traits for GitHub. All operations return
//! `ForgeError::NotImplemented` to demonstrate the multi-forge
//! architecture without implementing actual GitHub API calls: callers
//! depend on the traits, never on a concrete backend.
//!
//! # Feature Flag
//!
//! This module is only available when the `github` feature is enabled.

use async_trait::async_trait;
use url::Url;

use super::traits::{ForgeError, Project, Service};
use crate::types::{
    Comment, CreateReleaseRequest, ForgeUser, GitTag, Issue, PullRequest, Release,
};

/// Configuration for a GitHub connection.
#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// Instance base URL (`https://github.com` or a GHE host).
    pub instance_url: Url,
    /// Personal access token.
    pub token: String,
}

/// GitHub service stub.
///
/// This is a placeholder that returns `NotImplemented` for all
/// operations. It exists to validate that callers work correctly with
/// forge selection.
#[derive(Debug, Clone)]
pub struct GitHubService {
    instance_url: Url,
    token: String,
}

impl GitHubService {
    /// Create a new GitHub service stub.
    pub fn new(config: GitHubConfig) -> Self {
        Self {
            instance_url: config.instance_url,
            token: config.token,
        }
    }

    /// The configured instance URL.
    pub fn instance_url(&self) -> &Url {
        &self.instance_url
    }

    /// Check if a token is configured.
    pub fn has_token(&self) -> bool {
        !self.token.is_empty()
    }
}

fn not_implemented<T>(operation: &str) -> Result<T, ForgeError> {
    Err(ForgeError::NotImplemented(format!(
        "GitHub {} is not yet implemented",
        operation
    )))
}

#[async_trait]
impl Service for GitHubService {
    fn name(&self) -> &str {
        "github"
    }

    fn get_project(&self, namespace: &str, repo: &str) -> Result<Box<dyn Project>, ForgeError> {
        Ok(Box::new(GitHubProject {
            full_name: format!("{}/{}", namespace, repo),
        }))
    }

    async fn get_user(&self) -> Result<ForgeUser, ForgeError> {
        not_implemented("user lookup")
    }
}

/// GitHub project stub.
#[derive(Debug, Clone)]
pub struct GitHubProject {
    full_name: String,
}

impl GitHubProject {
    /// The `owner/repo` path this handle points at.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }
}

#[async_trait]
impl Project for GitHubProject {
    async fn get_branches(&self) -> Result<Vec<String>, ForgeError> {
        not_implemented("branch listing")
    }

    async fn get_file_content(&self, _path: &str) -> Result<String, ForgeError> {
        not_implemented("file retrieval")
    }

    async fn get_issue_list(&self) -> Result<Vec<Issue>, ForgeError> {
        not_implemented("issue listing")
    }

    async fn get_issue_info(&self, _issue_id: u64) -> Result<Issue, ForgeError> {
        not_implemented("issue retrieval")
    }

    async fn get_issue_comments(&self, _issue_id: u64) -> Result<Vec<Comment>, ForgeError> {
        not_implemented("issue comment listing")
    }

    async fn create_issue(&self, _title: &str, _description: &str) -> Result<Issue, ForgeError> {
        not_implemented("issue creation")
    }

    async fn close_issue(&self, _issue_id: u64) -> Result<Issue, ForgeError> {
        not_implemented("issue state transitions")
    }

    async fn list_pull_requests(&self) -> Result<Vec<PullRequest>, ForgeError> {
        not_implemented("pull request listing")
    }

    async fn get_pr_info(&self, _pr_id: u64) -> Result<PullRequest, ForgeError> {
        not_implemented("pull request retrieval")
    }

    async fn update_pr_info(
        &self,
        _pr_id: u64,
        _description: &str,
    ) -> Result<PullRequest, ForgeError> {
        not_implemented("pull request updates")
    }

    async fn get_pr_commits(&self, _pr_id: u64) -> Result<Vec<String>, ForgeError> {
        not_implemented("pull request commit listing")
    }

    async fn get_pr_comments(&self, _pr_id: u64) -> Result<Vec<Comment>, ForgeError> {
        not_implemented("pull request comment listing")
    }

    async fn get_tags(&self) -> Result<Vec<GitTag>, ForgeError> {
        not_implemented("tag listing")
    }

    async fn get_tag(&self, _tag_name: &str) -> Result<GitTag, ForgeError> {
        not_implemented("tag retrieval")
    }

    async fn get_releases(&self) -> Result<Vec<Release>, ForgeError> {
        not_implemented("release listing")
    }

    async fn create_release(&self, _request: CreateReleaseRequest) -> Result<Release, ForgeError> {
        not_implemented("release creation")
    }
}
