//! forge::gitlab
//!
//! GitLab forge implementation using the REST v4 API.
//!
//! # Design
//!
//! `GitLabService` authenticates with a personal access token via the
//! `PRIVATE-TOKEN` header and hands out `GitLabProject` handles. Both
//! share one internal client that owns the HTTP connection pool, the
//! resolved `/api/v4` base URL and the token.
//!
//! Project paths (`namespace/repo`, including nested groups) and file
//! paths are pushed as single URL path segments, so embedded slashes are
//! percent-encoded the way the GitLab API requires.
//!
//! Raw JSON payloads are deserialized into private DTO structs mirroring
//! the GitLab schema and converted into the normalized records in
//! [`crate::types`]; the field mapping never leaks out of this module.
//!
//! # Example
//!
//! ```ignore
//! use forgery::forge::gitlab::{GitLabConfig, GitLabService};
//!
//! let service = GitLabService::new(GitLabConfig {
//!     instance_url: "https://gitlab.gnome.org".parse()?,
//!     token: std::env::var("GITLAB_TOKEN")?,
//! })?;
//!
//! let project = service.get_project("lbarcziova", "testing-repo")?;
//! let tags = project.get_tags().await?;
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::traits::{ForgeError, Project, Service};
use crate::types::{
    Comment, CreateReleaseRequest, ForgeUser, GitTag, Issue, IssueStatus, PrStatus, PullRequest,
    Release,
};

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "forgery";

/// Configuration for a GitLab connection.
#[derive(Debug, Clone)]
pub struct GitLabConfig {
    /// Instance base URL (e.g., `https://gitlab.com` or a self-hosted host).
    pub instance_url: Url,
    /// Personal access token.
    pub token: String,
}

/// Internal HTTP client shared by the service and its project handles.
#[derive(Clone)]
struct GitLabClient {
    http: Client,
    api_base: Url,
    token: String,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for GitLabClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitLabClient")
            .field("api_base", &self.api_base.as_str())
            .field("has_token", &!self.token.is_empty())
            .finish()
    }
}

impl GitLabClient {
    /// Build common headers for API requests.
    fn headers(&self) -> Result<HeaderMap, ForgeError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "PRIVATE-TOKEN",
            HeaderValue::from_str(&self.token).map_err(|_| {
                ForgeError::AuthFailed("token contains invalid header characters".into())
            })?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        Ok(headers)
    }

    /// Build a URL under the API base from literal path segments.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .expect("API base is always a valid base URL")
            .extend(segments);
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ForgeError> {
        debug!(url = %url, "GET");
        let response = self
            .http
            .get(url)
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))?;
        Self::handle_response(response).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, ForgeError> {
        debug!(url = %url, "POST");
        let response = self
            .http
            .post(url)
            .headers(self.headers()?)
            .json(body)
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))?;
        Self::handle_response(response).await
    }

    async fn put_json<T: DeserializeOwned, B: Serialize>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, ForgeError> {
        debug!(url = %url, "PUT");
        let response = self
            .http
            .put(url)
            .headers(self.headers()?)
            .json(body)
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))?;
        Self::handle_response(response).await
    }

    /// Handle an API response, mapping errors appropriately.
    async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T, ForgeError> {
        let status = response.status();
        if status.is_success() {
            response.json().await.map_err(|e| ForgeError::ApiError {
                status: status.as_u16(),
                message: format!("failed to parse response: {}", e),
            })
        } else {
            Err(Self::error_from_response(response, status).await)
        }
    }

    /// Map an error response to a `ForgeError`.
    async fn error_from_response(response: Response, status: StatusCode) -> ForgeError {
        let message = response
            .json::<GitLabErrorResponse>()
            .await
            .ok()
            .and_then(GitLabErrorResponse::into_message)
            .unwrap_or_else(|| "Unknown error".to_string());

        match status {
            StatusCode::UNAUTHORIZED => {
                ForgeError::AuthFailed("invalid or expired token".into())
            }
            StatusCode::FORBIDDEN => {
                ForgeError::AuthFailed(format!("permission denied: {}", message))
            }
            StatusCode::NOT_FOUND => ForgeError::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => ForgeError::RateLimited,
            _ => ForgeError::ApiError {
                status: status.as_u16(),
                message,
            },
        }
    }
}

/// GitLab service implementation.
#[derive(Debug, Clone)]
pub struct GitLabService {
    client: GitLabClient,
}

impl GitLabService {
    /// Create a new GitLab service.
    ///
    /// Resolves the API base as `<instance_url>/api/v4`.
    ///
    /// # Errors
    ///
    /// Returns an error if the instance URL cannot carry a path
    /// (e.g., `mailto:` style URLs).
    pub fn new(config: GitLabConfig) -> Result<Self, ForgeError> {
        let mut api_base = config.instance_url;
        api_base
            .path_segments_mut()
            .map_err(|_| ForgeError::NetworkError("instance URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(["api", "v4"]);

        Ok(Self {
            client: GitLabClient {
                http: Client::new(),
                api_base,
                token: config.token,
            },
        })
    }
}

#[async_trait]
impl Service for GitLabService {
    fn name(&self) -> &str {
        "gitlab"
    }

    fn get_project(&self, namespace: &str, repo: &str) -> Result<Box<dyn Project>, ForgeError> {
        Ok(Box::new(GitLabProject {
            client: self.client.clone(),
            project_path: format!("{}/{}", namespace, repo),
        }))
    }

    async fn get_user(&self) -> Result<ForgeUser, ForgeError> {
        let user: GitLabUser = self.client.get_json(self.client.endpoint(&["user"])).await?;
        Ok(user.into())
    }
}

/// One project on a GitLab instance.
#[derive(Debug, Clone)]
pub struct GitLabProject {
    client: GitLabClient,
    /// `namespace/repo`, encoded as a single path segment in URLs.
    project_path: String,
}

impl GitLabProject {
    /// Build a URL under `projects/<path>` from literal trailing segments.
    ///
    /// The project path is pushed as one segment, so its slashes become
    /// `%2F` as the API requires.
    fn project_url(&self, tail: &[&str]) -> Url {
        let mut url = self.client.api_base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .expect("API base is always a valid base URL");
            segments.push("projects").push(&self.project_path);
            segments.extend(tail);
        }
        url
    }
}

#[async_trait]
impl Project for GitLabProject {
    async fn get_branches(&self) -> Result<Vec<String>, ForgeError> {
        let branches: Vec<GitLabBranch> = self
            .client
            .get_json(self.project_url(&["repository", "branches"]))
            .await?;
        Ok(branches.into_iter().map(|b| b.name).collect())
    }

    async fn get_file_content(&self, path: &str) -> Result<String, ForgeError> {
        let url = self.project_url(&["repository", "files", path, "raw"]);
        debug!(url = %url, "GET (raw)");
        let response = self
            .client
            .http
            .get(url)
            .headers(self.client.headers()?)
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ForgeError::FileNotFound(path.to_string()));
        }
        if !status.is_success() {
            return Err(GitLabClient::error_from_response(response, status).await);
        }
        response.text().await.map_err(|e| ForgeError::ApiError {
            status: status.as_u16(),
            message: format!("failed to read file content: {}", e),
        })
    }

    async fn get_issue_list(&self) -> Result<Vec<Issue>, ForgeError> {
        let issues: Vec<GitLabIssue> =
            self.client.get_json(self.project_url(&["issues"])).await?;
        Ok(issues.into_iter().map(Into::into).collect())
    }

    async fn get_issue_info(&self, issue_id: u64) -> Result<Issue, ForgeError> {
        let id = issue_id.to_string();
        let issue: GitLabIssue = self
            .client
            .get_json(self.project_url(&["issues", &id]))
            .await?;
        Ok(issue.into())
    }

    async fn get_issue_comments(&self, issue_id: u64) -> Result<Vec<Comment>, ForgeError> {
        let id = issue_id.to_string();
        let mut url = self.project_url(&["issues", &id, "notes"]);
        url.query_pairs_mut().append_pair("sort", "asc");

        let notes: Vec<GitLabNote> = self.client.get_json(url).await?;
        Ok(collect_comments(notes))
    }

    async fn create_issue(&self, title: &str, description: &str) -> Result<Issue, ForgeError> {
        let body = CreateIssueBody { title, description };
        let issue: GitLabIssue = self
            .client
            .post_json(self.project_url(&["issues"]), &body)
            .await?;
        Ok(issue.into())
    }

    async fn close_issue(&self, issue_id: u64) -> Result<Issue, ForgeError> {
        let id = issue_id.to_string();
        let body = StateEventBody {
            state_event: "close",
        };
        let issue: GitLabIssue = self
            .client
            .put_json(self.project_url(&["issues", &id]), &body)
            .await?;
        Ok(issue.into())
    }

    async fn list_pull_requests(&self) -> Result<Vec<PullRequest>, ForgeError> {
        let requests: Vec<GitLabMergeRequest> = self
            .client
            .get_json(self.project_url(&["merge_requests"]))
            .await?;
        Ok(requests.into_iter().map(Into::into).collect())
    }

    async fn get_pr_info(&self, pr_id: u64) -> Result<PullRequest, ForgeError> {
        let id = pr_id.to_string();
        let request: GitLabMergeRequest = self
            .client
            .get_json(self.project_url(&["merge_requests", &id]))
            .await?;
        Ok(request.into())
    }

    async fn update_pr_info(
        &self,
        pr_id: u64,
        description: &str,
    ) -> Result<PullRequest, ForgeError> {
        let id = pr_id.to_string();
        let body = UpdateMergeRequestBody { description };
        let request: GitLabMergeRequest = self
            .client
            .put_json(self.project_url(&["merge_requests", &id]), &body)
            .await?;
        Ok(request.into())
    }

    async fn get_pr_commits(&self, pr_id: u64) -> Result<Vec<String>, ForgeError> {
        let id = pr_id.to_string();
        let commits: Vec<GitLabCommit> = self
            .client
            .get_json(self.project_url(&["merge_requests", &id, "commits"]))
            .await?;

        // The API reports newest first; normalize to oldest first.
        let mut shas: Vec<String> = commits.into_iter().map(|c| c.id).collect();
        shas.reverse();
        Ok(shas)
    }

    async fn get_pr_comments(&self, pr_id: u64) -> Result<Vec<Comment>, ForgeError> {
        let id = pr_id.to_string();
        let mut url = self.project_url(&["merge_requests", &id, "notes"]);
        url.query_pairs_mut().append_pair("sort", "asc");

        let notes: Vec<GitLabNote> = self.client.get_json(url).await?;
        Ok(collect_comments(notes))
    }

    async fn get_tags(&self) -> Result<Vec<GitTag>, ForgeError> {
        let tags: Vec<GitLabTagInfo> = self
            .client
            .get_json(self.project_url(&["repository", "tags"]))
            .await?;
        Ok(tags.into_iter().map(Into::into).collect())
    }

    async fn get_tag(&self, tag_name: &str) -> Result<GitTag, ForgeError> {
        let tag: GitLabTagInfo = self
            .client
            .get_json(self.project_url(&["repository", "tags", tag_name]))
            .await?;
        Ok(tag.into())
    }

    async fn get_releases(&self) -> Result<Vec<Release>, ForgeError> {
        let releases: Vec<GitLabRelease> =
            self.client.get_json(self.project_url(&["releases"])).await?;
        Ok(releases.into_iter().map(Into::into).collect())
    }

    async fn create_release(&self, request: CreateReleaseRequest) -> Result<Release, ForgeError> {
        let body = CreateReleaseBody {
            name: &request.name,
            tag_name: &request.tag_name,
            description: &request.description,
            git_ref: &request.git_ref,
        };
        let release: GitLabRelease = self
            .client
            .post_json(self.project_url(&["releases"]), &body)
            .await?;
        Ok(release.into())
    }
}

/// Drop system notes (state changes, etc.) and normalize the rest.
fn collect_comments(notes: Vec<GitLabNote>) -> Vec<Comment> {
    notes
        .into_iter()
        .filter(|note| !note.system)
        .map(Into::into)
        .collect()
}

// --------------------------------------------------------------------------
// API Request/Response Types
// --------------------------------------------------------------------------

/// Request body for creating an issue.
#[derive(Serialize)]
struct CreateIssueBody<'a> {
    title: &'a str,
    description: &'a str,
}

/// Request body for issue state transitions.
#[derive(Serialize)]
struct StateEventBody<'a> {
    state_event: &'a str,
}

/// Request body for updating a merge request.
#[derive(Serialize)]
struct UpdateMergeRequestBody<'a> {
    description: &'a str,
}

/// Request body for publishing a release.
#[derive(Serialize)]
struct CreateReleaseBody<'a> {
    name: &'a str,
    tag_name: &'a str,
    description: &'a str,
    #[serde(rename = "ref")]
    git_ref: &'a str,
}

/// GitLab error response format. `message` may be a string or a
/// structured validation map; `error` appears on some auth failures.
#[derive(Deserialize)]
struct GitLabErrorResponse {
    #[serde(default)]
    message: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

impl GitLabErrorResponse {
    fn into_message(self) -> Option<String> {
        match (self.message, self.error) {
            (Some(serde_json::Value::String(s)), _) => Some(s),
            (Some(other), _) => Some(other.to_string()),
            (None, Some(error)) => Some(error),
            (None, None) => None,
        }
    }
}

#[derive(Deserialize)]
struct GitLabBranch {
    name: String,
}

#[derive(Deserialize)]
struct GitLabAuthor {
    username: String,
}

#[derive(Deserialize)]
struct GitLabIssue {
    iid: u64,
    title: String,
    #[serde(default)]
    description: Option<String>,
    state: String,
    #[serde(default)]
    author: Option<GitLabAuthor>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    web_url: Option<String>,
}

impl From<GitLabIssue> for Issue {
    fn from(issue: GitLabIssue) -> Self {
        Issue {
            id: issue.iid,
            title: issue.title,
            description: issue.description.unwrap_or_default(),
            status: if issue.state == "closed" {
                IssueStatus::Closed
            } else {
                IssueStatus::Open
            },
            author: issue.author.map(|a| a.username),
            created_at: issue.created_at,
            url: issue.web_url,
        }
    }
}

#[derive(Deserialize)]
struct GitLabMergeRequest {
    iid: u64,
    title: String,
    #[serde(default)]
    description: Option<String>,
    state: String,
    source_branch: String,
    target_branch: String,
    #[serde(default)]
    author: Option<GitLabAuthor>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    web_url: Option<String>,
}

impl From<GitLabMergeRequest> for PullRequest {
    fn from(mr: GitLabMergeRequest) -> Self {
        PullRequest {
            id: mr.iid,
            title: mr.title,
            description: mr.description.unwrap_or_default(),
            status: match mr.state.as_str() {
                "merged" => PrStatus::Merged,
                "closed" => PrStatus::Closed,
                _ => PrStatus::Open,
            },
            source_branch: mr.source_branch,
            target_branch: mr.target_branch,
            author: mr.author.map(|a| a.username),
            created_at: mr.created_at,
            url: mr.web_url,
        }
    }
}

#[derive(Deserialize)]
struct GitLabCommit {
    id: String,
}

#[derive(Deserialize)]
struct GitLabNote {
    body: String,
    author: GitLabAuthor,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    /// System notes are generated by GitLab itself (state changes etc.).
    #[serde(default)]
    system: bool,
}

impl From<GitLabNote> for Comment {
    fn from(note: GitLabNote) -> Self {
        Comment {
            body: note.body,
            author: note.author.username,
            created_at: note.created_at,
        }
    }
}

#[derive(Deserialize)]
struct GitLabTagInfo {
    name: String,
    commit: GitLabTagCommit,
}

#[derive(Deserialize)]
struct GitLabTagCommit {
    id: String,
}

impl From<GitLabTagInfo> for GitTag {
    fn from(tag: GitLabTagInfo) -> Self {
        GitTag {
            name: tag.name,
            commit_sha: tag.commit.id,
        }
    }
}

#[derive(Deserialize)]
struct GitLabRelease {
    name: String,
    tag_name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(rename = "_links", default)]
    links: Option<GitLabReleaseLinks>,
}

#[derive(Deserialize)]
struct GitLabReleaseLinks {
    #[serde(rename = "self", default)]
    self_url: Option<String>,
}

impl From<GitLabRelease> for Release {
    fn from(release: GitLabRelease) -> Self {
        Release {
            title: release.name,
            body: release.description.unwrap_or_default(),
            tag_name: release.tag_name,
            url: release.links.and_then(|l| l.self_url),
            created_at: release.created_at,
        }
    }
}

#[derive(Deserialize)]
struct GitLabUser {
    username: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    public_email: Option<String>,
}

impl From<GitLabUser> for ForgeUser {
    fn from(user: GitLabUser) -> Self {
        ForgeUser {
            username: user.username,
            email: user
                .email
                .or(user.public_email)
                .filter(|e| !e.is_empty()),
        }
    }
}
