//! forge::mock
//!
//! In-memory forge implementation for deterministic testing.
//!
//! # Design
//!
//! The mock forge implements `Service` and `Project` over shared
//! in-memory state. Tests seed it with branches, files, issues, merge
//! requests, tags and releases, then use it either directly or as the
//! "live" side of the record/replay harness. A `fail_on` hook injects a
//! forge-domain error on a chosen method for error-path tests.
//!
//! # Example
//!
//! ```
//! use forgery::forge::mock::MockService;
//! use forgery::forge::Service;
//! use forgery::types::GitTag;
//!
//! # tokio_test::block_on(async {
//! let service = MockService::new().with_tags(vec![GitTag {
//!     name: "0.1.0".into(),
//!     commit_sha: "957d267a5b0cd9e615cd081c0eb02397dce1eb73".into(),
//! }]);
//!
//! let project = service.get_project("mygroup", "myrepo").unwrap();
//! let tags = project.get_tags().await.unwrap();
//! assert_eq!(tags[0].name, "0.1.0");
//! # });
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::traits::{ForgeError, Project, Service};
use crate::replay::ErrorEnvelope;
use crate::types::{
    Comment, CreateReleaseRequest, ForgeUser, GitTag, Issue, IssueStatus, PullRequest, Release,
};

/// Mock forge service.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; project handles
/// share the service's state.
#[derive(Debug, Clone)]
pub struct MockService {
    inner: Arc<Mutex<MockForgeInner>>,
}

/// Internal mutable state.
#[derive(Debug)]
struct MockForgeInner {
    branches: Vec<String>,
    files: BTreeMap<String, String>,
    issues: BTreeMap<u64, Issue>,
    issue_comments: BTreeMap<u64, Vec<Comment>>,
    next_issue_id: u64,
    prs: BTreeMap<u64, PullRequest>,
    pr_comments: BTreeMap<u64, Vec<Comment>>,
    pr_commits: BTreeMap<u64, Vec<String>>,
    tags: Vec<GitTag>,
    releases: Vec<Release>,
    user: ForgeUser,
    /// Method name to fail plus the error to raise, kept as an envelope
    /// so a fresh error can be rebuilt on every hit.
    fail_on: Option<(String, ErrorEnvelope)>,
    /// Method names in invocation order, for test verification.
    calls: Vec<String>,
}

impl MockService {
    /// Create an empty mock forge.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockForgeInner {
                branches: Vec::new(),
                files: BTreeMap::new(),
                issues: BTreeMap::new(),
                issue_comments: BTreeMap::new(),
                next_issue_id: 1,
                prs: BTreeMap::new(),
                pr_comments: BTreeMap::new(),
                pr_commits: BTreeMap::new(),
                tags: Vec::new(),
                releases: Vec::new(),
                user: ForgeUser {
                    username: "mock-user".into(),
                    email: Some("mock-user@example.com".into()),
                },
                fail_on: None,
                calls: Vec::new(),
            })),
        }
    }

    /// Seed branch names.
    pub fn with_branches(self, branches: Vec<String>) -> Self {
        self.inner.lock().unwrap().branches = branches;
        self
    }

    /// Seed one file.
    pub fn with_file(self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.inner
            .lock()
            .unwrap()
            .files
            .insert(path.into(), content.into());
        self
    }

    /// Seed issues. New issues created later get ids after the maximum.
    pub fn with_issues(self, issues: Vec<Issue>) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.next_issue_id = issues.iter().map(|i| i.id).max().unwrap_or(0) + 1;
            inner.issues = issues.into_iter().map(|i| (i.id, i)).collect();
        }
        self
    }

    /// Seed comments for one issue.
    pub fn with_issue_comments(self, issue_id: u64, comments: Vec<Comment>) -> Self {
        self.inner
            .lock()
            .unwrap()
            .issue_comments
            .insert(issue_id, comments);
        self
    }

    /// Seed merge requests.
    pub fn with_prs(self, prs: Vec<PullRequest>) -> Self {
        self.inner.lock().unwrap().prs = prs.into_iter().map(|p| (p.id, p)).collect();
        self
    }

    /// Seed comments for one merge request.
    pub fn with_pr_comments(self, pr_id: u64, comments: Vec<Comment>) -> Self {
        self.inner.lock().unwrap().pr_comments.insert(pr_id, comments);
        self
    }

    /// Seed the commit shas of one merge request, oldest first.
    pub fn with_pr_commits(self, pr_id: u64, shas: Vec<String>) -> Self {
        self.inner.lock().unwrap().pr_commits.insert(pr_id, shas);
        self
    }

    /// Seed tags.
    pub fn with_tags(self, tags: Vec<GitTag>) -> Self {
        self.inner.lock().unwrap().tags = tags;
        self
    }

    /// Seed releases.
    pub fn with_releases(self, releases: Vec<Release>) -> Self {
        self.inner.lock().unwrap().releases = releases;
        self
    }

    /// Set the authenticated user.
    pub fn with_user(self, user: ForgeUser) -> Self {
        self.inner.lock().unwrap().user = user;
        self
    }

    /// Configure the mock to fail a specific method with the given
    /// forge-domain error. Harness errors are not injectable and are
    /// ignored here.
    pub fn fail_on(self, method: impl Into<String>, error: &ForgeError) -> Self {
        if let Some(envelope) = ErrorEnvelope::capture(error) {
            self.inner.lock().unwrap().fail_on = Some((method.into(), envelope));
        }
        self
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        self.inner.lock().unwrap().fail_on = None;
    }

    /// Get the method names invoked so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

fn record_call(inner: &mut MockForgeInner, method: &str) -> Result<(), ForgeError> {
    inner.calls.push(method.to_string());
    match &inner.fail_on {
        Some((failing, envelope)) if failing == method => Err(envelope.rebuild()),
        _ => Ok(()),
    }
}

#[async_trait]
impl Service for MockService {
    fn name(&self) -> &str {
        "mock"
    }

    fn get_project(&self, _namespace: &str, _repo: &str) -> Result<Box<dyn Project>, ForgeError> {
        Ok(Box::new(MockProject {
            inner: Arc::clone(&self.inner),
        }))
    }

    async fn get_user(&self) -> Result<ForgeUser, ForgeError> {
        let mut inner = self.inner.lock().unwrap();
        record_call(&mut inner, "get_user")?;
        Ok(inner.user.clone())
    }
}

/// Mock project handle sharing its service's state.
#[derive(Debug, Clone)]
pub struct MockProject {
    inner: Arc<Mutex<MockForgeInner>>,
}

#[async_trait]
impl Project for MockProject {
    async fn get_branches(&self) -> Result<Vec<String>, ForgeError> {
        let mut inner = self.inner.lock().unwrap();
        record_call(&mut inner, "get_branches")?;
        Ok(inner.branches.clone())
    }

    async fn get_file_content(&self, path: &str) -> Result<String, ForgeError> {
        let mut inner = self.inner.lock().unwrap();
        record_call(&mut inner, "get_file_content")?;
        inner
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| ForgeError::FileNotFound(path.to_string()))
    }

    async fn get_issue_list(&self) -> Result<Vec<Issue>, ForgeError> {
        let mut inner = self.inner.lock().unwrap();
        record_call(&mut inner, "get_issue_list")?;
        Ok(inner.issues.values().cloned().collect())
    }

    async fn get_issue_info(&self, issue_id: u64) -> Result<Issue, ForgeError> {
        let mut inner = self.inner.lock().unwrap();
        record_call(&mut inner, "get_issue_info")?;
        inner
            .issues
            .get(&issue_id)
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(format!("issue #{}", issue_id)))
    }

    async fn get_issue_comments(&self, issue_id: u64) -> Result<Vec<Comment>, ForgeError> {
        let mut inner = self.inner.lock().unwrap();
        record_call(&mut inner, "get_issue_comments")?;
        if !inner.issues.contains_key(&issue_id) {
            return Err(ForgeError::NotFound(format!("issue #{}", issue_id)));
        }
        Ok(inner
            .issue_comments
            .get(&issue_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_issue(&self, title: &str, description: &str) -> Result<Issue, ForgeError> {
        let mut inner = self.inner.lock().unwrap();
        record_call(&mut inner, "create_issue")?;

        let id = inner.next_issue_id;
        inner.next_issue_id += 1;
        let issue = Issue {
            id,
            title: title.to_string(),
            description: description.to_string(),
            status: IssueStatus::Open,
            author: Some(inner.user.username.clone()),
            created_at: None,
            url: None,
        };
        inner.issues.insert(id, issue.clone());
        Ok(issue)
    }

    async fn close_issue(&self, issue_id: u64) -> Result<Issue, ForgeError> {
        let mut inner = self.inner.lock().unwrap();
        record_call(&mut inner, "close_issue")?;

        let issue = inner
            .issues
            .get_mut(&issue_id)
            .ok_or_else(|| ForgeError::NotFound(format!("issue #{}", issue_id)))?;
        issue.status = IssueStatus::Closed;
        Ok(issue.clone())
    }

    async fn list_pull_requests(&self) -> Result<Vec<PullRequest>, ForgeError> {
        let mut inner = self.inner.lock().unwrap();
        record_call(&mut inner, "list_pull_requests")?;
        Ok(inner.prs.values().cloned().collect())
    }

    async fn get_pr_info(&self, pr_id: u64) -> Result<PullRequest, ForgeError> {
        let mut inner = self.inner.lock().unwrap();
        record_call(&mut inner, "get_pr_info")?;
        inner
            .prs
            .get(&pr_id)
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(format!("merge request !{}", pr_id)))
    }

    async fn update_pr_info(
        &self,
        pr_id: u64,
        description: &str,
    ) -> Result<PullRequest, ForgeError> {
        let mut inner = self.inner.lock().unwrap();
        record_call(&mut inner, "update_pr_info")?;

        let pr = inner
            .prs
            .get_mut(&pr_id)
            .ok_or_else(|| ForgeError::NotFound(format!("merge request !{}", pr_id)))?;
        pr.description = description.to_string();
        Ok(pr.clone())
    }

    async fn get_pr_commits(&self, pr_id: u64) -> Result<Vec<String>, ForgeError> {
        let mut inner = self.inner.lock().unwrap();
        record_call(&mut inner, "get_pr_commits")?;
        if !inner.prs.contains_key(&pr_id) {
            return Err(ForgeError::NotFound(format!("merge request !{}", pr_id)));
        }
        Ok(inner.pr_commits.get(&pr_id).cloned().unwrap_or_default())
    }

    async fn get_pr_comments(&self, pr_id: u64) -> Result<Vec<Comment>, ForgeError> {
        let mut inner = self.inner.lock().unwrap();
        record_call(&mut inner, "get_pr_comments")?;
        if !inner.prs.contains_key(&pr_id) {
            return Err(ForgeError::NotFound(format!("merge request !{}", pr_id)));
        }
        Ok(inner.pr_comments.get(&pr_id).cloned().unwrap_or_default())
    }

    async fn get_tags(&self) -> Result<Vec<GitTag>, ForgeError> {
        let mut inner = self.inner.lock().unwrap();
        record_call(&mut inner, "get_tags")?;
        Ok(inner.tags.clone())
    }

    async fn get_tag(&self, tag_name: &str) -> Result<GitTag, ForgeError> {
        let mut inner = self.inner.lock().unwrap();
        record_call(&mut inner, "get_tag")?;
        inner
            .tags
            .iter()
            .find(|t| t.name == tag_name)
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(format!("tag {}", tag_name)))
    }

    async fn get_releases(&self) -> Result<Vec<Release>, ForgeError> {
        let mut inner = self.inner.lock().unwrap();
        record_call(&mut inner, "get_releases")?;
        Ok(inner.releases.clone())
    }

    async fn create_release(&self, request: CreateReleaseRequest) -> Result<Release, ForgeError> {
        let mut inner = self.inner.lock().unwrap();
        record_call(&mut inner, "create_release")?;

        let release = Release {
            title: request.name,
            body: request.description,
            tag_name: request.tag_name,
            url: None,
            created_at: None,
        };
        inner.releases.push(release.clone());
        Ok(release)
    }
}
