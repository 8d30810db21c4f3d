//! replay::service
//!
//! `Service`/`Project` implementations that route every call through the
//! record/replay harness.
//!
//! # Design
//!
//! [`ReplayService`] wraps an optional live service: present in write
//! mode (calls pass through and get captured), absent in read mode (the
//! wrapper can structurally never reach a backend). Each facade method is
//! a thin shim: build the signature from the method name and arguments,
//! then hand the live call to [`ReplayContext::intercept`]. There is no
//! per-method special-casing beyond signature construction.
//!
//! # Example
//!
//! ```ignore
//! use forgery::forge::gitlab::{GitLabConfig, GitLabService};
//! use forgery::replay::{Credentials, ReplayContext, ReplayService};
//!
//! let creds = Credentials::from_env("GITLAB");
//! let ctx = ReplayContext::open("tests/data/case_tags.yaml", &creds)?;
//!
//! // Live service only in write mode; replay needs no network at all.
//! let live = match ctx.mode() {
//!     Mode::Write => Some(gitlab_service(&creds)?),
//!     Mode::Read => None,
//! };
//! let service = ReplayService::wrap("gitlab", ctx, live)?;
//!
//! let project = service.get_project("mygroup", "myrepo")?;
//! let tags = project.get_tags().await?;
//! service.dump()?;
//! ```

use async_trait::async_trait;

use super::context::ReplayContext;
use super::signature::CallSignature;
use super::store::{FixtureError, Mode};
use crate::forge::{ForgeError, Project, Service};
use crate::types::{Comment, CreateReleaseRequest, ForgeUser, GitTag, Issue, PullRequest, Release};

/// Record/replay wrapper around a forge service.
pub struct ReplayService {
    forge: String,
    ctx: ReplayContext,
    live: Option<Box<dyn Service>>,
}

impl ReplayService {
    /// Wrap a service for the given forge name.
    ///
    /// `live` must be `Some` in write mode (there is nothing to capture
    /// otherwise) and should be `None` in read mode so that no backend
    /// is ever reachable during replay.
    ///
    /// # Errors
    ///
    /// - [`FixtureError::CredentialsMissing`] if the context is in write
    ///   mode and no live service was provided
    pub fn wrap(
        forge: impl Into<String>,
        ctx: ReplayContext,
        live: Option<Box<dyn Service>>,
    ) -> Result<Self, FixtureError> {
        if ctx.mode() == Mode::Write && live.is_none() {
            return Err(FixtureError::CredentialsMissing(
                "record mode requires a live service to capture from".into(),
            ));
        }
        Ok(Self {
            forge: forge.into(),
            ctx,
            live,
        })
    }

    /// The underlying replay context.
    pub fn context(&self) -> &ReplayContext {
        &self.ctx
    }

    /// Persist the fixture store; call once at test teardown.
    pub fn dump(&self) -> Result<(), FixtureError> {
        self.ctx.dump()
    }

    fn sig(&self, method: &str) -> CallSignature {
        CallSignature::new(&self.forge, method)
    }

    fn live(&self) -> Result<&dyn Service, ForgeError> {
        self.live.as_deref().ok_or_else(|| {
            FixtureError::CredentialsMissing("no live service available in replay mode".into())
                .into()
        })
    }
}

#[async_trait]
impl Service for ReplayService {
    fn name(&self) -> &str {
        &self.forge
    }

    fn get_project(&self, namespace: &str, repo: &str) -> Result<Box<dyn Project>, ForgeError> {
        let live = match &self.live {
            Some(service) => Some(service.get_project(namespace, repo)?),
            None => None,
        };
        Ok(Box::new(ReplayProject {
            forge: self.forge.clone(),
            ctx: self.ctx.clone(),
            live,
        }))
    }

    async fn get_user(&self) -> Result<ForgeUser, ForgeError> {
        self.ctx
            .intercept(self.sig("get_user"), || async move { self.live()?.get_user().await })
            .await
    }
}

/// Record/replay wrapper around one project handle.
pub struct ReplayProject {
    forge: String,
    ctx: ReplayContext,
    live: Option<Box<dyn Project>>,
}

impl ReplayProject {
    fn sig(&self, method: &str) -> CallSignature {
        CallSignature::new(&self.forge, method)
    }

    fn live(&self) -> Result<&dyn Project, ForgeError> {
        self.live.as_deref().ok_or_else(|| {
            FixtureError::CredentialsMissing("no live project available in replay mode".into())
                .into()
        })
    }
}

#[async_trait]
impl Project for ReplayProject {
    async fn get_branches(&self) -> Result<Vec<String>, ForgeError> {
        self.ctx
            .intercept(self.sig("get_branches"), || async move {
                self.live()?.get_branches().await
            })
            .await
    }

    async fn get_file_content(&self, path: &str) -> Result<String, ForgeError> {
        self.ctx
            .intercept(self.sig("get_file_content").arg(path), || async move {
                self.live()?.get_file_content(path).await
            })
            .await
    }

    async fn get_issue_list(&self) -> Result<Vec<Issue>, ForgeError> {
        self.ctx
            .intercept(self.sig("get_issue_list"), || async move {
                self.live()?.get_issue_list().await
            })
            .await
    }

    async fn get_issue_info(&self, issue_id: u64) -> Result<Issue, ForgeError> {
        self.ctx
            .intercept(self.sig("get_issue_info").arg(issue_id), || async move {
                self.live()?.get_issue_info(issue_id).await
            })
            .await
    }

    async fn get_issue_comments(&self, issue_id: u64) -> Result<Vec<Comment>, ForgeError> {
        self.ctx
            .intercept(self.sig("get_issue_comments").arg(issue_id), || async move {
                self.live()?.get_issue_comments(issue_id).await
            })
            .await
    }

    async fn create_issue(&self, title: &str, description: &str) -> Result<Issue, ForgeError> {
        self.ctx
            .intercept(
                self.sig("create_issue").arg(title).arg(description),
                || async move { self.live()?.create_issue(title, description).await },
            )
            .await
    }

    async fn close_issue(&self, issue_id: u64) -> Result<Issue, ForgeError> {
        self.ctx
            .intercept(self.sig("close_issue").arg(issue_id), || async move {
                self.live()?.close_issue(issue_id).await
            })
            .await
    }

    async fn list_pull_requests(&self) -> Result<Vec<PullRequest>, ForgeError> {
        self.ctx
            .intercept(self.sig("list_pull_requests"), || async move {
                self.live()?.list_pull_requests().await
            })
            .await
    }

    async fn get_pr_info(&self, pr_id: u64) -> Result<PullRequest, ForgeError> {
        self.ctx
            .intercept(self.sig("get_pr_info").arg(pr_id), || async move {
                self.live()?.get_pr_info(pr_id).await
            })
            .await
    }

    async fn update_pr_info(
        &self,
        pr_id: u64,
        description: &str,
    ) -> Result<PullRequest, ForgeError> {
        self.ctx
            .intercept(
                self.sig("update_pr_info").arg(pr_id).arg(description),
                || async move { self.live()?.update_pr_info(pr_id, description).await },
            )
            .await
    }

    async fn get_pr_commits(&self, pr_id: u64) -> Result<Vec<String>, ForgeError> {
        self.ctx
            .intercept(self.sig("get_pr_commits").arg(pr_id), || async move {
                self.live()?.get_pr_commits(pr_id).await
            })
            .await
    }

    async fn get_pr_comments(&self, pr_id: u64) -> Result<Vec<Comment>, ForgeError> {
        self.ctx
            .intercept(self.sig("get_pr_comments").arg(pr_id), || async move {
                self.live()?.get_pr_comments(pr_id).await
            })
            .await
    }

    async fn get_tags(&self) -> Result<Vec<GitTag>, ForgeError> {
        self.ctx
            .intercept(self.sig("get_tags"), || async move {
                self.live()?.get_tags().await
            })
            .await
    }

    async fn get_tag(&self, tag_name: &str) -> Result<GitTag, ForgeError> {
        self.ctx
            .intercept(self.sig("get_tag").arg(tag_name), || async move {
                self.live()?.get_tag(tag_name).await
            })
            .await
    }

    async fn get_releases(&self) -> Result<Vec<Release>, ForgeError> {
        self.ctx
            .intercept(self.sig("get_releases"), || async move {
                self.live()?.get_releases().await
            })
            .await
    }

    async fn create_release(&self, request: CreateReleaseRequest) -> Result<Release, ForgeError> {
        let sig = self
            .sig("create_release")
            .arg(&request.name)
            .arg(&request.tag_name)
            .arg(&request.description)
            .arg(&request.git_ref);
        self.ctx
            .intercept(sig, || async move {
                self.live()?.create_release(request).await
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::store::Credentials;

    fn complete_creds() -> Credentials {
        Credentials::new("GITLAB", Some("t".into()), Some("u".into()))
    }

    #[test]
    fn write_mode_requires_live_service() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ReplayContext::open(dir.path().join("case.yaml"), &complete_creds()).unwrap();

        let result = ReplayService::wrap("gitlab", ctx, None);
        assert!(matches!(
            result,
            Err(FixtureError::CredentialsMissing(_))
        ));
    }

    #[tokio::test]
    async fn replay_without_live_project_reports_harness_error_on_miss() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("case.yaml");

        // produce an empty read-mode fixture
        {
            let ctx = ReplayContext::open(&path, &complete_creds()).unwrap();
            ctx.dump().unwrap();
        }

        let ctx = ReplayContext::open(&path, &Credentials::new("GITLAB", None, None)).unwrap();
        let service = ReplayService::wrap("gitlab", ctx, None).unwrap();
        assert_eq!(service.name(), "gitlab");

        let project = service.get_project("mygroup", "myrepo").unwrap();
        let result = project.get_branches().await;
        assert!(matches!(
            result,
            Err(ForgeError::Fixture(FixtureError::MissingFixture { .. }))
        ));
    }
}
