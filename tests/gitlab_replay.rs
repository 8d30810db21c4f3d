//! Replay-only integration tests against checked-in GitLab fixtures.
//!
//! These tests never touch the network: each opens its own fixture file
//! from `tests/data/` (one file per test, mirroring the one-store-per-
//! test-id discipline), wraps it in a replay service with no live
//! backend, and asserts on the recorded responses. Re-recording against
//! a real instance only requires credentials in the environment and
//! deleting the fixture file.

use std::path::PathBuf;

use forgery::forge::{ForgeError, Project, Service};
use forgery::replay::{Credentials, Mode, ReplayContext, ReplayService};
use forgery::types::{CreateReleaseRequest, IssueStatus, PrStatus};

fn replay_service(file: &str) -> ReplayService {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(file);

    let creds = Credentials::new("GITLAB", None, None);
    let ctx = ReplayContext::open(path, &creds).expect("fixture file must open");
    assert_eq!(ctx.mode(), Mode::Read);

    ReplayService::wrap("gitlab", ctx, None).expect("read mode needs no live service")
}

#[tokio::test]
async fn generic_commands() {
    let service = replay_service("test_gitlab_data_generic_commands.yaml");
    let project = service
        .get_project("lbarcziova", "testing-repo")
        .unwrap();

    let branches = project.get_branches().await.unwrap();
    assert!(branches.contains(&"master".to_string()));

    let content = project.get_file_content("README.md").await.unwrap();
    assert!(content.contains("This is new README for testing-repo"));

    let missing = project
        .get_file_content(".blablabla_nonexisting_file")
        .await
        .unwrap_err();
    assert!(matches!(missing, ForgeError::FileNotFound(_)));

    let user = service.get_user().await.unwrap();
    assert!(user.username.len() > 3);
    let email = user.email.unwrap();
    assert!(email.contains('@'));
    assert!(email.contains('.'));

    service.dump().unwrap();
}

#[tokio::test]
async fn issues() {
    let service = replay_service("test_gitlab_data_issues.yaml");
    let project = service
        .get_project("lbarcziova", "testing-repo")
        .unwrap();

    let issue_list = project.get_issue_list().await.unwrap();
    assert!(!issue_list.is_empty());

    let issue_info = project.get_issue_info(1).await.unwrap();
    assert!(issue_info.title.starts_with("My first issue"));
    assert!(issue_info.description.starts_with("This is testing issue"));

    let comments = project.get_issue_comments(2).await.unwrap();
    assert_eq!(comments.len(), 2);
    assert!(comments[0].body.starts_with("Comment"));
    assert_eq!(comments[0].author, "lbarcziova");

    let created = project
        .create_issue("Issue 2", "Description for issue 2")
        .await
        .unwrap();
    assert_eq!(created.title, "Issue 2");
    assert_eq!(created.description, "Description for issue 2");

    let closed = project.close_issue(1).await.unwrap();
    assert_eq!(closed.status, IssueStatus::Closed);

    service.dump().unwrap();
}

#[tokio::test]
async fn pull_requests() {
    let service = replay_service("test_gitlab_data_pull_requests.yaml");
    let project = service
        .get_project("lbarcziova", "testing-repo")
        .unwrap();

    let pr_list = project.list_pull_requests().await.unwrap();
    assert!(!pr_list.is_empty());
    assert_eq!(pr_list.last().unwrap().title, "change");
    assert_eq!(pr_list.last().unwrap().status, PrStatus::Open);

    let commits = project.get_pr_commits(1).await.unwrap();
    assert_eq!(commits.len(), 2);
    assert_eq!(commits[0], "0709030b613d56752725c33df36041c2b7610506");
    assert_eq!(commits[1], "f3881188db863e4e053f5a82422f067ac9ba2594");

    let comments = project.get_pr_comments(1).await.unwrap();
    assert_eq!(
        comments.last().unwrap().body,
        "first comment of mergerequest"
    );
    assert_eq!(comments.last().unwrap().author, "lbarcziova");

    // update flow: identical get_pr_info calls replay successive states
    let pr_info = project.get_pr_info(1).await.unwrap();
    assert_eq!(pr_info.description, "description of mergerequest");
    let original_description = pr_info.description;

    project
        .update_pr_info(1, "changed description")
        .await
        .unwrap();
    let pr_info = project.get_pr_info(1).await.unwrap();
    assert_eq!(pr_info.description, "changed description");

    project
        .update_pr_info(1, &original_description)
        .await
        .unwrap();
    let pr_info = project.get_pr_info(1).await.unwrap();
    assert_eq!(pr_info.description, original_description);

    service.dump().unwrap();
}

#[tokio::test]
async fn tags() {
    let service = replay_service("test_gitlab_data_tags.yaml");
    let project = service
        .get_project("lbarcziova", "testing-repo")
        .unwrap();

    let tags = project.get_tags().await.unwrap();
    assert!(tags.len() >= 2);
    let last = tags.last().unwrap();
    assert_eq!(last.name, "0.1.0");
    assert_eq!(last.commit_sha, "957d267a5b0cd9e615cd081c0eb02397dce1eb73");

    let tag = project.get_tag("0.1.0").await.unwrap();
    assert_eq!(tag.commit_sha, "957d267a5b0cd9e615cd081c0eb02397dce1eb73");

    service.dump().unwrap();
}

#[tokio::test]
async fn releases() {
    let service = replay_service("test_gitlab_data_releases.yaml");
    let project = service
        .get_project("lbarcziova", "testing-repo")
        .unwrap();

    let count_before = project.get_releases().await.unwrap().len();
    let release = project
        .create_release(CreateReleaseRequest {
            name: "test".into(),
            tag_name: "0.2.0".into(),
            description: "testing release".into(),
            git_ref: "master".into(),
        })
        .await
        .unwrap();
    let releases = project.get_releases().await.unwrap();

    assert_eq!(release.tag_name, "0.2.0");
    assert_eq!(release.title, "test");
    assert_eq!(release.body, "testing release");
    assert_eq!(count_before + 1, releases.len());

    let last = releases.last().unwrap();
    assert_eq!(last.title, "test");
    assert_eq!(last.tag_name, "0.1.0");
    assert_eq!(last.body, "testing release");

    service.dump().unwrap();
}

#[tokio::test]
async fn drifted_call_fails_loud() {
    let service = replay_service("test_gitlab_data_tags.yaml");
    let project = service
        .get_project("lbarcziova", "testing-repo")
        .unwrap();

    // branches were never recorded in the tags fixture
    let result = project.get_branches().await;
    match result {
        Err(ForgeError::Fixture(err)) => {
            assert!(err.to_string().contains("gitlab.get_branches()"));
        }
        other => panic!("expected a harness error, got {:?}", other),
    }
}
