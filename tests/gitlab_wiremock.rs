//! HTTP-level integration tests for the GitLab backend and the harness.
//!
//! A wiremock server stands in for a GitLab instance. The capture pass
//! exercises the real REST client (URL encoding, header handling, error
//! mapping) and records outcomes; the server is then shut down and the
//! replay pass serves the identical responses with no network at all.

use serde_json::json;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use forgery::forge::gitlab::{GitLabConfig, GitLabService};
use forgery::forge::{ForgeError, Project, Service};
use forgery::replay::{Credentials, Mode, ReplayContext, ReplayService};

fn write_creds() -> Credentials {
    Credentials::new("GITLAB", Some("some_token".into()), Some("someone".into()))
}

fn read_creds() -> Credentials {
    Credentials::new("GITLAB", None, None)
}

async fn gitlab_instance() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/api/v4/projects/.+/repository/tags$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "name": "0.2.0",
                "commit": {"id": "2020561bc0ef52c44ad8a7b9747e7e5e5d263551"}
            },
            {
                "name": "0.1.0",
                "commit": {"id": "957d267a5b0cd9e615cd081c0eb02397dce1eb73"}
            }
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/api/v4/projects/.+/repository/files/README\.md/raw$"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("This is new README for testing-repo"),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(
            r"^/api/v4/projects/.+/repository/files/\.blablabla_nonexisting_file/raw$",
        ))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"message": "404 File Not Found"})),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/api/v4/projects/.+/issues/1$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "iid": 1,
            "title": "My first issue",
            "description": "This is testing issue",
            "state": "opened",
            "author": {"username": "lbarcziova"},
            "created_at": "2019-03-18T12:00:00.000Z"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/api/v4/user$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "username": "someone",
            "email": "someone@example.com"
        })))
        .mount(&server)
        .await;

    server
}

fn service_for(server: &MockServer) -> GitLabService {
    GitLabService::new(GitLabConfig {
        instance_url: server.uri().parse().unwrap(),
        token: "some_token".into(),
    })
    .unwrap()
}

#[tokio::test]
async fn capture_against_live_api_then_replay_offline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test_gitlab_data_live.yaml");

    let server = gitlab_instance().await;

    // -- capture pass, talking HTTP to the mock instance
    let ctx = ReplayContext::open(&path, &write_creds()).unwrap();
    assert_eq!(ctx.mode(), Mode::Write);

    let live = service_for(&server);
    let service = ReplayService::wrap("gitlab", ctx, Some(Box::new(live))).unwrap();
    let project = service
        .get_project("lbarcziova", "testing-repo")
        .unwrap();

    let tags = project.get_tags().await.unwrap();
    assert_eq!(tags.len(), 2);
    assert_eq!(tags[1].name, "0.1.0");
    assert_eq!(
        tags[1].commit_sha,
        "957d267a5b0cd9e615cd081c0eb02397dce1eb73"
    );

    let readme = project.get_file_content("README.md").await.unwrap();
    assert!(readme.contains("This is new README"));

    let missing = project
        .get_file_content(".blablabla_nonexisting_file")
        .await
        .unwrap_err();
    assert!(matches!(missing, ForgeError::FileNotFound(_)));

    let issue = project.get_issue_info(1).await.unwrap();
    assert!(issue.title.starts_with("My first issue"));
    assert!(issue.description.starts_with("This is testing issue"));

    let user = service.get_user().await.unwrap();
    assert_eq!(user.username, "someone");

    service.dump().unwrap();

    // the forge disappears entirely before the replay pass
    drop(server);

    // -- replay pass, no credentials, no network
    let ctx = ReplayContext::open(&path, &read_creds()).unwrap();
    assert_eq!(ctx.mode(), Mode::Read);

    let service = ReplayService::wrap("gitlab", ctx, None).unwrap();
    let project = service
        .get_project("lbarcziova", "testing-repo")
        .unwrap();

    assert_eq!(project.get_tags().await.unwrap(), tags);
    assert_eq!(project.get_file_content("README.md").await.unwrap(), readme);

    let replayed_missing = project
        .get_file_content(".blablabla_nonexisting_file")
        .await
        .unwrap_err();
    assert!(matches!(replayed_missing, ForgeError::FileNotFound(_)));
    assert_eq!(replayed_missing.to_string(), missing.to_string());

    assert_eq!(project.get_issue_info(1).await.unwrap(), issue);
    assert_eq!(service.get_user().await.unwrap(), user);

    service.dump().unwrap();
}

#[tokio::test]
async fn api_error_mapping_survives_capture() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test_gitlab_data_apierr.yaml");

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/v4/projects/.+/issues$"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"message": "Internal Server Error"})),
        )
        .mount(&server)
        .await;

    let ctx = ReplayContext::open(&path, &write_creds()).unwrap();
    let service = ReplayService::wrap("gitlab", ctx, Some(Box::new(service_for(&server)))).unwrap();
    let project = service.get_project("owner", "repo").unwrap();

    let live_err = project.get_issue_list().await.unwrap_err();
    match &live_err {
        ForgeError::ApiError { status, message } => {
            assert_eq!(*status, 500);
            assert!(message.contains("Internal Server Error"));
        }
        other => panic!("expected ApiError, got {:?}", other),
    }
    service.dump().unwrap();
    drop(server);

    let ctx = ReplayContext::open(&path, &read_creds()).unwrap();
    let service = ReplayService::wrap("gitlab", ctx, None).unwrap();
    let project = service.get_project("owner", "repo").unwrap();

    let replayed = project.get_issue_list().await.unwrap_err();
    assert_eq!(replayed.to_string(), live_err.to_string());
}

#[tokio::test]
async fn unauthorized_maps_to_auth_failed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/api/v4/user$"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "invalid_token"})))
        .mount(&server)
        .await;

    let service = service_for(&server);
    let result = service.get_user().await;
    assert!(matches!(result, Err(ForgeError::AuthFailed(_))));
}

#[tokio::test]
async fn project_listing_endpoints_parse() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/api/v4/projects/.+/repository/branches$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "master"},
            {"name": "change"}
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/api/v4/projects/.+/merge_requests/1/commits$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "f3881188db863e4e053f5a82422f067ac9ba2594"},
            {"id": "0709030b613d56752725c33df36041c2b7610506"}
        ])))
        .mount(&server)
        .await;

    let service = service_for(&server);
    let project = service.get_project("owner", "repo").unwrap();

    let branches = project.get_branches().await.unwrap();
    assert_eq!(branches, vec!["master".to_string(), "change".to_string()]);

    // the API reports newest first; the facade returns oldest first
    let commits = project.get_pr_commits(1).await.unwrap();
    assert_eq!(commits[0], "0709030b613d56752725c33df36041c2b7610506");
    assert_eq!(commits[1], "f3881188db863e4e053f5a82422f067ac9ba2594");
}
