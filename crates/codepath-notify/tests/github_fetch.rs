//! Files listing against a local stand-in for the GitHub API.

#![allow(clippy::unwrap_used)]

mod common;

use std::time::Duration;

use codepath_notify::config::{GitHubConfig, Secret};
use codepath_notify::{ChangeSource, FetchError, GitHubClient, PullRequest, Repository};
use common::{HttpStub, files_page};
use url::Url;

fn client(stub: &HttpStub) -> GitHubClient {
    GitHubClient::new(&GitHubConfig {
        api_url: Url::parse(&stub.url).unwrap(),
        token: Secret::new("ghs_test"),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

fn pull_request() -> PullRequest {
    PullRequest::new(
        Repository::parse("prebid/Prebid.js").unwrap(),
        12,
        &Url::parse("https://github.com").unwrap(),
    )
}

#[tokio::test]
async fn single_page_listing() {
    let stub = HttpStub::serve(vec![(200, files_page(&["src/adapters/foo.js", "README.md"]))]);

    let files = client(&stub).changed_files(&pull_request()).await.unwrap();
    assert_eq!(files, ["src/adapters/foo.js", "README.md"]);

    let requests = stub.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert!(
        request
            .request_line
            .starts_with("GET /repos/prebid/Prebid.js/pulls/12/files?"),
        "{}",
        request.request_line
    );
    assert!(request.request_line.contains("per_page=100"));
    assert!(request.request_line.contains("page=1"));
    assert_eq!(request.header("authorization"), Some("Bearer ghs_test"));
    assert_eq!(request.header("accept"), Some("application/vnd.github+json"));
    assert!(request.header("user-agent").unwrap().starts_with("codepath-notify/"));
}

#[tokio::test]
async fn follows_pages_until_a_short_one() {
    let first: Vec<String> = (0..100).map(|i| format!("modules/m{i}.js")).collect();
    let stub = HttpStub::serve(vec![
        (200, files_page(&first)),
        (200, files_page(&["modules/last.js"])),
    ]);

    let files = client(&stub).changed_files(&pull_request()).await.unwrap();
    assert_eq!(files.len(), 101);
    assert_eq!(files[0], "modules/m0.js");
    assert_eq!(files[100], "modules/last.js");

    let requests = stub.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[1].request_line.contains("&page=2"));
}

#[tokio::test]
async fn full_last_page_is_followed_by_an_empty_one() {
    let first: Vec<String> = (0..100).map(|i| format!("f{i}")).collect();
    let stub = HttpStub::serve(vec![(200, files_page(&first)), (200, "[]".to_string())]);

    let files = client(&stub).changed_files(&pull_request()).await.unwrap();
    assert_eq!(files.len(), 100);
    assert_eq!(stub.requests().len(), 2);
}

#[tokio::test]
async fn not_found_is_a_status_error() {
    let stub = HttpStub::serve(vec![(404, r#"{"message":"Not Found"}"#.to_string())]);

    let err = client(&stub).changed_files(&pull_request()).await.unwrap_err();
    match err {
        FetchError::Status { status, body } => {
            assert_eq!(status, 404);
            assert!(body.contains("Not Found"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn unexpected_body_is_a_decode_error() {
    let stub = HttpStub::serve(vec![(200, r#"{"files":[]}"#.to_string())]);

    let err = client(&stub).changed_files(&pull_request()).await.unwrap_err();
    assert!(matches!(err, FetchError::Decode(_)));
}
