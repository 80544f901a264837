//! Integration tests for the JSON API, served over a real listener against
//! the demo backends.

use dirnotify::config::{DirectoryBackend, DirectoryConfig};
use dirnotify::core::{DirectoryProvider, DispatchOutcome, MessagingProvider};
use dirnotify::directory::{DemoDirectory, GraphDirectory};
use dirnotify::dispatch::NotificationDispatcher;
use dirnotify::messaging::DemoMessaging;
use dirnotify::server::{router, AppState};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

fn demo_state() -> AppState {
    let directory: Arc<dyn DirectoryProvider> = Arc::new(DemoDirectory::new());
    let messaging: Arc<dyn MessagingProvider> = Arc::new(DemoMessaging::new());
    AppState {
        dispatcher: Arc::new(NotificationDispatcher::new(
            Arc::clone(&directory),
            Arc::clone(&messaging),
        )),
        directory,
        messaging,
        mode: "demo".to_string(),
    }
}

/// Serves the router on an ephemeral port and returns its address.
async fn serve(state: AppState) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn status_reports_mode_and_timestamp() {
    let addr = serve(demo_state()).await;

    let body: Value = reqwest::get(format!("http://{addr}/api/status"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "running");
    assert_eq!(body["mode"], "demo");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn notify_all_returns_one_outcome_per_resolved_identity() {
    let addr = serve(demo_state()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/api/notify/all"))
        .json(&json!({ "message": "all hands at 15:00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // Demo data: Alice and Bob resolve, Carol has no chat account, the
    // build bot has no email. Only the resolved two produce outcomes.
    let outcomes: Vec<DispatchOutcome> = response.json().await.unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].source, "Alice Johnson");
    assert_eq!(outcomes[1].source, "Bob Smith");
    assert!(outcomes.iter().all(|o| o.success));
}

#[tokio::test]
async fn notify_unknown_group_is_empty_not_an_error() {
    let addr = serve(demo_state()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/api/notify/group"))
        .json(&json!({ "group_id": "unknown-group", "message": "hi" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let outcomes: Vec<DispatchOutcome> = response.json().await.unwrap();
    assert!(outcomes.is_empty());
}

#[tokio::test]
async fn notify_group_dispatches_to_members_only() {
    let addr = serve(demo_state()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/api/notify/group"))
        .json(&json!({ "group_id": "demo-group-eng", "message": "deploy done" }))
        .send()
        .await
        .unwrap();

    let outcomes: Vec<DispatchOutcome> = response.json().await.unwrap();
    let sources: Vec<_> = outcomes.iter().map(|o| o.source.as_str()).collect();
    assert_eq!(sources, vec!["Alice Johnson", "Bob Smith"]);
}

#[tokio::test]
async fn unreachable_directory_maps_to_bad_gateway() {
    // A graph backend pointed at a closed port; messaging stays demo.
    let directory: Arc<dyn DirectoryProvider> = Arc::new(
        GraphDirectory::new(&DirectoryConfig {
            backend: DirectoryBackend::Graph,
            base_url: "http://127.0.0.1:1".to_string(),
            access_token: "unused".to_string(),
            timeout_seconds: 1,
        })
        .unwrap(),
    );
    let messaging: Arc<dyn MessagingProvider> = Arc::new(DemoMessaging::new());
    let state = AppState {
        dispatcher: Arc::new(NotificationDispatcher::new(
            Arc::clone(&directory),
            Arc::clone(&messaging),
        )),
        directory,
        messaging,
        mode: "mixed".to_string(),
    };
    let addr = serve(state).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/api/notify/all"))
        .json(&json!({ "message": "hi" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 502);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("unreachable"));
}

#[tokio::test]
async fn directory_and_messaging_listings_are_exposed() {
    let addr = serve(demo_state()).await;

    let users: Value = reqwest::get(format!("http://{addr}/api/directory/users"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(users.as_array().unwrap().len(), 4);

    let user: Value = reqwest::get(format!("http://{addr}/api/directory/users/demo-user-1"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(user["display_name"], "Alice Johnson");

    let missing = reqwest::get(format!("http://{addr}/api/directory/users/no-such-id"))
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);

    let groups: Value = reqwest::get(format!("http://{addr}/api/directory/groups"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(groups.as_array().unwrap().len(), 2);

    let members: Value = reqwest::get(format!(
        "http://{addr}/api/directory/groups/demo-group-product/members"
    ))
    .await
    .unwrap()
    .json()
    .await
    .unwrap();
    assert_eq!(members.as_array().unwrap().len(), 1);
    assert_eq!(members[0]["display_name"], "Carol White");

    let channels: Value = reqwest::get(format!("http://{addr}/api/messaging/channels"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(channels.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn post_message_returns_the_receipt_in_band() {
    let addr = serve(demo_state()).await;
    let client = reqwest::Client::new();

    let receipt: Value = client
        .post(format!("http://{addr}/api/message"))
        .json(&json!({ "channel": "general", "text": "release notes posted" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(receipt["ok"], true);

    let rejected: Value = client
        .post(format!("http://{addr}/api/message"))
        .json(&json!({ "channel": "no-such-channel", "text": "hi" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(rejected["ok"], false);
    assert_eq!(rejected["error"], "channel_not_found");
}
