//! End-to-end refresh recovery tests against a WireMock server.
//!
//! These drive the full pipeline (decorate, send, recover, replay) and verify
//! the single-flight property through `.expect(n)` on the refresh endpoint.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use refresh_gate::{AuthClient, AuthError, MemoryStorage};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn storage_with(pair: Option<(&str, &str)>) -> Arc<MemoryStorage> {
    let storage = Arc::new(MemoryStorage::new());
    if let Some((access, refresh)) = pair {
        use refresh_gate::Storage;
        storage.store("access_token", access);
        storage.store("refresh_token", refresh);
    }
    storage
}

fn client_with(server: &MockServer, pair: Option<(&str, &str)>) -> AuthClient {
    AuthClient::builder()
        .base_url(server.uri())
        .storage(storage_with(pair))
        .build()
        .unwrap()
}

/// Mount the refresh endpoint: POST {"refresh": R1} -> {access, refresh}.
async fn mount_refresh(server: &MockServer, response: serde_json::Value, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/api/user/refresh/"))
        .and(body_json(serde_json::json!({"refresh": "R1"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(response)
                .set_delay(Duration::from_millis(100)),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_success_passes_through_without_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/songs/"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"id": 1, "title": "Intro"}
        ])))
        .mount(&server)
        .await;

    let client = client_with(&server, Some(("A1", "R1")));
    let response = client.get("/api/songs/").await.unwrap();

    assert_eq!(response.status(), 200);
    let songs: serde_json::Value = response.json().unwrap();
    assert_eq!(songs[0]["title"], "Intro");
}

#[tokio::test]
async fn test_post_carries_bearer_and_json_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/playlists/"))
        .and(header("authorization", "Bearer A1"))
        .and(body_json(serde_json::json!({"name": "Road Trip"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"id": 3})))
        .mount(&server)
        .await;

    let client = client_with(&server, Some(("A1", "R1")));
    let response = client
        .post("/api/playlists/", &serde_json::json!({"name": "Road Trip"}))
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
}

#[tokio::test]
async fn test_concurrent_401s_share_one_refresh_and_replay() {
    let server = MockServer::start().await;

    // The stale token is rejected everywhere.
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/songs/"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/playlists/"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    mount_refresh(
        &server,
        serde_json::json!({"access": "A2", "refresh": "R2"}),
        1,
    )
    .await;

    let client = client_with(&server, Some(("A1", "R1")));
    let (songs, playlists) = futures::join!(
        client.get("/api/songs/"),
        client.get("/api/playlists/")
    );

    assert_eq!(songs.unwrap().status(), 200);
    assert_eq!(playlists.unwrap().status(), 200);

    // The pair rotated to the refreshed values.
    assert_eq!(client.store().access().unwrap().as_str(), "A2");
    assert_eq!(client.store().refresh_token().unwrap().as_str(), "R2");

    // Both replays carried the fresh token.
    let replays = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|req| {
            req.headers
                .get("authorization")
                .is_some_and(|v| v == "Bearer A2")
        })
        .count();
    assert_eq!(replays, 2);
}

#[tokio::test]
async fn test_missing_refresh_token_propagates_401_without_refresh_call() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/profile/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/user/refresh/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let fired = Arc::new(AtomicU32::new(0));
    let sink_fired = Arc::clone(&fired);
    let client = AuthClient::builder()
        .base_url(server.uri())
        .storage(storage_with(None))
        .on_refresh_failure(move || {
            sink_fired.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();

    let err = client.get("/api/profile/").await.unwrap_err();
    assert_eq!(err.response().unwrap().status(), 401);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert!(client.store().access().is_none());
}

#[tokio::test]
async fn test_refresh_500_clears_store_and_releases_all_waiters() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/user/refresh/"))
        .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_millis(100)))
        .expect(1)
        .mount(&server)
        .await;

    let fired = Arc::new(AtomicU32::new(0));
    let sink_fired = Arc::clone(&fired);
    let client = AuthClient::builder()
        .base_url(server.uri())
        .storage(storage_with(Some(("A1", "R1"))))
        .on_refresh_failure(move || {
            sink_fired.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();

    let (x, y) = futures::join!(
        client.get("/api/songs/"),
        client.get("/api/playlists/")
    );

    // Each caller gets its own original 401 back.
    assert_eq!(x.unwrap_err().response().unwrap().status(), 401);
    assert_eq!(y.unwrap_err().response().unwrap().status(), 401);

    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert!(client.store().access().is_none());
    assert!(client.store().refresh_token().is_none());
}

#[tokio::test]
async fn test_exempt_request_is_sent_bare_and_never_recovered() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/user/login/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/user/refresh/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_with(&server, Some(("A1", "R1")));
    let err = client
        .post_exempt(
            "/api/user/login/",
            &serde_json::json!({"username": "u", "password": "p"}),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Authorization(_)));

    // No credential was attached to the exempt call.
    let login_requests: Vec<_> = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|req| req.url.path() == "/api/user/login/")
        .collect();
    assert_eq!(login_requests.len(), 1);
    assert!(login_requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_get_exempt_is_sent_bare_while_logged_in() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/charts/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let client = client_with(&server, Some(("A1", "R1")));
    let response = client.get_exempt("/api/charts/").await.unwrap();
    assert_eq!(response.status(), 200);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_second_401_on_replay_surfaces_without_second_refresh() {
    let server = MockServer::start().await;

    // Even the fresh token is rejected.
    Mock::given(method("GET"))
        .and(path("/api/songs/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    mount_refresh(
        &server,
        serde_json::json!({"access": "A2", "refresh": "R2"}),
        1,
    )
    .await;

    let client = client_with(&server, Some(("A1", "R1")));
    let err = client.get("/api/songs/").await.unwrap_err();
    assert!(matches!(err, AuthError::Authorization(_)));

    // One original call plus exactly one replay hit the endpoint.
    let hits = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|req| req.url.path() == "/api/songs/")
        .count();
    assert_eq!(hits, 2);
}

#[tokio::test]
async fn test_403_is_returned_to_caller_without_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/playlists/9/"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/user/refresh/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_with(&server, Some(("A1", "R1")));
    let response = client.get("/api/playlists/9/").await.unwrap();
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn test_logged_out_request_goes_unauthenticated() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/songs/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;

    let client = client_with(&server, None);
    let response = client.get("/api/songs/").await.unwrap();
    assert_eq!(response.status(), 200);

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}
