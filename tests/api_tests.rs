//! End-to-end API tests over a spawned server, a sqlite-in-memory database,
//! and scripted provider clients.

mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use common::{MockProviderClient, TEST_API_TOKEN, playlist, spawn_app, track};
use sea_orm::EntityTrait;
use serde_json::{Value, json};
use trackshift::models::source_token;
use trackshift::providers::{ProviderRegistry, Source};

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

async fn connect_source(base: &str, source: &str, user_id: &str, app_bundle: &str) {
    let response = client()
        .post(format!("{base}/source/connect?source={source}"))
        .header("Api-Token", TEST_API_TOKEN)
        .json(&json!({
            "user_id": user_id,
            "app_bundle": app_bundle,
            "access_token": "initial-access",
            "refresh_token": "initial-refresh",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 202);
}

fn registry_with(spotify: MockProviderClient, youtube: MockProviderClient) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(spotify));
    registry.register(Arc::new(youtube));
    registry
}

/// Connect a source, then list playlists through a mocked client: the
/// normalized entity comes back in its transport shape.
#[tokio::test]
async fn connect_then_list_playlists() {
    let mut spotify = MockProviderClient::new(Source::Spotify);
    spotify.playlists = vec![playlist(Source::Spotify, "p1", "Road Trip")];
    let registry = registry_with(spotify, MockProviderClient::new(Source::Youtube));

    let (base, _db) = spawn_app(registry).await;
    connect_source(&base, "spotify", "u1", "a1").await;

    let response = client()
        .get(format!("{base}/playlist?user_id=u1&app_bundle=a1"))
        .header("Api-Token", TEST_API_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!([{"id": "p1", "name": "Road Trip", "source": "spotify"}])
    );
}

/// A provider read returning zero items surfaces as a 404-class typed
/// result, not an unhandled crash.
#[tokio::test]
async fn empty_provider_read_maps_to_404() {
    let registry = registry_with(
        MockProviderClient::new(Source::Spotify),
        MockProviderClient::new(Source::Youtube),
    );

    let (base, _db) = spawn_app(registry).await;
    connect_source(&base, "spotify", "u1", "a1").await;

    let response = client()
        .get(format!("{base}/playlist?user_id=u1&app_bundle=a1"))
        .header("Api-Token", TEST_API_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "EMPTY_RESPONSE");
}

/// Listing a capability the provider lacks is a client-correctable 400.
#[tokio::test]
async fn not_supported_read_maps_to_400() {
    let registry = registry_with(
        MockProviderClient::new(Source::Spotify),
        MockProviderClient::new(Source::Youtube).without_albums(),
    );

    let (base, _db) = spawn_app(registry).await;
    connect_source(&base, "youtube", "u1", "a1").await;

    let response = client()
        .get(format!("{base}/album?user_id=u1&app_bundle=a1&source=youtube"))
        .header("Api-Token", TEST_API_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "NOT_SUPPORTED");
}

/// Connecting the same source twice leaves exactly one token row, holding
/// the latest credential.
#[tokio::test]
async fn repeat_connect_keeps_one_row_with_latest_token() {
    let registry = registry_with(
        MockProviderClient::new(Source::Spotify),
        MockProviderClient::new(Source::Youtube),
    );

    let (base, db) = spawn_app(registry).await;
    connect_source(&base, "spotify", "u1", "a1").await;

    let response = client()
        .post(format!("{base}/source/connect?source=spotify"))
        .header("Api-Token", TEST_API_TOKEN)
        .json(&json!({
            "user_id": "u1",
            "app_bundle": "a1",
            "access_token": "second-access",
            "refresh_token": "second-refresh",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 202);

    let rows = source_token::Entity::find().all(&db).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].token_data.contains("second-access"));
}

/// Full playlist transfer through the transport: the create endpoint
/// answers `queued` immediately, and the detached run drives the row to
/// `finished` with a result naming the created playlist.
#[tokio::test]
async fn playlist_transfer_end_to_end() {
    let mut spotify = MockProviderClient::new(Source::Spotify);
    spotify.playlist_tracks.insert(
        "p1".to_string(),
        vec![
            track(Source::Spotify, "t1", "Song A", "Art1"),
            track(Source::Spotify, "t2", "Song B", "Art2"),
        ],
    );

    let mut youtube = MockProviderClient::new(Source::Youtube);
    youtube.created_playlist = Some(playlist(Source::Youtube, "np1", "Transferred"));
    youtube.search_results = HashMap::from([
        (("Song A".to_string(), "Art1".to_string()), "a1".to_string()),
        (("Song B".to_string(), "Art2".to_string()), "b1".to_string()),
    ]);

    let registry = registry_with(spotify, youtube);
    let (base, _db) = spawn_app(registry).await;
    connect_source(&base, "spotify", "u1", "a1").await;
    connect_source(&base, "youtube", "u1", "a1").await;

    let response = client()
        .post(format!("{base}/playlist"))
        .header("Api-Token", TEST_API_TOKEN)
        .json(&json!({
            "user_id": "u1",
            "app_bundle": "a1",
            "from_source": "spotify",
            "to_source": "youtube",
            "playlist_id": "p1",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let created: Value = response.json().await.unwrap();
    assert_eq!(created["status"], "queued");
    assert_eq!(created["user_id"], "u1");
    assert_eq!(created["app_bundle"], "a1");
    let transfer_id = created["id"].as_str().unwrap().to_string();

    // Poll the handle until the detached run completes
    let mut last_status = String::new();
    for _ in 0..50 {
        let polled: Value = client()
            .get(format!("{base}/{transfer_id}"))
            .header("Api-Token", TEST_API_TOKEN)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        last_status = polled["status"].as_str().unwrap_or_default().to_string();
        if last_status == "finished" {
            assert!(polled["result"].as_str().unwrap().contains("np1"));
            assert!(polled.get("error").is_none() || polled["error"].is_null());
            return;
        }
        if last_status == "failed" {
            panic!("transfer failed: {:?}", polled["error"]);
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("transfer did not finish, last status: {last_status}");
}

/// A failed run is observable through the poll endpoint with its captured
/// error text.
#[tokio::test]
async fn failed_transfer_is_observable_via_poll() {
    // Destination cannot resolve any track search, so the run aborts
    let mut spotify = MockProviderClient::new(Source::Spotify);
    spotify.playlist_tracks.insert(
        "p1".to_string(),
        vec![track(Source::Spotify, "t1", "Song A", "Art1")],
    );
    let mut youtube = MockProviderClient::new(Source::Youtube);
    youtube.created_playlist = Some(playlist(Source::Youtube, "np1", "Transferred"));

    let registry = registry_with(spotify, youtube);
    let (base, _db) = spawn_app(registry).await;
    connect_source(&base, "spotify", "u1", "a1").await;
    connect_source(&base, "youtube", "u1", "a1").await;

    let created: Value = client()
        .post(format!("{base}/playlist"))
        .header("Api-Token", TEST_API_TOKEN)
        .json(&json!({
            "user_id": "u1",
            "app_bundle": "a1",
            "from_source": "spotify",
            "to_source": "youtube",
            "playlist_id": "p1",
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let transfer_id = created["id"].as_str().unwrap().to_string();

    for _ in 0..50 {
        let polled: Value = client()
            .get(format!("{base}/{transfer_id}"))
            .header("Api-Token", TEST_API_TOKEN)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if polled["status"] == "failed" {
            assert!(polled["error"].as_str().unwrap().contains("no items"));
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("transfer never reached failed status");
}

#[tokio::test]
async fn unknown_transfer_id_is_404() {
    let registry = registry_with(
        MockProviderClient::new(Source::Spotify),
        MockProviderClient::new(Source::Youtube),
    );
    let (base, _db) = spawn_app(registry).await;

    let response = client()
        .get(format!("{base}/{}", uuid::Uuid::new_v4()))
        .header("Api-Token", TEST_API_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn missing_api_token_is_rejected() {
    let registry = registry_with(
        MockProviderClient::new(Source::Spotify),
        MockProviderClient::new(Source::Youtube),
    );
    let (base, _db) = spawn_app(registry).await;

    let response = client()
        .get(format!("{base}/playlist?user_id=u1&app_bundle=a1"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let response = client()
        .get(format!("{base}/playlist?user_id=u1&app_bundle=a1"))
        .header("Api-Token", "wrong-token")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

/// Listing against a source the user never connected is a 400 with the
/// dedicated code.
#[tokio::test]
async fn listing_unconnected_source_is_400() {
    let registry = registry_with(
        MockProviderClient::new(Source::Spotify),
        MockProviderClient::new(Source::Youtube),
    );
    let (base, _db) = spawn_app(registry).await;

    let response = client()
        .get(format!("{base}/playlist?user_id=u1&app_bundle=a1"))
        .header("Api-Token", TEST_API_TOKEN)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "SOURCE_NOT_CONNECTED");
}
