//! HTTP API integration tests
//!
//! Every request goes through `build_router` with `tower::ServiceExt::oneshot`
//! against an in-memory database.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use http_body_util::BodyExt;
use lv_api::{build_router, AppState};
use lv_common::config::AppConfig;
use lv_common::db::{init_memory_database, songs};
use lv_common::{LooseNumber, SongDraft};
use lv_ingest::Crawler;
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "test-secret";

async fn test_app_state() -> AppState {
    test_app_state_with(|_| {}).await
}

async fn test_app_state_with(adjust: impl FnOnce(&mut AppConfig)) -> AppState {
    let pool = init_memory_database().await.unwrap();
    let mut config = AppConfig::default();
    // Nothing listens on the discard port; a started crawl fails fast
    config.crawl.catalog_url = "http://127.0.0.1:9/songs".to_string();
    config.crawl.request_timeout_secs = 2;
    config.schedule.enabled = false;
    config.auth.password_hash_cost = 4;
    adjust(&mut config);

    let crawler = Crawler::from_config(&config, pool.clone()).unwrap();
    AppState::new(pool, crawler, config, SECRET.to_string())
}

fn draft(name: &str, movie: &str, year: i64) -> SongDraft {
    SongDraft {
        song_name: name.to_string(),
        url: format!("https://site.test/dl/{}.mp3", name.to_lowercase().replace(' ', "-")),
        movie: Some(movie.to_string()),
        year: Some(LooseNumber::Number(year)),
        ..Default::default()
    }
}

async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
    let response = build_router(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn get(state: &AppState, uri: &str) -> (StatusCode, Value) {
    send(state, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

async fn post_json(state: &AppState, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    send(state, builder.body(Body::from(body.to_string())).unwrap()).await
}

async fn authed(state: &AppState, method: Method, uri: &str, token: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    send(state, request).await
}

/// Register `email` and return (user id, token)
async fn register(state: &AppState, email: &str) -> (String, String) {
    let (status, body) = post_json(
        state,
        "/register",
        None,
        json!({ "email": email, "password": "hunter2" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    (
        body["userId"].as_str().unwrap().to_string(),
        body["token"].as_str().unwrap().to_string(),
    )
}

async fn first_song_id(state: &AppState, query: &str) -> String {
    let (_, body) = get(state, &format!("/api/search-songs?q={}", query)).await;
    body[0]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let state = test_app_state().await;
    let (status, body) = get(&state, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "lv-api");
}

#[tokio::test]
async fn test_list_songs_paginates_newest_year_first() {
    let state = test_app_state().await;
    let drafts: Vec<SongDraft> = (0..25)
        .map(|i| draft(&format!("Song {}", i), "Movie", 1990 + i))
        .collect();
    songs::insert_songs(&state.db, &drafts).await.unwrap();

    let (status, body) = get(&state, "/api/songs?page=1&limit=10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalCount"], 25);
    assert_eq!(body["currentPage"], 1);
    assert_eq!(body["totalPages"], 3);
    assert_eq!(body["data"].as_array().unwrap().len(), 10);
    assert_eq!(body["data"][0]["year"], 2014);
    assert_eq!(body["data"][0]["songName"], "Song 24");

    let (_, last) = get(&state, "/api/songs?page=3&limit=10").await;
    assert_eq!(last["data"].as_array().unwrap().len(), 5);
    assert_eq!(last["data"][4]["year"], 1990);
}

#[tokio::test]
async fn test_list_songs_defaults_and_keyword() {
    let state = test_app_state().await;
    songs::insert_songs(
        &state.db,
        &[
            draft("Selfie Pulla", "Kaththi", 2014),
            draft("Aathi", "Kaththi", 2014),
            draft("Eena Meena", "Theri", 2016),
        ],
    )
    .await
    .unwrap();

    let (_, all) = get(&state, "/api/songs").await;
    assert_eq!(all["totalCount"], 3);
    assert_eq!(all["currentPage"], 1);
    assert_eq!(all["totalPages"], 1);

    let (status, filtered) = get(&state, "/api/songs?keyword=kaththi").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(filtered["totalCount"], 2);
}

#[tokio::test]
async fn test_search_songs() {
    let state = test_app_state().await;
    let mut with_cast = draft("Selfie Pulla", "Kaththi", 2014);
    with_cast.cast_and_crew = Some(vec!["Vijay".to_string(), "Samantha".to_string()]);
    songs::insert_songs(&state.db, &[with_cast, draft("Eena Meena", "Theri", 2016)])
        .await
        .unwrap();

    let (status, body) = get(&state, "/api/search-songs?q=SELFIE").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["movie"], "Kaththi");

    // Cast matches whole names only
    let (status, _) = get(&state, "/api/search-songs?q=Vijay").await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = get(&state, "/api/search-songs?q=Vij").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, _) = get(&state, "/api/search-songs").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_movie_names_are_distinct() {
    let state = test_app_state().await;
    songs::insert_songs(
        &state.db,
        &[
            draft("Selfie Pulla", "Kaththi", 2014),
            draft("Aathi", "Kaththi", 2014),
            draft("Eena Meena", "Theri", 2016),
        ],
    )
    .await
    .unwrap();

    let (status, body) = get(&state, "/api/getMovieNames").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["Kaththi", "Theri"]));
}

#[tokio::test]
async fn test_register_and_login() {
    let state = test_app_state().await;
    let (user_id, _) = register(&state, "fan@example.com").await;

    let (status, _) = post_json(
        &state,
        "/register",
        None,
        json!({ "email": "fan@example.com", "password": "other" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = post_json(
        &state,
        "/register",
        None,
        json!({ "email": "not-an-email", "password": "pw" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post_json(
        &state,
        "/login",
        None,
        json!({ "email": "fan@example.com", "password": "wrong" }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password!");

    let (status, body) = post_json(
        &state,
        "/login",
        None,
        json!({ "email": "fan@example.com", "password": "hunter2" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userId"], user_id);
    assert!(body["token"].as_str().unwrap().starts_with(&user_id));
}

#[tokio::test]
async fn test_liked_songs_lifecycle() {
    let state = test_app_state().await;
    songs::insert_songs(&state.db, &[draft("Selfie Pulla", "Kaththi", 2014)])
        .await
        .unwrap();
    let song_id = first_song_id(&state, "selfie").await;
    let (user_id, token) = register(&state, "fan@example.com").await;
    let likes_uri = format!("/users/{}/liked-songs", user_id);

    let (status, body) = post_json(&state, &likes_uri, Some(&token), json!({ "songId": song_id })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["likedSong"]["song"]["id"], song_id);

    // Idempotent
    let (status, _) = post_json(&state, &likes_uri, Some(&token), json!({ "songId": song_id })).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = authed(&state, Method::GET, &likes_uri, &token).await;
    assert_eq!(status, StatusCode::OK);
    let liked = body["likedSongs"].as_array().unwrap();
    assert_eq!(liked.len(), 1);
    assert_eq!(liked[0]["song"]["songName"], "Selfie Pulla");

    let remove_uri = format!("/users/{}/remove-liked-song/{}", user_id, song_id);
    let (status, _) = authed(&state, Method::POST, &remove_uri, &token).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = authed(&state, Method::POST, &remove_uri, &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The song itself stays
    let (_, all) = get(&state, "/api/songs").await;
    assert_eq!(all["totalCount"], 1);
}

#[tokio::test]
async fn test_liked_songs_not_found_and_bad_ids() {
    let state = test_app_state().await;
    let (user_id, token) = register(&state, "fan@example.com").await;
    let likes_uri = format!("/users/{}/liked-songs", user_id);

    let (status, body) = post_json(
        &state,
        &likes_uri,
        Some(&token),
        json!({ "songId": Uuid::new_v4().to_string() }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Song not found");

    let (status, _) = post_json(&state, &likes_uri, Some(&token), json!({ "songId": "nope" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_liked_songs_require_matching_token() {
    let state = test_app_state().await;
    let (user_id, _) = register(&state, "fan@example.com").await;
    let (_, other_token) = register(&state, "other@example.com").await;
    let likes_uri = format!("/users/{}/liked-songs", user_id);

    let (status, body) = get(&state, &likes_uri).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Please login to continue.");

    let (status, _) = authed(&state, Method::GET, &likes_uri, "garbage").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = authed(&state, Method::GET, &likes_uri, &other_token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Expired token
    let id = Uuid::parse_str(&user_id).unwrap();
    let expired = lv_common::auth::issue_token(id, SECRET, 0, 1000);
    let (status, _) = authed(&state, Method::GET, &likes_uri, &expired).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_delete_song_cascades_to_likes() {
    let state = test_app_state().await;
    songs::insert_songs(&state.db, &[draft("Selfie Pulla", "Kaththi", 2014)])
        .await
        .unwrap();
    let song_id = first_song_id(&state, "selfie").await;
    let (user_id, token) = register(&state, "fan@example.com").await;
    let likes_uri = format!("/users/{}/liked-songs", user_id);
    post_json(&state, &likes_uri, Some(&token), json!({ "songId": song_id })).await;

    let song_uri = format!("/api/songs/{}", song_id);
    let (status, _) = send(
        &state,
        Request::builder()
            .method(Method::DELETE)
            .uri(&song_uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = authed(&state, Method::DELETE, &song_uri, &token).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (_, body) = authed(&state, Method::GET, &likes_uri, &token).await;
    assert!(body["likedSongs"].as_array().unwrap().is_empty());

    let (status, _) = authed(&state, Method::DELETE, &song_uri, &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_check_and_remove_duplicates() {
    let state = test_app_state().await;
    let mut copy = draft("Selfie Pulla", "Kaththi", 2014);
    copy.url = "https://mirror.test/selfie.mp3".to_string();
    songs::insert_songs(
        &state.db,
        &[draft("Selfie Pulla", "Kaththi", 2014), copy, draft("Aathi", "Kaththi", 2014)],
    )
    .await
    .unwrap();

    let (status, body) = get(&state, "/checkAndRemoveDuplicates").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_removed"], 1);
    assert_eq!(body["groups"][0]["key"], "songName");
    assert_eq!(body["groups"][0]["value"], "Selfie Pulla");

    let (_, all) = get(&state, "/api/songs").await;
    assert_eq!(all["totalCount"], 2);
}

#[tokio::test]
async fn test_crawl_conflicts_while_running() {
    let state = test_app_state().await;
    let claim = state.crawler.begin().unwrap();

    let (status, body) = post_json(&state, "/api/crawl", None, json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    let (_, status_body) = get(&state, "/api/crawl/status").await;
    assert_eq!(status_body["running"], true);
    assert_eq!(status_body["phase"], "listing_years");

    drop(claim);
    let (_, status_body) = get(&state, "/api/crawl/status").await;
    assert_eq!(status_body["phase"], "idle");
    assert_eq!(status_body["lastReport"], Value::Null);
}

#[tokio::test]
async fn test_crawl_runs_in_background_and_reports() {
    let state = test_app_state().await;

    let (status, _) = post_json(&state, "/api/crawl", None, json!({})).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let mut report = Value::Null;
    for _ in 0..100 {
        let (_, body) = get(&state, "/api/crawl/status").await;
        if !body["lastReport"].is_null() {
            report = body["lastReport"].clone();
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    // The catalog root is unreachable: one fetch failure, nothing stored
    assert_eq!(report["fetch_failures"], 1);
    assert_eq!(report["records_inserted"], 0);
}

#[tokio::test]
async fn test_oversized_token_ttl_still_authenticates() {
    let state = test_app_state_with(|config| config.auth.token_ttl_hours = u64::MAX).await;
    let (user_id, token) = register(&state, "fan@example.com").await;

    let likes_uri = format!("/users/{}/liked-songs", user_id);
    let (status, body) = authed(&state, Method::GET, &likes_uri, &token).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
}
