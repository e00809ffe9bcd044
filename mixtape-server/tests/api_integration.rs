//! Integration tests for the mixtape-server HTTP API
//!
//! Requests go through the full router with `tower::ServiceExt::oneshot`.

mod helpers;

use std::path::Path;
use std::time::Duration;

use axum::body::Body;
use axum::Router;
use http::{header, Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use helpers::audio_generator::generate_sine_wav;
use mixtape_server::config::ServiceConfig;
use mixtape_server::{build_router, AppState};

/// Test helper to create a router rooted at a fresh data folder
fn setup_test_server() -> (Router, ServiceConfig, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = ServiceConfig::with_data_folder(dir.path());
    config.ensure_directories().expect("Failed to create directories");
    let router = build_router(AppState::new(config.clone()));
    (router, config, dir)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, http::HeaderMap, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, headers, body)
}

async fn make_request(
    app: &Router,
    method: Method,
    path: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(path);
    let request = match body {
        Some(json_body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json_body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let (status, _, bytes) = send(app, request).await;
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// Poll a job until it reaches a terminal status
async fn wait_for_job(app: &Router, job_id: &str) -> Value {
    for _ in 0..200 {
        let (status, job) = make_request(app, Method::GET, &format!("/job/{}", job_id), None).await;
        assert_eq!(status, StatusCode::OK);
        if job["status"] == "completed" || job["status"] == "failed" {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("job {} did not finish", job_id);
}

fn write_tracks(config: &ServiceConfig, prefix: &str, tracks: &[(&str, u64)]) {
    let folder = config.prefix_dir(prefix);
    std::fs::create_dir_all(&folder).unwrap();
    for (name, duration_ms) in tracks {
        generate_sine_wav(folder.join(name), *duration_ms, 440.0, 0.5).unwrap();
    }
}

#[tokio::test]
async fn test_health_check() {
    let (app, _config, _dir) = setup_test_server();
    let (status, body) = make_request(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "mixtape-server");
    assert_eq!(body["jobs"], 0);
    assert_eq!(body["running_jobs"], 0);
}

#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let (app, _config, _dir) = setup_test_server();

    let unknown = uuid::Uuid::new_v4().simple().to_string();
    let (status, body) = make_request(&app, Method::GET, &format!("/job/{}", unknown), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, _) = make_request(&app, Method::GET, "/job/not-a-token", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_track() {
    let (app, config, _dir) = setup_test_server();

    let boundary = "mixtapeboundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"../track one.mp3\"\r\n\
         Content-Type: audio/mpeg\r\n\r\nfake-bytes\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"job_prefix\"\r\n\r\ngig\r\n\
         --{b}--\r\n",
        b = boundary
    );
    let request = Request::builder()
        .method(Method::POST)
        .uri("/upload-track")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
        .body(Body::from(body))
        .unwrap();

    let (status, _, bytes) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);

    let value: Value = serde_json::from_slice(&bytes).unwrap();
    let stored = config.prefix_dir("gig").join("track one.mp3");
    assert_eq!(value["uploaded"], stored.display().to_string());
    assert_eq!(std::fs::read(&stored).unwrap(), b"fake-bytes");
}

fn multipart_request(boundary: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/upload-track")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
        .body(Body::from(body))
        .unwrap()
}

fn staged_leftovers(config: &ServiceConfig) -> Vec<String> {
    std::fs::read_dir(&config.upload_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".partial"))
        .collect()
}

#[tokio::test]
async fn test_large_upload_streams_to_disk() {
    let (app, config, _dir) = setup_test_server();

    // Several megabytes so the body spans many chunks; prefix arrives last
    let payload: Vec<u8> = (0..3 * 1024 * 1024).map(|i| (i % 251) as u8).collect();
    let boundary = "mixtapeboundary";
    let mut body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"long set.wav\"\r\n\
         Content-Type: audio/wav\r\n\r\n",
        b = boundary
    )
    .into_bytes();
    body.extend_from_slice(&payload);
    body.extend_from_slice(
        format!(
            "\r\n--{b}\r\nContent-Disposition: form-data; name=\"job_prefix\"\r\n\r\n\
             big\r\n--{b}--\r\n",
            b = boundary
        )
        .as_bytes(),
    );

    let (status, _, _) = send(&app, multipart_request(boundary, body)).await;
    assert_eq!(status, StatusCode::OK);

    let stored = std::fs::read(config.prefix_dir("big").join("long set.wav")).unwrap();
    assert_eq!(stored.len(), payload.len());
    assert!(stored == payload);
    assert!(staged_leftovers(&config).is_empty());
}

#[tokio::test]
async fn test_rejected_upload_leaves_no_staged_file() {
    let (app, config, _dir) = setup_test_server();

    let boundary = "mixtapeboundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.mp3\"\r\n\
         \r\nbytes\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"job_prefix\"\r\n\r\n..\r\n\
         --{b}--\r\n",
        b = boundary
    );

    let (status, _, _) = send(&app, multipart_request(boundary, body.into_bytes())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(staged_leftovers(&config).is_empty());
}

#[tokio::test]
async fn test_upload_without_file_is_bad_request() {
    let (app, _config, _dir) = setup_test_server();

    let boundary = "mixtapeboundary";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"job_prefix\"\r\n\r\ngig\r\n--{b}--\r\n",
        b = boundary
    );
    let request = Request::builder()
        .method(Method::POST)
        .uri("/upload-track")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
        .body(Body::from(body))
        .unwrap();

    let (status, _, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_mixtape_empty_folder_fails_job() {
    let (app, config, _dir) = setup_test_server();
    std::fs::create_dir_all(config.prefix_dir("empty")).unwrap();

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/create-mixtape",
        Some(json!({ "job_prefix": "empty" })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let job = wait_for_job(&app, body["job_id"].as_str().unwrap()).await;
    assert_eq!(job["status"], "failed");
    assert!(job["error"].as_str().unwrap().contains("No audio files found"));
    assert!(job["result"].is_null());
}

#[tokio::test]
async fn test_create_mixtape_completes() {
    let (app, config, _dir) = setup_test_server();
    write_tracks(&config, "set", &[("a.wav", 1000), ("b.wav", 1000)]);

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/create-mixtape",
        Some(json!({
            "job_prefix": "set",
            "transition_ms": 200,
            "output_name": "set.wav",
            "shuffle": false
        })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let job = wait_for_job(&app, body["job_id"].as_str().unwrap()).await;
    assert_eq!(job["status"], "completed", "job = {}", job);
    assert_eq!(job["kind"], "mixtape");

    let result = job["result"].as_str().unwrap();
    assert_eq!(Path::new(result), config.output_dir.join("set.wav"));
    assert!(Path::new(result).exists());
}

#[tokio::test]
async fn test_make_video_missing_image_fails_job() {
    let (app, _config, dir) = setup_test_server();
    let audio = dir.path().join("audio.mp3");
    std::fs::write(&audio, b"x").unwrap();

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/make-video",
        Some(json!({
            "image_path": dir.path().join("missing.jpg"),
            "audio_path": audio,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let job = wait_for_job(&app, body["job_id"].as_str().unwrap()).await;
    assert_eq!(job["status"], "failed");
    assert_eq!(job["kind"], "video");
    assert!(job["error"].as_str().unwrap().contains("Image not found"));
}

#[tokio::test]
async fn test_generate_description() {
    let (app, config, _dir) = setup_test_server();
    write_tracks(&config, "desc", &[("01 Intro.wav", 2500), ("02 Drop.wav", 1000)]);

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/generate-description",
        Some(json!({ "job_prefix": "desc", "mixtape_name": "Demo", "genre": "Techno" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let description = body["description"].as_str().unwrap();
    assert!(description.starts_with("🔥 Demo 🔥\nGenre: Techno\n"));
    assert!(description.contains("00:00 - 01 Intro\n00:02 - 02 Drop\n"));
    assert!(description.ends_with("#MusicMix"));
}

#[tokio::test]
async fn test_generate_description_without_tracks() {
    let (app, _config, _dir) = setup_test_server();
    let (status, body) = make_request(
        &app,
        Method::POST,
        "/generate-description",
        Some(json!({ "job_prefix": "nothing-here" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_download_scoping() {
    let (app, config, dir) = setup_test_server();

    let served = config.output_dir.join("mix.mp3");
    std::fs::write(&served, b"mixtape-bytes").unwrap();
    let outside = dir.path().join("secret.txt");
    std::fs::write(&outside, b"secret").unwrap();

    let uri = |p: &Path| format!("/download?path={}", p.display().to_string().replace(' ', "%20"));

    let request = Request::builder().uri(uri(&served)).body(Body::empty()).unwrap();
    let (status, headers, bytes) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"mixtape-bytes");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION].to_str().unwrap(),
        "attachment; filename=\"mix.mp3\""
    );

    let request = Request::builder().uri(uri(&outside)).body(Body::empty()).unwrap();
    let (status, _, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let request = Request::builder()
        .uri(uri(&config.output_dir.join("missing.mp3")))
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
