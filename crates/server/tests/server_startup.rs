use std::io::Write;
use std::net::TcpListener;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tempfile::NamedTempFile;
use tokio::time::{sleep, timeout};

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Config pointing at an ffmpeg that does not exist
fn config_without_ffmpeg(port: u16) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    write!(
        temp_file,
        r#"
[converter]
ffmpeg_path = "/nonexistent/bin/ffmpeg"
segment_seconds = 120

[server]
host = "127.0.0.1"
port = {}
"#,
        port
    )
    .unwrap();
    temp_file.flush().unwrap();
    temp_file
}

/// Spawn the server and return a handle
fn spawn_server(config_path: &std::path::Path) -> tokio::process::Child {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_segmenter-web"))
        .env("SEGMENTER_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn server")
}

/// Wait for server to be ready
async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    let client = Client::new();
    for _ in 0..max_attempts {
        if client
            .get(format!("http://127.0.0.1:{}/api/v1/health", port))
            .send()
            .await
            .is_ok()
        {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn test_server_starts_without_ffmpeg() {
    let port = get_available_port();
    let config = config_without_ffmpeg(port);
    let mut server = spawn_server(config.path());

    assert!(
        wait_for_server(port, 60).await,
        "Server did not start in time"
    );

    let client = Client::new();
    let health: serde_json::Value = client
        .get(format!("http://127.0.0.1:{}/api/v1/health", port))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(health["status"], "ok");
    assert_eq!(health["transcoder"], "missing");

    let config_json: serde_json::Value = client
        .get(format!("http://127.0.0.1:{}/api/v1/config", port))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(config_json["converter"]["ffmpeg"], "ffmpeg");
    assert_eq!(config_json["converter"]["segment_seconds"], 120);
    assert_eq!(config_json["server"]["port"], port);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_upload_without_ffmpeg_returns_503() {
    let port = get_available_port();
    let config = config_without_ffmpeg(port);
    let mut server = spawn_server(config.path());

    assert!(
        wait_for_server(port, 60).await,
        "Server did not start in time"
    );

    let form = Form::new().part(
        "file",
        Part::bytes(b"fake m4a data".to_vec()).file_name("book.m4a"),
    );
    let response = Client::new()
        .post(format!("http://127.0.0.1:{}/api/v1/convert", port))
        .multipart(form)
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["results"][0]["file"], "book.m4a");
    assert_eq!(body["results"][0]["kind"], "external_tool_missing");

    server.kill().await.ok();
}

#[tokio::test]
async fn test_invalid_config_exits_with_error() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file
        .write_all(b"[converter]\nsegment_seconds = 0\n")
        .unwrap();
    temp_file.flush().unwrap();

    let result = timeout(
        Duration::from_secs(5),
        tokio::process::Command::new(env!("CARGO_BIN_EXE_segmenter-web"))
            .env("SEGMENTER_CONFIG", temp_file.path())
            .env("RUST_LOG", "error")
            .output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command");

    assert!(!result.status.success());
}
