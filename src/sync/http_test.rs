use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use super::*;
use crate::sync::credentials::{Credentials, MemoryCredentialStore};

/// Serve one canned response and report the raw request head.
async fn serve_once(status: u16, body: &'static str) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            head.extend_from_slice(&buf[..n]);
        }
        let response = format!(
            "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        tx.send(String::from_utf8_lossy(&head).into_owned()).unwrap();
    });
    (base_url, rx)
}

fn api(base_url: &str, credentials: Option<Credentials>) -> HttpGameApi {
    let store = credentials.map_or_else(MemoryCredentialStore::new, MemoryCredentialStore::with);
    let config = HttpConfig {
        base_url: base_url.to_owned(),
        request_timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(5),
    };
    HttpGameApi::new(&config, Arc::new(store)).unwrap()
}

fn alice() -> Option<Credentials> {
    Some(Credentials::new("alice", "pw"))
}

#[test]
fn status_mapping() {
    assert_eq!(check_status(200, "x".into()), Ok("x".into()));
    assert_eq!(check_status(204, String::new()), Ok(String::new()));
    assert_eq!(check_status(401, "nope".into()), Err(ApiError::Unauthorized));
    assert_eq!(check_status(500, "boom".into()), Err(ApiError::Status { status: 500, body: "boom".into() }));
}

#[test]
fn image_url_is_built_locally() {
    let client = api("http://game.example/", None);
    assert_eq!(client.image_url(5, "avatar"), "http://game.example/api/v2/gameobject/5/image_raw/avatar");
}

#[tokio::test]
async fn missing_credentials_skip_the_request() {
    // Nothing listens on this port; a real request would fail differently.
    let client = api("http://127.0.0.1:9", None);
    assert_eq!(client.fetch_self().await, Err(ApiError::NoCredentials));
    assert_eq!(client.list_objects("gameobject_item", &[]).await, Err(ApiError::NoCredentials));
}

#[tokio::test]
async fn fetch_self_sends_basic_auth() {
    let (base_url, head) = serve_once(200, r#"{"data": {"id": "7", "attributes": {"name": "alice"}}}"#).await;
    let player = api(&base_url, alice()).fetch_self().await.unwrap();
    assert_eq!(player.id, 7);

    let head = head.await.unwrap();
    assert!(head.starts_with("GET /api/v2/gameobject_player/self HTTP/1.1"));
    // base64("alice:pw")
    assert!(head.to_ascii_lowercase().contains("authorization: basic ywxpy2u6chc="));
}

#[tokio::test]
async fn list_objects_encodes_filter() {
    let (base_url, head) = serve_once(200, r#"{"data": []}"#).await;
    let filters = crate::sync::query::spatial_filter(None, None, 7);
    let objects = api(&base_url, alice()).list_objects("gameobject_item", &filters).await.unwrap();
    assert!(objects.is_empty());

    let head = head.await.unwrap();
    assert!(head.starts_with("GET /api/gameobject_item?filter%5Bobjects%5D="));
}

#[tokio::test]
async fn unauthorized_is_distinguished() {
    let (base_url, _head) = serve_once(401, "").await;
    assert_eq!(api(&base_url, alice()).fetch_worlds().await, Err(ApiError::Unauthorized));
}

#[tokio::test]
async fn update_position_path() {
    let (base_url, head) = serve_once(200, "{}").await;
    api(&base_url, alice()).update_position(7, LatLon::new(52.5, 13.25)).await.unwrap();
    assert!(head.await.unwrap().starts_with("GET /api/v2/gameobject/7/update_position/52.5,13.25 HTTP/1.1"));
}

#[tokio::test]
async fn object_action_returns_payload() {
    let (base_url, head) = serve_once(200, r#"{"message": "collected"}"#).await;
    let data = api(&base_url, alice()).object_action(12, GameAction::Collect).await.unwrap();
    assert_eq!(data["message"], "collected");
    assert!(head.await.unwrap().starts_with("GET /api/v2/gameobject/12/collect HTTP/1.1"));
}
