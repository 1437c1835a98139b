use super::*;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve one canned HTTP response per connection, forever. Returns the base URL.
async fn canned_server(status_line: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    format!("http://{addr}/api")
}

/// Accept connections and never answer them.
async fn silent_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{addr}/api")
}

fn client(base_url: String, timeout: Duration) -> RawgClient {
    RawgClient::with_options("test-key".to_string(), base_url, timeout).unwrap()
}

#[test]
fn empty_key_is_a_config_error() {
    let err = RawgClient::with_options("  ".to_string(), DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
        .unwrap_err();
    assert!(matches!(err, CatalogError::Config(_)));
}

#[test]
fn trailing_slash_is_trimmed() {
    let c = client("http://localhost/api/".to_string(), DEFAULT_TIMEOUT);
    assert_eq!(c.base_url(), "http://localhost/api");
}

#[test]
fn truncate_respects_char_boundaries() {
    assert_eq!(truncate("héllo", 2), "hé");
    assert_eq!(truncate("hi", 10), "hi");
}

#[tokio::test]
async fn unanswered_request_times_out_as_retryable() {
    let c = client(silent_server().await, Duration::from_millis(200));
    let err = c.details(3498).await.unwrap_err();
    assert!(matches!(err, CatalogError::Timeout(_)), "got {err:?}");
    assert!(err.is_retryable());
}

#[tokio::test]
async fn missing_game_is_not_found() {
    let base = canned_server("404 Not Found", r#"{"detail": "Not found."}"#).await;
    let err = client(base, DEFAULT_TIMEOUT).details(1).await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound(ref id) if id == "1"), "got {err:?}");
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn server_error_is_retryable() {
    let base = canned_server("502 Bad Gateway", "upstream down").await;
    let err = client(base, DEFAULT_TIMEOUT).search("zelda", 1, 10).await.unwrap_err();
    match &err {
        CatalogError::Status { status, message } => {
            assert_eq!(*status, 502);
            assert_eq!(message, "upstream down");
        }
        other => panic!("expected status error, got {other:?}"),
    }
    assert!(err.is_retryable());
}

#[tokio::test]
async fn search_decodes_results() {
    let base = canned_server(
        "200 OK",
        r#"{"count": 2, "results": [
            {"id": 22511, "name": "The Legend of Zelda: Breath of the Wild", "released": "2017-03-03"},
            {"id": 5, "name": "Zelda II"}
        ]}"#,
    )
    .await;
    let page = client(base, DEFAULT_TIMEOUT).search("zelda", 1, 10).await.unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.games[0].id, 22511);
    assert_eq!(page.games[1].name, "Zelda II");
}

#[tokio::test]
async fn series_and_genre_lookups_decode_pages() {
    let base = canned_server(
        "200 OK",
        r#"{"count": 1, "results": [{"id": 4200, "name": "Portal 2", "rating": 4.6}]}"#,
    )
    .await;
    let c = client(base, DEFAULT_TIMEOUT);

    let series = c.game_series(4000, 6).await.unwrap();
    assert_eq!(series.games[0].name, "Portal 2");

    let genres = ["Puzzle".to_string(), "Shooter".to_string()];
    let top = c.top_rated_in_genres(&genres, 8).await.unwrap();
    assert_eq!(top.total, 1);
    assert_eq!(top.games[0].rating, Some(4.6));
}

#[tokio::test]
async fn garbage_body_is_a_json_error() {
    let base = canned_server("200 OK", "<html>maintenance</html>").await;
    let err = client(base, DEFAULT_TIMEOUT).details(7).await.unwrap_err();
    assert!(matches!(err, CatalogError::Json(_)));
}
