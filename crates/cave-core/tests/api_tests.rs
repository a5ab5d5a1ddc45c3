use cave_core::{FetchError, HttpMetricsApi, MetricsApi, QueryDescriptor};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

/// Serves a single canned HTTP response and closes the connection.
fn serve_once(response: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        stream.write_all(response.as_bytes()).unwrap();
    });
    format!("http://{addr}")
}

fn fetch(base_url: &str) -> FetchError {
    let api = HttpMetricsApi::new(base_url, Duration::from_secs(5)).unwrap();
    let query = QueryDescriptor {
        url: "/metrics/cpu/data".to_string(),
    };
    api.fetch_series(&query).unwrap_err()
}

#[test]
fn error_status_carries_response_body() {
    let base = serve_once(
        "HTTP/1.1 404 Not Found\r\nContent-Length: 14\r\nConnection: close\r\n\r\nno such metric",
    );
    let err = fetch(&base);
    assert!(matches!(err, FetchError::Status { status: 404, .. }));
    assert_eq!(err.api_message(), "no such metric");
}

#[test]
fn empty_error_body_falls_back_to_status_line() {
    let base =
        serve_once("HTTP/1.1 502 Bad Gateway\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
    let err = fetch(&base);
    assert!(matches!(err, FetchError::Status { status: 502, .. }));
    assert_eq!(err.api_message(), "502 Bad Gateway");
}

#[test]
fn unreadable_error_body_reports_read_failure() {
    let base = serve_once(
        "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 64\r\nConnection: close\r\n\r\npartial",
    );
    let err = fetch(&base);
    assert!(matches!(err, FetchError::Status { status: 500, .. }));
    assert!(!err.api_message().is_empty());
    assert_ne!(err.api_message(), "partial");
}
