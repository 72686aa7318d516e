//! Responses the mock server never produces: non-UTF-8 bodies and headers,
//! and bodies larger than ureq's default read limit.
//!
//! # Design
//! A one-shot TCP listener writes a canned HTTP/1.1 response, so the bytes on
//! the wire are exactly what each test needs.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener};

use kb_core::{ApiError, Processor};

const GROUP: &str = "lg-raw";

/// Serve `response` to the first connection, then close it.
fn serve_once(response: Vec<u8>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
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
        stream.write_all(&response).unwrap();
        stream.flush().unwrap();
    });

    addr
}

fn http_response(status_line: &str, extra_headers: &[u8], body: &[u8]) -> Vec<u8> {
    let mut response = format!(
        "HTTP/1.1 {status_line}\r\nContent-Length: {}\r\nConnection: close\r\n",
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(extra_headers);
    response.extend_from_slice(b"\r\n");
    response.extend_from_slice(body);
    response
}

#[test]
fn non_utf8_client_error_is_upstream() {
    let addr = serve_once(http_response(
        "400 Bad Request",
        b"X-Note: caf\xe9\r\n",
        &[0xff, 0xfe, b'x'],
    ));
    let kb = Processor::new(&format!("http://{addr}")).unwrap();

    let err = kb.list_tags(GROUP).unwrap_err();
    assert!(matches!(err, ApiError::Upstream { .. }), "got {err:?}");

    let payload = err.payload().unwrap();
    assert_eq!(payload.response.status, 400);
    assert_eq!(payload.response.body, "\u{FFFD}\u{FFFD}x");
    assert_eq!(payload.response.headers["x-note"], vec!["caf\u{FFFD}"]);
    assert_eq!(payload.request.headers["x-location-group"], vec![GROUP]);
}

#[test]
fn body_above_ten_mebibytes_is_read_whole() {
    let count = 11 * 1024 * 1024 / 2;
    let mut body = Vec::with_capacity(count * 2 + 1);
    body.push(b'[');
    for i in 0..count {
        if i > 0 {
            body.push(b',');
        }
        body.push(b'0');
    }
    body.push(b']');
    assert!(body.len() > 10 * 1024 * 1024);

    let addr = serve_once(http_response(
        "200 OK",
        b"Content-Type: application/json\r\nX-Total-Count: 5767168\r\n",
        &body,
    ));
    let kb = Processor::new(&format!("http://{addr}")).unwrap();

    let listed = kb.list(None, GROUP).unwrap();
    assert_eq!(listed.body.as_array().unwrap().len(), count);
    assert_eq!(listed.total_count(), Some(count as u64));
}
