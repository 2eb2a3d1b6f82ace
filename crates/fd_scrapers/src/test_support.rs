//! Minimal HTTP/1.1 responder for network-free tests.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serve the same response to every connection; returns the base url.
pub async fn serve(status: u16, content_type: &str, body: &str) -> String {
    serve_bytes(status, content_type, body.as_bytes()).await
}

/// Like [`serve`] for bodies that are not UTF-8.
pub async fn serve_bytes(status: u16, content_type: &str, body: &[u8]) -> String {
    let head = format!(
        "HTTP/1.1 {} Test\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        content_type,
        body.len()
    );
    respond_with(head, body).await
}

/// Serve a body with no Content-Length; the client only learns its size by reading to EOF.
pub async fn serve_unsized(content_type: &str, body: &[u8]) -> String {
    let head = format!(
        "HTTP/1.1 200 Test\r\nContent-Type: {}\r\nConnection: close\r\n\r\n",
        content_type
    );
    respond_with(head, body).await
}

async fn respond_with(head: String, body: &[u8]) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let mut response = head.into_bytes();
    response.extend_from_slice(body);

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let response = response.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 8192];
                let mut read = 0;
                // read until the end of the request headers
                while let Ok(n) = socket.read(&mut buf[read..]).await {
                    if n == 0 {
                        break;
                    }
                    read += n;
                    if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") || read == buf.len() {
                        break;
                    }
                }
                let _ = socket.write_all(&response).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{}/", addr)
}
