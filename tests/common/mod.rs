use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Serves one HTTP exchange by hand: reads the request, writes `head`, then
/// each part after its delay, and closes the socket. Lets a test cut a body
/// short or hold it open, which a mock server can't do.
pub async fn serve_once(head: &str, parts: Vec<(Duration, String)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let head = head.to_string();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.flush().await.unwrap();
        for (delay, part) in parts {
            tokio::time::sleep(delay).await;
            if socket.write_all(part.as_bytes()).await.is_err() {
                return;
            }
            let _ = socket.flush().await;
        }
        // Let the last part reach the client before the connection drops.
        tokio::time::sleep(Duration::from_millis(100)).await;
    });

    format!("http://{}", addr)
}

async fn read_request(socket: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);

        let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
        let content_length = headers
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if buf.len() >= end + 4 + content_length {
            return;
        }
    }
}
