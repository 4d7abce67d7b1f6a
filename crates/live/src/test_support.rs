//! Minimal HTTP stub server for exercising real clients in tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub(crate) enum StubReply {
    /// Answer every request with this status and JSON body
    Respond { status: u16, body: String },
    /// Accept the connection and never answer
    Hang,
}

pub(crate) struct StubServer {
    pub addr: SocketAddr,
    request_lines: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Request lines received so far (e.g. `GET /v2/everything?q=... HTTP/1.1`).
    pub fn request_lines(&self) -> Vec<String> {
        self.request_lines.lock().unwrap().clone()
    }
}

pub(crate) async fn spawn_stub(reply: StubReply) -> StubServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let request_lines = Arc::new(Mutex::new(Vec::new()));

    let log = Arc::clone(&request_lines);
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let reply = reply.clone();
            let log = Arc::clone(&log);

            tokio::spawn(async move {
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                loop {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => head.extend_from_slice(&buf[..n]),
                    }
                    if head.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }

                if let Some(line) = String::from_utf8_lossy(&head).lines().next() {
                    log.lock().unwrap().push(line.to_string());
                }

                match reply {
                    StubReply::Hang => tokio::time::sleep(Duration::from_secs(30)).await,
                    StubReply::Respond { status, body } => {
                        let response = format!(
                            "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    }
                }
            });
        }
    });

    StubServer {
        addr,
        request_lines,
    }
}
