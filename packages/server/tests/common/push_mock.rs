//! Local stand-in for the Expo push endpoint.
//!
//! Accepts any number of requests, records each JSON body, and answers in the
//! shape Expo uses: one ticket for a single message, an array for a batch.

use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub struct PushMock {
    pub endpoint: String,
    received: Arc<Mutex<Vec<Value>>>,
}

impl PushMock {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind push mock");
        let endpoint = format!(
            "http://{}/--/api/v2/push/send",
            listener.local_addr().expect("push mock has an address")
        );

        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let sink = sink.clone();
                tokio::spawn(async move {
                    let _ = serve(socket, sink).await;
                });
            }
        });

        Self { endpoint, received }
    }

    /// Request bodies in arrival order.
    pub fn received(&self) -> Vec<Value> {
        self.received.lock().unwrap().clone()
    }
}

async fn serve(mut socket: TcpStream, sink: Arc<Mutex<Vec<Value>>>) -> std::io::Result<()> {
    let mut request = Vec::new();
    let mut buf = [0u8; 4096];

    let body_start = loop {
        let n = socket.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        request.extend_from_slice(&buf[..n]);

        let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&request[..end]).to_lowercase();
        let length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if request.len() >= end + 4 + length {
            break end + 4;
        }
    };

    let body: Value = serde_json::from_slice(&request[body_start..]).unwrap_or(Value::Null);
    let reply = match &body {
        Value::Array(messages) => json!({
            "data": (0..messages.len())
                .map(|i| json!({ "status": "ok", "id": i.to_string() }))
                .collect::<Vec<_>>()
        }),
        _ => json!({ "data": { "status": "ok", "id": "0" } }),
    };
    sink.lock().unwrap().push(body);

    let reply = reply.to_string();
    let response = format!(
        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        reply.len(),
        reply
    );
    socket.write_all(response.as_bytes()).await?;
    socket.shutdown().await
}
