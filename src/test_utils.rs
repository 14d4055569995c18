//! Local stand-in for the provider's bucket, used by the network tests.

use reqwest::StatusCode;
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use zip::write::FileOptions;
use zip::ZipWriter;

type Routes = HashMap<String, (u16, Vec<u8>)>;

/// A tiny HTTP/1.1 server answering canned responses and recording every request path.
///
/// Unknown paths answer `404 Not Found`.
pub(crate) struct MockProvider {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
    handle: JoinHandle<()>,
}

#[derive(Default)]
pub(crate) struct MockProviderBuilder {
    routes: Routes,
}

impl MockProviderBuilder {
    pub(crate) fn route(mut self, path: &str, status: u16, body: Vec<u8>) -> Self {
        self.routes.insert(path.to_string(), (status, body));
        self
    }

    pub(crate) async fn start(self) -> MockProvider {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock provider");
        let addr = listener.local_addr().expect("mock provider address");
        let routes = Arc::new(self.routes);
        let requests = Arc::new(Mutex::new(Vec::new()));

        let task_requests = Arc::clone(&requests);
        let handle = tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let routes = Arc::clone(&routes);
                let requests = Arc::clone(&task_requests);
                tokio::spawn(async move {
                    let _ = serve(socket, &routes, &requests).await;
                });
            }
        });

        MockProvider {
            addr,
            requests,
            handle,
        }
    }
}

impl MockProvider {
    pub(crate) fn builder() -> MockProviderBuilder {
        MockProviderBuilder::default()
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().expect("request log").len()
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("request log").clone()
    }
}

impl Drop for MockProvider {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve(
    mut socket: TcpStream,
    routes: &Routes,
    requests: &Mutex<Vec<String>>,
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let head = String::from_utf8_lossy(&buf);
    let path = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    requests.lock().expect("request log").push(path.clone());

    let (status, body) = routes.get(&path).cloned().unwrap_or((404, Vec::new()));
    let reason = StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown");
    let header = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Length: {}\r\nContent-Type: application/octet-stream\r\nConnection: close\r\n\r\n",
        body.len()
    );
    socket.write_all(header.as_bytes()).await?;
    socket.write_all(&body).await?;
    socket.shutdown().await
}

/// Builds a ZIP archive in memory holding the given `(name, contents)` members.
pub(crate) fn zip_fixture(members: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in members {
        writer
            .start_file(*name, FileOptions::default())
            .expect("start zip member");
        writer
            .write_all(contents.as_bytes())
            .expect("write zip member");
    }
    writer.finish().expect("finish zip").into_inner()
}

/// A small trip CSV with `rows` data rows.
pub(crate) fn trips_csv(rows: usize) -> String {
    let mut csv = String::from("ride_id,rideable_type,started_at,ended_at,start_station_name\n");
    for i in 0..rows {
        csv.push_str(&format!(
            "R{i:05},classic_bike,2024-01-01 08:{:02}:00,2024-01-01 09:{:02}:00,Station {i}\n",
            i % 60,
            i % 60
        ));
    }
    csv
}
