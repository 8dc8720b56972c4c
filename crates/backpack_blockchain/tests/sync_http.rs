//! Integration tests for the sync client against an in-process HTTP endpoint.

use backpack_blockchain::{
    encode_items, NetworkFailure, RemoteSyncClient, SyncConfig, SyncError, SyncEvent, SyncWorker,
};
use backpack_economy::EntitlementRecord;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

const ALICE: &str = "0x00000000000000000000000000000000000a11ce";

/// Canned reply for every request the endpoint receives.
#[derive(Clone)]
struct Reply {
    status: u16,
    body: String,
    delay: Duration,
}

impl Reply {
    fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }
}

/// Serves `reply` on a local port, forwarding each request body to the receiver.
fn serve(reply: Reply) -> (SocketAddr, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { break };
            let reply = reply.clone();
            let tx = tx.clone();
            thread::spawn(move || handle(stream, &reply, &tx));
        }
    });

    (addr, rx)
}

fn handle(mut stream: TcpStream, reply: &Reply, tx: &mpsc::Sender<String>) {
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut content_length = 0usize;

    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap_or(0) == 0 {
            return;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }

    let mut body = vec![0u8; content_length];
    if reader.read_exact(&mut body).is_err() {
        return;
    }
    let _ = tx.send(String::from_utf8_lossy(&body).into_owned());

    thread::sleep(reply.delay);

    let response = format!(
        "HTTP/1.1 {} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        reply.status,
        reply.body.len(),
        reply.body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

fn client_for(addr: SocketAddr, timeout_ms: u64) -> RemoteSyncClient {
    let config = SyncConfig::default()
        .with_rpc_url(format!("http://{addr}"))
        .with_timeout_ms(timeout_ms);
    RemoteSyncClient::new(config).unwrap()
}

fn sample_records() -> Vec<EntitlementRecord> {
    vec![
        EntitlementRecord::new(1, 1, 9_000, ALICE),
        EntitlementRecord::new(3, 2, 7_200, ALICE),
    ]
}

#[tokio::test]
async fn test_fetch_returns_records() {
    let records = sample_records();
    let (addr, _requests) = serve(Reply::ok(encode_items(&records)));

    let fetched = client_for(addr, 2_000).fetch(ALICE).await.unwrap();
    assert_eq!(fetched, records);
}

#[tokio::test]
async fn test_request_carries_identity() {
    let (addr, requests) = serve(Reply::ok(encode_items(&sample_records())));

    client_for(addr, 2_000).fetch(ALICE).await.unwrap();

    let body: serde_json::Value =
        serde_json::from_str(&requests.recv_timeout(Duration::from_secs(2)).unwrap()).unwrap();
    assert_eq!(body["method"], "eth_call");
    let data = body["params"][0]["data"].as_str().unwrap().to_lowercase();
    assert!(data.ends_with(&ALICE[2..]));
}

#[tokio::test]
async fn test_malformed_payload_is_format_error() {
    let (addr, _requests) = serve(Reply::ok(
        r#"{ "jsonrpc": "2.0", "id": 1, "result": { "items": [ { "tokenId": 1 } ] } }"#,
    ));

    let result = client_for(addr, 2_000).fetch(ALICE).await;
    assert!(matches!(result, Err(SyncError::Format { index: Some(0), .. })));
}

#[tokio::test]
async fn test_http_error_status_is_network_error() {
    let (addr, _requests) = serve(Reply {
        status: 500,
        body: "{}".to_string(),
        delay: Duration::ZERO,
    });

    let result = client_for(addr, 2_000).fetch(ALICE).await;
    assert!(matches!(
        result,
        Err(SyncError::Network { kind: NetworkFailure::Status(500), .. })
    ));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_network_error() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };

    let error = client_for(addr, 2_000).fetch(ALICE).await.unwrap_err();
    assert!(error.is_network());
}

#[tokio::test]
async fn test_slow_endpoint_times_out() {
    let (addr, _requests) = serve(Reply {
        status: 200,
        body: encode_items(&sample_records()),
        delay: Duration::from_secs(2),
    });

    let error = client_for(addr, 200).fetch(ALICE).await.unwrap_err();
    assert!(error.is_timeout());
}

#[tokio::test]
async fn test_invalid_identity_sends_nothing() {
    let (addr, requests) = serve(Reply::ok(encode_items(&sample_records())));

    let result = client_for(addr, 2_000).fetch("alice").await;
    assert!(matches!(result, Err(SyncError::InvalidIdentity(_))));
    assert!(requests.recv_timeout(Duration::from_millis(100)).is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_worker_publishes_snapshots() {
    let records = sample_records();
    let (addr, _requests) = serve(Reply::ok(encode_items(&records)));

    let config = SyncConfig::default()
        .with_rpc_url(format!("http://{addr}"))
        .with_timeout_ms(2_000)
        .with_refresh_interval_ms(50);
    let worker = SyncWorker::new(config).unwrap();
    let receiver = worker.receiver();

    let task = worker.spawn(&tokio::runtime::Handle::current(), ALICE);

    let first = tokio::task::spawn_blocking(move || receiver.recv_timeout(Duration::from_secs(5)))
        .await
        .unwrap()
        .unwrap();

    match first {
        SyncEvent::Snapshot { holder, records: fetched, .. } => {
            assert_eq!(holder, ALICE);
            assert_eq!(fetched, records);
        }
        SyncEvent::Failed { error, .. } => panic!("sync failed: {error}"),
    }

    worker.stop();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap();
    assert!(!worker.is_running());
    assert!(worker.stats().succeeded.load(std::sync::atomic::Ordering::Relaxed) >= 1);
}
