#![allow(clippy::unwrap_used)]
// Transport and end-to-end client tests against an in-process TCP server
// that speaks just enough TL1 to answer.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use secrecy::SecretString;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use ponctl_api::{
    CancelCause, ClientConfig, Deadline, Error, OnuEndpoint, PonAddress, TcpTransport, Transport,
    TransportConfig, UnmClient,
};

// ── Mock UNM server ─────────────────────────────────────────────────

/// What the server does with one received command.
enum Reply {
    Send(Vec<&'static str>),
    /// Never answer.
    Hang,
    /// Answer, then drop the connection.
    SendAndClose(&'static str),
    /// Answer, then push an unsolicited byte once the client has read it.
    SendThenStray(&'static str),
    /// Echo the command back in `chunk`-byte pieces.
    Echo { chunk: usize },
}

type Handler = Arc<dyn Fn(&str) -> Reply + Send + Sync>;

struct MockServer {
    port: u16,
    accepted: Arc<AtomicUsize>,
    received: Arc<Mutex<Vec<String>>>,
}

impl MockServer {
    async fn start(handler: impl Fn(&str) -> Reply + Send + Sync + 'static) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let accepted = Arc::new(AtomicUsize::new(0));
        let received = Arc::new(Mutex::new(Vec::new()));
        let handler: Handler = Arc::new(handler);

        let (acc, rec) = (Arc::clone(&accepted), Arc::clone(&received));
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                acc.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(serve(socket, Arc::clone(&handler), Arc::clone(&rec)));
            }
        });

        Self {
            port,
            accepted,
            received,
        }
    }

    fn config(&self) -> TransportConfig {
        TransportConfig::new("127.0.0.1", self.port)
            .with_connect_timeout(Duration::from_secs(2))
            .with_probe_timeout(Duration::from_millis(20))
    }

    fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }
}

async fn serve(mut socket: TcpStream, handler: Handler, received: Arc<Mutex<Vec<String>>>) {
    let mut pending = String::new();
    let mut buf = [0u8; 1024];
    loop {
        let n = match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        pending.push_str(&String::from_utf8_lossy(&buf[..n]));

        while let Some(end) = pending.find(';') {
            let command: String = pending.drain(..=end).collect();
            received.lock().unwrap().push(command.clone());

            match handler(&command) {
                Reply::Send(chunks) => {
                    for chunk in chunks {
                        if socket.write_all(chunk.as_bytes()).await.is_err() {
                            return;
                        }
                        tokio::time::sleep(Duration::from_millis(5)).await;
                    }
                }
                Reply::Hang => {}
                Reply::SendAndClose(body) => {
                    let _ = socket.write_all(body.as_bytes()).await;
                    return;
                }
                Reply::SendThenStray(body) => {
                    if socket.write_all(body.as_bytes()).await.is_err() {
                        return;
                    }
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    if socket.write_all(b"*").await.is_err() {
                        return;
                    }
                }
                Reply::Echo { chunk } => {
                    let body = format!(
                        "\r\n   M  CTAG COMPLD\r\n   {}\r\n;\r\n",
                        command.trim_end_matches(';')
                    );
                    for piece in body.as_bytes().chunks(chunk) {
                        if socket.write_all(piece).await.is_err() {
                            return;
                        }
                        tokio::time::sleep(Duration::from_millis(1)).await;
                    }
                }
            }
        }
    }
}

const COMPLD: &str = "\r\n   M  CTAG COMPLD\r\n;\r\n";

fn always_ok(_: &str) -> Reply {
    Reply::Send(vec![COMPLD])
}

// ── Transport tests ─────────────────────────────────────────────────

#[tokio::test]
async fn test_send_reads_until_terminator_across_chunks() {
    let server = MockServer::start(|_| {
        Reply::Send(vec!["\r\n   M  CTAG COMPLD\r\n", "   EADD=\r\n", ";\r\n"])
    })
    .await;
    let transport = TcpTransport::open(server.config()).await.unwrap();

    let response = transport
        .send(&Deadline::none(), "SHAKEHAND:::CTAG::;")
        .await
        .unwrap();

    assert!(response.contains("COMPLD"));
    assert!(response.trim_end().ends_with(';'));
    assert_eq!(server.received(), vec!["SHAKEHAND:::CTAG::;".to_owned()]);
}

#[tokio::test]
async fn test_empty_command_is_rejected() {
    let server = MockServer::start(always_ok).await;
    let transport = TcpTransport::open(server.config()).await.unwrap();

    let err = transport.send(&Deadline::none(), "").await.unwrap_err();
    assert!(matches!(err, Error::EmptyCommand));
}

#[tokio::test]
async fn test_open_reports_connect_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let result = TcpTransport::open(TransportConfig::new("127.0.0.1", port)).await;
    assert!(matches!(result, Err(Error::Connect { .. })));
}

#[tokio::test]
async fn test_close_is_idempotent_and_blocks_send() {
    let server = MockServer::start(always_ok).await;
    let transport = TcpTransport::open(server.config()).await.unwrap();
    assert!(transport.is_connected().await);

    transport.close().await.unwrap();
    transport.close().await.unwrap();

    assert!(!transport.is_connected().await);
    let err = transport
        .send(&Deadline::none(), "SHAKEHAND:::CTAG::;")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotConnected));
}

#[tokio::test]
async fn test_reconnect_after_close() {
    let server = MockServer::start(always_ok).await;
    let transport = TcpTransport::open(server.config()).await.unwrap();

    transport.close().await.unwrap();
    transport.reconnect(&Deadline::none()).await.unwrap();

    assert!(transport.is_connected().await);
    transport
        .send(&Deadline::none(), "SHAKEHAND:::CTAG::;")
        .await
        .unwrap();
    assert_eq!(server.accepted(), 2);
}

#[tokio::test]
async fn test_dead_peer_is_redialed_once_before_send() {
    let server = MockServer::start(|_| Reply::SendAndClose(COMPLD)).await;
    let transport = TcpTransport::open(server.config()).await.unwrap();

    transport
        .send(&Deadline::none(), "SHAKEHAND:::CTAG::;")
        .await
        .unwrap();
    // Give the server a moment to finish closing its side.
    tokio::time::sleep(Duration::from_millis(50)).await;

    transport
        .send(&Deadline::none(), "SHAKEHAND:::CTAG::;")
        .await
        .unwrap();
    assert_eq!(server.accepted(), 2);
}

#[tokio::test]
async fn test_unsolicited_bytes_mark_peer_dead_and_redial_once() {
    let server = MockServer::start(|_| Reply::SendThenStray(COMPLD)).await;
    let transport = TcpTransport::open(server.config()).await.unwrap();

    transport
        .send(&Deadline::none(), "SHAKEHAND:::CTAG::;")
        .await
        .unwrap();
    // Let the stray byte land in the socket.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let response = transport
        .send(&Deadline::none(), "SHAKEHAND:::CTAG::;")
        .await
        .unwrap();
    assert!(response.contains("COMPLD"));
    assert_eq!(server.accepted(), 2);
    assert_eq!(server.received().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sends_each_get_their_own_response() {
    let server = MockServer::start(|_| Reply::Echo { chunk: 3 }).await;
    let transport = TcpTransport::open(server.config()).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..20 {
        let transport = transport.clone();
        handles.push(tokio::spawn(async move {
            let command = format!("LST-ONU::OLTID=OLT{i},PONID=NA-NA-1-2:CTAG-{i}::;");
            let response = transport.send(&Deadline::none(), &command).await.unwrap();
            (i, response)
        }));
    }

    for handle in handles {
        let (i, response) = handle.await.unwrap();
        assert!(
            response.contains(&format!("OLTID=OLT{i},PONID=NA-NA-1-2:CTAG-{i}::")),
            "caller {i} got: {response:?}"
        );
    }
    assert_eq!(server.received().len(), 20);
    assert_eq!(server.accepted(), 1);
}

#[tokio::test]
async fn test_deadline_cancels_send_and_next_send_redials() {
    let server = MockServer::start(|command| {
        if command.starts_with("LST-ONU") {
            Reply::Hang
        } else {
            Reply::Send(vec![COMPLD])
        }
    })
    .await;
    let transport = TcpTransport::open(server.config()).await.unwrap();

    let err = transport
        .send(
            &Deadline::after(Duration::from_millis(100)),
            "LST-ONU::OLTID=OLT1,PONID=NA-NA-1-2:CTAG::;",
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Cancelled {
            cause: CancelCause::DeadlineExceeded
        }
    ));
    assert!(err.is_cancelled());

    transport
        .send(&Deadline::none(), "SHAKEHAND:::CTAG::;")
        .await
        .unwrap();
    assert_eq!(server.accepted(), 2);
}

#[tokio::test]
async fn test_expired_deadline_fails_before_writing() {
    let server = MockServer::start(always_ok).await;
    let transport = TcpTransport::open(server.config()).await.unwrap();

    let deadline = Deadline::none();
    deadline.cancel_token().cancel();
    let err = transport
        .send(&deadline, "SHAKEHAND:::CTAG::;")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Cancelled {
            cause: CancelCause::Cancelled
        }
    ));
    assert!(server.received().is_empty());
}

// ── End-to-end client tests ─────────────────────────────────────────

fn client_config(server: &MockServer) -> ClientConfig {
    let mut config = ClientConfig::new("127.0.0.1", "admin", SecretString::from("pw"));
    config.transport = server.config();
    config
}

#[tokio::test]
async fn test_client_queries_optical_info_over_tcp() {
    let server = MockServer::start(|command| {
        if command.starts_with("LST-OMDDM") {
            Reply::Send(vec![
                "\r\n   10.0.0.1 2026-01-01 10:00:00\r\nM  CTAG COMPLD\r\n   EN=0   ENDESC=No error\r\n   \
                  total_blocks=1\r\n   block_number=1\r\n   block_records=1\r\n\
                  List of ONU optical information\r\n-------------------------------\r\n\
                  AABBCC\t-19.5\tnormal\t2.1\tnormal\t11\tnormal\t45\tnormal\t3.3\tnormal\t3.0\t-20.1\r\n\
                  -------------------------------\r\n;\r\n",
            ])
        } else {
            Reply::Send(vec![COMPLD])
        }
    })
    .await;

    let client = UnmClient::connect(client_config(&server)).await.unwrap();
    let onu = OnuEndpoint::new(PonAddress::new("10.0.0.1", 1, 2), "AABBCC");

    let info = client
        .optical_info(&Deadline::after(Duration::from_secs(5)), &onu)
        .await
        .unwrap();
    assert_eq!(info.onu_id, "AABBCC");
    assert_eq!(info.rx_power, "-19.5");
    assert_eq!(info.peer_rx_power, "-20.1");

    client.close(&Deadline::after(Duration::from_secs(5))).await.unwrap();

    let received = server.received();
    assert!(received.iter().any(|c| c.starts_with("LOGIN:::CTAG::UN=admin,PWD=pw;")));
    assert_eq!(received.last().map(String::as_str), Some("LOGOUT:::CTAG::;"));
}

#[tokio::test]
async fn test_client_surfaces_deadline_as_cancellation() {
    let server = MockServer::start(|command| {
        if command.starts_with("SHAKEHAND") {
            Reply::Hang
        } else {
            Reply::Send(vec![COMPLD])
        }
    })
    .await;
    let client = UnmClient::connect(client_config(&server)).await.unwrap();

    let err = client
        .shake_hand(&Deadline::after(Duration::from_millis(200)))
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_deadline_bounds_wait_behind_a_hung_login() {
    let server = MockServer::start(|command| {
        if command.starts_with("LOGIN") {
            Reply::Hang
        } else {
            Reply::Send(vec![COMPLD])
        }
    })
    .await;
    let client = Arc::new(UnmClient::connect(client_config(&server)).await.unwrap());

    let first = Arc::clone(&client);
    let login = tokio::spawn(async move {
        first
            .login(&Deadline::after(Duration::from_secs(3)))
            .await
    });
    // The first caller holds the session lock once its LOGIN is on the wire.
    while !server.received().iter().any(|c| c.starts_with("LOGIN")) {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let started = tokio::time::Instant::now();
    let err = client
        .shake_hand(&Deadline::after(Duration::from_millis(200)))
        .await
        .unwrap_err();
    let waited = started.elapsed();

    assert!(matches!(
        err,
        Error::Cancelled {
            cause: CancelCause::DeadlineExceeded
        }
    ));
    assert!(waited < Duration::from_secs(1), "waited {waited:?}");
    assert!(!server.received().iter().any(|c| c.starts_with("SHAKEHAND")));

    let first_err = login.await.unwrap().unwrap_err();
    assert!(first_err.is_cancelled());
}
