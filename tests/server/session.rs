use std::{path::PathBuf, sync::Arc, time::Duration};

use async_trait::async_trait;
use rand::{SeedableRng, rngs::StdRng};
use serde_json::Map;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines},
    net::{UnixListener, UnixStream, unix::OwnedReadHalf},
    time::timeout,
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use catchkeeper::{
    catalog::{CatalogEntry, CatalogError, CatalogPage, CatalogPort},
    mechanics::{PrimeGate, SequenceCounters},
    protocol::{ProtocolErrorKind, ReplyErrorKind, ServerMessage},
    roster::{CatchRoll, InMemoryRosterStore, RosterErrorKind, RosterService},
    server::{ExitReason, ServerContext, serve},
};

struct AlwaysCatch;

impl CatchRoll for AlwaysCatch {
    fn attempt_catch(&self) -> bool {
        true
    }
}

struct SingleSpeciesCatalog;

#[async_trait]
impl CatalogPort for SingleSpeciesCatalog {
    async fn list(&self, _limit: u32, _offset: u32) -> Result<CatalogPage, CatalogError> {
        Ok(CatalogPage {
            count: 0,
            next: None,
            previous: None,
            results: vec![],
        })
    }

    async fn find_by_id(&self, id: u32) -> Result<CatalogEntry, CatalogError> {
        if id != 25 {
            return Err(CatalogError::NotFound(id.to_string()));
        }
        Ok(CatalogEntry {
            id,
            name: "pikachu".to_string(),
            height: 4,
            weight: 60,
            base_experience: Some(112),
            details: Map::new(),
        })
    }

    async fn find_by_name(&self, name: &str) -> Result<CatalogEntry, CatalogError> {
        if name == "pikachu" {
            return self.find_by_id(25).await;
        }
        Err(CatalogError::NotFound(name.to_string()))
    }
}

struct Client {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: tokio::net::unix::OwnedWriteHalf,
}

impl Client {
    async fn connect(path: &PathBuf) -> Self {
        let stream = UnixStream::connect(path)
            .await
            .expect("client should connect");
        let (read_half, writer) = stream.into_split();
        Self {
            lines: BufReader::new(read_half).lines(),
            writer,
        }
    }

    async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{line}\n").as_bytes())
            .await
            .expect("write should succeed");
    }

    async fn request(&mut self, line: &str) -> ServerMessage {
        self.send(line).await;
        let reply = timeout(Duration::from_secs(5), self.lines.next_line())
            .await
            .expect("reply should arrive")
            .expect("read should succeed")
            .expect("server should reply");
        serde_json::from_str(&reply).expect("reply should be a server message")
    }
}

fn socket_path() -> PathBuf {
    std::env::temp_dir().join(format!("catchkeeper-server-{}.sock", Uuid::now_v7()))
}

fn context(threshold: u32) -> Arc<ServerContext> {
    let catalog: Arc<dyn CatalogPort> = Arc::new(SingleSpeciesCatalog);
    let roster = RosterService::new(
        Arc::new(InMemoryRosterStore::new()),
        Arc::clone(&catalog),
        Arc::new(PrimeGate::with_threshold(threshold, StdRng::seed_from_u64(1))),
        Arc::new(AlwaysCatch),
        Arc::new(SequenceCounters::new()),
    );
    Arc::new(ServerContext {
        roster: Arc::new(roster),
        catalog,
    })
}

fn expect_creature(message: ServerMessage) -> catchkeeper::roster::CreatureRecord {
    match message {
        ServerMessage::Creature { creature } => creature,
        other => panic!("expected creature reply, got {other:?}"),
    }
}

#[tokio::test]
async fn given_running_server_when_client_drives_a_session_then_replies_follow_each_request() {
    let path = socket_path();
    let listener = UnixListener::bind(&path).expect("socket should bind");
    let server = tokio::spawn(serve(listener, context(1), CancellationToken::new()));
    let mut client = Client::connect(&path).await;
    let owner_id = Uuid::now_v7();

    let creature = expect_creature(
        client
            .request(&format!(
                r#"{{"type":"capture","owner_id":"{owner_id}","catalog_id":25}}"#
            ))
            .await,
    );
    assert_eq!(creature.nickname, "pikachu");

    let renamed = expect_creature(
        client
            .request(&format!(r#"{{"type":"rename","id":"{}"}}"#, creature.id))
            .await,
    );
    assert_eq!(renamed.nickname, "pikachu-0");

    let rejected = client
        .request(&format!(r#"{{"type":"release","id":"{}"}}"#, creature.id))
        .await;
    match rejected {
        ServerMessage::Error {
            kind, retryable, ..
        } => {
            assert_eq!(kind, ReplyErrorKind::Roster(RosterErrorKind::DecoyDraw));
            assert!(retryable);
        }
        other => panic!("expected decoy rejection, got {other:?}"),
    }

    let released = expect_creature(
        client
            .request(&format!(r#"{{"type":"release","id":"{}"}}"#, creature.id))
            .await,
    );
    assert!(released.released);

    match client
        .request(&format!(r#"{{"type":"list","owner_id":"{owner_id}"}}"#))
        .await
    {
        ServerMessage::Creatures { creatures } => assert_eq!(creatures, vec![released]),
        other => panic!("expected creature list, got {other:?}"),
    }

    client.send(r#"{"type":"exit"}"#).await;
    let exit_reason = timeout(Duration::from_secs(5), server)
        .await
        .expect("server should stop")
        .expect("server task should not panic")
        .expect("serve should succeed");
    assert_eq!(exit_reason, ExitReason::ClientExit);

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn given_invalid_lines_when_sent_then_invalid_request_is_returned_and_session_continues() {
    let path = socket_path();
    let listener = UnixListener::bind(&path).expect("socket should bind");
    let shutdown = CancellationToken::new();
    let server = tokio::spawn(serve(listener, context(10), shutdown.clone()));
    let mut client = Client::connect(&path).await;

    for line in [
        "not json",
        r#"{"type":"ping"}"#,
        r#"{"type":"catalog_get","id":25,"name":"pikachu"}"#,
    ] {
        match client.request(line).await {
            ServerMessage::Error {
                kind, retryable, ..
            } => {
                assert_eq!(kind, ReplyErrorKind::Protocol(ProtocolErrorKind::InvalidRequest));
                assert!(!retryable);
            }
            other => panic!("expected invalid_request for {line}, got {other:?}"),
        }
    }

    match client.request(r#"{"type":"catalog_get","name":"mew"}"#).await {
        ServerMessage::Error { kind, .. } => {
            assert_eq!(kind, ReplyErrorKind::Roster(RosterErrorKind::NotFound));
        }
        other => panic!("expected not_found, got {other:?}"),
    }

    match client.request(r#"{"type":"catalog_get","id":25}"#).await {
        ServerMessage::CatalogEntry { entry } => assert_eq!(entry.name, "pikachu"),
        other => panic!("expected catalog entry, got {other:?}"),
    }

    shutdown.cancel();
    let exit_reason = timeout(Duration::from_secs(5), server)
        .await
        .expect("server should stop")
        .expect("server task should not panic")
        .expect("serve should succeed");
    assert_eq!(exit_reason, ExitReason::Cancelled);

    let _ = std::fs::remove_file(&path);
}
