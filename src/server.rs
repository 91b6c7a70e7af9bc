use std::{fs, io::ErrorKind, os::unix::fs::FileTypeExt, path::Path, sync::Arc};

use anyhow::{Context, Result, bail};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{UnixListener, UnixStream},
    signal::unix::{SignalKind, signal},
    sync::mpsc,
};
use tokio_util::sync::CancellationToken;

use crate::{
    catalog::{CatalogError, CatalogPort},
    config::ServerConfig,
    protocol::{
        CatalogLookup, ClientMessage, ServerMessage, encode_server_message, parse_client_message,
    },
    roster::{
        RosterService,
        error::{RosterError, not_found},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    ClientExit,
    Cancelled,
    Signal(&'static str),
}

/// Everything a connection needs to answer requests.
pub struct ServerContext {
    pub roster: Arc<RosterService>,
    pub catalog: Arc<dyn CatalogPort>,
}

pub async fn run(config: &ServerConfig, context: Arc<ServerContext>) -> Result<ExitReason> {
    prepare_socket_path(&config.socket_path)?;
    let listener = UnixListener::bind(&config.socket_path)
        .with_context(|| format!("unable to bind socket {}", config.socket_path.display()))?;

    let mut sigint =
        signal(SignalKind::interrupt()).context("unable to listen for SIGINT (Ctrl+C)")?;
    let mut sigterm = signal(SignalKind::terminate()).context("unable to listen for SIGTERM")?;
    let shutdown = CancellationToken::new();

    tracing::info!(
        target: "server",
        socket_path = %config.socket_path.display(),
        "server_listening"
    );

    let served = tokio::select! {
        _ = sigint.recv() => Ok(ExitReason::Signal("SIGINT")),
        _ = sigterm.recv() => Ok(ExitReason::Signal("SIGTERM")),
        served = serve(listener, context, shutdown.clone()) => served,
    };
    shutdown.cancel();

    cleanup_socket_path(&config.socket_path)?;
    let exit_reason = served?;
    tracing::info!(target: "server", reason = ?exit_reason, "server_stopped");
    Ok(exit_reason)
}

/// Accepts connections on `listener` until a client sends `exit` or `shutdown` fires.
pub async fn serve(
    listener: UnixListener,
    context: Arc<ServerContext>,
    shutdown: CancellationToken,
) -> Result<ExitReason> {
    let (exit_tx, mut exit_rx) = mpsc::unbounded_channel::<()>();

    let exit_reason = loop {
        tokio::select! {
            _ = shutdown.cancelled() => break ExitReason::Cancelled,
            Some(()) = exit_rx.recv() => break ExitReason::ClientExit,
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, _)) => {
                        let context = Arc::clone(&context);
                        let sender = exit_tx.clone();
                        tokio::spawn(async move {
                            if let Err(err) = handle_client(stream, context, sender).await {
                                let detail = format!("{err:#}");
                                tracing::warn!(target: "server", error = %detail, "client_handling_failed");
                            }
                        });
                    }
                    Err(err) => {
                        tracing::warn!(target: "server", error = %err, "accept_failed");
                    }
                }
            }
        }
    };

    Ok(exit_reason)
}

async fn handle_client(
    stream: UnixStream,
    context: Arc<ServerContext>,
    exit_tx: mpsc::UnboundedSender<()>,
) -> Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let reply = match parse_client_message(line) {
            Ok(ClientMessage::Exit) => {
                let _ = exit_tx.send(());
                break;
            }
            Ok(message) => dispatch(&context, message).await,
            Err(err) => {
                tracing::debug!(target: "server", error = %err, "invalid_protocol_message");
                ServerMessage::invalid_request(err.to_string())
            }
        };

        let encoded = encode_server_message(&reply).context("failed to encode reply")?;
        write_half.write_all(encoded.as_bytes()).await?;
        write_half.flush().await?;
    }

    Ok(())
}

pub async fn dispatch(context: &ServerContext, message: ClientMessage) -> ServerMessage {
    let roster = &context.roster;
    let outcome = match message {
        ClientMessage::Capture {
            owner_id,
            catalog_id,
            nickname,
        } => roster
            .capture(owner_id, catalog_id, nickname)
            .await
            .map(|creature| ServerMessage::Creature { creature }),
        ClientMessage::List { owner_id } => roster
            .list_owned(owner_id)
            .await
            .map(|creatures| ServerMessage::Creatures { creatures }),
        ClientMessage::Release { id } => roster
            .release(id)
            .await
            .map(|creature| ServerMessage::Creature { creature }),
        ClientMessage::Unrelease { id } => roster
            .unrelease(id)
            .await
            .map(|creature| ServerMessage::Creature { creature }),
        ClientMessage::Rename { id } => roster
            .rename(id)
            .await
            .map(|creature| ServerMessage::Creature { creature }),
        ClientMessage::CatalogList { limit, offset } => context
            .catalog
            .list(limit, offset)
            .await
            .map(|page| ServerMessage::CatalogPage { page })
            .map_err(catalog_failure),
        ClientMessage::CatalogGet(lookup) => {
            let entry = match lookup {
                CatalogLookup::ById(id) => context.catalog.find_by_id(id).await,
                CatalogLookup::ByName(name) => context.catalog.find_by_name(&name).await,
            };
            entry
                .map(|entry| ServerMessage::CatalogEntry { entry })
                .map_err(catalog_failure)
        }
        ClientMessage::Exit => Ok(ServerMessage::invalid_request(
            "exit is handled by the connection",
        )),
    };

    outcome.unwrap_or_else(ServerMessage::from)
}

fn catalog_failure(err: CatalogError) -> RosterError {
    match err {
        CatalogError::NotFound(resource) => {
            not_found(format!("catalog entry not found: {resource}"))
        }
        other => RosterError::from(other),
    }
}

fn prepare_socket_path(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("unable to create {}", parent.display()))?;
    }

    match fs::symlink_metadata(path) {
        Ok(metadata) => {
            if metadata.file_type().is_socket() || metadata.is_file() {
                fs::remove_file(path)
                    .with_context(|| format!("unable to remove stale socket {}", path.display()))?;
            } else {
                bail!(
                    "socket path exists but is not removable as file/socket: {}",
                    path.display()
                );
            }
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err).with_context(|| format!("unable to inspect {}", path.display()));
        }
    }

    Ok(())
}

fn cleanup_socket_path(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("unable to remove {}", path.display())),
    }
}
