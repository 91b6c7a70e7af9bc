use serde::{Deserialize, Serialize};

use crate::{
    catalog::{CatalogEntry, CatalogPage},
    roster::{CreatureId, CreatureRecord, OwnerId, RosterError, RosterErrorKind},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogLookup {
    ById(u32),
    ByName(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Capture {
        owner_id: OwnerId,
        catalog_id: u32,
        nickname: Option<String>,
    },
    List {
        owner_id: OwnerId,
    },
    Release {
        id: CreatureId,
    },
    Unrelease {
        id: CreatureId,
    },
    Rename {
        id: CreatureId,
    },
    CatalogList {
        limit: u32,
        offset: u32,
    },
    CatalogGet(CatalogLookup),
    Exit,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
enum WireMessage {
    Capture {
        owner_id: OwnerId,
        catalog_id: u32,
        #[serde(default)]
        nickname: Option<String>,
    },
    List {
        owner_id: OwnerId,
    },
    Release {
        id: CreatureId,
    },
    Unrelease {
        id: CreatureId,
    },
    Rename {
        id: CreatureId,
    },
    CatalogList {
        #[serde(default)]
        limit: u32,
        #[serde(default)]
        offset: u32,
    },
    CatalogGet {
        #[serde(default)]
        id: Option<u32>,
        #[serde(default)]
        name: Option<String>,
    },
    Exit,
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("invalid message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("catalog_get needs exactly one of id or name")]
    AmbiguousLookup,
}

pub fn parse_client_message(line: &str) -> Result<ClientMessage, ProtocolError> {
    let wire: WireMessage = serde_json::from_str(line)?;
    let message = match wire {
        WireMessage::Capture {
            owner_id,
            catalog_id,
            nickname,
        } => ClientMessage::Capture {
            owner_id,
            catalog_id,
            nickname,
        },
        WireMessage::List { owner_id } => ClientMessage::List { owner_id },
        WireMessage::Release { id } => ClientMessage::Release { id },
        WireMessage::Unrelease { id } => ClientMessage::Unrelease { id },
        WireMessage::Rename { id } => ClientMessage::Rename { id },
        WireMessage::CatalogList { limit, offset } => ClientMessage::CatalogList { limit, offset },
        WireMessage::CatalogGet { id, name } => match (id, name) {
            (Some(id), None) => ClientMessage::CatalogGet(CatalogLookup::ById(id)),
            (None, Some(name)) if !name.trim().is_empty() => {
                ClientMessage::CatalogGet(CatalogLookup::ByName(name))
            }
            _ => return Err(ProtocolError::AmbiguousLookup),
        },
        WireMessage::Exit => ClientMessage::Exit,
    };
    Ok(message)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolErrorKind {
    InvalidRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplyErrorKind {
    Roster(RosterErrorKind),
    Protocol(ProtocolErrorKind),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Creature {
        creature: CreatureRecord,
    },
    Creatures {
        creatures: Vec<CreatureRecord>,
    },
    CatalogPage {
        page: CatalogPage,
    },
    CatalogEntry {
        entry: CatalogEntry,
    },
    Error {
        kind: ReplyErrorKind,
        message: String,
        retryable: bool,
    },
}

impl ServerMessage {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            kind: ReplyErrorKind::Protocol(ProtocolErrorKind::InvalidRequest),
            message: message.into(),
            retryable: false,
        }
    }
}

impl From<RosterError> for ServerMessage {
    fn from(err: RosterError) -> Self {
        ServerMessage::Error {
            kind: ReplyErrorKind::Roster(err.kind),
            message: err.message,
            retryable: err.retryable,
        }
    }
}

pub fn encode_server_message(message: &ServerMessage) -> Result<String, serde_json::Error> {
    let mut line = serde_json::to_string(message)?;
    line.push('\n');
    Ok(line)
}
