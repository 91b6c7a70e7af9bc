use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    catalog::CatalogError,
    mechanics::{MechanicsError, MechanicsErrorKind},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterErrorKind {
    DecoyDraw,
    OutOfRange,
    NotPrime,
    Exhausted,
    CatchFailed,
    AlreadyReleased,
    NotReleased,
    NotFound,
    Catalog,
    Storage,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterError {
    pub kind: RosterErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl RosterError {
    pub fn new(kind: RosterErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: matches!(
                kind,
                RosterErrorKind::DecoyDraw | RosterErrorKind::CatchFailed
            ),
        }
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }
}

impl fmt::Display for RosterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RosterError {}

impl From<MechanicsError> for RosterError {
    fn from(err: MechanicsError) -> Self {
        let kind = match err.kind {
            MechanicsErrorKind::OutOfRange => RosterErrorKind::OutOfRange,
            MechanicsErrorKind::NotPrime => RosterErrorKind::NotPrime,
            MechanicsErrorKind::Exhausted => RosterErrorKind::Exhausted,
        };
        RosterError::new(kind, err.message)
    }
}

impl From<CatalogError> for RosterError {
    fn from(err: CatalogError) -> Self {
        let retryable = matches!(
            err,
            CatalogError::Transport(_) | CatalogError::Status { .. }
        );
        RosterError::new(RosterErrorKind::Catalog, err.to_string()).with_retryable(retryable)
    }
}

pub fn decoy_draw(number: i64) -> RosterError {
    RosterError::new(
        RosterErrorKind::DecoyDraw,
        format!("creature release failed: not a prime number ({number})"),
    )
}

pub fn catch_failed() -> RosterError {
    RosterError::new(RosterErrorKind::CatchFailed, "creature catch failed")
}

pub fn already_released() -> RosterError {
    RosterError::new(RosterErrorKind::AlreadyReleased, "creature already released")
}

pub fn not_released() -> RosterError {
    RosterError::new(RosterErrorKind::NotReleased, "creature not released")
}

pub fn not_found(message: impl Into<String>) -> RosterError {
    RosterError::new(RosterErrorKind::NotFound, message)
}

pub fn storage_error(message: impl Into<String>) -> RosterError {
    RosterError::new(RosterErrorKind::Storage, message)
}

pub fn internal_error(message: impl Into<String>) -> RosterError {
    RosterError::new(RosterErrorKind::Internal, message)
}
