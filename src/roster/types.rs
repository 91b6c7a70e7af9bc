use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::roster::error::{RosterError, already_released, not_released};

pub type CreatureId = Uuid;
pub type OwnerId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreatureStatus {
    Active,
    Released,
}

/// A creature held by an owner. Records are never deleted; release only flips a flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureRecord {
    pub id: CreatureId,
    pub owner_id: OwnerId,
    pub catalog_id: u32,
    pub nickname: String,
    #[serde(with = "time::serde::rfc3339")]
    pub captured_at: OffsetDateTime,
    pub released: bool,
}

impl CreatureRecord {
    pub fn new(owner_id: OwnerId, catalog_id: u32, nickname: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            owner_id,
            catalog_id,
            nickname: nickname.into(),
            captured_at: OffsetDateTime::now_utc(),
            released: false,
        }
    }

    pub fn status(&self) -> CreatureStatus {
        if self.released {
            CreatureStatus::Released
        } else {
            CreatureStatus::Active
        }
    }

    pub fn release(&mut self) -> Result<(), RosterError> {
        if self.released {
            return Err(already_released());
        }
        self.released = true;
        Ok(())
    }

    pub fn unrelease(&mut self) -> Result<(), RosterError> {
        if !self.released {
            return Err(not_released());
        }
        self.released = false;
        Ok(())
    }

    pub fn rename(&mut self, nickname: String) -> Result<(), RosterError> {
        if self.released {
            return Err(already_released());
        }
        self.nickname = nickname;
        Ok(())
    }
}
