use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::roster::{
    error::{RosterError, internal_error, not_found},
    persistence::RosterPersistence,
    ports::{RosterRepository, RosterUnitOfWork},
    types::{CreatureId, CreatureRecord, OwnerId},
};

type RosterTable = BTreeMap<CreatureId, CreatureRecord>;

/// Roster kept in memory, optionally mirrored to a JSON snapshot on every commit.
///
/// A unit of work holds the table lock from `begin` until it is dropped, so units run
/// one at a time.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRosterStore {
    table: Arc<Mutex<RosterTable>>,
    persistence: Option<RosterPersistence>,
}

impl InMemoryRosterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(persistence: RosterPersistence) -> Result<Self, RosterError> {
        let table: RosterTable = persistence
            .load()?
            .unwrap_or_default()
            .into_iter()
            .map(|record| (record.id, record))
            .collect();

        tracing::info!(
            target: "roster",
            path = %persistence.path().display(),
            creatures = table.len(),
            "roster_state_loaded"
        );

        Ok(Self {
            table: Arc::new(Mutex::new(table)),
            persistence: Some(persistence),
        })
    }

    pub async fn snapshot(&self) -> Vec<CreatureRecord> {
        self.table.lock().await.values().cloned().collect()
    }
}

#[async_trait]
impl RosterRepository for InMemoryRosterStore {
    async fn begin(&self) -> Result<Box<dyn RosterUnitOfWork>, RosterError> {
        let guard = Arc::clone(&self.table).lock_owned().await;
        Ok(Box::new(InMemoryUnitOfWork {
            table: guard,
            staged: BTreeMap::new(),
            persistence: self.persistence.clone(),
            finished: false,
        }))
    }
}

struct InMemoryUnitOfWork {
    table: OwnedMutexGuard<RosterTable>,
    staged: RosterTable,
    persistence: Option<RosterPersistence>,
    finished: bool,
}

impl InMemoryUnitOfWork {
    fn ensure_open(&self) -> Result<(), RosterError> {
        if self.finished {
            return Err(internal_error("unit of work already finished"));
        }
        Ok(())
    }
}

#[async_trait]
impl RosterUnitOfWork for InMemoryUnitOfWork {
    async fn find(&mut self, id: CreatureId) -> Result<CreatureRecord, RosterError> {
        self.ensure_open()?;
        self.staged
            .get(&id)
            .or_else(|| self.table.get(&id))
            .cloned()
            .ok_or_else(|| not_found(format!("creature {id} not found")))
    }

    async fn find_by_owner(
        &mut self,
        owner_id: OwnerId,
    ) -> Result<Vec<CreatureRecord>, RosterError> {
        self.ensure_open()?;
        let mut merged: RosterTable = self
            .table
            .iter()
            .filter(|(_, record)| record.owner_id == owner_id)
            .map(|(id, record)| (*id, record.clone()))
            .collect();
        for (id, record) in &self.staged {
            if record.owner_id == owner_id {
                merged.insert(*id, record.clone());
            } else {
                merged.remove(id);
            }
        }
        Ok(merged.into_values().collect())
    }

    async fn save(&mut self, record: CreatureRecord) -> Result<(), RosterError> {
        self.ensure_open()?;
        self.staged.insert(record.id, record);
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), RosterError> {
        self.ensure_open()?;
        self.finished = true;
        if self.staged.is_empty() {
            return Ok(());
        }

        let staged = std::mem::take(&mut self.staged);
        match &self.persistence {
            Some(persistence) => {
                let mut candidate = self.table.clone();
                candidate.extend(staged);
                let persistence = persistence.clone();
                // File writes and fsync run off the async workers; the table lock stays held.
                let candidate = tokio::task::spawn_blocking(move || {
                    persistence.save(candidate.values()).map(|()| candidate)
                })
                .await
                .map_err(|err| internal_error(format!("roster snapshot task failed: {err}")))??;
                *self.table = candidate;
            }
            None => self.table.extend(staged),
        }
        Ok(())
    }

    async fn rollback(&mut self) {
        self.staged.clear();
        self.finished = true;
    }
}
