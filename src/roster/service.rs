use std::sync::Arc;

use crate::{
    catalog::CatalogPort,
    mechanics::{CatchDice, GateDraw, PrimeGate, SequenceCounters, derive_nickname, is_prime},
    roster::{
        error::{RosterError, already_released, catch_failed, decoy_draw},
        ports::{CatchRoll, ReleaseGate, RosterRepository, RosterUnitOfWork},
        types::{CreatureId, CreatureRecord, OwnerId},
    },
};

/// Capture, release, un-release and rename workflows over an owned-creature roster.
///
/// Every workflow runs inside one unit of work and either commits as a whole or leaves
/// the roster untouched.
pub struct RosterService {
    repository: Arc<dyn RosterRepository>,
    catalog: Arc<dyn CatalogPort>,
    gate: Arc<dyn ReleaseGate>,
    dice: Arc<dyn CatchRoll>,
    counters: Arc<SequenceCounters>,
}

impl RosterService {
    pub fn new(
        repository: Arc<dyn RosterRepository>,
        catalog: Arc<dyn CatalogPort>,
        gate: Arc<dyn ReleaseGate>,
        dice: Arc<dyn CatchRoll>,
        counters: Arc<SequenceCounters>,
    ) -> Self {
        Self {
            repository,
            catalog,
            gate,
            dice,
            counters,
        }
    }

    pub fn with_defaults(
        repository: Arc<dyn RosterRepository>,
        catalog: Arc<dyn CatalogPort>,
    ) -> Self {
        Self::new(
            repository,
            catalog,
            Arc::new(PrimeGate::new()),
            Arc::new(CatchDice::new()),
            Arc::new(SequenceCounters::new()),
        )
    }

    pub fn counters(&self) -> &SequenceCounters {
        &self.counters
    }

    pub async fn capture(
        &self,
        owner_id: OwnerId,
        catalog_id: u32,
        nickname: Option<String>,
    ) -> Result<CreatureRecord, RosterError> {
        if !self.dice.attempt_catch() {
            tracing::info!(
                target: "roster",
                owner_id = %owner_id,
                catalog_id,
                "capture_missed"
            );
            return Err(catch_failed());
        }

        let nickname = match nickname.map(|name| name.trim().to_string()) {
            Some(name) if !name.is_empty() => name,
            _ => self.catalog.resolve_name(catalog_id).await?,
        };
        let record = CreatureRecord::new(owner_id, catalog_id, nickname);

        let mut uow = self.repository.begin().await?;
        uow.save(record.clone()).await?;
        uow.commit().await?;

        tracing::info!(
            target: "roster",
            creature_id = %record.id,
            owner_id = %owner_id,
            catalog_id,
            nickname = %record.nickname,
            "creature_captured"
        );
        Ok(record)
    }

    pub async fn list_owned(&self, owner_id: OwnerId) -> Result<Vec<CreatureRecord>, RosterError> {
        let mut uow = self.repository.begin().await?;
        let creatures = uow.find_by_owner(owner_id).await?;
        uow.commit().await?;
        Ok(creatures)
    }

    pub async fn release(&self, id: CreatureId) -> Result<CreatureRecord, RosterError> {
        let mut uow = self.repository.begin().await?;
        let staged = self.release_within(&mut *uow, id).await;
        self.finish(uow, staged, "release").await
    }

    pub async fn unrelease(&self, id: CreatureId) -> Result<CreatureRecord, RosterError> {
        let mut uow = self.repository.begin().await?;
        let staged = unrelease_within(&mut *uow, id).await;
        self.finish(uow, staged, "unrelease").await
    }

    pub async fn rename(&self, id: CreatureId) -> Result<CreatureRecord, RosterError> {
        let mut uow = self.repository.begin().await?;
        let staged = self.rename_within(&mut *uow, id).await;
        self.finish(uow, staged, "rename").await
    }

    async fn release_within(
        &self,
        uow: &mut dyn RosterUnitOfWork,
        id: CreatureId,
    ) -> Result<Staged, RosterError> {
        let mut record = uow.find(id).await?;
        if record.released {
            return Err(already_released());
        }

        let prime = match self.gate.draw()? {
            GateDraw::Accepted(prime) => prime,
            GateDraw::Rejected(decoy) => {
                tracing::info!(
                    target: "roster",
                    creature_id = %id,
                    decoy,
                    "release_rejected"
                );
                return Err(decoy_draw(decoy));
            }
        };
        if let Err(err) = is_prime(prime) {
            self.gate.revert_accept(prime);
            return Err(err.into());
        }

        record.release()?;
        if let Err(err) = uow.save(record.clone()).await {
            self.gate.revert_accept(prime);
            return Err(err);
        }
        tracing::debug!(target: "roster", creature_id = %id, prime, "release_accepted");
        Ok(Staged {
            record,
            compensation: Compensation::GatePrime(prime),
        })
    }

    async fn rename_within(
        &self,
        uow: &mut dyn RosterUnitOfWork,
        id: CreatureId,
    ) -> Result<Staged, RosterError> {
        let mut record = uow.find(id).await?;
        if record.released {
            return Err(already_released());
        }

        let key = record.id.to_string();
        let value = self.counters.next_value(&key);
        let nickname = derive_nickname(&record.nickname, value);
        record.rename(nickname)?;
        if let Err(err) = uow.save(record.clone()).await {
            self.counters.rewind(&key);
            return Err(err);
        }
        Ok(Staged {
            record,
            compensation: Compensation::CounterDraw(key),
        })
    }

    async fn finish(
        &self,
        mut uow: Box<dyn RosterUnitOfWork>,
        staged: Result<Staged, RosterError>,
        workflow: &'static str,
    ) -> Result<CreatureRecord, RosterError> {
        let Staged {
            record,
            compensation,
        } = match staged {
            Ok(staged) => staged,
            Err(err) => {
                uow.rollback().await;
                tracing::debug!(
                    target: "roster",
                    workflow,
                    kind = ?err.kind,
                    error = %err,
                    "workflow_rolled_back"
                );
                return Err(err);
            }
        };

        if let Err(err) = uow.commit().await {
            // The table lock is still held here, so no other workflow saw the draw.
            self.compensate(compensation);
            tracing::warn!(
                target: "roster",
                workflow,
                creature_id = %record.id,
                kind = ?err.kind,
                error = %err,
                "workflow_commit_failed"
            );
            return Err(err);
        }

        tracing::info!(
            target: "roster",
            workflow,
            creature_id = %record.id,
            nickname = %record.nickname,
            released = record.released,
            "workflow_committed"
        );
        Ok(record)
    }

    fn compensate(&self, compensation: Compensation) {
        match compensation {
            Compensation::Nothing => {}
            Compensation::CounterDraw(key) => self.counters.rewind(&key),
            Compensation::GatePrime(prime) => self.gate.revert_accept(prime),
        }
    }
}

/// Effect outside the unit of work that a failed commit has to undo.
enum Compensation {
    Nothing,
    CounterDraw(String),
    GatePrime(i64),
}

struct Staged {
    record: CreatureRecord,
    compensation: Compensation,
}

async fn unrelease_within(
    uow: &mut dyn RosterUnitOfWork,
    id: CreatureId,
) -> Result<Staged, RosterError> {
    let mut record = uow.find(id).await?;
    record.unrelease()?;
    uow.save(record.clone()).await?;
    Ok(Staged {
        record,
        compensation: Compensation::Nothing,
    })
}
