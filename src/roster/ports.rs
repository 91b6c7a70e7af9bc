use async_trait::async_trait;

use crate::{
    mechanics::{CatchDice, GateDraw, MechanicsError, PrimeGate},
    roster::{
        error::RosterError,
        types::{CreatureId, CreatureRecord, OwnerId},
    },
};

#[async_trait]
pub trait RosterRepository: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn RosterUnitOfWork>, RosterError>;
}

/// Atomic unit over the roster. Writes become visible only on `commit`; dropping an
/// uncommitted unit discards them.
#[async_trait]
pub trait RosterUnitOfWork: Send {
    async fn find(&mut self, id: CreatureId) -> Result<CreatureRecord, RosterError>;

    async fn find_by_owner(&mut self, owner_id: OwnerId)
    -> Result<Vec<CreatureRecord>, RosterError>;

    async fn save(&mut self, record: CreatureRecord) -> Result<(), RosterError>;

    async fn commit(&mut self) -> Result<(), RosterError>;

    async fn rollback(&mut self);
}

pub trait ReleaseGate: Send + Sync {
    fn draw(&self) -> Result<GateDraw, MechanicsError>;

    /// Undoes the latest `Accepted(prime)` draw after its release failed to commit.
    fn revert_accept(&self, prime: i64);
}

pub trait CatchRoll: Send + Sync {
    fn attempt_catch(&self) -> bool;
}

impl ReleaseGate for PrimeGate {
    fn draw(&self) -> Result<GateDraw, MechanicsError> {
        PrimeGate::draw(self)
    }

    fn revert_accept(&self, prime: i64) {
        PrimeGate::revert_accept(self, prime);
    }
}

impl CatchRoll for CatchDice {
    fn attempt_catch(&self) -> bool {
        CatchDice::attempt_catch(self)
    }
}
