pub mod error;
pub mod persistence;
pub mod ports;
pub mod service;
pub mod store;
pub mod types;

pub use error::{RosterError, RosterErrorKind};
pub use persistence::RosterPersistence;
pub use ports::{CatchRoll, ReleaseGate, RosterRepository, RosterUnitOfWork};
pub use service::RosterService;
pub use store::InMemoryRosterStore;
pub use types::{CreatureId, CreatureRecord, CreatureStatus, OwnerId};
