pub mod catch_dice;
pub mod error;
pub mod nickname;
pub mod prime_gate;
pub mod sequence;
pub mod threshold;

pub use catch_dice::CatchDice;
pub use error::{MechanicsError, MechanicsErrorKind};
pub use nickname::derive_nickname;
pub use prime_gate::{GateDraw, PrimeGate, PrimeGateSnapshot, is_prime};
pub use sequence::{SequenceCounters, fibonacci};
pub use threshold::generate_threshold;
