use std::sync::Mutex;

use rand::{Rng, SeedableRng, rngs::StdRng};

pub const CATCH_SUCCESS_CEILING: f64 = 0.5;

pub fn roll_succeeds(roll: f64) -> bool {
    roll <= CATCH_SUCCESS_CEILING
}

#[derive(Debug)]
pub struct CatchDice {
    rng: Mutex<StdRng>,
}

impl CatchDice {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }

    pub fn attempt_catch(&self) -> bool {
        let roll: f64 = self.rng.lock().expect("lock poisoned").r#gen();
        roll_succeeds(roll)
    }
}

impl Default for CatchDice {
    fn default() -> Self {
        Self::new()
    }
}
