use std::{collections::BTreeSet, sync::Mutex};

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::mechanics::{
    error::{MechanicsError, exhausted, not_prime, out_of_range},
    threshold::generate_threshold,
};

pub const MIN_PRIME: i64 = 1;
pub const MAX_PRIME: i64 = 20;

pub const CANONICAL_PRIMES: [i64; 8] = [2, 3, 5, 7, 11, 13, 17, 19];
pub const CANONICAL_DECOYS: [i64; 12] = [1, 4, 6, 8, 9, 10, 12, 14, 15, 16, 18, 20];

/// Outcome of a single gate draw. A rejection is the normal "try again" path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDraw {
    Accepted(i64),
    Rejected(i64),
}

impl GateDraw {
    pub fn number(self) -> i64 {
        match self {
            GateDraw::Accepted(number) | GateDraw::Rejected(number) => number,
        }
    }

    pub fn is_accepted(self) -> bool {
        matches!(self, GateDraw::Accepted(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimeGateSnapshot {
    pub attempts: u32,
    pub attempts_threshold: u32,
    pub available_primes: Vec<i64>,
    pub used_primes: BTreeSet<i64>,
    pub available_decoys: usize,
}

#[derive(Debug)]
struct PrimeGateState {
    available_primes: Vec<i64>,
    available_decoys: Vec<i64>,
    used_primes: BTreeSet<i64>,
    attempts: u32,
    attempts_threshold: u32,
    last_accepted: Option<AcceptedDraw>,
    rng: StdRng,
}

#[derive(Debug, Clone, Copy)]
struct AcceptedDraw {
    prime: i64,
    attempts_threshold: u32,
}

impl PrimeGateState {
    fn draw(&mut self) -> Result<GateDraw, MechanicsError> {
        if self.attempts < self.attempts_threshold {
            if self.available_decoys.is_empty() {
                self.available_decoys.extend_from_slice(&CANONICAL_DECOYS);
            }
            let decoy = take_random(&mut self.available_decoys, &mut self.rng)
                .ok_or_else(|| exhausted("decoy"))?;
            self.attempts += 1;
            return Ok(GateDraw::Rejected(decoy));
        }

        if self.available_primes.is_empty() {
            self.available_primes.extend_from_slice(&CANONICAL_PRIMES);
            self.used_primes.clear();
        }
        let prime = take_random(&mut self.available_primes, &mut self.rng)
            .ok_or_else(|| exhausted("prime"))?;

        self.used_primes.insert(prime);
        self.last_accepted = Some(AcceptedDraw {
            prime,
            attempts_threshold: self.attempts_threshold,
        });
        self.attempts = 0;
        self.attempts_threshold = generate_threshold(&mut self.rng);
        Ok(GateDraw::Accepted(prime))
    }

    fn revert_accept(&mut self, prime: i64) -> bool {
        match self.last_accepted {
            Some(accepted) if accepted.prime == prime => {
                self.last_accepted = None;
                self.used_primes.remove(&prime);
                self.available_primes.push(prime);
                self.attempts = accepted.attempts_threshold;
                self.attempts_threshold = accepted.attempts_threshold;
                true
            }
            _ => false,
        }
    }
}

/// Release gate that hands out `attempts_threshold` decoys before each unused prime.
///
/// Pool state and counters live for as long as the gate does; one gate is meant to be
/// shared by every release issued through a roster service.
#[derive(Debug)]
pub struct PrimeGate {
    state: Mutex<PrimeGateState>,
}

impl PrimeGate {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_rng(mut rng: StdRng) -> Self {
        let threshold = generate_threshold(&mut rng);
        Self::with_threshold(threshold, rng)
    }

    pub fn with_threshold(attempts_threshold: u32, rng: StdRng) -> Self {
        Self {
            state: Mutex::new(PrimeGateState {
                available_primes: CANONICAL_PRIMES.to_vec(),
                available_decoys: CANONICAL_DECOYS.to_vec(),
                used_primes: BTreeSet::new(),
                attempts: 0,
                attempts_threshold,
                last_accepted: None,
                rng,
            }),
        }
    }

    pub fn draw(&self) -> Result<GateDraw, MechanicsError> {
        let mut state = self.state.lock().expect("lock poisoned");
        let attempts_before = state.attempts;
        let threshold_before = state.attempts_threshold;
        let outcome = state.draw()?;

        tracing::debug!(
            target: "mechanics.gate",
            attempts = attempts_before,
            attempts_threshold = threshold_before,
            number = outcome.number(),
            accepted = outcome.is_accepted(),
            next_threshold = state.attempts_threshold,
            "gate_draw"
        );
        Ok(outcome)
    }

    /// Hands the most recently accepted prime back to the pool and restores the attempt
    /// counter, so the next draw accepts again. Only the latest acceptance can be reverted.
    pub fn revert_accept(&self, prime: i64) -> bool {
        let mut state = self.state.lock().expect("lock poisoned");
        let reverted = state.revert_accept(prime);
        tracing::debug!(target: "mechanics.gate", prime, reverted, "gate_accept_reverted");
        reverted
    }

    pub fn snapshot(&self) -> PrimeGateSnapshot {
        let state = self.state.lock().expect("lock poisoned");
        PrimeGateSnapshot {
            attempts: state.attempts,
            attempts_threshold: state.attempts_threshold,
            available_primes: state.available_primes.clone(),
            used_primes: state.used_primes.clone(),
            available_decoys: state.available_decoys.len(),
        }
    }
}

impl Default for PrimeGate {
    fn default() -> Self {
        Self::new()
    }
}

pub fn is_prime(number: i64) -> Result<(), MechanicsError> {
    if !(MIN_PRIME..=MAX_PRIME).contains(&number) {
        return Err(out_of_range(number));
    }

    if CANONICAL_PRIMES.contains(&number) {
        Ok(())
    } else {
        Err(not_prime(number))
    }
}

fn take_random<R: Rng + ?Sized>(pool: &mut Vec<i64>, rng: &mut R) -> Option<i64> {
    if pool.is_empty() {
        return None;
    }
    let index = rng.gen_range(0..pool.len());
    Some(pool.swap_remove(index))
}
