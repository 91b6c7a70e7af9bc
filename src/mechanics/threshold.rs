use rand::Rng;

pub const MIN_THRESHOLD: u32 = 10;
pub const MAX_THRESHOLD: u32 = 100;

const WALK_STEPS: usize = 5;
const MIN_STEP: u32 = 5;
const MAX_STEP_EXCLUSIVE: u32 = 20;

/// Number of decoys the release gate hands out before it lets a prime through.
///
/// Starts uniformly in `[MIN_THRESHOLD, MAX_THRESHOLD]` and takes five bounded steps,
/// up on even steps and down on odd ones.
pub fn generate_threshold<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    let mut value = rng.gen_range(MIN_THRESHOLD..=MAX_THRESHOLD);

    for step in 0..WALK_STEPS {
        let delta = rng.gen_range(MIN_STEP..MAX_STEP_EXCLUSIVE);
        value = if step % 2 == 0 {
            value.saturating_add(delta).min(MAX_THRESHOLD)
        } else {
            value.saturating_sub(delta).max(MIN_THRESHOLD)
        };
    }

    value
}
