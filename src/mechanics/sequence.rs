use std::{collections::HashMap, sync::Mutex};

/// Returns the n-th Fibonacci term with `F(0) = 0` and `F(1) = 1`.
///
/// Non-positive inputs yield 0. Terms past `u64::MAX` saturate instead of wrapping.
pub fn fibonacci(n: i64) -> u64 {
    if n <= 0 {
        return 0;
    }
    if n == 1 {
        return 1;
    }

    let (mut previous, mut current) = (0_u64, 1_u64);
    for _ in 2..=n {
        let next = previous.saturating_add(current);
        previous = current;
        current = next;
    }
    current
}

/// Per-key cursor into the Fibonacci sequence.
///
/// Each key advances independently; the map lives as long as the owner keeps it and
/// is never pruned.
#[derive(Debug, Default)]
pub struct SequenceCounters {
    indices: Mutex<HashMap<String, i64>>,
}

impl SequenceCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_value(&self, key: &str) -> u64 {
        let key = key.trim();
        if key.is_empty() {
            return 0;
        }

        let mut indices = self.indices.lock().expect("lock poisoned");
        let index = indices.entry(key.to_string()).or_insert(0);
        let value = fibonacci(*index);
        *index = index.saturating_add(1);
        value
    }

    /// Steps `key` back by one draw. A key at index 0 stays there.
    pub fn rewind(&self, key: &str) {
        let mut indices = self.indices.lock().expect("lock poisoned");
        if let Some(index) = indices.get_mut(key.trim()) {
            *index = index.saturating_sub(1).max(0);
        }
    }

    pub fn peek_index(&self, key: &str) -> i64 {
        let indices = self.indices.lock().expect("lock poisoned");
        indices.get(key.trim()).copied().unwrap_or(0)
    }

    pub fn tracked_keys(&self) -> usize {
        self.indices.lock().expect("lock poisoned").len()
    }
}
