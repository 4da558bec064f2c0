use crate::block::{now_millis, Block};
use crate::constants::{MIN_DIFFICULTY, TARGET_BLOCK_INTERVAL_MS};

/// Difficulty for the block that will follow `last`, judged by the wall clock.
pub fn next_difficulty(last: &Block) -> u32 {
    next_difficulty_at(last, now_millis())
}

/// Reacts to the single most recent gap only: faster than half the target
/// interval raises difficulty by one, slower than twice the target lowers it by
/// one. No smoothing, so alternating fast and slow blocks will oscillate.
pub fn next_difficulty_at(last: &Block, now_ms: u64) -> u32 {
    let elapsed = now_ms.saturating_sub(last.timestamp);
    if elapsed < TARGET_BLOCK_INTERVAL_MS / 2 {
        last.difficulty.saturating_add(1)
    } else if elapsed > TARGET_BLOCK_INTERVAL_MS * 2 {
        last.difficulty.saturating_sub(1).max(MIN_DIFFICULTY)
    } else {
        last.difficulty.max(MIN_DIFFICULTY)
    }
}
