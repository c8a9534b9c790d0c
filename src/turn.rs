//! Pure helpers for the turn and countdown state machine.
//!
//! The room status walks waiting -> playing -> finished, with finished ->
//! waiting reserved for a rematch reset. The pre-game countdown is not a
//! stored status: it is a countdown block in the room document that every
//! client turns into a local ticker, seeded from the shared start
//! timestamp so that late or clock-skewed observers land on the right
//! number instead of restarting from the top.

use crate::types::{GameStatus, PlayerId};
use chrono::{DateTime, Utc};

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TransitionError {
    #[error("invalid status transition {from:?} -> {to:?}")]
    Invalid { from: GameStatus, to: GameStatus },
}

/// Check a status transition against the allowed table
pub fn check_transition(from: GameStatus, to: GameStatus) -> Result<(), TransitionError> {
    use GameStatus::*;
    match (from, to) {
        (Waiting, Playing) => Ok(()),
        (Playing, Finished) => Ok(()),
        // Rematch reset
        (Finished, Waiting) => Ok(()),
        (from, to) => Err(TransitionError::Invalid { from, to }),
    }
}

/// Next player in rotation order, wrapping from the last back to the
/// first. A current player no longer in the order (removed or unknown)
/// falls back to the head of the order.
pub fn next_player(order: &[PlayerId], current: &PlayerId) -> Option<PlayerId> {
    if order.is_empty() {
        return None;
    }
    match order.iter().position(|id| id == current) {
        Some(i) => Some(order[(i + 1) % order.len()].clone()),
        None => Some(order[0].clone()),
    }
}

/// Seed for the local countdown ticker, derived from the shared start
/// timestamp.
///
/// Returns the number to begin ticking from, or `None` when the whole
/// countdown window has already elapsed (the observer joined too late and
/// should treat the countdown as finished). A start timestamp in the
/// observer's future (clock skew) clamps to the full starting value.
pub fn countdown_seed(start: DateTime<Utc>, now: DateTime<Utc>, from: u32) -> Option<u32> {
    let elapsed = (now - start).num_seconds();
    if elapsed < 0 {
        return Some(from);
    }
    if elapsed >= from as i64 {
        return None;
    }
    Some(from - elapsed as u32)
}

/// Whether answering the question at `index` exhausts the game
pub fn is_last_question(index: usize, total: usize) -> bool {
    index + 1 >= total
}
