//! Path schema for room documents.
//!
//! A room lives under `rooms/{code}`. Intent writes are expressed as
//! patches of paths relative to that root, so the helpers here come in
//! two flavors: `room` builds the absolute root, everything else builds
//! relative paths for use inside patches.

use crate::types::{PlayerId, RoomCode};

/// Absolute root of a room document
pub fn room(code: &RoomCode) -> String {
    format!("rooms/{code}")
}

/// A player's entry, relative to the room root
pub fn player(id: &PlayerId) -> String {
    format!("players/{id}")
}

/// A single field of a player's entry, relative to the room root
pub fn player_field(id: &PlayerId, field: &str) -> String {
    format!("players/{id}/{field}")
}

/// An answer slot for one player on one question, relative to the room root
pub fn answer(question_index: usize, id: &PlayerId) -> String {
    format!("answers/{question_index}/{id}")
}

/// A player's ballot on the active dare, relative to the room root
pub fn dare_vote(id: &PlayerId) -> String {
    format!("dareVotes/{id}")
}

/// A player's rematch ballot, relative to the room root
pub fn rematch_vote(id: &PlayerId) -> String {
    format!("rematchVotes/{id}")
}

/// The kick flag the host writes when removing a player, relative to
/// the room root
pub fn removed_flag(id: &PlayerId) -> String {
    format!("removedPlayers/{id}")
}
