//! The non-authoritative local mirror of the joined room.
//!
//! `LocalGame` is what the UI renders. It is rebuilt from pushed
//! snapshots only; optimistic local edits never land here, so a write
//! that is lost to a concurrent last-write-wins merge disappears from
//! the mirror as soon as the winning snapshot arrives.

use crate::types::{GameStatus, PlayerId, Question, Room, RoomCode};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalGame {
    pub room_code: Option<RoomCode>,
    pub status: GameStatus,
    /// Value currently painted by the local countdown ticker
    pub countdown_display: Option<u32>,
    pub pack_display_name: Option<String>,
    pub question_index: usize,
    pub total_questions: usize,
    pub current_question: Option<Question>,
    pub current_player_id: Option<PlayerId>,
    pub my_turn: bool,
    /// We slipped into a game that started while our join was in flight
    pub spectator: bool,
    pub roster: Vec<RosterEntry>,
    pub active_dare: Option<DareView>,
    /// Final standings, filled when the game finishes
    pub results: Vec<ScoreLine>,
    pub removed: bool,
    pub room_closed: bool,
    pub rematch_declined: bool,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub player_id: PlayerId,
    pub name: String,
    pub score: u32,
    pub is_host: bool,
    pub is_connected: bool,
    pub ready: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreLine {
    pub player_id: PlayerId,
    pub name: String,
    pub score: u32,
}

/// An in-flight dare vote as the voters see it
#[derive(Debug, Clone, PartialEq)]
pub struct DareView {
    pub performer_id: PlayerId,
    pub performer_name: String,
    pub text: String,
    pub point_value: u32,
    pub yes_votes: usize,
    pub no_votes: usize,
    /// How many ballots the round waits for
    pub voters_total: usize,
}

/// Roster rows in turn order
pub(crate) fn roster_of(room: &Room) -> Vec<RosterEntry> {
    room.turn_order()
        .into_iter()
        .filter_map(|id| {
            room.players.get(&id).map(|p| RosterEntry {
                player_id: id.clone(),
                name: p.name.clone(),
                score: p.score,
                is_host: p.is_host,
                is_connected: p.is_connected,
                ready: p.ready,
            })
        })
        .collect()
}

/// Standings sorted by score descending, name ascending on ties
pub(crate) fn results_of(room: &Room) -> Vec<ScoreLine> {
    let mut lines: Vec<ScoreLine> = room
        .players
        .iter()
        .map(|(id, p)| ScoreLine {
            player_id: id.clone(),
            name: p.name.clone(),
            score: p.score,
        })
        .collect();
    lines.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.player_id.cmp(&b.player_id))
    });
    lines
}
