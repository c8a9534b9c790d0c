//! Content signatures over behavior-relevant slices of the room document.
//!
//! Remote snapshots arrive repeatedly (every write to the room fans out to
//! every subscriber, including the writer itself). Each client keeps the
//! signature of the last state it applied per concern and skips snapshots
//! whose signature is unchanged, which makes intake idempotent.

use crate::types::{CountdownState, Room};
use sha2::{Digest, Sha256};

/// Signatures are truncated hex digests; 16 chars is plenty for change
/// detection within a single session
const SIGNATURE_LEN: usize = 16;

/// Hash a list of fields into a short hex signature. Fields are joined
/// with a separator so adjacent values cannot collide by concatenation.
pub fn content_signature(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            hasher.update([b'|']);
        }
        hasher.update(part.as_bytes());
    }
    let mut sig = hex::encode(hasher.finalize());
    sig.truncate(SIGNATURE_LEN);
    sig
}

/// Signature over the game-progress fields: status, question index,
/// whose turn it is, dare state, selected pack
pub fn game_signature(room: &Room) -> String {
    let status = format!("{:?}", room.game_status);
    let index = room
        .current_question_index
        .map(|i| i.to_string())
        .unwrap_or_default();
    let pack = room
        .game_data
        .as_ref()
        .map(|d| d.pack_name.as_str())
        .unwrap_or("");
    content_signature(&[
        &status,
        &index,
        room.current_player_id.as_deref().unwrap_or(""),
        if room.performing_dare { "1" } else { "0" },
        room.current_dare_player_id.as_deref().unwrap_or(""),
        pack,
    ])
}

/// Signature over the shared countdown block
pub fn countdown_signature(countdown: Option<&CountdownState>) -> String {
    match countdown {
        Some(c) => content_signature(&[
            &c.value.to_string(),
            if c.in_progress { "1" } else { "0" },
            &c.start_timestamp,
        ]),
        None => content_signature(&[""]),
    }
}

/// Signature over the roster as the UI sees it: ordered (name, score)
/// pairs plus the host, connection, and ready flags
pub fn roster_signature(room: &Room) -> String {
    let mut entries: Vec<String> = room
        .players
        .iter()
        .map(|(id, p)| {
            format!(
                "{}:{}:{}:{}:{}:{}",
                id, p.name, p.score, p.is_host as u8, p.is_connected as u8, p.ready as u8
            )
        })
        .collect();
    entries.sort();
    let refs: Vec<&str> = entries.iter().map(|s| s.as_str()).collect();
    content_signature(&refs)
}
