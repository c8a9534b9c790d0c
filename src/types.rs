use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Opaque ID types for type safety
pub type PlayerId = String;
pub type PackId = String;
pub type QuestionId = String;

/// Points awarded for a correct trivia answer
pub const QUESTION_POINTS: u32 = 100;

/// Character set for room codes (uppercase letters and digits)
const CODE_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_LENGTH: usize = 4;

/// A 4-character room join code, always stored uppercase
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Generate a random room code. Codes are not checked for collisions;
    /// at party scale the odds are accepted.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let code = (0..CODE_LENGTH)
            .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
            .collect();
        Self(code)
    }

    /// Normalize user input into code form (trim whitespace, uppercase)
    pub fn normalize(input: &str) -> Self {
        Self(input.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    #[default]
    Waiting,
    Playing,
    Finished,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameSettings {
    /// Seconds a player has to answer a question
    pub time_limit: u32,
    /// Number of questions played before the game finishes
    pub rounds: u32,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            time_limit: 30,
            rounds: 5,
        }
    }
}

/// A trivia question embedded into the room document so that every client
/// shares the exact same text and option order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub options: Vec<String>,
    pub correct_option: usize,
}

/// The selected pack plus its full question list, written once by the host
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameData {
    pub pack_id: PackId,
    pub pack_name: String,
    pub pack_display_name: String,
    #[serde(default)]
    pub questions: Vec<Question>,
    pub total_questions: usize,
}

/// Shared countdown block. `start_timestamp` is the wall-clock seed every
/// client derives its local countdown from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CountdownState {
    pub value: u32,
    pub in_progress: bool,
    pub start_timestamp: String, // RFC3339
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Player {
    pub name: String,
    pub is_host: bool,
    pub score: u32,
    pub is_connected: bool,
    pub ready: bool,
    pub platform: String,
    pub joined_at: String, // RFC3339
}

impl Default for Player {
    fn default() -> Self {
        Self {
            name: String::new(),
            is_host: false,
            score: 0,
            is_connected: true,
            ready: false,
            platform: String::new(),
            joined_at: String::new(),
        }
    }
}

/// The dare the current player is performing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DareAssignment {
    pub text: String,
    pub timestamp: String, // RFC3339, part of the resolution token
    pub point_value: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub player_id: PlayerId,
    pub answer: usize,
    pub is_correct: bool,
    pub timestamp: String, // RFC3339
}

/// The full room document as it lives in the shared store.
///
/// Every field is defaulted so that partial documents observed mid-merge
/// still deserialize; absent maps parse as empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Room {
    pub game_status: GameStatus,
    pub host_id: PlayerId,
    pub created_at: String, // RFC3339
    pub game_settings: GameSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_data: Option<GameData>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub players: HashMap<PlayerId, Player>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_question_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_player_id: Option<PlayerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countdown: Option<CountdownState>,
    pub performing_dare: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_dare_player_id: Option<PlayerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_dare: Option<DareAssignment>,
    /// Ballots for the currently active dare vote
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub dare_votes: HashMap<PlayerId, bool>,
    /// question index (as string key) -> player id -> answer
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub answers: HashMap<String, HashMap<PlayerId, AnswerRecord>>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub rematch_votes: HashMap<PlayerId, bool>,
    /// Resolution token of the last dare that was scored (exactly-once guard)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_dare_processed: Option<String>,
    /// Players the host kicked; the flag outlives the player entry and
    /// blocks a rejoin under the same id
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub removed_players: HashMap<PlayerId, bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
}

impl Room {
    /// Players currently marked connected
    pub fn connected_players(&self) -> impl Iterator<Item = (&PlayerId, &Player)> {
        self.players.iter().filter(|(_, p)| p.is_connected)
    }

    /// Deterministic turn order shared by all observers: sorted by join
    /// time, ties broken by player id
    pub fn turn_order(&self) -> Vec<PlayerId> {
        let mut order: Vec<(&String, &Player)> = self.players.iter().collect();
        order.sort_by(|(a_id, a), (b_id, b)| {
            a.joined_at.cmp(&b.joined_at).then_with(|| a_id.cmp(b_id))
        });
        order.into_iter().map(|(id, _)| id.clone()).collect()
    }

    /// Pick the host successor when the current host leaves: earliest
    /// joiner among the remaining players
    pub fn successor_host(&self, leaving: &PlayerId) -> Option<PlayerId> {
        self.turn_order().into_iter().find(|id| id != leaving)
    }

    /// The question currently being asked, if the game carries a pack
    pub fn current_question(&self) -> Option<&Question> {
        let idx = self.current_question_index?;
        self.game_data.as_ref()?.questions.get(idx)
    }
}
