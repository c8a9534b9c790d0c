//! Trivia pack content behind small provider seams.
//!
//! Downloading, caching and purchase flows live outside this crate. What
//! the game core needs is an ordered question list per pack id (so every
//! client shares identical question order once the host embeds it into
//! the room) and an entitlement check gating which packs a host may
//! select.

use crate::error::SyncError;
use crate::types::{PackId, Question};
use async_trait::async_trait;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct PackMeta {
    pub id: PackId,
    pub name: String,
    pub display_name: String,
}

/// Source of trivia pack content
#[async_trait]
pub trait PackLoader: Send + Sync {
    /// Metadata for a pack, if the pack exists
    async fn pack_meta(&self, pack_id: &str) -> Option<PackMeta>;

    /// The ordered question list for a pack
    async fn load_questions(&self, pack_id: &str) -> Result<Vec<Question>, SyncError>;
}

/// Which packs the local user may select as host
pub trait Entitlements: Send + Sync {
    fn is_unlocked(&self, pack_id: &str) -> bool;
}

/// Everything unlocked (tests and the demo binary)
pub struct AllUnlocked;

impl Entitlements for AllUnlocked {
    fn is_unlocked(&self, _pack_id: &str) -> bool {
        true
    }
}

/// A fixed unlocked set
pub struct UnlockedSet(HashSet<String>);

impl UnlockedSet {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(ids.into_iter().map(Into::into).collect())
    }
}

impl Entitlements for UnlockedSet {
    fn is_unlocked(&self, pack_id: &str) -> bool {
        self.0.contains(pack_id)
    }
}

/// Built-in packs shipped with the crate, used by tests and the demo
pub struct BundledPacks;

impl BundledPacks {
    pub fn pack_ids() -> Vec<&'static str> {
        vec!["general-1", "science-1"]
    }

    fn find(pack_id: &str) -> Option<(PackMeta, Vec<Question>)> {
        match pack_id {
            "general-1" => Some((
                PackMeta {
                    id: "general-1".to_string(),
                    name: "general_knowledge".to_string(),
                    display_name: "General Knowledge".to_string(),
                },
                questions(
                    "gk",
                    &[
                        (
                            "Which planet has the most confirmed moons?",
                            ["Saturn", "Jupiter", "Uranus", "Neptune"],
                            0,
                        ),
                        (
                            "What is the capital of Australia?",
                            ["Sydney", "Melbourne", "Canberra", "Perth"],
                            2,
                        ),
                        (
                            "How many strings does a standard violin have?",
                            ["Three", "Four", "Five", "Six"],
                            1,
                        ),
                        (
                            "Which ocean is the deepest?",
                            ["Atlantic", "Indian", "Pacific", "Arctic"],
                            2,
                        ),
                        (
                            "In which year did the first iPhone go on sale?",
                            ["2005", "2006", "2007", "2008"],
                            2,
                        ),
                        (
                            "Which element has the chemical symbol Au?",
                            ["Silver", "Gold", "Aluminium", "Argon"],
                            1,
                        ),
                    ],
                ),
            )),
            "science-1" => Some((
                PackMeta {
                    id: "science-1".to_string(),
                    name: "science".to_string(),
                    display_name: "Science & Nature".to_string(),
                },
                questions(
                    "sci",
                    &[
                        (
                            "Which gas do plants absorb from the air?",
                            ["Oxygen", "Nitrogen", "Carbon dioxide", "Helium"],
                            2,
                        ),
                        (
                            "How many bones are in the adult human body?",
                            ["196", "206", "216", "226"],
                            1,
                        ),
                        (
                            "Roughly how fast does light travel in a vacuum?",
                            ["300 km/s", "3,000 km/s", "300,000 km/s", "3,000,000 km/s"],
                            2,
                        ),
                        (
                            "Which planet is known as the Red Planet?",
                            ["Venus", "Mars", "Jupiter", "Mercury"],
                            1,
                        ),
                        (
                            "At what temperature does water boil at sea level?",
                            ["90 °C", "100 °C", "110 °C", "120 °C"],
                            1,
                        ),
                        (
                            "What is the largest organ of the human body?",
                            ["The liver", "The brain", "The skin", "The lungs"],
                            2,
                        ),
                    ],
                ),
            )),
            _ => None,
        }
    }
}

fn questions(prefix: &str, items: &[(&str, [&str; 4], usize)]) -> Vec<Question> {
    items
        .iter()
        .enumerate()
        .map(|(i, (text, options, correct))| Question {
            id: format!("{}-{}", prefix, i + 1),
            text: text.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_option: *correct,
        })
        .collect()
}

#[async_trait]
impl PackLoader for BundledPacks {
    async fn pack_meta(&self, pack_id: &str) -> Option<PackMeta> {
        Self::find(pack_id).map(|(meta, _)| meta)
    }

    async fn load_questions(&self, pack_id: &str) -> Result<Vec<Question>, SyncError> {
        Self::find(pack_id)
            .map(|(_, questions)| questions)
            .ok_or_else(|| SyncError::PackNotFound(pack_id.to_string()))
    }
}
