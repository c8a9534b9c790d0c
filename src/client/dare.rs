//! Dares and the majority vote that scores them.
//!
//! The turn holder can offer a dare instead of answering. Everyone else
//! who is connected votes on whether it was actually performed; the vote
//! carries at ceil(n/2) yes ballots and pays out half the question's
//! points. Outcomes are applied exactly once, keyed by a resolution
//! token derived from the performer and the dare's assignment timestamp.

use super::{mirror::DareView, now_rfc3339, GameClient, IntakeState};
use crate::error::{SyncError, SyncResult};
use crate::store::{path, Patch};
use crate::types::{DareAssignment, PlayerId, Room, QUESTION_POINTS};
use crate::vote::{self, VoteOutcome, VotePolicy, VoteRound};
use serde_json::{json, Value};

impl GameClient {
    /// Offer a dare instead of answering the current question. Turn
    /// holder only.
    pub async fn start_dare(&self, text: &str) -> SyncResult<()> {
        let code = self.session_code().await?;
        let game = self.inner.mirror.borrow().clone();
        if !game.my_turn {
            return Err(SyncError::NotYourTurn);
        }
        if game.active_dare.is_some() {
            return Err(SyncError::InvalidOperation("a dare is already in progress"));
        }
        let dare = DareAssignment {
            text: text.to_string(),
            timestamp: now_rfc3339(),
            point_value: QUESTION_POINTS,
        };
        let mut patch = Patch::new();
        patch.insert("performingDare".to_string(), json!(true));
        patch.insert(
            "currentDarePlayerId".to_string(),
            json!(self.inner.player_id),
        );
        patch.insert("currentDare".to_string(), serde_json::to_value(&dare)?);
        self.write_update(&code, patch).await?;
        tracing::info!("dare offered for {} points", dare.point_value);
        Ok(())
    }

    /// Ballot on whether the current dare was performed. The performer
    /// does not get a say in their own dare.
    pub async fn vote_dare(&self, performed: bool) -> SyncResult<()> {
        let code = self.session_code().await?;
        let game = self.inner.mirror.borrow().clone();
        let Some(dare) = game.active_dare else {
            return Err(SyncError::InvalidOperation("no dare vote in progress"));
        };
        if dare.performer_id == self.inner.player_id {
            return Err(SyncError::InvalidOperation(
                "the performer does not vote on their own dare",
            ));
        }
        let mut patch = Patch::new();
        patch.insert(path::dare_vote(&self.inner.player_id), json!(performed));
        self.write_update(&code, patch).await
    }

    /// Track the dare vote in a snapshot: project the tally into the
    /// mirror and, on the host, apply the outcome exactly once.
    pub(crate) async fn observe_dare(&self, intake: &mut IntakeState, room: &Room, am_host: bool) {
        if !room.performing_dare {
            self.inner.mirror.send_if_modified(|g| {
                let had = g.active_dare.is_some();
                g.active_dare = None;
                had
            });
            return;
        }
        let (Some(performer), Some(dare)) = (&room.current_dare_player_id, &room.current_dare)
        else {
            return;
        };

        // Ballot box: every connected player except the performer. The
        // required set tracks presence, so a voter who drops out stops
        // blocking resolution.
        let required: Vec<PlayerId> = room
            .connected_players()
            .map(|(id, _)| id.clone())
            .filter(|id| id != performer)
            .collect();
        let mut round = VoteRound::new(VotePolicy::Majority, required);
        for (id, ballot) in &room.dare_votes {
            round.record(id.clone(), *ballot);
        }

        let view = DareView {
            performer_id: performer.clone(),
            performer_name: room
                .players
                .get(performer)
                .map(|p| p.name.clone())
                .unwrap_or_default(),
            text: dare.text.clone(),
            point_value: dare.point_value,
            yes_votes: round.yes_count(),
            no_votes: round.no_count(),
            voters_total: round.required_count(),
        };
        self.inner.mirror.send_if_modified(|g| {
            if g.active_dare.as_ref() != Some(&view) {
                g.active_dare = Some(view.clone());
                true
            } else {
                false
            }
        });

        let outcome = round.outcome();
        if outcome == VoteOutcome::Pending || !am_host {
            return;
        }

        let token = vote::resolution_token(performer, &dare.timestamp);
        if room.last_dare_processed.as_deref() == Some(token.as_str())
            || intake.last_dare_token.as_deref() == Some(token.as_str())
        {
            tracing::debug!("dare {} already resolved", token);
            return;
        }
        intake.last_dare_token = Some(token.clone());

        let mut patch = Patch::new();
        if outcome == VoteOutcome::Completed {
            let award = dare.point_value / 2;
            // A performer who left the room has no entry anymore; a
            // score merge would re-create it as a ghost player
            if let Some(p) = room.players.get(performer) {
                patch.insert(path::player_field(performer, "score"), json!(p.score + award));
                tracing::info!(
                    "dare passed ({} yes / {} no), {} points to {}",
                    round.yes_count(),
                    round.no_count(),
                    award,
                    performer
                );
            } else {
                tracing::info!("dare passed, but {} already left the room", performer);
            }
        } else {
            tracing::info!(
                "dare failed ({} yes / {} no), no points",
                round.yes_count(),
                round.no_count()
            );
        }
        patch.insert("performingDare".to_string(), json!(false));
        patch.insert("currentDarePlayerId".to_string(), Value::Null);
        patch.insert("currentDare".to_string(), Value::Null);
        patch.insert("dareVotes".to_string(), Value::Null);
        patch.insert("lastDareProcessed".to_string(), json!(token));

        let Ok(code) = self.session_code().await else {
            return;
        };
        if let Err(e) = self.write_update(&code, patch).await {
            tracing::warn!("dare resolution write failed: {}", e);
        }
    }
}
