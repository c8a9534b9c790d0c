//! Turn and countdown operations: starting the game, rotating turns,
//! finishing, and the rematch vote.
//!
//! The host is the only writer of whole-game transitions. Everything it
//! decides is derived from the shared document, so a transferred host
//! picks up exactly where the old one left off.

use super::{now_rfc3339, GameClient, IntakeState};
use crate::error::{SyncError, SyncResult};
use crate::store::{path, Patch};
use crate::turn;
use crate::types::{AnswerRecord, CountdownState, GameStatus, PlayerId, Room, QUESTION_POINTS};
use crate::vote::{self, VoteOutcome, VotePolicy, VoteRound};
use serde_json::{json, Value};
use std::sync::atomic::Ordering;

impl GameClient {
    /// Kick off the shared countdown. Host only; the transition to
    /// playing happens when the countdown window elapses.
    pub async fn start_game(&self) -> SyncResult<()> {
        let code = self.ensure_host("start_game").await?;
        let room = self
            .read_room(&code)
            .await?
            .ok_or_else(|| SyncError::RoomNotFound(code.clone()))?;
        turn::check_transition(room.game_status, GameStatus::Playing)?;
        if room.game_data.is_none() {
            return Err(SyncError::InvalidOperation("select a pack before starting"));
        }
        if room.players.len() < 2 {
            return Err(SyncError::InvalidOperation(
                "need at least two players to start",
            ));
        }
        let unready = room
            .players
            .iter()
            .any(|(id, p)| *id != room.host_id && p.is_connected && !p.ready);
        if unready {
            return Err(SyncError::InvalidOperation(
                "all connected players must be ready",
            ));
        }

        let countdown = CountdownState {
            value: self.inner.config.countdown_from,
            in_progress: true,
            start_timestamp: now_rfc3339(),
        };
        let mut patch = Patch::new();
        patch.insert("countdown".to_string(), serde_json::to_value(&countdown)?);
        self.write_update(&code, patch).await?;
        tracing::info!("countdown running in room {}", code);
        Ok(())
    }

    /// Paint the countdown locally from `seed` down to zero. Ticks are
    /// local; only the seed comes from the shared start timestamp.
    pub(crate) fn spawn_countdown_ticker(&self, seed: u32) {
        if self.inner.countdown_running.swap(true, Ordering::SeqCst) {
            return;
        }
        let client = self.clone();
        tokio::spawn(async move {
            let tick = client.inner.config.countdown_tick;
            let mut value = seed;
            loop {
                if client.inner.mirror.borrow().status != GameStatus::Waiting {
                    // Someone already moved the game on; stop painting
                    break;
                }
                client
                    .inner
                    .mirror
                    .send_modify(|g| g.countdown_display = Some(value));
                if value == 0 {
                    break;
                }
                tokio::time::sleep(tick).await;
                value -= 1;
            }
            client.inner.countdown_running.store(false, Ordering::SeqCst);
            if client.inner.is_host.load(Ordering::SeqCst) {
                client.finish_countdown().await;
            }
        });
    }

    /// The countdown window elapsed: the host writes the playing
    /// transition. Latched so overlapping tickers write at most once.
    pub(crate) async fn finish_countdown(&self) {
        if self.inner.start_inflight.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(e) = self.write_playing_transition().await {
            tracing::warn!("playing transition failed: {}", e);
        }
        self.inner.start_inflight.store(false, Ordering::SeqCst);
    }

    async fn write_playing_transition(&self) -> SyncResult<()> {
        let code = self.session_code().await?;
        let Some(room) = self.read_room(&code).await? else {
            return Ok(());
        };
        if turn::check_transition(room.game_status, GameStatus::Playing).is_err() {
            tracing::debug!("room {} already transitioned", code);
            return Ok(());
        }
        let Some(data) = room.game_data.as_ref() else {
            return Ok(());
        };
        let order = room.turn_order();
        let Some(first) = order.first() else {
            return Ok(());
        };

        // The round count is fixed here, not at pack selection, so a
        // settings change made after picking the pack still applies
        let rounds = room.game_settings.rounds as usize;
        let total = if rounds > 0 {
            data.questions.len().min(rounds)
        } else {
            data.questions.len()
        };

        let mut patch = Patch::new();
        patch.insert("gameStatus".to_string(), json!(GameStatus::Playing));
        patch.insert("currentQuestionIndex".to_string(), json!(0));
        patch.insert("currentPlayerId".to_string(), json!(first));
        patch.insert("startedAt".to_string(), json!(now_rfc3339()));
        patch.insert("countdown".to_string(), Value::Null);
        if total != data.total_questions {
            patch.insert("gameData/totalQuestions".to_string(), json!(total));
        }
        tracing::info!(
            "game on in room {}, {} questions, {} goes first",
            code,
            total,
            first
        );
        self.write_update(&code, patch).await
    }

    /// Answer the current question. Turn holder only; a correct answer
    /// banks the points in the same write.
    pub async fn submit_answer(&self, option: usize) -> SyncResult<()> {
        let code = self.session_code().await?;
        let game = self.inner.mirror.borrow().clone();
        if !game.my_turn {
            return Err(SyncError::NotYourTurn);
        }
        if game.active_dare.is_some() {
            return Err(SyncError::InvalidOperation("finish the dare first"));
        }
        let question = game
            .current_question
            .ok_or(SyncError::InvalidOperation("no active question"))?;
        if option >= question.options.len() {
            return Err(SyncError::InvalidOperation("answer option out of range"));
        }

        let me = self.inner.player_id.clone();
        let is_correct = option == question.correct_option;
        let record = AnswerRecord {
            player_id: me.clone(),
            answer: option,
            is_correct,
            timestamp: now_rfc3339(),
        };
        let mut patch = Patch::new();
        patch.insert(
            path::answer(game.question_index, &me),
            serde_json::to_value(&record)?,
        );
        if is_correct {
            // Read the latest score rather than trusting the mirror
            let score = self
                .read_room(&code)
                .await?
                .and_then(|r| r.players.get(&me).map(|p| p.score))
                .unwrap_or(0);
            patch.insert(
                path::player_field(&me, "score"),
                json!(score + QUESTION_POINTS),
            );
            tracing::info!("correct answer, {} points banked", QUESTION_POINTS);
        } else {
            tracing::info!("wrong answer on question {}", game.question_index);
        }
        self.write_update(&code, patch).await
    }

    /// Rotate to the next player, or finish the game after the last
    /// question. Host only.
    pub async fn advance_turn(&self) -> SyncResult<()> {
        let code = self.ensure_host("advance_turn").await?;
        let room = self
            .read_room(&code)
            .await?
            .ok_or_else(|| SyncError::RoomNotFound(code.clone()))?;
        self.advance_turn_from(&room).await
    }

    pub(crate) async fn advance_turn_from(&self, room: &Room) -> SyncResult<()> {
        let code = self.session_code().await?;
        if room.game_status != GameStatus::Playing {
            return Err(SyncError::InvalidOperation("game is not running"));
        }
        let index = room.current_question_index.unwrap_or(0);
        let total = room
            .game_data
            .as_ref()
            .map(|d| d.total_questions)
            .unwrap_or(0);

        let mut patch = Patch::new();
        if turn::is_last_question(index, total) {
            turn::check_transition(room.game_status, GameStatus::Finished)?;
            patch.insert("gameStatus".to_string(), json!(GameStatus::Finished));
            patch.insert("currentPlayerId".to_string(), Value::Null);
            patch.insert("finishedAt".to_string(), json!(now_rfc3339()));
            tracing::info!("last question done, finishing room {}", code);
        } else {
            let order = room.turn_order();
            let current = room.current_player_id.clone().unwrap_or_default();
            let next = turn::next_player(&order, &current)
                .ok_or(SyncError::InvalidOperation("no players left to rotate to"))?;
            patch.insert("currentQuestionIndex".to_string(), json!(index + 1));
            patch.insert("currentPlayerId".to_string(), json!(next));
            tracing::debug!("turn advances to {} (question {})", next, index + 1);
        }
        self.write_update(&code, patch).await
    }

    /// Host reaction to a disconnected turn holder: skip them so the
    /// game cannot stall on a player who is gone.
    pub(crate) async fn advance_dead_turn(&self, intake: &mut IntakeState, room: &Room) {
        if room.game_status != GameStatus::Playing || room.performing_dare {
            return;
        }
        let Some(current) = room.current_player_id.clone() else {
            return;
        };
        let connected = room
            .players
            .get(&current)
            .map(|p| p.is_connected)
            .unwrap_or(false);
        if connected {
            return;
        }
        let index = room.current_question_index.unwrap_or(0);
        if intake.advanced_past.as_ref() == Some(&(current.clone(), index)) {
            // Stale replay of a turn we already skipped
            return;
        }
        intake.advanced_past = Some((current.clone(), index));
        tracing::info!("turn holder {} is disconnected, skipping their turn", current);
        if let Err(e) = self.advance_turn_from(room).await {
            tracing::warn!("dead turn advance failed: {}", e);
        }
    }

    /// Vote on playing the same pack again. Opens once the game is
    /// finished; passing requires every connected player to say yes.
    pub async fn vote_rematch(&self, yes: bool) -> SyncResult<()> {
        let code = self.session_code().await?;
        if self.inner.mirror.borrow().status != GameStatus::Finished {
            return Err(SyncError::InvalidOperation(
                "rematch voting opens when the game is finished",
            ));
        }
        let mut patch = Patch::new();
        patch.insert(path::rematch_vote(&self.inner.player_id), json!(yes));
        self.write_update(&code, patch).await
    }

    /// Evaluate the rematch ballots in a snapshot. Any no flags the
    /// decline locally for everyone; a unanimous yes has the host reset
    /// the room back to the lobby with scores wiped.
    pub(crate) async fn observe_rematch(
        &self,
        intake: &mut IntakeState,
        room: &Room,
        am_host: bool,
    ) {
        if room.game_status != GameStatus::Finished || room.rematch_votes.is_empty() {
            return;
        }
        let required: Vec<PlayerId> = room.connected_players().map(|(id, _)| id.clone()).collect();
        let mut round = VoteRound::new(VotePolicy::Unanimous, required);
        for (voter, yes) in &room.rematch_votes {
            round.record(voter.clone(), *yes);
        }
        match round.outcome() {
            VoteOutcome::Pending => {}
            VoteOutcome::Failed => {
                self.inner.mirror.send_if_modified(|g| {
                    let flip = !g.rematch_declined;
                    g.rematch_declined = true;
                    flip
                });
            }
            VoteOutcome::Completed => {
                if !am_host {
                    return;
                }
                // Keyed to the finished game instance, not the ballots,
                // so the same roster can pass another rematch later
                let token =
                    vote::resolution_token("rematch", room.started_at.as_deref().unwrap_or(""));
                if intake.last_rematch_token.as_deref() == Some(token.as_str()) {
                    return;
                }
                intake.last_rematch_token = Some(token);
                tracing::info!("rematch accepted unanimously, resetting the room");
                if let Err(e) = self.write_rematch_reset(room).await {
                    tracing::warn!("rematch reset failed: {}", e);
                }
            }
        }
    }

    /// Back to the lobby: same pack, zeroed scores, cleared per-game state
    async fn write_rematch_reset(&self, room: &Room) -> SyncResult<()> {
        let code = self.session_code().await?;
        turn::check_transition(room.game_status, GameStatus::Waiting)?;
        let mut patch = Patch::new();
        patch.insert("gameStatus".to_string(), json!(GameStatus::Waiting));
        patch.insert("currentQuestionIndex".to_string(), Value::Null);
        patch.insert("currentPlayerId".to_string(), Value::Null);
        patch.insert("startedAt".to_string(), Value::Null);
        patch.insert("finishedAt".to_string(), Value::Null);
        patch.insert("countdown".to_string(), Value::Null);
        patch.insert("performingDare".to_string(), json!(false));
        patch.insert("currentDarePlayerId".to_string(), Value::Null);
        patch.insert("currentDare".to_string(), Value::Null);
        patch.insert("dareVotes".to_string(), Value::Null);
        patch.insert("answers".to_string(), Value::Null);
        patch.insert("rematchVotes".to_string(), Value::Null);
        patch.insert("lastDareProcessed".to_string(), Value::Null);
        for id in room.players.keys() {
            patch.insert(path::player_field(id, "score"), json!(0));
            patch.insert(path::player_field(id, "ready"), json!(*id == room.host_id));
        }
        self.write_update(&code, patch).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{lobby, playing, test_client, wait_mirror};
    use super::*;
    use crate::store::{MemoryStore, StoreConnection};
    use crate::types::GameSettings;

    #[tokio::test]
    async fn test_start_game_checks_pack_roster_and_readiness() {
        let store = MemoryStore::new();
        let host = test_client(&store).await;
        let code = host.create_room("Ava", "ios").await.unwrap();

        let err = host.start_game().await.unwrap_err();
        assert!(matches!(err, SyncError::InvalidOperation(m) if m.contains("pack")));

        host.select_pack("general-1").await.unwrap();
        let err = host.start_game().await.unwrap_err();
        assert!(matches!(err, SyncError::InvalidOperation(m) if m.contains("two players")));

        let guest = test_client(&store).await;
        guest
            .join_room(code.as_str(), "Ben", "android")
            .await
            .unwrap();
        let err = host.start_game().await.unwrap_err();
        assert!(matches!(err, SyncError::InvalidOperation(m) if m.contains("ready")));

        guest.set_ready(true).await.unwrap();
        host.start_game().await.unwrap();
    }

    #[tokio::test]
    async fn test_countdown_runs_down_and_host_flips_to_playing() {
        let store = MemoryStore::new();
        let (host, guest) = lobby(&store, 5).await;
        host.start_game().await.unwrap();

        // Both sides paint the countdown from the shared seed
        wait_mirror(&guest, |g| g.countdown_display.is_some()).await;

        let host_game = wait_mirror(&host, |g| g.status == GameStatus::Playing).await;
        let guest_game = wait_mirror(&guest, |g| g.status == GameStatus::Playing).await;

        assert_eq!(host_game.question_index, 0);
        assert_eq!(host_game.countdown_display, None);
        assert_eq!(guest_game.countdown_display, None);
        // Host created the room first, so the rotation starts with them
        assert_eq!(host_game.current_player_id.as_ref(), Some(host.player_id()));
        assert!(host_game.my_turn);
        assert!(!guest_game.my_turn);
        assert!(host_game.current_question.is_some());
    }

    #[tokio::test]
    async fn test_starting_a_running_game_is_rejected() {
        let store = MemoryStore::new();
        let (host, _guest) = lobby(&store, 5).await;
        host.start_game().await.unwrap();
        wait_mirror(&host, |g| g.status == GameStatus::Playing).await;

        let err = host.start_game().await.unwrap_err();
        assert!(matches!(err, SyncError::Transition(_)));
    }

    #[tokio::test]
    async fn test_answers_score_only_for_the_turn_holder() {
        let store = MemoryStore::new();
        let (host, guest) = playing(&store, 5).await;

        let err = guest.submit_answer(0).await.unwrap_err();
        assert!(matches!(err, SyncError::NotYourTurn));

        let question = host.mirror().current_question.unwrap();
        host.submit_answer(question.correct_option).await.unwrap();

        let game = wait_mirror(&host, |g| {
            g.roster
                .iter()
                .any(|r| r.player_id == *host.player_id() && r.score == QUESTION_POINTS)
        })
        .await;
        assert_eq!(game.roster.iter().map(|r| r.score).max(), Some(QUESTION_POINTS));
    }

    #[tokio::test]
    async fn test_wrong_answers_record_but_do_not_score() {
        let store = MemoryStore::new();
        let (host, _guest) = playing(&store, 5).await;

        let question = host.mirror().current_question.unwrap();
        let wrong = (question.correct_option + 1) % question.options.len();
        host.submit_answer(wrong).await.unwrap();

        let code = host.mirror().room_code.unwrap();
        let doc = store
            .connect()
            .read(&path::room(&code))
            .await
            .unwrap()
            .unwrap();
        let recorded = &doc["answers"]["0"][host.player_id()];
        assert_eq!(recorded["isCorrect"], serde_json::json!(false));
        assert_eq!(
            doc["players"][host.player_id()]["score"],
            serde_json::json!(0)
        );
    }

    #[tokio::test]
    async fn test_turns_rotate_and_the_last_question_finishes_the_game() {
        let store = MemoryStore::new();
        let (host, guest) = playing(&store, 2).await;

        let err = guest.advance_turn().await.unwrap_err();
        assert!(matches!(err, SyncError::NotHost("advance_turn")));

        host.advance_turn().await.unwrap();
        let game = wait_mirror(&guest, |g| g.my_turn).await;
        assert_eq!(game.question_index, 1);

        host.advance_turn().await.unwrap();
        let game = wait_mirror(&guest, |g| g.status == GameStatus::Finished).await;
        assert!(!game.my_turn);
        assert_eq!(game.results.len(), 2);

        let code = host.mirror().room_code.unwrap();
        let doc = store
            .connect()
            .read(&path::room(&code))
            .await
            .unwrap()
            .unwrap();
        assert!(doc["finishedAt"].is_string());
        assert!(doc.get("currentPlayerId").is_none());
    }

    #[tokio::test]
    async fn test_disconnected_turn_holder_is_skipped() {
        let store = MemoryStore::new();
        let (host, guest) = playing(&store, 5).await;
        host.advance_turn().await.unwrap();
        wait_mirror(&host, |g| {
            g.current_player_id.as_ref() == Some(guest.player_id())
        })
        .await;

        // Guest vanishes without a goodbye
        guest.inner.store.go_offline().await;

        let game = wait_mirror(&host, |g| {
            g.current_player_id.as_ref() == Some(host.player_id())
        })
        .await;
        assert_eq!(game.question_index, 2, "dead turn consumed its question");
    }

    #[tokio::test]
    async fn test_final_results_rank_players_by_score() {
        let store = MemoryStore::new();
        let (host, guest) = playing(&store, 2).await;

        let question = host.mirror().current_question.unwrap();
        host.submit_answer(question.correct_option).await.unwrap();
        host.advance_turn().await.unwrap();

        let game = wait_mirror(&guest, |g| g.my_turn).await;
        let question = game.current_question.unwrap();
        let wrong = (question.correct_option + 1) % question.options.len();
        guest.submit_answer(wrong).await.unwrap();
        host.advance_turn().await.unwrap();

        let game = wait_mirror(&guest, |g| g.status == GameStatus::Finished).await;
        assert_eq!(game.results[0].name, "Ava");
        assert_eq!(game.results[0].score, QUESTION_POINTS);
        assert_eq!(game.results[1].score, 0);
    }

    #[tokio::test]
    async fn test_unanimous_rematch_resets_the_room() {
        let store = MemoryStore::new();
        let (host, guest) = playing(&store, 1).await;
        host.advance_turn().await.unwrap();
        wait_mirror(&guest, |g| g.status == GameStatus::Finished).await;

        guest.vote_rematch(true).await.unwrap();
        host.vote_rematch(true).await.unwrap();

        wait_mirror(&host, |g| g.status == GameStatus::Waiting).await;
        wait_mirror(&guest, |g| g.status == GameStatus::Waiting).await;

        let code = host.mirror().room_code.unwrap();
        let doc = store
            .connect()
            .read(&path::room(&code))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["players"][host.player_id()]["score"], serde_json::json!(0));
        assert!(doc.get("rematchVotes").is_none());
        assert!(doc.get("answers").is_none());
        assert!(doc.get("finishedAt").is_none());
        // Same pack stays selected for the next round
        assert!(doc.get("gameData").is_some());
    }

    #[tokio::test]
    async fn test_a_single_no_declines_the_rematch() {
        let store = MemoryStore::new();
        let (host, guest) = playing(&store, 1).await;
        host.advance_turn().await.unwrap();
        wait_mirror(&guest, |g| g.status == GameStatus::Finished).await;

        guest.vote_rematch(false).await.unwrap();

        wait_mirror(&host, |g| g.rematch_declined).await;
        wait_mirror(&guest, |g| g.rematch_declined).await;
        assert_eq!(host.mirror().status, GameStatus::Finished);
    }

    #[tokio::test]
    async fn test_rematch_vote_outside_finished_is_rejected() {
        let store = MemoryStore::new();
        let (host, _guest) = playing(&store, 5).await;
        let err = host.vote_rematch(true).await.unwrap_err();
        assert!(matches!(err, SyncError::InvalidOperation(_)));
    }

    #[tokio::test]
    async fn test_countdown_seed_catches_up_for_late_observers() {
        // A host whose countdown window already elapsed (e.g. it was
        // written while we were reconnecting) goes straight to playing.
        let store = MemoryStore::new();
        let (host, guest) = lobby(&store, 5).await;

        let code = host.mirror().room_code.unwrap();
        let stale = (chrono::Utc::now() - chrono::Duration::seconds(30)).to_rfc3339();
        let countdown = CountdownState {
            value: 3,
            in_progress: true,
            start_timestamp: stale,
        };
        let admin = store.connect();
        let mut patch = Patch::new();
        patch.insert("countdown".to_string(), serde_json::to_value(&countdown).unwrap());
        admin.update(&path::room(&code), patch).await.unwrap();

        wait_mirror(&host, |g| g.status == GameStatus::Playing).await;
        let game = wait_mirror(&guest, |g| g.status == GameStatus::Playing).await;
        assert_eq!(game.countdown_display, None);
    }

    #[tokio::test]
    async fn test_mirror_applies_echoes_not_optimistic_writes() {
        let store = MemoryStore::new();
        let (host, _guest) = playing(&store, 5).await;

        // Mirror state originates from echoes, never from the local call
        assert_eq!(host.mirror().question_index, 0);
        host.advance_turn().await.unwrap();
        let after = wait_mirror(&host, |g| g.question_index == 1).await;
        assert!(!after.my_turn);
    }

    #[tokio::test]
    async fn test_back_to_back_rematches_reset_each_time() {
        let store = MemoryStore::new();
        let (host, guest) = playing(&store, 1).await;

        // Two full games ending in unanimous rematches by the same
        // roster: the second reset must land like the first
        for _ in 0..2 {
            host.advance_turn().await.unwrap();
            wait_mirror(&host, |g| g.status == GameStatus::Finished).await;
            wait_mirror(&guest, |g| g.status == GameStatus::Finished).await;

            guest.vote_rematch(true).await.unwrap();
            host.vote_rematch(true).await.unwrap();
            wait_mirror(&host, |g| g.status == GameStatus::Waiting).await;
            wait_mirror(&guest, |g| g.status == GameStatus::Waiting).await;

            guest.set_ready(true).await.unwrap();
            host.start_game().await.unwrap();
            wait_mirror(&host, |g| g.status == GameStatus::Playing).await;
            wait_mirror(&guest, |g| g.status == GameStatus::Playing).await;
        }
    }

    #[tokio::test]
    async fn test_dead_turn_skip_survives_a_rematch() {
        let store = MemoryStore::new();
        let (host, guest) = playing(&store, 2).await;

        host.advance_turn().await.unwrap();
        wait_mirror(&host, |g| {
            g.current_player_id.as_ref() == Some(guest.player_id())
        })
        .await;
        guest.inner.store.go_offline().await;
        // Skipping the dead final turn finishes the game
        wait_mirror(&host, |g| g.status == GameStatus::Finished).await;

        // The sole connected player carries the rematch alone
        host.vote_rematch(true).await.unwrap();
        wait_mirror(&host, |g| g.status == GameStatus::Waiting).await;

        host.start_game().await.unwrap();
        wait_mirror(&host, |g| g.status == GameStatus::Playing).await;
        host.advance_turn().await.unwrap();

        // Same dead player, same question index as in the first game:
        // the skip must fire again, not be swallowed as a replay
        wait_mirror(&host, |g| g.status == GameStatus::Finished).await;
    }

    #[tokio::test]
    async fn test_lowering_rounds_after_pack_selection_shortens_the_game() {
        let store = MemoryStore::new();
        let host = test_client(&store).await;
        let code = host.create_room("Ava", "ios").await.unwrap();
        let guest = test_client(&store).await;
        guest
            .join_room(code.as_str(), "Ben", "android")
            .await
            .unwrap();
        guest.set_ready(true).await.unwrap();

        // Pack picked first, rounds lowered afterwards: the start must
        // honor the later setting
        host.select_pack("general-1").await.unwrap();
        host.update_settings(&GameSettings {
            time_limit: 30,
            rounds: 2,
        })
        .await
        .unwrap();

        host.start_game().await.unwrap();
        let game = wait_mirror(&host, |g| g.status == GameStatus::Playing).await;
        assert_eq!(game.total_questions, 2);

        host.advance_turn().await.unwrap();
        wait_mirror(&host, |g| g.question_index == 1).await;
        host.advance_turn().await.unwrap();
        wait_mirror(&host, |g| g.status == GameStatus::Finished).await;
    }
}
