//! Snapshot intake: turning pushed room documents into mirror updates.
//!
//! The store pushes a full room snapshot to every subscriber on every
//! write, echoes of our own writes included. Intake keeps a content
//! signature per concern (game progress, countdown, roster) and only
//! reapplies a concern when its signature actually changed, so replays
//! and echoes are no-ops. Roster changes are additionally debounced,
//! since joins and presence flips tend to arrive in bursts.

use super::{mirror, GameClient, IntakeState, PendingRoster};
use crate::error::SyncResult;
use crate::signature;
use crate::store::{path, Subscription};
use crate::turn;
use crate::types::{GameStatus, Room, RoomCode};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::atomic::Ordering;
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Stop,
}

impl GameClient {
    pub(crate) async fn spawn_watch(&self, code: &RoomCode) -> SyncResult<JoinHandle<()>> {
        let sub = self.inner.store.watch(&path::room(code)).await?;
        let client = self.clone();
        Ok(tokio::spawn(async move { client.run_watch(sub).await }))
    }

    async fn run_watch(self, mut sub: Subscription) {
        while let Some(snapshot) = sub.recv().await {
            match snapshot {
                Some(value) => {
                    if self.process_snapshot(value).await == Flow::Stop {
                        break;
                    }
                }
                None => {
                    if !self.inner.leaving.load(Ordering::SeqCst) {
                        tracing::info!("room document disappeared, session over");
                        self.inner.mirror.send_modify(|g| g.room_closed = true);
                    }
                    break;
                }
            }
        }
        tracing::debug!("watch task finished");
    }

    /// Apply one pushed snapshot. Crate-visible so tests can drive
    /// intake with hand-built documents.
    pub(crate) async fn process_snapshot(&self, value: Value) -> Flow {
        let room: Room = match serde_json::from_value(value) {
            Ok(room) => room,
            Err(e) => {
                tracing::warn!("undecodable room snapshot: {}", e);
                self.inner
                    .mirror
                    .send_modify(|g| g.last_error = Some(format!("undecodable room snapshot: {e}")));
                return Flow::Continue;
            }
        };

        // The host flags removals; vanishing from the roster reads the same
        let kicked = room
            .removed_players
            .get(&self.inner.player_id)
            .copied()
            .unwrap_or(false);
        if kicked || !room.players.contains_key(&self.inner.player_id) {
            if self.inner.leaving.load(Ordering::SeqCst) {
                return Flow::Stop;
            }
            tracing::info!("no longer in the roster, standing down");
            let _ = self.inner.store.cancel_on_disconnect().await;
            self.inner.is_host.store(false, Ordering::SeqCst);
            self.inner.mirror.send_modify(|g| g.removed = true);
            return Flow::Stop;
        }

        // Host can change under us when the previous host leaves
        let am_host = room.host_id == self.inner.player_id;
        self.inner.is_host.store(am_host, Ordering::SeqCst);

        let mut intake = self.inner.intake.lock().await;
        self.apply_game_fields(&mut intake, &room);
        self.apply_countdown(&mut intake, &room).await;
        self.apply_roster(&mut intake, &room);
        self.observe_dare(&mut intake, &room, am_host).await;
        self.observe_rematch(&mut intake, &room, am_host).await;
        if am_host {
            self.advance_dead_turn(&mut intake, &room).await;
        }
        Flow::Continue
    }

    fn apply_game_fields(&self, intake: &mut IntakeState, room: &Room) {
        let sig = signature::game_signature(room);
        if intake.game_sig.as_deref() == Some(sig.as_str()) {
            tracing::debug!("game fields unchanged ({}), skipping", sig);
            return;
        }
        intake.game_sig = Some(sig);

        if room.game_status == GameStatus::Waiting {
            // Back in the lobby: reaction markers scoped to the previous
            // game die with it
            intake.advanced_past = None;
            intake.last_dare_token = None;
            intake.last_rematch_token = None;
        }

        let me = &self.inner.player_id;
        let status = room.game_status;
        let question = room.current_question().cloned();
        let my_turn =
            status == GameStatus::Playing && room.current_player_id.as_deref() == Some(me.as_str());
        let spectator = status == GameStatus::Playing
            && match (&room.started_at, room.players.get(me)) {
                (Some(started), Some(p)) => joined_after_start(&p.joined_at, started),
                _ => false,
            };
        let results = if status == GameStatus::Finished {
            mirror::results_of(room)
        } else {
            Vec::new()
        };

        self.inner.mirror.send_modify(|g| {
            g.status = status;
            g.question_index = room.current_question_index.unwrap_or(0);
            g.total_questions = room
                .game_data
                .as_ref()
                .map(|d| d.total_questions)
                .unwrap_or(0);
            g.pack_display_name = room.game_data.as_ref().map(|d| d.pack_display_name.clone());
            g.current_question = question;
            g.current_player_id = room.current_player_id.clone();
            g.my_turn = my_turn;
            g.spectator = spectator;
            g.results = results;
            if status != GameStatus::Waiting {
                g.countdown_display = None;
            }
            if status != GameStatus::Finished {
                g.rematch_declined = false;
            }
        });
    }

    async fn apply_countdown(&self, intake: &mut IntakeState, room: &Room) {
        let sig = signature::countdown_signature(room.countdown.as_ref());
        if intake.countdown_sig.as_deref() == Some(sig.as_str()) {
            return;
        }
        intake.countdown_sig = Some(sig);

        let Some(countdown) = room.countdown.as_ref().filter(|c| c.in_progress) else {
            self.inner.mirror.send_if_modified(|g| {
                let had = g.countdown_display.is_some();
                g.countdown_display = None;
                had
            });
            return;
        };

        let start = match DateTime::parse_from_rfc3339(&countdown.start_timestamp) {
            Ok(t) => t.with_timezone(&Utc),
            Err(e) => {
                tracing::warn!(
                    "unparseable countdown start '{}': {}",
                    countdown.start_timestamp,
                    e
                );
                Utc::now()
            }
        };
        match turn::countdown_seed(start, Utc::now(), countdown.value) {
            Some(seed) => {
                tracing::debug!("seeding local countdown at {}", seed);
                self.spawn_countdown_ticker(seed);
            }
            None => {
                // The window already elapsed; skip the theater entirely
                self.inner.mirror.send_if_modified(|g| {
                    let had = g.countdown_display.is_some();
                    g.countdown_display = None;
                    had
                });
                if self.inner.is_host.load(Ordering::SeqCst) {
                    self.finish_countdown().await;
                }
            }
        }
    }

    fn apply_roster(&self, intake: &mut IntakeState, room: &Room) {
        let sig = signature::roster_signature(room);
        if intake.roster_sig.as_deref() == Some(sig.as_str()) {
            return;
        }
        intake.roster_sig = Some(sig);

        let roster = mirror::roster_of(room);
        let debounce = self.inner.config.roster_debounce;
        if debounce.is_zero() {
            self.inner.mirror.send_modify(|g| g.roster = roster);
            return;
        }

        // Coalesce bursts: keep the latest roster, push the deadline out
        intake.pending_roster = Some(PendingRoster {
            roster,
            deadline: Instant::now() + debounce,
        });
        if !intake.roster_flush_scheduled {
            intake.roster_flush_scheduled = true;
            let client = self.clone();
            tokio::spawn(async move { client.flush_roster().await });
        }
    }

    async fn flush_roster(&self) {
        loop {
            let deadline = {
                let intake = self.inner.intake.lock().await;
                match &intake.pending_roster {
                    Some(p) => p.deadline,
                    None => break,
                }
            };
            tokio::time::sleep_until(deadline).await;
            let mut intake = self.inner.intake.lock().await;
            match intake.pending_roster.take() {
                Some(p) if Instant::now() >= p.deadline => {
                    intake.roster_flush_scheduled = false;
                    drop(intake);
                    self.inner.mirror.send_modify(|g| g.roster = p.roster);
                    return;
                }
                Some(p) => {
                    // A newer burst moved the deadline; keep waiting
                    intake.pending_roster = Some(p);
                }
                None => break,
            }
        }
        self.inner.intake.lock().await.roster_flush_scheduled = false;
    }
}

/// Both timestamps are RFC 3339; unparseable input counts as not-after.
fn joined_after_start(joined_at: &str, started_at: &str) -> bool {
    match (
        DateTime::parse_from_rfc3339(joined_at),
        DateTime::parse_from_rfc3339(started_at),
    ) {
        (Ok(joined), Ok(started)) => joined > started,
        _ => false,
    }
}
