//! Room lifecycle: create, join, leave, and the lobby operations.
//!
//! Membership changes are plain merge writes against the shared room
//! document. Presence is delegated to the store's on-disconnect hook so
//! an ungraceful drop still flips our `isConnected` flag for everyone.

use super::{now_rfc3339, GameClient, IntakeState, LocalGame};
use crate::error::{SyncError, SyncResult};
use crate::store::{path, Patch};
use crate::types::{GameData, GameSettings, GameStatus, Player, PlayerId, Room, RoomCode};
use serde_json::{json, Value};
use std::sync::atomic::Ordering;

impl GameClient {
    /// Create a fresh room and become its host.
    pub async fn create_room(&self, name: &str, platform: &str) -> SyncResult<RoomCode> {
        self.ensure_no_session().await?;
        let code = RoomCode::generate();
        let me = self.inner.player_id.clone();
        let now = now_rfc3339();

        let mut room = Room {
            host_id: me.clone(),
            created_at: now.clone(),
            game_settings: GameSettings::default(),
            ..Default::default()
        };
        room.players.insert(
            me.clone(),
            Player {
                name: name.to_string(),
                is_host: true,
                ready: true,
                platform: platform.to_string(),
                joined_at: now,
                ..Player::default()
            },
        );

        self.inner
            .store
            .put(&path::room(&code), serde_json::to_value(&room)?)
            .await?;
        self.register_presence(&code).await?;
        self.inner.is_host.store(true, Ordering::SeqCst);
        self.begin_session(code.clone()).await?;
        tracing::info!("created room {} as {}", code, name);
        Ok(code)
    }

    /// Join an existing room by code. Codes are case-insensitive on
    /// entry; a player rejoining under their own id keeps their entry
    /// and only flips back to connected.
    pub async fn join_room(&self, input: &str, name: &str, platform: &str) -> SyncResult<RoomCode> {
        self.ensure_no_session().await?;
        let code = RoomCode::normalize(input);
        let me = self.inner.player_id.clone();

        let Some(room) = self.read_room(&code).await? else {
            return Err(SyncError::RoomNotFound(code));
        };
        if room.removed_players.get(&me).copied().unwrap_or(false) {
            return Err(SyncError::InvalidOperation(
                "the host removed you from this room",
            ));
        }
        if room.game_status != GameStatus::Waiting {
            return Err(SyncError::GameAlreadyStarted(code));
        }

        let mut patch = Patch::new();
        if room.players.contains_key(&me) {
            patch.insert(path::player_field(&me, "isConnected"), json!(true));
        } else {
            let player = Player {
                name: name.to_string(),
                platform: platform.to_string(),
                joined_at: now_rfc3339(),
                ..Player::default()
            };
            patch.insert(path::player(&me), serde_json::to_value(player)?);
        }
        self.inner.store.update(&path::room(&code), patch).await?;
        self.register_presence(&code).await?;
        self.inner.is_host.store(false, Ordering::SeqCst);
        self.begin_session(code.clone()).await?;
        tracing::info!("joined room {} as {}", code, name);
        Ok(code)
    }

    /// Leave gracefully. The last player out deletes the room; a leaving
    /// host hands the role to the longest-connected remaining player.
    pub async fn leave_room(&self) -> SyncResult<()> {
        let code = self.session_code().await?;
        self.inner.leaving.store(true, Ordering::SeqCst);
        let me = self.inner.player_id.clone();

        let departure = match self.read_room(&code).await {
            Ok(Some(room)) if room.players.contains_key(&me) => {
                if room.players.len() <= 1 {
                    tracing::info!("last player out, deleting room {}", code);
                    self.inner
                        .store
                        .remove(&path::room(&code))
                        .await
                        .map_err(SyncError::from)
                } else {
                    let mut patch = Patch::new();
                    patch.insert(path::player(&me), Value::Null);
                    if room.host_id == me {
                        if let Some(successor) = room.successor_host(&me) {
                            tracing::info!("handing host of {} to {}", code, successor);
                            patch.insert("hostId".to_string(), json!(successor));
                            patch.insert(path::player_field(&successor, "isHost"), json!(true));
                        }
                    }
                    self.inner
                        .store
                        .update(&path::room(&code), patch)
                        .await
                        .map_err(SyncError::from)
                }
            }
            // Room already gone, or the host removed us first
            Ok(_) => Ok(()),
            Err(e) => Err(e),
        };

        let _ = self.inner.store.cancel_on_disconnect().await;
        self.end_local_session().await;
        departure
    }

    /// Kick a player out of the room. Host only; the target notices
    /// through its own snapshot intake.
    pub async fn remove_player(&self, target: &PlayerId) -> SyncResult<()> {
        let code = self.ensure_host("remove_player").await?;
        if *target == self.inner.player_id {
            return Err(SyncError::InvalidOperation(
                "use leave_room to leave your own room",
            ));
        }
        let room = self
            .read_room(&code)
            .await?
            .ok_or_else(|| SyncError::RoomNotFound(code.clone()))?;
        if !room.players.contains_key(target) {
            return Err(SyncError::InvalidOperation("player is not in the room"));
        }
        let mut patch = Patch::new();
        patch.insert(path::player(target), Value::Null);
        // The flag outlives the entry and keeps the kicked id out
        patch.insert(path::removed_flag(target), json!(true));
        self.write_update(&code, patch).await?;
        tracing::info!("removed player {} from {}", target, code);
        Ok(())
    }

    pub async fn set_ready(&self, ready: bool) -> SyncResult<()> {
        let code = self.session_code().await?;
        let mut patch = Patch::new();
        patch.insert(
            path::player_field(&self.inner.player_id, "ready"),
            json!(ready),
        );
        self.write_update(&code, patch).await
    }

    pub async fn rename(&self, name: &str) -> SyncResult<()> {
        let code = self.session_code().await?;
        let mut patch = Patch::new();
        patch.insert(
            path::player_field(&self.inner.player_id, "name"),
            json!(name),
        );
        self.write_update(&code, patch).await
    }

    /// Adjust lobby settings. Host only.
    pub async fn update_settings(&self, settings: &GameSettings) -> SyncResult<()> {
        let code = self.ensure_host("update_settings").await?;
        let mut patch = Patch::new();
        patch.insert("gameSettings/timeLimit".to_string(), json!(settings.time_limit));
        patch.insert("gameSettings/rounds".to_string(), json!(settings.rounds));
        self.write_update(&code, patch).await
    }

    /// Embed a question pack into the room document. Host only; the
    /// full ordered list is embedded so every client plays the same
    /// game without loading the pack themselves, and the playing
    /// transition cuts it to the round count in force at start time.
    pub async fn select_pack(&self, pack_id: &str) -> SyncResult<()> {
        let code = self.ensure_host("select_pack").await?;
        if !self.inner.entitlements.is_unlocked(pack_id) {
            tracing::warn!("pack {} is locked for this player", pack_id);
            return Err(SyncError::PackLocked(pack_id.to_string()));
        }
        let meta = self
            .inner
            .packs
            .pack_meta(pack_id)
            .await
            .ok_or_else(|| SyncError::PackNotFound(pack_id.to_string()))?;
        let questions = self.inner.packs.load_questions(pack_id).await?;

        let data = GameData {
            pack_id: meta.id,
            pack_name: meta.name,
            pack_display_name: meta.display_name,
            total_questions: questions.len(),
            questions,
        };
        let mut patch = Patch::new();
        patch.insert("gameData".to_string(), serde_json::to_value(&data)?);
        self.write_update(&code, patch).await?;
        tracing::info!("selected pack {} ({} questions)", pack_id, data.total_questions);
        Ok(())
    }

    /// Tear the room down for everyone. Host only.
    pub async fn end_session(&self) -> SyncResult<()> {
        let code = self.ensure_host("end_session").await?;
        self.inner.leaving.store(true, Ordering::SeqCst);
        let result = self
            .inner
            .store
            .remove(&path::room(&code))
            .await
            .map_err(SyncError::from);
        let _ = self.inner.store.cancel_on_disconnect().await;
        self.end_local_session().await;
        tracing::info!("ended session for room {}", code);
        result
    }

    async fn ensure_no_session(&self) -> SyncResult<()> {
        if self.inner.session.read().await.is_some() {
            return Err(SyncError::InvalidOperation("already in a room"));
        }
        Ok(())
    }

    /// Arm the presence hook: if this connection drops, the store flips
    /// our connected flag for the other players.
    async fn register_presence(&self, code: &RoomCode) -> SyncResult<()> {
        let mut patch = Patch::new();
        patch.insert(
            path::player_field(&self.inner.player_id, "isConnected"),
            json!(false),
        );
        self.inner
            .store
            .on_disconnect_update(&path::room(code), patch)
            .await?;
        Ok(())
    }

    async fn begin_session(&self, code: RoomCode) -> SyncResult<()> {
        self.inner.leaving.store(false, Ordering::SeqCst);
        self.inner.start_inflight.store(false, Ordering::SeqCst);
        *self.inner.intake.lock().await = IntakeState::default();
        self.inner.mirror.send_modify(|g| {
            *g = LocalGame {
                room_code: Some(code.clone()),
                ..LocalGame::default()
            };
        });
        *self.inner.session.write().await = Some(code.clone());
        match self.spawn_watch(&code).await {
            Ok(task) => {
                *self.inner.watch_task.lock().await = Some(task);
                Ok(())
            }
            Err(e) => {
                *self.inner.session.write().await = None;
                Err(e)
            }
        }
    }

    pub(crate) async fn end_local_session(&self) {
        *self.inner.session.write().await = None;
        if let Some(task) = self.inner.watch_task.lock().await.take() {
            task.abort();
        }
        self.inner.is_host.store(false, Ordering::SeqCst);
        self.inner.countdown_running.store(false, Ordering::SeqCst);
        self.inner.start_inflight.store(false, Ordering::SeqCst);
        *self.inner.intake.lock().await = IntakeState::default();
        self.inner.mirror.send_modify(|g| *g = LocalGame::default());
    }
}
