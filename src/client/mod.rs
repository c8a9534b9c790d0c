//! The per-process game client.
//!
//! A `GameClient` owns one store connection, the signed-in player
//! identity, and the local mirror of the joined room. All game actions
//! are expressed as partial merge writes against the shared room
//! document; all observed state flows in through the watch task and the
//! snapshot intake in `sync`, never from local mutation.

mod dare;
mod game;
mod mirror;
mod session;
mod sync;

pub use mirror::{DareView, LocalGame, RosterEntry, ScoreLine};

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::identity::IdentityProvider;
use crate::packs::{Entitlements, PackLoader};
use crate::store::{path, Patch, StoreConnection};
use crate::types::{PlayerId, Room, RoomCode};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Clone)]
pub struct GameClient {
    pub(crate) inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    pub(crate) config: SyncConfig,
    pub(crate) store: Arc<dyn StoreConnection>,
    pub(crate) packs: Arc<dyn PackLoader>,
    pub(crate) entitlements: Arc<dyn Entitlements>,
    pub(crate) player_id: PlayerId,
    /// Code of the joined room, if any
    pub(crate) session: RwLock<Option<RoomCode>>,
    pub(crate) watch_task: Mutex<Option<JoinHandle<()>>>,
    /// The mirror the UI observes; every intake change is published here
    pub(crate) mirror: watch::Sender<LocalGame>,
    pub(crate) intake: Mutex<IntakeState>,
    /// Whether the latest snapshot named us as host
    pub(crate) is_host: AtomicBool,
    /// A local countdown ticker is currently running
    pub(crate) countdown_running: AtomicBool,
    /// The waiting -> playing transition write is in flight
    pub(crate) start_inflight: AtomicBool,
    /// We are tearing the session down on purpose; intake stands down
    pub(crate) leaving: AtomicBool,
}

/// Signature bookkeeping and debounce state for snapshot intake
#[derive(Default)]
pub(crate) struct IntakeState {
    pub(crate) game_sig: Option<String>,
    pub(crate) countdown_sig: Option<String>,
    pub(crate) roster_sig: Option<String>,
    pub(crate) pending_roster: Option<PendingRoster>,
    pub(crate) roster_flush_scheduled: bool,
    /// Resolution tokens already applied locally (exactly-once guards)
    pub(crate) last_dare_token: Option<String>,
    pub(crate) last_rematch_token: Option<String>,
    /// Dead turn we already advanced past: (player, question index)
    pub(crate) advanced_past: Option<(PlayerId, usize)>,
}

pub(crate) struct PendingRoster {
    pub(crate) roster: Vec<RosterEntry>,
    pub(crate) deadline: Instant,
}

impl GameClient {
    /// Sign in and build a client over the given store connection
    pub async fn connect(
        config: SyncConfig,
        store: Arc<dyn StoreConnection>,
        identity: &dyn IdentityProvider,
        packs: Arc<dyn PackLoader>,
        entitlements: Arc<dyn Entitlements>,
    ) -> SyncResult<Self> {
        let player_id = identity.sign_in_anonymously().await?;
        tracing::info!("game client ready as player {}", player_id);
        let (mirror, _) = watch::channel(LocalGame::default());
        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                store,
                packs,
                entitlements,
                player_id,
                session: RwLock::new(None),
                watch_task: Mutex::new(None),
                mirror,
                intake: Mutex::new(IntakeState::default()),
                is_host: AtomicBool::new(false),
                countdown_running: AtomicBool::new(false),
                start_inflight: AtomicBool::new(false),
                leaving: AtomicBool::new(false),
            }),
        })
    }

    pub fn player_id(&self) -> &PlayerId {
        &self.inner.player_id
    }

    /// A snapshot of the local mirror
    pub fn mirror(&self) -> LocalGame {
        self.inner.mirror.borrow().clone()
    }

    /// Observe mirror updates as they are applied
    pub fn subscribe(&self) -> watch::Receiver<LocalGame> {
        self.inner.mirror.subscribe()
    }

    /// The last surfaced write/intake error, if any
    pub fn last_error(&self) -> Option<String> {
        self.inner.mirror.borrow().last_error.clone()
    }

    pub fn clear_error(&self) {
        self.inner.mirror.send_if_modified(|g| {
            let had = g.last_error.is_some();
            g.last_error = None;
            had
        });
    }

    pub(crate) async fn session_code(&self) -> SyncResult<RoomCode> {
        self.inner
            .session
            .read()
            .await
            .clone()
            .ok_or(SyncError::NotInRoom)
    }

    /// Guard for host-only operations. The check is local and advisory
    /// (the store enforces nothing), but it keeps a well-behaved client
    /// from racing writes it has no business making.
    pub(crate) async fn ensure_host(&self, op: &'static str) -> SyncResult<RoomCode> {
        let code = self.session_code().await?;
        if !self.inner.is_host.load(Ordering::SeqCst) {
            tracing::warn!("rejected host-only operation '{}' from non-host client", op);
            return Err(SyncError::NotHost(op));
        }
        Ok(code)
    }

    pub(crate) async fn read_room(&self, code: &RoomCode) -> SyncResult<Option<Room>> {
        match self.inner.store.read(&path::room(code)).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Apply a merge patch to the joined room. Failures are surfaced into
    /// the mirror's error slot and returned; the session stays up.
    pub(crate) async fn write_update(&self, code: &RoomCode, patch: Patch) -> SyncResult<()> {
        if let Err(e) = self.inner.store.update(&path::room(code), patch).await {
            tracing::error!("room write failed: {}", e);
            self.inner
                .mirror
                .send_modify(|g| g.last_error = Some(format!("room write failed: {e}")));
            return Err(e.into());
        }
        Ok(())
    }
}

pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
