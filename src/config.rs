use std::time::Duration;

/// Runtime configuration for the sync client
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Connection descriptor for the shared store (logged at startup)
    pub database_url: String,
    /// API key for the store backend, if it requires one
    pub api_key: Option<String>,
    /// How long roster changes are coalesced before the mirror is updated
    pub roster_debounce: Duration,
    /// Starting value of the pre-game countdown
    pub countdown_from: u32,
    /// Interval between local countdown ticks
    pub countdown_tick: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            database_url: "memory://triviadare".to_string(),
            api_key: None,
            roster_debounce: Duration::from_millis(500),
            countdown_from: 3,
            countdown_tick: Duration::from_secs(1),
        }
    }
}

impl SyncConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .and_then(|url| {
                let trimmed = url.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .unwrap_or(defaults.database_url);

        let api_key = std::env::var("API_KEY").ok().and_then(|key| {
            let trimmed = key.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        });

        let roster_debounce = std::env::var("ROSTER_DEBOUNCE_MS")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.roster_debounce);

        let countdown_from = std::env::var("COUNTDOWN_FROM")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .filter(|&n| n > 0)
            .unwrap_or(defaults.countdown_from);

        let countdown_tick = std::env::var("COUNTDOWN_TICK_MS")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .filter(|&ms| ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(defaults.countdown_tick);

        tracing::info!(
            "Sync config: store {} (api key {}), roster debounce {:?}, countdown {} @ {:?}",
            database_url,
            if api_key.is_some() { "set" } else { "unset" },
            roster_debounce,
            countdown_from,
            countdown_tick,
        );

        Self {
            database_url,
            api_key,
            roster_debounce,
            countdown_from,
            countdown_tick,
        }
    }
}
