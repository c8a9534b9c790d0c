use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use triviadare::client::{GameClient, LocalGame};
use triviadare::config::SyncConfig;
use triviadare::identity::AnonymousIdentity;
use triviadare::packs::{AllUnlocked, BundledPacks};
use triviadare::store::MemoryStore;
use triviadare::types::GameStatus;

/// Block until the client's mirror satisfies `cond`
async fn next_state<F>(client: &GameClient, mut cond: F) -> LocalGame
where
    F: FnMut(&LocalGame) -> bool,
{
    let mut rx = client.subscribe();
    // Clone out of the watch borrow before `rx` goes out of scope
    let game = rx.wait_for(|g| cond(g)).await.expect("mirror open").clone();
    game
}

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "triviadare=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Running a scripted round against the in-memory store");

    let config = SyncConfig::from_env();
    let store = MemoryStore::new();
    let packs = Arc::new(BundledPacks);
    let entitlements = Arc::new(AllUnlocked);
    let identity = AnonymousIdentity;

    let party = futures::future::try_join_all((0..3).map(|_| {
        GameClient::connect(
            config.clone(),
            Arc::new(store.connect()),
            &identity,
            packs.clone(),
            entitlements.clone(),
        )
    }))
    .await
    .unwrap();
    let ava = party[0].clone();
    let ben = party[1].clone();
    let cleo = party[2].clone();

    // Lobby: Ava hosts, the others join and ready up
    let code = ava.create_room("Ava", "ios").await.unwrap();
    tracing::info!("room code is {}", code);
    ben.join_room(code.as_str(), "Ben", "android").await.unwrap();
    cleo.join_room(code.as_str(), "Cleo", "web").await.unwrap();
    ben.set_ready(true).await.unwrap();
    cleo.set_ready(true).await.unwrap();
    ava.select_pack("general-1").await.unwrap();

    // Countdown, then the turn loop
    ava.start_game().await.unwrap();
    next_state(&ava, |g| g.status == GameStatus::Playing).await;

    let mut expected_index = 0;
    let mut dare_done = false;
    loop {
        let game = next_state(&ava, |g| {
            g.status == GameStatus::Finished
                || (g.status == GameStatus::Playing
                    && g.question_index == expected_index
                    && g.current_question.is_some()
                    && g.active_dare.is_none())
        })
        .await;
        if game.status == GameStatus::Finished {
            break;
        }

        let holder_id = game.current_player_id.clone().unwrap();
        let holder = party
            .iter()
            .find(|c| *c.player_id() == holder_id)
            .unwrap();

        if !dare_done && expected_index == 1 {
            // Second question: the turn holder chickens out into a dare
            dare_done = true;
            holder
                .start_dare("recite the alphabet backwards")
                .await
                .unwrap();
            for voter in party.iter().filter(|c| *c.player_id() != holder_id) {
                next_state(voter, |g| g.active_dare.is_some()).await;
                voter.vote_dare(true).await.unwrap();
            }
            next_state(&ava, |g| g.active_dare.is_none()).await;
        } else {
            let question = game.current_question.unwrap();
            holder.submit_answer(question.correct_option).await.unwrap();
        }

        ava.advance_turn().await.unwrap();
        expected_index += 1;
    }

    let finished = next_state(&ava, |g| g.status == GameStatus::Finished).await;
    tracing::info!("final standings:");
    for (place, line) in finished.results.iter().enumerate() {
        tracing::info!("  {}. {} with {} points", place + 1, line.name, line.score);
    }

    // Ben has had enough; one no sinks the rematch
    next_state(&ben, |g| g.status == GameStatus::Finished).await;
    ava.vote_rematch(true).await.unwrap();
    ben.vote_rematch(false).await.unwrap();
    next_state(&ava, |g| g.rematch_declined).await;
    tracing::info!("rematch declined, wrapping up");

    ben.leave_room().await.unwrap();
    cleo.leave_room().await.unwrap();
    ava.leave_room().await.unwrap();
    tracing::info!("everyone left, room deleted");
}
