// Public API for integration tests and embedding the sync core

pub mod client;
pub mod config;
pub mod error;
pub mod identity;
pub mod packs;
pub mod signature;
pub mod store;
pub mod turn;
pub mod types;
pub mod vote;
