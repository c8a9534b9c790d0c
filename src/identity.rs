use crate::error::SyncError;
use crate::types::PlayerId;
use async_trait::async_trait;

/// Establishes a stable player identity for this client process
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Sign in anonymously and return the player id all of this client's
    /// writes will be keyed by
    async fn sign_in_anonymously(&self) -> Result<PlayerId, SyncError>;
}

/// Issues anonymous identities without any backend round trip
pub struct AnonymousIdentity;

#[async_trait]
impl IdentityProvider for AnonymousIdentity {
    async fn sign_in_anonymously(&self) -> Result<PlayerId, SyncError> {
        let id = ulid::Ulid::new().to_string();
        tracing::debug!("signed in anonymously as {}", id);
        Ok(id)
    }
}
