use async_trait::async_trait;

use crate::store::RepositoryError;

/// Records which payments have already been turned into a published listing.
#[async_trait]
pub trait GrantLedger: Send + Sync {
    /// Marks the payment as spent. Returns `false` when it was spent before.
    async fn redeem(&self, payment_id: &str) -> Result<bool, RepositoryError>;
}
