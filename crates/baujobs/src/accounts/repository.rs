use async_trait::async_trait;

use super::domain::{UserId, UserRecord};
use crate::listings::domain::ListingId;
use crate::store::RepositoryError;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// `Conflict` when the e-mail address is already registered.
    async fn insert(&self, user: UserRecord) -> Result<UserRecord, RepositoryError>;
    async fn fetch(&self, id: &UserId) -> Result<Option<UserRecord>, RepositoryError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepositoryError>;
    async fn replace(&self, user: UserRecord) -> Result<(), RepositoryError>;
    async fn remove(&self, id: &UserId) -> Result<bool, RepositoryError>;
    async fn link_posting(&self, id: &UserId, posting: &ListingId) -> Result<(), RepositoryError>;
    async fn unlink_posting(&self, id: &UserId, posting: &ListingId)
        -> Result<(), RepositoryError>;
}
