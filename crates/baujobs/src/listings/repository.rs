use async_trait::async_trait;

use super::domain::{Listing, ListingId};
use super::query::{ListingFilter, PageRequest};
use crate::store::RepositoryError;

/// Storage abstraction for one listing collection.
#[async_trait]
pub trait ListingRepository<L: Listing>: Send + Sync {
    async fn insert(&self, listing: L) -> Result<L, RepositoryError>;
    async fn fetch(&self, id: &ListingId) -> Result<Option<L>, RepositoryError>;
    /// Overwrites an existing listing; `NotFound` when the id is unknown.
    async fn replace(&self, listing: L) -> Result<(), RepositoryError>;
    async fn remove(&self, id: &ListingId) -> Result<bool, RepositoryError>;
    /// Matching listings, newest first, optionally paged.
    async fn find(
        &self,
        filter: &ListingFilter,
        page: Option<PageRequest>,
    ) -> Result<Vec<L>, RepositoryError>;
    async fn count(&self, filter: &ListingFilter) -> Result<u64, RepositoryError>;
    async fn remove_matching(&self, filter: &ListingFilter) -> Result<u64, RepositoryError>;
}
