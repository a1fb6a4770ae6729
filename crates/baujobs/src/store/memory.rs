use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::RepositoryError;
use crate::accounts::domain::{UserId, UserRecord};
use crate::accounts::repository::UserRepository;
use crate::listings::domain::{Listing, ListingId};
use crate::listings::query::{ListingFilter, PageRequest};
use crate::listings::repository::ListingRepository;
use crate::payments::ledger::GrantLedger;

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("in-memory store poisoned".to_string()))
}

pub struct MemoryListings<L> {
    records: Mutex<HashMap<ListingId, L>>,
}

impl<L> Default for MemoryListings<L> {
    fn default() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }
}

impl<L: Listing> MemoryListings<L> {
    fn matching(&self, filter: &ListingFilter) -> Result<Vec<L>, RepositoryError> {
        let guard = lock(&self.records)?;
        let mut matches: Vec<L> = guard
            .values()
            .filter(|listing| filter.matches(*listing))
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().cmp(a.id()))
        });
        Ok(matches)
    }
}

#[async_trait]
impl<L: Listing> ListingRepository<L> for MemoryListings<L> {
    async fn insert(&self, listing: L) -> Result<L, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(listing.id()) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(listing.id().clone(), listing.clone());
        Ok(listing)
    }

    async fn fetch(&self, id: &ListingId) -> Result<Option<L>, RepositoryError> {
        let guard = lock(&self.records)?;
        Ok(guard.get(id).cloned())
    }

    async fn replace(&self, listing: L) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records)?;
        match guard.get_mut(listing.id()) {
            Some(slot) => {
                *slot = listing;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn remove(&self, id: &ListingId) -> Result<bool, RepositoryError> {
        let mut guard = lock(&self.records)?;
        Ok(guard.remove(id).is_some())
    }

    async fn find(
        &self,
        filter: &ListingFilter,
        page: Option<PageRequest>,
    ) -> Result<Vec<L>, RepositoryError> {
        let matches = self.matching(filter)?;
        Ok(match page {
            Some(page) => matches
                .into_iter()
                .skip(page.skip() as usize)
                .take(page.limit as usize)
                .collect(),
            None => matches,
        })
    }

    async fn count(&self, filter: &ListingFilter) -> Result<u64, RepositoryError> {
        let guard = lock(&self.records)?;
        Ok(guard.values().filter(|listing| filter.matches(*listing)).count() as u64)
    }

    async fn remove_matching(&self, filter: &ListingFilter) -> Result<u64, RepositoryError> {
        let mut guard = lock(&self.records)?;
        let before = guard.len();
        guard.retain(|_, listing| !filter.matches(&*listing));
        Ok((before - guard.len()) as u64)
    }
}

#[derive(Default)]
pub struct MemoryUsers {
    records: Mutex<HashMap<UserId, UserRecord>>,
}

#[async_trait]
impl UserRepository for MemoryUsers {
    async fn insert(&self, user: UserRecord) -> Result<UserRecord, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(&user.id) || guard.values().any(|other| other.email == user.email) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn fetch(&self, id: &UserId) -> Result<Option<UserRecord>, RepositoryError> {
        let guard = lock(&self.records)?;
        Ok(guard.get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepositoryError> {
        let guard = lock(&self.records)?;
        Ok(guard.values().find(|user| user.email == email).cloned())
    }

    async fn replace(&self, user: UserRecord) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records)?;
        match guard.get_mut(&user.id) {
            Some(slot) => {
                *slot = user;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn remove(&self, id: &UserId) -> Result<bool, RepositoryError> {
        let mut guard = lock(&self.records)?;
        Ok(guard.remove(id).is_some())
    }

    async fn link_posting(&self, id: &UserId, posting: &ListingId) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records)?;
        let user = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        user.seeker_postings.push(posting.clone());
        Ok(())
    }

    async fn unlink_posting(
        &self,
        id: &UserId,
        posting: &ListingId,
    ) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records)?;
        let user = guard.get_mut(id).ok_or(RepositoryError::NotFound)?;
        user.seeker_postings.retain(|existing| existing != posting);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryGrantLedger {
    redeemed: Mutex<HashSet<String>>,
}

#[async_trait]
impl GrantLedger for MemoryGrantLedger {
    async fn redeem(&self, payment_id: &str) -> Result<bool, RepositoryError> {
        let mut guard = lock(&self.redeemed)?;
        Ok(guard.insert(payment_id.to_string()))
    }
}
