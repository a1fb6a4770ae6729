use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Listing, ListingStatus};
use crate::accounts::domain::UserId;
use crate::catalog::{self, Category};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 6;
pub const MAX_LIMIT: u64 = 100;
/// Highest page served; keeps the skip offset well inside the database's i64 range.
pub const MAX_PAGE: u64 = 1_000_000;

/// Raw feed query string. Everything stays textual so bad numbers fall back to defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    #[serde(rename = "kategorie")]
    pub category: Option<String>,
    #[serde(rename = "kanton")]
    pub canton: Option<String>,
}

/// Criteria shared by the in-memory and MongoDB listing repositories.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingFilter {
    pub creator: Option<UserId>,
    /// Only listings live at this instant.
    pub live_at: Option<DateTime<Utc>>,
    /// Only listings whose expiry is at or before this instant.
    pub expired_at: Option<DateTime<Utc>>,
    pub category: Option<Category>,
    /// Exact location match against any of these names.
    pub locations: Option<Vec<String>>,
}

impl ListingFilter {
    pub fn live(now: DateTime<Utc>) -> Self {
        Self {
            live_at: Some(now),
            ..Self::default()
        }
    }

    pub fn expired(now: DateTime<Utc>) -> Self {
        Self {
            expired_at: Some(now),
            ..Self::default()
        }
    }

    pub fn by_creator(creator: UserId) -> Self {
        Self {
            creator: Some(creator),
            ..Self::default()
        }
    }

    pub fn and_live(mut self, now: DateTime<Utc>) -> Self {
        self.live_at = Some(now);
        self
    }

    pub fn matches<L: Listing>(&self, listing: &L) -> bool {
        if let Some(creator) = &self.creator {
            if listing.creator() != Some(creator) {
                return false;
            }
        }
        if let Some(now) = self.live_at {
            if !listing.is_live(now) {
                return false;
            }
        }
        if let Some(cutoff) = self.expired_at {
            if listing.expires_at() > cutoff {
                return false;
            }
        }
        if let Some(category) = self.category {
            if listing.category() != Some(category) {
                return false;
            }
        }
        if let Some(locations) = &self.locations {
            if !locations.iter().any(|name| name == listing.location()) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    pub fn skip(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub pages: u64,
}

impl Pagination {
    pub fn new(total: u64, request: PageRequest) -> Self {
        Self {
            total,
            page: request.page,
            limit: request.limit,
            pages: total.div_ceil(request.limit),
        }
    }
}

/// Outcome of turning a feed query into repository criteria.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedPlan {
    Search(ListingFilter, PageRequest),
    /// The query names a category or canton that does not exist.
    Empty(PageRequest),
}

impl FeedQuery {
    pub fn page_request(&self) -> PageRequest {
        let page = parse_positive(self.page.as_deref())
            .unwrap_or(DEFAULT_PAGE)
            .min(MAX_PAGE);
        let limit = parse_positive(self.limit.as_deref())
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT);
        PageRequest { page, limit }
    }

    pub fn plan(&self, now: DateTime<Utc>) -> FeedPlan {
        let request = self.page_request();
        let mut filter = ListingFilter::live(now);

        if let Some(raw) = non_empty(self.category.as_deref()) {
            match Category::parse(raw) {
                Some(category) => filter.category = Some(category),
                None => return FeedPlan::Empty(request),
            }
        }

        if let Some(code) = non_empty(self.canton.as_deref()) {
            let localities = catalog::localities_in(code);
            if localities.is_empty() {
                return FeedPlan::Empty(request);
            }
            filter.locations = Some(localities.into_iter().map(str::to_string).collect());
        }

        FeedPlan::Search(filter, request)
    }
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}

fn parse_positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
}

/// Per-status tally reported by the `meine` endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    #[serde(rename = "_id")]
    pub status: ListingStatus,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnerStats {
    pub total: u64,
    pub active: u64,
    pub expired: u64,
    #[serde(rename = "byStatus")]
    pub by_status: Vec<StatusCount>,
}

impl OwnerStats {
    pub fn collect<L: Listing>(listings: &[L], now: DateTime<Utc>) -> Self {
        let mut by_status: Vec<StatusCount> = Vec::new();
        for listing in listings {
            let status = listing.status().unwrap_or_default();
            match by_status.iter_mut().find(|entry| entry.status == status) {
                Some(entry) => entry.count += 1,
                None => by_status.push(StatusCount { status, count: 1 }),
            }
        }
        by_status.sort_by_key(|entry| entry.status);

        Self {
            total: listings.len() as u64,
            active: listings.iter().filter(|l| l.is_live(now)).count() as u64,
            expired: listings.iter().filter(|l| l.expires_at() <= now).count() as u64,
            by_status,
        }
    }
}
