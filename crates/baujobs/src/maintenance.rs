//! Operational commands run from the service binary rather than over HTTP.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::catalog::Category;
use crate::context::Backends;
use crate::listings::query::ListingFilter;
use crate::store::RepositoryError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    pub job_offers: u64,
    pub seeker_profiles: u64,
    pub legacy_jobs: u64,
}

impl PurgeReport {
    pub fn total(&self) -> u64 {
        self.job_offers + self.seeker_profiles + self.legacy_jobs
    }
}

/// Deletes every posting whose expiry lies at or before `now`.
pub async fn purge_expired(
    backends: &Backends,
    now: DateTime<Utc>,
) -> Result<PurgeReport, RepositoryError> {
    let filter = ListingFilter::expired(now);
    let report = PurgeReport {
        job_offers: backends.offers.remove_matching(&filter).await?,
        seeker_profiles: backends.seekers.remove_matching(&filter).await?,
        legacy_jobs: backends.legacy_jobs.remove_matching(&filter).await?,
    };
    info!(
        job_offers = report.job_offers,
        seeker_profiles = report.seeker_profiles,
        legacy_jobs = report.legacy_jobs,
        "expired postings purged"
    );
    Ok(report)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryFix {
    Canonical,
    Rewrite(Category),
    Unknown,
}

/// Decides what to do with a stored category value.
pub fn category_fix(raw: &str) -> CategoryFix {
    match Category::parse(raw) {
        Some(category) if category.label() == raw => CategoryFix::Canonical,
        Some(category) => CategoryFix::Rewrite(category),
        None => CategoryFix::Unknown,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryReport {
    pub unchanged: u64,
    pub rewritten: u64,
    pub unknown: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub copied: u64,
    pub dropped_source: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::domain::UserId;
    use crate::listings::domain::{
        EmploymentType, JobOffer, LegacyJob, ListingId, ListingStatus,
    };
    use chrono::Duration;

    #[test]
    fn category_fix_classifies_values() {
        assert_eq!(category_fix("Hochbau"), CategoryFix::Canonical);
        assert_eq!(category_fix("hochbau"), CategoryFix::Rewrite(Category::StructuralWork));
        assert_eq!(
            category_fix("PLANUNG & TECHNIK"),
            CategoryFix::Rewrite(Category::PlanningAndTechnology)
        );
        assert_eq!(category_fix("weitere"), CategoryFix::Rewrite(Category::OtherTrades));
        assert_eq!(category_fix("Gartenbau"), CategoryFix::Unknown);
    }

    #[tokio::test]
    async fn purge_removes_only_expired_postings() {
        let backends = Backends::in_memory();
        let now = Utc::now();
        for (offset, title) in [(-1, "Maurer/in EFZ"), (5, "Gipser/in EFZ")] {
            backends
                .offers
                .insert(JobOffer {
                    id: ListingId::generate(),
                    title: title.into(),
                    description: "Baustelle".into(),
                    location: "Chur".into(),
                    category: Category::StructuralWork,
                    employment_type: EmploymentType::FullTime,
                    company: None,
                    created_at: now - Duration::days(30),
                    expires_at: now + Duration::days(offset),
                    contact_name: "Reto".into(),
                    contact_email: "reto@bau.ch".into(),
                    contact_phone: None,
                    status: ListingStatus::Active,
                    creator: Some(UserId::generate()),
                })
                .await
                .expect("insert offer");
        }
        backends
            .legacy_jobs
            .insert(LegacyJob {
                id: ListingId::generate(),
                title: "Kranführer/in".into(),
                location: "Basel".into(),
                description: "Turmdrehkran".into(),
                company: "Kran AG".into(),
                employment_type: "Vollzeit".into(),
                contact_email: "info@kran.ch".into(),
                contact_phone: None,
                experience: None,
                created_at: now - Duration::days(40),
                expires_at: now - Duration::days(10),
            })
            .await
            .expect("insert job");

        let report = purge_expired(&backends, now).await.expect("purge");
        assert_eq!(
            report,
            PurgeReport {
                job_offers: 1,
                seeker_profiles: 0,
                legacy_jobs: 1
            }
        );
        assert_eq!(report.total(), 2);
        let remaining = backends
            .offers
            .find(&ListingFilter::default(), None)
            .await
            .expect("find");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].title, "Gipser/in EFZ");
    }
}
