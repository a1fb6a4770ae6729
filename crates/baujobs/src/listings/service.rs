use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use super::domain::{
    parse_flexible_datetime, EmploymentType, JobOffer, JobOfferPatch, JobOfferSubmission,
    LegacyJob, LegacyJobPatch, LegacyJobSubmission, Listing, ListingId, ListingStatus, Mobility,
    SeekerPatch, SeekerProfile, SeekerSubmission,
};
use super::query::{FeedPlan, FeedQuery, ListingFilter, OwnerStats, Pagination};
use super::repository::ListingRepository;
use crate::accounts::domain::UserId;
use crate::accounts::repository::UserRepository;
use crate::auth::Publisher;
use crate::catalog::{self, Category};
use crate::context::Backends;
use crate::error::ApiError;
use crate::payments::ledger::GrantLedger;
use crate::store::RepositoryError;

pub const DEFAULT_RUNTIME_DAYS: i64 = 30;
/// Largest runtime, forwards or backwards, a job offer may be given.
pub const MAX_RUNTIME_DAYS: i64 = 3650;

#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("only the creator may change this listing")]
    NotCreator,
    #[error("{0}")]
    Invalid(String),
    #[error("{0}")]
    PublishRejected(&'static str),
    #[error("a registered user is required to publish this listing")]
    UserRequired,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<ListingError> for ApiError {
    fn from(value: ListingError) -> Self {
        match value {
            ListingError::NotFound(_) => ApiError::not_found(value.to_string()),
            ListingError::NotCreator | ListingError::PublishRejected(_) => {
                ApiError::Forbidden(value.to_string())
            }
            ListingError::UserRequired => ApiError::Unauthorized(value.to_string()),
            ListingError::Invalid(message) => ApiError::BadRequest(message),
            ListingError::Repository(err) => err.into(),
        }
    }
}

fn invalid(message: impl Into<String>) -> ListingError {
    ListingError::Invalid(message.into())
}

/// Requested runtime in days. Missing and zero mean the default; negative
/// values are allowed and give a listing that is already expired.
fn runtime_days(requested: Option<i64>) -> Result<i64, ListingError> {
    match requested {
        None | Some(0) => Ok(DEFAULT_RUNTIME_DAYS),
        Some(days) if days.unsigned_abs() <= MAX_RUNTIME_DAYS.unsigned_abs() => Ok(days),
        Some(_) => Err(invalid("invalid duration")),
    }
}

fn expiry(now: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>, ListingError> {
    Duration::try_days(days)
        .and_then(|runtime| now.checked_add_signed(runtime))
        .ok_or_else(|| invalid("invalid duration"))
}

/// One page of a public feed.
#[derive(Debug, Clone)]
pub struct FeedPage<L> {
    pub items: Vec<L>,
    pub pagination: Pagination,
}

/// The caller's own live listings with counts over everything they created.
#[derive(Debug, Clone)]
pub struct OwnedListings<L> {
    pub live: Vec<L>,
    pub stats: OwnerStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    #[serde(rename = "activeApplications")]
    pub active_applications: u64,
    #[serde(rename = "savedJobs")]
    pub saved_jobs: u64,
    #[serde(rename = "totalJobs")]
    pub total_jobs: u64,
}

/// Job offers, job-seeker profiles and legacy jobs.
pub struct ListingService {
    offers: Arc<dyn ListingRepository<JobOffer>>,
    seekers: Arc<dyn ListingRepository<SeekerProfile>>,
    legacy_jobs: Arc<dyn ListingRepository<LegacyJob>>,
    users: Arc<dyn UserRepository>,
    grants: Arc<dyn GrantLedger>,
}

impl ListingService {
    pub fn new(backends: &Backends) -> Self {
        Self {
            offers: backends.offers.clone(),
            seekers: backends.seekers.clone(),
            legacy_jobs: backends.legacy_jobs.clone(),
            users: backends.users.clone(),
            grants: backends.grants.clone(),
        }
    }

    pub async fn offer_feed(
        &self,
        query: &FeedQuery,
        now: DateTime<Utc>,
    ) -> Result<FeedPage<JobOffer>, ListingError> {
        feed(&*self.offers, query, now).await
    }

    pub async fn offer(&self, id: &ListingId) -> Result<JobOffer, ListingError> {
        self.offers
            .fetch(id)
            .await?
            .ok_or(ListingError::NotFound("job offer"))
    }

    pub async fn create_offer(
        &self,
        publisher: Publisher,
        submission: JobOfferSubmission,
        now: DateTime<Utc>,
    ) -> Result<JobOffer, ListingError> {
        let (creator, payment) = publishing_identity(publisher, JobOffer::COLLECTION)?;

        let title = required(submission.title)?;
        let description = required(submission.description)?;
        let location = required(submission.location)?;
        let contact_name = required(submission.contact_name)?;
        let contact_email = required(submission.contact_email)?;
        let employment_type = submission
            .employment_type
            .as_deref()
            .and_then(EmploymentType::parse)
            .ok_or_else(|| invalid("invalid employment type"))?;
        let category = title_category(&title)?;
        let runtime = runtime_days(submission.duration)?;
        let expires_at = expiry(now, runtime)?;

        let offer = JobOffer {
            id: ListingId::generate(),
            title,
            description,
            location,
            category,
            employment_type,
            company: optional(submission.company),
            created_at: now,
            expires_at,
            contact_name,
            contact_email,
            contact_phone: optional(submission.contact_phone),
            status: ListingStatus::Active,
            creator,
        };

        let offer = self.publish(&*self.offers, offer, payment).await?;
        info!(listing_id = %offer.id, category = %offer.category, runtime, "job offer published");
        Ok(offer)
    }

    pub async fn update_offer(
        &self,
        caller: &UserId,
        id: &ListingId,
        patch: JobOfferPatch,
    ) -> Result<JobOffer, ListingError> {
        let mut offer = self.offer(id).await?;
        ensure_creator(offer.creator.as_ref(), caller)?;
        let retitled = patch.title.is_some();
        let requested_category = patch.category;
        patch.apply(&mut offer);

        let required_fields = [
            &offer.title,
            &offer.description,
            &offer.location,
            &offer.contact_name,
            &offer.contact_email,
        ];
        if required_fields.iter().any(|value| value.trim().is_empty()) {
            return Err(invalid("missing required fields"));
        }
        if retitled || requested_category.is_some() {
            let derived = title_category(&offer.title)?;
            if requested_category.is_some_and(|category| category != derived) {
                return Err(invalid("the category does not match the job title"));
            }
            offer.category = derived;
        }
        self.offers.replace(offer.clone()).await?;
        Ok(offer)
    }

    pub async fn delete_offer(&self, caller: &UserId, id: &ListingId) -> Result<(), ListingError> {
        let offer = self.offer(id).await?;
        ensure_creator(offer.creator.as_ref(), caller)?;
        self.offers.remove(id).await?;
        info!(listing_id = %id, "job offer deleted");
        Ok(())
    }

    pub async fn my_offers(
        &self,
        caller: &UserId,
        now: DateTime<Utc>,
    ) -> Result<OwnedListings<JobOffer>, ListingError> {
        owned(&*self.offers, caller, now).await
    }

    pub async fn seeker_feed(
        &self,
        query: &FeedQuery,
        now: DateTime<Utc>,
    ) -> Result<FeedPage<SeekerProfile>, ListingError> {
        feed(&*self.seekers, query, now).await
    }

    pub async fn seeker(&self, id: &ListingId) -> Result<SeekerProfile, ListingError> {
        self.seekers
            .fetch(id)
            .await?
            .ok_or(ListingError::NotFound("job seeker profile"))
    }

    pub async fn create_seeker(
        &self,
        publisher: Publisher,
        submission: SeekerSubmission,
        now: DateTime<Utc>,
    ) -> Result<SeekerProfile, ListingError> {
        let (creator, payment) = publishing_identity(publisher, SeekerProfile::COLLECTION)?;
        let creator = creator.ok_or(ListingError::UserRequired)?;
        let user = self
            .users
            .fetch(&creator)
            .await?
            .ok_or(ListingError::UserRequired)?;

        let occupation = required(submission.occupation)?;
        let category = seeker_category(&occupation, submission.category.as_deref())?;
        let mobility = submission
            .mobility
            .as_deref()
            .and_then(Mobility::parse)
            .ok_or_else(|| invalid("invalid mobility"))?;
        let employment_type = submission
            .employment_type
            .as_deref()
            .and_then(EmploymentType::parse)
            .ok_or_else(|| invalid("invalid employment type"))?;
        let available_from = submission
            .available_from
            .as_deref()
            .and_then(parse_flexible_datetime)
            .ok_or_else(|| invalid("invalid availability date"))?;
        let cv = optional(submission.cv)
            .or_else(|| user.cv.clone())
            .ok_or_else(|| invalid("a CV is required"))?;

        let profile = SeekerProfile {
            id: ListingId::generate(),
            title: occupation.clone(),
            occupation,
            location: required(submission.location)?,
            description: required(submission.description)?,
            experience: required(submission.experience)?,
            education: required(submission.education)?,
            skills: submission.skills,
            languages: submission.languages,
            mobility,
            employment_type,
            available_from,
            contact_email: required(submission.contact_email)?,
            contact_phone: optional(submission.contact_phone),
            cv,
            cover_letter: optional(submission.cover_letter),
            created_at: now,
            expires_at: expiry(now, DEFAULT_RUNTIME_DAYS)?,
            status: ListingStatus::Active,
            category,
            creator: creator.clone(),
            highlighted: user.premium.highlighted_cv,
        };

        let profile = self.publish(&*self.seekers, profile, payment).await?;
        self.users.link_posting(&creator, &profile.id).await?;
        info!(listing_id = %profile.id, user_id = %creator, "job seeker profile published");
        Ok(profile)
    }

    pub async fn update_seeker(
        &self,
        caller: &UserId,
        id: &ListingId,
        patch: SeekerPatch,
    ) -> Result<SeekerProfile, ListingError> {
        let mut profile = self.seeker(id).await?;
        ensure_creator(Some(&profile.creator), caller)?;
        patch.apply(&mut profile);
        self.seekers.replace(profile.clone()).await?;
        Ok(profile)
    }

    pub async fn delete_seeker(&self, caller: &UserId, id: &ListingId) -> Result<(), ListingError> {
        let profile = self.seeker(id).await?;
        ensure_creator(Some(&profile.creator), caller)?;
        self.seekers.remove(id).await?;
        match self.users.unlink_posting(&profile.creator, id).await {
            Ok(()) | Err(RepositoryError::NotFound) => {}
            Err(err) => return Err(err.into()),
        }
        info!(listing_id = %id, "job seeker profile deleted");
        Ok(())
    }

    pub async fn my_seekers(
        &self,
        caller: &UserId,
        now: DateTime<Utc>,
    ) -> Result<OwnedListings<SeekerProfile>, ListingError> {
        owned(&*self.seekers, caller, now).await
    }

    /// Every legacy job, newest first. This collection is not paged.
    pub async fn legacy_jobs(&self) -> Result<Vec<LegacyJob>, ListingError> {
        Ok(self
            .legacy_jobs
            .find(&ListingFilter::default(), None)
            .await?)
    }

    pub async fn legacy_job(&self, id: &ListingId) -> Result<LegacyJob, ListingError> {
        self.legacy_jobs
            .fetch(id)
            .await?
            .ok_or(ListingError::NotFound("job"))
    }

    pub async fn create_legacy_job(
        &self,
        submission: LegacyJobSubmission,
        now: DateTime<Utc>,
    ) -> Result<LegacyJob, ListingError> {
        let job = LegacyJob {
            id: ListingId::generate(),
            title: required(submission.title)?,
            location: required(submission.location)?,
            description: required(submission.description)?,
            company: required(submission.company)?,
            employment_type: required(submission.employment_type)?,
            contact_email: required(submission.contact_email)?,
            contact_phone: optional(submission.contact_phone),
            experience: optional(submission.experience),
            created_at: now,
            expires_at: expiry(now, DEFAULT_RUNTIME_DAYS)?,
        };
        Ok(self.legacy_jobs.insert(job).await?)
    }

    pub async fn update_legacy_job(
        &self,
        id: &ListingId,
        patch: LegacyJobPatch,
    ) -> Result<LegacyJob, ListingError> {
        let mut job = self.legacy_job(id).await?;
        patch.apply(&mut job);
        self.legacy_jobs.replace(job.clone()).await?;
        Ok(job)
    }

    pub async fn delete_legacy_job(&self, id: &ListingId) -> Result<(), ListingError> {
        if !self.legacy_jobs.remove(id).await? {
            return Err(ListingError::NotFound("job"));
        }
        Ok(())
    }

    /// Live postings of the caller against everything live on the board.
    pub async fn dashboard(
        &self,
        caller: &UserId,
        now: DateTime<Utc>,
    ) -> Result<DashboardStats, ListingError> {
        let mine = ListingFilter::by_creator(caller.clone()).and_live(now);
        let everyone = ListingFilter::live(now);
        Ok(DashboardStats {
            active_applications: self.offers.count(&mine).await?
                + self.seekers.count(&mine).await?,
            saved_jobs: 0,
            total_jobs: self.offers.count(&everyone).await?
                + self.seekers.count(&everyone).await?,
        })
    }

    /// Stores `listing`, then spends the payment behind it. When the payment
    /// was already spent, or the ledger fails, the stored listing is removed again.
    async fn publish<L: Listing>(
        &self,
        repository: &dyn ListingRepository<L>,
        listing: L,
        payment: Option<String>,
    ) -> Result<L, ListingError> {
        let stored = repository.insert(listing).await?;
        let Some(payment_id) = payment else {
            return Ok(stored);
        };
        let outcome = self.grants.redeem(&payment_id).await;
        if matches!(outcome, Ok(true)) {
            return Ok(stored);
        }
        if let Err(err) = repository.remove(stored.id()).await {
            error!(
                listing_id = %stored.id(),
                payment_id = %payment_id,
                error = %err,
                "unpaid listing could not be removed"
            );
        }
        match outcome {
            Err(err) => Err(err.into()),
            _ => {
                warn!(payment_id = %payment_id, "publish token reused");
                Err(ListingError::PublishRejected("publish token has already been used"))
            }
        }
    }
}

/// Creator of the new listing plus the payment to redeem, if any. Publish
/// tokens must have been paid for the same kind of listing.
fn publishing_identity(
    publisher: Publisher,
    kind: &str,
) -> Result<(Option<UserId>, Option<String>), ListingError> {
    match publisher {
        Publisher::User(user) => Ok((Some(user), None)),
        Publisher::Payment {
            payment_id,
            metadata,
        } => {
            if metadata.get("type").map(String::as_str) != Some(kind) {
                return Err(ListingError::PublishRejected(
                    "publish token was issued for a different listing type",
                ));
            }
            Ok((metadata_user(&metadata), Some(payment_id)))
        }
    }
}

fn metadata_user(metadata: &BTreeMap<String, String>) -> Option<UserId> {
    metadata
        .get("userId")
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .map(|id| UserId(id.to_string()))
}

fn seeker_category(occupation: &str, explicit: Option<&str>) -> Result<Category, ListingError> {
    if let Some(known) = catalog::by_title(occupation.trim()) {
        return Ok(known.category);
    }
    explicit
        .and_then(Category::parse)
        .ok_or_else(|| invalid("unknown occupation and no valid category"))
}

/// Listings without a creator may be changed by any signed-in user.
fn ensure_creator(creator: Option<&UserId>, caller: &UserId) -> Result<(), ListingError> {
    match creator {
        Some(creator) if creator != caller => Err(ListingError::NotCreator),
        _ => Ok(()),
    }
}

/// Category of the first catalog occupation named in a job title.
fn title_category(title: &str) -> Result<Category, ListingError> {
    catalog::mentioned_in(title)
        .map(|occupation| occupation.category)
        .ok_or_else(|| invalid("the job title must contain a known occupation"))
}

fn required(value: Option<String>) -> Result<String, ListingError> {
    optional(value).ok_or_else(|| invalid("missing required fields"))
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

async fn feed<L: Listing>(
    repository: &dyn ListingRepository<L>,
    query: &FeedQuery,
    now: DateTime<Utc>,
) -> Result<FeedPage<L>, ListingError> {
    match query.plan(now) {
        FeedPlan::Empty(request) => Ok(FeedPage {
            items: Vec::new(),
            pagination: Pagination::new(0, request),
        }),
        FeedPlan::Search(filter, request) => {
            let items = repository.find(&filter, Some(request)).await?;
            let total = repository.count(&filter).await?;
            Ok(FeedPage {
                items,
                pagination: Pagination::new(total, request),
            })
        }
    }
}

async fn owned<L: Listing>(
    repository: &dyn ListingRepository<L>,
    caller: &UserId,
    now: DateTime<Utc>,
) -> Result<OwnedListings<L>, ListingError> {
    let all = repository
        .find(&ListingFilter::by_creator(caller.clone()), None)
        .await?;
    let stats = OwnerStats::collect(&all, now);
    let live = all.into_iter().filter(|listing| listing.is_live(now)).collect();
    Ok(OwnedListings { live, stats })
}
