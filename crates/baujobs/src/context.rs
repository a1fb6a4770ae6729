//! Shared application state handed to every router.

use std::sync::Arc;

use mongodb::Database;

use crate::accounts::repository::UserRepository;
use crate::accounts::AccountService;
use crate::auth::TokenIssuer;
use crate::config::AppConfig;
use crate::listings::domain::{JobOffer, LegacyJob, SeekerProfile};
use crate::listings::repository::ListingRepository;
use crate::listings::ListingService;
use crate::mail::Mailer;
use crate::payments::gateway::PaymentGateway;
use crate::payments::ledger::GrantLedger;
use crate::payments::PaymentService;
use crate::storage::{FileStore, DEFAULT_MAX_UPLOAD_BYTES};
use crate::store::memory::{MemoryGrantLedger, MemoryListings, MemoryUsers};
use crate::store::mongo::{MongoGrantLedger, MongoListings, MongoUsers};

/// Repository handles for every collection.
#[derive(Clone)]
pub struct Backends {
    pub users: Arc<dyn UserRepository>,
    pub offers: Arc<dyn ListingRepository<JobOffer>>,
    pub seekers: Arc<dyn ListingRepository<SeekerProfile>>,
    pub legacy_jobs: Arc<dyn ListingRepository<LegacyJob>>,
    pub grants: Arc<dyn GrantLedger>,
}

impl Backends {
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(MemoryUsers::default()),
            offers: Arc::new(MemoryListings::<JobOffer>::default()),
            seekers: Arc::new(MemoryListings::<SeekerProfile>::default()),
            legacy_jobs: Arc::new(MemoryListings::<LegacyJob>::default()),
            grants: Arc::new(MemoryGrantLedger::default()),
        }
    }

    pub fn mongo(db: &Database) -> Self {
        Self {
            users: Arc::new(MongoUsers::new(db)),
            offers: Arc::new(MongoListings::<JobOffer>::new(db)),
            seekers: Arc::new(MongoListings::<SeekerProfile>::new(db)),
            legacy_jobs: Arc::new(MongoListings::<LegacyJob>::new(db)),
            grants: Arc::new(MongoGrantLedger::new(db)),
        }
    }
}

/// The slice of [`AppConfig`] the request handlers depend on.
#[derive(Debug, Clone)]
pub struct Settings {
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
    pub frontend_url: String,
    pub payment_amount_cents: u64,
    pub payment_currency: String,
    pub webhook_secret: Option<String>,
    pub max_upload_bytes: usize,
}

impl Settings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            jwt_secret: config.auth.jwt_secret.clone(),
            session_ttl_hours: config.auth.session_ttl_hours,
            frontend_url: config.mail.frontend_url.clone(),
            payment_amount_cents: config.payments.amount_cents,
            payment_currency: config.payments.currency.clone(),
            webhook_secret: config.payments.webhook_secret.clone(),
            max_upload_bytes: config.storage.max_upload_bytes,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            jwt_secret: "baujobs-development-secret".to_string(),
            session_ttl_hours: 24,
            frontend_url: "http://localhost:3000".to_string(),
            payment_amount_cents: 1000,
            payment_currency: "chf".to_string(),
            webhook_secret: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

pub struct AppContext {
    pub tokens: Arc<TokenIssuer>,
    pub accounts: Arc<AccountService>,
    pub listings: ListingService,
    pub payments: PaymentService,
    pub storage: Arc<dyn FileStore>,
    pub max_upload_bytes: usize,
    pub backends: Backends,
}

impl AppContext {
    pub fn new(
        settings: Settings,
        backends: Backends,
        mailer: Arc<dyn Mailer>,
        gateway: Arc<dyn PaymentGateway>,
        storage: Arc<dyn FileStore>,
    ) -> Self {
        let tokens = Arc::new(TokenIssuer::new(
            &settings.jwt_secret,
            settings.session_ttl_hours,
        ));
        let accounts = Arc::new(AccountService::new(
            backends.users.clone(),
            backends.seekers.clone(),
            tokens.clone(),
            mailer,
            settings.frontend_url.clone(),
        ));
        let payments = PaymentService::new(
            gateway,
            settings.webhook_secret.as_deref(),
            tokens.clone(),
            accounts.clone(),
            settings.payment_amount_cents,
            settings.payment_currency.clone(),
        );
        Self {
            listings: ListingService::new(&backends),
            tokens,
            accounts,
            payments,
            storage,
            max_upload_bytes: settings.max_upload_bytes,
            backends,
        }
    }
}
