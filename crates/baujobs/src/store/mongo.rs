use std::marker::PhantomData;

use async_trait::async_trait;
use bson::{doc, Bson, Document, Regex};
use futures::TryStreamExt;
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::options::{FindOptions, IndexOptions};
use mongodb::{Client, Collection, IndexModel};
pub use mongodb::Database;
use tracing::{info, warn};

use super::codec::{date_value, decode, encode, id_value};
use super::RepositoryError;
use crate::accounts::domain::{UserId, UserRecord};
use crate::accounts::repository::UserRepository;
use crate::listings::domain::{JobOffer, Listing, ListingId};
use crate::listings::query::{ListingFilter, PageRequest};
use crate::listings::repository::ListingRepository;
use crate::maintenance::{category_fix, CategoryFix, CategoryReport, MigrationReport};
use crate::payments::ledger::GrantLedger;

const DUPLICATE_KEY: i32 = 11000;
const GRANTS_COLLECTION: &str = "publish-grants";
const LEGACY_SOURCE: &str = "stellengesuche";
const LEGACY_TARGET: &str = "stellenanzeigen";

fn unavailable(err: MongoError) -> RepositoryError {
    RepositoryError::Unavailable(err.to_string())
}

fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY
    )
}

/// Connects to the cluster and makes sure the indexes the service relies on exist.
pub async fn connect(uri: &str, database: &str) -> Result<Database, RepositoryError> {
    let client = Client::with_uri_str(uri).await.map_err(unavailable)?;
    let db = client.database(database);
    db.run_command(doc! { "ping": 1 }, None)
        .await
        .map_err(unavailable)?;

    let unique_email = IndexModel::builder()
        .keys(doc! { "email": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();
    db.collection::<Document>(UserRecord::COLLECTION)
        .create_index(unique_email, None)
        .await
        .map_err(unavailable)?;

    info!(database, "connected to MongoDB");
    Ok(db)
}

fn escape_regex(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if "\\^$.|?*+()[]{}".contains(ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

pub(crate) fn filter_document(filter: &ListingFilter) -> Document {
    let mut document = Document::new();
    if let Some(creator) = &filter.creator {
        document.insert("ersteller", id_value(creator.as_str()));
    }

    let mut expiry = Document::new();
    if let Some(now) = filter.live_at {
        document.insert(
            "$or",
            vec![
                Bson::Document(doc! { "status": "aktiv" }),
                Bson::Document(doc! { "status": { "$exists": false } }),
            ],
        );
        expiry.insert("$gt", date_value(now));
    }
    if let Some(cutoff) = filter.expired_at {
        expiry.insert("$lte", date_value(cutoff));
    }
    if !expiry.is_empty() {
        document.insert("expiresAt", expiry);
    }

    if let Some(category) = filter.category {
        document.insert(
            "kategorie",
            Bson::RegularExpression(Regex {
                pattern: format!("^{}$", escape_regex(category.label())),
                options: "i".to_string(),
            }),
        );
    }
    if let Some(locations) = &filter.locations {
        document.insert("standort", doc! { "$in": locations.clone() });
    }
    document
}

pub struct MongoListings<L> {
    collection: Collection<Document>,
    _listing: PhantomData<fn() -> L>,
}

impl<L: Listing> MongoListings<L> {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(L::COLLECTION),
            _listing: PhantomData,
        }
    }

    fn encode(listing: &L) -> Result<Document, RepositoryError> {
        encode(listing, L::DATE_FIELDS, L::ID_FIELDS)
    }
}

#[async_trait]
impl<L: Listing> ListingRepository<L> for MongoListings<L> {
    async fn insert(&self, listing: L) -> Result<L, RepositoryError> {
        let document = Self::encode(&listing)?;
        self.collection
            .insert_one(document, None)
            .await
            .map_err(|err| {
                if is_duplicate_key(&err) {
                    RepositoryError::Conflict
                } else {
                    unavailable(err)
                }
            })?;
        Ok(listing)
    }

    async fn fetch(&self, id: &ListingId) -> Result<Option<L>, RepositoryError> {
        let found = self
            .collection
            .find_one(doc! { "_id": id_value(id.as_str()) }, None)
            .await
            .map_err(unavailable)?;
        found.map(decode).transpose()
    }

    async fn replace(&self, listing: L) -> Result<(), RepositoryError> {
        let document = Self::encode(&listing)?;
        let result = self
            .collection
            .replace_one(doc! { "_id": id_value(listing.id().as_str()) }, document, None)
            .await
            .map_err(unavailable)?;
        if result.matched_count == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn remove(&self, id: &ListingId) -> Result<bool, RepositoryError> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id_value(id.as_str()) }, None)
            .await
            .map_err(unavailable)?;
        Ok(result.deleted_count > 0)
    }

    async fn find(
        &self,
        filter: &ListingFilter,
        page: Option<PageRequest>,
    ) -> Result<Vec<L>, RepositoryError> {
        let mut options = FindOptions::builder()
            .sort(doc! { "erstelltAm": -1, "_id": -1 })
            .build();
        if let Some(page) = page {
            options.skip = Some(page.skip());
            options.limit = Some(page.limit as i64);
        }

        let cursor = self
            .collection
            .find(filter_document(filter), options)
            .await
            .map_err(unavailable)?;
        let documents: Vec<Document> = cursor.try_collect().await.map_err(unavailable)?;
        documents.into_iter().map(decode).collect()
    }

    async fn count(&self, filter: &ListingFilter) -> Result<u64, RepositoryError> {
        self.collection
            .count_documents(filter_document(filter), None)
            .await
            .map_err(unavailable)
    }

    async fn remove_matching(&self, filter: &ListingFilter) -> Result<u64, RepositoryError> {
        let result = self
            .collection
            .delete_many(filter_document(filter), None)
            .await
            .map_err(unavailable)?;
        Ok(result.deleted_count)
    }
}

pub struct MongoUsers {
    collection: Collection<Document>,
}

impl MongoUsers {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(UserRecord::COLLECTION),
        }
    }

    fn encode(user: &UserRecord) -> Result<Document, RepositoryError> {
        encode(user, UserRecord::DATE_FIELDS, UserRecord::ID_FIELDS)
    }

    async fn find_one(&self, filter: Document) -> Result<Option<UserRecord>, RepositoryError> {
        let found = self
            .collection
            .find_one(filter, None)
            .await
            .map_err(unavailable)?;
        found.map(decode).transpose()
    }

    async fn update_by_id(&self, id: &UserId, update: Document) -> Result<(), RepositoryError> {
        let result = self
            .collection
            .update_one(doc! { "_id": id_value(id.as_str()) }, update, None)
            .await
            .map_err(unavailable)?;
        if result.matched_count == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MongoUsers {
    async fn insert(&self, user: UserRecord) -> Result<UserRecord, RepositoryError> {
        let document = Self::encode(&user)?;
        self.collection
            .insert_one(document, None)
            .await
            .map_err(|err| {
                if is_duplicate_key(&err) {
                    RepositoryError::Conflict
                } else {
                    unavailable(err)
                }
            })?;
        Ok(user)
    }

    async fn fetch(&self, id: &UserId) -> Result<Option<UserRecord>, RepositoryError> {
        self.find_one(doc! { "_id": id_value(id.as_str()) }).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepositoryError> {
        self.find_one(doc! { "email": email }).await
    }

    async fn replace(&self, user: UserRecord) -> Result<(), RepositoryError> {
        let document = Self::encode(&user)?;
        let result = self
            .collection
            .replace_one(doc! { "_id": id_value(user.id.as_str()) }, document, None)
            .await
            .map_err(unavailable)?;
        if result.matched_count == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn remove(&self, id: &UserId) -> Result<bool, RepositoryError> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id_value(id.as_str()) }, None)
            .await
            .map_err(unavailable)?;
        Ok(result.deleted_count > 0)
    }

    async fn link_posting(&self, id: &UserId, posting: &ListingId) -> Result<(), RepositoryError> {
        self.update_by_id(
            id,
            doc! { "$push": { "erstellteSucheJobs": id_value(posting.as_str()) } },
        )
        .await
    }

    async fn unlink_posting(
        &self,
        id: &UserId,
        posting: &ListingId,
    ) -> Result<(), RepositoryError> {
        self.update_by_id(
            id,
            doc! { "$pull": { "erstellteSucheJobs": id_value(posting.as_str()) } },
        )
        .await
    }
}

pub struct MongoGrantLedger {
    collection: Collection<Document>,
}

impl MongoGrantLedger {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(GRANTS_COLLECTION),
        }
    }
}

#[async_trait]
impl GrantLedger for MongoGrantLedger {
    async fn redeem(&self, payment_id: &str) -> Result<bool, RepositoryError> {
        let grant = doc! {
            "_id": payment_id,
            "redeemedAt": bson::DateTime::now(),
        };
        match self.collection.insert_one(grant, None).await {
            Ok(_) => Ok(true),
            Err(err) if is_duplicate_key(&err) => Ok(false),
            Err(err) => Err(unavailable(err)),
        }
    }
}

/// Rewrites job-offer categories stored as slugs or in the wrong case to their labels.
pub async fn normalize_categories(db: &Database) -> Result<CategoryReport, RepositoryError> {
    let collection = db.collection::<Document>(JobOffer::COLLECTION);
    let cursor = collection
        .find(doc! {}, None)
        .await
        .map_err(unavailable)?;
    let documents: Vec<Document> = cursor.try_collect().await.map_err(unavailable)?;

    let mut report = CategoryReport::default();
    for document in documents {
        let Some(id) = document.get("_id").cloned() else {
            continue;
        };
        let raw = document.get_str("kategorie").unwrap_or_default();
        match category_fix(raw) {
            CategoryFix::Canonical => report.unchanged += 1,
            CategoryFix::Rewrite(category) => {
                collection
                    .update_one(
                        doc! { "_id": id.clone() },
                        doc! { "$set": { "kategorie": category.label() } },
                        None,
                    )
                    .await
                    .map_err(unavailable)?;
                info!(%id, from = raw, to = category.label(), "category normalized");
                report.rewritten += 1;
            }
            CategoryFix::Unknown => {
                warn!(%id, category = raw, "unknown category left untouched");
                report.unknown += 1;
            }
        }
    }
    Ok(report)
}

/// Copies the legacy `stellengesuche` collection into `stellenanzeigen` and drops the source.
pub async fn migrate_legacy_listings(db: &Database) -> Result<MigrationReport, RepositoryError> {
    let names = db.list_collection_names(None).await.map_err(unavailable)?;
    if !names.iter().any(|name| name == LEGACY_SOURCE) {
        info!(source = LEGACY_SOURCE, "nothing to migrate");
        return Ok(MigrationReport::default());
    }

    let source = db.collection::<Document>(LEGACY_SOURCE);
    let cursor = source.find(doc! {}, None).await.map_err(unavailable)?;
    let documents: Vec<Document> = cursor.try_collect().await.map_err(unavailable)?;
    let copied = documents.len() as u64;

    if !documents.is_empty() {
        db.collection::<Document>(LEGACY_TARGET)
            .insert_many(documents, None)
            .await
            .map_err(unavailable)?;
    }
    source.drop(None).await.map_err(unavailable)?;

    info!(copied, source = LEGACY_SOURCE, target = LEGACY_TARGET, "legacy listings migrated");
    Ok(MigrationReport {
        copied,
        dropped_source: true,
    })
}
