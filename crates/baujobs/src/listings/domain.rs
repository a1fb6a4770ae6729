use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::accounts::domain::UserId;
use crate::catalog::Category;
use crate::store::new_object_id;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(pub String);

impl ListingId {
    pub fn generate() -> Self {
        Self(new_object_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ListingStatus {
    #[default]
    #[serde(rename = "aktiv")]
    Active,
    #[serde(rename = "inaktiv")]
    Inactive,
    /// Position has been filled.
    #[serde(rename = "besetzt")]
    Filled,
}

impl ListingStatus {
    pub fn label(self) -> &'static str {
        match self {
            ListingStatus::Active => "aktiv",
            ListingStatus::Inactive => "inaktiv",
            ListingStatus::Filled => "besetzt",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmploymentType {
    #[serde(rename = "Vollzeit")]
    FullTime,
    #[serde(rename = "Teilzeit")]
    PartTime,
    #[serde(rename = "Befristet")]
    FixedTerm,
    #[serde(rename = "Projektarbeit")]
    Project,
}

impl EmploymentType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "Vollzeit" => Some(Self::FullTime),
            "Teilzeit" => Some(Self::PartTime),
            "Befristet" => Some(Self::FixedTerm),
            "Projektarbeit" => Some(Self::Project),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mobility {
    #[serde(rename = "In der Region")]
    Regional,
    #[serde(rename = "Schweizweit")]
    Nationwide,
    #[serde(rename = "International")]
    International,
}

impl Mobility {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "In der Region" => Some(Self::Regional),
            "Schweizweit" => Some(Self::Nationwide),
            "International" => Some(Self::International),
            _ => None,
        }
    }
}

/// Behavior shared by every stored posting so repositories can filter generically.
pub trait Listing: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    const COLLECTION: &'static str;
    /// Fields persisted as native dates rather than strings.
    const DATE_FIELDS: &'static [&'static str];
    /// Fields persisted as object ids rather than hex strings.
    const ID_FIELDS: &'static [&'static str] = &["_id", "ersteller"];

    fn id(&self) -> &ListingId;
    fn location(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;
    fn expires_at(&self) -> DateTime<Utc>;

    fn creator(&self) -> Option<&UserId> {
        None
    }

    fn status(&self) -> Option<ListingStatus> {
        None
    }

    fn category(&self) -> Option<Category> {
        None
    }

    /// Active (or status-less) and not yet expired.
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        matches!(self.status(), None | Some(ListingStatus::Active)) && self.expires_at() > now
    }
}

/// Employer job offer (`stellenanzeigen-aufgeben`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobOffer {
    #[serde(rename = "_id")]
    pub id: ListingId,
    #[serde(rename = "titel")]
    pub title: String,
    #[serde(rename = "beschreibung")]
    pub description: String,
    #[serde(rename = "standort")]
    pub location: String,
    #[serde(rename = "kategorie")]
    pub category: Category,
    #[serde(rename = "artDerStelle")]
    pub employment_type: EmploymentType,
    #[serde(rename = "unternehmen", default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(rename = "erstelltAm")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
    #[serde(rename = "kontaktName")]
    pub contact_name: String,
    #[serde(rename = "kontaktEmail")]
    pub contact_email: String,
    #[serde(rename = "kontaktTelefon", default, skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub status: ListingStatus,
    #[serde(rename = "ersteller", default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<UserId>,
}

impl Listing for JobOffer {
    const COLLECTION: &'static str = "stellenanzeigen-aufgeben";
    const DATE_FIELDS: &'static [&'static str] = &["erstelltAm", "expiresAt"];

    fn id(&self) -> &ListingId {
        &self.id
    }

    fn location(&self) -> &str {
        &self.location
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    fn creator(&self) -> Option<&UserId> {
        self.creator.as_ref()
    }

    fn status(&self) -> Option<ListingStatus> {
        Some(self.status)
    }

    fn category(&self) -> Option<Category> {
        Some(self.category)
    }
}

/// Job seeker posting (`suche-einen-job`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeekerProfile {
    #[serde(rename = "_id")]
    pub id: ListingId,
    #[serde(rename = "titel")]
    pub title: String,
    #[serde(rename = "beruf")]
    pub occupation: String,
    #[serde(rename = "standort")]
    pub location: String,
    #[serde(rename = "beschreibung")]
    pub description: String,
    #[serde(rename = "erfahrung")]
    pub experience: String,
    #[serde(rename = "ausbildung")]
    pub education: String,
    #[serde(rename = "faehigkeiten", default)]
    pub skills: Vec<String>,
    #[serde(rename = "sprachen", default)]
    pub languages: Vec<String>,
    #[serde(rename = "mobilitaet")]
    pub mobility: Mobility,
    #[serde(rename = "artDerStelle")]
    pub employment_type: EmploymentType,
    #[serde(rename = "verfuegbarAb", deserialize_with = "flexible_datetime")]
    pub available_from: DateTime<Utc>,
    #[serde(rename = "kontaktEmail")]
    pub contact_email: String,
    #[serde(rename = "kontaktTelefon", default, skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(rename = "lebenslauf")]
    pub cv: String,
    #[serde(rename = "anschreiben", default, skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
    #[serde(rename = "erstelltAm")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub status: ListingStatus,
    #[serde(rename = "kategorie")]
    pub category: Category,
    #[serde(rename = "ersteller")]
    pub creator: UserId,
    #[serde(rename = "hervorgehoben", default)]
    pub highlighted: bool,
}

impl Listing for SeekerProfile {
    const COLLECTION: &'static str = "suche-einen-job";
    const DATE_FIELDS: &'static [&'static str] = &["erstelltAm", "expiresAt", "verfuegbarAb"];

    fn id(&self) -> &ListingId {
        &self.id
    }

    fn location(&self) -> &str {
        &self.location
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    fn creator(&self) -> Option<&UserId> {
        Some(&self.creator)
    }

    fn status(&self) -> Option<ListingStatus> {
        Some(self.status)
    }

    fn category(&self) -> Option<Category> {
        Some(self.category)
    }
}

/// Entry of the older free-form `jobs` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyJob {
    #[serde(rename = "_id")]
    pub id: ListingId,
    #[serde(rename = "titel")]
    pub title: String,
    #[serde(rename = "standort")]
    pub location: String,
    #[serde(rename = "beschreibung")]
    pub description: String,
    #[serde(rename = "unternehmen")]
    pub company: String,
    #[serde(rename = "artDerStelle")]
    pub employment_type: String,
    #[serde(rename = "kontaktEmail")]
    pub contact_email: String,
    #[serde(rename = "kontaktTelefon", default, skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(rename = "erfahrung", default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
    #[serde(rename = "erstelltAm")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
}

impl Listing for LegacyJob {
    const COLLECTION: &'static str = "jobs";
    const DATE_FIELDS: &'static [&'static str] = &["erstelltAm", "expiresAt"];
    const ID_FIELDS: &'static [&'static str] = &["_id"];

    fn id(&self) -> &ListingId {
        &self.id
    }

    fn location(&self) -> &str {
        &self.location
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

/// Accepts RFC 3339 timestamps as well as bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_flexible_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn flexible_datetime<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_flexible_datetime(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{raw}'")))
}

fn optional_flexible_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    raw.map(|value| {
        parse_flexible_datetime(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{value}'")))
    })
    .transpose()
}

/// Body of `POST /stellenanzeigen-aufgeben`. Fields are optional so missing
/// values surface as validation errors rather than parse failures.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobOfferSubmission {
    #[serde(rename = "titel")]
    pub title: Option<String>,
    #[serde(rename = "beschreibung")]
    pub description: Option<String>,
    #[serde(rename = "standort")]
    pub location: Option<String>,
    #[serde(rename = "artDerStelle")]
    pub employment_type: Option<String>,
    #[serde(rename = "unternehmen")]
    pub company: Option<String>,
    #[serde(rename = "kontaktName")]
    pub contact_name: Option<String>,
    #[serde(rename = "kontaktEmail")]
    pub contact_email: Option<String>,
    #[serde(rename = "kontaktTelefon")]
    pub contact_phone: Option<String>,
    /// Runtime in days.
    pub duration: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeekerSubmission {
    #[serde(rename = "beruf")]
    pub occupation: Option<String>,
    #[serde(rename = "kategorie")]
    pub category: Option<String>,
    #[serde(rename = "standort")]
    pub location: Option<String>,
    #[serde(rename = "beschreibung")]
    pub description: Option<String>,
    #[serde(rename = "erfahrung")]
    pub experience: Option<String>,
    #[serde(rename = "ausbildung")]
    pub education: Option<String>,
    #[serde(rename = "faehigkeiten", default)]
    pub skills: Vec<String>,
    #[serde(rename = "sprachen", default)]
    pub languages: Vec<String>,
    #[serde(rename = "mobilitaet")]
    pub mobility: Option<String>,
    #[serde(rename = "artDerStelle")]
    pub employment_type: Option<String>,
    #[serde(rename = "verfuegbarAb")]
    pub available_from: Option<String>,
    #[serde(rename = "kontaktEmail")]
    pub contact_email: Option<String>,
    #[serde(rename = "kontaktTelefon")]
    pub contact_phone: Option<String>,
    #[serde(rename = "lebenslauf")]
    pub cv: Option<String>,
    #[serde(rename = "anschreiben")]
    pub cover_letter: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyJobSubmission {
    #[serde(rename = "titel")]
    pub title: Option<String>,
    #[serde(rename = "standort")]
    pub location: Option<String>,
    #[serde(rename = "beschreibung")]
    pub description: Option<String>,
    #[serde(rename = "unternehmen")]
    pub company: Option<String>,
    #[serde(rename = "artDerStelle")]
    pub employment_type: Option<String>,
    #[serde(rename = "kontaktEmail")]
    pub contact_email: Option<String>,
    #[serde(rename = "kontaktTelefon")]
    pub contact_phone: Option<String>,
    #[serde(rename = "erfahrung")]
    pub experience: Option<String>,
}

/// Partial update of a job offer. Identity, creator and creation date are fixed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobOfferPatch {
    #[serde(rename = "titel")]
    pub title: Option<String>,
    #[serde(rename = "beschreibung")]
    pub description: Option<String>,
    #[serde(rename = "standort")]
    pub location: Option<String>,
    #[serde(rename = "kategorie")]
    pub category: Option<Category>,
    #[serde(rename = "artDerStelle")]
    pub employment_type: Option<EmploymentType>,
    #[serde(rename = "unternehmen")]
    pub company: Option<String>,
    #[serde(rename = "kontaktName")]
    pub contact_name: Option<String>,
    #[serde(rename = "kontaktEmail")]
    pub contact_email: Option<String>,
    #[serde(rename = "kontaktTelefon")]
    pub contact_phone: Option<String>,
    pub status: Option<ListingStatus>,
    #[serde(rename = "expiresAt", default, deserialize_with = "optional_flexible_datetime")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl JobOfferPatch {
    pub fn apply(self, offer: &mut JobOffer) {
        if let Some(title) = self.title {
            offer.title = title;
        }
        if let Some(description) = self.description {
            offer.description = description;
        }
        if let Some(location) = self.location {
            offer.location = location;
        }
        if let Some(category) = self.category {
            offer.category = category;
        }
        if let Some(employment_type) = self.employment_type {
            offer.employment_type = employment_type;
        }
        if self.company.is_some() {
            offer.company = self.company;
        }
        if let Some(contact_name) = self.contact_name {
            offer.contact_name = contact_name;
        }
        if let Some(contact_email) = self.contact_email {
            offer.contact_email = contact_email;
        }
        if self.contact_phone.is_some() {
            offer.contact_phone = self.contact_phone;
        }
        if let Some(status) = self.status {
            offer.status = status;
        }
        if let Some(expires_at) = self.expires_at {
            offer.expires_at = expires_at;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeekerPatch {
    #[serde(rename = "standort")]
    pub location: Option<String>,
    #[serde(rename = "beschreibung")]
    pub description: Option<String>,
    #[serde(rename = "erfahrung")]
    pub experience: Option<String>,
    #[serde(rename = "ausbildung")]
    pub education: Option<String>,
    #[serde(rename = "faehigkeiten")]
    pub skills: Option<Vec<String>>,
    #[serde(rename = "sprachen")]
    pub languages: Option<Vec<String>>,
    #[serde(rename = "mobilitaet")]
    pub mobility: Option<Mobility>,
    #[serde(rename = "artDerStelle")]
    pub employment_type: Option<EmploymentType>,
    #[serde(rename = "verfuegbarAb", default, deserialize_with = "optional_flexible_datetime")]
    pub available_from: Option<DateTime<Utc>>,
    #[serde(rename = "kontaktEmail")]
    pub contact_email: Option<String>,
    #[serde(rename = "kontaktTelefon")]
    pub contact_phone: Option<String>,
    #[serde(rename = "lebenslauf")]
    pub cv: Option<String>,
    #[serde(rename = "anschreiben")]
    pub cover_letter: Option<String>,
    pub status: Option<ListingStatus>,
}

impl SeekerPatch {
    pub fn apply(self, profile: &mut SeekerProfile) {
        if let Some(location) = self.location {
            profile.location = location;
        }
        if let Some(description) = self.description {
            profile.description = description;
        }
        if let Some(experience) = self.experience {
            profile.experience = experience;
        }
        if let Some(education) = self.education {
            profile.education = education;
        }
        if let Some(skills) = self.skills {
            profile.skills = skills;
        }
        if let Some(languages) = self.languages {
            profile.languages = languages;
        }
        if let Some(mobility) = self.mobility {
            profile.mobility = mobility;
        }
        if let Some(employment_type) = self.employment_type {
            profile.employment_type = employment_type;
        }
        if let Some(available_from) = self.available_from {
            profile.available_from = available_from;
        }
        if let Some(contact_email) = self.contact_email {
            profile.contact_email = contact_email;
        }
        if self.contact_phone.is_some() {
            profile.contact_phone = self.contact_phone;
        }
        if let Some(cv) = self.cv {
            profile.cv = cv;
        }
        if self.cover_letter.is_some() {
            profile.cover_letter = self.cover_letter;
        }
        if let Some(status) = self.status {
            profile.status = status;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegacyJobPatch {
    #[serde(rename = "titel")]
    pub title: Option<String>,
    #[serde(rename = "standort")]
    pub location: Option<String>,
    #[serde(rename = "beschreibung")]
    pub description: Option<String>,
    #[serde(rename = "unternehmen")]
    pub company: Option<String>,
    #[serde(rename = "artDerStelle")]
    pub employment_type: Option<String>,
    #[serde(rename = "kontaktEmail")]
    pub contact_email: Option<String>,
    #[serde(rename = "kontaktTelefon")]
    pub contact_phone: Option<String>,
    #[serde(rename = "erfahrung")]
    pub experience: Option<String>,
}

impl LegacyJobPatch {
    pub fn apply(self, job: &mut LegacyJob) {
        if let Some(title) = self.title {
            job.title = title;
        }
        if let Some(location) = self.location {
            job.location = location;
        }
        if let Some(description) = self.description {
            job.description = description;
        }
        if let Some(company) = self.company {
            job.company = company;
        }
        if let Some(employment_type) = self.employment_type {
            job.employment_type = employment_type;
        }
        if let Some(contact_email) = self.contact_email {
            job.contact_email = contact_email;
        }
        if self.contact_phone.is_some() {
            job.contact_phone = self.contact_phone;
        }
        if self.experience.is_some() {
            job.experience = self.experience;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn offer(status: ListingStatus, expires_in: Duration) -> JobOffer {
        let now = Utc::now();
        JobOffer {
            id: ListingId::generate(),
            title: "Maurer/in EFZ".into(),
            description: "Neubau in Zug".into(),
            location: "Zug".into(),
            category: Category::StructuralWork,
            employment_type: EmploymentType::FullTime,
            company: None,
            created_at: now,
            expires_at: now + expires_in,
            contact_name: "Anna Muster".into(),
            contact_email: "anna@bau.ch".into(),
            contact_phone: None,
            status,
            creator: None,
        }
    }

    #[test]
    fn liveness_requires_active_status_and_future_expiry() {
        let now = Utc::now();
        assert!(offer(ListingStatus::Active, Duration::days(1)).is_live(now));
        assert!(!offer(ListingStatus::Inactive, Duration::days(1)).is_live(now));
        assert!(!offer(ListingStatus::Filled, Duration::days(1)).is_live(now));
        assert!(!offer(ListingStatus::Active, Duration::zero()).is_live(now + Duration::seconds(1)));
    }

    #[test]
    fn offers_use_german_wire_names() {
        let json = serde_json::to_value(offer(ListingStatus::Active, Duration::days(30)))
            .expect("serializes");
        assert_eq!(json["titel"], "Maurer/in EFZ");
        assert_eq!(json["kategorie"], "Hochbau");
        assert_eq!(json["artDerStelle"], "Vollzeit");
        assert_eq!(json["status"], "aktiv");
        assert!(json.get("ersteller").is_none());
    }

    #[test]
    fn missing_status_defaults_to_active() {
        let mut json = serde_json::to_value(offer(ListingStatus::Filled, Duration::days(3)))
            .expect("serializes");
        json.as_object_mut().expect("object").remove("status");
        let parsed: JobOffer = serde_json::from_value(json).expect("parses");
        assert_eq!(parsed.status, ListingStatus::Active);
    }

    #[test]
    fn flexible_dates_accept_plain_days() {
        assert_eq!(
            parse_flexible_datetime("2025-03-01"),
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_flexible_datetime("2025-03-01T08:30:00+01:00"),
            Some(Utc.with_ymd_and_hms(2025, 3, 1, 7, 30, 0).unwrap())
        );
        assert!(parse_flexible_datetime("bald").is_none());
    }

    #[test]
    fn patch_leaves_identity_untouched() {
        let mut target = offer(ListingStatus::Active, Duration::days(30));
        let id = target.id.clone();
        let patch: JobOfferPatch =
            serde_json::from_value(serde_json::json!({ "titel": "Polier/in", "status": "besetzt" }))
                .expect("patch parses");
        patch.apply(&mut target);
        assert_eq!(target.id, id);
        assert_eq!(target.title, "Polier/in");
        assert_eq!(target.status, ListingStatus::Filled);
        assert_eq!(target.location, "Zug");
    }
}
