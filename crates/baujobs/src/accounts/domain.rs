use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::listings::domain::ListingId;
use crate::store::new_object_id;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn generate() -> Self {
        Self(new_object_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    /// Employer publishing job offers.
    #[serde(rename = "arbeitgeber")]
    Employer,
    #[serde(rename = "arbeitssuchender")]
    JobSeeker,
}

impl AccountType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "arbeitgeber" => Some(Self::Employer),
            "arbeitssuchender" => Some(Self::JobSeeker),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AccountType::Employer => "arbeitgeber",
            AccountType::JobSeeker => "arbeitssuchender",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PremiumFeatures {
    #[serde(rename = "lebenslaufHervorgehoben", default)]
    pub highlighted_cv: bool,
    #[serde(rename = "premiumBis", default, skip_serializing_if = "Option::is_none")]
    pub premium_until: Option<DateTime<Utc>>,
    #[serde(rename = "premiumTyp", default, skip_serializing_if = "Option::is_none")]
    pub premium_type: Option<AccountType>,
}

impl PremiumFeatures {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.premium_until.is_some_and(|until| until > now)
    }
}

/// Stored user document. Never serialized to clients directly; see [`UserView`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub email: String,
    #[serde(rename = "password")]
    pub password_hash: String,
    #[serde(rename = "vorname", default)]
    pub first_name: String,
    #[serde(rename = "nachname", default)]
    pub last_name: String,
    #[serde(rename = "telefon", default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "firma", default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(rename = "profilbild", default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    #[serde(rename = "accountTyp")]
    pub account_type: AccountType,
    #[serde(rename = "emailVerifiziert", default)]
    pub email_verified: bool,
    #[serde(rename = "premiumFeatures", default)]
    pub premium: PremiumFeatures,
    #[serde(rename = "lebenslauf", default, skip_serializing_if = "Option::is_none")]
    pub cv: Option<String>,
    #[serde(rename = "lebenslaufSichtbar", default)]
    pub cv_visible: bool,
    #[serde(rename = "erstellteSucheJobs", default)]
    pub seeker_postings: Vec<ListingId>,
    #[serde(rename = "erstelltAm")]
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    pub const COLLECTION: &'static str = "users";
    pub const DATE_FIELDS: &'static [&'static str] = &["erstelltAm", "premiumFeatures.premiumBis"];
    pub const ID_FIELDS: &'static [&'static str] = &["_id", "erstellteSucheJobs"];

    pub fn view(&self) -> UserView {
        UserView {
            id: self.id.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            phone: self.phone.clone(),
            company: self.company.clone(),
            profile_picture: self.profile_picture.clone(),
            account_type: self.account_type,
            email_verified: self.email_verified,
            premium: self.premium.clone(),
            cv: self.cv.clone(),
            cv_visible: self.cv_visible,
            seeker_postings: self.seeker_postings.clone(),
            created_at: self.created_at,
        }
    }
}

/// Client-facing user representation without the password hash.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserView {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub email: String,
    #[serde(rename = "vorname")]
    pub first_name: String,
    #[serde(rename = "nachname")]
    pub last_name: String,
    #[serde(rename = "telefon", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "firma", skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(rename = "profilbild", skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    #[serde(rename = "accountTyp")]
    pub account_type: AccountType,
    #[serde(rename = "emailVerifiziert")]
    pub email_verified: bool,
    #[serde(rename = "premiumFeatures")]
    pub premium: PremiumFeatures,
    #[serde(rename = "lebenslauf", skip_serializing_if = "Option::is_none")]
    pub cv: Option<String>,
    #[serde(rename = "lebenslaufSichtbar")]
    pub cv_visible: bool,
    #[serde(rename = "erstellteSucheJobs")]
    pub seeker_postings: Vec<ListingId>,
    #[serde(rename = "erstelltAm")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(rename = "vorname", default)]
    pub first_name: String,
    #[serde(rename = "nachname", default)]
    pub last_name: String,
    #[serde(rename = "telefon", default)]
    pub phone: Option<String>,
    #[serde(rename = "firma", default)]
    pub company: Option<String>,
    #[serde(rename = "accountTyp", default)]
    pub account_type: Option<String>,
}

/// Partial profile update; absent fields stay untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    #[serde(rename = "vorname")]
    pub first_name: Option<String>,
    #[serde(rename = "nachname")]
    pub last_name: Option<String>,
    #[serde(rename = "telefon")]
    pub phone: Option<String>,
    #[serde(rename = "firma")]
    pub company: Option<String>,
    #[serde(rename = "profilbild")]
    pub profile_picture: Option<String>,
    #[serde(rename = "lebenslauf")]
    pub cv: Option<String>,
}

impl ProfileUpdate {
    pub fn apply(self, user: &mut UserRecord) {
        if let Some(first_name) = self.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            user.last_name = last_name;
        }
        if let Some(phone) = self.phone {
            user.phone = Some(phone);
        }
        if let Some(company) = self.company {
            user.company = Some(company);
        }
        if let Some(picture) = self.profile_picture {
            user.profile_picture = Some(picture);
        }
        if let Some(cv) = self.cv {
            user.cv = Some(cv);
        }
    }
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Minimal shape check: one `@`, non-empty local part, dotted domain.
pub fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}
