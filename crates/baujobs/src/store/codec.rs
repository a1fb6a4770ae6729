//! Conversion between serde records and MongoDB documents.
//!
//! Records carry ids as hex strings and timestamps as RFC 3339 strings so they
//! serialize to JSON unchanged. On the way into the database the listed id and
//! date fields become native `ObjectId` and `Date` values; on the way out every
//! native value is turned back into its string form.

use bson::oid::ObjectId;
use bson::{Bson, Document};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::RepositoryError;

pub fn encode<T: Serialize>(
    record: &T,
    date_fields: &[&str],
    id_fields: &[&str],
) -> Result<Document, RepositoryError> {
    let mut document = bson::to_document(record)
        .map_err(|err| RepositoryError::Unavailable(format!("failed to encode document: {err}")))?;
    for path in date_fields {
        convert_at(&mut document, path, &to_native_date);
    }
    for path in id_fields {
        convert_at(&mut document, path, &to_object_id);
    }
    Ok(document)
}

pub fn decode<T: DeserializeOwned>(mut document: Document) -> Result<T, RepositoryError> {
    stringify_document(&mut document);
    bson::from_document(document)
        .map_err(|err| RepositoryError::Unavailable(format!("failed to decode document: {err}")))
}

/// Query value for an id: an `ObjectId` when the string is one, the raw string otherwise.
pub fn id_value(id: &str) -> Bson {
    match ObjectId::parse_str(id) {
        Ok(oid) => Bson::ObjectId(oid),
        Err(_) => Bson::String(id.to_string()),
    }
}

pub fn date_value(at: DateTime<Utc>) -> Bson {
    Bson::DateTime(bson::DateTime::from_chrono(at))
}

fn convert_at(document: &mut Document, path: &str, convert: &dyn Fn(&Bson) -> Option<Bson>) {
    match path.split_once('.') {
        Some((head, rest)) => {
            if let Ok(inner) = document.get_document_mut(head) {
                convert_at(inner, rest, convert);
            }
        }
        None => {
            if let Some(value) = document.get_mut(path) {
                convert_value(value, convert);
            }
        }
    }
}

fn convert_value(value: &mut Bson, convert: &dyn Fn(&Bson) -> Option<Bson>) {
    if let Bson::Array(items) = value {
        for item in items.iter_mut() {
            convert_value(item, convert);
        }
        return;
    }
    if let Some(converted) = convert(value) {
        *value = converted;
    }
}

fn to_native_date(value: &Bson) -> Option<Bson> {
    let Bson::String(raw) = value else {
        return None;
    };
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|parsed| date_value(parsed.with_timezone(&Utc)))
}

fn to_object_id(value: &Bson) -> Option<Bson> {
    let Bson::String(raw) = value else {
        return None;
    };
    ObjectId::parse_str(raw).ok().map(Bson::ObjectId)
}

fn stringify_document(document: &mut Document) {
    for (_, value) in document.iter_mut() {
        stringify_value(value);
    }
}

fn stringify_value(value: &mut Bson) {
    match value {
        Bson::ObjectId(oid) => *value = Bson::String(oid.to_hex()),
        Bson::DateTime(at) => {
            *value = Bson::String(at.to_chrono().to_rfc3339_opts(SecondsFormat::Millis, true))
        }
        Bson::Document(inner) => stringify_document(inner),
        Bson::Array(items) => items.iter_mut().for_each(stringify_value),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::domain::{AccountType, PremiumFeatures, UserId, UserRecord};
    use crate::listings::domain::ListingId;
    use chrono::{Duration, TimeZone};

    fn user() -> UserRecord {
        let created = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        UserRecord {
            id: UserId::generate(),
            email: "lea@bau.ch".into(),
            password_hash: "hash".into(),
            first_name: "Lea".into(),
            last_name: "Keller".into(),
            phone: None,
            company: None,
            profile_picture: None,
            account_type: AccountType::JobSeeker,
            email_verified: true,
            premium: PremiumFeatures {
                highlighted_cv: true,
                premium_until: Some(created + Duration::days(30)),
                premium_type: Some(AccountType::JobSeeker),
            },
            cv: Some("https://cdn/cv.pdf".into()),
            cv_visible: true,
            seeker_postings: vec![ListingId::generate()],
            created_at: created,
        }
    }

    #[test]
    fn encode_uses_native_ids_and_dates() {
        let record = user();
        let document =
            encode(&record, UserRecord::DATE_FIELDS, UserRecord::ID_FIELDS).expect("encodes");

        assert!(matches!(document.get("_id"), Some(Bson::ObjectId(_))));
        assert!(matches!(document.get("erstelltAm"), Some(Bson::DateTime(_))));
        let premium = document.get_document("premiumFeatures").expect("nested");
        assert!(matches!(premium.get("premiumBis"), Some(Bson::DateTime(_))));
        let postings = document.get_array("erstellteSucheJobs").expect("array");
        assert!(matches!(postings[0], Bson::ObjectId(_)));
    }

    #[test]
    fn decode_restores_the_record() {
        let record = user();
        let document =
            encode(&record, UserRecord::DATE_FIELDS, UserRecord::ID_FIELDS).expect("encodes");
        let restored: UserRecord = decode(document).expect("decodes");
        assert_eq!(restored, record);
    }

    #[test]
    fn id_value_keeps_foreign_ids_as_strings() {
        assert!(matches!(id_value("64b7f0c2a1b2c3d4e5f60718"), Bson::ObjectId(_)));
        assert_eq!(id_value("legacy-1"), Bson::String("legacy-1".into()));
    }
}
