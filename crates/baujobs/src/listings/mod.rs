//! Job offers, job-seeker profiles and the legacy job collection.

pub mod domain;
pub mod query;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{JobOffer, LegacyJob, Listing, ListingId, ListingStatus, SeekerProfile};
pub use repository::ListingRepository;
pub use router::listing_router;
pub use service::{ListingError, ListingService};
