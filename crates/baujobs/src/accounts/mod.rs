pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{AccountType, PremiumFeatures, UserId, UserRecord, UserView};
pub use repository::UserRepository;
pub use router::account_router;
pub use service::{AccountError, AccountService};
