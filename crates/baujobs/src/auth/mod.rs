//! Password hashing, bearer tokens and the request extractors built on them.

pub mod extract;
pub mod password;
pub mod tokens;

pub use extract::{AuthUser, OptionalUser, Publisher};
pub use tokens::{Claims, TokenError, TokenIssuer, TokenKind};
