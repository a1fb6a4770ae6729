//! Static reference data: trade categories, occupations and Swiss cantons.

pub mod cantons;
pub mod occupations;

pub use cantons::{by_code, canton_of, localities_in, search_localities, Canton, CANTONS};
pub use occupations::{by_title, mentioned_in, Category, Occupation, OCCUPATIONS};
