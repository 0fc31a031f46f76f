//! SeaORM entity definitions
//!
//! One module per table. Gallery and public-id lists are stored as JSON text; the
//! repositories convert rows into the domain models in `crate::models`.

pub mod prelude;

pub mod advertisers;
pub mod likes;
pub mod listings;
