//! HTTP handlers, one module per resource

pub mod advertisers;
pub mod health;
pub mod likes;
pub mod listings;
