//! Shared error, trait and news types

pub mod errors;
pub mod traits;
pub mod types;
