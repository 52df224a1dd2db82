//! Domain models and request/response types

pub mod loan;
pub mod title;
pub mod user;
