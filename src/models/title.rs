//! Catalog title model and related types

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Catalog entry: one title with a fixed number of physical copies.
///
/// `available_copies` is owned by the inventory store and always equals
/// `total_copies` minus the number of outstanding loans on the title.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Title {
    pub id: Uuid,
    pub isbn: String,
    pub title: String,
    pub author: String,
    pub category: String,
    pub total_copies: u32,
    pub available_copies: u32,
}

/// Catalog ingestion request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateTitle {
    #[validate(length(min = 10, max = 17, message = "ISBN must be 10-17 characters"))]
    pub isbn: String,
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author must not be empty"))]
    pub author: String,
    pub category: Option<String>,
    #[validate(range(min = 1, max = 10_000, message = "Copy count must be between 1 and 10000"))]
    pub total_copies: u32,
}

/// Copy-count edit request. Total and available copies are reconciled
/// together against outstanding loans.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateCopies {
    #[validate(range(min = 0, max = 10_000, message = "Copy count must be between 0 and 10000"))]
    pub total_copies: u32,
}

/// Catalog listing filters
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct TitleQuery {
    /// Exact category match
    pub category: Option<String>,
    /// Case-insensitive substring over title and author
    pub search: Option<String>,
}
