//! Catalog endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        loan::TitleHistoryView,
        title::{CreateTitle, Title, TitleQuery, UpdateCopies},
    },
};

use super::AuthenticatedUser;

/// List catalog titles
#[utoipa::path(
    get,
    path = "/titles",
    tag = "titles",
    security(("bearer_auth" = [])),
    params(TitleQuery),
    responses(
        (status = 200, description = "Catalog titles", body = Vec<Title>)
    )
)]
pub async fn list_titles(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<TitleQuery>,
) -> Json<Vec<Title>> {
    Json(state.services.repository.inventory.list(&query))
}

/// Get a single title
#[utoipa::path(
    get,
    path = "/titles/{id}",
    tag = "titles",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Title ID")
    ),
    responses(
        (status = 200, description = "Title", body = Title),
        (status = 404, description = "Title not found")
    )
)]
pub async fn get_title(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Title>> {
    Ok(Json(state.services.repository.inventory.get(id)?))
}

/// Ingest a new catalog title (staff)
#[utoipa::path(
    post,
    path = "/titles",
    tag = "titles",
    security(("bearer_auth" = [])),
    request_body = CreateTitle,
    responses(
        (status = 201, description = "Title created", body = Title),
        (status = 400, description = "Invalid request"),
        (status = 403, description = "Staff privileges required")
    )
)]
pub async fn create_title(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateTitle>,
) -> AppResult<(StatusCode, Json<Title>)> {
    claims.require_staff()?;
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let title = state.services.repository.inventory.insert(request);
    Ok((StatusCode::CREATED, Json(title)))
}

/// Edit the copy count of a title (staff). Available copies are reconciled
/// against outstanding loans in the same operation.
#[utoipa::path(
    put,
    path = "/titles/{id}/copies",
    tag = "titles",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Title ID")
    ),
    request_body = UpdateCopies,
    responses(
        (status = 200, description = "Copy count updated", body = Title),
        (status = 400, description = "Fewer copies than outstanding loans"),
        (status = 404, description = "Title not found")
    )
)]
pub async fn update_copies(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCopies>,
) -> AppResult<Json<Title>> {
    claims.require_staff()?;
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let outstanding = state
        .services
        .repository
        .ledger
        .outstanding_by_title()
        .get(&id)
        .copied()
        .unwrap_or(0);
    let title = state
        .services
        .repository
        .inventory
        .set_total_copies(id, request.total_copies, outstanding)?;
    Ok(Json(title))
}

/// Borrow history of a title (staff)
#[utoipa::path(
    get,
    path = "/titles/{id}/history",
    tag = "titles",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Title ID")
    ),
    responses(
        (status = 200, description = "Borrow history", body = Vec<TitleHistoryView>),
        (status = 404, description = "Title not found")
    )
)]
pub async fn title_history(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<TitleHistoryView>>> {
    claims.require_staff()?;
    Ok(Json(state.services.queries.title_history(id)?))
}
