//! Circulation endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::loan::{CurrentLoanView, LoanQuery, LoanTransaction},
};

use super::AuthenticatedUser;

/// Borrow request
#[derive(Deserialize, ToSchema)]
pub struct BorrowRequest {
    /// Title to borrow; the borrower is the session user
    pub title_id: Uuid,
}

/// Borrow/renew response with the (new) due time
#[derive(Serialize, ToSchema)]
pub struct LoanResponse {
    pub trans_id: u64,
    pub due_time: DateTime<Utc>,
    pub renew_count: u32,
    /// Status message, rendered verbatim by clients
    pub message: String,
}

/// Return response
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    pub status: String,
    pub loan: LoanTransaction,
}

/// Borrow a title
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = BorrowRequest,
    responses(
        (status = 201, description = "Loan opened", body = LoanResponse),
        (status = 404, description = "Title not found"),
        (status = 422, description = "No copies available, duplicate loan or loan limit reached")
    )
)]
pub async fn borrow(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<BorrowRequest>,
) -> AppResult<(StatusCode, Json<LoanResponse>)> {
    let loan = state
        .services
        .circulation
        .borrow(claims.sub, claims.role, request.title_id)?;

    Ok((
        StatusCode::CREATED,
        Json(LoanResponse {
            trans_id: loan.id,
            due_time: loan.due_time,
            renew_count: loan.renew_count,
            message: "Title borrowed successfully".to_string(),
        }),
    ))
}

/// Return a borrowed title
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = u64, Path, description = "Loan transaction ID")
    ),
    responses(
        (status = 200, description = "Title returned", body = ReturnResponse),
        (status = 403, description = "Loan belongs to another member"),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Concurrent update, retry"),
        (status = 422, description = "Already returned")
    )
)]
pub async fn return_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(trans_id): Path<u64>,
) -> AppResult<Json<ReturnResponse>> {
    let loan = state.services.circulation.return_loan(trans_id, &claims)?;

    Ok(Json(ReturnResponse {
        status: "returned".to_string(),
        loan,
    }))
}

/// Renew a loan
#[utoipa::path(
    post,
    path = "/loans/{id}/renew",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = u64, Path, description = "Loan transaction ID")
    ),
    responses(
        (status = 200, description = "Loan renewed", body = LoanResponse),
        (status = 403, description = "Loan belongs to another member"),
        (status = 404, description = "Loan not found"),
        (status = 409, description = "Concurrent update, retry"),
        (status = 422, description = "Renewal limit reached or already returned")
    )
)]
pub async fn renew_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(trans_id): Path<u64>,
) -> AppResult<Json<LoanResponse>> {
    let loan = state.services.circulation.renew(trans_id, &claims)?;

    Ok(Json(LoanResponse {
        trans_id: loan.id,
        due_time: loan.due_time,
        renew_count: loan.renew_count,
        message: format!("Loan renewed ({} renewals)", loan.renew_count),
    }))
}

/// Current loans of the session user
#[utoipa::path(
    get,
    path = "/loans/current",
    tag = "loans",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current loans", body = Vec<CurrentLoanView>)
    )
)]
pub async fn current_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<CurrentLoanView>>> {
    Ok(Json(state.services.queries.current_loans(claims.sub)?))
}

/// Admin-wide loan listing with filters (staff)
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(LoanQuery),
    responses(
        (status = 200, description = "Loans matching the filters", body = Vec<LoanTransaction>),
        (status = 403, description = "Staff privileges required")
    )
)]
pub async fn list_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<LoanQuery>,
) -> AppResult<Json<Vec<LoanTransaction>>> {
    claims.require_staff()?;
    Ok(Json(state.services.queries.list_loans(&query)))
}
