//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, health, loans, titles, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Biblion API",
        version = "0.3.0",
        description = "Library circulation and inventory engine REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::me,
        // Titles
        titles::list_titles,
        titles::get_title,
        titles::create_title,
        titles::update_copies,
        titles::title_history,
        // Users
        users::list_users,
        users::get_user,
        users::create_user,
        // Loans
        loans::borrow,
        loans::return_loan,
        loans::renew_loan,
        loans::current_loans,
        loans::list_loans,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::UserInfo,
            // Titles
            crate::models::title::Title,
            crate::models::title::CreateTitle,
            crate::models::title::UpdateCopies,
            // Users
            crate::models::user::User,
            crate::models::user::CreateUser,
            crate::models::user::Role,
            // Loans
            loans::BorrowRequest,
            loans::LoanResponse,
            loans::ReturnResponse,
            crate::models::loan::LoanTransaction,
            crate::models::loan::LoanStatus,
            crate::models::loan::CurrentLoanView,
            crate::models::loan::TitleHistoryView,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "titles", description = "Catalog title management"),
        (name = "users", description = "Member directory"),
        (name = "loans", description = "Circulation operations")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
