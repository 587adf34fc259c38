pub mod auth;
pub mod branches;
pub mod dashboard;
pub mod logs;
pub mod products;
pub mod recovery;
pub mod reports;
pub mod users;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/auth/verify", get(auth::verify))
        .route("/api/v1/auth/change-password", post(auth::change_password))
        // Recovery
        .route("/api/v1/auth/recovery/request", post(recovery::request_code))
        .route("/api/v1/auth/recovery/validate", post(recovery::validate_code))
        .route("/api/v1/auth/recovery/reset", post(recovery::reset_password))
        // Users
        .route("/api/v1/users", get(users::list))
        .route("/api/v1/users/me", get(users::me))
        .route("/api/v1/users/reset-password", post(users::reset_password))
        .route("/api/v1/users/{id}", put(users::update))
        // Products
        .route("/api/v1/products", get(products::list).post(products::create))
        .route("/api/v1/products/recent", get(products::recent))
        .route("/api/v1/products/schema", get(products::schema))
        .route(
            "/api/v1/products/{id}",
            get(products::get)
                .put(products::update)
                .delete(products::delete),
        )
        // Branches
        .route("/api/v1/branches", get(branches::list).post(branches::create))
        .route(
            "/api/v1/branches/{id}",
            get(branches::get)
                .put(branches::update)
                .delete(branches::delete),
        )
        .route("/api/v1/branches/{id}/inventory", get(branches::inventory))
        // Reports
        .route("/api/v1/reports/export", get(reports::export))
        .route(
            "/api/v1/reports/import",
            post(reports::import).layer(DefaultBodyLimit::disable()),
        )
        // Connection log
        .route("/api/v1/logs", get(logs::list))
        // Dashboard
        .route("/api/v1/dashboard/metrics", get(dashboard::metrics))
        .route("/api/v1/dashboard/branches/active", get(dashboard::active_branches))
        .route("/api/v1/dashboard/categories", get(dashboard::categories))
}
