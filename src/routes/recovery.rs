use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::password;
use crate::auth::recovery;
use crate::config::RecoveryDelivery;
use crate::db;
use crate::error::AppError;
use crate::middleware::connection_log::{self, ClientInfo};
use crate::models::User;
use crate::routes::auth::normalize_email;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct RequestCode {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ValidateCode {
    pub email: String,
    pub code: String,
}

#[derive(Deserialize)]
pub struct ResetWithCode {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

async fn find_user(state: &SharedState, email: &str) -> Result<User, AppError> {
    let email = normalize_email(email)?;
    db::users::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

fn check(user: &User, code: &str) -> Result<(), AppError> {
    recovery::check_code(
        user.recovery_code.as_deref(),
        user.recovery_expires_at,
        code,
        Utc::now(),
    )
    .map_err(|rejection| AppError::BadRequest(rejection.message().to_string()))
}

/// Issue a fresh code, replacing any pending one. In email mode nothing is
/// stored unless a mailer is available.
pub async fn request_code(
    State(state): State<SharedState>,
    Json(req): Json<RequestCode>,
) -> Result<Json<Value>, AppError> {
    let user = find_user(&state, &req.email).await?;

    let mailer = match state.config.recovery_delivery {
        RecoveryDelivery::Response => None,
        RecoveryDelivery::Email => Some(state.system_mailer.as_ref().ok_or_else(|| {
            AppError::Internal("Recovery delivery is email but SMTP is not configured".to_string())
        })?),
    };

    let code = recovery::generate_code();
    let expires_at = Utc::now() + recovery::code_ttl();
    db::users::set_recovery_code(&state.pool, user.id, &code, expires_at).await?;

    tracing::info!(user_id = user.id, "Recovery code issued");

    let Some(mailer) = mailer else {
        return Ok(Json(json!({
            "message": "Recovery code generated",
            "code": code,
            "expires_at": expires_at,
        })));
    };

    if let Err(e) = mailer.send_recovery_code(&user.email, &user.name, &code).await {
        // An undelivered code must not stay redeemable.
        db::users::clear_recovery_code(&state.pool, user.id).await?;
        return Err(AppError::Internal(e));
    }

    Ok(Json(json!({
        "message": "A recovery code has been sent to your email",
        "expires_at": expires_at,
    })))
}

/// Check a code without consuming it.
pub async fn validate_code(
    State(state): State<SharedState>,
    Json(req): Json<ValidateCode>,
) -> Result<Json<Value>, AppError> {
    let user = find_user(&state, &req.email).await?;
    check(&user, &req.code)?;
    Ok(Json(json!({ "message": "Code is valid" })))
}

pub async fn reset_password(
    State(state): State<SharedState>,
    client: ClientInfo,
    Json(req): Json<ResetWithCode>,
) -> Result<Json<Value>, AppError> {
    let user = find_user(&state, &req.email).await?;
    check(&user, &req.code)?;
    password::check_strength(&req.new_password).map_err(AppError::BadRequest)?;

    let pw_hash = password::hash(&req.new_password).map_err(AppError::Internal)?;
    db::users::reset_password_and_clear_code(&state.pool, user.id, &pw_hash).await?;

    connection_log::log_event(
        &state.pool,
        Some(user.id),
        connection_log::PASSWORD_RESET,
        &client,
        Some("recovery code"),
    )
    .await;

    Ok(Json(json!({ "message": "Password reset successfully" })))
}
