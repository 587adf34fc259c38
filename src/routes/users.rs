use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};

use crate::auth::extractor::{AuthUser, Authorized};
use crate::auth::guard::AdminOnly;
use crate::auth::password;
use crate::db;
use crate::error::{conflict_on_unique, AppError};
use crate::middleware::connection_log::{self, ClientInfo};
use crate::models::{Role, User};
use crate::routes::auth::normalize_email;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct AdminResetPassword {
    pub email: String,
    pub new_password: String,
}

/// Editable profile fields. Anything else in the body is rejected.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    /// Absent keeps the branch, `null` detaches the user from any branch.
    #[serde(default, deserialize_with = "present_or_null")]
    pub branch_id: Option<Option<i64>>,
    pub active: Option<bool>,
}

/// Distinguish an explicit `null` from a missing key.
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub async fn list(
    _auth: Authorized<AdminOnly>,
    State(state): State<SharedState>,
) -> Result<Json<Vec<User>>, AppError> {
    let users = db::users::list_all(&state.pool).await?;
    Ok(Json(users))
}

pub async fn me(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<User>, AppError> {
    let user = db::users::find_by_id(&state.pool, auth.user_id())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(user))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(patch): Json<UserPatch>,
) -> Result<Json<User>, AppError> {
    auth.require_self_or_admin(id)?;
    if (patch.role.is_some() || patch.active.is_some()) && !auth.is_admin() {
        return Err(AppError::Forbidden(
            "Only administrators can change roles or account status".to_string(),
        ));
    }

    let current = db::users::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let role = match patch.role.as_deref() {
        Some(raw) => raw
            .parse::<Role>()
            .map_err(|e| AppError::BadRequest(format!("Invalid role: {e}")))?,
        None => current.role,
    };
    let email = match patch.email.as_deref() {
        Some(raw) => normalize_email(raw)?,
        None => current.email.clone(),
    };
    let name = match patch.name.as_deref().map(str::trim) {
        Some("") => return Err(AppError::BadRequest("Name must not be empty".to_string())),
        Some(name) => name.to_string(),
        None => current.name.clone(),
    };
    if let Some(Some(branch_id)) = patch.branch_id {
        if !db::branches::exists(&state.pool, branch_id).await? {
            return Err(AppError::BadRequest(format!("Unknown branch {branch_id}")));
        }
    }

    let user = db::users::update_profile(
        &state.pool,
        id,
        &name,
        &email,
        role,
        patch.branch_id.unwrap_or(current.branch_id),
        patch.active.unwrap_or(current.active),
    )
    .await
    .map_err(|e| conflict_on_unique(e, "A user with this email already exists"))?
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = id, by = auth.user_id(), "User updated");
    Ok(Json(user))
}

/// Admin override: set a user's password without a recovery code.
pub async fn reset_password(
    auth: Authorized<AdminOnly>,
    State(state): State<SharedState>,
    client: ClientInfo,
    Json(req): Json<AdminResetPassword>,
) -> Result<Json<Value>, AppError> {
    let email = normalize_email(&req.email)?;
    let user = db::users::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    password::check_strength(&req.new_password).map_err(AppError::BadRequest)?;

    let pw_hash = password::hash(&req.new_password).map_err(AppError::Internal)?;
    db::users::reset_password_and_clear_code(&state.pool, user.id, &pw_hash).await?;

    connection_log::log_event(
        &state.pool,
        Some(user.id),
        connection_log::PASSWORD_RESET,
        &client,
        Some(&format!("by_admin={}", auth.user.user_id())),
    )
    .await;

    Ok(Json(json!({ "message": "Password reset successfully" })))
}
