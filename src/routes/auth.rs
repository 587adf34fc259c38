use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::extractor::{bearer_token, rejection_to_error, AuthUser, Authorized};
use crate::auth::guard::{self, AdminOnly, AnyStaff, RoleSet};
use crate::auth::jwt::Claims;
use crate::auth::password;
use crate::config::RegistrationMode;
use crate::db;
use crate::error::{conflict_on_unique, AppError};
use crate::middleware::connection_log::{self, ClientInfo};
use crate::models::{Role, User};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Option<String>,
    pub branch_id: Option<i64>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub role: String,
    pub name: String,
}

impl TokenResponse {
    fn bearer(access_token: String, claims: &Claims) -> Self {
        Self {
            access_token,
            token_type: "bearer",
            role: claims.role.to_lowercase(),
            name: claims.name.clone(),
        }
    }
}

pub(crate) fn normalize_email(email: &str) -> Result<String, AppError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::BadRequest("A valid email is required".to_string()));
    }
    Ok(email)
}

/// Create an account. The first account can always be created; after that
/// an admin token is required, except in open mode for non-admin roles.
pub async fn register(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let email = normalize_email(&req.email)?;
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }
    password::check_strength(&req.password).map_err(AppError::BadRequest)?;

    let role = match req.role.as_deref() {
        Some(raw) => raw
            .parse::<Role>()
            .map_err(|e| AppError::BadRequest(format!("Invalid role: {e}")))?,
        None => Role::Branch,
    };

    if let Some(branch_id) = req.branch_id {
        if !db::branches::exists(&state.pool, branch_id).await? {
            return Err(AppError::BadRequest(format!("Unknown branch {branch_id}")));
        }
    }

    let pw_hash = password::hash(&req.password).map_err(AppError::Internal)?;

    // Advisory lock serializes the bootstrap check with concurrent registrations
    let mut tx = state.pool.begin().await?;
    sqlx::query("SELECT pg_advisory_xact_lock(1)")
        .execute(&mut *tx)
        .await?;

    let bootstrap = db::users::count_all(&mut *tx).await? == 0;
    if !bootstrap {
        let open = state.config.registration == RegistrationMode::Open && role != Role::Admin;
        if !open {
            let token = bearer_token(&headers)?;
            let caller = state.tokens.verify(token).map_err(rejection_to_error)?;
            guard::require_role(&caller, AdminOnly::allowed())?;
        }
    }

    let user = db::users::create(&mut *tx, &email, &pw_hash, name, role, req.branch_id)
        .await
        .map_err(|e| conflict_on_unique(e, "A user with this email already exists"))?;

    tx.commit().await?;

    tracing::info!(user_id = user.id, role = %user.role, bootstrap, "User registered");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<SharedState>,
    client: ClientInfo,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let email = req.email.trim().to_lowercase();

    if state.login_limiter.check(&email).is_err() {
        return Err(AppError::RateLimited(
            "Too many login attempts. Please try again later.".to_string(),
        ));
    }

    let user = db::users::find_by_email(&state.pool, &email).await?;
    let verified = match &user {
        Some(user) => password::verify(&req.password, &user.password_hash).unwrap_or_else(|e| {
            tracing::error!(user_id = user.id, "Stored password hash unreadable: {e}");
            false
        }),
        None => false,
    };

    let user = match user {
        Some(user) if verified && user.active => user,
        other => {
            if verified {
                tracing::info!("Login refused for inactive account");
            } else {
                state.login_limiter.record_failure(&email);
            }
            connection_log::log_event(
                &state.pool,
                None,
                connection_log::LOGIN_FAILED,
                &client,
                Some(&format!("email={email}")),
            )
            .await;
            let message = match other {
                Some(_) if verified => "Account is disabled",
                _ => "Invalid credentials",
            };
            return Err(AppError::Unauthorized(message.to_string()));
        }
    };

    state.login_limiter.clear(&email);

    let claims = Claims::for_user(&user);
    let access_token = state
        .tokens
        .issue_default(&claims)
        .map_err(AppError::Internal)?;

    connection_log::log_event(
        &state.pool,
        Some(user.id),
        connection_log::LOGIN_SUCCESS,
        &client,
        None,
    )
    .await;

    Ok(Json(TokenResponse::bearer(access_token, &claims)))
}

/// Trade a still-valid token (or one inside the refresh grace window) for a
/// fresh one carrying the same claims.
pub async fn refresh(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    let token = bearer_token(&headers)?;
    let access_token = state.tokens.refresh(token).map_err(rejection_to_error)?;
    let claims = state
        .tokens
        .verify(&access_token)
        .map_err(rejection_to_error)?;
    Ok(Json(TokenResponse::bearer(access_token, &claims)))
}

pub async fn verify(auth: AuthUser) -> Json<Value> {
    Json(json!({
        "valid": true,
        "id": auth.claims.id,
        "sub": auth.claims.sub,
        "role": auth.claims.role,
        "name": auth.claims.name,
    }))
}

pub async fn change_password(
    State(state): State<SharedState>,
    auth: Authorized<AnyStaff>,
    client: ClientInfo,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, AppError> {
    let user = db::users::find_by_id(&state.pool, auth.user.user_id())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let valid = password::verify(&req.current_password, &user.password_hash)
        .map_err(AppError::Internal)?;
    if !valid {
        return Err(AppError::BadRequest(
            "Current password is incorrect".to_string(),
        ));
    }
    password::check_strength(&req.new_password).map_err(AppError::BadRequest)?;

    let pw_hash = password::hash(&req.new_password).map_err(AppError::Internal)?;
    db::users::update_password(&state.pool, user.id, &pw_hash).await?;

    connection_log::log_event(
        &state.pool,
        Some(user.id),
        connection_log::PASSWORD_CHANGED,
        &client,
        None,
    )
    .await;

    Ok(Json(json!({ "message": "Password updated" })))
}
