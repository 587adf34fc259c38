use std::marker::PhantomData;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::auth::guard::{self, RoleSet};
use crate::auth::jwt::{Claims, TokenRejection};
use crate::error::AppError;
use crate::models::Role;
use crate::state::SharedState;

/// A caller whose bearer token verified. The role has not been checked yet.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub claims: Claims,
}

impl AuthUser {
    pub fn user_id(&self) -> i64 {
        self.claims.id
    }

    pub fn require_roles(&self, allowed: &[Role]) -> Result<Role, AppError> {
        guard::require_role(&self.claims, allowed)
    }

    pub fn require_self_or_admin(&self, target_id: i64) -> Result<(), AppError> {
        guard::require_self_or_admin(&self.claims, target_id)
    }

    pub fn is_admin(&self) -> bool {
        guard::is_admin(&self.claims)
    }
}

/// Pull the token out of `Authorization: Bearer <token>`. Any other shape is
/// rejected before the token is looked at.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let missing = || AppError::Unauthorized("Missing or invalid credentials".to_string());

    let value = headers
        .get("authorization")
        .ok_or_else(missing)?
        .to_str()
        .map_err(|_| missing())?;

    match value.strip_prefix("Bearer ") {
        Some(token) if !token.is_empty() && !token.contains(char::is_whitespace) => Ok(token),
        _ => Err(missing()),
    }
}

pub fn rejection_to_error(rejection: TokenRejection) -> AppError {
    match rejection {
        TokenRejection::Expired => AppError::Unauthorized("Token expired".to_string()),
        TokenRejection::Invalid => AppError::Unauthorized("Invalid token".to_string()),
    }
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?;
        let claims = state.tokens.verify(token).map_err(rejection_to_error)?;
        Ok(AuthUser { claims })
    }
}

/// An authenticated caller whose role belongs to `P`.
pub struct Authorized<P: RoleSet> {
    pub user: AuthUser,
    pub role: Role,
    _set: PhantomData<P>,
}

impl<P: RoleSet> FromRequestParts<SharedState> for Authorized<P> {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        let role = user.require_roles(P::allowed())?;
        Ok(Authorized {
            user,
            role,
            _set: PhantomData,
        })
    }
}
