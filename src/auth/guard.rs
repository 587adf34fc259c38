//! Role checks shared by the extractors and handlers.

use crate::auth::jwt::Claims;
use crate::error::AppError;
use crate::models::Role;

/// A named set of roles, used as the type parameter of
/// [`Authorized`](crate::auth::extractor::Authorized).
pub trait RoleSet: Send + Sync + 'static {
    fn allowed() -> &'static [Role];
}

pub struct AdminOnly;
impl RoleSet for AdminOnly {
    fn allowed() -> &'static [Role] {
        &[Role::Admin]
    }
}

/// Roles allowed to change stock: products and imports.
pub struct StockManagers;
impl RoleSet for StockManagers {
    fn allowed() -> &'static [Role] {
        &[Role::Admin, Role::Warehouse]
    }
}

pub struct AnyStaff;
impl RoleSet for AnyStaff {
    fn allowed() -> &'static [Role] {
        &Role::ALL
    }
}

/// Accept the claims only if their role is one of `allowed`. An unknown
/// role is treated like any other role outside the set.
pub fn require_role(claims: &Claims, allowed: &[Role]) -> Result<Role, AppError> {
    match claims.role.parse::<Role>() {
        Ok(role) if allowed.contains(&role) => Ok(role),
        _ => Err(AppError::Forbidden(format!(
            "Role '{}' is not allowed here; allowed roles: {}",
            claims.role.to_lowercase(),
            allowed
                .iter()
                .map(Role::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        ))),
    }
}

/// Profile access: administrators, or the user editing their own record.
pub fn require_self_or_admin(claims: &Claims, target_id: i64) -> Result<(), AppError> {
    if is_admin(claims) || claims.id == target_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only administrators can modify other users".to_string(),
        ))
    }
}

pub fn is_admin(claims: &Claims) -> bool {
    matches!(claims.role.parse::<Role>(), Ok(Role::Admin))
}
