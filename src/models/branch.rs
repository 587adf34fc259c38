use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Branch {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub status: String,
    pub manager: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub const BRANCH_ACTIVE: &str = "active";
pub const BRANCH_INACTIVE: &str = "inactive";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BranchFields {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub manager: Option<String>,
}

/// Partial update. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BranchPatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub status: Option<String>,
    pub manager: Option<String>,
}

fn default_status() -> String {
    BRANCH_ACTIVE.to_string()
}

pub fn is_valid_status(status: &str) -> bool {
    status == BRANCH_ACTIVE || status == BRANCH_INACTIVE
}

impl Branch {
    pub fn apply(&self, patch: BranchPatch) -> BranchFields {
        BranchFields {
            name: patch.name.unwrap_or_else(|| self.name.clone()),
            address: patch.address.or_else(|| self.address.clone()),
            city: patch.city.or_else(|| self.city.clone()),
            phone: patch.phone.or_else(|| self.phone.clone()),
            status: patch.status.unwrap_or_else(|| self.status.clone()),
            manager: patch.manager.or_else(|| self.manager.clone()),
        }
    }
}
