use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use subtle::ConstantTimeEq;

pub const RECOVERY_CODE_TTL_MINUTES: i64 = 10;

/// How long a recovery code stays usable after it is issued.
pub fn code_ttl() -> Duration {
    Duration::minutes(RECOVERY_CODE_TTL_MINUTES)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryRejection {
    NoActiveCode,
    WrongCode,
    Expired,
}

impl RecoveryRejection {
    pub fn message(self) -> &'static str {
        match self {
            RecoveryRejection::NoActiveCode => "No active recovery code",
            RecoveryRejection::WrongCode => "Incorrect recovery code",
            RecoveryRejection::Expired => "Recovery code has expired",
        }
    }
}

/// A uniformly random six-digit code, zero padded.
pub fn generate_code() -> String {
    format!("{:06}", rand::rng().random_range(0..1_000_000u32))
}

/// Check a presented code against the stored one. The code matches first,
/// then the expiry is checked (inclusive at the boundary).
pub fn check_code(
    stored: Option<&str>,
    expires_at: Option<DateTime<Utc>>,
    presented: &str,
    now: DateTime<Utc>,
) -> Result<(), RecoveryRejection> {
    let (Some(stored), Some(expires_at)) = (stored, expires_at) else {
        return Err(RecoveryRejection::NoActiveCode);
    };

    let presented = presented.trim();
    if !bool::from(stored.as_bytes().ct_eq(presented.as_bytes())) {
        return Err(RecoveryRejection::WrongCode);
    }
    if now > expires_at {
        return Err(RecoveryRejection::Expired);
    }
    Ok(())
}
