use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::Config;
use crate::models::User;

/// Session claim set. `id`, `sub` and `role` are mandatory; anything else a
/// caller puts in `extra` is carried through issue, verify and refresh.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    pub id: i64,
    pub sub: String,
    pub role: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    pub fn new(id: i64, email: &str, role: &str, name: &str) -> Self {
        Self {
            id,
            sub: email.to_string(),
            role: role.to_string(),
            name: name.to_string(),
            exp: None,
            extra: Map::new(),
        }
    }

    pub fn for_user(user: &User) -> Self {
        Self::new(user.id, &user.email, user.role.as_str(), &user.name)
    }
}

/// Why a presented token was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    Expired,
    Invalid,
}

impl fmt::Display for TokenRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenRejection::Expired => f.write_str("token expired"),
            TokenRejection::Invalid => f.write_str("token invalid"),
        }
    }
}

/// Stateless session tokens signed with a shared HMAC secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    ttl: Duration,
    refresh_grace: Duration,
}

impl TokenService {
    pub fn new(
        secret: &str,
        algorithm: Algorithm,
        ttl: Duration,
        refresh_grace: Duration,
    ) -> Result<Self, String> {
        if secret.trim().is_empty() {
            return Err("JWT secret must not be blank".to_string());
        }
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(format!("Unsupported signing algorithm {algorithm:?}"));
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            algorithm,
            ttl,
            refresh_grace,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, String> {
        Self::new(
            &config.jwt_secret,
            config.jwt_algorithm,
            Duration::minutes(config.token_ttl_minutes),
            Duration::minutes(config.token_refresh_grace_minutes),
        )
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign `claims` with `exp = now + ttl`. The role is lowercased first.
    pub fn issue(&self, claims: &Claims, ttl: Duration) -> Result<String, String> {
        if claims.sub.trim().is_empty() || claims.role.trim().is_empty() {
            return Err("Claims must carry an identity and a role".to_string());
        }

        let mut claims = claims.clone();
        claims.role = claims.role.trim().to_lowercase();
        claims.exp = Some((Utc::now() + ttl).timestamp());

        encode(&Header::new(self.algorithm), &claims, &self.encoding)
            .map_err(|e| format!("JWT encode failed: {e}"))
    }

    pub fn issue_default(&self, claims: &Claims) -> Result<String, String> {
        self.issue(claims, self.ttl)
    }

    /// Check signature, structure and expiry (no leeway).
    pub fn verify(&self, token: &str) -> Result<Claims, TokenRejection> {
        let claims = self.decode_signed(token)?;
        check_expiry(claims.exp, Utc::now().timestamp(), 0)?;
        Ok(claims)
    }

    /// Re-issue a token with a fresh expiry. Expired tokens are only accepted
    /// inside the configured grace window.
    pub fn refresh(&self, token: &str) -> Result<String, TokenRejection> {
        let mut claims = self.decode_signed(token)?;
        check_expiry(
            claims.exp,
            Utc::now().timestamp(),
            self.refresh_grace.num_seconds(),
        )?;

        claims.exp = None;
        self.issue(&claims, self.ttl).map_err(|e| {
            tracing::error!("Token refresh failed: {e}");
            TokenRejection::Invalid
        })
    }

    fn decode_signed(&self, token: &str) -> Result<Claims, TokenRejection> {
        // Expiry is checked by hand so that ttl <= 0 is always expired and
        // refresh can apply its grace window. `exp` must still be present.
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.leeway = 0;

        let mut claims = decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("JWT decode failed: {e}");
                TokenRejection::Invalid
            })?;
        claims.role = claims.role.to_lowercase();
        Ok(claims)
    }
}

fn check_expiry(exp: Option<i64>, now: i64, grace_secs: i64) -> Result<(), TokenRejection> {
    match exp {
        None => Err(TokenRejection::Invalid),
        Some(exp) if exp.saturating_add(grace_secs) > now => Ok(()),
        Some(_) => Err(TokenRejection::Expired),
    }
}
