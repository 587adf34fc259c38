use std::net::IpAddr;

use ipnet::IpNet;
use jsonwebtoken::Algorithm;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_algorithm: Algorithm,
    pub token_ttl_minutes: i64,
    pub token_refresh_grace_minutes: i64,
    pub host: IpAddr,
    pub port: u16,
    pub registration: RegistrationMode,
    pub recovery_delivery: RecoveryDelivery,
    pub max_upload_size: usize,
    pub import_default_branch_id: i64,
    pub trusted_proxies: Vec<IpNet>,
    pub log_level: String,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationMode {
    Open,
    Closed,
}

/// Where password recovery codes go.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecoveryDelivery {
    /// Sent through the system mailer, never echoed back.
    Email,
    /// Returned in the response body. Development only.
    Response,
}

pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60;

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;

        let jwt_secret = env_required("JWT_SECRET")?;
        if jwt_secret.trim().is_empty() {
            return Err("JWT_SECRET must not be blank".to_string());
        }

        let jwt_algorithm = parse_algorithm(&env_or("JWT_ALGORITHM", "HS256"))?;

        let token_ttl_minutes: i64 = env_or("TOKEN_TTL_MINUTES", &DEFAULT_TOKEN_TTL_MINUTES.to_string())
            .parse()
            .map_err(|e| format!("Invalid TOKEN_TTL_MINUTES: {e}"))?;
        if token_ttl_minutes <= 0 {
            return Err("TOKEN_TTL_MINUTES must be positive".to_string());
        }

        let token_refresh_grace_minutes: i64 = env_or("TOKEN_REFRESH_GRACE_MINUTES", "0")
            .parse()
            .map_err(|e| format!("Invalid TOKEN_REFRESH_GRACE_MINUTES: {e}"))?;
        if token_refresh_grace_minutes < 0 {
            return Err("TOKEN_REFRESH_GRACE_MINUTES must not be negative".to_string());
        }

        let host: IpAddr = env_or("STOCKROOM_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid STOCKROOM_HOST: {e}"))?;

        let port: u16 = env_or("STOCKROOM_PORT", "8000")
            .parse()
            .map_err(|e| format!("Invalid STOCKROOM_PORT: {e}"))?;

        let registration = match env_or("STOCKROOM_REGISTRATION", "closed").as_str() {
            "open" => RegistrationMode::Open,
            _ => RegistrationMode::Closed,
        };

        let recovery_delivery = match env_or("STOCKROOM_RECOVERY_DELIVERY", "email").as_str() {
            "email" => RecoveryDelivery::Email,
            "response" => RecoveryDelivery::Response,
            other => {
                return Err(format!(
                    "Invalid STOCKROOM_RECOVERY_DELIVERY '{other}': expected 'email' or 'response'"
                ));
            }
        };

        let max_upload_size: usize = env_or("STOCKROOM_MAX_UPLOAD_SIZE", "10485760")
            .parse()
            .map_err(|e| format!("Invalid STOCKROOM_MAX_UPLOAD_SIZE: {e}"))?;

        let import_default_branch_id: i64 = env_or("STOCKROOM_IMPORT_DEFAULT_BRANCH_ID", "1")
            .parse()
            .map_err(|e| format!("Invalid STOCKROOM_IMPORT_DEFAULT_BRANCH_ID: {e}"))?;

        let trusted_proxies: Vec<IpNet> = env_or("STOCKROOM_TRUSTED_PROXIES", "")
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| {
                s.trim()
                    .parse()
                    .map_err(|e| format!("Invalid STOCKROOM_TRUSTED_PROXIES entry '{s}': {e}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let log_level = env_or("STOCKROOM_LOG_LEVEL", "info");

        let smtp = match (
            std::env::var("STOCKROOM_SMTP_HOST").ok(),
            std::env::var("STOCKROOM_SMTP_PORT").ok(),
            std::env::var("STOCKROOM_SMTP_USER").ok(),
            std::env::var("STOCKROOM_SMTP_PASS").ok(),
            std::env::var("STOCKROOM_SMTP_FROM").ok(),
        ) {
            (Some(host), Some(port), Some(user), Some(pass), Some(from)) => Some(SmtpConfig {
                host,
                port: port
                    .parse()
                    .map_err(|e| format!("Invalid STOCKROOM_SMTP_PORT: {e}"))?,
                user,
                pass,
                from,
            }),
            _ => None,
        };

        Ok(Config {
            database_url,
            jwt_secret,
            jwt_algorithm,
            token_ttl_minutes,
            token_refresh_grace_minutes,
            host,
            port,
            registration,
            recovery_delivery,
            max_upload_size,
            import_default_branch_id,
            trusted_proxies,
            log_level,
            smtp,
        })
    }
}

/// Only the HMAC family is accepted: the signing key is a shared secret.
pub fn parse_algorithm(name: &str) -> Result<Algorithm, String> {
    match name.trim().to_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(format!("Unsupported JWT_ALGORITHM '{other}': expected HS256, HS384 or HS512")),
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
