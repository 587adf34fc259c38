use askama::Template;

use crate::auth::recovery::RECOVERY_CODE_TTL_MINUTES;

pub const RECOVERY_SUBJECT: &str = "Password recovery code - Stockroom";

#[derive(Template)]
#[template(path = "email/recovery_code.html")]
struct RecoveryCodeHtml<'a> {
    name: &'a str,
    code: &'a str,
    ttl_minutes: i64,
}

#[derive(Template)]
#[template(path = "email/recovery_code.txt")]
struct RecoveryCodeText<'a> {
    name: &'a str,
    code: &'a str,
    ttl_minutes: i64,
}

/// A rendered message with both a plain-text and an HTML body.
pub struct Rendered {
    pub text: String,
    pub html: String,
}

pub fn render_recovery_code(name: &str, code: &str) -> Result<Rendered, String> {
    let ttl_minutes = RECOVERY_CODE_TTL_MINUTES;
    let text = RecoveryCodeText { name, code, ttl_minutes }
        .render()
        .map_err(|e| format!("Failed to render recovery email: {e}"))?;
    let html = RecoveryCodeHtml { name, code, ttl_minutes }
        .render()
        .map_err(|e| format!("Failed to render recovery email: {e}"))?;
    Ok(Rendered { text, html })
}
