pub mod templates;

use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;

/// Outbound mail for account notices, sent from the configured system address.
pub struct SystemMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SystemMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, String> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| format!("Invalid SMTP from address '{}': {e}", config.from))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| format!("SMTP relay error: {e}"))?
            .port(config.port)
            .credentials(Credentials::new(config.user.clone(), config.pass.clone()))
            .build();

        Ok(Self { transport, from })
    }

    pub async fn send_recovery_code(
        &self,
        to_email: &str,
        to_name: &str,
        code: &str,
    ) -> Result<(), String> {
        let to = Mailbox::new(
            Some(to_name.to_string()),
            to_email
                .parse()
                .map_err(|e| format!("Invalid recipient address: {e}"))?,
        );
        let body = templates::render_recovery_code(to_name, code)?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(templates::RECOVERY_SUBJECT)
            .multipart(MultiPart::alternative_plain_html(body.text, body.html))
            .map_err(|e| format!("Failed to build recovery email: {e}"))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| format!("Failed to send recovery email: {e}"))?;

        tracing::debug!(to = to_email, "Recovery email sent");
        Ok(())
    }
}
