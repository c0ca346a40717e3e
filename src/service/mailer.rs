use crate::config::SmtpConfig;
use crate::error::AppError;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    /// Overrides the mailer's configured sender.
    pub from: Option<Mailbox>,
    pub to: Address,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), AppError>;
}

/// Parse and check a recipient address.
pub fn parse_recipient(raw: &str) -> Result<Address, AppError> {
    raw.trim()
        .parse::<Address>()
        .map_err(|e| AppError::validation(format!("Invalid recipient '{}': {e}", raw.trim())))
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(cfg: &SmtpConfig) -> Result<Self, AppError> {
        let from_address = cfg
            .from_address
            .parse::<Address>()
            .map_err(|e| AppError::Mail(format!("invalid from_address: {e}")))?;
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.host)
            .map_err(|e| AppError::Mail(e.to_string()))?
            .port(cfg.port);
        if !cfg.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                cfg.username.clone(),
                cfg.password.clone(),
            ));
        }
        Ok(Self {
            transport: builder.build(),
            from: Mailbox::new(Some(cfg.from_name.clone()), from_address),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), AppError> {
        let message = Message::builder()
            .from(email.from.clone().unwrap_or_else(|| self.from.clone()))
            .to(Mailbox::new(None, email.to.clone()))
            .subject(email.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(email.body.clone())
            .map_err(|e| AppError::Mail(e.to_string()))?;
        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| AppError::Mail(e.to_string()))?;
        info!(to = %email.to, code = %response.code(), "email relayed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipient_validation() {
        assert!(parse_recipient(" owner@acme.test ").is_ok());
        assert!(matches!(
            parse_recipient("not-an-address"),
            Err(AppError::Validation(_))
        ));
    }
}
