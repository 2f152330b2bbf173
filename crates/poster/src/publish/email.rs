//! Email delivery over SMTP.

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::fmt;

use crate::config::SmtpConfig;
use crate::error::{DeliveryError, DeliveryErrorKind};
use crate::request::DeliveryMethod;

/// A fully composed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

/// SMTP login for one request.
#[derive(Clone, PartialEq, Eq)]
pub struct SmtpCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for SmtpCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpCredentials")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

/// Sends composed email.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(
        &self,
        email: &OutgoingEmail,
        credentials: &SmtpCredentials,
    ) -> Result<(), DeliveryError>;
}

/// Mailer using an SMTP relay with STARTTLS.
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    #[must_use]
    pub const fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn build_message(email: &OutgoingEmail) -> Result<Message, DeliveryError> {
        let from: Mailbox = email
            .from
            .parse()
            .map_err(|e| malformed(format!("invalid from address: {e}")))?;
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| malformed(format!("invalid to address: {e}")))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(email.subject.as_str())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email.text_body.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email.html_body.clone()),
                    ),
            )
            .map_err(|e| malformed(format!("failed to build email message: {e}")))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(
        &self,
        email: &OutgoingEmail,
        credentials: &SmtpCredentials,
    ) -> Result<(), DeliveryError> {
        let message = Self::build_message(email)?;

        let creds = Credentials::new(credentials.username.clone(), credentials.password.clone());

        let mailer: AsyncSmtpTransport<Tokio1Executor> =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)
                .map_err(|e| classify(&e))?
                .port(self.config.port)
                .timeout(Some(self.config.timeout))
                .credentials(creds)
                .build();

        mailer.send(message).await.map_err(|e| classify(&e))?;

        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            "Email sent successfully"
        );

        Ok(())
    }
}

fn malformed(message: String) -> DeliveryError {
    DeliveryError::new(DeliveryMethod::Email, DeliveryErrorKind::MalformedPayload, message)
}

/// Map an SMTP failure onto a delivery error.
fn classify(err: &lettre::transport::smtp::Error) -> DeliveryError {
    let code = err
        .status()
        .and_then(|code| code.to_string().parse::<u16>().ok());

    let kind = code.map_or(DeliveryErrorKind::Provider, classify_reply_code);

    tracing::warn!(code = ?code, kind = %kind, error = %err, "SMTP delivery failed");
    DeliveryError::new(DeliveryMethod::Email, kind, err.to_string())
}

/// Classify an SMTP reply code.
#[must_use]
pub fn classify_reply_code(code: u16) -> DeliveryErrorKind {
    match code {
        530 | 534 | 535 => DeliveryErrorKind::Auth,
        421 | 450 | 451 | 452 => DeliveryErrorKind::RateLimited,
        500..=599 => DeliveryErrorKind::MalformedPayload,
        _ => DeliveryErrorKind::Provider,
    }
}
