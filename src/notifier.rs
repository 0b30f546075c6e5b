//! Expiry notices: message composition and delivery.
//!
//! [`SmtpNotifier`] sends through `lettre`'s async SMTP transport. Every notice
//! goes to one fixed recipient taken from configuration, not to the client.
//! When SMTP is not configured, [`LogNotifier`] records what would have been
//! sent.

use std::fmt;

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use log::{info, warn};

use crate::config::MailConfig;
use crate::models::Client;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email build error: {0}")]
    Build(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Domain,
    Hosting,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceKind::Domain => f.write_str("domain"),
            ServiceKind::Hosting => f.write_str("hosting"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryNotice {
    pub subject: String,
    pub body: String,
}

pub fn compose_notice(client: &Client, service: ServiceKind) -> ExpiryNotice {
    let name = match service {
        ServiceKind::Domain => &client.domain.name,
        ServiceKind::Hosting => &client.hosting.name,
    };
    ExpiryNotice {
        subject: format!("Your {service} will expire soon!"),
        body: format!(
            "Your {name} {service} will expire soon. Please renew it as soon as possible."
        ),
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_expiry(&self, client: &Client, service: ServiceKind) -> Result<(), NotifyError>;
}

pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpNotifier {
    pub fn new(config: &MailConfig) -> Result<Self, NotifyError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();
        Ok(Self {
            transport,
            from: config.from_address.parse()?,
            to: config.recipient.parse()?,
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify_expiry(&self, client: &Client, service: ServiceKind) -> Result<(), NotifyError> {
        let notice = compose_notice(client, service);
        let email = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(notice.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(notice.body)
            .map_err(|e| NotifyError::Build(e.to_string()))?;

        self.transport.send(email).await?;
        info!(
            "Expiration email for {} ({}) sent to {} for {}.",
            client.client_details.name, client.client_details.email, self.to, service
        );
        Ok(())
    }
}

pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_expiry(&self, client: &Client, service: ServiceKind) -> Result<(), NotifyError> {
        let notice = compose_notice(client, service);
        warn!(
            "Mail is not configured; not sending \"{}\" for client {}: {}",
            notice.subject, client.id, notice.body
        );
        Ok(())
    }
}
