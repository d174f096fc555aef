use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
};

use std::time::Duration;

use crate::config::Config;

const IMPLICIT_TLS_PORT: u16 = 465;

#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("Invalid email address format: {0}")]
    AddressFormat(#[from] lettre::address::AddressError),

    #[error("Failed to build email message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("SMTP transport error: {0}")]
    SmtpTransport(#[from] lettre::transport::smtp::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailerError>;
}

/// Delivers through the configured relay, one SMTP session per message.
pub struct SmtpMailer {
    host: String,
    port: u16,
    username: String,
    password: String,
    timeout: Option<Duration>,
}

impl SmtpMailer {
    pub fn new(config: &Config) -> Self {
        Self {
            host: config.smtp_host.clone(),
            port: config.smtp_port,
            username: config.smtp_user.clone(),
            password: config.smtp_pass.clone(),
            timeout: config.smtp_timeout,
        }
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, MailerError> {
        let mut builder = if self.port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.host)?
        } else {
            let tls = TlsParameters::new(self.host.clone())?;
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.host)
                .tls(Tls::Opportunistic(tls))
        };

        builder = builder.port(self.port);

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(Some(timeout));
        }

        // The user is always the sender address; an empty password means the
        // relay accepts submission without AUTH
        if !self.password.is_empty() {
            builder = builder.credentials(Credentials::new(
                self.username.clone(),
                self.password.clone(),
            ));
        }

        Ok(builder.build())
    }
}

fn build_message(email: OutgoingEmail) -> Result<Message, MailerError> {
    let message = Message::builder()
        .from(email.from.parse()?)
        .to(email.to.parse()?)
        .subject(email.subject)
        .header(ContentType::TEXT_PLAIN)
        .body(email.body)?;
    Ok(message)
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailerError> {
        let recipient = email.to.clone();
        let message = build_message(email)?;
        let mailer = self.transport()?;

        tracing::debug!("Opening SMTP session to {}:{}", self.host, self.port);
        mailer.send(message).await?;

        tracing::info!("Message to {} accepted by relay", recipient);
        Ok(())
    }
}
