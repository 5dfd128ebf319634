use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::settings::Mail;

#[derive(Clone, Debug, PartialEq)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("Could not build mail: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("SMTP error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    /// Resolves once the relay has accepted or refused the message.
    async fn send(&self, message: &MailMessage) -> Result<(), MailError>;
}

/// Authenticated SMTP relay client (Gmail by default).
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(settings: &Mail) -> Result<Self, MailError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)?
            .credentials(Credentials::new(
                settings.user.clone(),
                settings.password.clone(),
            ));
        if let Some(port) = settings.port {
            builder = builder.port(port);
        }

        Ok(Self {
            transport: builder.build(),
        })
    }

    #[cfg(test)]
    fn plaintext(host: &str, port: u16) -> Self {
        Self {
            transport: AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
                .port(port)
                .build(),
        }
    }
}

fn build_message(message: &MailMessage) -> Result<Message, MailError> {
    let email = Message::builder()
        .from(message.from.parse::<Mailbox>()?)
        .to(message.to.parse::<Mailbox>()?)
        .subject(message.subject.as_str())
        .header(ContentType::TEXT_PLAIN)
        .body(message.text.clone())?;

    Ok(email)
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        let email = build_message(message)?;
        let response = self.transport.send(email).await?;

        log::info!("Mail accepted by relay ({}).", response.code());
        Ok(())
    }
}
