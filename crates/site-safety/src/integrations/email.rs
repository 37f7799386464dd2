use std::fmt::Debug;

use async_trait::async_trait;
use chrono::Utc;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use mime::Mime;
use tracing::info;
use uuid::Uuid;

use super::AdapterError;
use crate::config::SmtpSettings;
use crate::domain::TenantId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAttachment {
    pub filename: String,
    pub content_type: Mime,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<EmailAttachment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailReceipt {
    pub success: bool,
    pub message_id: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync + Debug {
    async fn send(
        &self,
        tenant: TenantId,
        message: EmailMessage,
    ) -> Result<EmailReceipt, AdapterError>;
}

/// Logs the message and reports success without delivering anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubEmailSender;

#[async_trait]
impl EmailSender for StubEmailSender {
    async fn send(
        &self,
        tenant: TenantId,
        message: EmailMessage,
    ) -> Result<EmailReceipt, AdapterError> {
        info!(
            %tenant,
            to = %message.to.join(", "),
            subject = %message.subject,
            attachments = message.attachments.len(),
            "stub email accepted"
        );
        Ok(EmailReceipt {
            success: true,
            message_id: format!("EMAIL-{}", Utc::now().timestamp_millis()),
        })
    }
}

/// SMTP delivery through lettre's tokio transport.
pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    host: String,
}

impl SmtpEmailSender {
    pub fn from_settings(settings: &SmtpSettings) -> Result<Self, AdapterError> {
        let from: Mailbox = settings
            .from
            .parse()
            .map_err(|err| AdapterError::Configuration(format!("SMTP_FROM: {err}")))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
            .map_err(|err| AdapterError::Configuration(err.to_string()))?
            .port(settings.port);
        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            host: settings.host.clone(),
        })
    }

    fn build_message(&self, message: EmailMessage) -> Result<(Message, String), AdapterError> {
        let domain = self.from.email.domain().to_string();
        let message_id = format!("<{}@{}>", Uuid::new_v4(), domain);

        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(message.subject)
            .message_id(Some(message_id.clone()));
        for recipient in &message.to {
            let mailbox: Mailbox = recipient.parse().map_err(|err| {
                AdapterError::InvalidRequest(format!("recipient '{recipient}': {err}"))
            })?;
            builder = builder.to(mailbox);
        }

        let mut parts = MultiPart::mixed().singlepart(SinglePart::plain(message.body));
        for attachment in message.attachments {
            let content_type = ContentType::parse(attachment.content_type.as_ref())
                .map_err(|err| AdapterError::InvalidRequest(err.to_string()))?;
            parts = parts.singlepart(
                Attachment::new(attachment.filename).body(attachment.content, content_type),
            );
        }

        let email = builder
            .multipart(parts)
            .map_err(|err| AdapterError::InvalidRequest(err.to_string()))?;
        Ok((email, message_id))
    }
}

impl Debug for SmtpEmailSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpEmailSender")
            .field("host", &self.host)
            .field("from", &self.from.to_string())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(
        &self,
        tenant: TenantId,
        message: EmailMessage,
    ) -> Result<EmailReceipt, AdapterError> {
        let recipients = message.to.len();
        let (email, message_id) = self.build_message(message)?;
        let response = self
            .transport
            .send(email)
            .await
            .map_err(|err| AdapterError::Transport(err.to_string()))?;

        info!(%tenant, recipients, code = %response.code(), "email relayed over smtp");
        Ok(EmailReceipt {
            success: response.is_positive(),
            message_id,
        })
    }
}
