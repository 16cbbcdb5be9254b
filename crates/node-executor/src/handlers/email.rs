use crate::handlers::{credential_data, require_str};
use crate::NodeHandler;
use async_trait::async_trait;
use common::error::NodeExecutorError;
use common::types::{Credential, JsonValue};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials as SmtpCredentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::collections::HashMap;

const EMAIL_PLATFORM: &str = "email";

/// Sends a plaintext email through the credential-supplied SMTP server.
///
/// Port 465 implies implicit TLS; any other configured port negotiates
/// STARTTLS, matching how mail providers commonly split the two.
pub struct EmailHandler {
    smtp_port: u16,
}

impl EmailHandler {
    pub fn new(smtp_port: u16) -> Self {
        Self { smtp_port }
    }

    fn transport(
        &self,
        smtp_server: &str,
        sender_email: &str,
        sender_password: &str,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, NodeExecutorError> {
        let creds = SmtpCredentials::new(sender_email.to_string(), sender_password.to_string());
        let builder = if self.smtp_port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(smtp_server)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(smtp_server)
        }
        .map_err(|e| NodeExecutorError::HandlerFailed("email".to_string(), e.to_string()))?;

        Ok(builder.port(self.smtp_port).credentials(creds).build())
    }
}

#[async_trait]
impl NodeHandler for EmailHandler {
    async fn run(
        &self,
        inputs: &JsonValue,
        credentials: &HashMap<String, Credential>,
    ) -> Result<JsonValue, NodeExecutorError> {
        let receiver_email = require_str(inputs, "receiver_email", "email")?;
        let subject = require_str(inputs, "subject", "email")?;
        let message_body = require_str(inputs, "message", "email")?;

        let cred_data = credential_data(credentials, EMAIL_PLATFORM)?;
        let sender_email = require_str(cred_data, "sender_email", "email")?;
        let sender_password = require_str(cred_data, "sender_password", "email")?;
        let smtp_server = require_str(cred_data, "smtp_server", "email")?;

        let from: Mailbox = sender_email
            .parse()
            .map_err(|e: lettre::address::AddressError| {
                NodeExecutorError::HandlerFailed("email".to_string(), e.to_string())
            })?;
        let to: Mailbox = receiver_email
            .parse()
            .map_err(|e: lettre::address::AddressError| {
                NodeExecutorError::HandlerFailed("email".to_string(), e.to_string())
            })?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .body(message_body.to_string())
            .map_err(|e| NodeExecutorError::HandlerFailed("email".to_string(), e.to_string()))?;

        let mailer = self.transport(smtp_server, sender_email, sender_password)?;
        mailer
            .send(email)
            .await
            .map_err(|e| NodeExecutorError::HandlerFailed("email".to_string(), e.to_string()))?;

        Ok(serde_json::json!({"status": "sent"}))
    }
}
