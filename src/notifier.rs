//! Emails finished posters through the Brevo transactional API.

use serde::Serialize;
use tracing::{debug, error, info};

use crate::config::EmailConfig;
use crate::constants::{EMAIL_SENDER_NAME, EMAIL_SUBJECT};
use crate::error::RosterError;

const TEXT_CONTENT: &str = "Hi! Here is your epic Cloud9 poster. We hope you like it!";

const HTML_CONTENT: &str = "<html><body>\
<h1>Your Roster Moment is here!</h1>\
<p>Hi! Here is your epic Cloud9 poster, it is attached to this email.</p>\
<p>We hope you like it!</p>\
</body></html>";

#[derive(Debug, Serialize)]
struct Address<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct Attachment<'a> {
    name: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailRequest<'a> {
    sender: Address<'a>,
    to: [Address<'a>; 1],
    subject: &'a str,
    text_content: &'a str,
    html_content: &'a str,
    attachment: [Attachment<'a>; 1],
}

/// Sends poster emails.
#[derive(Clone, Debug)]
pub struct Notifier {
    http: reqwest::Client,
    config: EmailConfig,
}

impl Notifier {
    /// New notifier sharing `http`'s connection pool.
    pub fn new(http: reqwest::Client, config: EmailConfig) -> Self {
        Self { http, config }
    }

    /// Sends the poster as an attachment. Failures are logged and reported as `false`.
    pub async fn send(&self, to_email: &str, image_base64: &str, attachment_name: &str) -> bool {
        match self.try_send(to_email, image_base64, attachment_name).await {
            Ok(message_id) => {
                info!("Email sent to {to_email}: {message_id}");
                true
            }
            Err(err) => {
                error!("Failed to send email to {to_email}: {err}");
                false
            }
        }
    }

    async fn try_send(
        &self,
        to_email: &str,
        image_base64: &str,
        attachment_name: &str,
    ) -> Result<String, RosterError> {
        let (Some(api_key), Some(sender)) =
            (self.config.api_key.as_deref(), self.config.from.as_deref())
        else {
            return Err(RosterError::Configuration(
                "email API key or EMAIL_FROM not configured".to_string(),
            ));
        };
        debug!("Sending {attachment_name} to {to_email} via {}", self.config.api_url);

        let body = SendEmailRequest {
            sender: Address {
                name: Some(EMAIL_SENDER_NAME),
                email: sender,
            },
            to: [Address {
                name: None,
                email: to_email,
            }],
            subject: EMAIL_SUBJECT,
            text_content: TEXT_CONTENT,
            html_content: HTML_CONTENT,
            attachment: [Attachment {
                name: attachment_name,
                content: image_base64,
            }],
        };

        let url = self.config.api_url.join("v3/smtp/email")?;
        let resp = self
            .http
            .post(url)
            .header("api-key", api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(RosterError::Upstream(format!(
                "email API error {status}: {text}"
            )));
        }
        let message_id = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|value| {
                value
                    .get("messageId")
                    .and_then(|id| id.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "accepted".to_string());
        Ok(message_id)
    }
}
