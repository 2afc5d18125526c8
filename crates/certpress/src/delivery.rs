//! Delivery collaborators: SendGrid HTTP API and a dry-run stand-in

use base64::Engine;
use certify::{Delivery, DeliveryError, OutgoingMail};
use tracing::{debug, info};

const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// Sends mail through the SendGrid v3 `mail/send` endpoint with the
/// certificate attached as base64.
pub struct SendGridDelivery {
    client: reqwest::blocking::Client,
    api_key: String,
}

impl SendGridDelivery {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            api_key,
        }
    }
}

impl Delivery for SendGridDelivery {
    fn send(&mut self, mail: &OutgoingMail<'_>) -> Result<u16, DeliveryError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(mail.attachment);

        let payload = serde_json::json!({
            "personalizations": [{ "to": [{ "email": mail.to }] }],
            "from": { "email": mail.from },
            "subject": mail.subject,
            "content": [{ "type": "text/html", "value": mail.html_body }],
            "attachments": [{
                "content": encoded,
                "filename": mail.attachment_name,
                "type": "application/pdf",
                "disposition": "attachment",
            }],
        });

        let response = self
            .client
            .post(SENDGRID_SEND_URL)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .map_err(|e| DeliveryError(format!("request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            debug!(to = mail.to, status = status.as_u16(), "sendgrid accepted");
            Ok(status.as_u16())
        } else {
            let body = response.text().unwrap_or_default();
            Err(DeliveryError(format!(
                "sendgrid returned {}: {}",
                status.as_u16(),
                body.trim()
            )))
        }
    }
}

/// Renders and writes artifacts without contacting any transport
pub struct DryRunDelivery;

impl Delivery for DryRunDelivery {
    fn send(&mut self, mail: &OutgoingMail<'_>) -> Result<u16, DeliveryError> {
        info!(
            to = mail.to,
            attachment = mail.attachment_name,
            "dry run: skipping delivery"
        );
        Ok(202)
    }
}
