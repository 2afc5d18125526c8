//! Environment configuration
//!
//! Secrets come from the environment (or a `.env` file) and nothing else:
//! the loader fails closed when a required value is missing. There are no
//! embedded fallback credentials anywhere in this binary.

use anyhow::{bail, Result};

const DEFAULT_SUBJECT: &str = "Your Attendance Certificate";
const DEFAULT_BODY: &str =
    "Dear {first_name},\n\nThank you for attending.\nYour certificate is attached.";

/// Validated delivery configuration
#[derive(Clone)]
pub struct Config {
    pub sendgrid_api_key: String,
    pub from_email: String,
    pub subject: String,
    pub body: String,
}

impl Config {
    /// Load and validate configuration before any row is processed.
    ///
    /// `SENDGRID_API_KEY` and `FROM_EMAIL` are required; subject and body
    /// templates are optional with sensible defaults. Both templates
    /// support a `{first_name}` substitution token.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let Ok(sendgrid_api_key) = std::env::var("SENDGRID_API_KEY") else {
            bail!("SENDGRID_API_KEY must be set (or use --dry-run)");
        };
        if sendgrid_api_key.trim().is_empty() {
            bail!("SENDGRID_API_KEY is empty");
        }

        let Ok(from_email) = std::env::var("FROM_EMAIL") else {
            bail!("FROM_EMAIL must be set to a verified sender address");
        };
        if !certify::validate::is_valid_email(&from_email) {
            bail!("FROM_EMAIL does not look like an email address: {from_email}");
        }

        let subject =
            std::env::var("EMAIL_SUBJECT").unwrap_or_else(|_| DEFAULT_SUBJECT.to_string());
        let body = std::env::var("EMAIL_BODY").unwrap_or_else(|_| DEFAULT_BODY.to_string());

        Ok(Self {
            sendgrid_api_key,
            from_email,
            subject,
            body,
        })
    }

    /// Placeholder settings for dry runs, which never contact a transport
    pub fn dry_run() -> Self {
        Self {
            sendgrid_api_key: String::new(),
            from_email: "dry-run@localhost".to_string(),
            subject: DEFAULT_SUBJECT.to_string(),
            body: DEFAULT_BODY.to_string(),
        }
    }
}
