//! HTTP mail API client.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{NotifyError, NotifyResult};

/// Configuration for the mailer.
#[derive(Debug, Clone)]
pub struct MailerConfig {
    /// Mail API endpoint (messages are POSTed here as JSON)
    pub api_url: String,
    /// Bearer token for the mail API
    pub api_key: String,
    /// Sender address
    pub from_address: String,
    /// Request timeout
    pub timeout: Duration,
}

impl MailerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> NotifyResult<Self> {
        Ok(Self {
            api_url: std::env::var("MAIL_API_URL")
                .map_err(|_| NotifyError::config_error("MAIL_API_URL not set"))?,
            api_key: std::env::var("MAIL_API_KEY")
                .map_err(|_| NotifyError::config_error("MAIL_API_KEY not set"))?,
            from_address: std::env::var("MAIL_FROM")
                .unwrap_or_else(|_| "QuoteReel <no-reply@quotereel.app>".to_string()),
            timeout: Duration::from_secs(
                std::env::var("MAIL_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
        })
    }
}

#[derive(Serialize)]
struct MailMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

/// Client for the transactional mail API.
#[derive(Clone)]
pub struct Mailer {
    http: Client,
    config: MailerConfig,
}

impl Mailer {
    /// Create a new mailer.
    pub fn new(config: MailerConfig) -> NotifyResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(NotifyError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> NotifyResult<Self> {
        Self::new(MailerConfig::from_env()?)
    }

    /// Send one message. Failures surface as errors; callers decide
    /// whether delivery matters for their outcome.
    pub async fn send(&self, to: &str, subject: &str, html: &str) -> NotifyResult<()> {
        debug!(to, subject, "Sending email");

        let message = MailMessage {
            from: &self.config.from_address,
            to,
            subject,
            html,
        };

        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&message)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Api { status, body });
        }

        info!(to, "Email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(url: String) -> MailerConfig {
        MailerConfig {
            api_url: url,
            api_key: "test-key".to_string(),
            from_address: "QuoteReel <no-reply@quotereel.app>".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn sends_expected_payload() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "to": "jane@example.com",
                "subject": "Your Video is Ready!",
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mailer = Mailer::new(config(format!("{}/messages", server.uri()))).unwrap();
        mailer
            .send(
                "jane@example.com",
                "Your Video is Ready!",
                "<p>Ready.</p>",
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn api_rejection_surfaces_as_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string("bad address"))
            .mount(&server)
            .await;

        let mailer = Mailer::new(config(server.uri())).unwrap();
        let err = mailer
            .send("not-an-address", "subject", "<p>body</p>")
            .await
            .unwrap_err();

        match err {
            NotifyError::Api { status, body } => {
                assert_eq!(status, 422);
                assert_eq!(body, "bad address");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
