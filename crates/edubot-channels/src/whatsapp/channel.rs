//! Outbound delivery and webhook verification for the WhatsApp channel.

use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Serialize;
use sha2::Sha256;

use edubot_types::config::WhatsAppConfig;
use edubot_types::errors::BotError;
use edubot_types::{ChannelAdapter, OutboundMessage};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying Meta's payload signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

const SIGNATURE_PREFIX: &str = "sha256=";

/// Request body for `POST /{phone_number_id}/messages`.
#[derive(Debug, Serialize)]
struct SendTextRequest<'a> {
    messaging_product: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    message_type: &'static str,
    text: TextPayload<'a>,
}

#[derive(Debug, Serialize)]
struct TextPayload<'a> {
    body: &'a str,
}

/// WhatsApp Business Cloud API adapter.
pub struct WhatsAppChannel {
    client: Client,
    config: WhatsAppConfig,
}

impl std::fmt::Debug for WhatsAppChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhatsAppChannel")
            .field("phone_number_id", &self.config.phone_number_id)
            .field("api_version", &self.config.api_version)
            .field("has_token", &self.config.access_token.is_some())
            .finish()
    }
}

impl WhatsAppChannel {
    /// Create an adapter. Missing credentials are allowed; sends will fail
    /// with a channel error until they are configured.
    pub fn new(config: WhatsAppConfig) -> Result<Self, BotError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| BotError::Channel(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &WhatsAppConfig {
        &self.config
    }

    /// Whether outbound sends have the credentials they need.
    pub fn can_send(&self) -> bool {
        self.config.access_token.is_some() && self.config.phone_number_id.is_some()
    }

    /// Answer Meta's subscription handshake.
    ///
    /// Returns the challenge only for mode `subscribe` with the configured
    /// verify token. An unset verify token never matches.
    pub fn verify_subscription(&self, mode: &str, token: &str, challenge: &str) -> Option<String> {
        let expected = self.config.verify_token.as_deref()?;
        if mode == "subscribe" && token == expected {
            tracing::info!("webhook subscription verified");
            Some(challenge.to_string())
        } else {
            tracing::warn!(mode = %mode, "webhook subscription verification failed");
            None
        }
    }

    /// Check the `X-Hub-Signature-256` header against the raw request body.
    ///
    /// When no app secret is configured (or it is still the sample
    /// placeholder) verification is skipped.
    pub fn verify_signature(&self, body: &[u8], header: Option<&str>) -> Result<(), BotError> {
        let Some(secret) = self.config.effective_app_secret() else {
            tracing::warn!("app secret not configured, skipping signature verification");
            return Ok(());
        };
        verify_hmac(secret.as_bytes(), body, header)
    }

    fn messages_url(&self) -> Result<String, BotError> {
        let phone_number_id = self
            .config
            .phone_number_id
            .as_deref()
            .ok_or_else(|| BotError::Channel("PHONE_NUMBER_ID not configured".to_string()))?;
        Ok(format!(
            "{}/{}/{}/messages",
            self.config.graph_base_url.trim_end_matches('/'),
            self.config.api_version,
            phone_number_id
        ))
    }
}

/// Constant-time comparison of `sha256=<hex>` against HMAC-SHA256(secret, body).
fn verify_hmac(secret: &[u8], body: &[u8], header: Option<&str>) -> Result<(), BotError> {
    let header = header.ok_or_else(|| BotError::Signature("missing signature header".to_string()))?;
    let hex_digest = header.strip_prefix(SIGNATURE_PREFIX).unwrap_or(header);
    let received = hex::decode(hex_digest.trim())
        .map_err(|_| BotError::Signature("signature is not valid hex".to_string()))?;

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| BotError::Signature(format!("invalid app secret: {e}")))?;
    mac.update(body);
    mac.verify_slice(&received)
        .map_err(|_| BotError::Signature("signature mismatch".to_string()))
}

#[async_trait]
impl ChannelAdapter for WhatsAppChannel {
    async fn send_message(&self, message: OutboundMessage) -> Result<(), BotError> {
        let token = self
            .config
            .access_token
            .as_deref()
            .ok_or_else(|| BotError::Channel("WHATSAPP_TOKEN not configured".to_string()))?;
        let url = self.messages_url()?;

        let request = SendTextRequest {
            messaging_product: "whatsapp",
            to: &message.recipient,
            message_type: "text",
            text: TextPayload {
                body: &message.text,
            },
        };

        tracing::debug!(url = %url, to = %message.recipient, "sending WhatsApp message");
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(|e| BotError::Channel(format!("WhatsApp HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "WhatsApp send failed");
            return Err(BotError::Channel(format!(
                "WhatsApp API error (HTTP {status}): {body}"
            )));
        }

        tracing::info!(to = %message.recipient, "message sent");
        Ok(())
    }
}
