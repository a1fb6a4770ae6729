use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::debug;

use super::gateway::{NewIntent, PaymentError, PaymentGateway, PaymentIntent};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Payment intents through the Stripe REST API.
pub struct StripeClient {
    http: Client,
    api_base: String,
    secret_key: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

impl StripeClient {
    pub fn new(secret_key: &str, api_base: &str) -> Result<Self, PaymentError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| PaymentError::Transport(err.to_string()))?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
        })
    }

    async fn decode(response: Response) -> Result<PaymentIntent, PaymentError> {
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| PaymentError::Transport(err.to_string()))?;
        if status.is_success() {
            return serde_json::from_slice(&body)
                .map_err(|err| PaymentError::Transport(format!("unexpected response: {err}")));
        }
        let (message, kind) = match serde_json::from_slice::<ErrorEnvelope>(&body) {
            Ok(envelope) => (
                envelope
                    .error
                    .message
                    .unwrap_or_else(|| format!("request failed with {status}")),
                envelope.error.kind,
            ),
            Err(_) => (format!("request failed with {status}"), None),
        };
        Err(PaymentError::Provider { message, kind })
    }
}

fn valid_intent_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn create_intent(&self, intent: NewIntent) -> Result<PaymentIntent, PaymentError> {
        let mut form = vec![
            ("amount".to_string(), intent.amount.to_string()),
            ("currency".to_string(), intent.currency),
            (
                "automatic_payment_methods[enabled]".to_string(),
                "true".to_string(),
            ),
        ];
        form.extend(
            intent
                .metadata
                .into_iter()
                .map(|(key, value)| (format!("metadata[{key}]"), value)),
        );

        let response = self
            .http
            .post(format!("{}/v1/payment_intents", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|err| PaymentError::Transport(err.to_string()))?;
        let created = Self::decode(response).await?;
        debug!(payment_id = %created.id, "payment intent created");
        Ok(created)
    }

    async fn retrieve_intent(&self, id: &str) -> Result<PaymentIntent, PaymentError> {
        if !valid_intent_id(id) {
            return Err(PaymentError::Provider {
                message: format!("invalid payment intent id '{id}'"),
                kind: Some("invalid_request_error".to_string()),
            });
        }
        let response = self
            .http
            .get(format!("{}/v1/payment_intents/{id}", self.api_base))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|err| PaymentError::Transport(err.to_string()))?;
        Self::decode(response).await
    }
}
