use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{error, info, warn};

use super::gateway::{NewIntent, PaymentError, PaymentGateway};
use super::webhook::{WebhookError, WebhookVerifier, PAYMENT_SUCCEEDED};
use crate::accounts::domain::UserId;
use crate::accounts::service::{AccountError, AccountService};
use crate::auth::tokens::{TokenError, TokenIssuer};
use crate::error::ApiError;
use crate::listings::domain::{JobOffer, Listing, SeekerProfile};

pub const PREMIUM_KIND: &str = "premium";

/// What a payment buys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentKind {
    JobOffer,
    SeekerProfile,
    Premium,
}

impl PaymentKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            JobOffer::COLLECTION => Some(Self::JobOffer),
            SeekerProfile::COLLECTION => Some(Self::SeekerProfile),
            PREMIUM_KIND => Some(Self::Premium),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PaymentKind::JobOffer => JobOffer::COLLECTION,
            PaymentKind::SeekerProfile => SeekerProfile::COLLECTION,
            PaymentKind::Premium => PREMIUM_KIND,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntentRequest {
    #[serde(rename = "packageId", default)]
    pub package_id: Option<String>,
    #[serde(rename = "packageName", default)]
    pub package_name: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TempToken {
    Issued(String),
    /// The intent exists but has not been paid; carries its status.
    NotSucceeded(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PaymentServiceError {
    #[error("invalid payment type")]
    InvalidKind,
    #[error("paymentId is required")]
    MissingPaymentId,
    #[error("payment provider error: {0}")]
    Rejected(String),
    #[error(transparent)]
    Gateway(#[from] PaymentError),
    #[error("webhook error: {0}")]
    Webhook(#[from] WebhookError),
    #[error("webhook secret is not configured")]
    WebhookNotConfigured,
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Account(#[from] AccountError),
}

impl From<PaymentServiceError> for ApiError {
    fn from(value: PaymentServiceError) -> Self {
        match value {
            PaymentServiceError::InvalidKind
            | PaymentServiceError::MissingPaymentId
            | PaymentServiceError::Rejected(_)
            | PaymentServiceError::Webhook(_) => ApiError::bad_request(value.to_string()),
            PaymentServiceError::Account(err) => err.into(),
            PaymentServiceError::Gateway(_)
            | PaymentServiceError::WebhookNotConfigured
            | PaymentServiceError::Token(_) => {
                error!(error = %value, "payment operation failed");
                ApiError::Internal("payment processing failed".to_string())
            }
        }
    }
}

pub struct PaymentService {
    gateway: Arc<dyn PaymentGateway>,
    verifier: Option<WebhookVerifier>,
    tokens: Arc<TokenIssuer>,
    accounts: Arc<AccountService>,
    amount_cents: u64,
    currency: String,
}

impl PaymentService {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        webhook_secret: Option<&str>,
        tokens: Arc<TokenIssuer>,
        accounts: Arc<AccountService>,
        amount_cents: u64,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            verifier: webhook_secret.map(WebhookVerifier::new),
            tokens,
            accounts,
            amount_cents,
            currency: currency.into(),
        }
    }

    /// Creates an intent for the configured price and returns its client secret.
    pub async fn create_intent(
        &self,
        request: IntentRequest,
        caller: Option<UserId>,
    ) -> Result<String, PaymentServiceError> {
        let kind = request
            .kind
            .as_deref()
            .and_then(PaymentKind::parse)
            .ok_or(PaymentServiceError::InvalidKind)?;

        let mut metadata = BTreeMap::new();
        metadata.insert("type".to_string(), kind.label().to_string());
        if let Some(package_id) = request.package_id {
            metadata.insert("packageId".to_string(), package_id);
        }
        if let Some(package_name) = request.package_name {
            metadata.insert("packageName".to_string(), package_name);
        }
        if let Some(user) = caller {
            metadata.insert("userId".to_string(), user.0);
        }

        let intent = self
            .gateway
            .create_intent(NewIntent {
                amount: self.amount_cents,
                currency: self.currency.clone(),
                metadata,
            })
            .await?;
        info!(payment_id = %intent.id, kind = kind.label(), "payment intent created");
        intent
            .client_secret
            .ok_or_else(|| PaymentError::Transport("intent without client secret".to_string()).into())
    }

    /// Exchanges a paid intent for a one-hour publish token.
    pub async fn temp_token(&self, payment_id: Option<&str>) -> Result<TempToken, PaymentServiceError> {
        let payment_id = payment_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(PaymentServiceError::MissingPaymentId)?;

        let intent = match self.gateway.retrieve_intent(payment_id).await {
            Ok(intent) => intent,
            Err(PaymentError::Provider { message, kind }) => {
                warn!(payment_id, ?kind, %message, "payment lookup rejected");
                return Err(PaymentServiceError::Rejected(message));
            }
            Err(other) => return Err(other.into()),
        };

        if !intent.succeeded() {
            info!(payment_id, status = %intent.status, "payment not completed");
            return Ok(TempToken::NotSucceeded(intent.status));
        }
        let token = self.tokens.issue_publish(&intent.id, intent.metadata)?;
        Ok(TempToken::Issued(token))
    }

    /// Verifies and applies a provider event. Only successful payments for
    /// premium features change state.
    pub async fn handle_webhook(
        &self,
        payload: &[u8],
        signature: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), PaymentServiceError> {
        let verifier = self
            .verifier
            .as_ref()
            .ok_or(PaymentServiceError::WebhookNotConfigured)?;
        let event = verifier.event(payload, signature, now.timestamp())?;
        if event.kind != PAYMENT_SUCCEEDED {
            info!(event_id = %event.id, kind = %event.kind, "webhook event ignored");
            return Ok(());
        }
        let Some(intent) = event.payment_intent() else {
            warn!(event_id = %event.id, "payment event without intent");
            return Ok(());
        };
        info!(
            payment_id = %intent.id,
            amount = intent.amount,
            kind = intent.metadata.get("type").map(String::as_str).unwrap_or("unknown"),
            "payment succeeded"
        );

        let premium = intent.metadata.get("type").map(String::as_str) == Some(PREMIUM_KIND);
        let user = intent
            .metadata
            .get("userId")
            .filter(|id| !id.is_empty())
            .map(|id| UserId(id.clone()));
        if let (true, Some(user)) = (premium, user) {
            match self.accounts.grant_premium(&user, None, None).await {
                Ok(_) => {}
                Err(AccountError::UserNotFound) => {
                    warn!(user_id = %user, "premium paid for unknown user")
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }
}
