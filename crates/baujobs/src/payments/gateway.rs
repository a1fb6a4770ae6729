use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Subset of a provider payment intent the service relies on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub amount: u64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl PaymentIntent {
    pub const SUCCEEDED: &'static str = "succeeded";

    pub fn succeeded(&self) -> bool {
        self.status == Self::SUCCEEDED
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIntent {
    pub amount: u64,
    pub currency: String,
    pub metadata: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// The provider answered with an API error.
    #[error("payment provider error: {message}")]
    Provider {
        message: String,
        kind: Option<String>,
    },
    #[error("payment provider unreachable: {0}")]
    Transport(String),
    #[error("payments are not configured")]
    NotConfigured,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(&self, intent: NewIntent) -> Result<PaymentIntent, PaymentError>;
    async fn retrieve_intent(&self, id: &str) -> Result<PaymentIntent, PaymentError>;
}

/// Stand-in used when no provider key is configured.
#[derive(Debug, Default)]
pub struct UnconfiguredGateway;

#[async_trait]
impl PaymentGateway for UnconfiguredGateway {
    async fn create_intent(&self, _intent: NewIntent) -> Result<PaymentIntent, PaymentError> {
        Err(PaymentError::NotConfigured)
    }

    async fn retrieve_intent(&self, _id: &str) -> Result<PaymentIntent, PaymentError> {
        Err(PaymentError::NotConfigured)
    }
}

/// In-process gateway that keeps intents in a map. Intents start out as
/// `requires_payment_method` and move on through [`MemoryGateway::set_status`].
#[derive(Debug, Default)]
pub struct MemoryGateway {
    intents: Mutex<HashMap<String, PaymentIntent>>,
}

impl MemoryGateway {
    pub fn set_status(&self, id: &str, status: &str) -> Result<(), PaymentError> {
        let mut intents = self.guard()?;
        let intent = intents.get_mut(id).ok_or_else(|| unknown_intent(id))?;
        intent.status = status.to_string();
        Ok(())
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, PaymentIntent>>, PaymentError> {
        self.intents
            .lock()
            .map_err(|_| PaymentError::Transport("gateway state poisoned".to_string()))
    }
}

fn unknown_intent(id: &str) -> PaymentError {
    PaymentError::Provider {
        message: format!("No such payment_intent: '{id}'"),
        kind: Some("invalid_request_error".to_string()),
    }
}

#[async_trait]
impl PaymentGateway for MemoryGateway {
    async fn create_intent(&self, intent: NewIntent) -> Result<PaymentIntent, PaymentError> {
        let mut intents = self.guard()?;
        let id = format!("pi_{:06}", intents.len() + 1);
        let created = PaymentIntent {
            client_secret: Some(format!("{id}_secret")),
            id: id.clone(),
            status: "requires_payment_method".to_string(),
            amount: intent.amount,
            currency: intent.currency,
            metadata: intent.metadata,
        };
        intents.insert(id, created.clone());
        Ok(created)
    }

    async fn retrieve_intent(&self, id: &str) -> Result<PaymentIntent, PaymentError> {
        self.guard()?
            .get(id)
            .cloned()
            .ok_or_else(|| unknown_intent(id))
    }
}
