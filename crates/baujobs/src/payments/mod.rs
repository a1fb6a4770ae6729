//! Checkout through the payment provider and the paid-publish flow.

pub mod gateway;
pub mod ledger;
pub mod router;
pub mod service;
pub mod stripe;
pub mod webhook;

pub use gateway::{MemoryGateway, PaymentError, PaymentGateway, UnconfiguredGateway};
pub use ledger::GrantLedger;
pub use router::payment_router;
pub use service::{PaymentService, PaymentServiceError};
pub use stripe::StripeClient;
