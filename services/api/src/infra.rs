use baujobs::config::{AppConfig, MailConfig, PaymentConfig, StorageBackend, StorageConfig};
use baujobs::context::{AppContext, Backends, Settings};
use baujobs::error::AppError;
use baujobs::mail::{LogMailer, Mailer, SmtpMailer};
use baujobs::payments::{PaymentGateway, StripeClient, UnconfiguredGateway};
use baujobs::storage::{FileStore, LocalStore, S3Store};
use baujobs::store::mongo;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// MongoDB when a URI is configured, otherwise process-local storage.
pub(crate) async fn backends(config: &AppConfig) -> Result<Backends, AppError> {
    match config.database.uri.as_deref() {
        Some(uri) => {
            let db = mongo::connect(uri, &config.database.name).await?;
            Ok(Backends::mongo(&db))
        }
        None => {
            warn!("MONGODB_URI not set; data is kept in memory and lost on restart");
            Ok(Backends::in_memory())
        }
    }
}

pub(crate) fn mailer(config: &MailConfig) -> Result<Arc<dyn Mailer>, AppError> {
    match SmtpMailer::from_config(config)? {
        Some(smtp) => {
            info!(host = ?config.smtp_host, port = config.smtp_port, "SMTP delivery enabled");
            Ok(Arc::new(smtp))
        }
        None => {
            warn!("SMTP_HOST not set; outgoing e-mail is only logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

pub(crate) fn gateway(config: &PaymentConfig) -> Result<Arc<dyn PaymentGateway>, AppError> {
    match config.stripe_secret_key.as_deref() {
        Some(key) => Ok(Arc::new(StripeClient::new(key, &config.api_base)?)),
        None => {
            warn!("STRIPE_SECRET_KEY not set; payment endpoints will fail");
            Ok(Arc::new(UnconfiguredGateway))
        }
    }
}

pub(crate) fn storage(config: &StorageConfig) -> Arc<dyn FileStore> {
    match &config.backend {
        StorageBackend::Local { directory } => {
            Arc::new(LocalStore::new(directory.clone(), &config.public_base_url))
        }
        StorageBackend::S3(s3) => Arc::new(S3Store::new(s3)),
    }
}

pub(crate) async fn context(config: &AppConfig) -> Result<AppContext, AppError> {
    if config.payments.webhook_secret.is_none() {
        warn!("STRIPE_WEBHOOK_SECRET not set; webhooks will be rejected");
    }
    Ok(AppContext::new(
        Settings::from_config(config),
        backends(config).await?,
        mailer(&config.mail)?,
        gateway(&config.payments)?,
        storage(&config.storage),
    ))
}
