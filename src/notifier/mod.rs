use crate::configuration::NotifierSettings;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

mod sendgrid;

pub use sendgrid::SendGridNotifier;

/// Everything needed to tell a user that a tracked price reached their target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceAlertNotice {
    pub recipient: String,
    pub product_name: String,
    pub current_price: Decimal,
    pub target_price: Decimal,
    pub currency: String,
    pub product_url: String,
}

impl PriceAlertNotice {
    pub fn subject(&self) -> String {
        format!("Price Alert: {} price has dropped!", self.product_name)
    }
}

pub fn format_money(amount: Decimal, currency: &str) -> String {
    format!("{currency} {:.2}", amount.round_dp(2))
}

/// Delivery channel for price alerts.
/// `false` means the notice was not delivered; callers only log it.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notice: &PriceAlertNotice) -> bool;
}

#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notice: &PriceAlertNotice) -> bool {
        info!(
            recipient = %notice.recipient,
            product = %notice.product_name,
            current_price = %notice.current_price,
            target_price = %notice.target_price,
            "price alert triggered"
        );
        true
    }
}

/// SendGrid when a key is configured, plain logging otherwise.
pub fn from_settings(settings: &NotifierSettings) -> Result<Arc<dyn Notifier>, reqwest::Error> {
    match settings.sendgrid_api_key.as_deref().filter(|key| !key.trim().is_empty()) {
        Some(api_key) => Ok(Arc::new(SendGridNotifier::new(
            api_key,
            &settings.from_email,
            settings.timeout(),
        )?)),
        None => {
            info!("no sendgrid api key, price alerts will only be logged");
            Ok(Arc::new(LogNotifier))
        }
    }
}
