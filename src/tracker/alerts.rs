use crate::db::{Database, PriceAlert, Product};
use crate::errors::AppErrors;
use crate::notifier::{Notifier, PriceAlertNotice};
use rust_decimal::Decimal;
use tracing::{debug, warn};

/// Active alerts whose target the current price has reached.
pub fn triggered_alerts(alerts: &[PriceAlert], current_price: Decimal) -> Vec<&PriceAlert> {
    alerts
        .iter()
        .filter(|alert| alert.active && current_price <= alert.target_price)
        .collect()
}

/// Notifies the owner once per triggered alert and returns how many fired.
/// Delivery failures are logged, never returned.
pub async fn evaluate_alerts(
    db: &Database,
    notifier: &dyn Notifier,
    product: &Product,
) -> Result<usize, AppErrors> {
    if product.current_price <= Decimal::ZERO {
        debug!(product_id = product.id, "no usable price, skipping alerts");
        return Ok(0);
    }
    let alerts = db.alerts_by_product(product.id).await?;
    let triggered = triggered_alerts(&alerts, product.current_price);
    if triggered.is_empty() {
        return Ok(0);
    }
    let owner = db.get_user(product.user_id).await?;
    for alert in &triggered {
        let notice = PriceAlertNotice {
            recipient: owner.email.clone(),
            product_name: product.name.clone(),
            current_price: product.current_price,
            target_price: alert.target_price,
            currency: product.currency.clone(),
            product_url: product.url.clone(),
        };
        if !notifier.send(&notice).await {
            warn!(alert_id = alert.id, product_id = product.id, "price alert was not delivered");
        }
    }
    Ok(triggered.len())
}
