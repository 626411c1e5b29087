use crate::app_state::AppState;
use crate::db::{storage_price, NewPriceHistory, NewProduct, Product};
use crate::errors::AppErrors;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{error, info, warn};

pub mod alerts;

pub use alerts::{evaluate_alerts, triggered_alerts};

/// One async mutex per product so refreshes of the same product never interleave.
#[derive(Debug, Default)]
pub struct RefreshLocks {
    locks: Mutex<HashMap<u32, Arc<Mutex<()>>>>,
}

impl RefreshLocks {
    pub async fn acquire(&self, product_id: u32) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .lock()
            .await
            .entry(product_id)
            .or_default()
            .clone();
        lock.lock_owned().await
    }

    pub async fn forget(&self, product_id: u32) {
        self.locks.lock().await.remove(&product_id);
    }
}

/// Scraped price at storage scale; out-of-range values degrade to zero.
fn storable_price(url: &str, price: Decimal) -> Decimal {
    storage_price(price).unwrap_or_else(|| {
        warn!(url, price = %price, "scraped price does not fit the money column");
        Decimal::ZERO
    })
}

/// Scrapes `url` and stores it as a new product of `user_id` with its first history row.
pub async fn add_product(state: &AppState, user_id: u32, url: &str) -> Result<Product, AppErrors> {
    let scraped = state.source.scrape_product(url).await;
    let price = storable_price(url, scraped.price);
    let now = Utc::now();
    let product = state
        .db
        .create_product(NewProduct {
            user_id,
            url: url.to_string(),
            name: scraped.name,
            image_url: scraped.image_url,
            current_price: price,
            currency: scraped.currency,
            created_at: now,
        })
        .await?;
    state
        .db
        .add_price_history(NewPriceHistory {
            product_id: product.id,
            price: product.current_price,
            timestamp: now,
        })
        .await?;
    info!(product_id = product.id, user_id, price = %product.current_price, "product added");
    Ok(product)
}

pub async fn owned_product(state: &AppState, user_id: u32, product_id: u32) -> Result<Product, AppErrors> {
    let product = state.db.get_product(product_id).await?;
    if !product.is_owned_by(user_id) {
        return Err(AppErrors::Forbidden);
    }
    Ok(product)
}

/// Re-scrapes a product, records a history row when the price moved, then evaluates its alerts.
pub async fn refresh_product(
    state: &AppState,
    user_id: u32,
    product_id: u32,
) -> Result<Product, AppErrors> {
    owned_product(state, user_id, product_id).await?;
    let guard = state.refresh_locks.acquire(product_id).await;
    let stored = state.db.get_product(product_id).await?;

    let scraped = state.source.scrape_product(&stored.url).await;
    let price = storable_price(&stored.url, scraped.price);
    let now = Utc::now();
    let product = state
        .db
        .update_product_price(product_id, price, now)
        .await?;
    if price != stored.current_price {
        state
            .db
            .add_price_history(NewPriceHistory {
                product_id,
                price,
                timestamp: now,
            })
            .await?;
        info!(product_id, old = %stored.current_price, new = %price, "price changed");
    }
    drop(guard);

    let fired = evaluate_alerts(&state.db, state.notifier.as_ref(), &product).await?;
    if fired > 0 {
        info!(product_id, fired, "price alerts triggered");
    }
    Ok(product)
}

/// Refreshes every stored product on behalf of its owner.
pub async fn refresh_all(state: &AppState) -> Result<usize, AppErrors> {
    let products = state.db.all_products().await?;
    let mut refreshed = 0;
    for product in products {
        match refresh_product(state, product.user_id, product.id).await {
            Ok(_) => refreshed += 1,
            Err(e) => error!(product_id = product.id, "failed to refresh product: {e}"),
        }
    }
    info!(refreshed, "refresh sweep finished");
    Ok(refreshed)
}

pub async fn delete_product(state: &AppState, user_id: u32, product_id: u32) -> Result<(), AppErrors> {
    owned_product(state, user_id, product_id).await?;
    let guard = state.refresh_locks.acquire(product_id).await;
    state.db.delete_product(product_id).await?;
    drop(guard);
    state.refresh_locks.forget(product_id).await;
    info!(product_id, user_id, "product deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Sessions;
    use crate::db::{Database, NewPriceAlert, NewUser};
    use crate::notifier::{Notifier, PriceAlertNotice};
    use crate::parser::{ProductSource, ScrapedProduct};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::str::FromStr;
    use std::time::Duration;

    struct ScriptedSource {
        prices: std::sync::Mutex<VecDeque<Decimal>>,
        delay: Duration,
    }

    impl ScriptedSource {
        fn new(prices: &[&str]) -> Self {
            Self::slow(prices, Duration::ZERO)
        }

        fn slow(prices: &[&str], delay: Duration) -> Self {
            let prices = prices
                .iter()
                .map(|p| Decimal::from_str(p).expect("Failed to parse decimal"))
                .collect();
            Self {
                prices: std::sync::Mutex::new(prices),
                delay,
            }
        }
    }

    #[async_trait]
    impl ProductSource for ScriptedSource {
        async fn scrape_product(&self, _url: &str) -> ScrapedProduct {
            let price = self
                .prices
                .lock()
                .expect("Failed to lock prices")
                .pop_front()
                .expect("Ran out of scripted prices");
            tokio::time::sleep(self.delay).await;
            ScrapedProduct {
                name: "Steel Kettle".to_string(),
                price,
                currency: "USD".to_string(),
                image_url: None,
            }
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: std::sync::Mutex<Vec<PriceAlertNotice>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, notice: &PriceAlertNotice) -> bool {
            self.sent.lock().expect("Failed to lock notices").push(notice.clone());
            true
        }
    }

    async fn setup(prices: &[&str]) -> (AppState, Arc<RecordingNotifier>, u32) {
        setup_with(ScriptedSource::new(prices)).await
    }

    async fn setup_with(source: ScriptedSource) -> (AppState, Arc<RecordingNotifier>, u32) {
        let notifier = Arc::new(RecordingNotifier::default());
        let state = AppState::new(
            Database::in_memory(),
            Arc::new(source),
            notifier.clone(),
            Sessions::default(),
        );
        let user = state
            .db
            .create_user(NewUser {
                username: "ana".to_string(),
                email: "ana@example.com".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .expect("Failed to create user");
        (state, notifier, user.id)
    }

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).expect("Failed to parse decimal")
    }

    #[tokio::test]
    async fn add_product_records_initial_history() {
        let (state, _, user_id) = setup(&["19.99"]).await;
        let product = add_product(&state, user_id, "https://shop.example.com/kettle")
            .await
            .expect("Failed to add product");
        assert_eq!(product.current_price, dec("19.99"));
        assert_eq!(product.last_checked, product.created_at);
        let history = state.db.history_by_product(product.id).await.expect("Failed to read history");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].price, dec("19.99"));
        assert_eq!(history[0].timestamp, product.created_at);
    }

    #[tokio::test]
    async fn history_only_grows_on_price_change() {
        let (state, _, user_id) = setup(&["10", "10", "8.50", "8.50", "9"]).await;
        let product = add_product(&state, user_id, "https://shop.example.com/kettle")
            .await
            .expect("Failed to add product");
        for _ in 0..4 {
            refresh_product(&state, user_id, product.id)
                .await
                .expect("Failed to refresh product");
        }
        let history = state.db.history_by_product(product.id).await.expect("Failed to read history");
        let prices: Vec<Decimal> = history.iter().map(|h| h.price).collect();
        assert_eq!(prices, vec![dec("10"), dec("8.50"), dec("9")]);
        let stored = state.db.get_product(product.id).await.expect("Failed to read product");
        assert_eq!(stored.current_price, dec("9"));
        assert!(stored.last_checked >= stored.created_at);
    }

    #[tokio::test]
    async fn prices_are_stored_at_cent_scale() {
        let (state, _, user_id) = setup(&["19.999", "19.999", "19.999"]).await;
        let product = add_product(&state, user_id, "https://shop.example.com/kettle")
            .await
            .expect("Failed to add product");
        assert_eq!(product.current_price, dec("20.00"));
        for _ in 0..2 {
            refresh_product(&state, user_id, product.id)
                .await
                .expect("Failed to refresh product");
        }
        let history = state.db.history_by_product(product.id).await.expect("Failed to read history");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].price, dec("20.00"));
    }

    #[tokio::test]
    async fn oversized_price_degrades_to_zero() {
        let (state, _, user_id) = setup(&["12345678901", "123456789012.5"]).await;
        let product = add_product(&state, user_id, "https://shop.example.com/kettle")
            .await
            .expect("Failed to add product");
        assert_eq!(product.current_price, Decimal::ZERO);
        let refreshed = refresh_product(&state, user_id, product.id)
            .await
            .expect("Failed to refresh product");
        assert_eq!(refreshed.current_price, Decimal::ZERO);
        let history = state.db.history_by_product(product.id).await.expect("Failed to read history");
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_refreshes_record_one_change() {
        let source = ScriptedSource::slow(&["10", "8", "8"], Duration::from_millis(50));
        let (state, _, user_id) = setup_with(source).await;
        let product = add_product(&state, user_id, "https://shop.example.com/kettle")
            .await
            .expect("Failed to add product");

        let (first, second) = tokio::join!(
            refresh_product(&state, user_id, product.id),
            refresh_product(&state, user_id, product.id)
        );
        first.expect("Failed to refresh product");
        second.expect("Failed to refresh product");

        let history = state.db.history_by_product(product.id).await.expect("Failed to read history");
        let prices: Vec<Decimal> = history.iter().map(|h| h.price).collect();
        assert_eq!(prices, vec![dec("10"), dec("8")]);
    }

    #[tokio::test]
    async fn refresh_locks_serialize_same_product() {
        let locks = RefreshLocks::default();
        let guard = locks.acquire(1).await;
        let other = tokio::time::timeout(Duration::from_millis(50), locks.acquire(2)).await;
        assert!(other.is_ok());
        let same = tokio::time::timeout(Duration::from_millis(50), locks.acquire(1)).await;
        assert!(same.is_err());
        drop(guard);
        let same = tokio::time::timeout(Duration::from_millis(50), locks.acquire(1)).await;
        assert!(same.is_ok());
    }

    #[tokio::test]
    async fn alert_fires_at_or_below_target_only() {
        let (state, notifier, user_id) = setup(&["10", "8.50", "9.50"]).await;
        let product = add_product(&state, user_id, "https://shop.example.com/kettle")
            .await
            .expect("Failed to add product");
        state
            .db
            .create_alert(NewPriceAlert {
                product_id: product.id,
                target_price: dec("9"),
                active: true,
                created_at: Utc::now(),
            })
            .await
            .expect("Failed to create alert");

        refresh_product(&state, user_id, product.id).await.expect("Failed to refresh");
        {
            let sent = notifier.sent.lock().expect("Failed to lock notices");
            assert_eq!(sent.len(), 1);
            assert_eq!(sent[0].recipient, "ana@example.com");
            assert_eq!(sent[0].current_price, dec("8.50"));
            assert_eq!(sent[0].target_price, dec("9"));
        }

        refresh_product(&state, user_id, product.id).await.expect("Failed to refresh");
        assert_eq!(notifier.sent.lock().expect("Failed to lock notices").len(), 1);
    }

    #[tokio::test]
    async fn inactive_alert_is_silent() {
        let (state, notifier, user_id) = setup(&["10", "5"]).await;
        let product = add_product(&state, user_id, "https://shop.example.com/kettle")
            .await
            .expect("Failed to add product");
        state
            .db
            .create_alert(NewPriceAlert {
                product_id: product.id,
                target_price: dec("9"),
                active: false,
                created_at: Utc::now(),
            })
            .await
            .expect("Failed to create alert");
        refresh_product(&state, user_id, product.id).await.expect("Failed to refresh");
        assert!(notifier.sent.lock().expect("Failed to lock notices").is_empty());
    }

    #[tokio::test]
    async fn zero_price_never_triggers() {
        let (state, notifier, user_id) = setup(&["10", "0"]).await;
        let product = add_product(&state, user_id, "https://shop.example.com/kettle")
            .await
            .expect("Failed to add product");
        state
            .db
            .create_alert(NewPriceAlert {
                product_id: product.id,
                target_price: dec("9"),
                active: true,
                created_at: Utc::now(),
            })
            .await
            .expect("Failed to create alert");
        refresh_product(&state, user_id, product.id).await.expect("Failed to refresh");
        assert!(notifier.sent.lock().expect("Failed to lock notices").is_empty());
    }

    #[tokio::test]
    async fn refresh_of_foreign_product_is_forbidden() {
        let (state, _, user_id) = setup(&["10"]).await;
        let product = add_product(&state, user_id, "https://shop.example.com/kettle")
            .await
            .expect("Failed to add product");
        let result = refresh_product(&state, user_id + 1, product.id).await;
        assert!(matches!(result, Err(AppErrors::Forbidden)));
        let history = state.db.history_by_product(product.id).await.expect("Failed to read history");
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn refresh_of_missing_product_is_not_found() {
        let (state, _, user_id) = setup(&[]).await;
        let result = refresh_product(&state, user_id, 42).await;
        assert_eq!(result.expect_err("Refresh should fail").kind(), "not_found");
    }

    #[tokio::test]
    async fn refresh_all_covers_every_product() {
        let (state, _, user_id) = setup(&["10", "20", "9", "20"]).await;
        let first = add_product(&state, user_id, "https://shop.example.com/a")
            .await
            .expect("Failed to add product");
        let second = add_product(&state, user_id, "https://shop.example.com/b")
            .await
            .expect("Failed to add product");
        let refreshed = refresh_all(&state).await.expect("Failed to refresh all");
        assert_eq!(refreshed, 2);
        let first = state.db.get_product(first.id).await.expect("Failed to read product");
        let second = state.db.get_product(second.id).await.expect("Failed to read product");
        assert_eq!(first.current_price, dec("9"));
        assert_eq!(second.current_price, dec("20"));
    }

    #[tokio::test]
    async fn delete_product_removes_history() {
        let (state, _, user_id) = setup(&["10"]).await;
        let product = add_product(&state, user_id, "https://shop.example.com/kettle")
            .await
            .expect("Failed to add product");
        delete_product(&state, user_id, product.id).await.expect("Failed to delete product");
        assert!(state.db.get_product(product.id).await.is_err());
        assert!(state
            .db
            .history_by_product(product.id)
            .await
            .map(|history| history.is_empty())
            .unwrap_or(true));
    }
}
