use crate::configuration::{LanguageModelSettings, ScraperSettings};
use crate::parser::extractor::Extractor;
use crate::parser::language_model::LanguageModel;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

mod errors;
pub mod extractor;
pub mod language_model;
pub mod normalizer;
pub mod price;
mod traits;

pub use errors::ParserError;

pub const UNKNOWN_PRODUCT: &str = "Unknown Product";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedProduct {
    pub name: String,
    pub price: Decimal,
    pub currency: String,
    pub image_url: Option<String>,
}

impl ScrapedProduct {
    pub fn is_usable(&self) -> bool {
        self.name != UNKNOWN_PRODUCT && self.price > Decimal::ZERO
    }

    /// Last resort record, named after the host of `url`.
    pub fn fallback(url: &str) -> Self {
        let name = Url::parse(url)
            .ok()
            .and_then(|url| url.host_str().map(|host| format!("Product from {host}")))
            .unwrap_or_else(|| UNKNOWN_PRODUCT.to_string());
        Self {
            name,
            price: Decimal::ZERO,
            currency: price::DEFAULT_CURRENCY.to_string(),
            image_url: None,
        }
    }
}

/// Anything able to turn a product url into a product record.
/// Implementations never fail; degraded results carry a zero price.
#[async_trait]
pub trait ProductSource: Send + Sync {
    async fn scrape_product(&self, url: &str) -> ScrapedProduct;
}

#[derive(Debug, Clone)]
pub struct Scraper {
    extractor: Extractor,
    language_model: LanguageModel,
}

impl Scraper {
    pub fn new(
        scraper: &ScraperSettings,
        language_model: &LanguageModelSettings,
    ) -> Result<Self, ParserError> {
        Ok(Self {
            extractor: Extractor::new(&scraper.user_agent, scraper.timeout())?,
            language_model: LanguageModel::new(language_model.clone())?,
        })
    }
}

#[async_trait]
impl ProductSource for Scraper {
    async fn scrape_product(&self, url: &str) -> ScrapedProduct {
        let normalized = normalizer::normalize(url);

        if let Some(product) = self.extractor.extract(&normalized).await {
            if product.is_usable() {
                info!(url = %normalized, "extracted product directly");
                return product;
            }
            warn!(url = %normalized, name = %product.name, "direct extraction incomplete");
        }

        if let Some(product) = self.language_model.extract(&normalized).await {
            info!(url = %normalized, usable = product.is_usable(), "extracted product with language model");
            return product;
        }

        warn!(url, "falling back to placeholder product");
        ScrapedProduct::fallback(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Local stand-in for the generative endpoint answering every request with `reply`.
    async fn serve_model_reply(reply: &str) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind listener");
        let addr = listener.local_addr().expect("Failed to read local address");
        let body = json!({"candidates": [{"content": {"parts": [{"text": reply}]}}]});
        let app = axum::Router::new().fallback(move || {
            let body = body.clone();
            async move { axum::Json(body) }
        });
        tokio::spawn(async move { axum::serve(listener, app).await });
        format!("http://{addr}")
    }

    fn scraper_with_model(endpoint: String) -> Scraper {
        Scraper::new(
            &ScraperSettings {
                timeout_secs: 2,
                ..Default::default()
            },
            &LanguageModelSettings {
                endpoint,
                api_key: Some("test-key".to_string()),
                timeout_secs: 5,
                ..Default::default()
            },
        )
        .expect("Failed to build scraper")
    }

    #[test]
    fn usable_requires_name_and_price() {
        let mut product = ScrapedProduct {
            name: "Kettle".to_string(),
            price: Decimal::new(1999, 2),
            currency: "USD".to_string(),
            image_url: None,
        };
        assert!(product.is_usable());
        product.price = Decimal::ZERO;
        assert!(!product.is_usable());
        product.price = Decimal::ONE;
        product.name = UNKNOWN_PRODUCT.to_string();
        assert!(!product.is_usable());
    }

    #[test]
    fn fallback_uses_host() {
        let product = ScrapedProduct::fallback("https://shop.example.com/item/42");
        assert_eq!(product.name, "Product from shop.example.com");
        assert_eq!(product.price, Decimal::ZERO);
        assert_eq!(product.currency, "USD");
        assert!(product.image_url.is_none());
    }

    #[test]
    fn fallback_without_host_is_unknown() {
        assert_eq!(ScrapedProduct::fallback("not a url").name, UNKNOWN_PRODUCT);
    }

    #[test]
    fn scraped_product_serializes_camel_case() {
        let product = ScrapedProduct {
            name: "Kettle".to_string(),
            price: Decimal::new(1999, 0),
            currency: "INR".to_string(),
            image_url: Some("https://img.example.com/k.jpg".to_string()),
        };
        let json = serde_json::to_value(&product).expect("Failed to serialize");
        assert_eq!(json["imageUrl"], "https://img.example.com/k.jpg");
        assert_eq!(json["price"], "1999");
    }

    #[tokio::test]
    async fn language_model_reply_is_kept_even_without_price() {
        let endpoint =
            serve_model_reply(r#"{"name": "Steel Kettle 1.7L", "price": 0, "currency": "INR"}"#).await;
        let product = scraper_with_model(endpoint)
            .scrape_product("http://127.0.0.1:1/item")
            .await;
        assert_eq!(product.name, "Steel Kettle 1.7L");
        assert_eq!(product.price, Decimal::ZERO);
        assert_eq!(product.currency, "INR");
    }

    #[tokio::test]
    async fn unusable_model_reply_text_falls_back() {
        let endpoint = serve_model_reply("I cannot access this page.").await;
        let product = scraper_with_model(endpoint)
            .scrape_product("http://127.0.0.1:1/item")
            .await;
        assert_eq!(product.name, "Product from 127.0.0.1");
        assert_eq!(product.currency, "USD");
    }

    #[tokio::test]
    async fn unreachable_url_falls_back() {
        let scraper = Scraper::new(
            &ScraperSettings {
                timeout_secs: 2,
                ..Default::default()
            },
            &LanguageModelSettings::default(),
        )
        .expect("Failed to build scraper");
        let product = scraper.scrape_product("http://127.0.0.1:1/item").await;
        assert_eq!(product.name, "Product from 127.0.0.1");
        assert_eq!(product.price, Decimal::ZERO);
        assert_eq!(product.currency, "USD");
    }
}
