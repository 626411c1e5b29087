use crate::configuration::LanguageModelSettings;
use crate::parser::errors::ParserError;
use crate::parser::price::DEFAULT_CURRENCY;
use crate::parser::{ScrapedProduct, UNKNOWN_PRODUCT};
use regex::Regex;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("valid json object pattern"));

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content
            .parts
            .into_iter()
            .next()
            .map(|part| part.text)
    }
}

/// Generative-text fallback used when a page cannot be read directly.
#[derive(Debug, Clone)]
pub struct LanguageModel {
    client: Client,
    settings: LanguageModelSettings,
}

impl LanguageModel {
    pub fn new(settings: LanguageModelSettings) -> Result<Self, ParserError> {
        let client = Client::builder().timeout(settings.timeout()).build()?;
        Ok(Self { client, settings })
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key().is_some()
    }

    fn api_key(&self) -> Option<&str> {
        self.settings
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
    }

    pub fn prompt(url: &str) -> String {
        format!(
            r#"You are a product data extraction expert. Extract EXACT product information from this product page URL: {url}

Don't make up information or guess! If you cannot access the actual page, explicitly say so.

Return ONLY a valid JSON object with these fields:
{{
  "name": "Full product name without modifications, exactly as shown on the page",
  "price": 19.99,
  "currency": "INR",
  "imageUrl": "https://example.com/image.jpg"
}}

IMPORTANT INSTRUCTIONS:
- For name, extract the EXACT product name as displayed on the page
- For price, return ONLY a number without currency symbols (e.g., 1999 not ₹1,999)
- For currency, use the exact ISO currency code from the page (INR for Indian prices, USD for US, etc.)
- If you cannot determine a field, use null for imageUrl and "Unknown Product" for name
- For price, use 0 if unknown
- DO NOT return a fixed/dummy response"#
        )
    }

    pub async fn extract(&self, url: &str) -> Option<ScrapedProduct> {
        let Some(api_key) = self.api_key() else {
            debug!(url, "language model fallback disabled, no api key");
            return None;
        };
        info!(url, "asking language model for product info");
        let reply = match self.generate(url, api_key).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(url, "language model request failed: {e}");
                return None;
            }
        };
        match parse_reply(&reply) {
            Ok(product) => Some(product),
            Err(e) => {
                warn!(url, "unusable language model reply: {e}");
                None
            }
        }
    }

    async fn generate(&self, url: &str, api_key: &str) -> Result<String, ParserError> {
        let endpoint = format!(
            "{}/models/{}:generateContent",
            self.settings.endpoint.trim_end_matches('/'),
            self.settings.model
        );
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Self::prompt(url),
                }],
            }],
        };
        let response = self
            .client
            .post(endpoint)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ParserError::UpstreamStatus(status.as_u16()));
        }
        let reply: GenerateResponse = response.json().await?;
        reply.first_text().ok_or(ParserError::EmptyCompletion)
    }
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn price_field(object: &Map<String, Value>) -> Decimal {
    let price = match object.get("price") {
        Some(Value::Number(number)) => Decimal::from_str(&number.to_string())
            .ok()
            .or_else(|| number.as_f64().and_then(|value| Decimal::try_from(value).ok())),
        _ => None,
    };
    price
        .filter(|price| price.is_sign_positive())
        .unwrap_or(Decimal::ZERO)
}

/// Reads the product out of the first `{ ... }` span of a model reply.
pub fn parse_reply(reply: &str) -> Result<ScrapedProduct, ParserError> {
    let json = JSON_OBJECT
        .find(reply)
        .ok_or(ParserError::MissingJson)?
        .as_str();
    let object: Map<String, Value> = serde_json::from_str(json)?;
    Ok(ScrapedProduct {
        name: string_field(&object, "name").unwrap_or_else(|| UNKNOWN_PRODUCT.to_string()),
        price: price_field(&object),
        currency: string_field(&object, "currency").unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        image_url: string_field(&object, "imageUrl"),
    })
}
