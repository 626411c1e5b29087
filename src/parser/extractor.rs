use crate::parser::errors::ParserError;
use crate::parser::price::{clean_price, currency_from_text, DEFAULT_CURRENCY};
use crate::parser::traits::Parser;
use crate::parser::{ScrapedProduct, UNKNOWN_PRODUCT};
use regex::Regex;
use reqwest::Client;
use rust_decimal::Decimal;
use scraper::{ElementRef, Html};
use std::sync::LazyLock;
use std::time::Duration;
use tokio::task::spawn_blocking;
use tracing::{debug, warn};
use url::Url;

static SCRIPT_PRICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""price":\s*"([^"]+)""#).expect("valid script price pattern"));

static PRODUCT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/dp/([A-Z0-9]+)").expect("valid product id pattern"));

/// Where a matched element keeps the value we are after.
#[derive(Debug, Clone, Copy)]
enum Source {
    Text,
    Attr(&'static str),
    ImageSource,
}

#[derive(Debug, Clone, Copy)]
struct Lookup {
    selector: &'static str,
    source: Source,
}

const fn text(selector: &'static str) -> Lookup {
    Lookup {
        selector,
        source: Source::Text,
    }
}

const fn attr(selector: &'static str, name: &'static str) -> Lookup {
    Lookup {
        selector,
        source: Source::Attr(name),
    }
}

const fn image(selector: &'static str) -> Lookup {
    Lookup {
        selector,
        source: Source::ImageSource,
    }
}

const NAME_LOOKUPS: [Lookup; 9] = [
    text("#productTitle"),
    text("#title"),
    text(".product-title"),
    text("h1.product-title"),
    text("h1.product-name"),
    text("h1.product_title"),
    text("h1#productTitle"),
    text("h1.title"),
    text("h1"),
];

const PRICE_LOOKUPS: [Lookup; 14] = [
    text(".a-price .a-offscreen"),
    text("#priceblock_ourprice"),
    text("#priceblock_dealprice"),
    text(".a-color-price"),
    text("#price_inside_buybox"),
    text("#buyNewSection .a-color-price"),
    text("span.price"),
    text("div.price"),
    text("span.product-price"),
    text("span.current-price"),
    text("p.price"),
    attr("[data-price]", "data-price"),
    attr(r#"meta[property="product:price:amount"]"#, "content"),
    text("span.price-value"),
];

const CURRENCY_LOOKUPS: [Lookup; 2] = [
    attr(r#"meta[property="product:price:currency"]"#, "content"),
    text("span.currency"),
];

const IMAGE_LOOKUPS: [Lookup; 10] = [
    image("#landingImage"),
    image("#imgBlkFront"),
    image("#main-image"),
    image("img.product-image"),
    image("img.main-image"),
    image("img#main-product-image"),
    image("img#product-image"),
    image("img#productImage"),
    image("div.product-image img"),
    attr(r#"meta[property="og:image"]"#, "content"),
];

#[derive(Debug, Clone)]
pub struct Extractor {
    client: Client,
}

impl Parser for Extractor {}

impl Extractor {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, ParserError> {
        Ok(Self {
            client: Self::create_client(user_agent, timeout)?,
        })
    }

    /// Fetches the page and reads it through the selector tables.
    /// `None` tells the caller to try the next tier.
    pub async fn extract(&self, url: &str) -> Option<ScrapedProduct> {
        match self.fetch(url).await {
            Ok(product) => Some(product),
            Err(e) => {
                warn!(url, "direct extraction failed: {e}");
                None
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<ScrapedProduct, ParserError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ParserError::UpstreamStatus(status.as_u16()));
        }
        let page_url = response.url().to_string();
        let html = response.text().await?;
        debug!(url = %page_url, bytes = html.len(), "fetched product page");
        let product = spawn_blocking(move || extract_product_info(&html, &page_url)).await?;
        Ok(product)
    }

    fn read(element: ElementRef, source: Source) -> Option<String> {
        let value = match source {
            Source::Text => Self::clean_data_point(element),
            Source::Attr(name) => element.value().attr(name)?.trim().to_string(),
            Source::ImageSource => element
                .value()
                .attr("src")
                .or_else(|| element.value().attr("data-old-hires"))?
                .trim()
                .to_string(),
        };
        (!value.is_empty()).then_some(value)
    }

    /// Walks the table in order and returns the first value `accept` keeps.
    /// Each selector contributes its first matching element only.
    fn first_match<T>(
        document: &Html,
        lookups: &[Lookup],
        mut accept: impl FnMut(String) -> Option<T>,
    ) -> Option<T> {
        lookups.iter().find_map(|lookup| {
            let element = Self::first_element(document, lookup)?;
            Self::read(element, lookup.source).and_then(&mut accept)
        })
    }

    fn first_element<'a>(document: &'a Html, lookup: &Lookup) -> Option<ElementRef<'a>> {
        match Self::selector(lookup.selector) {
            Ok(selector) => document.select(&selector).next(),
            Err(e) => {
                warn!("skipping lookup: {e}");
                None
            }
        }
    }

    fn price_from_scripts(document: &Html) -> Option<Decimal> {
        let scripts = Self::selector("script").ok()?;
        document.select(&scripts).find_map(|script| {
            let content = script.text().collect::<String>();
            SCRIPT_PRICE
                .captures_iter(&content)
                .find_map(|captures| clean_price(&captures[1]))
        })
    }

    fn currency(document: &Html) -> String {
        let from_prices = PRICE_LOOKUPS.iter().find_map(|lookup| {
            let element = Self::first_element(document, lookup)?;
            currency_from_text(&element.text().collect::<String>())
        });
        if let Some(code) = from_prices {
            return code.to_string();
        }
        Self::first_match(document, &CURRENCY_LOOKUPS, Some)
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string())
    }
}

pub fn is_amazon_url(url: &str) -> bool {
    ["amazon.com", "amazon.in", "amzn.in", "amzn.to"]
        .iter()
        .any(|host| url.contains(host))
}

/// Best-effort product record out of a product page.
pub fn extract_product_info(html: &str, url: &str) -> ScrapedProduct {
    let document = Html::parse_document(html);

    let name = Extractor::first_match(&document, &NAME_LOOKUPS, Some);
    let mut price = Extractor::first_match(&document, &PRICE_LOOKUPS, |text| clean_price(&text));
    if price.is_none() && is_amazon_url(url) {
        price = Extractor::price_from_scripts(&document);
    }
    let currency = Extractor::currency(&document);
    let image_url = Extractor::first_match(&document, &IMAGE_LOOKUPS, Some)
        .map(|src| absolute_url(url, &src));

    ScrapedProduct {
        name: name.unwrap_or_else(|| placeholder_name(url)),
        price: price.unwrap_or(Decimal::ZERO),
        currency,
        image_url,
    }
}

/// Name shown while the page could not tell us the real one.
pub fn placeholder_name(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return UNKNOWN_PRODUCT.to_string();
    };
    match parsed.host_str() {
        Some(host) if host.contains("amazon") => match PRODUCT_ID.captures(url) {
            Some(captures) => format!("Amazon Product ({})", &captures[1]),
            None => "Amazon Product".to_string(),
        },
        Some(host) => format!("Product from {host}"),
        None => UNKNOWN_PRODUCT.to_string(),
    }
}

/// Resolves an image reference against the page origin.
/// Absolute and protocol-relative sources keep their own host.
pub fn absolute_url(page_url: &str, src: &str) -> String {
    let resolved = Url::parse(page_url)
        .and_then(|page| page.join("/"))
        .and_then(|origin| origin.join(src.trim()));
    match resolved {
        Ok(url) => url.to_string(),
        Err(e) => {
            warn!(url = page_url, src, "failed to resolve image url: {e}");
            src.to_string()
        }
    }
}
