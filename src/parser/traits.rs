use crate::parser::errors::ParserError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, PRAGMA};
use reqwest::redirect::Policy;
use reqwest::Client;
use scraper::{ElementRef, Selector};
use std::time::Duration;

pub trait Parser {
    fn clean_data_point(input: ElementRef) -> String {
        input.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn selector(css: &str) -> Result<Selector, ParserError> {
        Selector::parse(css).map_err(|_| ParserError::CrawlerSelectorError(css.to_string()))
    }

    fn create_client(user_agent: &str, timeout: Duration) -> Result<Client, ParserError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        Client::builder()
            .redirect(Policy::limited(30))
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(ParserError::FailedClient)
    }
}
