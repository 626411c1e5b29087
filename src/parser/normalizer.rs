use tracing::{debug, warn};
use url::Url;

/// Marketplace redirect shortener and the detail page it expands to.
struct ShortLinkRule {
    host: &'static str,
    canonical: &'static str,
}

const SHORT_LINK_RULES: [ShortLinkRule; 3] = [
    ShortLinkRule {
        host: "amzn.in",
        canonical: "https://www.amazon.in/dp/",
    },
    ShortLinkRule {
        host: "amzn.to",
        canonical: "https://www.amazon.com/dp/",
    },
    ShortLinkRule {
        host: "a.co",
        canonical: "https://www.amazon.com/dp/",
    },
];

/// Expands known short links into canonical product pages.
/// Anything else, including unparsable input, comes back unchanged.
pub fn normalize(raw_url: &str) -> String {
    let url = match Url::parse(raw_url.trim()) {
        Ok(url) => url,
        Err(e) => {
            warn!(url = raw_url, "failed to normalize url: {e}");
            return raw_url.to_string();
        }
    };
    let Some(host) = url.host_str() else {
        return raw_url.to_string();
    };
    let host = host.trim_start_matches("www.");
    let Some(rule) = SHORT_LINK_RULES.iter().find(|rule| rule.host == host) else {
        return raw_url.to_string();
    };
    match short_link_id(&url) {
        Some(id) => {
            let expanded = format!("{}{}", rule.canonical, id);
            debug!(url = raw_url, expanded = %expanded, "expanded short link");
            expanded
        }
        None => {
            warn!(url = raw_url, "short link without product id");
            raw_url.to_string()
        }
    }
}

fn short_link_id(url: &Url) -> Option<String> {
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    let id = match segments.iter().position(|segment| *segment == "d") {
        Some(index) => segments.get(index + 1).copied(),
        None => segments.last().copied(),
    }?;
    let id = id.trim();
    (!id.is_empty()).then(|| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indian_short_link_expands() {
        assert_eq!(
            normalize("https://amzn.in/d/B000123"),
            "https://www.amazon.in/dp/B000123"
        );
    }

    #[test]
    fn us_short_link_drops_query_and_trailing_segments() {
        assert_eq!(
            normalize("https://amzn.to/d/B000123/extra?tag=abc"),
            "https://www.amazon.com/dp/B000123"
        );
    }

    #[test]
    fn short_link_without_d_segment_uses_last_segment() {
        assert_eq!(
            normalize("https://amzn.to/3xYzAbc"),
            "https://www.amazon.com/dp/3xYzAbc"
        );
    }

    #[test]
    fn normalization_is_deterministic() {
        let url = "https://www.amzn.in/d/B000123";
        assert_eq!(normalize(url), normalize(url));
    }

    #[test]
    fn unknown_domain_passes_through() {
        let url = "https://example-short.io/d/B000123";
        assert_eq!(normalize(url), url);
    }

    #[test]
    fn full_marketplace_url_passes_through() {
        let url = "https://www.amazon.com/dp/B000123?th=1";
        assert_eq!(normalize(url), url);
    }

    #[test]
    fn short_link_without_id_passes_through() {
        assert_eq!(normalize("https://amzn.in/"), "https://amzn.in/");
    }

    #[test]
    fn malformed_url_passes_through() {
        assert_eq!(normalize("not a url"), "not a url");
    }
}
