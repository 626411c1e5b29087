use crate::notifier::{format_money, Notifier, PriceAlertNotice};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{error, info};

const SENDGRID_ENDPOINT: &str = "https://api.sendgrid.com/v3/mail/send";

/// Price alert e-mails through the SendGrid v3 mail API.
#[derive(Debug, Clone)]
pub struct SendGridNotifier {
    http: Client,
    api_key: String,
    from_email: String,
    endpoint: String,
}

impl SendGridNotifier {
    pub fn new(api_key: &str, from_email: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_key: api_key.to_string(),
            from_email: from_email.to_string(),
            endpoint: SENDGRID_ENDPOINT.to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    fn text_body(notice: &PriceAlertNotice) -> String {
        format!(
            "Price Drop Alert!\n\n\
             Good news! The price for {name} has dropped below your target price.\n\n\
             Product: {name}\n\
             Current Price: {current}\n\
             Your Target Price: {target}\n\n\
             Visit the product page:\n{url}\n",
            name = notice.product_name,
            current = format_money(notice.current_price, &notice.currency),
            target = format_money(notice.target_price, &notice.currency),
            url = notice.product_url,
        )
    }

    fn html_body(notice: &PriceAlertNotice) -> String {
        format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
  <h2>Price Drop Alert</h2>
  <p>Good news! The price for <strong>{name}</strong> has dropped below your target price.</p>
  <p><strong>Current Price:</strong> {current}</p>
  <p><strong>Your Target Price:</strong> {target}</p>
  <a href="{url}">View Product</a>
</div>"#,
            name = notice.product_name,
            current = format_money(notice.current_price, &notice.currency),
            target = format_money(notice.target_price, &notice.currency),
            url = notice.product_url,
        )
    }

    pub fn payload(&self, notice: &PriceAlertNotice) -> Value {
        json!({
            "personalizations": [{ "to": [{ "email": notice.recipient }] }],
            "from": { "email": self.from_email },
            "subject": notice.subject(),
            "content": [
                { "type": "text/plain", "value": Self::text_body(notice) },
                { "type": "text/html", "value": Self::html_body(notice) },
            ],
        })
    }
}

#[async_trait]
impl Notifier for SendGridNotifier {
    async fn send(&self, notice: &PriceAlertNotice) -> bool {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.payload(notice))
            .send()
            .await;
        match response {
            Ok(resp) if resp.status().is_success() => {
                info!(recipient = %notice.recipient, "price alert e-mail sent");
                true
            }
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                error!(status = %status, body = %body, "sendgrid rejected price alert e-mail");
                false
            }
            Err(e) => {
                error!(recipient = %notice.recipient, "failed to send price alert e-mail: {e}");
                false
            }
        }
    }
}
