use crate::db::relational::entities;
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const DEFAULT_CURRENCY: &str = "USD";

/// Decimal places kept by the `numeric(12, 2)` money columns.
pub const PRICE_SCALE: u32 = 2;

/// `price` rounded the way the money columns store it.
/// `None` when it is negative or has more than ten integer digits.
pub fn storage_price(price: Decimal) -> Option<Decimal> {
    let limit = Decimal::from(10_000_000_000_i64);
    let rounded = price.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero);
    (rounded >= Decimal::ZERO && rounded < limit).then_some(rounded)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: u32,
    pub user_id: u32,
    pub url: String,
    pub name: String,
    pub image_url: Option<String>,
    pub current_price: Decimal,
    pub currency: String,
    pub last_checked: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn is_owned_by(&self, user_id: u32) -> bool {
        self.user_id == user_id
    }
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub user_id: u32,
    pub url: String,
    pub name: String,
    pub image_url: Option<String>,
    pub current_price: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct AddProduct {
    #[validate(url)]
    pub url: String,
}

impl TryFrom<entities::product::Model> for Product {
    type Error = crate::db::DatabaseError;

    fn try_from(product: entities::product::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: crate::db::from_key(product.id)?,
            user_id: crate::db::from_key(product.user_id)?,
            url: product.url,
            name: product.name,
            image_url: product.image_url,
            current_price: product.current_price,
            currency: product.currency,
            last_checked: product.last_checked,
            created_at: product.created_at,
        })
    }
}
