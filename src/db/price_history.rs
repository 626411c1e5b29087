use crate::db::relational::entities;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceHistory {
    pub id: u32,
    pub product_id: u32,
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPriceHistory {
    pub product_id: u32,
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl TryFrom<entities::price_history::Model> for PriceHistory {
    type Error = crate::db::DatabaseError;

    fn try_from(entry: entities::price_history::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: crate::db::from_key(entry.id)?,
            product_id: crate::db::from_key(entry.product_id)?,
            price: entry.price,
            timestamp: entry.timestamp,
        })
    }
}

/// Chart order: oldest first, insertion order breaks ties.
pub fn sort_chronologically(history: &mut [PriceHistory]) {
    history.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
}
