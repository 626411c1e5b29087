use crate::db::relational::entities;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceAlert {
    pub id: u32,
    pub product_id: u32,
    pub target_price: Decimal,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPriceAlert {
    pub product_id: u32,
    pub target_price: Decimal,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

fn positive_price(price: &Decimal) -> Result<(), ValidationError> {
    match crate::db::storage_price(*price) {
        Some(stored) if !stored.is_zero() => Ok(()),
        Some(_) => Err(ValidationError::new("target_price_not_positive")),
        None if price.is_sign_negative() => Err(ValidationError::new("target_price_not_positive")),
        None => Err(ValidationError::new("target_price_too_large")),
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlert {
    #[validate(custom(function = "positive_price"))]
    pub target_price: Decimal,
    #[serde(default = "default_active")]
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpdateAlert {
    pub active: bool,
}

impl TryFrom<entities::price_alert::Model> for PriceAlert {
    type Error = crate::db::DatabaseError;

    fn try_from(alert: entities::price_alert::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: crate::db::from_key(alert.id)?,
            product_id: crate::db::from_key(alert.product_id)?,
            target_price: alert.target_price,
            active: alert.active,
            created_at: alert.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_price_validation_works() {
        let alert = CreateAlert {
            target_price: Decimal::new(900, 2),
            active: true,
        };
        assert!(alert.validate().is_ok());
    }

    #[test]
    fn target_price_zero_fails() {
        let alert = CreateAlert {
            target_price: Decimal::ZERO,
            active: true,
        };
        assert!(alert.validate().is_err());
    }

    #[test]
    fn target_price_negative_fails() {
        let alert = CreateAlert {
            target_price: Decimal::new(-15, 0),
            active: true,
        };
        assert!(alert.validate().is_err());
    }

    #[test]
    fn target_price_beyond_money_column_fails() {
        let alert = CreateAlert {
            target_price: Decimal::new(12_345_678_901, 0),
            active: true,
        };
        let errors = alert.validate().expect_err("Validation should fail");
        assert!(errors.field_errors().contains_key("target_price"));
    }

    #[test]
    fn active_defaults_to_true() {
        let alert: CreateAlert =
            serde_json::from_str(r#"{"targetPrice": 9.5}"#).expect("Failed to parse alert");
        assert!(alert.active);
        assert_eq!(alert.target_price, Decimal::new(95, 1));
    }
}
