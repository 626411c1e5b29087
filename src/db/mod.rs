use crate::configuration::{DatabaseSettings, DatabaseType};
use crate::errors::AppErrors;
use crate::db::in_memory::InMemoryDB;
use crate::db::relational::RelationalDB;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::Database as SeaOrmDB;

mod errors;
pub mod in_memory;
mod price_alert;
mod price_history;
mod product;
pub mod relational;
mod user;

pub use errors::DBError as DatabaseError;
pub use price_alert::{CreateAlert, NewPriceAlert, PriceAlert, UpdateAlert};
pub use price_history::{sort_chronologically, NewPriceHistory, PriceHistory};
pub use product::{storage_price, AddProduct, NewProduct, Product, DEFAULT_CURRENCY};
pub use user::{LoginUser, NewUser, PublicUser, RegisterUser, User};

pub(crate) fn to_key(id: u32) -> Result<i32, DatabaseError> {
    i32::try_from(id).map_err(|_| DatabaseError::IdOutOfRange(id.into()))
}

pub(crate) fn from_key(id: i32) -> Result<u32, DatabaseError> {
    u32::try_from(id).map_err(|_| DatabaseError::IdOutOfRange(id.into()))
}

#[derive(Debug)]
pub enum Database {
    InMemory(Box<InMemoryDB>),
    Relational(RelationalDB),
}

impl Database {
    pub fn in_memory() -> Self {
        Self::InMemory(Box::default())
    }

    pub async fn try_from(settings: &DatabaseSettings) -> Result<Self, AppErrors> {
        settings.is_valid()?;
        match settings.db_type {
            DatabaseType::InMemory => Ok(Self::in_memory()),
            DatabaseType::Relational => {
                let connection_settings = settings.relational_connection()?;
                let connection = SeaOrmDB::connect(connection_settings)
                    .await
                    .map_err(|e| AppErrors::DatabaseError(DatabaseError::Relational(e)))?;
                let db = RelationalDB::init(connection);
                db.ensure_schema().await?;
                Ok(Self::Relational(db))
            }
        }
    }

    pub async fn create_user(&self, new_user: NewUser) -> Result<User, DatabaseError> {
        match self {
            Database::InMemory(db) => db.create_user(new_user),
            Database::Relational(db) => db.create_user(new_user).await,
        }
    }

    pub async fn get_user(&self, id: u32) -> Result<User, DatabaseError> {
        match self {
            Database::InMemory(db) => db.get_user(id),
            Database::Relational(db) => db.get_user(id).await,
        }
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        match self {
            Database::InMemory(db) => db.get_user_by_username(username),
            Database::Relational(db) => db.get_user_by_username(username).await,
        }
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        match self {
            Database::InMemory(db) => db.get_user_by_email(email),
            Database::Relational(db) => db.get_user_by_email(email).await,
        }
    }

    pub async fn create_product(&self, new_product: NewProduct) -> Result<Product, DatabaseError> {
        match self {
            Database::InMemory(db) => db.create_product(new_product),
            Database::Relational(db) => db.create_product(new_product).await,
        }
    }

    pub async fn get_product(&self, id: u32) -> Result<Product, DatabaseError> {
        match self {
            Database::InMemory(db) => db.get_product(id),
            Database::Relational(db) => db.get_product(id).await,
        }
    }

    pub async fn products_by_user(&self, user_id: u32) -> Result<Vec<Product>, DatabaseError> {
        match self {
            Database::InMemory(db) => db.products_by_user(user_id),
            Database::Relational(db) => db.products_by_user(user_id).await,
        }
    }

    pub async fn all_products(&self) -> Result<Vec<Product>, DatabaseError> {
        match self {
            Database::InMemory(db) => db.all_products(),
            Database::Relational(db) => db.all_products().await,
        }
    }

    pub async fn update_product_price(
        &self,
        id: u32,
        price: Decimal,
        checked_at: DateTime<Utc>,
    ) -> Result<Product, DatabaseError> {
        match self {
            Database::InMemory(db) => db.update_product_price(id, price, checked_at),
            Database::Relational(db) => db.update_product_price(id, price, checked_at).await,
        }
    }

    /// Removes the product together with its price history and alerts.
    pub async fn delete_product(&self, id: u32) -> Result<(), DatabaseError> {
        match self {
            Database::InMemory(db) => db.delete_product(id),
            Database::Relational(db) => db.delete_product(id).await,
        }
    }

    pub async fn add_price_history(
        &self,
        entry: NewPriceHistory,
    ) -> Result<PriceHistory, DatabaseError> {
        match self {
            Database::InMemory(db) => db.add_price_history(entry),
            Database::Relational(db) => db.add_price_history(entry).await,
        }
    }

    pub async fn history_by_product(
        &self,
        product_id: u32,
    ) -> Result<Vec<PriceHistory>, DatabaseError> {
        let mut history = match self {
            Database::InMemory(db) => db.history_by_product(product_id)?,
            Database::Relational(db) => db.history_by_product(product_id).await?,
        };
        sort_chronologically(&mut history);
        Ok(history)
    }

    pub async fn create_alert(&self, alert: NewPriceAlert) -> Result<PriceAlert, DatabaseError> {
        match self {
            Database::InMemory(db) => db.create_alert(alert),
            Database::Relational(db) => db.create_alert(alert).await,
        }
    }

    pub async fn get_alert(&self, id: u32) -> Result<PriceAlert, DatabaseError> {
        match self {
            Database::InMemory(db) => db.get_alert(id),
            Database::Relational(db) => db.get_alert(id).await,
        }
    }

    pub async fn alerts_by_product(&self, product_id: u32) -> Result<Vec<PriceAlert>, DatabaseError> {
        match self {
            Database::InMemory(db) => db.alerts_by_product(product_id),
            Database::Relational(db) => db.alerts_by_product(product_id).await,
        }
    }

    pub async fn alerts_by_user(&self, user_id: u32) -> Result<Vec<PriceAlert>, DatabaseError> {
        match self {
            Database::InMemory(db) => db.alerts_by_user(user_id),
            Database::Relational(db) => db.alerts_by_user(user_id).await,
        }
    }

    pub async fn update_alert_status(
        &self,
        id: u32,
        active: bool,
    ) -> Result<PriceAlert, DatabaseError> {
        match self {
            Database::InMemory(db) => db.update_alert_status(id, active),
            Database::Relational(db) => db.update_alert_status(id, active).await,
        }
    }

    pub async fn delete_alert(&self, id: u32) -> Result<(), DatabaseError> {
        match self {
            Database::InMemory(db) => db.delete_alert(id),
            Database::Relational(db) => db.delete_alert(id).await,
        }
    }
}
