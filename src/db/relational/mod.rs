pub mod entities;

use entities::{prelude::*, *};
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeUtc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Schema, Set, TransactionTrait,
};
use tracing::info;

use crate::db::errors::DBError;
use crate::db::{
    to_key, NewPriceAlert, NewPriceHistory, NewProduct, NewUser,
    PriceAlert as InnerPriceAlert, PriceHistory as InnerPriceHistory, Product as InnerProduct,
    User as InnerUser,
};

#[derive(Debug, Default)]
pub struct RelationalDB {
    pub connection: DatabaseConnection,
}

fn convert_all<M, T>(models: Vec<M>) -> Result<Vec<T>, DBError>
where
    T: TryFrom<M, Error = DBError>,
{
    models.into_iter().map(T::try_from).collect()
}

impl RelationalDB {
    pub fn init(connection: DatabaseConnection) -> Self {
        Self { connection }
    }

    /// Creates every table that does not exist yet, parents first.
    pub async fn ensure_schema(&self) -> Result<(), DBError> {
        let backend = self.connection.get_database_backend();
        let schema = Schema::new(backend);
        let mut statements = vec![
            schema.create_table_from_entity(User),
            schema.create_table_from_entity(Product),
            schema.create_table_from_entity(PriceHistory),
            schema.create_table_from_entity(PriceAlert),
        ];
        for statement in statements.iter_mut() {
            statement.if_not_exists();
            self.connection.execute(backend.build(&*statement)).await?;
        }
        info!("relational schema is ready");
        Ok(())
    }

    pub async fn create_user(&self, new_user: NewUser) -> Result<InnerUser, DBError> {
        if self.get_user_by_username(&new_user.username).await?.is_some() {
            return Err(DBError::DuplicateUsername);
        }
        if self.get_user_by_email(&new_user.email).await?.is_some() {
            return Err(DBError::DuplicateEmail);
        }
        let user = user::ActiveModel {
            username: Set(new_user.username),
            email: Set(new_user.email),
            password_hash: Set(new_user.password_hash),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        }
        .insert(&self.connection)
        .await?;
        user.try_into()
    }

    pub async fn get_user(&self, id: u32) -> Result<InnerUser, DBError> {
        let user = User::find_by_id(to_key(id)?).one(&self.connection).await?;
        match user {
            None => Err(DBError::UserNotFound),
            Some(user) => user.try_into(),
        }
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<InnerUser>, DBError> {
        User::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.connection)
            .await?
            .map(InnerUser::try_from)
            .transpose()
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<InnerUser>, DBError> {
        User::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.connection)
            .await?
            .map(InnerUser::try_from)
            .transpose()
    }

    pub async fn create_product(&self, new_product: NewProduct) -> Result<InnerProduct, DBError> {
        self.get_user(new_product.user_id).await?;
        let product = product::ActiveModel {
            user_id: Set(to_key(new_product.user_id)?),
            url: Set(new_product.url),
            name: Set(new_product.name),
            image_url: Set(new_product.image_url),
            current_price: Set(new_product.current_price),
            currency: Set(new_product.currency),
            last_checked: Set(new_product.created_at),
            created_at: Set(new_product.created_at),
            ..Default::default()
        }
        .insert(&self.connection)
        .await?;
        product.try_into()
    }

    async fn find_product(&self, id: u32) -> Result<product::Model, DBError> {
        Product::find_by_id(to_key(id)?)
            .one(&self.connection)
            .await?
            .ok_or(DBError::ProductNotFound)
    }

    pub async fn get_product(&self, id: u32) -> Result<InnerProduct, DBError> {
        self.find_product(id).await?.try_into()
    }

    pub async fn products_by_user(&self, user_id: u32) -> Result<Vec<InnerProduct>, DBError> {
        let products = Product::find()
            .filter(product::Column::UserId.eq(to_key(user_id)?))
            .order_by_asc(product::Column::Id)
            .all(&self.connection)
            .await?;
        convert_all(products)
    }

    pub async fn all_products(&self) -> Result<Vec<InnerProduct>, DBError> {
        let products = Product::find()
            .order_by_asc(product::Column::Id)
            .all(&self.connection)
            .await?;
        convert_all(products)
    }

    pub async fn update_product_price(
        &self,
        id: u32,
        price: Decimal,
        checked_at: DateTimeUtc,
    ) -> Result<InnerProduct, DBError> {
        let mut product: product::ActiveModel = self.find_product(id).await?.into();
        product.current_price = Set(price);
        product.last_checked = Set(checked_at);
        product.update(&self.connection).await?.try_into()
    }

    pub async fn delete_product(&self, id: u32) -> Result<(), DBError> {
        let key = to_key(id)?;
        let txn = self.connection.begin().await?;
        PriceHistory::delete_many()
            .filter(price_history::Column::ProductId.eq(key))
            .exec(&txn)
            .await?;
        PriceAlert::delete_many()
            .filter(price_alert::Column::ProductId.eq(key))
            .exec(&txn)
            .await?;
        let deleted = Product::delete_by_id(key).exec(&txn).await?;
        if deleted.rows_affected == 0 {
            txn.rollback().await?;
            return Err(DBError::ProductNotFound);
        }
        txn.commit().await?;
        Ok(())
    }

    pub async fn add_price_history(
        &self,
        entry: NewPriceHistory,
    ) -> Result<InnerPriceHistory, DBError> {
        self.find_product(entry.product_id).await?;
        price_history::ActiveModel {
            product_id: Set(to_key(entry.product_id)?),
            price: Set(entry.price),
            timestamp: Set(entry.timestamp),
            ..Default::default()
        }
        .insert(&self.connection)
        .await?
        .try_into()
    }

    pub async fn history_by_product(
        &self,
        product_id: u32,
    ) -> Result<Vec<InnerPriceHistory>, DBError> {
        let history = PriceHistory::find()
            .filter(price_history::Column::ProductId.eq(to_key(product_id)?))
            .order_by_asc(price_history::Column::Timestamp)
            .order_by_asc(price_history::Column::Id)
            .all(&self.connection)
            .await?;
        convert_all(history)
    }

    pub async fn create_alert(&self, alert: NewPriceAlert) -> Result<InnerPriceAlert, DBError> {
        self.find_product(alert.product_id).await?;
        price_alert::ActiveModel {
            product_id: Set(to_key(alert.product_id)?),
            target_price: Set(alert.target_price),
            active: Set(alert.active),
            created_at: Set(alert.created_at),
            ..Default::default()
        }
        .insert(&self.connection)
        .await?
        .try_into()
    }

    async fn find_alert(&self, id: u32) -> Result<price_alert::Model, DBError> {
        PriceAlert::find_by_id(to_key(id)?)
            .one(&self.connection)
            .await?
            .ok_or(DBError::AlertNotFound)
    }

    pub async fn get_alert(&self, id: u32) -> Result<InnerPriceAlert, DBError> {
        self.find_alert(id).await?.try_into()
    }

    pub async fn alerts_by_product(&self, product_id: u32) -> Result<Vec<InnerPriceAlert>, DBError> {
        let alerts = PriceAlert::find()
            .filter(price_alert::Column::ProductId.eq(to_key(product_id)?))
            .order_by_asc(price_alert::Column::Id)
            .all(&self.connection)
            .await?;
        convert_all(alerts)
    }

    pub async fn alerts_by_user(&self, user_id: u32) -> Result<Vec<InnerPriceAlert>, DBError> {
        let product_ids = self
            .products_by_user(user_id)
            .await?
            .iter()
            .map(|product| to_key(product.id))
            .collect::<Result<Vec<i32>, DBError>>()?;
        if product_ids.is_empty() {
            return Ok(vec![]);
        }
        let alerts = PriceAlert::find()
            .filter(price_alert::Column::ProductId.is_in(product_ids))
            .order_by_asc(price_alert::Column::Id)
            .all(&self.connection)
            .await?;
        convert_all(alerts)
    }

    pub async fn update_alert_status(
        &self,
        id: u32,
        active: bool,
    ) -> Result<InnerPriceAlert, DBError> {
        let mut alert: price_alert::ActiveModel = self.find_alert(id).await?.into();
        alert.active = Set(active);
        alert.update(&self.connection).await?.try_into()
    }

    pub async fn delete_alert(&self, id: u32) -> Result<(), DBError> {
        let deleted = PriceAlert::delete_by_id(to_key(id)?)
            .exec(&self.connection)
            .await?;
        if deleted.rows_affected == 0 {
            return Err(DBError::AlertNotFound);
        }
        Ok(())
    }
}
