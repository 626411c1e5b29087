use crate::db::errors::DBError;
use crate::db::{
    NewPriceAlert, NewPriceHistory, NewProduct, NewUser, PriceAlert, PriceHistory, Product, User,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::RwLock;

/// Hands out identifiers for one table, starting at 1.
#[derive(Debug, Default)]
pub struct IdSequence(AtomicU32);

impl IdSequence {
    pub fn next_id(&self) -> u32 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[derive(Debug, Default)]
pub struct InMemoryDB {
    pub users: RwLock<BTreeMap<u32, User>>,
    pub products: RwLock<BTreeMap<u32, Product>>,
    pub price_history: RwLock<BTreeMap<u32, PriceHistory>>,
    pub price_alerts: RwLock<BTreeMap<u32, PriceAlert>>,
    user_ids: IdSequence,
    product_ids: IdSequence,
    history_ids: IdSequence,
    alert_ids: IdSequence,
}

impl InMemoryDB {
    pub fn create_user(&self, new_user: NewUser) -> Result<User, DBError> {
        let mut users = self.users.write()?;
        if users.values().any(|user| user.username == new_user.username) {
            return Err(DBError::DuplicateUsername);
        }
        if users.values().any(|user| user.email == new_user.email) {
            return Err(DBError::DuplicateEmail);
        }
        let user = User {
            id: self.user_ids.next_id(),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            created_at: Utc::now(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    pub fn get_user(&self, id: u32) -> Result<User, DBError> {
        let users = self.users.read()?;
        users.get(&id).cloned().ok_or(DBError::UserNotFound)
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>, DBError> {
        let users = self.users.read()?;
        Ok(users.values().find(|user| user.username == username).cloned())
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DBError> {
        let users = self.users.read()?;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    pub fn create_product(&self, new_product: NewProduct) -> Result<Product, DBError> {
        self.get_user(new_product.user_id)?;
        let product = Product {
            id: self.product_ids.next_id(),
            user_id: new_product.user_id,
            url: new_product.url,
            name: new_product.name,
            image_url: new_product.image_url,
            current_price: new_product.current_price,
            currency: new_product.currency,
            last_checked: new_product.created_at,
            created_at: new_product.created_at,
        };
        let mut products = self.products.write()?;
        products.insert(product.id, product.clone());
        Ok(product)
    }

    pub fn get_product(&self, id: u32) -> Result<Product, DBError> {
        let products = self.products.read()?;
        products.get(&id).cloned().ok_or(DBError::ProductNotFound)
    }

    pub fn products_by_user(&self, user_id: u32) -> Result<Vec<Product>, DBError> {
        let products = self.products.read()?;
        Ok(products
            .values()
            .filter(|product| product.is_owned_by(user_id))
            .cloned()
            .collect())
    }

    pub fn all_products(&self) -> Result<Vec<Product>, DBError> {
        let products = self.products.read()?;
        Ok(products.values().cloned().collect())
    }

    pub fn update_product_price(
        &self,
        id: u32,
        price: Decimal,
        checked_at: DateTime<Utc>,
    ) -> Result<Product, DBError> {
        let mut products = self.products.write()?;
        let product = products.get_mut(&id).ok_or(DBError::ProductNotFound)?;
        product.current_price = price;
        product.last_checked = checked_at;
        Ok(product.clone())
    }

    pub fn delete_product(&self, id: u32) -> Result<(), DBError> {
        let mut products = self.products.write()?;
        if products.remove(&id).is_none() {
            return Err(DBError::ProductNotFound);
        }
        self.price_history
            .write()?
            .retain(|_, entry| entry.product_id != id);
        self.price_alerts
            .write()?
            .retain(|_, alert| alert.product_id != id);
        Ok(())
    }

    pub fn add_price_history(&self, entry: NewPriceHistory) -> Result<PriceHistory, DBError> {
        let products = self.products.read()?;
        if !products.contains_key(&entry.product_id) {
            return Err(DBError::ProductNotFound);
        }
        let entry = PriceHistory {
            id: self.history_ids.next_id(),
            product_id: entry.product_id,
            price: entry.price,
            timestamp: entry.timestamp,
        };
        self.price_history.write()?.insert(entry.id, entry.clone());
        Ok(entry)
    }

    pub fn history_by_product(&self, product_id: u32) -> Result<Vec<PriceHistory>, DBError> {
        let history = self.price_history.read()?;
        Ok(history
            .values()
            .filter(|entry| entry.product_id == product_id)
            .cloned()
            .collect())
    }

    pub fn create_alert(&self, alert: NewPriceAlert) -> Result<PriceAlert, DBError> {
        let products = self.products.read()?;
        if !products.contains_key(&alert.product_id) {
            return Err(DBError::ProductNotFound);
        }
        let alert = PriceAlert {
            id: self.alert_ids.next_id(),
            product_id: alert.product_id,
            target_price: alert.target_price,
            active: alert.active,
            created_at: alert.created_at,
        };
        self.price_alerts.write()?.insert(alert.id, alert.clone());
        Ok(alert)
    }

    pub fn get_alert(&self, id: u32) -> Result<PriceAlert, DBError> {
        let alerts = self.price_alerts.read()?;
        alerts.get(&id).cloned().ok_or(DBError::AlertNotFound)
    }

    pub fn alerts_by_product(&self, product_id: u32) -> Result<Vec<PriceAlert>, DBError> {
        let alerts = self.price_alerts.read()?;
        Ok(alerts
            .values()
            .filter(|alert| alert.product_id == product_id)
            .cloned()
            .collect())
    }

    pub fn alerts_by_user(&self, user_id: u32) -> Result<Vec<PriceAlert>, DBError> {
        let owned: Vec<u32> = self
            .products_by_user(user_id)?
            .into_iter()
            .map(|product| product.id)
            .collect();
        let alerts = self.price_alerts.read()?;
        Ok(alerts
            .values()
            .filter(|alert| owned.contains(&alert.product_id))
            .cloned()
            .collect())
    }

    pub fn update_alert_status(&self, id: u32, active: bool) -> Result<PriceAlert, DBError> {
        let mut alerts = self.price_alerts.write()?;
        let alert = alerts.get_mut(&id).ok_or(DBError::AlertNotFound)?;
        alert.active = active;
        Ok(alert.clone())
    }

    pub fn delete_alert(&self, id: u32) -> Result<(), DBError> {
        let mut alerts = self.price_alerts.write()?;
        alerts
            .remove(&id)
            .map(|_| ())
            .ok_or(DBError::AlertNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    fn new_product(user_id: u32, price: Decimal) -> NewProduct {
        NewProduct {
            user_id,
            url: "https://www.amazon.com/dp/B000123".to_string(),
            name: "Kettle".to_string(),
            image_url: None,
            current_price: price,
            currency: "USD".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn ids_increase_from_one() {
        let db = InMemoryDB::default();
        let alice = db
            .create_user(new_user("alice", "alice@example.com"))
            .expect("Failed to create user");
        let bob = db
            .create_user(new_user("bob", "bob@example.com"))
            .expect("Failed to create user");
        assert_eq!(alice.id, 1);
        assert_eq!(bob.id, 2);
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let db = InMemoryDB::default();
        db.create_user(new_user("alice", "alice@example.com"))
            .expect("Failed to create user");
        let result = db.create_user(new_user("alice", "other@example.com"));
        assert!(matches!(result, Err(DBError::DuplicateUsername)));
        assert_eq!(db.users.read().unwrap().len(), 1);
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let db = InMemoryDB::default();
        db.create_user(new_user("alice", "alice@example.com"))
            .expect("Failed to create user");
        let result = db.create_user(new_user("bob", "alice@example.com"));
        assert!(matches!(result, Err(DBError::DuplicateEmail)));
        assert_eq!(db.users.read().unwrap().len(), 1);
    }

    #[test]
    fn product_requires_existing_owner() {
        let db = InMemoryDB::default();
        let result = db.create_product(new_product(9, Decimal::ONE));
        assert!(matches!(result, Err(DBError::UserNotFound)));
    }

    #[test]
    fn products_by_user_is_scoped() {
        let db = InMemoryDB::default();
        let alice = db
            .create_user(new_user("alice", "alice@example.com"))
            .expect("Failed to create user");
        let bob = db
            .create_user(new_user("bob", "bob@example.com"))
            .expect("Failed to create user");
        db.create_product(new_product(alice.id, Decimal::ONE))
            .expect("Failed to create product");
        db.create_product(new_product(bob.id, Decimal::TEN))
            .expect("Failed to create product");
        let products = db.products_by_user(alice.id).expect("Failed to list");
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].user_id, alice.id);
    }

    #[test]
    fn update_missing_product_is_not_found() {
        let db = InMemoryDB::default();
        let result = db.update_product_price(4, Decimal::ONE, Utc::now());
        assert!(matches!(result, Err(DBError::ProductNotFound)));
        assert!(matches!(db.delete_product(4), Err(DBError::ProductNotFound)));
    }

    #[test]
    fn delete_product_cascades() {
        let db = InMemoryDB::default();
        let alice = db
            .create_user(new_user("alice", "alice@example.com"))
            .expect("Failed to create user");
        let kept = db
            .create_product(new_product(alice.id, Decimal::TEN))
            .expect("Failed to create product");
        let removed = db
            .create_product(new_product(alice.id, Decimal::ONE))
            .expect("Failed to create product");
        for product in [&kept, &removed] {
            db.add_price_history(NewPriceHistory {
                product_id: product.id,
                price: product.current_price,
                timestamp: Utc::now(),
            })
            .expect("Failed to add history");
            db.create_alert(NewPriceAlert {
                product_id: product.id,
                target_price: Decimal::ONE,
                active: true,
                created_at: Utc::now(),
            })
            .expect("Failed to add alert");
        }

        db.delete_product(removed.id).expect("Failed to delete");

        assert!(db.get_product(removed.id).is_err());
        assert!(db.history_by_product(removed.id).unwrap().is_empty());
        assert!(db.alerts_by_product(removed.id).unwrap().is_empty());
        assert_eq!(db.history_by_product(kept.id).unwrap().len(), 1);
        assert_eq!(db.alerts_by_product(kept.id).unwrap().len(), 1);
    }

    #[test]
    fn alerts_require_existing_product() {
        let db = InMemoryDB::default();
        let result = db.create_alert(NewPriceAlert {
            product_id: 1,
            target_price: Decimal::ONE,
            active: true,
            created_at: Utc::now(),
        });
        assert!(matches!(result, Err(DBError::ProductNotFound)));
    }

    #[test]
    fn alert_status_update_and_delete_work() {
        let db = InMemoryDB::default();
        let alice = db
            .create_user(new_user("alice", "alice@example.com"))
            .expect("Failed to create user");
        let product = db
            .create_product(new_product(alice.id, Decimal::TEN))
            .expect("Failed to create product");
        let alert = db
            .create_alert(NewPriceAlert {
                product_id: product.id,
                target_price: Decimal::new(900, 2),
                active: true,
                created_at: Utc::now(),
            })
            .expect("Failed to add alert");

        let updated = db
            .update_alert_status(alert.id, false)
            .expect("Failed to update");
        assert!(!updated.active);
        assert_eq!(db.alerts_by_user(alice.id).unwrap(), vec![updated]);

        db.delete_alert(alert.id).expect("Failed to delete");
        assert!(matches!(db.delete_alert(alert.id), Err(DBError::AlertNotFound)));
        assert!(matches!(
            db.update_alert_status(alert.id, true),
            Err(DBError::AlertNotFound)
        ));
    }
}
