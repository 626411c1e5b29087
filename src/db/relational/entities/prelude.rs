pub use super::price_alert::Entity as PriceAlert;
pub use super::price_history::Entity as PriceHistory;
pub use super::product::Entity as Product;
pub use super::user::Entity as User;
