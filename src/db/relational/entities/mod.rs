pub mod prelude;

pub mod price_alert;
pub mod price_history;
pub mod product;
pub mod user;
