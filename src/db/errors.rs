use thiserror::Error;

#[derive(Error, Debug)]
pub enum DBError {
    #[error("transparent")]
    Relational(#[from] sea_orm::DbErr),
    #[error("unknown user")]
    UserNotFound,
    #[error("unknown product")]
    ProductNotFound,
    #[error("unknown price alert")]
    AlertNotFound,
    #[error("username already taken")]
    DuplicateUsername,
    #[error("email already registered")]
    DuplicateEmail,
    #[error("in-memory storage lock poisoned")]
    LockPoisoned,
    #[error("identifier {0} does not fit the storage key")]
    IdOutOfRange(i64),
}

impl DBError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DBError::UserNotFound
                | DBError::ProductNotFound
                | DBError::AlertNotFound
                | DBError::Relational(sea_orm::DbErr::RecordNotFound(_))
        )
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, DBError::DuplicateUsername | DBError::DuplicateEmail)
    }
}

impl<T> From<std::sync::PoisonError<T>> for DBError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        DBError::LockPoisoned
    }
}
