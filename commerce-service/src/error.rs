use diesel_async::pooled_connection::PoolError;
use uuid::Uuid;

/// Failure of a service operation. Declines (coupon not applicable, ledger
/// switched off) are reported through the operation's outcome type instead.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("user {0} not found")]
    UserNotFound(Uuid),

    #[error("order {0} not found")]
    OrderNotFound(i64),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("transaction type {0} is not supported by this operation")]
    UnsupportedTransactionType(String),

    #[error("insufficient wallet balance for user {0}")]
    InsufficientBalance(Uuid),

    #[error("insufficient loyalty points for user {0}")]
    InsufficientPoints(Uuid),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] bb8::RunError<PoolError>),

    #[error("storage error: {0}")]
    Storage(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
