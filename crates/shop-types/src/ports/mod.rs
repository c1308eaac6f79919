pub mod order_repository;
pub mod product_repository;
pub mod user_repository;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("db error: {0}")]
    DbError(String),
}

/// A backend that can hold every document kind the shop needs.
pub trait Store:
    user_repository::UserRepository
    + product_repository::ProductRepository
    + order_repository::OrderRepository
{
}

impl<T> Store for T where
    T: user_repository::UserRepository
        + product_repository::ProductRepository
        + order_repository::OrderRepository
{
}
