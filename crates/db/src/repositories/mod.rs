use thiserror::Error;

use todobot_core::errors::ApplicationError;

pub mod memory;
pub mod todo;

pub use memory::InMemoryTodoRepository;
pub use todo::{SqlTodoRepository, UnavailableTodoRepository};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        ApplicationError::Persistence(value.to_string())
    }
}
