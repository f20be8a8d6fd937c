pub mod config;
pub mod domain;
pub mod errors;
pub mod todos;

pub use domain::todo::{Todo, TodoId};
pub use errors::ApplicationError;
pub use todos::{TodoRepository, TodoService};
