use async_trait::async_trait;
use tokio::sync::RwLock;

use todobot_core::domain::todo::{Todo, TodoId};
use todobot_core::errors::ApplicationError;
use todobot_core::todos::TodoRepository;

#[derive(Default)]
pub struct InMemoryTodoRepository {
    todos: RwLock<Vec<Todo>>,
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    async fn create(&self, name: &str) -> Result<Todo, ApplicationError> {
        let todo = Todo::new(name);
        let mut todos = self.todos.write().await;
        todos.push(todo.clone());
        Ok(todo)
    }

    async fn list_all(&self) -> Result<Vec<Todo>, ApplicationError> {
        let todos = self.todos.read().await;
        Ok(todos.clone())
    }

    async fn delete_by_id(&self, id: &TodoId) -> Result<(), ApplicationError> {
        let mut todos = self.todos.write().await;
        todos.retain(|todo| &todo.id != id);
        Ok(())
    }
}
