use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::todo::{Todo, TodoId};
use crate::errors::ApplicationError;

/// Record store for todos.
///
/// `delete_by_id` matches the store-assigned id exactly and treats a missing
/// record as success.
#[async_trait]
pub trait TodoRepository: Send + Sync {
    async fn create(&self, name: &str) -> Result<Todo, ApplicationError>;
    async fn list_all(&self) -> Result<Vec<Todo>, ApplicationError>;
    async fn delete_by_id(&self, id: &TodoId) -> Result<(), ApplicationError>;
}

/// Façade the Slack handlers talk to. Every call is forwarded as-is; failures
/// come back unchanged.
#[derive(Clone)]
pub struct TodoService {
    repository: Arc<dyn TodoRepository>,
}

impl TodoService {
    pub fn new(repository: Arc<dyn TodoRepository>) -> Self {
        Self { repository }
    }

    pub async fn create(&self, name: &str) -> Result<Todo, ApplicationError> {
        self.repository.create(name).await
    }

    pub async fn list_all(&self) -> Result<Vec<Todo>, ApplicationError> {
        self.repository.list_all().await
    }

    pub async fn delete_by_id(&self, id: &TodoId) -> Result<(), ApplicationError> {
        self.repository.delete_by_id(id).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use super::{TodoRepository, TodoService};
    use crate::domain::todo::{Todo, TodoId};
    use crate::errors::ApplicationError;

    #[derive(Default)]
    struct RecordingRepository {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TodoRepository for RecordingRepository {
        async fn create(&self, name: &str) -> Result<Todo, ApplicationError> {
            self.calls.lock().await.push(format!("create:{name}"));
            Ok(Todo::new(name))
        }

        async fn list_all(&self) -> Result<Vec<Todo>, ApplicationError> {
            self.calls.lock().await.push("list_all".to_owned());
            Ok(Vec::new())
        }

        async fn delete_by_id(&self, id: &TodoId) -> Result<(), ApplicationError> {
            self.calls.lock().await.push(format!("delete:{id}"));
            Ok(())
        }
    }

    struct BrokenRepository;

    #[async_trait]
    impl TodoRepository for BrokenRepository {
        async fn create(&self, _name: &str) -> Result<Todo, ApplicationError> {
            Err(ApplicationError::Persistence("disk full".to_owned()))
        }

        async fn list_all(&self) -> Result<Vec<Todo>, ApplicationError> {
            Err(ApplicationError::Persistence("disk full".to_owned()))
        }

        async fn delete_by_id(&self, _id: &TodoId) -> Result<(), ApplicationError> {
            Err(ApplicationError::Persistence("disk full".to_owned()))
        }
    }

    #[tokio::test]
    async fn service_forwards_each_call_once() {
        let repository = Arc::new(RecordingRepository::default());
        let service = TodoService::new(repository.clone());

        let created = service.create("Buy milk").await.expect("create");
        service.list_all().await.expect("list");
        service.delete_by_id(&TodoId::from("abc")).await.expect("delete");

        assert_eq!(created.name, "Buy milk");
        assert_eq!(
            *repository.calls.lock().await,
            vec!["create:Buy milk".to_owned(), "list_all".to_owned(), "delete:abc".to_owned()]
        );
    }

    #[tokio::test]
    async fn service_propagates_store_failures_unchanged() {
        let service = TodoService::new(Arc::new(BrokenRepository));

        let error = service.list_all().await.expect_err("list should fail");
        assert_eq!(error, ApplicationError::Persistence("disk full".to_owned()));

        let error = service.create("x").await.expect_err("create should fail");
        assert_eq!(error.class(), "persistence");
    }
}
