use std::{sync::Arc, time::Duration};

use axum::Router;
use todobot_core::config::AppConfig;
use todobot_core::todos::{TodoRepository, TodoService};
use todobot_db::{connect, migrations, DbPool, SqlTodoRepository, UnavailableTodoRepository};
use todobot_slack::{
    client::{SlackApi, SlackApiError, WebApiClient},
    events::EventDispatcher,
    handlers::todo_dispatcher,
};
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::{health, receiver};

pub struct Application {
    pub config: AppConfig,
    /// `None` when the store could not be opened at startup.
    pub db_pool: Option<DbPool>,
    pub dispatcher: Arc<EventDispatcher>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("slack web api client could not be built: {0}")]
    SlackClient(#[from] SlackApiError),
}

#[derive(Debug, Error)]
enum StoreError {
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

impl Application {
    pub fn router(&self) -> Router {
        let receiver_state = receiver::ReceiverState::new(
            self.dispatcher.clone(),
            self.config.slack.signing_secret.clone(),
            Duration::from_millis(self.config.server.ack_timeout_ms),
        );

        receiver::router(receiver_state)
            .merge(health::router(self.db_pool.clone()))
            .layer(TraceLayer::new_for_http())
    }
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let (db_pool, repository): (Option<DbPool>, Arc<dyn TodoRepository>) =
        match open_store(&config).await {
            Ok(pool) => (Some(pool.clone()), Arc::new(SqlTodoRepository::new(pool))),
            Err(store_error) => {
                error!(
                    event_name = "system.bootstrap.store_unavailable",
                    correlation_id = "bootstrap",
                    error = %store_error,
                    "todo store unavailable; continuing without persistence"
                );
                (None, Arc::new(UnavailableTodoRepository::new(store_error.to_string())))
            }
        };

    let todo_service = TodoService::new(repository);
    let api: Arc<dyn SlackApi> = Arc::new(WebApiClient::from_config(&config.slack)?);
    let dispatcher = Arc::new(todo_dispatcher(todo_service, api));

    info!(
        event_name = "system.bootstrap.dispatcher_ready",
        correlation_id = "bootstrap",
        handler_count = dispatcher.handler_count(),
        "event dispatcher initialized"
    );

    Ok(Application { config, db_pool, dispatcher })
}

async fn open_store(config: &AppConfig) -> Result<DbPool, StoreError> {
    let db_pool = connect(&config.database).await.map_err(StoreError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(StoreError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    Ok(db_pool)
}
