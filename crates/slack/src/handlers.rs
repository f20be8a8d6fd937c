use std::sync::Arc;

use async_trait::async_trait;
use todobot_core::domain::todo::TodoId;
use todobot_core::todos::TodoService;
use tracing::info;

use crate::{
    blocks::{
        create_todo_modal, dashboard_message, delete_confirmation_message, todo_created_message,
        todo_deleted_message, todo_list_message, CREATE_TODO_CALLBACK_ID, DELETE_TODO_ACTION_ID,
        SELECTED_TODO_ACTION_ID, TODO_INFOS_BLOCK_ID, TODO_NAME_ACTION_ID, VIEW_TODOS_ACTION_ID,
    },
    client::SlackApi,
    commands::{CREATE_COMMAND, DASHBOARD_COMMAND},
    events::{
        EventContext, EventDispatcher, EventHandler, EventHandlerError, EventKey, HandlerResult,
        SlackEnvelope, SlackEvent,
    },
};

/// Builds the dispatcher with every todo workflow registered.
pub fn todo_dispatcher(service: TodoService, api: Arc<dyn SlackApi>) -> EventDispatcher {
    let mut dispatcher = EventDispatcher::new(api);
    dispatcher.register(OpenCreateFormHandler);
    dispatcher.register(SubmitCreateFormHandler::new(service.clone()));
    dispatcher.register(OpenDashboardHandler);
    dispatcher.register(ListTodosHandler::new(service.clone()));
    dispatcher.register(SelectTodoHandler);
    dispatcher.register(DeleteTodoHandler::new(service));
    dispatcher
}

fn required<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str, EventHandlerError> {
    value.filter(|value| !value.is_empty()).ok_or(EventHandlerError::MissingField(field))
}

/// `/create`: opens the creation modal, remembering the invoking channel.
pub struct OpenCreateFormHandler;

#[async_trait]
impl EventHandler for OpenCreateFormHandler {
    fn key(&self) -> EventKey {
        EventKey::Command(CREATE_COMMAND.to_owned())
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::SlashCommand(payload) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };
        let trigger_id = required(Some(payload.trigger_id.as_str()), "trigger_id")?;

        ctx.api.open_view(trigger_id, &create_todo_modal(&payload.channel_id)).await?;
        Ok(HandlerResult::Replied)
    }
}

pub struct SubmitCreateFormHandler {
    service: TodoService,
}

impl SubmitCreateFormHandler {
    pub fn new(service: TodoService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl EventHandler for SubmitCreateFormHandler {
    fn key(&self) -> EventKey {
        EventKey::View(CREATE_TODO_CALLBACK_ID.to_owned())
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::ViewSubmission(view) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };
        // An empty input is a valid (empty) name; only an absent value is rejected.
        let name = view
            .input_value(TODO_INFOS_BLOCK_ID, TODO_NAME_ACTION_ID)
            .ok_or(EventHandlerError::MissingField("todo_infos.name_todo"))?;

        let todo = self.service.create(name).await?;
        info!(
            event_name = "todo.created",
            correlation_id = %ctx.correlation_id,
            todo_id = %todo.id,
            "todo created from modal submission"
        );

        let channel_id = required(Some(view.private_metadata.as_str()), "private_metadata")?;
        ctx.api.post_ephemeral(channel_id, &view.user_id, &todo_created_message()).await?;
        Ok(HandlerResult::Replied)
    }
}

/// `/todo`: posts the dashboard with the "View todos" button.
pub struct OpenDashboardHandler;

#[async_trait]
impl EventHandler for OpenDashboardHandler {
    fn key(&self) -> EventKey {
        EventKey::Command(DASHBOARD_COMMAND.to_owned())
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::SlashCommand(payload) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        ctx.api.post_ephemeral(&payload.channel_id, &payload.user_id, &dashboard_message()).await?;
        Ok(HandlerResult::Replied)
    }
}

pub struct ListTodosHandler {
    service: TodoService,
}

impl ListTodosHandler {
    pub fn new(service: TodoService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl EventHandler for ListTodosHandler {
    fn key(&self) -> EventKey {
        EventKey::Action(VIEW_TODOS_ACTION_ID.to_owned())
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        if !matches!(envelope.event, SlackEvent::BlockAction(_)) {
            return Ok(HandlerResult::Ignored);
        }

        let todos = self.service.list_all().await?;
        ctx.responder.respond(&todo_list_message(&todos)).await?;
        Ok(HandlerResult::Replied)
    }
}

/// Selecting a todo offers a delete button carrying its id.
pub struct SelectTodoHandler;

#[async_trait]
impl EventHandler for SelectTodoHandler {
    fn key(&self) -> EventKey {
        EventKey::Action(SELECTED_TODO_ACTION_ID.to_owned())
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::BlockAction(action) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };
        let todo_id = TodoId::from(required(action.value.as_deref(), "selected_option.value")?);

        ctx.responder.respond(&delete_confirmation_message(&todo_id)).await?;
        Ok(HandlerResult::Replied)
    }
}

pub struct DeleteTodoHandler {
    service: TodoService,
}

impl DeleteTodoHandler {
    pub fn new(service: TodoService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl EventHandler for DeleteTodoHandler {
    fn key(&self) -> EventKey {
        EventKey::Action(DELETE_TODO_ACTION_ID.to_owned())
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::BlockAction(action) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };
        let todo_id = TodoId::from(required(action.value.as_deref(), "action.value")?);

        self.service.delete_by_id(&todo_id).await?;
        info!(
            event_name = "todo.deleted",
            correlation_id = %ctx.correlation_id,
            todo_id = %todo_id,
            "todo deleted"
        );

        ctx.responder.respond(&todo_deleted_message()).await?;
        Ok(HandlerResult::Replied)
    }
}
