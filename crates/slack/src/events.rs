use std::{any::Any, collections::HashMap, fmt, panic::AssertUnwindSafe, sync::Arc};

use async_trait::async_trait;
use futures::FutureExt;
use thiserror::Error;
use todobot_core::errors::ApplicationError;
use tracing::{debug, error, info, warn};

use crate::{
    client::{Responder, SlackApi, SlackApiError},
    commands::{normalize_command_name, SlashCommandPayload},
    transport::Acknowledger,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlackEnvelope {
    pub envelope_id: String,
    pub event: SlackEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlackEvent {
    SlashCommand(SlashCommandPayload),
    BlockAction(BlockActionEvent),
    ViewSubmission(ViewSubmissionEvent),
    Unsupported { event_type: String },
}

impl SlackEvent {
    /// Routing key, or `None` for events no handler can claim.
    pub fn key(&self) -> Option<EventKey> {
        match self {
            Self::SlashCommand(payload) => {
                Some(EventKey::Command(normalize_command_name(&payload.command)))
            }
            Self::BlockAction(action) => Some(EventKey::Action(action.action_id.clone())),
            Self::ViewSubmission(view) => Some(EventKey::View(view.callback_id.clone())),
            Self::Unsupported { .. } => None,
        }
    }

    pub fn response_url(&self) -> Option<&str> {
        match self {
            Self::SlashCommand(payload) => Some(payload.response_url.as_str()),
            Self::BlockAction(action) => action.response_url.as_deref(),
            Self::ViewSubmission(_) | Self::Unsupported { .. } => None,
        }
        .filter(|url| !url.is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKey {
    Command(String),
    Action(String),
    View(String),
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command(name) => write!(f, "command:{name}"),
            Self::Action(action_id) => write!(f, "action:{action_id}"),
            Self::View(callback_id) => write!(f, "view:{callback_id}"),
        }
    }
}

/// One interactive element event out of a `block_actions` payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockActionEvent {
    pub user_id: String,
    pub action_id: String,
    /// Button `value`, or the `selected_option.value` of a static select.
    pub value: Option<String>,
    pub response_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewSubmissionEvent {
    pub callback_id: String,
    pub user_id: String,
    pub private_metadata: String,
    /// Submitted input values keyed by block id, then action id.
    pub values: HashMap<String, HashMap<String, String>>,
}

impl ViewSubmissionEvent {
    pub fn input_value(&self, block_id: &str, action_id: &str) -> Option<&str> {
        self.values.get(block_id)?.get(action_id).map(String::as_str)
    }
}

#[derive(Clone)]
pub struct EventContext {
    pub correlation_id: String,
    pub api: Arc<dyn SlackApi>,
    pub responder: Responder,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Replied,
    Processed,
    Ignored,
    Failed,
}

#[derive(Debug, Error)]
pub enum EventHandlerError {
    #[error(transparent)]
    Service(#[from] ApplicationError),
    #[error(transparent)]
    Api(#[from] SlackApiError),
    #[error("event payload is missing `{0}`")]
    MissingField(&'static str),
}

impl EventHandlerError {
    /// Stable short label used as a structured log field.
    pub fn class(&self) -> &'static str {
        match self {
            Self::Service(error) => error.class(),
            Self::Api(_) => "slack_api",
            Self::MissingField(_) => "payload",
        }
    }
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn key(&self) -> EventKey;
    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

pub struct EventDispatcher {
    handlers: HashMap<EventKey, Arc<dyn EventHandler>>,
    api: Arc<dyn SlackApi>,
}

impl EventDispatcher {
    pub fn new(api: Arc<dyn SlackApi>) -> Self {
        Self { handlers: HashMap::new(), api }
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.key(), Arc::new(handler));
    }

    /// Acknowledges the envelope, then runs its handler. Never fails: handler
    /// errors and panics are logged and reported as [`HandlerResult::Failed`].
    pub async fn dispatch(
        &self,
        envelope: &SlackEnvelope,
        acknowledger: &dyn Acknowledger,
    ) -> HandlerResult {
        let key = envelope.event.key();
        let event_key = key.as_ref().map_or_else(|| "unsupported".to_owned(), ToString::to_string);

        info!(
            event_name = "ingress.slack.envelope_received",
            correlation_id = %envelope.envelope_id,
            event_key = %event_key,
            "received slack envelope"
        );

        if let Err(error) = acknowledger.acknowledge().await {
            warn!(
                event_name = "ingress.slack.ack_sent",
                correlation_id = %envelope.envelope_id,
                event_key = %event_key,
                error = %error,
                "failed to acknowledge slack envelope"
            );
        } else {
            debug!(
                event_name = "ingress.slack.ack_sent",
                correlation_id = %envelope.envelope_id,
                event_key = %event_key,
                "acknowledged slack envelope"
            );
        }

        let Some(handler) = key.and_then(|key| self.handlers.get(&key)) else {
            debug!(
                correlation_id = %envelope.envelope_id,
                event_key = %event_key,
                "no handler registered; ignoring envelope"
            );
            return HandlerResult::Ignored;
        };

        let context = EventContext {
            correlation_id: envelope.envelope_id.clone(),
            api: self.api.clone(),
            responder: Responder::new(
                self.api.clone(),
                envelope.event.response_url().map(str::to_owned),
            ),
        };

        let outcome = AssertUnwindSafe(handler.handle(envelope, &context)).catch_unwind().await;
        match outcome {
            Ok(Ok(result)) => {
                info!(
                    event_name = "slack.handler.completed",
                    correlation_id = %envelope.envelope_id,
                    event_key = %event_key,
                    result = ?result,
                    "handler completed"
                );
                result
            }
            Ok(Err(error)) => {
                error!(
                    event_name = "slack.handler.failed",
                    correlation_id = %envelope.envelope_id,
                    event_key = %event_key,
                    error_class = error.class(),
                    error = %error,
                    "handler failed; reply dropped"
                );
                HandlerResult::Failed
            }
            Err(panic) => {
                error!(
                    event_name = "slack.handler.failed",
                    correlation_id = %envelope.envelope_id,
                    event_key = %event_key,
                    error_class = "panic",
                    error = panic_message(&*panic),
                    "handler panicked; reply dropped"
                );
                HandlerResult::Failed
            }
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn handles(&self, key: &EventKey) -> bool {
        self.handlers.contains_key(key)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
