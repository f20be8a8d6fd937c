//! Inbound HTTP payloads: request authentication and parsing into envelopes.

use std::collections::HashMap;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    commands::SlashCommandPayload,
    events::{BlockActionEvent, SlackEnvelope, SlackEvent, ViewSubmissionEvent},
    signature::{verify_signature, SignatureError},
};

pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
pub const SIGNATURE_HEADER: &str = "x-slack-signature";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IngressError {
    #[error("request signature rejected: {0}")]
    Signature(#[from] SignatureError),
    #[error("malformed request body: {0}")]
    Parse(String),
}

/// Events API body: either the one-time URL handshake or an event callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventsApiRequest {
    UrlVerification { challenge: String },
    Callback(SlackEnvelope),
}

pub fn authenticate(
    signing_secret: &SecretString,
    timestamp: Option<&str>,
    signature: Option<&str>,
    body: &[u8],
    now_unix_secs: i64,
) -> Result<(), IngressError> {
    let timestamp = timestamp.ok_or(SignatureError::MissingHeader(TIMESTAMP_HEADER))?;
    let signature = signature.ok_or(SignatureError::MissingHeader(SIGNATURE_HEADER))?;
    verify_signature(
        signing_secret.expose_secret().as_bytes(),
        timestamp,
        body,
        signature,
        now_unix_secs,
    )?;
    Ok(())
}

pub fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn parse_command_form(body: &[u8]) -> Result<SlackEnvelope, IngressError> {
    let payload: SlashCommandPayload = serde_urlencoded::from_bytes(body)
        .map_err(|error| IngressError::Parse(format!("slash command form: {error}")))?;
    Ok(SlackEnvelope {
        envelope_id: new_correlation_id(),
        event: SlackEvent::SlashCommand(payload),
    })
}

#[derive(Deserialize)]
struct InteractionForm {
    payload: String,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum InteractionPayload {
    BlockActions(BlockActionsPayload),
    ViewSubmission(ViewSubmissionPayload),
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct IdRef {
    id: String,
}

#[derive(Deserialize)]
struct BlockActionsPayload {
    user: IdRef,
    #[serde(default)]
    response_url: Option<String>,
    #[serde(default)]
    actions: Vec<ActionPayload>,
}

#[derive(Deserialize)]
struct ActionPayload {
    action_id: String,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    selected_option: Option<SelectedOption>,
}

#[derive(Deserialize)]
struct SelectedOption {
    value: String,
}

#[derive(Deserialize)]
struct ViewSubmissionPayload {
    user: IdRef,
    view: ViewPayload,
}

#[derive(Deserialize)]
struct ViewPayload {
    callback_id: String,
    #[serde(default)]
    private_metadata: String,
    #[serde(default)]
    state: ViewState,
}

#[derive(Default, Deserialize)]
struct ViewState {
    #[serde(default)]
    values: HashMap<String, HashMap<String, InputState>>,
}

#[derive(Deserialize)]
struct InputState {
    #[serde(default)]
    value: Option<String>,
}

/// Parses the `payload=<json>` form Slack posts for interactive components.
/// Only the first action of a `block_actions` payload is routed.
pub fn parse_interaction_form(body: &[u8]) -> Result<SlackEnvelope, IngressError> {
    let form: InteractionForm = serde_urlencoded::from_bytes(body)
        .map_err(|error| IngressError::Parse(format!("interaction form: {error}")))?;
    let payload: InteractionPayload = serde_json::from_str(&form.payload)
        .map_err(|error| IngressError::Parse(format!("interaction payload: {error}")))?;

    let event = match payload {
        InteractionPayload::BlockActions(payload) => block_action_event(payload),
        InteractionPayload::ViewSubmission(payload) => view_submission_event(payload),
        InteractionPayload::Other => {
            SlackEvent::Unsupported { event_type: interaction_type(&form.payload) }
        }
    };

    Ok(SlackEnvelope { envelope_id: new_correlation_id(), event })
}

fn block_action_event(payload: BlockActionsPayload) -> SlackEvent {
    let Some(action) = payload.actions.into_iter().next() else {
        return SlackEvent::Unsupported { event_type: "block_actions".to_owned() };
    };
    let value = action.selected_option.map(|option| option.value).or(action.value);

    SlackEvent::BlockAction(BlockActionEvent {
        user_id: payload.user.id,
        action_id: action.action_id,
        value,
        response_url: payload.response_url,
    })
}

fn view_submission_event(payload: ViewSubmissionPayload) -> SlackEvent {
    let values = payload
        .view
        .state
        .values
        .into_iter()
        .map(|(block_id, inputs)| {
            let inputs = inputs
                .into_iter()
                .filter_map(|(action_id, input)| input.value.map(|value| (action_id, value)))
                .collect();
            (block_id, inputs)
        })
        .collect();

    SlackEvent::ViewSubmission(ViewSubmissionEvent {
        callback_id: payload.view.callback_id,
        user_id: payload.user.id,
        private_metadata: payload.view.private_metadata,
        values,
    })
}

fn interaction_type(payload: &str) -> String {
    serde_json::from_str::<serde_json::Value>(payload)
        .ok()
        .and_then(|value| value.get("type").and_then(|kind| kind.as_str()).map(str::to_owned))
        .unwrap_or_else(|| "unknown".to_owned())
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum EventsApiBody {
    UrlVerification {
        challenge: String,
    },
    EventCallback {
        #[serde(default)]
        event_id: Option<String>,
        event: serde_json::Value,
    },
    #[serde(other)]
    Other,
}

pub fn parse_events_body(body: &[u8]) -> Result<EventsApiRequest, IngressError> {
    let parsed: EventsApiBody = serde_json::from_slice(body)
        .map_err(|error| IngressError::Parse(format!("events api body: {error}")))?;

    Ok(match parsed {
        EventsApiBody::UrlVerification { challenge } => {
            EventsApiRequest::UrlVerification { challenge }
        }
        EventsApiBody::EventCallback { event_id, event } => {
            let event_type = event
                .get("type")
                .and_then(|kind| kind.as_str())
                .unwrap_or("unknown")
                .to_owned();
            EventsApiRequest::Callback(SlackEnvelope {
                envelope_id: event_id.unwrap_or_else(new_correlation_id),
                event: SlackEvent::Unsupported { event_type },
            })
        }
        EventsApiBody::Other => EventsApiRequest::Callback(SlackEnvelope {
            envelope_id: new_correlation_id(),
            event: SlackEvent::Unsupported { event_type: "unknown".to_owned() },
        }),
    })
}
