use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use chrono::Utc;
use secrecy::SecretString;
use todobot_slack::{
    events::{EventDispatcher, SlackEnvelope},
    ingress::{
        authenticate, parse_command_form, parse_events_body, parse_interaction_form,
        EventsApiRequest, IngressError, SIGNATURE_HEADER, TIMESTAMP_HEADER,
    },
    transport::{Acknowledger, TransportError},
};
use tokio::sync::{oneshot, Mutex};
use tracing::{info, warn};

#[derive(Clone)]
pub struct ReceiverState {
    dispatcher: Arc<EventDispatcher>,
    signing_secret: SecretString,
    ack_timeout: Duration,
}

impl ReceiverState {
    pub fn new(
        dispatcher: Arc<EventDispatcher>,
        signing_secret: SecretString,
        ack_timeout: Duration,
    ) -> Self {
        Self { dispatcher, signing_secret, ack_timeout }
    }
}

pub fn router(state: ReceiverState) -> Router {
    Router::new()
        .route("/slack/commands", post(commands))
        .route("/slack/actions", post(actions))
        .route("/slack/events", post(events))
        .with_state(state)
}

/// Completes the pending HTTP response when the dispatcher acknowledges.
pub struct HttpAcknowledger {
    sender: Mutex<Option<oneshot::Sender<()>>>,
}

impl HttpAcknowledger {
    pub fn channel() -> (Self, oneshot::Receiver<()>) {
        let (sender, receiver) = oneshot::channel();
        (Self { sender: Mutex::new(Some(sender)) }, receiver)
    }
}

#[async_trait]
impl Acknowledger for HttpAcknowledger {
    async fn acknowledge(&self) -> Result<(), TransportError> {
        let sender = self.sender.lock().await.take().ok_or(TransportError::AlreadyAcknowledged)?;
        sender.send(()).map_err(|_| {
            TransportError::Acknowledge("http request was already answered".to_owned())
        })
    }
}

async fn commands(State(state): State<ReceiverState>, headers: HeaderMap, body: Bytes) -> Response {
    match authenticate_request(&state, &headers, &body).and_then(|()| parse_command_form(&body)) {
        Ok(envelope) => dispatch_and_acknowledge(&state, envelope).await,
        Err(error) => reject(error),
    }
}

async fn actions(State(state): State<ReceiverState>, headers: HeaderMap, body: Bytes) -> Response {
    match authenticate_request(&state, &headers, &body).and_then(|()| parse_interaction_form(&body))
    {
        Ok(envelope) => dispatch_and_acknowledge(&state, envelope).await,
        Err(error) => reject(error),
    }
}

async fn events(State(state): State<ReceiverState>, headers: HeaderMap, body: Bytes) -> Response {
    match authenticate_request(&state, &headers, &body).and_then(|()| parse_events_body(&body)) {
        Ok(EventsApiRequest::UrlVerification { challenge }) => {
            info!(
                event_name = "ingress.slack.url_verification",
                correlation_id = "url_verification",
                "answered events api url verification"
            );
            challenge.into_response()
        }
        Ok(EventsApiRequest::Callback(envelope)) => {
            dispatch_and_acknowledge(&state, envelope).await
        }
        Err(error) => reject(error),
    }
}

fn authenticate_request(
    state: &ReceiverState,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(), IngressError> {
    let header = |name: &str| headers.get(name).and_then(|value| value.to_str().ok());
    authenticate(
        &state.signing_secret,
        header(TIMESTAMP_HEADER),
        header(SIGNATURE_HEADER),
        body,
        Utc::now().timestamp(),
    )
}

fn reject(error: IngressError) -> Response {
    let status = match error {
        IngressError::Signature(_) => StatusCode::UNAUTHORIZED,
        IngressError::Parse(_) => StatusCode::BAD_REQUEST,
    };
    warn!(
        event_name = "ingress.slack.rejected",
        status = status.as_u16(),
        error = %error,
        "rejected slack request"
    );
    status.into_response()
}

/// Dispatch runs detached; the response is released once the dispatcher
/// acknowledges or the ack wait bound elapses.
async fn dispatch_and_acknowledge(state: &ReceiverState, envelope: SlackEnvelope) -> Response {
    let (acknowledger, acknowledged) = HttpAcknowledger::channel();
    let dispatcher = state.dispatcher.clone();
    let correlation_id = envelope.envelope_id.clone();

    tokio::spawn(async move {
        dispatcher.dispatch(&envelope, &acknowledger).await;
    });

    match tokio::time::timeout(state.ack_timeout, acknowledged).await {
        Ok(Ok(())) => {}
        Ok(Err(_)) => warn!(
            event_name = "ingress.slack.ack_sent",
            correlation_id = %correlation_id,
            "dispatch finished without acknowledging; answering anyway"
        ),
        Err(_) => warn!(
            event_name = "ingress.slack.ack_sent",
            correlation_id = %correlation_id,
            ack_timeout_ms = state.ack_timeout.as_millis() as u64,
            "acknowledgement wait elapsed; answering anyway"
        ),
    }

    StatusCode::OK.into_response()
}
