use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use todobot_core::config::SlackConfig;
use tracing::debug;

use crate::blocks::{MessageTemplate, ModalView};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum SlackApiError {
    #[error("slack http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("slack api `{method}` returned error `{error}`")]
    Platform { method: String, error: String },
    #[error("slack `{target}` answered with status {status}")]
    Status { target: String, status: u16 },
    #[error("event carried no response_url to reply through")]
    MissingResponseUrl,
}

/// Outbound half of the Slack transport.
#[async_trait]
pub trait SlackApi: Send + Sync {
    async fn open_view(&self, trigger_id: &str, view: &ModalView) -> Result<(), SlackApiError>;

    async fn post_ephemeral(
        &self,
        channel_id: &str,
        user_id: &str,
        message: &MessageTemplate,
    ) -> Result<(), SlackApiError>;

    async fn respond(
        &self,
        response_url: &str,
        message: &MessageTemplate,
    ) -> Result<(), SlackApiError>;
}

#[derive(Serialize)]
struct OpenViewRequest<'a> {
    trigger_id: &'a str,
    view: &'a ModalView,
}

#[derive(Serialize)]
struct PostEphemeralRequest<'a> {
    channel: &'a str,
    user: &'a str,
    #[serde(flatten)]
    message: &'a MessageTemplate,
}

#[derive(Serialize)]
struct ResponseUrlRequest<'a> {
    response_type: &'static str,
    #[serde(flatten)]
    message: &'a MessageTemplate,
}

#[derive(Deserialize)]
struct WebApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// `SlackApi` over the Slack Web API, authenticated with the bot token.
pub struct WebApiClient {
    http: reqwest::Client,
    base_url: String,
    bot_token: SecretString,
}

impl WebApiClient {
    pub fn new(
        bot_token: SecretString,
        base_url: impl Into<String>,
    ) -> Result<Self, SlackApiError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Ok(Self { http, base_url, bot_token })
    }

    pub fn from_config(config: &SlackConfig) -> Result<Self, SlackApiError> {
        Self::new(config.bot_token.clone(), config.api_base_url.clone())
    }

    async fn call<T>(&self, method: &str, body: &T) -> Result<(), SlackApiError>
    where
        T: Serialize + ?Sized + Sync,
    {
        let url = format!("{}/{method}", self.base_url);
        let response = self
            .http
            .post(url)
            .bearer_auth(self.bot_token.expose_secret())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SlackApiError::Status {
                target: method.to_owned(),
                status: status.as_u16(),
            });
        }

        let reply: WebApiResponse = response.json().await?;
        if reply.ok {
            debug!(event_name = "egress.slack.api_call", method, "slack api call succeeded");
            Ok(())
        } else {
            Err(SlackApiError::Platform {
                method: method.to_owned(),
                error: reply.error.unwrap_or_else(|| "unknown_error".to_owned()),
            })
        }
    }
}

#[async_trait]
impl SlackApi for WebApiClient {
    async fn open_view(&self, trigger_id: &str, view: &ModalView) -> Result<(), SlackApiError> {
        self.call("views.open", &OpenViewRequest { trigger_id, view }).await
    }

    async fn post_ephemeral(
        &self,
        channel_id: &str,
        user_id: &str,
        message: &MessageTemplate,
    ) -> Result<(), SlackApiError> {
        self.call(
            "chat.postEphemeral",
            &PostEphemeralRequest { channel: channel_id, user: user_id, message },
        )
        .await
    }

    async fn respond(
        &self,
        response_url: &str,
        message: &MessageTemplate,
    ) -> Result<(), SlackApiError> {
        // response_url hooks answer with a bare `ok`, so only the status is checked.
        let response = self
            .http
            .post(response_url)
            .json(&ResponseUrlRequest { response_type: "ephemeral", message })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SlackApiError::Status {
                target: "response_url".to_owned(),
                status: status.as_u16(),
            });
        }
        debug!(event_name = "egress.slack.respond", "response_url reply delivered");
        Ok(())
    }
}

/// Reply channel bound to one inbound event.
#[derive(Clone)]
pub struct Responder {
    api: Arc<dyn SlackApi>,
    response_url: Option<String>,
}

impl Responder {
    pub fn new(api: Arc<dyn SlackApi>, response_url: Option<String>) -> Self {
        Self { api, response_url }
    }

    pub async fn respond(&self, message: &MessageTemplate) -> Result<(), SlackApiError> {
        let Some(response_url) = self.response_url.as_deref() else {
            return Err(SlackApiError::MissingResponseUrl);
        };
        self.api.respond(response_url, message).await
    }
}
