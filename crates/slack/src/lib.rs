//! Slack Integration - HTTP interaction bot interface
//!
//! This crate provides the Slack interface for todobot:
//! - **Ingress** (`ingress`, `signature`) - signed slash command and interaction payloads
//! - **Slash Commands** (`commands`) - `/create` and `/todo`
//! - **Events** (`events`) - envelopes, acknowledgement, and dispatch to handlers
//! - **Handlers** (`handlers`) - the todo workflows behind every command, action, and view
//! - **Block Kit** (`blocks`) - message and modal builders
//! - **Web API** (`client`) - `views.open`, `chat.postEphemeral`, and `response_url` replies
//!
//! # Getting Started
//!
//! 1. Create a Slack app at https://api.slack.com/apps
//! 2. Point slash commands and interactivity at `/slack/commands` and `/slack/actions`
//! 3. Add slash commands: `/create`, `/todo`
//! 4. Set env vars: `TODOBOT_SLACK_BOT_TOKEN`, `TODOBOT_SLACK_SIGNING_SECRET`
//!
//! # Architecture
//!
//! ```text
//! Slack HTTP → ingress → EventDispatcher ─ack→ Slack
//!                             ↓
//!                         Handlers → TodoService → Record Store
//!                             ↓
//!                  Block Kit UI → SlackApi
//! ```
//!
//! # Key Types
//!
//! - `EventDispatcher` - Acknowledges, then routes events to handlers
//! - `Acknowledger` - Transport-side ack for one envelope
//! - `SlackApi` / `Responder` - Outbound replies
//! - `MessageBuilder` / `ModalBuilder` - Block Kit construction

pub mod blocks;
pub mod client;
pub mod commands;
pub mod events;
pub mod handlers;
pub mod ingress;
pub mod signature;
pub mod transport;
