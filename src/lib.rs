//! Status bot for the ED RP private group.
//!
//! Polls the EDRP status API for a count of currently active CMDRs and
//! republishes it as the Discord bot account's presence text. The write path
//! (logon/logoff/station/system event markers) is exposed through
//! [`api::ApiClient`] for in-process callers such as a game-telemetry plugin.
//!
//! # Architecture
//!
//! - **API client** (`api`) - typed HTTP calls against the EDRP status API
//!   with a uniform no-result failure channel
//! - **Presence updater** (`presence`) - recurring task refreshing the bot's
//!   activity text from the active-count endpoint
//! - **Bot integration** (`bot`) - Serenity event handlers and client setup
//! - **Supervisor** (`supervisor`) - classify-log-wait-restart loop around
//!   each bot run
//!
//! Supporting modules provide application infrastructure:
//!
//! - **Configuration** (`config`) - Environment-based application configuration
//! - **Error** (`error`) - Application error types
//! - **Logging** (`logging`) - File and stdout tracing output

pub mod api;
pub mod bot;
pub mod config;
pub mod error;
pub mod logging;
pub mod presence;
pub mod supervisor;
