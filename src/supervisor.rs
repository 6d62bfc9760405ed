//! Process supervision for the bot run.
//!
//! Owns the bot client lifecycle and wraps each run in a
//! classify-log-wait-restart loop. The restart policy is a pure function of
//! the caught fault, so it is testable without standing up a gateway
//! connection: ordinary session faults restart after a short delay,
//! suspected network outages after a longer one, and unrecognized faults end
//! the process. Interrupt signals are observed through `tokio::signal` and
//! shut the shards down cleanly.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::api::{ApiClient, ApiError};
use crate::bot;
use crate::config::Config;
use crate::error::Error;

/// Delay before restarting after an ordinary gateway session fault.
pub const SESSION_RESTART_DELAY: Duration = Duration::from_secs(5);

/// Delay before restarting after a suspected network outage.
pub const NETWORK_RESTART_DELAY: Duration = Duration::from_secs(60);

/// Coarse classification of a fault that ended a bot run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultClass {
    /// The gateway session dropped or was rejected.
    Session,
    /// The network path to Discord or the EDRP API looks unavailable.
    Network,
}

/// What the supervisor does with a fault.
#[derive(Debug)]
pub enum Supervision {
    /// Sleep `delay`, then start a fresh run.
    Restart {
        /// How long to wait before the next run.
        delay: Duration,
        /// Why the run is being restarted.
        reason: FaultClass,
    },
    /// The fault is not recoverable by restarting; end the process.
    Fatal,
}

/// Supervisor run states, logged as the loop transitions.
#[derive(Debug, Clone, Copy)]
enum State {
    Starting,
    Restarting {
        delay: Duration,
        reason: FaultClass,
    },
}

/// Classifies a fault into a supervision outcome.
///
/// Gateway faults get the short session delay; HTTP, WebSocket, and I/O
/// faults are treated as network outages and get the longer delay.
/// Configuration errors and anything unrecognized are fatal.
pub fn classify(error: &Error) -> Supervision {
    match error {
        Error::Discord(err) => match err.as_ref() {
            serenity::Error::Gateway(_) => Supervision::Restart {
                delay: SESSION_RESTART_DELAY,
                reason: FaultClass::Session,
            },
            serenity::Error::Http(_) | serenity::Error::Tungstenite(_) | serenity::Error::Io(_) => {
                Supervision::Restart {
                    delay: NETWORK_RESTART_DELAY,
                    reason: FaultClass::Network,
                }
            }
            _ => Supervision::Fatal,
        },
        Error::Api(ApiError::Transport(_)) | Error::Io(_) => Supervision::Restart {
            delay: NETWORK_RESTART_DELAY,
            reason: FaultClass::Network,
        },
        _ => Supervision::Fatal,
    }
}

/// Restart loop around the bot client lifecycle.
pub struct Supervisor {
    config: Config,
}

impl Supervisor {
    /// Creates a supervisor for the given configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Runs the bot until normal shutdown or a fatal fault.
    ///
    /// Each iteration builds a fresh HTTP client and Discord client, runs
    /// the bot, and on a fault sleeps the classified delay before the next
    /// attempt. An interrupt signal ends the run cleanly.
    ///
    /// # Returns
    /// - `Ok(())` - The bot shut down normally or on interrupt
    /// - `Err(Error)` - An unrecognized fault ended the process
    pub async fn run(&self) -> Result<(), Error> {
        let mut state = State::Starting;

        loop {
            if let State::Restarting { delay, reason } = state {
                tracing::warn!(
                    "SUP|restarting in {}s after {:?} fault",
                    delay.as_secs(),
                    reason
                );
                let interrupt = async {
                    let _ = tokio::signal::ctrl_c().await;
                };
                if wait_or_interrupt(delay, interrupt).await {
                    tracing::info!("SUP|interrupt received during restart wait, shutting down");
                    return Ok(());
                }
            }

            match self.run_once().await {
                Ok(()) => {
                    tracing::info!("SUP|Discord bot closed");
                    return Ok(());
                }
                Err(error) => match classify(&error) {
                    Supervision::Restart { delay, reason } => {
                        tracing::error!("SUP|bot run failed ({reason:?} fault): {error}");
                        state = State::Restarting { delay, reason };
                    }
                    Supervision::Fatal => {
                        tracing::error!("SUP|unrecognized fault, giving up: {error}");
                        return Err(error);
                    }
                },
            }
        }
    }

    /// One bot run: fresh clients, then block until shutdown or fault.
    async fn run_once(&self) -> Result<(), Error> {
        tracing::info!("SUP|starting bot run");

        // One HTTP client per run, shared by the presence updater and any
        // in-process write-path callers; released when the run ends.
        let api = Arc::new(ApiClient::new(&self.config.api_url)?);
        let updater: bot::UpdaterHandle = Arc::new(Mutex::new(None));
        let mut client = bot::init_bot(&self.config, api, updater.clone()).await?;
        let shard_manager = client.shard_manager.clone();

        let result = tokio::select! {
            result = bot::start_bot(&mut client) => result,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("SUP|interrupt received, shutting down");
                shard_manager.shutdown_all().await;
                Ok(())
            }
        };

        // The updater must not outlive this run's HTTP client; the next run
        // parks its own task in a fresh slot.
        if let Some(task) = updater.lock().unwrap().take() {
            task.abort();
        }

        result
    }
}

/// Waits out a restart delay unless `interrupt` completes first.
///
/// Keeps interrupt signals observable between runs; a plain sleep would
/// defer them for the full network delay.
///
/// # Returns
/// - `true` - The wait was interrupted
/// - `false` - The delay elapsed
async fn wait_or_interrupt(delay: Duration, interrupt: impl Future<Output = ()>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(delay) => false,
        _ = interrupt => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    /// Tests that a gateway fault restarts after the short session delay.
    ///
    /// Expected: Restart { 5s, Session }
    #[test]
    fn gateway_fault_restarts_after_session_delay() {
        let error = Error::from(serenity::Error::Gateway(
            serenity::all::GatewayError::InvalidAuthentication,
        ));

        match classify(&error) {
            Supervision::Restart { delay, reason } => {
                assert_eq!(delay, SESSION_RESTART_DELAY);
                assert_eq!(reason, FaultClass::Session);
            }
            other => panic!("expected session restart, got {other:?}"),
        }
    }

    /// Tests that an I/O fault restarts after the longer network delay.
    ///
    /// Expected: Restart { 60s, Network }
    #[test]
    fn io_fault_restarts_after_network_delay() {
        let error = Error::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "connection reset",
        ));

        match classify(&error) {
            Supervision::Restart { delay, reason } => {
                assert_eq!(delay, NETWORK_RESTART_DELAY);
                assert_eq!(reason, FaultClass::Network);
            }
            other => panic!("expected network restart, got {other:?}"),
        }
    }

    /// Tests that a transport fault from the EDRP API client is treated as a
    /// network outage.
    ///
    /// Expected: Restart { 60s, Network }
    #[test]
    fn api_transport_fault_restarts_after_network_delay() {
        let error = Error::from(ApiError::Transport("dns failure".to_string()));

        match classify(&error) {
            Supervision::Restart { delay, reason } => {
                assert_eq!(delay, NETWORK_RESTART_DELAY);
                assert_eq!(reason, FaultClass::Network);
            }
            other => panic!("expected network restart, got {other:?}"),
        }
    }

    /// Tests that configuration errors are not retried.
    ///
    /// Expected: Fatal
    #[test]
    fn config_fault_is_fatal() {
        let error = Error::from(ConfigError::MissingEnvVar("DISCORD_BOT_TOKEN".to_string()));

        assert!(matches!(classify(&error), Supervision::Fatal));
    }

    /// Tests that an unrecognized Discord fault ends the process.
    ///
    /// Expected: Fatal
    #[test]
    fn unrecognized_discord_fault_is_fatal() {
        let error = Error::from(serenity::Error::Other("unexpected"));

        assert!(matches!(classify(&error), Supervision::Fatal));
    }

    /// Tests that an interrupt cuts the restart wait short instead of being
    /// deferred until the delay elapses.
    ///
    /// Expected: true without waiting out the 60-second delay
    #[tokio::test]
    async fn restart_wait_yields_to_interrupt() {
        assert!(wait_or_interrupt(Duration::from_secs(60), std::future::ready(())).await);
    }

    /// Tests that the restart wait completes normally when no interrupt
    /// arrives.
    ///
    /// Expected: false once the delay elapses
    #[tokio::test]
    async fn restart_wait_completes_without_interrupt() {
        assert!(!wait_or_interrupt(Duration::ZERO, std::future::pending::<()>()).await);
    }
}
