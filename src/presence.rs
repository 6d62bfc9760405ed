//! Presence updates from the EDRP active-player count.
//!
//! A recurring task polls [`ApiClient::get_active_count`] and republishes
//! the result as the bot account's activity text. A failed cycle logs and
//! leaves the previous presence untouched; a cycle while the gateway session
//! is down makes no HTTP call at all. Updates are strictly serialized: the
//! loop never spawns overlapping attempts.

use std::sync::Arc;
use std::time::Duration;

use crate::api::{ApiClient, Transport};

/// Cadence between presence refresh attempts.
pub const UPDATE_INTERVAL: Duration = Duration::from_secs(60);

/// The chat-session surface the updater needs: connection state and a way to
/// set the displayed activity text.
///
/// Implemented over the Serenity context by the bot integration and by mocks
/// in tests, so the refresh cycle is testable without a gateway connection.
pub trait PresenceTarget: Send + Sync {
    /// Whether the chat session is currently connected.
    fn is_connected(&self) -> bool;

    /// Sets the bot account's displayed activity text. Best-effort.
    fn set_activity_text(&self, text: &str);
}

/// Formats the fixed-pattern presence string for an active-CMDR count.
pub fn presence_text(count: u32) -> String {
    format!("EDRP: {count} CMDRs")
}

/// Performs one presence update attempt.
///
/// Skips the attempt with a warning when the session is not connected (no
/// HTTP call is made). On a failed count retrieval the previous presence is
/// left unchanged.
///
/// # Returns
/// - `true` - The presence text was updated
/// - `false` - The cycle was skipped or the count could not be retrieved
pub async fn refresh<T: Transport>(api: &ApiClient<T>, target: &impl PresenceTarget) -> bool {
    if !target.is_connected() {
        tracing::warn!("BOT|bot is not currently connected, skipping presence update");
        return false;
    }

    match api.get_active_count().await {
        Ok(count) => {
            tracing::info!("BOT|the EDRP API reports {count} CMDRs active");
            target.set_activity_text(&presence_text(count));
            true
        }
        Err(err) => {
            tracing::error!(
                "BOT|unable to retrieve a count of active CMDRs from the EDRP API: {err}"
            );
            false
        }
    }
}

/// Maintains the bot presence on the fixed [`UPDATE_INTERVAL`] cadence.
///
/// Runs until the owning task is cancelled; cancellation at the sleep or
/// request boundary is terminal and side-effect free since nothing is
/// buffered between cycles.
pub async fn run_updater<T, P>(api: Arc<ApiClient<T>>, target: P)
where
    T: Transport,
    P: PresenceTarget,
{
    loop {
        tokio::time::sleep(UPDATE_INTERVAL).await;
        refresh(api.as_ref(), &target).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::mock::MockTransport;
    use std::sync::Mutex;

    /// Presence double recording every activity text it is handed.
    struct MockTarget {
        connected: bool,
        texts: Mutex<Vec<String>>,
    }

    impl MockTarget {
        fn new(connected: bool) -> Self {
            Self {
                connected,
                texts: Mutex::new(Vec::new()),
            }
        }

        fn texts(&self) -> Vec<String> {
            self.texts.lock().unwrap().clone()
        }
    }

    impl PresenceTarget for MockTarget {
        fn is_connected(&self) -> bool {
            self.connected
        }

        fn set_activity_text(&self, text: &str) {
            self.texts.lock().unwrap().push(text.to_string());
        }
    }

    /// Tests the fixed presence text pattern.
    ///
    /// Expected: "EDRP: 7 CMDRs"
    #[test]
    fn presence_text_embeds_count() {
        assert_eq!(presence_text(7), "EDRP: 7 CMDRs");
    }

    /// Tests that a successful cycle sets the formatted presence text.
    ///
    /// Expected: one update with "EDRP: 7 CMDRs"
    #[tokio::test]
    async fn refresh_sets_presence_from_count() {
        let api = ApiClient::with_transport(
            "http://edrp-api.test",
            MockTransport::ok(r#"{"message": "7"}"#),
        );
        let target = MockTarget::new(true);

        assert!(refresh(&api, &target).await);
        assert_eq!(target.texts(), vec!["EDRP: 7 CMDRs".to_string()]);
    }

    /// Tests that a failed count retrieval leaves the presence untouched.
    ///
    /// Expected: no update for the cycle
    #[tokio::test]
    async fn refresh_leaves_presence_on_api_failure() {
        let api = ApiClient::with_transport("http://edrp-api.test", MockTransport::status(500));
        let target = MockTarget::new(true);

        assert!(!refresh(&api, &target).await);
        assert!(target.texts().is_empty());
    }

    /// Tests that aborting the updater task is terminal; the loop has no
    /// work to reconcile, so cancellation at the sleep boundary just ends it.
    ///
    /// Expected: the task reports cancellation
    #[tokio::test]
    async fn updater_task_ends_when_aborted() {
        let api = Arc::new(ApiClient::with_transport(
            "http://edrp-api.test",
            MockTransport::replying(vec![]),
        ));
        let task = tokio::spawn(run_updater(api, MockTarget::new(false)));

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());
    }

    /// Tests that a disconnected session skips the cycle entirely.
    ///
    /// Expected: no HTTP call and no update
    #[tokio::test]
    async fn refresh_makes_no_call_while_disconnected() {
        let transport = MockTransport::ok(r#"{"message": "7"}"#);
        let api = ApiClient::with_transport("http://edrp-api.test", transport.clone());
        let target = MockTarget::new(false);

        assert!(!refresh(&api, &target).await);
        assert!(transport.requested().is_empty());
        assert!(target.texts().is_empty());
    }
}
