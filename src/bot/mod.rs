//! Discord bot integration.
//!
//! Wires the presence updater to a Serenity client. The bot consumes no
//! guild events and needs no gateway intents; its only Discord surface is
//! the account's activity text. The event handler tracks the gateway
//! connection stage so the updater can skip cycles while the session is
//! down, and performs the first presence update immediately on `ready`
//! rather than after the first full interval.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serenity::all::{
    ActivityData, Client, ConnectionStage, Context, EventHandler, GatewayIntents, Ready,
    ResumedEvent, ShardStageUpdateEvent,
};
use serenity::async_trait;
use tokio::task::JoinHandle;

use crate::api::{ApiClient, ReqwestTransport, Transport};
use crate::config::Config;
use crate::error::Error;
use crate::presence::{self, PresenceTarget};

/// Slot a run's presence-updater task is parked in.
///
/// Created fresh by the supervisor for each run and handed to the event
/// handler. The supervisor aborts whatever is parked here when the run ends,
/// so an updater never outlives its run's HTTP client and at most one update
/// loop exists per process.
pub type UpdaterHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Discord bot event handler
struct Handler {
    api: Arc<ApiClient<ReqwestTransport>>,
    connected: Arc<AtomicBool>,
    updater: UpdaterHandle,
}

impl Handler {
    fn new(api: Arc<ApiClient<ReqwestTransport>>, updater: UpdaterHandle) -> Self {
        Self {
            api,
            connected: Arc::new(AtomicBool::new(false)),
            updater,
        }
    }
}

/// Presence surface over the Serenity context.
///
/// `Context::set_activity` hands the update to the shard messenger, so the
/// call itself is best-effort and non-blocking.
struct DiscordPresence {
    ctx: Context,
    connected: Arc<AtomicBool>,
}

impl PresenceTarget for DiscordPresence {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn set_activity_text(&self, text: &str) {
        self.ctx.set_activity(Some(ActivityData::custom(text)));
    }
}

/// Parks the presence updater in `slot`, spawning it at most once.
///
/// `ready` fires again after reconnects; an occupied slot means this run's
/// updater is already polling, so the call becomes a no-op.
///
/// # Returns
/// - `true` - The updater task was spawned and parked
/// - `false` - The slot already held this run's updater
fn spawn_updater_once<T, P>(slot: &UpdaterHandle, api: Arc<ApiClient<T>>, target: P) -> bool
where
    T: Transport + 'static,
    P: PresenceTarget + 'static,
{
    let mut updater = slot.lock().unwrap();
    if updater.is_some() {
        return false;
    }
    *updater = Some(tokio::spawn(presence::run_updater(api, target)));
    true
}

#[async_trait]
impl EventHandler for Handler {
    /// Called when the bot is ready and connected to Discord
    async fn ready(&self, ctx: Context, ready: Ready) {
        tracing::info!("BOT|{} is connected to Discord", ready.user.name);
        self.connected.store(true, Ordering::SeqCst);

        let target = DiscordPresence {
            ctx,
            connected: self.connected.clone(),
        };

        // First update happens right away, outside the 60-second cadence
        presence::refresh(self.api.as_ref(), &target).await;

        spawn_updater_once(&self.updater, self.api.clone(), target);
    }

    /// Called when a dropped gateway session is resumed
    async fn resume(&self, _ctx: Context, _resumed: ResumedEvent) {
        tracing::info!("BOT|gateway session resumed");
        self.connected.store(true, Ordering::SeqCst);
    }

    /// Called when the shard's connection stage changes
    async fn shard_stage_update(&self, _ctx: Context, event: ShardStageUpdateEvent) {
        let connected = event.new == ConnectionStage::Connected;
        self.connected.store(connected, Ordering::SeqCst);
        tracing::debug!("BOT|shard {} stage is now {:?}", event.shard_id, event.new);
    }
}

/// Builds the Discord client with the presence-updating event handler.
///
/// # Arguments
/// - `config` - Application configuration providing the bot token
/// - `api` - Shared EDRP API client for the presence updater
/// - `updater` - Run-scoped slot the spawned updater task is parked in
///
/// # Returns
/// - `Ok(Client)` - Client ready to be started
/// - `Err(Error)` - Client construction failed
pub async fn init_bot(
    config: &Config,
    api: Arc<ApiClient<ReqwestTransport>>,
    updater: UpdaterHandle,
) -> Result<Client, Error> {
    // Presence-only bot: no guild events are consumed
    let intents = GatewayIntents::empty();

    let handler = Handler::new(api, updater);

    let client = Client::builder(&config.discord_bot_token, intents)
        .event_handler(handler)
        .await?;

    Ok(client)
}

/// Starts the Discord bot in a blocking manner.
///
/// This should be called from within the supervising task since it will
/// block until the bot shuts down or the gateway connection fails.
///
/// # Returns
/// - `Ok(())` - The bot shut down normally
/// - `Err(Error)` - The gateway connection ended with a fault
pub async fn start_bot(client: &mut Client) -> Result<(), Error> {
    tracing::info!("BOT|starting Discord bot");

    client.start().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::mock::MockTransport;

    /// Presence double that never connects, so a parked updater makes no
    /// calls while the test inspects the slot.
    struct IdleTarget;

    impl PresenceTarget for IdleTarget {
        fn is_connected(&self) -> bool {
            false
        }

        fn set_activity_text(&self, _text: &str) {}
    }

    /// Tests that one run parks exactly one updater task; a repeated ready
    /// does not spawn a second loop against the same slot.
    ///
    /// Expected: first call spawns, second call is a no-op, and the parked
    /// task can be aborted by the run that owns the slot
    #[tokio::test]
    async fn updater_is_spawned_once_per_run() {
        let slot: UpdaterHandle = Arc::new(Mutex::new(None));
        let api = Arc::new(ApiClient::with_transport(
            "http://edrp-api.test",
            MockTransport::replying(vec![]),
        ));

        assert!(spawn_updater_once(&slot, api.clone(), IdleTarget));
        assert!(!spawn_updater_once(&slot, api, IdleTarget));

        let task = slot.lock().unwrap().take().unwrap();
        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());
    }
}
