//! Discord bot to display status information for the number of players
//! logged in to the ED RP private group on Elite.

use edrp_status_bot::config::Config;
use edrp_status_bot::error::Error;
use edrp_status_bot::logging;
use edrp_status_bot::supervisor::Supervisor;

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    let _logging = logging::init(&config)?;

    tracing::info!("BOT|starting EDRP status bot");

    let result = Supervisor::new(config).run().await;

    tracing::info!("BOT|EDRP status bot closed");
    result
}
