use crate::error::{ConfigError, Error};

/// Production EDRP status API endpoint.
const EDRP_API_URL: &str = "http://edrp-api.danowebstudios.com";

const DEFAULT_COMMAND_PREFIX: &str = "!";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_LOG_FILE: &str = "edrp_status_bot.log";

/// Application configuration loaded from the environment.
pub struct Config {
    /// Discord bot authentication token.
    pub discord_bot_token: String,
    /// Command prefix for the bot account. Opaque to this crate; carried for
    /// external command handlers.
    pub command_prefix: String,
    /// Base URL of the EDRP status API.
    pub api_url: String,
    /// Directory the log file is written to.
    pub log_dir: String,
    /// Log file name.
    pub log_file: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// `DISCORD_BOT_TOKEN` is required; everything else falls back to a
    /// default. Call `dotenvy::dotenv()` first if a `.env` file should be
    /// honored.
    ///
    /// # Returns
    /// - `Ok(Config)` - Configuration with all fields populated
    /// - `Err(Error)` - A required environment variable is missing
    pub fn from_env() -> Result<Self, Error> {
        Ok(Self {
            discord_bot_token: std::env::var("DISCORD_BOT_TOKEN")
                .map_err(|_| ConfigError::MissingEnvVar("DISCORD_BOT_TOKEN".to_string()))?,
            command_prefix: std::env::var("COMMAND_PREFIX")
                .unwrap_or_else(|_| DEFAULT_COMMAND_PREFIX.to_string()),
            api_url: std::env::var("EDRP_API_URL").unwrap_or_else(|_| EDRP_API_URL.to_string()),
            log_dir: std::env::var("EDRP_LOG_DIR").unwrap_or_else(|_| DEFAULT_LOG_DIR.to_string()),
            log_file: std::env::var("EDRP_LOG_FILE")
                .unwrap_or_else(|_| DEFAULT_LOG_FILE.to_string()),
        })
    }
}
