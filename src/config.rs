use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use std::env;

/// Optional configuration file, looked up as `catan-companion.{toml,yaml,json}`
const CONFIG_FILE: &str = "catan-companion";
/// Prefix for nested environment overrides, e.g. `CATAN_GAME__MAX_PLAYERS=5`
const ENV_PREFIX: &str = "CATAN";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
    #[serde(default)]
    pub avatar: AvatarConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the built web client
    pub static_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub min_players: usize,
    pub max_players: usize,
    pub min_target_vp: i32,
    pub max_target_vp: i32,
    pub history_limit: i64,
    pub max_history_limit: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    /// Buffered snapshots per match before slow subscribers start lagging
    pub channel_capacity: usize,
    pub cleanup_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AvatarConfig {
    pub base_url: String,
    pub style: String,
}

fn default_max_connections() -> u32 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            static_dir: "./frontend".to_string(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_players: 3,
            max_players: 6,
            min_target_vp: 5,
            max_target_vp: 20,
            history_limit: 20,
            max_history_limit: 100,
        }
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 32,
            cleanup_interval_secs: 60,
        }
    }
}

impl Default for AvatarConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.dicebear.com/7.x".to_string(),
            style: "adventurer".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            // Plain deployment variables win over everything else
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .set_override_option(
                "database.max_connections",
                env::var("DATABASE_MAX_CONNECTIONS").ok(),
            )?
            .set_override_option("server.host", env::var("HOST").ok())?
            .set_override_option("server.port", env::var("PORT").ok())?
            .build()
            .context("Failed to read configuration sources")?;

        let config: Config = settings
            .try_deserialize()
            .context("Invalid configuration (DATABASE_URL must be set)")?;
        config.validate()?;

        Ok(config)
    }

    /// Reject bounds that would make every match impossible to create
    pub fn validate(&self) -> Result<()> {
        let game = &self.game;
        ensure!(
            game.min_players >= 2 && game.min_players <= game.max_players,
            "game.min_players ({}) must be at least 2 and not exceed game.max_players ({})",
            game.min_players,
            game.max_players
        );
        ensure!(
            game.min_target_vp > 0 && game.min_target_vp <= game.max_target_vp,
            "game.min_target_vp ({}) must be positive and not exceed game.max_target_vp ({})",
            game.min_target_vp,
            game.max_target_vp
        );
        ensure!(
            game.history_limit > 0 && game.history_limit <= game.max_history_limit,
            "game.history_limit ({}) must be between 1 and game.max_history_limit ({})",
            game.history_limit,
            game.max_history_limit
        );
        ensure!(
            self.realtime.channel_capacity > 0,
            "realtime.channel_capacity must be positive"
        );
        Ok(())
    }

    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Defaults everywhere except the database location
    #[cfg(test)]
    pub fn with_database_url(url: impl Into<String>) -> Self {
        Self {
            database: DatabaseConfig {
                url: url.into(),
                max_connections: default_max_connections(),
            },
            server: ServerConfig::default(),
            game: GameConfig::default(),
            realtime: RealtimeConfig::default(),
            avatar: AvatarConfig::default(),
        }
    }
}
