//! # API Configuration Module
//!
//! Loads configuration for the MentorSync API server from environment
//! variables, with defaults where a value is optional.
//!
//! ## Environment Variables
//!
//! - `API_HOST`: The host address to bind the server to (default: "0.0.0.0")
//! - `API_PORT`: The port to listen on (default: 3000)
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `LOG_LEVEL`: Logging level (default: "info")
//! - `API_CORS_ORIGINS`: Comma-separated list of allowed CORS origins
//! - `API_REQUEST_TIMEOUT_SECONDS`: Per-request timeout (default: 30)
//! - `DEFAULT_TIMEZONE`: Timezone for mentors registered without one (default: "Asia/Bangkok")
//! - `DEFAULT_START_HOUR` / `DEFAULT_END_HOUR`: Working hours used when a week
//!   has no saved settings (default: "09:00" / "17:00")
//! - `DEFAULT_SESSION_MINUTES`: Default session length (default: 60)
//! - `DEFAULT_BUFFER_MINUTES`: Default gap between sessions (default: 0)
//! - `DEFAULT_FILL_HORIZON_WEEKS`: How far ahead a read may store default
//!   settings for an unconfigured week (default: 8)

use eyre::{Result, WrapErr};
use mentorsync_core::models::mentor::{parse_timezone, DEFAULT_TIMEZONE};
use mentorsync_core::models::schedule::SlotRules;
use mentorsync_core::models::time_format::parse_clock_time;
use mentorsync_core::services::availability::DEFAULT_FILL_HORIZON_WEEKS;
use std::env;
use tracing::Level;

/// Configuration for the MentorSync API server
///
/// # Example
///
/// ```no_run
/// use eyre::Result;
/// use mentorsync_api::config::ApiConfig;
///
/// fn example() -> Result<()> {
///     let config = ApiConfig::from_env()?;
///     println!("Starting server on {}:{}", config.host, config.port);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host address for the API server (e.g., "127.0.0.1", "0.0.0.0")
    pub host: String,

    /// Port for the API server to listen on
    pub port: u16,

    /// PostgreSQL database connection string
    pub database_url: String,

    /// Log level for the application
    pub log_level: Level,

    /// CORS allowed origins (optional)
    pub cors_origins: Option<Vec<String>>,

    /// Request timeout in seconds
    pub request_timeout: u64,

    /// Timezone assigned to mentors registered without one
    pub default_timezone: String,

    /// Rules used for weeks that have no saved settings
    pub default_rules: SlotRules,

    /// Weeks past the current one that a read fills with the default rules
    pub fill_horizon_weeks: u32,
}

impl ApiConfig {
    /// Creates a new ApiConfig from environment variables
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The DATABASE_URL environment variable is not set
    /// - The API_PORT value cannot be parsed as a u16
    /// - Any of the DEFAULT_* values is malformed or the default rules are invalid
    pub fn from_env() -> Result<Self> {
        // Network settings
        let host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("API_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .wrap_err("Invalid API_PORT value")?;

        // Database settings
        let database_url = env::var("DATABASE_URL")
            .wrap_err("DATABASE_URL environment variable must be set")?;

        // Logging settings
        let log_level = parse_log_level(&env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()));

        // CORS settings
        let cors_origins = env::var("API_CORS_ORIGINS").ok().map(|origins| {
            origins.split(',').map(|s| s.trim().to_string()).collect()
        });

        // Performance settings
        let request_timeout = env::var("API_REQUEST_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .unwrap_or(30);

        // Scheduling defaults
        let default_timezone =
            env::var("DEFAULT_TIMEZONE").unwrap_or_else(|_| DEFAULT_TIMEZONE.to_string());
        parse_timezone(&default_timezone).wrap_err("Invalid DEFAULT_TIMEZONE value")?;
        let default_rules = default_rules_from_env()?;
        let fill_horizon_weeks = match env::var("DEFAULT_FILL_HORIZON_WEEKS") {
            Ok(value) => value.parse().wrap_err("Invalid DEFAULT_FILL_HORIZON_WEEKS value")?,
            Err(_) => DEFAULT_FILL_HORIZON_WEEKS,
        };

        Ok(Self {
            host,
            port,
            database_url,
            log_level,
            cors_origins,
            request_timeout,
            default_timezone,
            default_rules,
            fill_horizon_weeks,
        })
    }

    /// Returns the server address as a string (e.g., "127.0.0.1:8080")
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

pub fn parse_log_level(value: &str) -> Level {
    match value {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn default_rules_from_env() -> Result<SlotRules> {
    let fallback = SlotRules::default();

    let start_hour = match env::var("DEFAULT_START_HOUR") {
        Ok(value) => parse_clock_time(&value)
            .ok_or_else(|| eyre::eyre!("Invalid DEFAULT_START_HOUR value: {}", value))?,
        Err(_) => fallback.start_hour,
    };
    let end_hour = match env::var("DEFAULT_END_HOUR") {
        Ok(value) => parse_clock_time(&value)
            .ok_or_else(|| eyre::eyre!("Invalid DEFAULT_END_HOUR value: {}", value))?,
        Err(_) => fallback.end_hour,
    };
    let session_duration_minutes = match env::var("DEFAULT_SESSION_MINUTES") {
        Ok(value) => value.parse().wrap_err("Invalid DEFAULT_SESSION_MINUTES value")?,
        Err(_) => fallback.session_duration_minutes,
    };
    let buffer_minutes = match env::var("DEFAULT_BUFFER_MINUTES") {
        Ok(value) => value.parse().wrap_err("Invalid DEFAULT_BUFFER_MINUTES value")?,
        Err(_) => fallback.buffer_minutes,
    };

    let rules = SlotRules {
        start_hour,
        end_hour,
        session_duration_minutes,
        buffer_minutes,
    };
    rules.validate().wrap_err("Invalid default schedule rules")?;
    Ok(rules)
}
