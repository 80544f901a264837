//! Configuration management for dirnotify
//!
//! This module defines the main `Config` struct and its sub-structs,
//! responsible for holding all application settings. It uses the `figment`
//! crate to load configuration from a `dirnotify.toml` file and merge it
//! with environment variables and command-line arguments.

use crate::cli::Cli;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// Configuration for the HTTP API server.
    pub server: ServerConfig,
    /// Configuration for the directory backend.
    pub directory: DirectoryConfig,
    /// Configuration for the messaging backend.
    pub messaging: MessagingConfig,
}

/// Configuration for the HTTP API server.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// The address the API server binds to.
    pub bind: String,
}

/// Which directory backend to use.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryBackend {
    /// The Microsoft Graph REST API.
    Graph,
    /// Canned in-memory fixtures, for demos and local development.
    Demo,
}

/// Configuration for the directory backend.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DirectoryConfig {
    pub backend: DirectoryBackend,
    /// Base URL of the Graph API.
    pub base_url: String,
    /// A pre-acquired bearer token for the Graph API. Token acquisition is
    /// out of scope; supply one via DIRNOTIFY_DIRECTORY__ACCESS_TOKEN.
    pub access_token: String,
    /// Per-request timeout in seconds.
    pub timeout_seconds: u64,
}

/// Which messaging backend to use.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessagingBackend {
    /// The Slack Web API.
    Slack,
    /// Canned in-memory fixtures, for demos and local development.
    Demo,
}

/// Configuration for the messaging backend.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MessagingConfig {
    pub backend: MessagingBackend,
    /// Base URL of the Slack Web API.
    pub base_url: String,
    /// The bot token used as bearer auth on every call.
    pub bot_token: String,
    /// Per-request timeout in seconds. Bounds each resolve/send call so a
    /// single unresponsive recipient cannot stall a whole dispatch.
    pub timeout_seconds: u64,
}

impl Config {
    /// Loads the application configuration by layering sources: defaults,
    /// the TOML file, environment variables, then CLI arguments.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| "dirnotify.toml".into());
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            // Allow overriding with environment variables, e.g.
            // DIRNOTIFY_LOG_LEVEL=debug or DIRNOTIFY_MESSAGING__BOT_TOKEN=...
            .merge(Env::prefixed("DIRNOTIFY_").split("__"))
            .merge(cli.clone())
            .extract()?;
        Ok(config)
    }
}

// Provide a default implementation for tests and easy setup.
impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            server: ServerConfig {
                bind: "127.0.0.1:8080".to_string(),
            },
            directory: DirectoryConfig {
                backend: DirectoryBackend::Demo,
                base_url: "https://graph.microsoft.com/v1.0".to_string(),
                access_token: String::new(),
                timeout_seconds: 10,
            },
            messaging: MessagingConfig {
                backend: MessagingBackend::Demo,
                base_url: "https://slack.com/api".to_string(),
                bot_token: String::new(),
                timeout_seconds: 10,
            },
        }
    }
}
