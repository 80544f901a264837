//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using
//! the `clap` crate. These arguments are parsed at startup and then merged
//! with the configuration from the `dirnotify.toml` file and environment
//! variables.

use clap::Parser;
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// A directory-to-messaging notification bridge.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Address for the API server to bind to.
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// Run against canned demo data instead of the live backends.
    #[arg(long)]
    pub demo: bool,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        if let Some(bind) = &self.bind {
            dict.insert("server.bind".into(), Value::from(bind.clone()));
        }

        if self.demo {
            dict.insert("directory.backend".into(), Value::from("demo"));
            dict.insert("messaging.backend".into(), Value::from("demo"));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
