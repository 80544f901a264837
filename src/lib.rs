//! dirnotify - A directory-to-messaging notification bridge
//!
//! This library reads organizational identity data from a corporate
//! directory and relays notifications to members through a team-chat
//! platform, matching directory users to chat accounts by email address.

pub mod cli;
pub mod config;
pub mod core;
pub mod directory;
pub mod dispatch;
pub mod messaging;
pub mod server;

// Re-export core types for convenience
pub use crate::core::*;
