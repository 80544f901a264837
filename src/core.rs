//! Core domain types and service traits for dirnotify
//!
//! This module defines the fundamental data structures and trait contracts
//! that govern component interactions throughout the application.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A directory user record used as a notification target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Identity {
    /// Directory object id.
    pub id: String,
    /// Human-readable name, e.g. "Jane Doe".
    pub display_name: String,
    /// Primary email address. May be empty when the directory record has
    /// neither a mail attribute nor a usable principal name.
    pub email: String,
    pub job_title: String,
    pub department: String,
}

impl Identity {
    /// True when this identity can be matched against a messaging account.
    pub fn has_email(&self) -> bool {
        !self.email.is_empty()
    }
}

/// A directory group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Group {
    pub id: String,
    pub display_name: String,
    pub description: String,
}

/// A chat-platform account resolved from an identity's email.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MessagingAccount {
    pub id: String,
    /// Account handle, e.g. "jdoe".
    pub name: String,
    pub real_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A chat channel, as listed by the messaging platform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub is_channel: bool,
}

/// The result of a single message send. Send failures are reported in the
/// `ok`/`error` fields and never as a Rust error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SendReceipt {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Platform timestamp of the posted message, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,
}

impl SendReceipt {
    /// A failed receipt with the given reason.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: Some(error.into()),
            ts: None,
        }
    }
}

/// The per-recipient result record produced by a notification call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Display name of the directory identity the message was addressed to.
    pub source: String,
    /// Handle of the messaging account the identity resolved to.
    pub resolved: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Errors surfaced by a [`DirectoryProvider`].
///
/// Only transport-level failures are raised; API-level errors (unknown
/// group, malformed body) degrade to an empty listing so that a caller can
/// tell "directory is down" apart from "nothing matched".
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("directory service unreachable: {0}")]
    Unreachable(String),
}

// =============================================================================
// Service Traits
// =============================================================================

/// Reads identity data from a corporate directory.
#[async_trait]
pub trait DirectoryProvider: Send + Sync {
    /// Lists all users in the organization.
    ///
    /// # Returns
    /// * `Ok(identities)` in the order the directory returned them
    /// * `Err(DirectoryError::Unreachable)` when the backend cannot be reached
    async fn list_users(&self) -> Result<Vec<Identity>, DirectoryError>;

    /// Fetches a single user by directory id. `Ok(None)` when the id is
    /// unknown.
    async fn get_user(&self, user_id: &str) -> Result<Option<Identity>, DirectoryError>;

    /// Lists all groups in the organization.
    async fn list_groups(&self) -> Result<Vec<Group>, DirectoryError>;

    /// Lists the user members of a group. An unknown `group_id` yields an
    /// empty list, not an error.
    async fn list_group_members(&self, group_id: &str) -> Result<Vec<Identity>, DirectoryError>;
}

/// Resolves accounts and delivers messages on a chat platform.
#[async_trait]
pub trait MessagingProvider: Send + Sync {
    /// Looks up the account registered under `email`.
    ///
    /// Returns `None` on no-match or any downstream error.
    async fn resolve_by_email(&self, email: &str) -> Option<MessagingAccount>;

    /// Delivers a direct message to an account.
    async fn send_direct_message(&self, account_id: &str, text: &str) -> SendReceipt;

    /// Posts a message to a named channel.
    async fn post_message(&self, channel: &str, text: &str) -> SendReceipt;

    /// Lists all accounts known to the platform. Empty on error.
    async fn list_accounts(&self) -> Vec<MessagingAccount>;

    /// Lists all channels visible to the bot. Empty on error.
    async fn list_channels(&self) -> Vec<Channel>;
}
