//! Canned messaging data for demos and local development.
//!
//! Also serves as the fixture backend for integration tests: it records
//! every send in memory and can be told to fail specific accounts.

use crate::core::{Channel, MessagingAccount, MessagingProvider, SendReceipt};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// A recorded direct-message send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSend {
    pub account_id: String,
    pub text: String,
}

/// A [`MessagingProvider`] over a fixed account set, matching the demo
/// directory's mailboxes.
pub struct DemoMessaging {
    accounts: Vec<MessagingAccount>,
    channels: Vec<Channel>,
    failing_accounts: HashMap<String, String>,
    sent: Mutex<Vec<RecordedSend>>,
}

impl DemoMessaging {
    pub fn new() -> Self {
        let accounts = vec![
            MessagingAccount {
                id: "DU001".to_string(),
                name: "alice.johnson".to_string(),
                real_name: "Alice Johnson".to_string(),
                email: Some("alice.johnson@contoso.com".to_string()),
            },
            MessagingAccount {
                id: "DU002".to_string(),
                name: "bob.smith".to_string(),
                real_name: "Bob Smith".to_string(),
                email: Some("bob.smith@contoso.com".to_string()),
            },
            // Carol has no chat account; her directory identity exercises
            // the resolution-miss skip path.
        ];
        let channels = vec![
            Channel {
                id: "DC001".to_string(),
                name: "general".to_string(),
                is_channel: true,
            },
            Channel {
                id: "DC002".to_string(),
                name: "engineering".to_string(),
                is_channel: true,
            },
        ];
        Self {
            accounts,
            channels,
            failing_accounts: HashMap::new(),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Makes sends to `account_id` fail with `error`. Test hook.
    pub fn fail_account(mut self, account_id: &str, error: &str) -> Self {
        self.failing_accounts
            .insert(account_id.to_string(), error.to_string());
        self
    }

    /// Returns every direct message recorded so far.
    pub fn sent(&self) -> Vec<RecordedSend> {
        self.sent.lock().unwrap().clone()
    }
}

impl Default for DemoMessaging {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagingProvider for DemoMessaging {
    async fn resolve_by_email(&self, email: &str) -> Option<MessagingAccount> {
        self.accounts
            .iter()
            .find(|a| a.email.as_deref() == Some(email))
            .cloned()
    }

    async fn send_direct_message(&self, account_id: &str, text: &str) -> SendReceipt {
        self.sent.lock().unwrap().push(RecordedSend {
            account_id: account_id.to_string(),
            text: text.to_string(),
        });
        match self.failing_accounts.get(account_id) {
            Some(error) => SendReceipt::failure(error.clone()),
            None => SendReceipt {
                ok: true,
                error: None,
                ts: Some("0000000000.000000".to_string()),
            },
        }
    }

    async fn post_message(&self, channel: &str, _text: &str) -> SendReceipt {
        if self.channels.iter().any(|c| c.id == channel || c.name == channel) {
            SendReceipt {
                ok: true,
                error: None,
                ts: Some("0000000000.000000".to_string()),
            }
        } else {
            SendReceipt::failure("channel_not_found")
        }
    }

    async fn list_accounts(&self) -> Vec<MessagingAccount> {
        self.accounts.clone()
    }

    async fn list_channels(&self) -> Vec<Channel> {
        self.channels.clone()
    }
}
