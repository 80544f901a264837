//! A messaging provider backed by the Slack Web API.
//!
//! Every Slack method wraps its payload in an `{ok, error}` envelope and
//! reports failures in-band rather than via HTTP status codes; this client
//! mirrors that contract by never raising per-call errors to the dispatcher.

use crate::config::MessagingConfig;
use crate::core::{Channel, MessagingAccount, MessagingProvider, SendReceipt};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{instrument, warn};

/// Wire shape of a Slack user object.
#[derive(Debug, Deserialize)]
struct SlackUser {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    real_name: String,
    #[serde(default)]
    profile: Option<SlackUserProfile>,
}

#[derive(Debug, Deserialize, Default)]
struct SlackUserProfile {
    email: Option<String>,
}

impl SlackUser {
    fn into_account(self) -> MessagingAccount {
        MessagingAccount {
            id: self.id,
            name: self.name,
            real_name: self.real_name,
            email: self.profile.and_then(|p| p.email),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SlackChannel {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    is_channel: bool,
}

/// The common `{ok, error}` envelope with the per-method payload flattened
/// alongside it.
#[derive(Debug, Deserialize)]
struct LookupResponse {
    ok: bool,
    error: Option<String>,
    user: Option<SlackUser>,
}

#[derive(Debug, Deserialize)]
struct UsersListResponse {
    ok: bool,
    error: Option<String>,
    #[serde(default)]
    members: Vec<SlackUser>,
}

#[derive(Debug, Deserialize)]
struct ChannelsListResponse {
    ok: bool,
    error: Option<String>,
    #[serde(default)]
    channels: Vec<SlackChannel>,
}

#[derive(Debug, Deserialize)]
struct OpenConversationResponse {
    ok: bool,
    error: Option<String>,
    channel: Option<OpenedChannel>,
}

#[derive(Debug, Deserialize)]
struct OpenedChannel {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    error: Option<String>,
    ts: Option<String>,
}

/// A [`MessagingProvider`] speaking to the Slack Web API with bot-token
/// bearer auth.
pub struct SlackMessaging {
    client: reqwest::Client,
    base_url: String,
    bot_token: String,
}

impl SlackMessaging {
    pub fn new(config: &MessagingConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
        })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}", self.base_url, method)
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        payload: &serde_json::Value,
    ) -> Result<T, String> {
        let response = self
            .client
            .post(self.url(method))
            .bearer_auth(&self.bot_token)
            .json(payload)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        response.json::<T>().await.map_err(|e| e.to_string())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        query: &[(&str, &str)],
    ) -> Result<T, String> {
        let response = self
            .client
            .get(self.url(method))
            .bearer_auth(&self.bot_token)
            .query(query)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        response.json::<T>().await.map_err(|e| e.to_string())
    }

    /// Opens (or re-opens) the direct-message conversation with an account
    /// and returns its channel id.
    async fn open_dm_channel(&self, account_id: &str) -> Result<String, String> {
        let response: OpenConversationResponse = self
            .post_json("conversations.open", &json!({ "users": account_id }))
            .await?;
        if !response.ok {
            return Err(response
                .error
                .unwrap_or_else(|| "failed to open DM channel".to_string()));
        }
        response
            .channel
            .map(|c| c.id)
            .ok_or_else(|| "failed to open DM channel".to_string())
    }
}

#[async_trait]
impl MessagingProvider for SlackMessaging {
    #[instrument(skip(self))]
    async fn resolve_by_email(&self, email: &str) -> Option<MessagingAccount> {
        let result: Result<LookupResponse, String> = self
            .get_json("users.lookupByEmail", &[("email", email)])
            .await;
        match result {
            Ok(response) if response.ok => response.user.map(SlackUser::into_account),
            Ok(response) => {
                // users_not_found is the expected no-match answer; anything
                // else is worth surfacing in the logs.
                if response.error.as_deref() != Some("users_not_found") {
                    warn!(email, error = ?response.error, "Email lookup rejected");
                }
                None
            }
            Err(e) => {
                warn!(email, error = %e, "Email lookup failed");
                None
            }
        }
    }

    #[instrument(skip(self, text))]
    async fn send_direct_message(&self, account_id: &str, text: &str) -> SendReceipt {
        let channel_id = match self.open_dm_channel(account_id).await {
            Ok(id) => id,
            Err(e) => {
                warn!(account_id, error = %e, "Could not open DM channel");
                return SendReceipt::failure(e);
            }
        };
        self.post_message(&channel_id, text).await
    }

    #[instrument(skip(self, text))]
    async fn post_message(&self, channel: &str, text: &str) -> SendReceipt {
        let result: Result<PostMessageResponse, String> = self
            .post_json("chat.postMessage", &json!({ "channel": channel, "text": text }))
            .await;
        match result {
            Ok(response) => {
                if !response.ok {
                    warn!(channel, error = ?response.error, "Message rejected");
                }
                SendReceipt {
                    ok: response.ok,
                    error: response.error,
                    ts: response.ts,
                }
            }
            Err(e) => {
                warn!(channel, error = %e, "Message send failed");
                SendReceipt::failure(e)
            }
        }
    }

    #[instrument(skip(self))]
    async fn list_accounts(&self) -> Vec<MessagingAccount> {
        let result: Result<UsersListResponse, String> = self.get_json("users.list", &[]).await;
        match result {
            Ok(response) if response.ok => response
                .members
                .into_iter()
                .map(SlackUser::into_account)
                .collect(),
            Ok(response) => {
                warn!(error = ?response.error, "users.list rejected");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "users.list failed");
                Vec::new()
            }
        }
    }

    #[instrument(skip(self))]
    async fn list_channels(&self) -> Vec<Channel> {
        let result: Result<ChannelsListResponse, String> =
            self.get_json("conversations.list", &[]).await;
        match result {
            Ok(response) if response.ok => response
                .channels
                .into_iter()
                .map(|c| Channel {
                    id: c.id,
                    name: c.name,
                    is_channel: c.is_channel,
                })
                .collect(),
            Ok(response) => {
                warn!(error = ?response.error, "conversations.list rejected");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "conversations.list failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MessagingBackend;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: &str) -> MessagingConfig {
        MessagingConfig {
            backend: MessagingBackend::Slack,
            base_url: base_url.to_string(),
            bot_token: "xoxb-test".to_string(),
            timeout_seconds: 2,
        }
    }

    #[tokio::test]
    async fn resolve_by_email_returns_the_matching_account() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users.lookupByEmail"))
            .and(query_param("email", "jane@example.com"))
            .and(header("authorization", "Bearer xoxb-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "user": {
                    "id": "U123",
                    "name": "jane",
                    "real_name": "Jane Doe",
                    "profile": { "email": "jane@example.com" }
                }
            })))
            .mount(&server)
            .await;

        let messaging = SlackMessaging::new(&config(&server.uri())).unwrap();
        let account = messaging.resolve_by_email("jane@example.com").await.unwrap();

        assert_eq!(account.id, "U123");
        assert_eq!(account.name, "jane");
        assert_eq!(account.email.as_deref(), Some("jane@example.com"));
    }

    #[tokio::test]
    async fn resolve_by_email_is_none_on_no_match() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users.lookupByEmail"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": false,
                "error": "users_not_found"
            })))
            .mount(&server)
            .await;

        let messaging = SlackMessaging::new(&config(&server.uri())).unwrap();
        assert!(messaging.resolve_by_email("ghost@example.com").await.is_none());
    }

    #[tokio::test]
    async fn resolve_by_email_is_none_on_transport_failure() {
        let messaging = SlackMessaging::new(&config("http://127.0.0.1:1")).unwrap();
        assert!(messaging.resolve_by_email("jane@example.com").await.is_none());
    }

    #[tokio::test]
    async fn send_direct_message_opens_a_dm_then_posts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/conversations.open"))
            .and(body_json(json!({ "users": "U123" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "channel": { "id": "D456" }
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat.postMessage"))
            .and(body_json(json!({ "channel": "D456", "text": "hello" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "ts": "1724600000.000100"
            })))
            .mount(&server)
            .await;

        let messaging = SlackMessaging::new(&config(&server.uri())).unwrap();
        let receipt = messaging.send_direct_message("U123", "hello").await;

        assert!(receipt.ok);
        assert_eq!(receipt.error, None);
        assert_eq!(receipt.ts.as_deref(), Some("1724600000.000100"));
    }

    #[tokio::test]
    async fn send_direct_message_reports_post_rejection_in_band() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/conversations.open"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "channel": { "id": "D456" }
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat.postMessage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": false,
                "error": "rate_limited"
            })))
            .mount(&server)
            .await;

        let messaging = SlackMessaging::new(&config(&server.uri())).unwrap();
        let receipt = messaging.send_direct_message("U123", "hello").await;

        assert!(!receipt.ok);
        assert_eq!(receipt.error.as_deref(), Some("rate_limited"));
    }

    #[tokio::test]
    async fn send_direct_message_fails_when_dm_cannot_be_opened() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/conversations.open"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": false,
                "error": "user_not_found"
            })))
            .mount(&server)
            .await;

        let messaging = SlackMessaging::new(&config(&server.uri())).unwrap();
        let receipt = messaging.send_direct_message("U999", "hello").await;

        assert!(!receipt.ok);
        assert_eq!(receipt.error.as_deref(), Some("user_not_found"));
    }

    #[tokio::test]
    async fn list_channels_parses_the_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/conversations.list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "channels": [
                    { "id": "C1", "name": "general", "is_channel": true },
                    { "id": "C2", "name": "random", "is_channel": true }
                ]
            })))
            .mount(&server)
            .await;

        let messaging = SlackMessaging::new(&config(&server.uri())).unwrap();
        let channels = messaging.list_channels().await;

        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].name, "general");
        assert!(channels[0].is_channel);
    }
}
