//! A directory provider backed by the Microsoft Graph REST API.

use crate::config::DirectoryConfig;
use crate::core::{DirectoryError, DirectoryProvider, Group, Identity};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{instrument, warn};

const GRAPH_USER_ODATA_TYPE: &str = "#microsoft.graph.user";

/// Wire shape of a Graph collection response.
#[derive(Debug, Deserialize)]
struct GraphCollection<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
}

/// Wire shape of a Graph user or directory object. All fields are optional
/// on the wire; absent values map to empty strings in [`Identity`].
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphUser {
    #[serde(rename = "@odata.type", default)]
    odata_type: Option<String>,
    id: Option<String>,
    display_name: Option<String>,
    mail: Option<String>,
    user_principal_name: Option<String>,
    job_title: Option<String>,
    department: Option<String>,
}

impl GraphUser {
    fn into_identity(self) -> Identity {
        Identity {
            id: self.id.unwrap_or_default(),
            display_name: self.display_name.unwrap_or_default(),
            // Graph leaves `mail` unset for accounts without a mailbox; the
            // principal name is usually an address and serves as fallback.
            email: self
                .mail
                .or(self.user_principal_name)
                .unwrap_or_default(),
            job_title: self.job_title.unwrap_or_default(),
            department: self.department.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphGroup {
    id: Option<String>,
    display_name: Option<String>,
    description: Option<String>,
}

/// A [`DirectoryProvider`] that reads users, groups and memberships from
/// Microsoft Graph using a pre-acquired bearer token.
pub struct GraphDirectory {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl GraphDirectory {
    pub fn new(config: &DirectoryConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
        })
    }

    /// Fetches one Graph collection endpoint.
    ///
    /// Transport failures surface as `Unreachable`; a non-success status or
    /// an undecodable body degrades to an empty collection, which is how
    /// Graph reports an unknown group id.
    async fn get_collection<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Vec<T>, DirectoryError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| DirectoryError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, path, "Directory request rejected, treating as empty");
            return Ok(Vec::new());
        }

        match response.json::<GraphCollection<T>>().await {
            Ok(collection) => Ok(collection.value),
            Err(e) => {
                warn!(error = %e, path, "Undecodable directory response, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    /// Fetches one Graph object. A non-success status (Graph answers 404
    /// for unknown ids) or an undecodable body degrades to `None`.
    async fn get_object<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Option<T>, DirectoryError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| DirectoryError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            if status != reqwest::StatusCode::NOT_FOUND {
                warn!(%status, path, "Directory request rejected, treating as absent");
            }
            return Ok(None);
        }

        match response.json::<T>().await {
            Ok(object) => Ok(Some(object)),
            Err(e) => {
                warn!(error = %e, path, "Undecodable directory response, treating as absent");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl DirectoryProvider for GraphDirectory {
    #[instrument(skip(self))]
    async fn list_users(&self) -> Result<Vec<Identity>, DirectoryError> {
        let users: Vec<GraphUser> = self.get_collection("/users").await?;
        Ok(users.into_iter().map(GraphUser::into_identity).collect())
    }

    #[instrument(skip(self))]
    async fn get_user(&self, user_id: &str) -> Result<Option<Identity>, DirectoryError> {
        let path = format!("/users/{user_id}");
        let user: Option<GraphUser> = self.get_object(&path).await?;
        Ok(user.map(GraphUser::into_identity))
    }

    #[instrument(skip(self))]
    async fn list_groups(&self) -> Result<Vec<Group>, DirectoryError> {
        let groups: Vec<GraphGroup> = self.get_collection("/groups").await?;
        Ok(groups
            .into_iter()
            .map(|g| Group {
                id: g.id.unwrap_or_default(),
                display_name: g.display_name.unwrap_or_default(),
                description: g.description.unwrap_or_default(),
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn list_group_members(&self, group_id: &str) -> Result<Vec<Identity>, DirectoryError> {
        let path = format!("/groups/{group_id}/members");
        let members: Vec<GraphUser> = self.get_collection(&path).await?;
        // Membership listings mix users, devices and nested groups; only
        // user objects are notification targets.
        Ok(members
            .into_iter()
            .filter(|m| m.odata_type.as_deref() == Some(GRAPH_USER_ODATA_TYPE))
            .map(GraphUser::into_identity)
            .collect())
    }
}
