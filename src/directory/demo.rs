//! Canned directory data for demos and local development.

use crate::core::{DirectoryError, DirectoryProvider, Group, Identity};
use async_trait::async_trait;

/// A [`DirectoryProvider`] serving a small fixed organization. Selected at
/// configuration time when no real directory backend is configured.
pub struct DemoDirectory {
    users: Vec<Identity>,
    groups: Vec<(Group, Vec<usize>)>,
}

impl DemoDirectory {
    pub fn new() -> Self {
        let users = vec![
            Identity {
                id: "demo-user-1".to_string(),
                display_name: "Alice Johnson".to_string(),
                email: "alice.johnson@contoso.com".to_string(),
                job_title: "Engineering Manager".to_string(),
                department: "Engineering".to_string(),
            },
            Identity {
                id: "demo-user-2".to_string(),
                display_name: "Bob Smith".to_string(),
                email: "bob.smith@contoso.com".to_string(),
                job_title: "Software Engineer".to_string(),
                department: "Engineering".to_string(),
            },
            Identity {
                id: "demo-user-3".to_string(),
                display_name: "Carol White".to_string(),
                email: "carol.white@contoso.com".to_string(),
                job_title: "Product Manager".to_string(),
                department: "Product".to_string(),
            },
            // A service account without a mailbox; exercised by the
            // dispatcher's skip path.
            Identity {
                id: "demo-user-4".to_string(),
                display_name: "Build Bot".to_string(),
                email: String::new(),
                job_title: "Automation".to_string(),
                department: "Engineering".to_string(),
            },
        ];
        let groups = vec![
            (
                Group {
                    id: "demo-group-eng".to_string(),
                    display_name: "Engineering".to_string(),
                    description: "All engineers".to_string(),
                },
                vec![0, 1, 3],
            ),
            (
                Group {
                    id: "demo-group-product".to_string(),
                    display_name: "Product".to_string(),
                    description: "Product management".to_string(),
                },
                vec![2],
            ),
        ];
        Self { users, groups }
    }
}

impl Default for DemoDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DirectoryProvider for DemoDirectory {
    async fn list_users(&self) -> Result<Vec<Identity>, DirectoryError> {
        Ok(self.users.clone())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<Identity>, DirectoryError> {
        Ok(self.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn list_groups(&self) -> Result<Vec<Group>, DirectoryError> {
        Ok(self.groups.iter().map(|(g, _)| g.clone()).collect())
    }

    async fn list_group_members(&self, group_id: &str) -> Result<Vec<Identity>, DirectoryError> {
        let members = self
            .groups
            .iter()
            .find(|(g, _)| g.id == group_id)
            .map(|(_, indices)| indices.iter().map(|&i| self.users[i].clone()).collect())
            .unwrap_or_default();
        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn group_members_come_from_the_user_set() {
        let directory = DemoDirectory::new();
        let members = directory.list_group_members("demo-group-eng").await.unwrap();
        assert_eq!(members.len(), 3);
        assert!(members.iter().any(|m| m.display_name == "Alice Johnson"));
    }

    #[tokio::test]
    async fn looks_up_a_single_user_by_id() {
        let directory = DemoDirectory::new();
        let user = directory.get_user("demo-user-2").await.unwrap().unwrap();
        assert_eq!(user.display_name, "Bob Smith");
        assert!(directory.get_user("no-such-id").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_group_is_empty() {
        let directory = DemoDirectory::new();
        let members = directory.list_group_members("nope").await.unwrap();
        assert!(members.is_empty());
    }
}
