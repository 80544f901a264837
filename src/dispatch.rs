//! The notification dispatcher: resolves directory identities to messaging
//! accounts by email and delivers a direct message to each, collecting a
//! per-recipient outcome report.

use crate::core::{
    DirectoryError, DirectoryProvider, DispatchOutcome, Identity, MessagingProvider,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Coordinates one directory listing with a fan-out of per-recipient
/// resolve/send calls.
///
/// Processing is strictly sequential in provider-return order, and the
/// outcome sequence preserves that order. Per-recipient failures are
/// captured in the outcome records and never abort the remaining sends;
/// the only call-level failure is an unreachable directory.
pub struct NotificationDispatcher {
    directory: Arc<dyn DirectoryProvider>,
    messaging: Arc<dyn MessagingProvider>,
}

impl NotificationDispatcher {
    pub fn new(
        directory: Arc<dyn DirectoryProvider>,
        messaging: Arc<dyn MessagingProvider>,
    ) -> Self {
        Self {
            directory,
            messaging,
        }
    }

    /// Notifies every directory user that resolves to a messaging account.
    #[instrument(skip(self, message))]
    pub async fn notify_all(&self, message: &str) -> Result<Vec<DispatchOutcome>, DirectoryError> {
        let identities = self.directory.list_users().await?;
        Ok(self.dispatch(identities, message).await)
    }

    /// Notifies the members of one directory group. An unknown group id
    /// yields an empty outcome list, not an error.
    #[instrument(skip(self, message))]
    pub async fn notify_group(
        &self,
        group_id: &str,
        message: &str,
    ) -> Result<Vec<DispatchOutcome>, DirectoryError> {
        let identities = self.directory.list_group_members(group_id).await?;
        Ok(self.dispatch(identities, message).await)
    }

    /// Runs the resolve/send loop over one identity set.
    ///
    /// Identities without an email address, and identities whose email does
    /// not resolve to an account, are skipped without producing an outcome.
    /// The skip counts are logged as a diagnostic but deliberately kept out
    /// of the returned report, matching the upstream contract.
    async fn dispatch(&self, identities: Vec<Identity>, message: &str) -> Vec<DispatchOutcome> {
        let total = identities.len();
        let mut outcomes = Vec::new();
        let mut skipped_no_email = 0usize;
        let mut skipped_unresolved = 0usize;

        for identity in identities {
            if !identity.has_email() {
                skipped_no_email += 1;
                continue;
            }

            let Some(account) = self.messaging.resolve_by_email(&identity.email).await else {
                debug!(email = %identity.email, "No messaging account for email, skipping");
                skipped_unresolved += 1;
                continue;
            };

            let receipt = self
                .messaging
                .send_direct_message(&account.id, message)
                .await;
            outcomes.push(DispatchOutcome {
                source: identity.display_name,
                resolved: account.name,
                success: receipt.ok,
                error: receipt.error,
            });
        }

        info!(
            total,
            delivered = outcomes.iter().filter(|o| o.success).count(),
            failed = outcomes.iter().filter(|o| !o.success).count(),
            skipped_no_email,
            skipped_unresolved,
            "Dispatch finished"
        );
        outcomes
    }
}
