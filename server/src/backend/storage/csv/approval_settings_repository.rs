//! # Approval Settings Repository
//!
//! Stored next to the parent document as `approval_settings.yaml`. A parent
//! without the file runs on the default policy.

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

use super::connection::CsvConnection;
use crate::backend::domain::models::approval_settings::GiftApprovalSettings;
use crate::backend::storage::traits::ApprovalSettingsStorage;

const SETTINGS_FILE_NAME: &str = "approval_settings.yaml";

#[derive(Clone)]
pub struct ApprovalSettingsRepository {
    connection: CsvConnection,
}

impl ApprovalSettingsRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn settings_path(&self, parent_id: &str) -> PathBuf {
        self.connection.parent_directory(parent_id).join(SETTINGS_FILE_NAME)
    }
}

#[async_trait]
impl ApprovalSettingsStorage for ApprovalSettingsRepository {
    async fn get_approval_settings(&self, parent_id: &str) -> Result<Option<GiftApprovalSettings>> {
        self.connection.read_yaml(&self.settings_path(parent_id))
    }

    async fn store_approval_settings(&self, parent_id: &str, settings: &GiftApprovalSettings) -> Result<()> {
        let lock = self.connection.write_lock();
        let _guard = lock.lock().await;
        self.connection.write_yaml(&self.settings_path(parent_id), settings)?;

        info!("Stored approval settings for parent {}", parent_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::storage::csv::test_utils::TestEnvironment;

    #[tokio::test]
    async fn test_settings_default_to_none_then_persist() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = ApprovalSettingsRepository::new(env.connection.clone());

        assert!(repo.get_approval_settings("parent::1").await.unwrap().is_none());

        let settings = GiftApprovalSettings {
            auto_approve_rewards: true,
            max_reward_gifts_per_year: 2,
            ..GiftApprovalSettings::default()
        };
        repo.store_approval_settings("parent::1", &settings).await.unwrap();

        assert_eq!(repo.get_approval_settings("parent::1").await.unwrap(), Some(settings));
    }
}
