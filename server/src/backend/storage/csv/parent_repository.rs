//! # Parent Repository
//!
//! Each parent lives in `parents/{parent_dir}/parent.yaml`, wallet ledger
//! included. Parents are discovered by scanning the `parents` directory.

use anyhow::Result;
use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::connection::CsvConnection;
use crate::backend::domain::models::parent::Parent;
use crate::backend::storage::traits::ParentStorage;

const PARENT_FILE_NAME: &str = "parent.yaml";

#[derive(Clone)]
pub struct ParentRepository {
    connection: CsvConnection,
}

impl ParentRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn parent_yaml_path(&self, parent_id: &str) -> PathBuf {
        self.connection.parent_directory(parent_id).join(PARENT_FILE_NAME)
    }

    /// Load every parent document under the parents directory
    fn discover_parents(&self) -> Result<Vec<Parent>> {
        let parents_dir = self.connection.parents_directory();
        if !parents_dir.exists() {
            debug!("Parents directory doesn't exist, returning empty list");
            return Ok(Vec::new());
        }

        let mut parents = Vec::new();
        for entry in fs::read_dir(&parents_dir)? {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }

            match self.connection.read_yaml::<Parent>(&path.join(PARENT_FILE_NAME)) {
                Ok(Some(parent)) => parents.push(parent),
                Ok(None) => debug!("Directory {:?} doesn't contain a parent", path),
                Err(e) => warn!("Error loading parent from {:?}: {}", path, e),
            }
        }

        parents.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(parents)
    }
}

#[async_trait]
impl ParentStorage for ParentRepository {
    async fn store_parent(&self, parent: &Parent) -> Result<()> {
        let path = self.parent_yaml_path(&parent.id);
        if path.exists() {
            return Err(anyhow::anyhow!("Parent already exists: {}", parent.id));
        }

        let lock = self.connection.write_lock();
        let _guard = lock.lock().await;
        self.connection.write_yaml(&path, parent)?;

        info!("Stored parent: {}", parent.id);
        Ok(())
    }

    async fn get_parent(&self, parent_id: &str) -> Result<Option<Parent>> {
        self.connection.read_yaml(&self.parent_yaml_path(parent_id))
    }

    async fn update_parent(&self, parent: &Parent) -> Result<()> {
        let path = self.parent_yaml_path(&parent.id);
        if !path.exists() {
            return Err(anyhow::anyhow!("Parent not found: {}", parent.id));
        }

        let lock = self.connection.write_lock();
        let _guard = lock.lock().await;
        self.connection.write_yaml(&path, parent)?;

        debug!("Updated parent: {}", parent.id);
        Ok(())
    }

    async fn list_parents(&self) -> Result<Vec<Parent>> {
        self.discover_parents()
    }

    async fn find_parent_by_checkout_session(&self, session_id: &str) -> Result<Option<Parent>> {
        let parents = self.discover_parents()?;
        Ok(parents.into_iter().find(|parent| {
            parent
                .wallet_ledger
                .iter()
                .any(|entry| entry.checkout_session_id.as_deref() == Some(session_id))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::models::parent::{PaymentStatus, WalletEntry, WalletEntryType};
    use crate::backend::storage::csv::test_utils::{sample_parent, TestEnvironment};

    #[tokio::test]
    async fn test_store_and_get_parent() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = ParentRepository::new(env.connection.clone());
        let parent = sample_parent("Morgan");

        repo.store_parent(&parent).await.unwrap();

        let loaded = repo.get_parent(&parent.id).await.unwrap().expect("parent exists");
        assert_eq!(loaded, parent);
        assert!(repo.store_parent(&parent).await.is_err());
    }

    #[tokio::test]
    async fn test_update_missing_parent_fails() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = ParentRepository::new(env.connection.clone());

        assert!(repo.update_parent(&sample_parent("Ghost")).await.is_err());
        assert!(repo.get_parent("parent::missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_parent_by_checkout_session() {
        let env = TestEnvironment::new().await.unwrap();
        let repo = ParentRepository::new(env.connection.clone());

        let mut parent = sample_parent("Jordan");
        parent.wallet_ledger.push(WalletEntry {
            id: WalletEntry::generate_id(),
            entry_type: WalletEntryType::TopUp,
            amount_cents: 1_500,
            status: PaymentStatus::Pending,
            checkout_session_id: Some("cs_local_abc".to_string()),
            child_id: None,
            description: "Wallet top-up".to_string(),
            created_at: parent.created_at,
            settled_at: None,
        });
        repo.store_parent(&parent).await.unwrap();
        repo.store_parent(&sample_parent("Other")).await.unwrap();

        let found = repo.find_parent_by_checkout_session("cs_local_abc").await.unwrap();
        assert_eq!(found.map(|p| p.id), Some(parent.id));
        assert!(repo.find_parent_by_checkout_session("cs_local_zzz").await.unwrap().is_none());
        assert_eq!(repo.list_parents().await.unwrap().len(), 2);
    }
}
