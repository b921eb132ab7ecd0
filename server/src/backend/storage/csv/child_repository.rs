//! # Child Repository
//!
//! Each child lives in `children/{child_dir}/child.yaml` with its gift list,
//! request records and neighbor ledger.

use anyhow::Result;
use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::connection::CsvConnection;
use crate::backend::domain::models::child::Child;
use crate::backend::storage::traits::ChildStorage;

const CHILD_FILE_NAME: &str = "child.yaml";

#[derive(Clone)]
pub struct ChildRepository {
    connection: CsvConnection,
}

impl ChildRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }

    fn child_yaml_path(&self, child_id: &str) -> PathBuf {
        self.connection.child_directory(child_id).join(CHILD_FILE_NAME)
    }

    /// Load every child document under the children directory
    fn discover_children(&self) -> Result<Vec<Child>> {
        let children_dir = self.connection.children_directory();
        if !children_dir.exists() {
            debug!("Children directory doesn't exist, returning empty list");
            return Ok(Vec::new());
        }

        let mut children = Vec::new();
        for entry in fs::read_dir(&children_dir)? {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }

            match self.connection.read_yaml::<Child>(&path.join(CHILD_FILE_NAME)) {
                Ok(Some(child)) => children.push(child),
                Ok(None) => debug!("Directory {:?} doesn't contain a child", path),
                Err(e) => warn!("Error loading child from {:?}: {}", path, e),
            }
        }

        children.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(children)
    }
}

#[async_trait]
impl ChildStorage for ChildRepository {
    async fn store_child(&self, child: &Child) -> Result<()> {
        let path = self.child_yaml_path(&child.id);
        if path.exists() {
            return Err(anyhow::anyhow!("Child already exists: {}", child.id));
        }

        let lock = self.connection.write_lock();
        let _guard = lock.lock().await;
        self.connection.write_yaml(&path, child)?;

        info!("Stored child {} ({})", child.name, child.id);
        Ok(())
    }

    async fn get_child(&self, child_id: &str) -> Result<Option<Child>> {
        self.connection.read_yaml(&self.child_yaml_path(child_id))
    }

    async fn update_child(&self, child: &Child) -> Result<()> {
        let path = self.child_yaml_path(&child.id);
        if !path.exists() {
            return Err(anyhow::anyhow!("Child not found: {}", child.id));
        }

        let lock = self.connection.write_lock();
        let _guard = lock.lock().await;
        self.connection.write_yaml(&path, child)?;

        debug!("Updated child: {}", child.id);
        Ok(())
    }

    async fn list_children_for_parent(&self, parent_id: &str) -> Result<Vec<Child>> {
        let children = self.discover_children()?;
        Ok(children.into_iter().filter(|c| c.parent_id == parent_id).collect())
    }
}
