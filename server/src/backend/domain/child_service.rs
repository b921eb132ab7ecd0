//! Children: creation, ownership checks, behavior points and gift lists.
//!
//! Every service that acts on a child on behalf of a parent goes through
//! `get_owned_child`, so a missing child is `NotFound` and someone else's
//! child is `Forbidden` everywhere.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::backend::domain::clock::Clock;
use crate::backend::domain::commands::family::{AdjustScoreCommand, CreateChildCommand, SetScoreCommand};
use crate::backend::domain::errors::{LedgerError, LedgerResult};
use crate::backend::domain::models::child::Child;
use crate::backend::domain::parent_service::ParentService;
use crate::backend::storage::csv::{CatalogRepository, ChildRepository, CsvConnection};
use crate::backend::storage::{CatalogStorage, ChildStorage};

const MAX_NAME_LENGTH: usize = 100;

#[derive(Clone)]
pub struct ChildService {
    child_repository: ChildRepository,
    catalog_repository: CatalogRepository,
    parent_service: ParentService,
    ledger_lock: Arc<Mutex<()>>,
    clock: Arc<dyn Clock>,
}

impl ChildService {
    pub fn new(csv_conn: Arc<CsvConnection>, parent_service: ParentService, clock: Arc<dyn Clock>) -> Self {
        let child_repository = ChildRepository::new((*csv_conn).clone());
        let catalog_repository = CatalogRepository::new((*csv_conn).clone());
        Self {
            child_repository,
            catalog_repository,
            parent_service,
            ledger_lock: csv_conn.ledger_lock(),
            clock,
        }
    }

    pub async fn add_child(&self, parent_id: &str, command: CreateChildCommand) -> LedgerResult<Child> {
        info!("Adding child {} for parent {}", command.name, parent_id);

        let name = command.name.trim();
        if name.is_empty() {
            return Err(LedgerError::Validation("Child name cannot be empty".to_string()));
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err(LedgerError::Validation(format!(
                "Child name cannot exceed {} characters",
                MAX_NAME_LENGTH
            )));
        }

        let mut parent = self.parent_service.get_parent(parent_id).await?;
        let now = self.clock.now();
        let child = Child::new(parent_id, name, command.starting_score, now);
        self.child_repository.store_child(&child).await?;

        parent.child_ids.push(child.id.clone());
        parent.updated_at = now;
        self.parent_service.update_parent(&parent).await?;

        info!("Added child {} with score {}", child.id, child.score365);
        Ok(child)
    }

    /// Load a child, checking it exists and belongs to `parent_id`
    pub async fn get_owned_child(&self, parent_id: &str, child_id: &str) -> LedgerResult<Child> {
        let child = self
            .child_repository
            .get_child(child_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Child", child_id))?;

        if child.parent_id != parent_id {
            warn!("Parent {} tried to act on child {} of {}", parent_id, child_id, child.parent_id);
            return Err(LedgerError::Forbidden(format!(
                "Child {} does not belong to this parent",
                child_id
            )));
        }
        Ok(child)
    }

    /// Load a child without an ownership check, for internal bookkeeping
    pub async fn get_child(&self, child_id: &str) -> LedgerResult<Child> {
        self.child_repository
            .get_child(child_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Child", child_id))
    }

    pub async fn update_child(&self, child: &Child) -> LedgerResult<()> {
        Ok(self.child_repository.update_child(child).await?)
    }

    pub async fn list_children(&self, parent_id: &str) -> LedgerResult<Vec<Child>> {
        Ok(self.child_repository.list_children_for_parent(parent_id).await?)
    }

    /// Award or remove behavior points, clamped to 0..=365
    pub async fn adjust_score(&self, parent_id: &str, command: AdjustScoreCommand) -> LedgerResult<Child> {
        info!(
            "Adjusting score of child {} by {} ({})",
            command.child_id,
            command.delta,
            command.reason.as_deref().unwrap_or("no reason given")
        );

        let _ledger = self.ledger_lock.lock().await;
        let mut child = self.get_owned_child(parent_id, &command.child_id).await?;
        let before = child.score365;
        let after = child.adjust_score(command.delta, self.clock.now());
        self.child_repository.update_child(&child).await?;

        info!("Child {} score {} -> {}", child.id, before, after);
        Ok(child)
    }

    pub async fn set_score(&self, parent_id: &str, command: SetScoreCommand) -> LedgerResult<Child> {
        info!(
            "Setting score of child {} to {} ({})",
            command.child_id,
            command.score,
            command.reason.as_deref().unwrap_or("no reason given")
        );

        let _ledger = self.ledger_lock.lock().await;
        let mut child = self.get_owned_child(parent_id, &command.child_id).await?;
        let before = child.score365;
        let after = child.set_score(command.score, self.clock.now());
        self.child_repository.update_child(&child).await?;

        info!("Child {} score {} -> {}", child.id, before, after);
        Ok(child)
    }

    pub async fn add_to_gift_list(
        &self,
        parent_id: &str,
        child_id: &str,
        catalog_item_id: &str,
    ) -> LedgerResult<Child> {
        info!("Adding {} to gift list of child {}", catalog_item_id, child_id);

        self.ensure_lists_open(parent_id).await?;
        let mut child = self.get_owned_child(parent_id, child_id).await?;
        self.catalog_repository
            .get_catalog_item(catalog_item_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Catalog item", catalog_item_id))?;

        if child.has_gift_on_list(catalog_item_id) {
            return Err(LedgerError::Conflict(format!(
                "{} is already on {}'s gift list",
                catalog_item_id, child.name
            )));
        }

        child.gift_list.push(catalog_item_id.to_string());
        child.updated_at = self.clock.now();
        self.child_repository.update_child(&child).await?;
        Ok(child)
    }

    pub async fn remove_from_gift_list(
        &self,
        parent_id: &str,
        child_id: &str,
        catalog_item_id: &str,
    ) -> LedgerResult<Child> {
        info!("Removing {} from gift list of child {}", catalog_item_id, child_id);

        self.ensure_lists_open(parent_id).await?;
        let mut child = self.get_owned_child(parent_id, child_id).await?;
        if !child.has_gift_on_list(catalog_item_id) {
            return Err(LedgerError::not_found("Gift list item", catalog_item_id));
        }

        child.gift_list.retain(|id| id != catalog_item_id);
        child.updated_at = self.clock.now();
        self.child_repository.update_child(&child).await?;
        Ok(child)
    }

    async fn ensure_lists_open(&self, parent_id: &str) -> LedgerResult<()> {
        let parent = self.parent_service.get_parent(parent_id).await?;
        if parent.lists_finalized {
            return Err(LedgerError::InvalidState(
                "Gift lists are finalized; unfinalize them before making changes".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::clock::FixedClock;
    use crate::backend::domain::commands::family::CreateParentCommand;
    use crate::backend::storage::csv::test_utils::{sample_catalog_item, sample_time, TestEnvironment};

    struct Fixture {
        service: ChildService,
        parent_service: ParentService,
        parent_id: String,
        env: TestEnvironment,
    }

    async fn setup() -> Fixture {
        let env = TestEnvironment::new().await.unwrap();
        let conn = Arc::new(env.connection.clone());
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(sample_time()));
        let parent_service = ParentService::new(conn.clone(), clock.clone());
        let service = ChildService::new(conn, parent_service.clone(), clock);

        let parent = parent_service
            .create_parent(CreateParentCommand {
                name: "Casey".to_string(),
                email: "casey@example.com".to_string(),
                shipping_address: None,
            })
            .await
            .unwrap();

        Fixture {
            service,
            parent_service,
            parent_id: parent.id,
            env,
        }
    }

    async fn add_child(fixture: &Fixture, name: &str, score: u32) -> Child {
        fixture
            .service
            .add_child(
                &fixture.parent_id,
                CreateChildCommand {
                    name: name.to_string(),
                    starting_score: score,
                },
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_add_child_links_parent() {
        let fixture = setup().await;
        let child = add_child(&fixture, "Mia", 30).await;

        let parent = fixture.parent_service.get_parent(&fixture.parent_id).await.unwrap();
        assert_eq!(parent.child_ids, vec![child.id.clone()]);
        assert_eq!(fixture.service.list_children(&fixture.parent_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ownership_is_enforced() {
        let fixture = setup().await;
        let child = add_child(&fixture, "Mia", 30).await;

        assert!(matches!(
            fixture.service.get_owned_child("parent::stranger", &child.id).await,
            Err(LedgerError::Forbidden(_))
        ));
        assert!(matches!(
            fixture.service.get_owned_child(&fixture.parent_id, "child::missing").await,
            Err(LedgerError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_adjust_score_clamps() {
        let fixture = setup().await;
        let child = add_child(&fixture, "Mia", 360).await;

        let raised = fixture
            .service
            .adjust_score(
                &fixture.parent_id,
                AdjustScoreCommand {
                    child_id: child.id.clone(),
                    delta: 50,
                    reason: Some("Helped with dishes".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(raised.score365, 365);

        let lowered = fixture
            .service
            .adjust_score(
                &fixture.parent_id,
                AdjustScoreCommand {
                    child_id: child.id,
                    delta: -1_000,
                    reason: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(lowered.score365, 0);
    }

    #[tokio::test]
    async fn test_set_score_overwrites_and_clamps() {
        let fixture = setup().await;
        let child = add_child(&fixture, "Mia", 12).await;

        let set = fixture
            .service
            .set_score(
                &fixture.parent_id,
                SetScoreCommand {
                    child_id: child.id.clone(),
                    score: 200,
                    reason: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(set.score365, 200);

        let capped = fixture
            .service
            .set_score(
                &fixture.parent_id,
                SetScoreCommand {
                    child_id: child.id.clone(),
                    score: 9_000,
                    reason: Some("Typo".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(capped.score365, 365);
        assert_eq!(fixture.service.get_child(&child.id).await.unwrap().score365, 365);
    }

    #[tokio::test]
    async fn test_gift_list_blocked_when_finalized() {
        let fixture = setup().await;
        let child = add_child(&fixture, "Mia", 30).await;
        let item = sample_catalog_item("Drum", 1_500);
        CatalogRepository::new(fixture.env.connection.clone())
            .store_catalog_item(&item)
            .await
            .unwrap();

        let updated = fixture
            .service
            .add_to_gift_list(&fixture.parent_id, &child.id, &item.id)
            .await
            .unwrap();
        assert!(updated.has_gift_on_list(&item.id));
        assert!(matches!(
            fixture.service.add_to_gift_list(&fixture.parent_id, &child.id, &item.id).await,
            Err(LedgerError::Conflict(_))
        ));

        fixture.parent_service.set_lists_finalized(&fixture.parent_id, true).await.unwrap();
        assert!(matches!(
            fixture.service.remove_from_gift_list(&fixture.parent_id, &child.id, &item.id).await,
            Err(LedgerError::InvalidState(_))
        ));

        fixture.parent_service.set_lists_finalized(&fixture.parent_id, false).await.unwrap();
        let removed = fixture
            .service
            .remove_from_gift_list(&fixture.parent_id, &child.id, &item.id)
            .await
            .unwrap();
        assert!(removed.gift_list.is_empty());
    }
}
