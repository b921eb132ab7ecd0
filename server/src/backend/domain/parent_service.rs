//! Parent accounts: profile, shipping address, list finalization and the
//! per-parent gift approval policy.

use std::sync::Arc;
use tracing::{info, warn};

use crate::backend::domain::clock::Clock;
use crate::backend::domain::commands::family::CreateParentCommand;
use crate::backend::domain::errors::{LedgerError, LedgerResult};
use crate::backend::domain::models::approval_settings::GiftApprovalSettings;
use crate::backend::domain::models::parent::Parent;
use crate::backend::storage::csv::{ApprovalSettingsRepository, CsvConnection, ParentRepository};
use crate::backend::storage::{ApprovalSettingsStorage, ParentStorage};

#[derive(Clone)]
pub struct ParentService {
    parent_repository: ParentRepository,
    settings_repository: ApprovalSettingsRepository,
    clock: Arc<dyn Clock>,
}

impl ParentService {
    pub fn new(csv_conn: Arc<CsvConnection>, clock: Arc<dyn Clock>) -> Self {
        let parent_repository = ParentRepository::new((*csv_conn).clone());
        let settings_repository = ApprovalSettingsRepository::new((*csv_conn).clone());
        Self {
            parent_repository,
            settings_repository,
            clock,
        }
    }

    pub async fn create_parent(&self, command: CreateParentCommand) -> LedgerResult<Parent> {
        info!("Creating parent: {}", command.name);

        let name = command.name.trim();
        if name.is_empty() {
            return Err(LedgerError::Validation("Parent name cannot be empty".to_string()));
        }
        let email = command.email.trim();
        if !email.contains('@') {
            return Err(LedgerError::Validation(format!("Invalid email address: {}", email)));
        }

        let now = self.clock.now();
        let parent = Parent {
            id: Parent::generate_id(),
            name: name.to_string(),
            email: email.to_string(),
            shipping_address: normalize_address(command.shipping_address),
            lists_finalized: false,
            child_ids: Vec::new(),
            wallet_ledger: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.parent_repository.store_parent(&parent).await?;

        info!("Created parent {}", parent.id);
        Ok(parent)
    }

    /// Load the caller's own parent document
    pub async fn get_parent(&self, parent_id: &str) -> LedgerResult<Parent> {
        self.parent_repository
            .get_parent(parent_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("Parent", parent_id))
    }

    pub async fn update_parent(&self, parent: &Parent) -> LedgerResult<()> {
        Ok(self.parent_repository.update_parent(parent).await?)
    }

    pub async fn update_shipping_address(
        &self,
        parent_id: &str,
        shipping_address: Option<String>,
    ) -> LedgerResult<Parent> {
        info!("Updating shipping address for parent {}", parent_id);

        let mut parent = self.get_parent(parent_id).await?;
        parent.shipping_address = normalize_address(shipping_address);
        parent.updated_at = self.clock.now();
        self.parent_repository.update_parent(&parent).await?;
        Ok(parent)
    }

    /// Lock or unlock every child's gift list
    pub async fn set_lists_finalized(&self, parent_id: &str, finalized: bool) -> LedgerResult<Parent> {
        info!("Setting lists_finalized={} for parent {}", finalized, parent_id);

        let mut parent = self.get_parent(parent_id).await?;
        if parent.lists_finalized == finalized {
            warn!("Parent {} lists_finalized already {}", parent_id, finalized);
            return Ok(parent);
        }
        parent.lists_finalized = finalized;
        parent.updated_at = self.clock.now();
        self.parent_repository.update_parent(&parent).await?;
        Ok(parent)
    }

    /// The parent's approval policy, falling back to the defaults
    pub async fn get_approval_settings(&self, parent_id: &str) -> LedgerResult<GiftApprovalSettings> {
        let settings = self.settings_repository.get_approval_settings(parent_id).await?;
        Ok(settings.unwrap_or_default())
    }

    pub async fn update_approval_settings(
        &self,
        parent_id: &str,
        settings: GiftApprovalSettings,
    ) -> LedgerResult<GiftApprovalSettings> {
        info!("Updating approval settings for parent {}: {:?}", parent_id, settings);

        self.get_parent(parent_id).await?;
        settings.validate().map_err(LedgerError::Validation)?;
        self.settings_repository.store_approval_settings(parent_id, &settings).await?;
        Ok(settings)
    }
}

fn normalize_address(address: Option<String>) -> Option<String> {
    address
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::clock::FixedClock;
    use crate::backend::storage::csv::test_utils::{sample_time, TestEnvironment};

    async fn setup() -> (ParentService, TestEnvironment) {
        let env = TestEnvironment::new().await.unwrap();
        let service = ParentService::new(
            Arc::new(env.connection.clone()),
            Arc::new(FixedClock::new(sample_time())),
        );
        (service, env)
    }

    fn command(name: &str, email: &str) -> CreateParentCommand {
        CreateParentCommand {
            name: name.to_string(),
            email: email.to_string(),
            shipping_address: Some(" 1 North Pole Rd ".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_parent() {
        let (service, _env) = setup().await;

        let parent = service.create_parent(command("Robin", "robin@example.com")).await.unwrap();
        assert_eq!(parent.shipping_address.as_deref(), Some("1 North Pole Rd"));
        assert!(!parent.lists_finalized);

        assert_eq!(service.get_parent(&parent.id).await.unwrap(), parent);
        assert!(matches!(
            service.create_parent(command("Robin", "not-an-email")).await,
            Err(LedgerError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_settings_default_until_updated() {
        let (service, _env) = setup().await;
        let parent = service.create_parent(command("Robin", "robin@example.com")).await.unwrap();

        assert_eq!(
            service.get_approval_settings(&parent.id).await.unwrap(),
            GiftApprovalSettings::default()
        );

        let custom = GiftApprovalSettings {
            max_reward_gifts_per_year: 1,
            ..GiftApprovalSettings::default()
        };
        service.update_approval_settings(&parent.id, custom.clone()).await.unwrap();
        assert_eq!(service.get_approval_settings(&parent.id).await.unwrap(), custom);

        let invalid = GiftApprovalSettings {
            max_reward_price_cents: -5,
            ..GiftApprovalSettings::default()
        };
        assert!(matches!(
            service.update_approval_settings(&parent.id, invalid).await,
            Err(LedgerError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_finalize_and_shipping_address() {
        let (service, _env) = setup().await;
        let parent = service.create_parent(command("Robin", "robin@example.com")).await.unwrap();

        let finalized = service.set_lists_finalized(&parent.id, true).await.unwrap();
        assert!(finalized.lists_finalized);

        let moved = service.update_shipping_address(&parent.id, Some("   ".to_string())).await.unwrap();
        assert!(moved.shipping_address.is_none());

        assert!(matches!(
            service.set_lists_finalized("parent::missing", true).await,
            Err(LedgerError::NotFound { .. })
        ));
    }
}
