// src/store/mod.rs — Integration instance persistence

pub mod crypto;
pub mod schema;
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;
use uuid::Uuid;

pub use sqlite::SqliteInstanceStore;

/// One per-organisation activation of an integration type: the per-tenant
/// credential material plus per-tenant tool disablement.
///
/// An instance of a credential-requiring integration with
/// `encrypted_credentials = None` is inert — listed, but not executable.
#[derive(Debug, Clone)]
pub struct IntegrationInstance {
    pub id: Uuid,
    pub organisation_id: Uuid,
    /// The user who activated the integration, when known.
    pub user_id: Option<Uuid>,
    /// Registry key of the integration capability this instance binds to.
    pub integration_type: String,
    pub active: bool,
    /// Opaque ciphertext produced by [`crypto::CredentialCipher`].
    pub encrypted_credentials: Option<String>,
    pub disabled_tools: BTreeSet<String>,
    /// Per-instance override of the integration's system prompt fragment.
    pub system_prompt_override: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IntegrationInstance {
    pub fn new(organisation_id: Uuid, integration_type: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organisation_id,
            user_id: None,
            integration_type: integration_type.into(),
            active: true,
            encrypted_credentials: None,
            disabled_tools: BTreeSet::new(),
            system_prompt_override: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.encrypted_credentials.is_some()
    }
}

/// Persistence collaborator for integration instances. The dispatch layer
/// only reads; the credential write path updates ciphertext.
#[async_trait]
pub trait InstanceStore: Send + Sync {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<IntegrationInstance>>;

    async fn list_for_organisation(
        &self,
        organisation_id: Uuid,
    ) -> anyhow::Result<Vec<IntegrationInstance>>;

    async fn upsert(&self, instance: &IntegrationInstance) -> anyhow::Result<()>;

    /// Replace the stored ciphertext (None clears it, making the instance
    /// inert again).
    async fn set_credentials(&self, id: Uuid, ciphertext: Option<String>) -> anyhow::Result<()>;

    async fn delete(&self, id: Uuid) -> anyhow::Result<()>;
}

/// In-memory store for tests and ephemeral setups.
#[derive(Default)]
pub struct MemoryInstanceStore {
    instances: RwLock<HashMap<Uuid, IntegrationInstance>>,
}

impl MemoryInstanceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InstanceStore for MemoryInstanceStore {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<IntegrationInstance>> {
        let instances = self
            .instances
            .read()
            .map_err(|_| anyhow::anyhow!("instance store lock poisoned"))?;
        Ok(instances.get(&id).cloned())
    }

    async fn list_for_organisation(
        &self,
        organisation_id: Uuid,
    ) -> anyhow::Result<Vec<IntegrationInstance>> {
        let instances = self
            .instances
            .read()
            .map_err(|_| anyhow::anyhow!("instance store lock poisoned"))?;
        let mut result: Vec<_> = instances
            .values()
            .filter(|i| i.organisation_id == organisation_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.integration_type.cmp(&b.integration_type));
        Ok(result)
    }

    async fn upsert(&self, instance: &IntegrationInstance) -> anyhow::Result<()> {
        let mut instances = self
            .instances
            .write()
            .map_err(|_| anyhow::anyhow!("instance store lock poisoned"))?;
        instances.insert(instance.id, instance.clone());
        Ok(())
    }

    async fn set_credentials(&self, id: Uuid, ciphertext: Option<String>) -> anyhow::Result<()> {
        let mut instances = self
            .instances
            .write()
            .map_err(|_| anyhow::anyhow!("instance store lock poisoned"))?;
        let instance = instances
            .get_mut(&id)
            .ok_or_else(|| anyhow::anyhow!("instance {id} not found"))?;
        instance.encrypted_credentials = ciphertext;
        instance.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<()> {
        let mut instances = self
            .instances
            .write()
            .map_err(|_| anyhow::anyhow!("instance store lock poisoned"))?;
        instances.remove(&id);
        Ok(())
    }
}
