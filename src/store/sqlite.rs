// src/store/sqlite.rs — SQLite-backed instance store

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Mutex;
use uuid::Uuid;

use crate::store::{schema, InstanceStore, IntegrationInstance};

const COLUMNS: &str = "id, organisation_id, user_id, integration_type, active, \
                       encrypted_credentials, disabled_tools, system_prompt_override, \
                       created_at, updated_at";

/// Instance persistence on SQLite. Operations are short local statements;
/// the connection is shared behind a mutex that is never held across an
/// await point.
pub struct SqliteInstanceStore {
    conn: Mutex<Connection>,
}

impl SqliteInstanceStore {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        schema::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        schema::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("sqlite connection lock poisoned"))
    }
}

/// Column values as they come off the wire, before parsing.
struct RawInstance {
    id: String,
    organisation_id: String,
    user_id: Option<String>,
    integration_type: String,
    active: bool,
    encrypted_credentials: Option<String>,
    disabled_tools: String,
    system_prompt_override: Option<String>,
    created_at: String,
    updated_at: String,
}

fn read_raw(row: &Row<'_>) -> rusqlite::Result<RawInstance> {
    Ok(RawInstance {
        id: row.get(0)?,
        organisation_id: row.get(1)?,
        user_id: row.get(2)?,
        integration_type: row.get(3)?,
        active: row.get(4)?,
        encrypted_credentials: row.get(5)?,
        disabled_tools: row.get(6)?,
        system_prompt_override: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

impl TryFrom<RawInstance> for IntegrationInstance {
    type Error = anyhow::Error;

    fn try_from(raw: RawInstance) -> Result<Self> {
        let disabled: Vec<String> = serde_json::from_str(&raw.disabled_tools)?;
        Ok(Self {
            id: Uuid::parse_str(&raw.id)?,
            organisation_id: Uuid::parse_str(&raw.organisation_id)?,
            user_id: raw.user_id.as_deref().map(Uuid::parse_str).transpose()?,
            integration_type: raw.integration_type,
            active: raw.active,
            encrypted_credentials: raw.encrypted_credentials,
            disabled_tools: disabled.into_iter().collect(),
            system_prompt_override: raw.system_prompt_override,
            created_at: DateTime::parse_from_rfc3339(&raw.created_at)?.with_timezone(&Utc),
            updated_at: DateTime::parse_from_rfc3339(&raw.updated_at)?.with_timezone(&Utc),
        })
    }
}

#[async_trait]
impl InstanceStore for SqliteInstanceStore {
    async fn get(&self, id: Uuid) -> Result<Option<IntegrationInstance>> {
        let conn = self.lock()?;
        let raw = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM integration_instances WHERE id = ?1"),
                params![id.to_string()],
                read_raw,
            )
            .optional()?;
        raw.map(IntegrationInstance::try_from).transpose()
    }

    async fn list_for_organisation(
        &self,
        organisation_id: Uuid,
    ) -> Result<Vec<IntegrationInstance>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM integration_instances
             WHERE organisation_id = ?1 ORDER BY integration_type"
        ))?;
        let rows = stmt.query_map(params![organisation_id.to_string()], read_raw)?;

        let mut instances = Vec::new();
        for raw in rows {
            instances.push(IntegrationInstance::try_from(raw?)?);
        }
        Ok(instances)
    }

    async fn upsert(&self, instance: &IntegrationInstance) -> Result<()> {
        let disabled = serde_json::to_string(
            &instance.disabled_tools.iter().collect::<Vec<_>>(),
        )?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO integration_instances
                (id, organisation_id, user_id, integration_type, active,
                 encrypted_credentials, disabled_tools, system_prompt_override,
                 created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(id) DO UPDATE SET
                active = excluded.active,
                encrypted_credentials = excluded.encrypted_credentials,
                disabled_tools = excluded.disabled_tools,
                system_prompt_override = excluded.system_prompt_override,
                updated_at = excluded.updated_at",
            params![
                instance.id.to_string(),
                instance.organisation_id.to_string(),
                instance.user_id.map(|u| u.to_string()),
                instance.integration_type,
                instance.active,
                instance.encrypted_credentials,
                disabled,
                instance.system_prompt_override,
                instance.created_at.to_rfc3339(),
                instance.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    async fn set_credentials(&self, id: Uuid, ciphertext: Option<String>) -> Result<()> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE integration_instances
             SET encrypted_credentials = ?1, updated_at = ?2
             WHERE id = ?3",
            params![ciphertext, Utc::now().to_rfc3339(), id.to_string()],
        )?;
        if updated == 0 {
            bail!("instance {id} not found");
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM integration_instances WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(())
    }
}
