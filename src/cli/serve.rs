// src/cli/serve.rs — Server assembly and startup

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::api::{self, ApiState};
use crate::infra::config::Config;
use crate::integrations::adapters::builtin_registry;
use crate::integrations::dispatch::Dispatcher;
use crate::integrations::oauth::TokenRefresher;
use crate::store::crypto::CredentialCipher;
use crate::store::{InstanceStore, SqliteInstanceStore};

pub async fn run_serve(config: &Config) -> anyhow::Result<()> {
    let key = config.crypto.master_key_bytes()?;
    let cipher = Arc::new(CredentialCipher::new(&key));

    let store: Arc<dyn InstanceStore> =
        Arc::new(SqliteInstanceStore::open(Path::new(&config.database.path))?);
    let registry = Arc::new(builtin_registry());
    let refresher = TokenRefresher::new(Duration::from_secs(config.oauth.refresh_timeout_secs))?;

    tracing::info!(
        integrations = registry.len(),
        database = %config.database.path,
        "registry assembled"
    );

    let dispatcher = Arc::new(Dispatcher::new(
        registry.clone(),
        store.clone(),
        cipher.clone(),
        refresher,
    ));

    let state = ApiState {
        registry,
        dispatcher,
        store,
        cipher,
        org_tokens: Arc::new(config.auth.tokens.clone()),
    };

    api::start_server(&config.server, state).await
}
