// src/config.rs

use std::{env, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    catalog::TemplateCatalog,
    common::db_utils::reject_stamped_connection,
    db::{OrganizationRepository, VersionedRepository},
    services::{access_gate::AccessGate, entity_store::EntityStore, proposal_service::ProposalService},
};

/// Configuração lida do ambiente (`.env` incluso).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub bind_addr: String,
    pub section_catalog_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let db_max_connections = match env::var("DB_MAX_CONNECTIONS") {
            Ok(raw) => raw.parse().context("DB_MAX_CONNECTIONS deve ser um número")?,
            Err(_) => 5,
        };
        let acquire_secs: u64 = match env::var("DB_ACQUIRE_TIMEOUT_SECS") {
            Ok(raw) => raw.parse().context("DB_ACQUIRE_TIMEOUT_SECS deve ser um número")?,
            Err(_) => 3,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            db_max_connections,
            db_acquire_timeout: Duration::from_secs(acquire_secs),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            section_catalog_path: env::var("SECTION_CATALOG_PATH").ok().map(PathBuf::from),
        })
    }
}

/// Pool com a barreira `after_release` contra conexões ainda carimbadas.
pub async fn connect_pool(config: &AppConfig) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(config.db_acquire_timeout)
        .after_release(reject_stamped_connection)
        .connect(&config.database_url)
        .await?;

    Ok(pool)
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_secret: String,
    pub catalog: Arc<TemplateCatalog>,
    pub org_repo: OrganizationRepository,
    pub access_gate: AccessGate,
    pub entity_store: EntityStore,
    pub proposal_service: ProposalService,
}

impl AppState {
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let db_pool = connect_pool(config).await?;
        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let catalog = match &config.section_catalog_path {
            Some(path) => TemplateCatalog::from_file(path)
                .with_context(|| format!("Falha ao carregar o catálogo de seções de {}", path.display()))?,
            None => TemplateCatalog::builtin(),
        };

        Ok(Self::from_parts(db_pool, config.jwt_secret.clone(), catalog))
    }

    // --- Monta o gráfico de dependências ---
    pub fn from_parts(db_pool: PgPool, jwt_secret: String, catalog: TemplateCatalog) -> Self {
        let catalog = Arc::new(catalog);

        let org_repo = OrganizationRepository::new(db_pool.clone());
        let versioned_repo = VersionedRepository::new(db_pool.clone());

        let access_gate = AccessGate::new(org_repo.clone());
        let entity_store = EntityStore::new(versioned_repo.clone(), db_pool.clone());
        let proposal_service =
            ProposalService::new(entity_store.clone(), versioned_repo, org_repo.clone(), catalog.clone());

        Self {
            db_pool,
            jwt_secret,
            catalog,
            org_repo,
            access_gate,
            entity_store,
            proposal_service,
        }
    }
}
