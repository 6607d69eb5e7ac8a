// src/services/entity_store.rs

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use sqlx::PgPool;

use crate::{
    common::{db_utils::with_tenant_scope, error::AppError},
    db::{EntityKey, VersionedRepository},
    models::proposal::{
        proposal_title, ProposalContentData, ProposalLayoutData, ProposalSummary, ReferencesCatalog,
        TenantProfileData, Versioned,
    },
};

/// Acesso tipado às quatro entidades versionadas.
///
/// Cada chamada roda numa conexão carimbada com o tenant e devolvida limpa.
#[derive(Clone)]
pub struct EntityStore {
    repo: VersionedRepository,
    pool: PgPool,
}

impl EntityStore {
    pub fn new(repo: VersionedRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    pub async fn get<T>(&self, tenant_id: &str, key: EntityKey) -> Result<Option<Versioned<T>>, AppError>
    where
        T: DeserializeOwned,
    {
        let repo = self.repo.clone();
        let tenant = tenant_id.to_owned();

        let row = with_tenant_scope(&self.pool, tenant_id, move |conn| {
            Box::pin(async move { repo.get(conn, &tenant, &key).await })
        })
        .await?;

        Ok(row.map(|r| r.decode::<T>()).transpose()?)
    }

    /// Rascunho se existir, senão a versão publicada (para pré-visualização).
    pub async fn get_preferring<T>(&self, tenant_id: &str, key: EntityKey) -> Result<Option<Versioned<T>>, AppError>
    where
        T: DeserializeOwned,
    {
        let repo = self.repo.clone();
        let tenant = tenant_id.to_owned();

        let row = with_tenant_scope(&self.pool, tenant_id, move |conn| {
            Box::pin(async move { repo.get_preferring(conn, &tenant, &key).await })
        })
        .await?;

        Ok(row.map(|r| r.decode::<T>()).transpose()?)
    }

    pub async fn save<T>(&self, tenant_id: &str, key: EntityKey, data: &T) -> Result<Versioned<T>, AppError>
    where
        T: Serialize + DeserializeOwned,
    {
        let payload: Value = serde_json::to_value(data)?;
        let repo = self.repo.clone();
        let tenant = tenant_id.to_owned();

        let row = with_tenant_scope(&self.pool, tenant_id, move |conn| {
            Box::pin(async move { repo.upsert(conn, &tenant, &key, &payload).await })
        })
        .await?;

        Ok(row.decode::<T>()?)
    }

    pub async fn delete(&self, tenant_id: &str, key: EntityKey) -> Result<bool, AppError> {
        let repo = self.repo.clone();
        let tenant = tenant_id.to_owned();

        with_tenant_scope(&self.pool, tenant_id, move |conn| {
            Box::pin(async move { repo.delete(conn, &tenant, &key).await })
        })
        .await
    }

    // --- Atalhos por entidade ---

    pub async fn get_profile(&self, tenant_id: &str, is_draft: bool) -> Result<Option<Versioned<TenantProfileData>>, AppError> {
        self.get(tenant_id, EntityKey::profile(is_draft)).await
    }

    pub async fn save_profile(
        &self,
        tenant_id: &str,
        is_draft: bool,
        data: &TenantProfileData,
    ) -> Result<Versioned<TenantProfileData>, AppError> {
        self.save(tenant_id, EntityKey::profile(is_draft), data).await
    }

    pub async fn get_references(&self, tenant_id: &str, is_draft: bool) -> Result<Option<Versioned<ReferencesCatalog>>, AppError> {
        self.get(tenant_id, EntityKey::references(is_draft)).await
    }

    pub async fn save_references(
        &self,
        tenant_id: &str,
        is_draft: bool,
        data: &ReferencesCatalog,
    ) -> Result<Versioned<ReferencesCatalog>, AppError> {
        self.save(tenant_id, EntityKey::references(is_draft), data).await
    }

    pub async fn get_layout(&self, tenant_id: &str, is_draft: bool) -> Result<Option<Versioned<ProposalLayoutData>>, AppError> {
        self.get(tenant_id, EntityKey::layout(is_draft)).await
    }

    pub async fn save_layout(
        &self,
        tenant_id: &str,
        is_draft: bool,
        data: &ProposalLayoutData,
    ) -> Result<Versioned<ProposalLayoutData>, AppError> {
        self.save(tenant_id, EntityKey::layout(is_draft), data).await
    }

    pub async fn get_content(
        &self,
        tenant_id: &str,
        slug: &str,
        is_draft: bool,
    ) -> Result<Option<Versioned<ProposalContentData>>, AppError> {
        self.get(tenant_id, EntityKey::content(slug, is_draft)).await
    }

    pub async fn save_content(
        &self,
        tenant_id: &str,
        slug: &str,
        is_draft: bool,
        data: &ProposalContentData,
    ) -> Result<Versioned<ProposalContentData>, AppError> {
        self.save(tenant_id, EntityKey::content(slug, is_draft), data).await
    }

    pub async fn delete_content(&self, tenant_id: &str, slug: &str, is_draft: bool) -> Result<bool, AppError> {
        self.delete(tenant_id, EntityKey::content(slug, is_draft)).await
    }

    /// Resumo das propostas do tenant, mais recentes primeiro.
    pub async fn list_content(&self, tenant_id: &str, is_draft: Option<bool>) -> Result<Vec<ProposalSummary>, AppError> {
        let repo = self.repo.clone();
        let tenant = tenant_id.to_owned();

        let rows = with_tenant_scope(&self.pool, tenant_id, move |conn| {
            Box::pin(async move { repo.list_content(conn, &tenant, is_draft).await })
        })
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let slug = row.slug.unwrap_or_default();
                ProposalSummary {
                    title: proposal_title(&slug, &row.data),
                    slug,
                    tenant_id: row.tenant_id,
                    tenant_name: None,
                    is_draft: row.is_draft,
                    updated_at: row.updated_at,
                }
            })
            .collect())
    }
}
