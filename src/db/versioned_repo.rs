// src/db/versioned_repo.rs

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{Executor, FromRow, PgPool, Postgres};

use crate::{common::error::AppError, models::proposal::VersionedRow};

/// As quatro tabelas versionadas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Profile,
    References,
    Layout,
    Content,
}

impl EntityKind {
    pub fn table(self) -> &'static str {
        match self {
            EntityKind::Profile => "tenant_profiles",
            EntityKind::References => "tenant_references",
            EntityKind::Layout => "proposal_layouts",
            EntityKind::Content => "proposal_content",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Profile => "Perfil do tenant",
            EntityKind::References => "Referências do tenant",
            EntityKind::Layout => "Layout de proposta",
            EntityKind::Content => "Proposta",
        }
    }

    fn has_slug(self) -> bool {
        matches!(self, EntityKind::Content)
    }
}

/// Chave natural de uma linha versionada (o tenant vem do escopo).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityKey {
    pub kind: EntityKind,
    pub slug: Option<String>,
    pub is_draft: bool,
}

impl EntityKey {
    pub fn profile(is_draft: bool) -> Self {
        Self { kind: EntityKind::Profile, slug: None, is_draft }
    }

    pub fn references(is_draft: bool) -> Self {
        Self { kind: EntityKind::References, slug: None, is_draft }
    }

    pub fn layout(is_draft: bool) -> Self {
        Self { kind: EntityKind::Layout, slug: None, is_draft }
    }

    pub fn content(slug: impl Into<String>, is_draft: bool) -> Self {
        Self { kind: EntityKind::Content, slug: Some(slug.into()), is_draft }
    }

    /// Texto usado nas mensagens de `NotFound`.
    pub fn describe(&self, tenant_id: &str) -> String {
        let state = if self.is_draft { "rascunho" } else { "publicado" };
        match &self.slug {
            Some(slug) => format!("{tenant_id}/{slug} ({state})"),
            None => format!("{tenant_id} ({state})"),
        }
    }

    fn slug_column(&self) -> &'static str {
        if self.kind.has_slug() { "slug" } else { "NULL::text" }
    }

    fn slug_filter(&self) -> &'static str {
        if self.kind.has_slug() { " AND slug = $3" } else { "" }
    }
}

/// Um dono de slug publicado, como devolvido por `find_live_proposal_tenants`.
#[derive(Debug, Clone, FromRow)]
pub struct LiveSlugRow {
    pub tenant_id: String,
    pub updated_at: DateTime<Utc>,
}

const COLUMNS: &str = "id, tenant_id, {slug} AS slug, data, version, is_draft, created_at, updated_at";

fn columns(key: &EntityKey) -> String {
    COLUMNS.replace("{slug}", key.slug_column())
}

#[derive(Clone)]
pub struct VersionedRepository {
    pool: PgPool,
}

impl VersionedRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Linha mais recente para a chave (no máximo uma, pelo índice único).
    pub async fn get<'e, E>(
        &self,
        executor: E,
        tenant_id: &str,
        key: &EntityKey,
    ) -> Result<Option<VersionedRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT {cols}
            FROM {table}
            WHERE tenant_id = $1 AND is_draft = $2{slug}
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
            cols = columns(key),
            table = key.kind.table(),
            slug = key.slug_filter(),
        );

        let mut query = sqlx::query_as::<_, VersionedRow>(&sql)
            .bind(tenant_id)
            .bind(key.is_draft);
        if let Some(slug) = &key.slug {
            query = query.bind(slug);
        }

        Ok(query.fetch_optional(executor).await?)
    }

    /// Como `get`, mas com `is_draft = true` cai para a linha publicada se não houver rascunho.
    pub async fn get_preferring<'e, E>(
        &self,
        executor: E,
        tenant_id: &str,
        key: &EntityKey,
    ) -> Result<Option<VersionedRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            SELECT {cols}
            FROM {table}
            WHERE tenant_id = $1 AND (is_draft = $2 OR is_draft = FALSE){slug}
            ORDER BY is_draft DESC, updated_at DESC
            LIMIT 1
            "#,
            cols = columns(key),
            table = key.kind.table(),
            slug = key.slug_filter(),
        );

        let mut query = sqlx::query_as::<_, VersionedRow>(&sql)
            .bind(tenant_id)
            .bind(key.is_draft);
        if let Some(slug) = &key.slug {
            query = query.bind(slug);
        }

        Ok(query.fetch_optional(executor).await?)
    }

    /// Cria ou atualiza a linha da chave. Última escrita vence.
    pub async fn upsert<'e, E>(
        &self,
        executor: E,
        tenant_id: &str,
        key: &EntityKey,
        data: &Value,
    ) -> Result<VersionedRow, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = if key.kind.has_slug() {
            format!(
                r#"
                INSERT INTO {table} (tenant_id, is_draft, data, slug)
                VALUES ($1, $2, $4, $3)
                ON CONFLICT (tenant_id, slug, is_draft)
                DO UPDATE SET data = EXCLUDED.data, updated_at = clock_timestamp()
                RETURNING {cols}
                "#,
                table = key.kind.table(),
                cols = columns(key),
            )
        } else {
            format!(
                r#"
                INSERT INTO {table} (tenant_id, is_draft, data)
                VALUES ($1, $2, $3)
                ON CONFLICT (tenant_id, is_draft)
                DO UPDATE SET data = EXCLUDED.data, updated_at = clock_timestamp()
                RETURNING {cols}
                "#,
                table = key.kind.table(),
                cols = columns(key),
            )
        };

        let mut query = sqlx::query_as::<_, VersionedRow>(&sql)
            .bind(tenant_id)
            .bind(key.is_draft);
        if let Some(slug) = &key.slug {
            query = query.bind(slug);
        }

        Ok(query.bind(data).fetch_one(executor).await?)
    }

    /// Remove a linha da chave. `true` se ela existia.
    pub async fn delete<'e, E>(&self, executor: E, tenant_id: &str, key: &EntityKey) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "DELETE FROM {table} WHERE tenant_id = $1 AND is_draft = $2{slug}",
            table = key.kind.table(),
            slug = key.slug_filter(),
        );

        let mut query = sqlx::query(&sql).bind(tenant_id).bind(key.is_draft);
        if let Some(slug) = &key.slug {
            query = query.bind(slug);
        }

        let result = query.execute(executor).await?;
        Ok(result.rows_affected() > 0)
    }

    /// Conteúdos do tenant, mais recentes primeiro. `is_draft = None` traz os dois estados.
    pub async fn list_content<'e, E>(
        &self,
        executor: E,
        tenant_id: &str,
        is_draft: Option<bool>,
    ) -> Result<Vec<VersionedRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, VersionedRow>(
            r#"
            SELECT id, tenant_id, slug, data, version, is_draft, created_at, updated_at
            FROM proposal_content
            WHERE tenant_id = $1 AND ($2::boolean IS NULL OR is_draft = $2)
            ORDER BY updated_at DESC
            "#,
        )
        .bind(tenant_id)
        .bind(is_draft)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }

    /// A única leitura entre tenants: quem publicou `slug`, mais recente primeiro.
    ///
    /// Roda direto no pool (sem carimbo); a função SQL libera só linhas publicadas.
    pub async fn find_live_slug_owners(&self, slug: &str) -> Result<Vec<LiveSlugRow>, AppError> {
        let rows = sqlx::query_as::<_, LiveSlugRow>(
            "SELECT tenant_id, updated_at FROM find_live_proposal_tenants($1)",
        )
        .bind(slug)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
