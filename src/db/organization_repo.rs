// src/db/organization_repo.rs

use sqlx::PgPool;

use crate::{
    common::error::AppError,
    models::tenancy::{Organization, Tenant},
};

/// Tabelas sem RLS: organizações e tenants. Só o Access Gate e a listagem leem daqui.
#[derive(Clone)]
pub struct OrganizationRepository {
    pool: PgPool,
}

impl OrganizationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_organization(&self, org_id: &str) -> Result<Option<Organization>, AppError> {
        let org = sqlx::query_as::<_, Organization>(
            r#"
            SELECT id, name, default_tenant, created_at, updated_at
            FROM organizations
            WHERE id = $1
            "#,
        )
        .bind(org_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(org)
    }

    pub async fn find_tenant(&self, tenant_id: &str) -> Result<Option<Tenant>, AppError> {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            SELECT id, name, org_id, created_at, updated_at
            FROM tenants
            WHERE id = $1
            "#,
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tenant)
    }

    pub async fn list_tenants(&self, org_id: &str) -> Result<Vec<Tenant>, AppError> {
        let tenants = sqlx::query_as::<_, Tenant>(
            r#"
            SELECT id, name, org_id, created_at, updated_at
            FROM tenants
            WHERE org_id = $1
            ORDER BY name ASC
            "#,
        )
        .bind(org_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tenants)
    }
}
