// src/handlers/tenancy.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    db::EntityKey,
    middleware::{
        rbac::{AdminRole, MemberRole, RequireRole},
        tenancy::{OrgContext, TenantContext},
    },
    models::{
        proposal::{ProposalLayoutData, ReferencesCatalog, TenantProfileData},
        tenancy::OrganizationTenants,
    },
};

/// `?draft=true` seleciona o rascunho; o padrão é a versão publicada.
#[derive(Debug, Default, Deserialize)]
pub struct DraftQuery {
    #[serde(default)]
    pub draft: bool,
}

fn not_found(tenant: &TenantContext, key: EntityKey) -> AppError {
    AppError::NotFound {
        entity: key.kind.label(),
        key: key.describe(tenant.id()),
    }
}

// =============================================================================
//  ORGANIZAÇÃO
// =============================================================================

// GET /api/tenants
#[utoipa::path(
    get,
    path = "/api/tenants",
    tag = "Tenancy",
    responses(
        (status = 200, description = "Tenants da organização", body = OrganizationTenants),
        (status = 403, description = "Organização de outro usuário", body = ApiError)
    ),
    params(
        ("x-org-id" = Option<String>, Header, description = "ID da Organização (padrão: a do token)")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_tenants(
    State(app_state): State<AppState>,
    _role: RequireRole<MemberRole>,
    org: OrgContext,
) -> Result<impl IntoResponse, ApiError> {
    let organization = app_state
        .org_repo
        .find_organization(&org.org_id)
        .await?
        .ok_or_else(|| AppError::NotFound {
            entity: "Organização",
            key: org.org_id.clone(),
        })?;

    let tenants = app_state.org_repo.list_tenants(&org.org_id).await?;

    Ok((StatusCode::OK, Json(OrganizationTenants { organization, tenants })))
}

// =============================================================================
//  PERFIL
// =============================================================================

// GET /api/tenant/profile
#[utoipa::path(
    get,
    path = "/api/tenant/profile",
    tag = "Tenancy",
    responses(
        (status = 200, description = "Perfil versionado (branding + layout padrão)", body = Object),
        (status = 404, description = "Perfil ainda não salvo", body = ApiError)
    ),
    params(
        ("x-tenant-id" = String, Header, description = "ID do Tenant"),
        ("draft" = Option<bool>, Query, description = "Rascunho em vez da versão publicada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_profile(
    State(app_state): State<AppState>,
    _role: RequireRole<MemberRole>,
    tenant: TenantContext,
    Query(query): Query<DraftQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = app_state
        .entity_store
        .get_profile(tenant.id(), query.draft)
        .await?
        .ok_or_else(|| not_found(&tenant, EntityKey::profile(query.draft)))?;

    Ok((StatusCode::OK, Json(profile)))
}

// PUT /api/tenant/profile
#[utoipa::path(
    put,
    path = "/api/tenant/profile",
    tag = "Tenancy",
    request_body = TenantProfileData,
    responses(
        (status = 200, description = "Perfil salvo", body = Object),
        (status = 400, description = "Dados inválidos", body = ApiError)
    ),
    params(
        ("x-tenant-id" = String, Header, description = "ID do Tenant"),
        ("draft" = Option<bool>, Query, description = "Salva como rascunho")
    ),
    security(("api_jwt" = []))
)]
pub async fn put_profile(
    State(app_state): State<AppState>,
    _role: RequireRole<AdminRole>,
    tenant: TenantContext,
    Query(query): Query<DraftQuery>,
    Json(payload): Json<TenantProfileData>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate().map_err(AppError::from)?;

    let saved = app_state
        .entity_store
        .save_profile(tenant.id(), query.draft, &payload)
        .await?;

    Ok((StatusCode::OK, Json(saved)))
}

// =============================================================================
//  REFERÊNCIAS
// =============================================================================

// GET /api/tenant/references
#[utoipa::path(
    get,
    path = "/api/tenant/references",
    tag = "Tenancy",
    responses(
        (status = 200, description = "Catálogo de referências versionado", body = Object),
        (status = 404, description = "Referências ainda não salvas", body = ApiError)
    ),
    params(
        ("x-tenant-id" = String, Header, description = "ID do Tenant"),
        ("draft" = Option<bool>, Query, description = "Rascunho em vez da versão publicada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_references(
    State(app_state): State<AppState>,
    _role: RequireRole<MemberRole>,
    tenant: TenantContext,
    Query(query): Query<DraftQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let references = app_state
        .entity_store
        .get_references(tenant.id(), query.draft)
        .await?
        .ok_or_else(|| not_found(&tenant, EntityKey::references(query.draft)))?;

    Ok((StatusCode::OK, Json(references)))
}

// PUT /api/tenant/references
#[utoipa::path(
    put,
    path = "/api/tenant/references",
    tag = "Tenancy",
    request_body = ReferencesCatalog,
    responses(
        (status = 200, description = "Referências salvas", body = Object),
        (status = 400, description = "Dados inválidos", body = ApiError)
    ),
    params(
        ("x-tenant-id" = String, Header, description = "ID do Tenant"),
        ("draft" = Option<bool>, Query, description = "Salva como rascunho")
    ),
    security(("api_jwt" = []))
)]
pub async fn put_references(
    State(app_state): State<AppState>,
    _role: RequireRole<AdminRole>,
    tenant: TenantContext,
    Query(query): Query<DraftQuery>,
    Json(payload): Json<ReferencesCatalog>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate().map_err(AppError::from)?;

    let saved = app_state
        .entity_store
        .save_references(tenant.id(), query.draft, &payload)
        .await?;

    Ok((StatusCode::OK, Json(saved)))
}

// =============================================================================
//  LAYOUT
// =============================================================================

// GET /api/tenant/layout
#[utoipa::path(
    get,
    path = "/api/tenant/layout",
    tag = "Tenancy",
    responses(
        (status = 200, description = "Layout de proposta versionado", body = Object),
        (status = 404, description = "Layout ainda não salvo", body = ApiError)
    ),
    params(
        ("x-tenant-id" = String, Header, description = "ID do Tenant"),
        ("draft" = Option<bool>, Query, description = "Rascunho em vez da versão publicada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_layout(
    State(app_state): State<AppState>,
    _role: RequireRole<MemberRole>,
    tenant: TenantContext,
    Query(query): Query<DraftQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let layout = app_state
        .entity_store
        .get_layout(tenant.id(), query.draft)
        .await?
        .ok_or_else(|| not_found(&tenant, EntityKey::layout(query.draft)))?;

    Ok((StatusCode::OK, Json(layout)))
}

// PUT /api/tenant/layout
#[utoipa::path(
    put,
    path = "/api/tenant/layout",
    tag = "Tenancy",
    request_body = ProposalLayoutData,
    responses(
        (status = 200, description = "Layout salvo", body = Object),
        (status = 400, description = "Dados inválidos", body = ApiError)
    ),
    params(
        ("x-tenant-id" = String, Header, description = "ID do Tenant"),
        ("draft" = Option<bool>, Query, description = "Salva como rascunho")
    ),
    security(("api_jwt" = []))
)]
pub async fn put_layout(
    State(app_state): State<AppState>,
    _role: RequireRole<AdminRole>,
    tenant: TenantContext,
    Query(query): Query<DraftQuery>,
    Json(payload): Json<ProposalLayoutData>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate().map_err(AppError::from)?;

    let saved = app_state
        .entity_store
        .save_layout(tenant.id(), query.draft, &payload)
        .await?;

    Ok((StatusCode::OK, Json(saved)))
}
