// src/handlers/proposals.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    handlers::tenancy::DraftQuery,
    middleware::{
        rbac::{AdminRole, MemberRole, RequireRole},
        tenancy::{OrgContext, TenantContext},
    },
    models::proposal::{
        BulkDeleteReport, ComposedProposal, DeleteTarget, ProposalContentData, ProposalSummary,
    },
};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Ausente = rascunhos e publicadas.
    pub draft: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeletePayload {
    // Slugs inválidos viram erros por item no relatório, não um 400
    #[validate(length(min = 1, max = 100, message = "Envie entre 1 e 100 itens."))]
    pub items: Vec<DeleteTarget>,
}

// =============================================================================
//  LEITURA
// =============================================================================

// GET /api/proposals
#[utoipa::path(
    get,
    path = "/api/proposals",
    tag = "Propostas",
    responses(
        (status = 200, description = "Propostas do tenant (ou da organização inteira)", body = Vec<ProposalSummary>)
    ),
    params(
        ("x-tenant-id" = Option<String>, Header, description = "ID do Tenant; ausente lista todos os tenants da organização"),
        ("draft" = Option<bool>, Query, description = "Filtra rascunhos ou publicadas")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_proposals(
    State(app_state): State<AppState>,
    _role: RequireRole<MemberRole>,
    org: OrgContext,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let summaries = app_state
        .proposal_service
        .list_proposals(&org.org_id, org.tenant.as_ref(), query.draft)
        .await?;

    Ok((StatusCode::OK, Json(summaries)))
}

// GET /api/proposals/{slug}
#[utoipa::path(
    get,
    path = "/api/proposals/{slug}",
    tag = "Propostas",
    responses(
        (status = 200, description = "Conteúdo versionado da proposta", body = Object),
        (status = 404, description = "Proposta não encontrada", body = ApiError)
    ),
    params(
        ("slug" = String, Path, description = "Slug da proposta"),
        ("x-tenant-id" = String, Header, description = "ID do Tenant"),
        ("draft" = Option<bool>, Query, description = "Rascunho em vez da versão publicada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_proposal(
    State(app_state): State<AppState>,
    _role: RequireRole<MemberRole>,
    tenant: TenantContext,
    Path(slug): Path<String>,
    Query(query): Query<DraftQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let content = app_state
        .proposal_service
        .get_content(tenant.id(), &slug, query.draft)
        .await?;

    Ok((StatusCode::OK, Json(content)))
}

// GET /api/proposals/{slug}/render
#[utoipa::path(
    get,
    path = "/api/proposals/{slug}/render",
    tag = "Propostas",
    responses(
        (status = 200, description = "Modelo de renderização composto", body = ComposedProposal)
    ),
    params(
        ("slug" = String, Path, description = "Slug da proposta"),
        ("x-tenant-id" = String, Header, description = "ID do Tenant"),
        ("draft" = Option<bool>, Query, description = "Pré-visualiza o rascunho")
    ),
    security(("api_jwt" = []))
)]
pub async fn render_proposal(
    State(app_state): State<AppState>,
    _role: RequireRole<MemberRole>,
    tenant: TenantContext,
    Path(slug): Path<String>,
    Query(query): Query<DraftQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let composed = app_state
        .proposal_service
        .render(tenant.id(), &slug, query.draft)
        .await?;

    Ok((StatusCode::OK, Json(composed)))
}

// GET /api/public/proposals/{slug}
#[utoipa::path(
    get,
    path = "/api/public/proposals/{slug}",
    tag = "Público",
    responses(
        (status = 200, description = "Proposta publicada, composta", body = ComposedProposal),
        (status = 404, description = "Nenhum tenant publicou este slug", body = ApiError)
    ),
    params(
        ("slug" = String, Path, description = "Slug da proposta publicada")
    )
)]
pub async fn render_public_proposal(
    State(app_state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let composed = app_state.proposal_service.render_live(&slug).await?;
    Ok((StatusCode::OK, Json(composed)))
}

// =============================================================================
//  ESCRITA (rascunho / publicação)
// =============================================================================

// PUT /api/proposals/{slug}/draft
#[utoipa::path(
    put,
    path = "/api/proposals/{slug}/draft",
    tag = "Propostas",
    request_body(content = Object, description = "Conteúdo por tipo de seção"),
    responses(
        (status = 200, description = "Rascunho salvo", body = Object),
        (status = 400, description = "Slug inválido", body = ApiError)
    ),
    params(
        ("slug" = String, Path, description = "Slug da proposta"),
        ("x-tenant-id" = String, Header, description = "ID do Tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn save_draft(
    State(app_state): State<AppState>,
    _role: RequireRole<MemberRole>,
    tenant: TenantContext,
    Path(slug): Path<String>,
    Json(payload): Json<ProposalContentData>,
) -> Result<impl IntoResponse, ApiError> {
    let draft = app_state
        .proposal_service
        .save_draft(tenant.id(), &slug, &payload)
        .await?;

    Ok((StatusCode::OK, Json(draft)))
}

// POST /api/proposals/{slug}/publish
#[utoipa::path(
    post,
    path = "/api/proposals/{slug}/publish",
    tag = "Propostas",
    request_body(content = Object, description = "Conteúdo a publicar (o rascunho não é alterado)"),
    responses(
        (status = 200, description = "Versão publicada", body = Object),
        (status = 403, description = "Requer papel admin", body = ApiError)
    ),
    params(
        ("slug" = String, Path, description = "Slug da proposta"),
        ("x-tenant-id" = String, Header, description = "ID do Tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn publish_proposal(
    State(app_state): State<AppState>,
    _role: RequireRole<AdminRole>,
    tenant: TenantContext,
    Path(slug): Path<String>,
    Json(payload): Json<ProposalContentData>,
) -> Result<impl IntoResponse, ApiError> {
    let live = app_state
        .proposal_service
        .publish(tenant.id(), &slug, &payload)
        .await?;

    Ok((StatusCode::OK, Json(live)))
}

// =============================================================================
//  EXCLUSÃO
// =============================================================================

// DELETE /api/proposals/{slug}
#[utoipa::path(
    delete,
    path = "/api/proposals/{slug}",
    tag = "Propostas",
    responses(
        (status = 204, description = "Removida"),
        (status = 404, description = "Não havia linha para remover", body = ApiError)
    ),
    params(
        ("slug" = String, Path, description = "Slug da proposta"),
        ("x-tenant-id" = String, Header, description = "ID do Tenant"),
        ("draft" = Option<bool>, Query, description = "Remove o rascunho em vez da versão publicada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_proposal(
    State(app_state): State<AppState>,
    _role: RequireRole<AdminRole>,
    tenant: TenantContext,
    Path(slug): Path<String>,
    Query(query): Query<DraftQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let existed = app_state
        .proposal_service
        .delete_one(tenant.id(), &slug, query.draft)
        .await?;

    if !existed {
        return Err(AppError::NotFound {
            entity: "Proposta",
            key: format!("{}/{}", tenant.id(), slug),
        }
        .into());
    }

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/proposals/bulk-delete
#[utoipa::path(
    post,
    path = "/api/proposals/bulk-delete",
    tag = "Propostas",
    request_body = BulkDeletePayload,
    responses(
        (status = 200, description = "Todos os itens processados sem erro", body = BulkDeleteReport),
        (status = 207, description = "Alguns itens falharam (ver `errors`)", body = BulkDeleteReport),
        (status = 400, description = "Lista vazia ou grande demais", body = ApiError)
    ),
    params(
        ("x-tenant-id" = String, Header, description = "ID do Tenant")
    ),
    security(("api_jwt" = []))
)]
pub async fn bulk_delete(
    State(app_state): State<AppState>,
    _role: RequireRole<AdminRole>,
    tenant: TenantContext,
    Json(payload): Json<BulkDeletePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate().map_err(AppError::from)?;

    let report = app_state
        .proposal_service
        .delete_many(tenant.id(), &payload.items)
        .await;

    let status = if report.is_partial_failure() { StatusCode::MULTI_STATUS } else { StatusCode::OK };
    Ok((status, Json(report)))
}
