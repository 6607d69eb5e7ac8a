// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::catalog;
use crate::common;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Catálogo ---
        handlers::sections::list_sections,

        // --- Tenancy ---
        handlers::tenancy::list_tenants,
        handlers::tenancy::get_profile,
        handlers::tenancy::put_profile,
        handlers::tenancy::get_references,
        handlers::tenancy::put_references,
        handlers::tenancy::get_layout,
        handlers::tenancy::put_layout,

        // --- Propostas ---
        handlers::proposals::list_proposals,
        handlers::proposals::get_proposal,
        handlers::proposals::render_proposal,
        handlers::proposals::save_draft,
        handlers::proposals::publish_proposal,
        handlers::proposals::delete_proposal,
        handlers::proposals::bulk_delete,

        // --- Público ---
        handlers::proposals::render_public_proposal,
    ),
    components(
        schemas(
            common::error::ApiError,

            // --- Catálogo ---
            catalog::FieldKind,
            catalog::FieldSpec,
            catalog::VariantTemplate,
            catalog::SectionTemplate,

            // --- Tenancy ---
            models::tenancy::Organization,
            models::tenancy::Tenant,
            models::tenancy::OrgRole,
            models::tenancy::OrganizationTenants,

            // --- Entidades versionadas ---
            models::proposal::BrandColors,
            models::proposal::Branding,
            models::proposal::TenantProfileData,
            models::proposal::ReferenceMetric,
            models::proposal::ReferenceItem,
            models::proposal::ReferencesCatalog,
            models::proposal::SectionEntry,
            models::proposal::ProposalLayoutData,

            // --- Propostas ---
            models::proposal::ProposalSummary,
            models::proposal::DeleteTarget,
            models::proposal::BulkDeleteFailure,
            models::proposal::BulkDeleteReport,
            models::proposal::RenderModel,
            models::proposal::ComposedProposal,
            handlers::proposals::BulkDeletePayload,
        )
    ),
    tags(
        (name = "Catálogo", description = "Templates de seção disponíveis"),
        (name = "Tenancy", description = "Tenants da organização, perfil, referências e layout"),
        (name = "Propostas", description = "Rascunho, publicação, exclusão e composição"),
        (name = "Público", description = "Propostas publicadas para visitantes")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
