// src/handlers/sections.rs

use axum::{extract::State, Json};

use crate::{catalog::SectionTemplate, config::AppState};

// GET /api/sections
#[utoipa::path(
    get,
    path = "/api/sections",
    tag = "Catálogo",
    responses(
        (status = 200, description = "Templates de seção e suas variantes", body = Vec<SectionTemplate>)
    )
)]
pub async fn list_sections(State(app_state): State<AppState>) -> Json<Vec<SectionTemplate>> {
    Json(app_state.catalog.sections().cloned().collect())
}
