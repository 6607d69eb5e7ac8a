// src/services/composition.rs

//! Resolve o modelo final de renderização de uma proposta.
//!
//! Para cada seção habilitada do layout (na ordem do layout):
//! `defaults do catálogo <- conteúdo interpolado <- props da entrada`.

pub mod interpolate;
pub mod merge;
pub mod references;

use serde_json::{Map, Value};

use crate::{
    catalog::TemplateCatalog,
    common::error::AppError,
    models::proposal::{
        ProposalContentData, ProposalLayoutData, ReferenceSelection, ReferencesCatalog, RenderModel,
        SectionEntry, TenantProfileData,
    },
};

use self::{interpolate::interpolate_tokens, merge::merge_layers, references::resolve_references};

pub const CUSTOMER_STORIES: &str = "CustomerStories";

/// Contexto dos tokens `{{...}}`: hoje só `{branding: ...}`.
pub fn token_context(profile: &TenantProfileData) -> Value {
    let mut ctx = Map::new();
    ctx.insert(
        "branding".to_string(),
        serde_json::to_value(&profile.branding).unwrap_or(Value::Null),
    );
    Value::Object(ctx)
}

/// Layout salvo; sem ele, o `layoutDefaults` do perfil; sem nenhum, vazio.
pub fn effective_layout(layout: Option<ProposalLayoutData>, profile: &TenantProfileData) -> Vec<SectionEntry> {
    layout
        .or_else(|| profile.layout_defaults.clone())
        .map(|l| l.sections)
        .unwrap_or_default()
}

pub fn resolve(
    catalog: &TemplateCatalog,
    layout: &[SectionEntry],
    content: &ProposalContentData,
    profile: &TenantProfileData,
    references: &ReferencesCatalog,
) -> Vec<RenderModel> {
    let ctx = token_context(profile);

    layout
        .iter()
        .filter(|entry| entry.is_enabled())
        .map(|entry| match resolve_section(catalog, entry, content, &ctx, references) {
            Ok(props) => RenderModel::Section {
                section_type: entry.section_type.clone(),
                variant: entry.variant.clone(),
                props,
            },
            Err(e) => {
                tracing::warn!(
                    section_type = %entry.section_type,
                    variant = %entry.variant,
                    "Seção sem template; renderizando marcador de ausência"
                );
                RenderModel::MissingTemplate {
                    section_type: entry.section_type.clone(),
                    variant: entry.variant.clone(),
                    message: e.to_string(),
                }
            }
        })
        .collect()
}

/// Resolve uma única seção. Falha só com `TemplateMissing`.
pub fn resolve_section(
    catalog: &TemplateCatalog,
    entry: &SectionEntry,
    content: &ProposalContentData,
    ctx: &Value,
    references: &ReferencesCatalog,
) -> Result<Value, AppError> {
    // 1. Template do catálogo
    let template = catalog
        .lookup(&entry.section_type, &entry.variant)
        .ok_or_else(|| AppError::TemplateMissing {
            section_type: entry.section_type.clone(),
            variant: entry.variant.clone(),
        })?;

    // 2. Conteúdo salvo para este tipo de seção
    let base = content
        .get(&entry.section_type)
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()));

    // 3. Tokens (nos defaults do catálogo também)
    let defaults = interpolate_tokens(&Value::Object(template.defaults.clone()), ctx);
    let mut interpolated = interpolate_tokens(&base, ctx);

    // 4. Referências expandidas
    if entry.section_type == CUSTOMER_STORIES {
        attach_reference_items(&mut interpolated, references);
    }

    // 5. defaults <- conteúdo <- props
    let props = entry
        .props
        .clone()
        .map(Value::Object)
        .unwrap_or_else(|| Value::Object(Map::new()));

    Ok(merge_layers([defaults, interpolated, props]))
}

fn attach_reference_items(section: &mut Value, references: &ReferencesCatalog) {
    let selection = match serde_json::from_value::<ReferenceSelection>(section.clone()) {
        Ok(selection) => selection,
        Err(e) => {
            tracing::warn!(error = %e, "Seleção de referências inválida; usando seleção vazia");
            ReferenceSelection::default()
        }
    };

    let items = resolve_references(&selection, references);
    let items = Value::Array(
        items
            .iter()
            .filter_map(|item| serde_json::to_value(item).ok())
            .collect(),
    );

    match section {
        Value::Object(map) => {
            map.insert("items".to_string(), items);
        }
        other => {
            let mut map = Map::new();
            map.insert("items".to_string(), items);
            *other = Value::Object(map);
        }
    }
}
