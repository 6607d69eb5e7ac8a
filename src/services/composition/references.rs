use std::collections::HashSet;

use crate::models::proposal::{ReferenceItem, ReferenceSelection, ReferencesCatalog};

/// Expande uma seleção (coleção + include - exclude) em itens concretos.
///
/// O `exclude` sempre vence. A ordem do resultado é a do catálogo.
pub fn resolve_references(selection: &ReferenceSelection, catalog: &ReferencesCatalog) -> Vec<ReferenceItem> {
    let mut ids: HashSet<&str> = selection
        .use_collection
        .as_deref()
        .and_then(|name| catalog.collections.get(name))
        .map(|members| members.iter().map(String::as_str).collect())
        .unwrap_or_default();

    ids.extend(selection.include.iter().map(String::as_str));

    for id in &selection.exclude {
        ids.remove(id.as_str());
    }

    catalog
        .references
        .iter()
        .filter(|item| ids.contains(item.id.as_str()))
        .cloned()
        .collect()
}
