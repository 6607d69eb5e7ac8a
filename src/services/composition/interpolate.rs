use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;

// {{ branding.colors.primary }}: espaços opcionais, caminho com letras, dígitos, `_` e `.`
static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_.]+)\s*\}\}").expect("regex de token válida")
});

/// Substitui tokens `{{caminho}}` em todas as folhas string da árvore.
///
/// Caminho não resolvido vira string vazia; o texto ao redor é mantido.
pub fn interpolate_tokens(value: &Value, ctx: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(interpolate_str(s, ctx)),
        Value::Array(items) => Value::Array(items.iter().map(|v| interpolate_tokens(v, ctx)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), interpolate_tokens(v, ctx)))
                .collect(),
        ),
        Value::Null | Value::Bool(_) | Value::Number(_) => value.clone(),
    }
}

pub fn interpolate_str(input: &str, ctx: &Value) -> String {
    TOKEN
        .replace_all(input, |caps: &Captures| {
            lookup_path(ctx, &caps[1]).map(render_scalar).unwrap_or_default()
        })
        .into_owned()
}

fn lookup_path<'a>(ctx: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(ctx, |acc, key| match acc {
            Value::Object(map) => map.get(key),
            Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
