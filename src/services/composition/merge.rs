use serde_json::{Map, Value};

/// Merge recursivo só em objetos: arrays e escalares do `override` vencem inteiros.
///
/// `null` no override também vence (apaga o valor de baixo).
pub fn deep_merge(base: Value, override_value: Value) -> Value {
    match (base, override_value) {
        (Value::Object(base), Value::Object(over)) => Value::Object(merge_objects(base, over)),
        (_, over) => over,
    }
}

/// Aplica as camadas em ordem: cada uma sobrescreve as anteriores.
pub fn merge_layers<I>(layers: I) -> Value
where
    I: IntoIterator<Item = Value>,
{
    layers
        .into_iter()
        .fold(Value::Object(Map::new()), deep_merge)
}

fn merge_objects(mut base: Map<String, Value>, over: Map<String, Value>) -> Map<String, Value> {
    for (key, value) in over {
        let merged = match base.remove(&key) {
            Some(existing) => deep_merge(existing, value),
            None => value,
        };
        base.insert(key, merged);
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn arrays_are_replaced_not_concatenated() {
        let merged = merge_layers([
            json!({ "color": "red", "tags": ["a"] }),
            json!({ "color": "blue" }),
            json!({ "tags": ["b", "c"] }),
        ]);

        assert_eq!(merged, json!({ "color": "blue", "tags": ["b", "c"] }));
    }

    #[test]
    fn nested_objects_merge_field_by_field() {
        let merged = deep_merge(
            json!({ "cta": { "text": "Fale conosco", "link": "/contato" }, "title": "A" }),
            json!({ "cta": { "link": "https://acme.com" } }),
        );

        assert_eq!(
            merged,
            json!({ "cta": { "text": "Fale conosco", "link": "https://acme.com" }, "title": "A" })
        );
    }

    #[test]
    fn scalars_and_null_override_outright() {
        assert_eq!(deep_merge(json!({ "a": { "b": 1 } }), json!({ "a": 2 })), json!({ "a": 2 }));
        assert_eq!(deep_merge(json!({ "a": 1 }), json!({ "a": null })), json!({ "a": null }));
        assert_eq!(deep_merge(json!({ "a": 1 }), json!({ "a": { "b": 1 } })), json!({ "a": { "b": 1 } }));
        assert_eq!(deep_merge(json!([1, 2]), json!({ "x": 1 })), json!({ "x": 1 }));
    }

    #[test]
    fn keys_missing_from_override_survive() {
        let merged = deep_merge(json!({ "keep": true, "swap": 1 }), json!({ "swap": 2, "add": 3 }));
        assert_eq!(merged, json!({ "keep": true, "swap": 2, "add": 3 }));
    }
}
