//! In-memory attribute values of the product being edited
//!
//! Keyed by [`ScopeKey`], holding normalized values. Writes are crate-private:
//! only the save coordinator and the reload path mutate it.

use parking_lot::RwLock;
use serde_json::Value;
use shared::models::{Attribute, AttributeValue};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::codec;
use crate::scope::{ScopeKey, key_for_value};

/// Shared handle; clones see the same values
#[derive(Debug, Clone, Default)]
pub struct ValueStore {
    values: Arc<RwLock<HashMap<ScopeKey, Value>>>,
}

impl ValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ScopeKey) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }

    /// Ordered copy of all values
    pub fn snapshot(&self) -> BTreeMap<ScopeKey, Value> {
        self.values
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub(crate) fn set(&self, key: ScopeKey, value: Value) {
        self.values.write().insert(key, value);
    }

    pub(crate) fn remove(&self, key: &ScopeKey) {
        self.values.write().remove(key);
    }

    /// Replace everything with authoritative values from the catalog service
    ///
    /// Values of known attributes are normalized through their codec; values
    /// of unknown attributes are kept as received.
    pub(crate) fn reload_from(
        &self,
        values: &[AttributeValue],
        attributes: &HashMap<i64, Attribute>,
    ) {
        let fresh: HashMap<ScopeKey, Value> = values
            .iter()
            .map(|value| {
                let attribute = attributes.get(&value.attribute_id);
                let key = key_for_value(value, attribute);
                let normalized = match attribute {
                    Some(attr) => codec::normalize(&value.value, attr.data_type),
                    None => value.value.clone(),
                };
                (key, normalized)
            })
            .collect();
        tracing::debug!(count = fresh.len(), "Value store reloaded");
        *self.values.write() = fresh;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared::models::DataType;

    #[test]
    fn test_reload_normalizes_and_scopes() {
        let attrs: HashMap<i64, Attribute> = [
            (1, Attribute::new(1, "price", "Price", DataType::Price)),
            (2, Attribute::new(2, "color", "Color", DataType::Text).localisable()),
        ]
        .into_iter()
        .collect();

        let store = ValueStore::new();
        store.set(
            ScopeKey { attribute_id: 99, locale: None, channel: None },
            json!("stale"),
        );
        store.reload_from(
            &[
                AttributeValue::new(1, json!(r#"{"amount":5,"currency":"EUR"}"#))
                    .with_scope(Some("fr-FR".into()), None),
                AttributeValue::new(2, json!("Rouge")).with_scope(Some("fr-FR".into()), None),
            ],
            &attrs,
        );

        assert_eq!(store.len(), 2);
        let price_key = ScopeKey { attribute_id: 1, locale: None, channel: None };
        assert_eq!(store.get(&price_key), Some(json!({"amount": 5, "currency": "EUR"})));
        let color_key = ScopeKey { attribute_id: 2, locale: Some("fr-FR".into()), channel: None };
        assert_eq!(store.get(&color_key), Some(json!("Rouge")));
    }
}
