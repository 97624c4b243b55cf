//! Attribute group normalization
//!
//! Upstream delivers attribute groups in two shapes:
//!
//! - **pre-grouped**: `[{name, items: [{id, attribute, attribute_label, value, locale, channel}]}]`
//! - **flat**: attribute-value-like records carrying their own label / value /
//!   group under a variety of field names
//!
//! [`normalize`] folds both (even mixed in one list) into canonical
//! [`AttributeGroup`]s. It is total: any JSON input yields a result.

mod fields;

use serde_json::{Map, Value};
use shared::models::{AttributeGroup, AttributeGroupItem};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use fields::{UNCATEGORIZED, UNNAMED, WRAPPER_KEYS};

/// Group being assembled
struct PendingGroup {
    /// First spelling seen
    name: String,
    id: Option<i64>,
    order: Option<i32>,
    items: Vec<AttributeGroupItem>,
}

/// Reconcile raw upstream groups into canonical, sorted groups
///
/// Names differing only in case are one group. Groups are sorted by name,
/// items by label; blank values are dropped.
/// Missing labels resolve to `"Unnamed"`, missing groups to `"Uncategorized"`.
pub fn normalize(raw: &Value) -> Vec<AttributeGroup> {
    let mut pending: BTreeMap<String, PendingGroup> = BTreeMap::new();

    for entry in entries(raw) {
        let Value::Object(map) = entry else {
            tracing::debug!("Skipping non-object attribute group entry");
            continue;
        };

        match map.get("items") {
            Some(Value::Array(items)) => collect_grouped(map, items, &mut pending),
            _ => collect_flat(map, &mut pending),
        }
    }

    let mut groups: Vec<PendingGroup> = pending
        .into_values()
        .filter(|g| !g.items.is_empty())
        .collect();
    groups.sort_by(|a, b| compare_names(&a.name, &b.name));

    groups
        .into_iter()
        .enumerate()
        .map(|(idx, mut group)| {
            group.items.sort_by(|a, b| compare_names(&a.label, &b.label));
            for (pos, item) in group.items.iter_mut().enumerate() {
                item.order = pos as i32 + 1;
            }
            AttributeGroup {
                id: group.id.unwrap_or(idx as i64 + 1),
                name: group.name,
                order: group.order.unwrap_or(idx as i32 + 1),
                items: group.items,
            }
        })
        .collect()
}

/// Top-level list, unwrapping `{data: [...]}`-style envelopes
fn entries(raw: &Value) -> &[Value] {
    match raw {
        Value::Array(list) => list.as_slice(),
        Value::Object(map) => WRAPPER_KEYS
            .iter()
            .find_map(|key| match map.get(*key) {
                Some(Value::Array(list)) => Some(list.as_slice()),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Default::default(),
    }
}

/// Group named `name`, matched case-insensitively
fn group_entry<'a>(
    pending: &'a mut BTreeMap<String, PendingGroup>,
    name: String,
) -> &'a mut PendingGroup {
    pending
        .entry(name.to_lowercase())
        .or_insert_with(|| PendingGroup {
            name,
            id: None,
            order: None,
            items: Vec::new(),
        })
}

/// Case-insensitive name order with a byte-wise tie break
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

fn collect_grouped(
    group: &Map<String, Value>,
    items: &[Value],
    pending: &mut BTreeMap<String, PendingGroup>,
) {
    let name = fields::text(group, "name")
        .or_else(|| fields::text(group, "group_name"))
        .unwrap_or_else(|| UNCATEGORIZED.to_string());

    let target = group_entry(pending, name);
    if target.id.is_none() {
        target.id = fields::integer(group, "id");
    }
    if target.order.is_none() {
        target.order = fields::integer(group, "order").and_then(|o| i32::try_from(o).ok());
    }

    for item in items {
        let Value::Object(map) = item else { continue };
        let Some(value) = fields::usable_value(map, "value")
            .or_else(|| fields::usable_value(map, "display_value"))
        else {
            continue;
        };
        let label = fields::grouped_label(map).unwrap_or_else(|| UNNAMED.to_string());
        target.items.push(build_item(map, label, value));
    }
}

fn collect_flat(record: &Map<String, Value>, pending: &mut BTreeMap<String, PendingGroup>) {
    let label = fields::flat_label(record).unwrap_or_else(|| UNNAMED.to_string());
    let Some(value) = fields::flat_value(record, &label) else {
        return;
    };
    let group = fields::flat_group(record);
    let item = build_item(record, label, value);
    group_entry(pending, group).items.push(item);
}

fn build_item(map: &Map<String, Value>, label: String, value: Value) -> AttributeGroupItem {
    let attribute_id = fields::attribute_id(map).unwrap_or(0);
    AttributeGroupItem {
        id: fields::integer(map, "id").unwrap_or(attribute_id),
        attribute_id,
        order: 0,
        label,
        value: Some(value),
        locale: fields::text(map, "locale"),
        channel: fields::text(map, "channel"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn labels(group: &AttributeGroup) -> Vec<&str> {
        group.items.iter().map(|i| i.label.as_str()).collect()
    }

    #[test]
    fn test_flat_without_group_metadata_is_uncategorized() {
        let raw = json!([
            {"attribute_id": 1, "label": "Weight", "value": "2 kg"},
            {"attribute_id": 2, "label": "Color", "value": "Red"},
            {"attribute_id": 3, "name": "Finish", "display_value": "Matte"},
        ]);
        let groups = normalize(&raw);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "Uncategorized");
        assert_eq!(labels(&groups[0]), vec!["Color", "Finish", "Weight"]);
        assert_eq!(groups[0].items[0].order, 1);
        assert_eq!(groups[0].items[2].order, 3);
    }

    #[test]
    fn test_pre_grouped_shape() {
        let raw = json!([
            {"name": "Marketing", "items": [
                {"id": 10, "attribute": 4, "attribute_label": "Tagline", "value": "Fresh", "locale": "en-US"},
                {"id": 11, "attribute": 5, "attribute_label": "Teaser", "value": "  "},
            ]},
            {"name": "General", "items": [
                {"id": 12, "attribute": "Brand", "value": "Acme", "channel": "web"},
            ]},
        ]);
        let groups = normalize(&raw);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "General");
        assert_eq!(groups[0].items[0].label, "Brand");
        assert_eq!(groups[0].items[0].channel.as_deref(), Some("web"));

        let marketing = &groups[1];
        assert_eq!(labels(marketing), vec!["Tagline"]);
        assert_eq!(marketing.items[0].attribute_id, 4);
        assert_eq!(marketing.items[0].id, 10);
        assert_eq!(marketing.items[0].locale.as_deref(), Some("en-US"));
    }

    #[test]
    fn test_groups_sorted_and_blank_values_dropped() {
        let raw = json!([
            {"label": "Zeta", "group": "shipping", "value": "x"},
            {"label": "Alpha", "group": "Shipping", "value": "y"},
            {"label": "Beta", "group_name": "Apparel", "value": null},
            {"label": "Gamma", "category": "Apparel", "value": "z"},
        ]);
        let groups = normalize(&raw);
        let names: Vec<_> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Apparel", "shipping"]);
        assert_eq!(labels(&groups[0]), vec!["Gamma"]);
        assert_eq!(labels(&groups[1]), vec!["Alpha", "Zeta"]);
        assert_eq!(groups[1].id, 2);
    }

    #[test]
    fn test_names_differing_in_case_merge() {
        let raw = json!([
            {"name": "Care", "items": [{"attribute_label": "Washing", "value": "30°"}]},
            {"name": "CARE", "items": [{"attribute_label": "Drying", "value": "Flat"}]},
            {"label": "Ironing", "group": "care", "value": "Low"},
        ]);
        let groups = normalize(&raw);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "Care");
        assert_eq!(labels(&groups[0]), vec!["Drying", "Ironing", "Washing"]);
    }

    #[test]
    fn test_total_over_garbage() {
        assert!(normalize(&json!(null)).is_empty());
        assert!(normalize(&json!("groups")).is_empty());
        assert!(normalize(&json!([1, "two", null, []])).is_empty());

        let groups = normalize(&json!([{"value": "orphan"}, {"items": "not-a-list", "value": 3}]));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "Uncategorized");
        assert!(groups[0].items.iter().all(|i| i.label == "Unnamed"));
    }

    #[test]
    fn test_unwraps_envelope() {
        let raw = json!({"data": [{"label": "Color", "value": "Red", "group": "Look"}]});
        let groups = normalize(&raw);
        assert_eq!(groups[0].name, "Look");
    }

    #[test]
    fn test_deterministic() {
        let raw = json!([
            {"label": "b", "value": 1, "attribute_code": "seo_title"},
            {"label": "a", "value": 2, "attribute_code": "seo_keywords"},
            {"name": "Media", "items": [{"attribute_label": "Image", "value": "{\"asset_id\":1}"}]},
        ]);
        let first = normalize(&raw);
        for _ in 0..5 {
            assert_eq!(normalize(&raw), first);
        }
        assert_eq!(first[1].name, "SEO");
        assert_eq!(labels(&first[1]), vec!["a", "b"]);
    }

    #[test]
    fn test_raw_group_ids_kept() {
        let raw = json!([{"id": 40, "order": 3, "name": "Care", "items": [
            {"attribute_label": "Washing", "value": "30°"}
        ]}]);
        let groups = normalize(&raw);
        assert_eq!(groups[0].id, 40);
        assert_eq!(groups[0].order, 3);
    }
}
