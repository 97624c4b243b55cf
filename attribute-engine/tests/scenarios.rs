//! End-to-end behavior of the engine through its public API

mod common;

use attribute_engine::storage::MemoryStore;
use attribute_engine::{
    EngineConfig, ImportSession, ImportStep, MappingResolver, SaveCoordinator, SaveState,
    TemplateStore, codec, groups,
};
use common::RecordingCatalog;
use serde_json::json;
use shared::models::{Attribute, DataType, ImportFieldSchemaEntry};
use std::sync::Arc;
use tokio::time::Duration;

fn schema() -> Vec<ImportFieldSchemaEntry> {
    vec![
        ImportFieldSchemaEntry::new("sku", "SKU").required(),
        ImportFieldSchemaEntry::new("name", "Name"),
        ImportFieldSchemaEntry::new("gtin", "GTIN"),
    ]
}

fn headers(list: &[&str]) -> Vec<String> {
    list.iter().map(|h| h.to_string()).collect()
}

#[tokio::test(start_paused = true)]
async fn color_edit_saves_once_after_debounce() {
    let catalog = Arc::new(RecordingCatalog::default());
    let config = EngineConfig::default();
    let color = Attribute::new(1, "color", "Color", DataType::Text);
    let saver = SaveCoordinator::new(7, [color.clone()], catalog.clone(), config.save_debounce());
    let mut events = saver.subscribe();

    let key = saver.edit(&color, None, None, json!("Red"));
    assert_eq!(saver.state(&key), SaveState::Idle);

    tokio::time::sleep(Duration::from_millis(config.save_debounce_ms + 100)).await;

    assert_eq!(*catalog.payloads.lock(), vec![(1, json!("Red"))]);
    let mut states = Vec::new();
    while let Ok(event) = events.try_recv() {
        states.push(event.state);
    }
    assert_eq!(states, vec![SaveState::Saving, SaveState::Saved]);
}

#[test]
fn price_payload_is_json_text() {
    let payload = codec::encode_for_save(
        &json!({"amount": 19.99, "currency": "EUR"}),
        DataType::Price,
    )
    .unwrap();
    assert_eq!(payload, json!(r#"{"amount":19.99,"currency":"EUR"}"#));
}

#[test]
fn product_headers_auto_map() {
    let res = MappingResolver::default().resolve(
        &headers(&["Product SKU", "Product Name", "GTIN"]),
        &schema(),
        None,
    );
    assert!(res.is_valid);
    assert_eq!(res.mapping.get("Product SKU"), Some("sku"));
    assert_eq!(res.mapping.get("Product Name"), Some("name"));
    assert_eq!(res.mapping.get("GTIN"), Some("gtin"));
    assert_eq!(res.mapping.len(), 3);
}

#[tokio::test]
async fn import_without_sku_cannot_proceed() {
    let catalog = Arc::new(RecordingCatalog::default());
    let templates = TemplateStore::new(Arc::new(MemoryStore::new()));
    let mut session = ImportSession::new(catalog.clone(), templates, schema(), &EngineConfig::default());

    let res = session.load_file("prices.csv", b"Price,Description\n9.99,Chair\n".to_vec());
    assert!(!res.is_valid);
    assert!(session.confirm_mapping().unwrap_err().is_schema_mismatch());
    assert!(session.submit().await.is_err());
    assert_eq!(session.step(), ImportStep::MapColumns);
    assert!(catalog.jobs.lock().is_empty());
}

#[test]
fn attributes_without_groups_are_uncategorized() {
    let raw = json!([
        {"attribute_id": 1, "attribute_label": "Color", "value": "Red"},
        {"attribute_id": 2, "attribute_label": "Weight", "value": 2.5},
        {"attribute_id": 3, "attribute_label": "Material", "value": "Oak"},
    ]);
    let result = groups::normalize(&raw);
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].name, "Uncategorized");
    assert_eq!(result[0].items.len(), 3);
}
