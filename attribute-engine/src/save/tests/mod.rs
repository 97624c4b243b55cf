use super::*;
use crate::test_support::MockCatalog;
use serde_json::json;
use shared::models::{AttributeValue, DataType};


fn color() -> Attribute {
    Attribute::new(1, "color", "Color", DataType::Text)
}

fn weight() -> Attribute {
    Attribute::new(2, "weight", "Weight", DataType::Number)
}

fn price() -> Attribute {
    Attribute::new(3, "price", "Price", DataType::Price).scopable()
}

fn coordinator(catalog: &Arc<MockCatalog>) -> SaveCoordinator {
    SaveCoordinator::new(
        42,
        [color(), weight(), price()],
        catalog.clone(),
        Duration::from_millis(DEBOUNCE_MS),
    )
}

/// Catalog already holding `color = "Blue"`
fn catalog_with_blue() -> Arc<MockCatalog> {
    Arc::new(MockCatalog::new().with_values(vec![AttributeValue::new(1, json!("Blue"))]))
}

fn drain(rx: &mut broadcast::Receiver<SaveEvent>) -> Vec<SaveEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn states(events: &[SaveEvent]) -> Vec<SaveState> {
    events.iter().map(|e| e.state).collect()
}

async fn wait_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
