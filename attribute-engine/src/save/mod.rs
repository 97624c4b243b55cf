//! Save coordinator - 属性值的防抖乐观保存
//!
//! Each scope key runs its own state machine:
//!
//! ```text
//! idle ──(debounce elapsed | commit)──▶ saving ──▶ saved
//!  ▲                                      │
//!  └───────────── next edit ◀──────── error (rolled back)
//! ```
//!
//! - Edits update the [`ValueStore`] immediately and (re)arm a debounce timer
//! - At most one persistence call is in flight per key; edits arriving during
//!   `saving` are queued (last value wins) and flushed after it settles
//! - A failed call moves the key to `error` and restores the authoritative
//!   value fetched from the catalog service
//! - Validation failures never reach the catalog service
//!
//! Keys are independent; there is no ordering across keys.

mod state;

#[cfg(test)]
mod tests;

pub use state::{SaveEvent, SaveState};

use dashmap::{DashMap, DashSet};
use serde_json::Value;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::Attribute;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::catalog::CatalogCollaborator;
use crate::codec;
use crate::scope::{ScopeKey, derive_key, key_for_value};
use crate::store::ValueStore;

/// Default debounce window
pub const DEBOUNCE_MS: u64 = 500;

/// Broadcast buffer for save events
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Per-key bookkeeping
struct Slot {
    attribute: Attribute,
    state: SaveState,
    /// Last value known to be persisted (`None` = no value)
    baseline: Option<Value>,
    /// Raw user value waiting to be persisted
    pending: Option<Value>,
    /// Normalized value of the call in flight
    in_flight: Option<Value>,
    /// Debounce timer of the pending edit
    timer: Option<CancellationToken>,
    /// Flush right after the in-flight call settles instead of re-debouncing
    commit_requested: bool,
}

impl Slot {
    fn new(attribute: Attribute, baseline: Option<Value>) -> Self {
        Self {
            attribute,
            state: SaveState::Idle,
            baseline,
            pending: None,
            in_flight: None,
            timer: None,
            commit_requested: false,
        }
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }
}

struct Inner {
    product_id: i64,
    attributes: HashMap<i64, Attribute>,
    catalog: Arc<dyn CatalogCollaborator>,
    values: ValueStore,
    slots: DashMap<ScopeKey, Slot>,
    /// Keys whose field is not visible; their transitions are not broadcast
    hidden: DashSet<ScopeKey>,
    events: broadcast::Sender<SaveEvent>,
    debounce: Duration,
    shutdown: CancellationToken,
}

/// Debounced, optimistic persistence of one product's attribute values
///
/// Cheap to clone; clones share state. Must be used inside a tokio runtime.
#[derive(Clone)]
pub struct SaveCoordinator {
    inner: Arc<Inner>,
}

impl SaveCoordinator {
    pub fn new(
        product_id: i64,
        attributes: impl IntoIterator<Item = Attribute>,
        catalog: Arc<dyn CatalogCollaborator>,
        debounce: Duration,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                product_id,
                attributes: attributes.into_iter().map(|a| (a.id, a)).collect(),
                catalog,
                values: ValueStore::new(),
                slots: DashMap::new(),
                hidden: DashSet::new(),
                events,
                debounce,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub fn product_id(&self) -> i64 {
        self.inner.product_id
    }

    /// Shared view of the product's values
    pub fn values(&self) -> ValueStore {
        self.inner.values.clone()
    }

    pub fn attribute(&self, attribute_id: i64) -> Option<&Attribute> {
        self.inner.attributes.get(&attribute_id)
    }

    /// Canonical key for an attribute at the given scope
    pub fn key(&self, attribute: &Attribute, locale: Option<&str>, channel: Option<&str>) -> ScopeKey {
        derive_key(attribute, locale, channel)
    }

    pub fn state(&self, key: &ScopeKey) -> SaveState {
        self.inner
            .slots
            .get(key)
            .map(|slot| slot.state)
            .unwrap_or_default()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SaveEvent> {
        self.inner.events.subscribe()
    }

    /// Mark whether the field behind `key` is visible
    ///
    /// Hidden fields still get their in-flight result applied to the value
    /// store; only their events are suppressed.
    pub fn observe(&self, key: &ScopeKey, visible: bool) {
        if visible {
            self.inner.hidden.remove(key);
        } else {
            self.inner.hidden.insert(key.clone());
        }
    }

    /// Record a user edit and schedule its persistence
    ///
    /// After [`shutdown`](Self::shutdown) edits are refused and leave the
    /// value store untouched.
    pub fn edit(
        &self,
        attribute: &Attribute,
        locale: Option<&str>,
        channel: Option<&str>,
        value: Value,
    ) -> ScopeKey {
        let inner = &self.inner;
        let key = derive_key(attribute, locale, channel);
        if inner.shutdown.is_cancelled() {
            tracing::warn!(key = %key, product_id = inner.product_id, "Save coordinator shut down, edit ignored");
            return key;
        }
        let normalized = codec::normalize(&value, attribute.data_type);

        let mut slot = inner
            .slots
            .entry(key.clone())
            .or_insert_with(|| Slot::new(attribute.clone(), inner.values.get(&key)));
        slot.attribute = attribute.clone();
        inner.values.set(key.clone(), normalized);
        slot.pending = Some(value);

        if matches!(slot.state, SaveState::Saved | SaveState::Error) {
            slot.state = SaveState::Idle;
            inner.emit(&key, SaveState::Idle, None);
        }

        if slot.in_flight.is_some() {
            tracing::debug!(key = %key, "Save in flight, edit queued");
        } else {
            inner.arm_timer(&key, &mut slot);
        }
        key
    }

    /// Persist the pending edit of `key` now, skipping the rest of the debounce window
    ///
    /// While a call is in flight the edit is flushed as soon as it settles and
    /// this returns `Ok` immediately.
    pub async fn commit(&self, key: &ScopeKey) -> AppResult<()> {
        match self.inner.slots.get_mut(key) {
            Some(mut slot) => slot.cancel_timer(),
            None => return Ok(()),
        }
        tracing::debug!(key = %key, "Commit requested");
        Arc::clone(&self.inner).flush(key.clone(), None).await
    }

    /// Discard the pending edit of `key` and restore the pre-edit value
    ///
    /// A call already in flight is never cancelled; its value is restored instead.
    pub fn cancel(&self, key: &ScopeKey) {
        let inner = &self.inner;
        let Some(mut slot) = inner.slots.get_mut(key) else {
            return;
        };
        slot.cancel_timer();
        slot.pending = None;
        slot.commit_requested = false;

        let restore = slot.in_flight.clone().or_else(|| slot.baseline.clone());
        match restore {
            Some(value) => inner.values.set(key.clone(), value),
            None => inner.values.remove(key),
        }

        if slot.in_flight.is_none() && slot.state != SaveState::Idle {
            slot.state = SaveState::Idle;
            inner.emit(key, SaveState::Idle, None);
        }
        tracing::debug!(key = %key, "Edit cancelled");
    }

    /// Replace all values with the catalog service's, keeping unsaved edits on top
    pub async fn reload(&self) -> AppResult<()> {
        let inner = &self.inner;
        let fetched = inner.catalog.fetch_values(inner.product_id).await.map_err(|e| {
            tracing::error!(product_id = inner.product_id, error = %e, "Failed to reload attribute values");
            AppError::with_message(
                ErrorCode::ReloadFailed,
                format!("Failed to reload attribute values: {}", e.message),
            )
        })?;

        let mut attributes = inner.attributes.clone();
        for slot in inner.slots.iter() {
            attributes
                .entry(slot.attribute.id)
                .or_insert_with(|| slot.attribute.clone());
        }
        inner.values.reload_from(&fetched, &attributes);

        for mut slot in inner.slots.iter_mut() {
            let key = slot.key().clone();
            slot.baseline = inner.values.get(&key);
            let optimistic = slot
                .pending
                .as_ref()
                .map(|raw| codec::normalize(raw, slot.attribute.data_type))
                .or_else(|| slot.in_flight.clone());
            if let Some(value) = optimistic {
                inner.values.set(key, value);
            }
        }
        tracing::info!(product_id = inner.product_id, count = fetched.len(), "Attribute values loaded");
        Ok(())
    }

    /// Cancel every debounce timer; pending edits are not persisted and later edits are refused
    pub fn shutdown(&self) {
        tracing::info!(product_id = self.inner.product_id, "Save coordinator shutting down");
        self.inner.shutdown.cancel();
    }
}

impl Inner {
    fn emit(&self, key: &ScopeKey, state: SaveState, error: Option<AppError>) {
        if self.hidden.contains(key) {
            return;
        }
        // No subscribers is fine
        let _ = self.events.send(SaveEvent {
            key: key.clone(),
            state,
            error,
        });
    }

    fn arm_timer(self: &Arc<Self>, key: &ScopeKey, slot: &mut Slot) {
        slot.cancel_timer();
        let token = self.shutdown.child_token();
        slot.timer = Some(token.clone());

        let inner = Arc::clone(self);
        let key = key.clone();
        let delay = self.debounce;
        tokio::spawn(async move {
            let cancelled = token.clone();
            tokio::select! {
                _ = cancelled.cancelled() => {
                    tracing::trace!(key = %key, "Debounce timer superseded");
                }
                _ = tokio::time::sleep(delay) => {
                    tracing::debug!(key = %key, "Debounce elapsed");
                    // Errors are reported through save events
                    let _ = inner.flush(key, Some(token)).await;
                }
            }
        });
    }

    /// Send the pending edit of `key`, if any and nothing is in flight
    ///
    /// `timer` is the debounce token that triggered the flush; a superseded
    /// token makes this a no-op.
    async fn flush(self: Arc<Self>, key: ScopeKey, timer: Option<CancellationToken>) -> AppResult<()> {
        let payload = {
            let Some(mut slot) = self.slots.get_mut(&key) else {
                return Ok(());
            };
            if let Some(token) = &timer {
                if token.is_cancelled() {
                    return Ok(());
                }
                slot.timer = None;
            }
            if slot.in_flight.is_some() {
                if timer.is_none() && slot.pending.is_some() {
                    slot.commit_requested = true;
                }
                return Ok(());
            }
            let Some(raw) = slot.pending.take() else {
                return Ok(());
            };
            slot.commit_requested = false;

            let data_type = slot.attribute.data_type;
            match codec::encode_for_save(&raw, data_type) {
                Ok(payload) => {
                    slot.in_flight = Some(codec::normalize(&raw, data_type));
                    slot.state = SaveState::Saving;
                    self.emit(&key, SaveState::Saving, None);
                    payload
                }
                Err(e) => {
                    tracing::warn!(key = %key, data_type = %data_type, error = %e, "Rejected invalid attribute value");
                    slot.state = SaveState::Idle;
                    self.emit(&key, SaveState::Idle, Some(e.clone()));
                    return Err(e);
                }
            }
        };

        tracing::debug!(key = %key, "Persisting attribute value");
        let result = self
            .catalog
            .persist_value(
                self.product_id,
                key.attribute_id,
                key.locale.as_deref(),
                key.channel.as_deref(),
                payload,
            )
            .await;

        match result {
            Ok(()) => {
                tracing::info!(key = %key, product_id = self.product_id, "Attribute value saved");
                if let Some(mut slot) = self.slots.get_mut(&key) {
                    slot.baseline = slot.in_flight.take();
                    slot.state = SaveState::Saved;
                    self.emit(&key, SaveState::Saved, None);
                }
                self.settle(&key);
                Ok(())
            }
            Err(e) => {
                tracing::error!(key = %key, product_id = self.product_id, error = %e, "Failed to persist attribute value");
                let authoritative = self.resync(&key).await;
                if let Some(mut slot) = self.slots.get_mut(&key) {
                    slot.in_flight = None;
                    if let Some(value) = authoritative {
                        slot.baseline = value;
                    }
                    match slot.baseline.clone() {
                        Some(value) => self.values.set(key.clone(), value),
                        None => self.values.remove(&key),
                    }
                    slot.state = SaveState::Error;
                    self.emit(&key, SaveState::Error, Some(e.clone()));
                }
                self.settle(&key);
                Err(e)
            }
        }
    }

    /// Authoritative value of `key` from the catalog service
    ///
    /// Outer `None` when the fetch itself failed.
    async fn resync(&self, key: &ScopeKey) -> Option<Option<Value>> {
        let attribute = self.slots.get(key).map(|slot| slot.attribute.clone())?;
        match self.catalog.fetch_values(self.product_id).await {
            Ok(values) => Some(
                values
                    .iter()
                    .filter(|v| v.attribute_id == key.attribute_id)
                    .find(|v| key_for_value(v, Some(&attribute)) == *key)
                    .map(|v| codec::normalize(&v.value, attribute.data_type)),
            ),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Resync failed, restoring last saved value");
                None
            }
        }
    }

    /// Re-apply an edit queued during the call that just settled
    fn settle(self: &Arc<Self>, key: &ScopeKey) {
        let Some(mut slot) = self.slots.get_mut(key) else {
            return;
        };
        let Some(raw) = slot.pending.clone() else {
            slot.commit_requested = false;
            return;
        };
        self.values
            .set(key.clone(), codec::normalize(&raw, slot.attribute.data_type));

        if slot.commit_requested {
            drop(slot);
            let inner = Arc::clone(self);
            let key = key.clone();
            tokio::spawn(async move {
                let _ = inner.flush(key, None).await;
            });
        } else {
            self.arm_timer(key, &mut slot);
        }
    }
}
