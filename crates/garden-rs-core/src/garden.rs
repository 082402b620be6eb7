//! Garden service: the record lifecycle on top of a [`GardenContext`].

use crate::context::GardenContext;
use crate::draft::RecordDraft;
use crate::error::StoreError;
use crate::event_bus::Subscription;
use crate::presentation::MarkerView;
use chrono::{DateTime, Utc};
use garden_rs_protocol::{GardenAction, GardenEvent, MemoryRecord, RecordId, parse_timestamp};
use log::{debug, info, warn};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Cached records plus the local changes a listing may not contain yet.
#[derive(Default)]
struct Cache {
    records: Vec<MemoryRecord>,
    /// Ids planted or watered locally, with the load generation current
    /// when the change finished.
    local: HashMap<RecordId, u64>,
}

impl Cache {
    fn mark_local(&mut self, id: &RecordId, generation: u64) {
        self.local.insert(id.clone(), generation);
    }

    /// Fold a listing from load `generation` into the cache.
    ///
    /// Local changes that finished after that load started win over the
    /// listing: missing ids are kept and the later freshness is kept for ids
    /// present in both.
    fn apply_listing(&mut self, mut listed: Vec<MemoryRecord>, generation: u64) {
        for (id, changed_at) in &self.local {
            if *changed_at < generation {
                continue;
            }
            let Some(local) = self.records.iter().find(|record| &record.id == id) else {
                continue;
            };
            match listed.iter_mut().find(|record| &record.id == id) {
                Some(record) => {
                    if local.freshness() > record.freshness() {
                        record.last_watered = local.last_watered;
                    }
                }
                None => {
                    debug!("kept local memory missing from listing (id={id})");
                    listed.push(local.clone());
                }
            }
        }
        self.local.retain(|_, changed_at| *changed_at >= generation);
        self.records = listed;
    }
}

/// Locally cached records plus the actions that change them.
///
/// Every action publishes a [`GardenEvent`], including failures, so views
/// can react through a [`Subscription`] instead of callbacks.
pub struct Garden {
    context: GardenContext,
    cache: RwLock<Cache>,
    /// Number of loads started so far.
    generation: AtomicU64,
}

impl Garden {
    pub fn new(context: GardenContext) -> Self {
        Self {
            context,
            cache: RwLock::new(Cache::default()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn context(&self) -> &GardenContext {
        &self.context
    }

    /// Subscribe to garden events.
    pub fn subscribe(&self) -> Subscription {
        self.context.events().subscribe()
    }

    /// Snapshot of the cached records in listing order.
    pub fn records(&self) -> Vec<MemoryRecord> {
        self.cache.read().records.clone()
    }

    pub fn record(&self, id: &RecordId) -> Option<MemoryRecord> {
        self.cache
            .read()
            .records
            .iter()
            .find(|record| &record.id == id)
            .cloned()
    }

    /// Marker views for every cached record at the context clock's now.
    pub fn markers(&self) -> Vec<MarkerView> {
        self.markers_at(self.context.now())
    }

    pub fn markers_at(&self, now: DateTime<Utc>) -> Vec<MarkerView> {
        let presenter = self.context.presenter();
        self.cache
            .read()
            .records
            .iter()
            .map(|record| presenter.marker(record, now))
            .collect()
    }

    /// Replace the cached records with the backend's listing.
    ///
    /// Records planted or watered while the listing was in flight are merged
    /// in rather than lost. On failure the previous records are kept.
    pub async fn load(&self) -> Result<usize, StoreError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        match self.context.store().list_records().await {
            Ok(listing) => {
                let count = {
                    let mut cache = self.cache.write();
                    cache.apply_listing(listing.records, generation);
                    cache.records.len()
                };
                info!(
                    "loaded memories (count={}, skipped={}, generation={})",
                    count, listing.skipped, generation
                );
                self.emit(GardenEvent::Loaded {
                    count,
                    skipped: listing.skipped,
                });
                Ok(count)
            }
            Err(err) => Err(self.fail(GardenAction::Load, err)),
        }
    }

    /// Validate and submit a draft, then add the new record locally.
    ///
    /// Invalid drafts fail before any request is made.
    pub async fn plant(&self, draft: &RecordDraft) -> Result<MemoryRecord, StoreError> {
        let new_record = match draft.validate() {
            Ok(record) => record,
            Err(err) => return Err(self.fail(GardenAction::Plant, err.into())),
        };
        let created = match self.context.store().create_record(&new_record).await {
            Ok(created) => created,
            Err(err) => return Err(self.fail(GardenAction::Plant, err)),
        };

        let now = self.context.now();
        let id = created
            .assigned_id
            .unwrap_or_else(|| RecordId::from_time(now));
        let record = MemoryRecord {
            created_at: parse_timestamp(id.as_str()).or(Some(now)),
            id,
            position: new_record.position,
            title: new_record.title,
            body: new_record.body,
            icon: new_record.icon,
            last_watered: None,
        };
        info!(
            "planted memory (id={}, position={})",
            record.id, record.position
        );
        {
            let mut cache = self.cache.write();
            cache.records.push(record.clone());
            cache.mark_local(&record.id, self.generation.load(Ordering::SeqCst));
        }
        self.emit(GardenEvent::Planted {
            record: record.clone(),
        });
        Ok(record)
    }

    /// Water a record, restoring it to full freshness.
    ///
    /// Returns the time recorded locally as the new freshness.
    pub async fn water(&self, id: &RecordId) -> Result<DateTime<Utc>, StoreError> {
        if let Err(err) = self.context.store().water_record(id).await {
            return Err(self.fail(GardenAction::Water, err));
        }
        let now = self.context.now();
        let at = {
            let mut cache = self.cache.write();
            let generation = self.generation.load(Ordering::SeqCst);
            match cache.records.iter_mut().find(|record| &record.id == id) {
                Some(record) => {
                    record.water(now);
                    let at = record.last_watered.unwrap_or(now);
                    cache.mark_local(id, generation);
                    at
                }
                None => {
                    warn!("watered a memory that is not cached (id={id})");
                    now
                }
            }
        };
        info!("watered memory (id={id})");
        self.emit(GardenEvent::Watered {
            id: id.clone(),
            at,
        });
        Ok(at)
    }

    fn emit(&self, event: GardenEvent) {
        self.context.events().emit(event);
    }

    fn fail(&self, action: GardenAction, err: StoreError) -> StoreError {
        let message = err.status_line(action);
        warn!("garden action failed (action={action:?}, error={err})");
        self.emit(GardenEvent::Failed { action, message });
        err
    }
}
