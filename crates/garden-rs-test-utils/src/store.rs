use async_trait::async_trait;
use chrono::Utc;
use garden_rs_core::{Created, Listing, NewRecord, RecordStore, StoreError};
use garden_rs_protocol::{MemoryRecord, RecordId};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

/// Record store held in memory that counts every call.
#[derive(Default)]
pub struct InMemoryStore {
    records: Mutex<Vec<MemoryRecord>>,
    failure: Mutex<Option<String>>,
    listing_gate: Mutex<Option<Arc<Notify>>>,
    list_calls: AtomicUsize,
    create_calls: AtomicUsize,
    water_calls: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<MemoryRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    /// Make every following call fail with a backend error.
    pub fn fail_with(&self, message: impl Into<String>) {
        *self.failure.lock() = Some(message.into());
    }

    pub fn clear_failure(&self) {
        *self.failure.lock() = None;
    }

    /// Make listings snapshot the records, then wait until the returned
    /// handle is notified before answering.
    pub fn hold_listings(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.listing_gate.lock() = Some(gate.clone());
        gate
    }

    pub fn records(&self) -> Vec<MemoryRecord> {
        self.records.lock().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn water_calls(&self) -> usize {
        self.water_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.list_calls() + self.create_calls() + self.water_calls()
    }

    fn check_failure(&self) -> Result<(), StoreError> {
        match self.failure.lock().clone() {
            Some(message) => Err(StoreError::Backend(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn list_records(&self) -> Result<Listing, StoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        let records = self.records();
        let gate = self.listing_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(Listing {
            records,
            skipped: 0,
        })
    }

    async fn create_record(&self, record: &NewRecord) -> Result<Created, StoreError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        record.ensure_valid()?;
        let now = Utc::now();
        let id = RecordId::from_time(now);
        self.records.lock().push(MemoryRecord {
            id: id.clone(),
            position: record.position,
            title: record.title.clone(),
            body: record.body.clone(),
            icon: record.icon,
            created_at: Some(now),
            last_watered: None,
        });
        Ok(Created {
            assigned_id: Some(id),
        })
    }

    async fn water_record(&self, id: &RecordId) -> Result<(), StoreError> {
        self.water_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        let mut records = self.records.lock();
        let record = records
            .iter_mut()
            .find(|record| &record.id == id)
            .ok_or_else(|| StoreError::Backend("Memory not found".to_string()))?;
        record.water(Utc::now());
        Ok(())
    }
}
