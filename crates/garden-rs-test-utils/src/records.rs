//! Fixture builders for records, rows and contexts.

use chrono::{DateTime, Utc};
use garden_rs_core::{FixedClock, GardenContext, RecordStore};
use garden_rs_protocol::{IconId, MemoryRecord, Position, RecordId};
use serde_json::{Value, json};
use std::sync::Arc;

/// A record created at `created` with placeholder text.
pub fn memory(created: DateTime<Utc>, position: Position, icon: IconId) -> MemoryRecord {
    MemoryRecord {
        id: RecordId::from_time(created),
        position,
        title: "title".to_string(),
        body: "body".to_string(),
        icon,
        created_at: Some(created),
        last_watered: None,
    }
}

/// A listing row with every cell as a string, the way the sheet returns them.
pub fn row(timestamp: &str, lat: &str, lng: &str, icon: &str) -> Value {
    json!({
        "timestamp": timestamp,
        "lat": lat,
        "lng": lng,
        "title": "title",
        "body": "body",
        "icon": icon,
    })
}

/// Context over `store` with a fixed clock at `now`.
pub fn context_for(
    store: Arc<dyn RecordStore>,
    now: DateTime<Utc>,
) -> (GardenContext, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::new(now));
    let context = GardenContext::new(Default::default(), store).with_clock(clock.clone());
    (context, clock)
}
