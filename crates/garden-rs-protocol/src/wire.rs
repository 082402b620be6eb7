//! Raw request/response shapes exchanged with the spreadsheet endpoint.

use crate::record::{IconId, MemoryRecord, Position, RecordId, parse_timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row of the `GET` listing, with cells as the sheet returns them.
///
/// Coordinates and icons may be strings or numbers, so every cell is kept
/// as a raw JSON value until [`RecordRow::into_record`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RecordRow {
    #[serde(default)]
    pub timestamp: Value,
    #[serde(default)]
    pub lat: Value,
    #[serde(default)]
    pub lng: Value,
    #[serde(default)]
    pub title: Value,
    #[serde(default)]
    pub body: Value,
    #[serde(default)]
    pub icon: Value,
    #[serde(default)]
    pub lastwatered: Value,
}

/// Reasons a listed row cannot become a record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RowError {
    /// A coordinate cell was missing or not a finite number.
    #[error("invalid {field}: {value}")]
    InvalidCoordinate { field: &'static str, value: String },
}

impl RecordRow {
    /// Convert the row into a record.
    ///
    /// Unknown icons fall back to the first icon; a `lastwatered` earlier
    /// than the creation time is raised to the creation time.
    pub fn into_record(self) -> Result<MemoryRecord, RowError> {
        let lat = coordinate(&self.lat, "lat")?;
        let lng = coordinate(&self.lng, "lng")?;
        let id = cell_text(&self.timestamp);
        let created_at = parse_timestamp(&id);
        let icon = cell_text(&self.icon).parse().unwrap_or_default();
        let mut record = MemoryRecord {
            id: RecordId::new(id),
            position: Position::new(lat, lng),
            title: cell_text(&self.title),
            body: cell_text(&self.body),
            icon,
            created_at,
            last_watered: None,
        };
        if let Some(watered) = parse_timestamp(&cell_text(&self.lastwatered)) {
            record.water(watered);
        }
        Ok(record)
    }

    /// Whether the icon cell names one of the known icons.
    pub fn has_known_icon(&self) -> bool {
        cell_text(&self.icon).parse::<IconId>().is_ok()
    }
}

/// Render a sheet cell as text; `null` becomes the empty string.
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Read a coordinate cell, accepting numbers and numeric strings.
fn coordinate(value: &Value, field: &'static str) -> Result<f64, RowError> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|number| number.is_finite())
        .ok_or_else(|| RowError::InvalidCoordinate {
            field,
            value: cell_text(value),
        })
}

/// Form body for creating a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateForm {
    pub lat: String,
    pub lng: String,
    pub title: String,
    pub body: String,
    pub icon: String,
}

impl CreateForm {
    pub fn new(position: Position, title: &str, body: &str, icon: IconId) -> Self {
        Self {
            lat: position.lat.to_string(),
            lng: position.lng.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            icon: icon.to_string(),
        }
    }
}

/// Form body for watering a record; `uuid` carries the record timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaterForm {
    pub uuid: String,
}

impl WaterForm {
    pub fn new(id: &RecordId) -> Self {
        Self {
            uuid: id.as_str().to_string(),
        }
    }
}

/// Reply to any `POST`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastwatered: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BackendReply {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            lastwatered: None,
            error: Some(error.into()),
        }
    }
}
