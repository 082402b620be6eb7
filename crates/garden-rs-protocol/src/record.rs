//! Memory record model.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum title length accepted by the create form.
pub const TITLE_MAX_CHARS: usize = 100;
/// Maximum body length accepted by the create form.
pub const BODY_MAX_CHARS: usize = 500;

/// Identifier of a record: the creation timestamp exactly as the backend
/// stores it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build an id from a timestamp using the backend's ISO-8601 format.
    pub fn from_time(at: DateTime<Utc>) -> Self {
        Self(at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

impl Position {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lng)
    }
}

/// One of the six flower images a memory can be planted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum IconId {
    #[default]
    One,
    Two,
    Three,
    Four,
    Five,
    Six,
}

impl IconId {
    /// Every icon in picker order.
    pub const ALL: [IconId; 6] = [
        IconId::One,
        IconId::Two,
        IconId::Three,
        IconId::Four,
        IconId::Five,
        IconId::Six,
    ];

    /// Numeric identifier used on the wire and in asset names.
    pub fn number(self) -> u8 {
        match self {
            IconId::One => 1,
            IconId::Two => 2,
            IconId::Three => 3,
            IconId::Four => 4,
            IconId::Five => 5,
            IconId::Six => 6,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        Self::ALL.get(usize::from(number).checked_sub(1)?).copied()
    }

    /// Next icon in picker order, wrapping around.
    pub fn next(self) -> Self {
        Self::ALL[usize::from(self.number()) % Self::ALL.len()]
    }

    /// Previous icon in picker order, wrapping around.
    pub fn prev(self) -> Self {
        let idx = usize::from(self.number()) - 1;
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for IconId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

impl FromStr for IconId {
    type Err = String;

    /// Accepts `"3"` as well as legacy asset names such as `"3.png"`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let digits = trimmed
            .split('.')
            .next()
            .unwrap_or_default()
            .trim_end_matches(|ch: char| !ch.is_ascii_digit());
        digits
            .parse::<u8>()
            .ok()
            .and_then(Self::from_number)
            .ok_or_else(|| format!("unknown icon: {trimmed}"))
    }
}

impl Serialize for IconId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for IconId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A memory pinned to the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Creation timestamp as stored by the backend.
    pub id: RecordId,
    pub position: Position,
    pub title: String,
    pub body: String,
    pub icon: IconId,
    /// Parsed creation time, when the id is a recognizable timestamp.
    pub created_at: Option<DateTime<Utc>>,
    /// Last time the memory was watered; never earlier than `created_at`.
    pub last_watered: Option<DateTime<Utc>>,
}

impl MemoryRecord {
    /// Timestamp the fade is measured from.
    pub fn freshness(&self) -> Option<DateTime<Utc>> {
        self.last_watered.or(self.created_at)
    }

    /// Record a watering at `at`, keeping the freshness invariant.
    pub fn water(&mut self, at: DateTime<Utc>) {
        let at = match self.created_at {
            Some(created) if at < created => created,
            _ => at,
        };
        self.last_watered = Some(at);
    }
}

/// Parse the timestamp formats the backend produces.
///
/// Accepts RFC 3339 (`2025-03-01T10:00:00.000Z`) and the spreadsheet's plain
/// `2025-03-01 10:00:00` form, read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn icon_parses_plain_and_legacy_names() {
        assert_eq!("3".parse::<IconId>(), Ok(IconId::Three));
        assert_eq!(" 6 ".parse::<IconId>(), Ok(IconId::Six));
        assert_eq!("1.png".parse::<IconId>(), Ok(IconId::One));
        assert!("7".parse::<IconId>().is_err());
        assert!("rose".parse::<IconId>().is_err());
        assert!("0".parse::<IconId>().is_err());
    }

    #[test]
    fn icon_cycles_in_picker_order() {
        assert_eq!(IconId::Six.next(), IconId::One);
        assert_eq!(IconId::One.prev(), IconId::Six);
        assert_eq!(IconId::Three.next(), IconId::Four);
        assert_eq!(IconId::Three.prev(), IconId::Two);
    }

    #[test]
    fn parses_rfc3339_and_sheet_timestamps() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2025-03-01T10:00:00.000Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-01 10:00:00"), Some(expected));
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn water_never_precedes_creation() {
        let created = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        let mut record = MemoryRecord {
            id: RecordId::from_time(created),
            position: Position::new(0.0, 0.0),
            title: String::new(),
            body: String::new(),
            icon: IconId::One,
            created_at: Some(created),
            last_watered: None,
        };
        assert_eq!(record.freshness(), Some(created));

        record.water(created - chrono::Duration::days(1));
        assert_eq!(record.last_watered, Some(created));

        let later = created + chrono::Duration::days(3);
        record.water(later);
        assert_eq!(record.freshness(), Some(later));
    }

    #[test]
    fn record_id_uses_millisecond_iso_format() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        assert_eq!(RecordId::from_time(at).as_str(), "2025-03-01T10:00:00.000Z");
    }
}
