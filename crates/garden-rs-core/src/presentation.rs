//! Marker presentation: icon assets, opacity and popup text.

use crate::decay::{DecayModel, is_visible, render_opacity};
use chrono::{DateTime, Local, Utc};
use garden_rs_protocol::{IconId, MemoryRecord, Position, RecordId};
use serde::Serialize;

/// Which rendition of an icon image is wanted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconSize {
    /// Map marker image.
    Small,
    /// Picker preview image.
    Large,
}

impl IconSize {
    fn suffix(self) -> &'static str {
        match self {
            IconSize::Small => "small",
            IconSize::Large => "large",
        }
    }
}

/// Path of an icon image under the asset base.
pub fn icon_asset(base: &str, icon: IconId, size: IconSize) -> String {
    let file = format!("{}.{}.png", icon.number(), size.suffix());
    if base.is_empty() {
        file
    } else if base.ends_with('/') {
        format!("{base}{file}")
    } else {
        format!("{base}/{file}")
    }
}

/// Text shown when a marker is opened.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Popup {
    pub title: String,
    /// Creation time in local time, empty when the timestamp is unreadable.
    pub created: String,
    pub body: String,
}

/// Everything needed to draw one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerView {
    pub id: RecordId,
    pub position: Position,
    pub icon: IconId,
    pub asset: String,
    /// Raw decay value, possibly outside `[0, 1]`.
    pub opacity: f64,
    pub popup: Popup,
}

impl MarkerView {
    pub fn is_visible(&self) -> bool {
        is_visible(self.opacity)
    }

    /// Opacity clamped for drawing.
    pub fn render_opacity(&self) -> f64 {
        render_opacity(self.opacity)
    }
}

/// Builds marker views from records.
#[derive(Debug, Clone)]
pub struct Presenter {
    decay: DecayModel,
    assets_base: String,
}

impl Presenter {
    pub fn new(decay: DecayModel, assets_base: impl Into<String>) -> Self {
        Self {
            decay,
            assets_base: assets_base.into(),
        }
    }

    pub fn icon_asset(&self, icon: IconId, size: IconSize) -> String {
        icon_asset(&self.assets_base, icon, size)
    }

    pub fn marker(&self, record: &MemoryRecord, now: DateTime<Utc>) -> MarkerView {
        MarkerView {
            id: record.id.clone(),
            position: record.position,
            icon: record.icon,
            asset: self.icon_asset(record.icon, IconSize::Small),
            opacity: self.decay.record_opacity(record, now),
            popup: Popup {
                title: record.title.clone(),
                created: record.created_at.map(local_label).unwrap_or_default(),
                body: record.body.clone(),
            },
        }
    }
}

fn local_label(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    fn record(created: DateTime<Utc>) -> MemoryRecord {
        MemoryRecord {
            id: RecordId::from_time(created),
            position: Position::new(12.5, -7.25),
            title: "A".to_string(),
            body: "B".to_string(),
            icon: IconId::Three,
            created_at: Some(created),
            last_watered: None,
        }
    }

    #[test]
    fn asset_paths_join_base() {
        assert_eq!(icon_asset("", IconId::Two, IconSize::Small), "2.small.png");
        assert_eq!(
            icon_asset("img", IconId::Six, IconSize::Large),
            "img/6.large.png"
        );
        assert_eq!(
            icon_asset("https://cdn.test/f/", IconId::One, IconSize::Small),
            "https://cdn.test/f/1.small.png"
        );
    }

    #[test]
    fn marker_carries_icon_and_decay() {
        let created = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        let presenter = Presenter::new(DecayModel::default(), "");
        let marker = presenter.marker(&record(created), created + Duration::milliseconds(1_814_000_000));
        assert_eq!(marker.icon, IconId::Three);
        assert_eq!(marker.asset, "3.small.png");
        assert_eq!(marker.opacity, 0.5);
        assert_eq!(marker.popup.title, "A");
        assert!(!marker.popup.created.is_empty());
        assert!(marker.is_visible());
    }

    #[test]
    fn unreadable_timestamp_renders_opaque() {
        let created = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        let mut record = record(created);
        record.id = RecordId::new("someday");
        record.created_at = None;
        let marker = Presenter::new(DecayModel::default(), "").marker(&record, created);
        assert_eq!(marker.opacity, 1.0);
        assert_eq!(marker.popup.created, "");
    }

    #[test]
    fn expired_marker_is_hidden() {
        let created = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap();
        let marker = Presenter::new(DecayModel::default(), "")
            .marker(&record(created), created + Duration::days(50));
        assert!(marker.opacity < 0.0);
        assert!(!marker.is_visible());
        assert_eq!(marker.render_opacity(), 0.0);
    }
}
