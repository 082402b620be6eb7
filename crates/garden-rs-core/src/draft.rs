//! Unvalidated create-form input.

use crate::error::ValidationError;
use garden_rs_protocol::{BODY_MAX_CHARS, IconId, Position, TITLE_MAX_CHARS};

/// Form fields as typed by the user.
///
/// Coordinates stay text until submit so an edited or cleared field is
/// reported as a validation error rather than silently reset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordDraft {
    pub lat: String,
    pub lng: String,
    pub title: String,
    pub body: String,
    pub icon: IconId,
}

impl RecordDraft {
    /// Start a draft at a map position, coordinates rounded to 6 decimals.
    pub fn at(position: Position) -> Self {
        Self {
            lat: format!("{:.6}", position.lat),
            lng: format!("{:.6}", position.lng),
            ..Self::default()
        }
    }

    pub fn with_text(mut self, title: impl Into<String>, body: impl Into<String>) -> Self {
        self.title = title.into();
        self.body = body.into();
        self
    }

    pub fn with_icon(mut self, icon: IconId) -> Self {
        self.icon = icon;
        self
    }

    /// Check the draft and produce the record to submit.
    pub fn validate(&self) -> Result<NewRecord, ValidationError> {
        let lat = parse_coordinate(&self.lat).ok_or(ValidationError::MissingCoordinates)?;
        let lng = parse_coordinate(&self.lng).ok_or(ValidationError::MissingCoordinates)?;
        let title = self.title.trim();
        if title.chars().count() > TITLE_MAX_CHARS {
            return Err(ValidationError::TitleTooLong);
        }
        let body = self.body.trim();
        if body.chars().count() > BODY_MAX_CHARS {
            return Err(ValidationError::BodyTooLong);
        }
        Ok(NewRecord {
            position: Position::new(lat, lng),
            title: title.to_string(),
            body: body.to_string(),
            icon: self.icon,
        })
    }
}

fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// A record ready to be sent to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    pub position: Position,
    pub title: String,
    pub body: String,
    pub icon: IconId,
}

impl NewRecord {
    /// Re-check a record built without going through [`RecordDraft`].
    pub fn ensure_valid(&self) -> Result<(), ValidationError> {
        if !self.position.lat.is_finite() || !self.position.lng.is_finite() {
            return Err(ValidationError::MissingCoordinates);
        }
        if self.title.chars().count() > TITLE_MAX_CHARS {
            return Err(ValidationError::TitleTooLong);
        }
        if self.body.chars().count() > BODY_MAX_CHARS {
            return Err(ValidationError::BodyTooLong);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn prefills_six_decimals() {
        let draft = RecordDraft::at(Position::new(12.5, -7.25));
        assert_eq!(draft.lat, "12.500000");
        assert_eq!(draft.lng, "-7.250000");
        assert_eq!(draft.icon, IconId::One);
    }

    #[test]
    fn trims_text_before_submit() {
        let record = RecordDraft::at(Position::new(1.0, 2.0))
            .with_text("  A  ", "\nB\n")
            .with_icon(IconId::Three)
            .validate()
            .expect("valid");
        assert_eq!(record.title, "A");
        assert_eq!(record.body, "B");
        assert_eq!(record.icon, IconId::Three);
        assert_eq!(record.position, Position::new(1.0, 2.0));
    }

    #[test]
    fn missing_or_garbled_coordinates_are_rejected() {
        let mut draft = RecordDraft::at(Position::new(1.0, 2.0));
        draft.lat.clear();
        assert_eq!(draft.validate(), Err(ValidationError::MissingCoordinates));

        let mut draft = RecordDraft::at(Position::new(1.0, 2.0));
        draft.lng = "east".to_string();
        assert_eq!(draft.validate(), Err(ValidationError::MissingCoordinates));

        let mut draft = RecordDraft::at(Position::new(1.0, 2.0));
        draft.lng = "NaN".to_string();
        assert_eq!(draft.validate(), Err(ValidationError::MissingCoordinates));
    }

    #[test]
    fn enforces_length_limits_after_trimming() {
        let padded = format!("  {}  ", "t".repeat(TITLE_MAX_CHARS));
        let draft = RecordDraft::at(Position::new(0.0, 0.0)).with_text(padded, "");
        assert!(draft.validate().is_ok());

        let draft =
            RecordDraft::at(Position::new(0.0, 0.0)).with_text("t".repeat(TITLE_MAX_CHARS + 1), "");
        assert_eq!(draft.validate(), Err(ValidationError::TitleTooLong));

        let draft =
            RecordDraft::at(Position::new(0.0, 0.0)).with_text("", "b".repeat(BODY_MAX_CHARS + 1));
        assert_eq!(draft.validate(), Err(ValidationError::BodyTooLong));
    }
}
