//! Error types for the record store and the garden service.

use garden_rs_config::ConfigError;
use garden_rs_protocol::{BODY_MAX_CHARS, GardenAction, TITLE_MAX_CHARS};
use thiserror::Error;

/// Input problems caught before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Latitude or longitude is empty or not a finite number.
    #[error("Coordinates missing.")]
    MissingCoordinates,
    /// Title is longer than the form allows.
    #[error("Title is limited to {} characters.", TITLE_MAX_CHARS)]
    TitleTooLong,
    /// Body is longer than the form allows.
    #[error("Memory is limited to {} characters.", BODY_MAX_CHARS)]
    BodyTooLong,
}

/// Coarse classification used when reporting a failure to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request never produced a usable reply.
    Network,
    /// Rejected locally before anything was sent.
    Validation,
    /// The backend answered but reported `success: false`.
    Backend,
}

/// Errors returned by record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connecting, sending, or reading the body failed.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The endpoint answered with a non-success HTTP status.
    #[error("HTTP error! status: {0}")]
    Status(u16),
    /// The reply body was not the JSON we expect.
    #[error("unreadable response: {0}")]
    Decode(#[from] serde_json::Error),
    /// The backend reported failure; the message is shown verbatim.
    #[error("{0}")]
    Backend(String),
    /// The input was rejected before sending.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The store could not be built from config.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl StoreError {
    /// Classify the error into the network/validation/backend taxonomy.
    ///
    /// Config problems are local and surface before any request, so they
    /// count as validation failures.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Transport(_) | StoreError::Status(_) | StoreError::Decode(_) => {
                ErrorKind::Network
            }
            StoreError::Backend(_) => ErrorKind::Backend,
            StoreError::Validation(_) | StoreError::Config(_) => ErrorKind::Validation,
        }
    }

    /// Short inline status line for a failed action.
    pub fn status_line(&self, action: GardenAction) -> String {
        match self.kind() {
            ErrorKind::Network => format!("Network error: {self}"),
            ErrorKind::Validation => self.to_string(),
            ErrorKind::Backend => {
                let verb = match action {
                    GardenAction::Load => "Load",
                    GardenAction::Plant => "Save",
                    GardenAction::Water => "Water",
                };
                format!("{verb} failed: {self}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn backend_message_is_shown_verbatim() {
        let err = StoreError::Backend("x".to_string());
        assert_eq!(err.to_string(), "x");
        assert_eq!(err.kind(), ErrorKind::Backend);
        assert_eq!(err.status_line(GardenAction::Plant), "Save failed: x");
        assert_eq!(err.status_line(GardenAction::Water), "Water failed: x");
    }

    #[test]
    fn validation_status_has_no_prefix() {
        let err = StoreError::from(ValidationError::MissingCoordinates);
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.status_line(GardenAction::Plant), "Coordinates missing.");
    }

    #[test]
    fn status_codes_are_network_errors() {
        let err = StoreError::Status(502);
        assert_eq!(err.kind(), ErrorKind::Network);
        assert_eq!(
            err.status_line(GardenAction::Load),
            "Network error: HTTP error! status: 502"
        );
    }
}
