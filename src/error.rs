use strum::Display;

use crate::models::{IncidentId, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Field {
    Type,
    Severity,
    Description,
    Position,
    StartLocation,
    EndLocation,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required fields: {}", join_fields(.0))]
    MissingFields(Vec<Field>),

    #[error("position {lat}, {lon} is outside the valid range")]
    PositionOutOfRange { lat: f64, lon: f64 },

    #[error("confidence {0} must be between 0 and 1")]
    ConfidenceOutOfRange(f64),

    #[error("lookback window of {0} days is out of range")]
    LookbackTooLong(i64),

    #[error("no route at index {0}")]
    NoSuchRoute(usize),
}

impl ValidationError {
    pub fn missing_fields(&self) -> &[Field] {
        match self {
            Self::MissingFields(fields) => fields,
            _ => &[],
        }
    }
}

fn join_fields(fields: &[Field]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HazardError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("incident {0} not found")]
    NotFound(IncidentId),

    #[error("incident {id} is already {current} and cannot become {target}")]
    InvalidState {
        id: IncidentId,
        current: Status,
        target: Status,
    },

    #[error("attachment {name} has type {mime_type}, expected an image")]
    InvalidAttachment { name: String, mime_type: String },

    #[error("server error: {0}")]
    Server(String),
}
