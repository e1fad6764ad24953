use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use crate::error::{Field, HazardError, ValidationError};
use crate::models::{HazardType, Incident, IncidentDraft, Severity};
use crate::selection::Selection;
use crate::service::{with_timeout, IncidentService};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportState {
    Editing,
    Submitting,
    Succeeded,
    Failed,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoAttachment {
    pub name: String,
    pub mime_type: String,
}

#[derive(Debug, Clone)]
pub struct PendingSubmission {
    pub ticket: Uuid,
    pub draft: IncidentDraft,
}

/// Form state behind the "report issue" dialog.
#[derive(Debug, Clone)]
pub struct ReportFlow {
    hazard_type: Option<HazardType>,
    severity: Option<Severity>,
    description: String,
    photo: Option<PhotoAttachment>,
    reporter: String,
    state: ReportState,
    in_flight: Option<Uuid>,
    last_error: Option<HazardError>,
}

impl ReportFlow {
    pub fn new(reporter: impl Into<String>) -> Self {
        Self {
            hazard_type: None,
            severity: None,
            description: String::new(),
            photo: None,
            reporter: reporter.into(),
            state: ReportState::Editing,
            in_flight: None,
            last_error: None,
        }
    }

    pub fn state(&self) -> ReportState {
        self.state
    }

    pub fn last_error(&self) -> Option<&HazardError> {
        self.last_error.as_ref()
    }

    pub fn hazard_type(&self) -> Option<HazardType> {
        self.hazard_type
    }

    pub fn severity(&self) -> Option<Severity> {
        self.severity
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn photo(&self) -> Option<&PhotoAttachment> {
        self.photo.as_ref()
    }

    pub fn set_type(&mut self, hazard_type: HazardType) {
        if self.begin_edit() {
            self.hazard_type = Some(hazard_type);
        }
    }

    pub fn set_severity(&mut self, severity: Severity) {
        if self.begin_edit() {
            self.severity = Some(severity);
        }
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        if self.begin_edit() {
            self.description = description.into();
        }
    }

    /// Non-image files are refused without touching the current attachment.
    pub fn attach_photo(
        &mut self,
        name: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Result<(), HazardError> {
        let name = name.into();
        let mime_type = mime_type.into();
        if !mime_type.to_ascii_lowercase().starts_with("image/") {
            return Err(HazardError::InvalidAttachment { name, mime_type });
        }
        if self.begin_edit() {
            self.photo = Some(PhotoAttachment { name, mime_type });
        }
        Ok(())
    }

    pub fn remove_photo(&mut self) {
        if self.begin_edit() {
            self.photo = None;
        }
    }

    pub fn validate(&self, selection: &Selection) -> Result<IncidentDraft, ValidationError> {
        let mut missing = Vec::new();
        if self.hazard_type.is_none() {
            missing.push(Field::Type);
        }
        if self.severity.is_none() {
            missing.push(Field::Severity);
        }
        if self.description.trim().is_empty() {
            missing.push(Field::Description);
        }
        let position = selection.get();
        if position.is_none() {
            missing.push(Field::Position);
        }
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }

        if let Some(position) = position {
            if !position.is_valid() {
                return Err(ValidationError::PositionOutOfRange {
                    lat: position.lat,
                    lon: position.lon,
                });
            }
        }

        Ok(IncidentDraft {
            hazard_type: self.hazard_type,
            severity: self.severity,
            position,
            description: self.description.trim().to_string(),
            confidence: None,
            location: None,
            reporter: self.reporter.clone(),
            has_photo: self.photo.is_some(),
            detected_at: None,
        })
    }

    /// Moves to `submitting` and hands back the request to send. Returns
    /// `Ok(None)` when a submission is already in flight or the flow is
    /// finished.
    pub fn begin_submit(
        &mut self,
        selection: &Selection,
    ) -> Result<Option<PendingSubmission>, HazardError> {
        match self.state {
            ReportState::Submitting => {
                log::debug!("Ignoring submit while a report is in flight");
                return Ok(None);
            }
            ReportState::Succeeded | ReportState::Closed => return Ok(None),
            ReportState::Editing | ReportState::Failed => {}
        }

        let draft = match self.validate(selection) {
            Ok(draft) => draft,
            Err(err) => {
                let err = HazardError::from(err);
                self.state = ReportState::Editing;
                self.last_error = Some(err.clone());
                return Err(err);
            }
        };

        let ticket = Uuid::new_v4();
        self.state = ReportState::Submitting;
        self.in_flight = Some(ticket);
        self.last_error = None;
        log::info!("Submitting report {ticket}");
        Ok(Some(PendingSubmission { ticket, draft }))
    }

    /// Applies the outcome of a submission. Completions for another ticket
    /// or for a closed flow are dropped and return `None`.
    pub fn complete(
        &mut self,
        ticket: Uuid,
        result: Result<Incident, HazardError>,
        selection: &mut Selection,
    ) -> Option<Result<Incident, HazardError>> {
        if self.state != ReportState::Submitting || self.in_flight != Some(ticket) {
            log::warn!("Dropping late completion for report {ticket}");
            return None;
        }
        self.in_flight = None;

        match result {
            Ok(incident) => {
                log::info!("Report {ticket} created incident {}", incident.id);
                self.state = ReportState::Succeeded;
                selection.clear();
                Some(Ok(incident))
            }
            Err(err) => {
                log::warn!("Report {ticket} failed: {err}");
                self.state = ReportState::Failed;
                self.last_error = Some(err.clone());
                Some(Err(err))
            }
        }
    }

    pub async fn submit<S: IncidentService>(
        &mut self,
        service: &mut S,
        selection: &mut Selection,
        timeout: Duration,
    ) -> Result<Option<Incident>, HazardError> {
        let Some(pending) = self.begin_submit(selection)? else {
            return Ok(None);
        };

        let result = with_timeout(timeout, service.create(pending.draft)).await;
        match self.complete(pending.ticket, result, selection) {
            Some(outcome) => outcome.map(Some),
            None => Ok(None),
        }
    }

    /// The dialog went away; anything still in flight is ignored on arrival.
    pub fn close(&mut self) {
        self.state = ReportState::Closed;
        self.in_flight = None;
    }

    fn begin_edit(&mut self) -> bool {
        match self.state {
            ReportState::Editing => true,
            ReportState::Failed => {
                self.state = ReportState::Editing;
                self.last_error = None;
                true
            }
            state => {
                log::debug!("Ignoring report edit while {state:?}");
                false
            }
        }
    }
}
