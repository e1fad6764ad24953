use std::collections::HashSet;

use anyhow::bail;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{Field, HazardError, ValidationError};
use crate::models::{Incident, IncidentDraft, IncidentId, Status};

#[derive(Debug, Clone, Default)]
pub struct IncidentFilter {
    pub text: Option<String>,
    pub status: Option<Status>,
}

impl IncidentFilter {
    pub fn status(status: Status) -> Self {
        Self {
            text: None,
            status: Some(status),
        }
    }

    pub fn matches(&self, incident: &Incident) -> bool {
        if let Some(status) = self.status {
            if incident.status != status {
                return false;
            }
        }

        let needle = match self.text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text.to_lowercase(),
            _ => return true,
        };

        incident.id.as_str().to_lowercase().contains(&needle)
            || incident.hazard_type.to_string().contains(&needle)
            || incident.description.to_lowercase().contains(&needle)
            || incident
                .location
                .as_deref()
                .is_some_and(|location| location.to_lowercase().contains(&needle))
    }
}

/// In-memory incident collection. Incidents are never removed and their
/// status only moves out of `pending` once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncidentStore {
    incidents: Vec<Incident>,
    next_sequence: u64,
}

impl IncidentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, draft: IncidentDraft) -> Result<Incident, HazardError> {
        let mut missing = Vec::new();
        if draft.hazard_type.is_none() {
            missing.push(Field::Type);
        }
        if draft.severity.is_none() {
            missing.push(Field::Severity);
        }
        if draft.position.is_none() {
            missing.push(Field::Position);
        }

        let (Some(hazard_type), Some(severity), Some(position)) =
            (draft.hazard_type, draft.severity, draft.position)
        else {
            return Err(ValidationError::MissingFields(missing).into());
        };

        if !position.is_valid() {
            return Err(ValidationError::PositionOutOfRange {
                lat: position.lat,
                lon: position.lon,
            }
            .into());
        }

        if let Some(confidence) = draft.confidence {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(ValidationError::ConfidenceOutOfRange(confidence).into());
            }
        }

        let id = self.next_id();
        let incident = Incident {
            id,
            position,
            hazard_type,
            severity,
            confidence: draft.confidence,
            status: Status::Pending,
            reported_at: draft.detected_at.unwrap_or_else(Utc::now),
            reporter: draft.reporter,
            has_photo: draft.has_photo,
            description: draft.description,
            location: draft.location,
        };

        log::info!(
            "Added incident {} ({} {}) at {}",
            incident.id,
            incident.severity,
            incident.hazard_type,
            incident.position
        );
        self.incidents.push(incident.clone());
        Ok(incident)
    }

    pub fn approve(&mut self, id: &IncidentId) -> Result<Incident, HazardError> {
        self.transition(id, Status::Approved)
    }

    pub fn reject(&mut self, id: &IncidentId) -> Result<Incident, HazardError> {
        self.transition(id, Status::Rejected)
    }

    pub fn list(&self, filter: &IncidentFilter) -> Vec<Incident> {
        self.incidents
            .iter()
            .filter(|incident| filter.matches(incident))
            .cloned()
            .collect()
    }

    pub fn get(&self, id: &IncidentId) -> Option<&Incident> {
        self.incidents.iter().find(|incident| &incident.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Incident> {
        self.incidents.iter()
    }

    pub fn len(&self) -> usize {
        self.incidents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.incidents.is_empty()
    }

    /// Checks invariants of a store that was not built through `add`,
    /// such as one loaded from a snapshot file.
    pub fn verify(&self) -> anyhow::Result<()> {
        let mut seen = HashSet::new();
        for incident in &self.incidents {
            if !seen.insert(&incident.id) {
                bail!("duplicate incident id {}", incident.id);
            }
            if !incident.position.is_valid() {
                bail!("incident {} has an invalid position", incident.id);
            }
        }
        if (seen.len() as u64) > self.next_sequence {
            bail!(
                "id counter {} is behind {} stored incidents",
                self.next_sequence,
                seen.len()
            );
        }
        Ok(())
    }

    fn next_id(&mut self) -> IncidentId {
        loop {
            self.next_sequence += 1;
            let candidate = IncidentId::from_sequence(self.next_sequence);
            if self.get(&candidate).is_none() {
                return candidate;
            }
        }
    }

    fn transition(&mut self, id: &IncidentId, target: Status) -> Result<Incident, HazardError> {
        let incident = self
            .incidents
            .iter_mut()
            .find(|incident| &incident.id == id)
            .ok_or_else(|| HazardError::NotFound(id.clone()))?;

        if incident.status.is_terminal() {
            log::warn!(
                "Refused to move incident {} from {} to {}",
                id,
                incident.status,
                target
            );
            return Err(HazardError::InvalidState {
                id: id.clone(),
                current: incident.status,
                target,
            });
        }

        incident.status = target;
        log::info!("Incident {id} is now {target}");
        Ok(incident.clone())
    }
}
