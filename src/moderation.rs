use serde::Serialize;
use strum::{Display, EnumString};

use crate::error::HazardError;
use crate::models::{Incident, IncidentId, SeverityBucket, Status};
use crate::store::{IncidentFilter, IncidentStore};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Approved,
    Rejected,
}

impl StatusFilter {
    pub fn status(self) -> Option<Status> {
        match self {
            Self::All => None,
            Self::Pending => Some(Status::Pending),
            Self::Approved => Some(Status::Approved),
            Self::Rejected => Some(Status::Rejected),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModerationRow {
    #[serde(flatten)]
    pub incident: Incident,
    pub bucket: SeverityBucket,
    pub actionable: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

/// Admin table view state. Rows are recomputed from the store on every call.
#[derive(Debug, Clone, Default)]
pub struct ModerationQueue {
    pub search: String,
    pub status: StatusFilter,
}

impl ModerationQueue {
    pub fn new(search: impl Into<String>, status: StatusFilter) -> Self {
        Self {
            search: search.into(),
            status,
        }
    }

    pub fn filter(&self) -> IncidentFilter {
        IncidentFilter {
            text: Some(self.search.clone()),
            status: self.status.status(),
        }
    }

    pub fn rows(&self, store: &IncidentStore) -> Vec<ModerationRow> {
        store
            .list(&self.filter())
            .into_iter()
            .map(|incident| ModerationRow {
                bucket: incident.severity.bucket(),
                actionable: incident.status == Status::Pending,
                incident,
            })
            .collect()
    }

    pub fn decide(
        &self,
        store: &mut IncidentStore,
        id: &IncidentId,
        decision: Decision,
    ) -> Result<Incident, HazardError> {
        match decision {
            Decision::Approve => store.approve(id),
            Decision::Reject => store.reject(id),
        }
    }
}

pub fn stats(store: &IncidentStore) -> QueueStats {
    store.iter().fold(QueueStats::default(), |mut stats, incident| {
        stats.total += 1;
        match incident.status {
            Status::Pending => stats.pending += 1,
            Status::Approved => stats.approved += 1,
            Status::Rejected => stats.rejected += 1,
        }
        stats
    })
}
