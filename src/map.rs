use chrono::SecondsFormat;
use serde::Serialize;

use crate::models::{Incident, IncidentId, Position, SeverityBucket, Status};
use crate::selection::Selection;
use crate::store::IncidentStore;

pub const SELECTED_COLOR: &str = "#3b82f6";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarkerKind {
    Incident {
        id: IncidentId,
        bucket: SeverityBucket,
    },
    Selected,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    #[serde(flatten)]
    pub kind: MarkerKind,
    pub position: Position,
    pub color: &'static str,
    pub popup: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapLayers {
    pub show_anomalies: bool,
}

impl Default for MapLayers {
    fn default() -> Self {
        Self {
            show_anomalies: true,
        }
    }
}

/// Rebuilds the full marker set. Rejected incidents are never drawn and the
/// selected position, if any, is always the last marker.
pub fn sync_markers(
    store: &IncidentStore,
    layers: MapLayers,
    selection: &Selection,
) -> Vec<Marker> {
    let mut markers: Vec<Marker> = if layers.show_anomalies {
        store
            .iter()
            .filter(|incident| incident.status != Status::Rejected)
            .map(incident_marker)
            .collect()
    } else {
        Vec::new()
    };

    if let Some(position) = selection.get() {
        markers.push(Marker {
            kind: MarkerKind::Selected,
            position,
            color: SELECTED_COLOR,
            popup: vec!["Selected Location".to_string(), position.to_string()],
        });
    }

    markers
}

/// Map clicks go straight to the selection; range checks happen when the
/// report is submitted.
pub fn handle_click(selection: &mut Selection, lat: f64, lon: f64) {
    selection.set_selected(Position::new(lat, lon));
}

fn incident_marker(incident: &Incident) -> Marker {
    let bucket = incident.severity.bucket();
    let mut popup = vec![
        incident.hazard_type.title(),
        format!("Severity: {}", incident.severity),
    ];
    if let Some(confidence) = incident.confidence {
        popup.push(format!("Confidence: {}", format_confidence(confidence)));
    }
    popup.push(format!(
        "Reported: {}",
        incident
            .reported_at
            .to_rfc3339_opts(SecondsFormat::Secs, true)
    ));
    popup.push(format!("ID: {}", incident.id));

    Marker {
        kind: MarkerKind::Incident {
            id: incident.id.clone(),
            bucket,
        },
        position: incident.position,
        color: bucket.hex(),
        popup,
    }
}

pub fn format_confidence(confidence: f64) -> String {
    format!("{:.1}%", confidence * 100.0)
}
