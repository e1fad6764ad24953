use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IncidentId(String);

impl IncidentId {
    pub fn from_sequence(sequence: u64) -> Self {
        Self(format!("RPT-{sequence:03}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IncidentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IncidentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for IncidentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}

impl Position {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Coarse area label used when an incident carries no location name.
    pub fn grid_label(&self) -> String {
        format!("{:.2},{:.2}", self.lat, self.lon)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lon)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum HazardType {
    Pothole,
    Barricade,
    Debris,
    Flooding,
    Accident,
    Construction,
    Crack,
    Waterlog,
    Other,
}

impl HazardType {
    pub fn title(&self) -> String {
        let name: &str = self.as_ref();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn risk_score(self) -> f64 {
        match self {
            Self::Low => 25.0,
            Self::Medium => 50.0,
            Self::High => 75.0,
            Self::Critical => 100.0,
        }
    }

    /// Display bucket shared by the map markers and the moderation table.
    pub fn bucket(self) -> SeverityBucket {
        match self {
            Self::Critical => SeverityBucket::DarkRed,
            Self::High => SeverityBucket::Red,
            Self::Medium => SeverityBucket::Orange,
            Self::Low => SeverityBucket::Yellow,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SeverityBucket {
    DarkRed,
    Red,
    Orange,
    Yellow,
}

impl SeverityBucket {
    pub fn hex(self) -> &'static str {
        match self {
            Self::DarkRed => "#b91c1c",
            Self::Red => "#ef4444",
            Self::Orange => "#f97316",
            Self::Yellow => "#eab308",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Status {
    Pending,
    Approved,
    Rejected,
}

impl Status {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: IncidentId,
    pub position: Position,
    #[serde(rename = "type")]
    pub hazard_type: HazardType,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub status: Status,
    pub reported_at: DateTime<Utc>,
    pub reporter: String,
    pub has_photo: bool,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Incident {
    pub fn area_label(&self) -> String {
        match self.location.as_deref().map(str::trim) {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => self.position.grid_label(),
        }
    }
}

/// Creation request for a new incident. Type, severity and position are
/// optional here so the store can report which of them is missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidentDraft {
    pub hazard_type: Option<HazardType>,
    pub severity: Option<Severity>,
    pub position: Option<Position>,
    pub description: String,
    pub confidence: Option<f64>,
    pub location: Option<String>,
    pub reporter: String,
    pub has_photo: bool,
    pub detected_at: Option<DateTime<Utc>>,
}

impl IncidentDraft {
    pub fn new(hazard_type: HazardType, severity: Severity, position: Position) -> Self {
        Self {
            hazard_type: Some(hazard_type),
            severity: Some(severity),
            position: Some(position),
            ..Self::default()
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RouteKind {
    Safe,
    Normal,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub kind: RouteKind,
    pub distance_km: f64,
    pub duration_minutes: u32,
    pub risk_tier: RiskTier,
    pub path: Vec<Position>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incident_ids_are_zero_padded() {
        assert_eq!(IncidentId::from_sequence(1).as_str(), "RPT-001");
        assert_eq!(IncidentId::from_sequence(1234).as_str(), "RPT-1234");
    }

    #[test]
    fn positions_outside_range_are_invalid() {
        assert!(Position::new(28.61, 77.20).is_valid());
        assert!(Position::new(-90.0, 180.0).is_valid());
        assert!(!Position::new(90.5, 0.0).is_valid());
        assert!(!Position::new(0.0, -180.1).is_valid());
        assert!(!Position::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn severity_orders_from_low_to_critical() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::High < Severity::Critical);
        assert_eq!("HIGH".parse::<Severity>().ok(), Some(Severity::High));
    }

    #[test]
    fn severity_buckets_match_marker_palette() {
        assert_eq!(Severity::High.bucket().hex(), "#ef4444");
        assert_eq!(Severity::Medium.bucket().hex(), "#f97316");
        assert_eq!(Severity::Low.bucket().hex(), "#eab308");
        assert_eq!(Severity::Critical.bucket(), SeverityBucket::DarkRed);
    }

    #[test]
    fn hazard_type_title_capitalizes() {
        assert_eq!(HazardType::Pothole.title(), "Pothole");
        assert_eq!(HazardType::Waterlog.to_string(), "waterlog");
    }
}
