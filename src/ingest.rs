use anyhow::Context;
use chrono::{DateTime, TimeZone, Utc};

use crate::models::{HazardType, IncidentDraft, Position, Severity};
use crate::store::IncidentStore;

struct SeedIncident {
    hazard_type: HazardType,
    severity: Severity,
    position: Position,
    location: &'static str,
    description: &'static str,
    reporter: &'static str,
    has_photo: bool,
    confidence: Option<f64>,
    reported_at: (u32, u32, u32),
    approved: bool,
}

/// Loads the demo incidents: three citizen reports and three camera
/// detections around central Delhi.
pub fn seed(store: &mut IncidentStore) -> anyhow::Result<usize> {
    let seeds = [
        SeedIncident {
            hazard_type: HazardType::Pothole,
            severity: Severity::High,
            position: Position::new(28.6139, 77.2090),
            location: "MG Road, Sector 14",
            description: "Deep pothole across the left lane",
            reporter: "citizen@email.com",
            has_photo: true,
            confidence: None,
            reported_at: (10, 30, 0),
            approved: false,
        },
        SeedIncident {
            hazard_type: HazardType::Barricade,
            severity: Severity::Medium,
            position: Position::new(28.6129, 77.2300),
            location: "Ring Road Junction",
            description: "Traffic barricade left after roadworks",
            reporter: "safety@patrol.com",
            has_photo: false,
            confidence: None,
            reported_at: (9, 15, 0),
            approved: true,
        },
        SeedIncident {
            hazard_type: HazardType::Debris,
            severity: Severity::Low,
            position: Position::new(28.6200, 77.2150),
            location: "CP Metro Station",
            description: "Loose gravel near the exit ramp",
            reporter: "user123@email.com",
            has_photo: true,
            confidence: None,
            reported_at: (8, 45, 0),
            approved: false,
        },
        SeedIncident {
            hazard_type: HazardType::Pothole,
            severity: Severity::High,
            position: Position::new(28.6141, 77.2093),
            location: "MG Road, Sector 14",
            description: "Pothole detected by dashcam",
            reporter: "detector",
            has_photo: true,
            confidence: Some(0.942),
            reported_at: (7, 50, 0),
            approved: false,
        },
        SeedIncident {
            hazard_type: HazardType::Construction,
            severity: Severity::Medium,
            position: Position::new(28.6305, 77.2210),
            location: "Ring Road",
            description: "Lane closure for construction",
            reporter: "detector",
            has_photo: true,
            confidence: Some(0.871),
            reported_at: (7, 5, 0),
            approved: false,
        },
        SeedIncident {
            hazard_type: HazardType::Waterlog,
            severity: Severity::Critical,
            position: Position::new(28.6003, 77.2270),
            location: "Khan Market",
            description: "Standing water covering the underpass",
            reporter: "detector",
            has_photo: true,
            confidence: Some(0.768),
            reported_at: (6, 40, 0),
            approved: false,
        },
    ];

    let today = Utc::now().date_naive();
    let mut added = 0usize;

    for seed in seeds {
        let (hour, minute, second) = seed.reported_at;
        let detected_at = today
            .and_hms_opt(hour, minute, second)
            .context("invalid seed time")?
            .and_utc();

        let incident = store.add(IncidentDraft {
            hazard_type: Some(seed.hazard_type),
            severity: Some(seed.severity),
            position: Some(seed.position),
            description: seed.description.to_string(),
            confidence: seed.confidence,
            location: Some(seed.location.to_string()),
            reporter: seed.reporter.to_string(),
            has_photo: seed.has_photo,
            detected_at: Some(detected_at),
        })?;

        if seed.approved {
            store.approve(&incident.id)?;
        }
        added += 1;
    }

    Ok(added)
}

#[derive(Debug, serde::Deserialize)]
struct DetectionRow {
    #[serde(rename = "type")]
    hazard_type: String,
    severity: String,
    latitude: f64,
    longitude: f64,
    confidence: Option<f64>,
    location: Option<String>,
    description: String,
    reporter: String,
    detected_at: Option<String>,
}

/// Adds every row of a detections CSV. Stops at the first bad row; rows
/// before it stay added.
pub fn import_csv<R: std::io::Read>(store: &mut IncidentStore, reader: R) -> anyhow::Result<usize> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut inserted = 0usize;

    for (index, result) in reader.deserialize::<DetectionRow>().enumerate() {
        let line = index + 2;
        let row = result.with_context(|| format!("malformed detection on line {line}"))?;

        let hazard_type: HazardType = row
            .hazard_type
            .trim()
            .parse()
            .with_context(|| format!("unknown hazard type {:?} on line {line}", row.hazard_type))?;
        let severity: Severity = row
            .severity
            .trim()
            .parse()
            .with_context(|| format!("unknown severity {:?} on line {line}", row.severity))?;
        let detected_at = match row.detected_at.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(parse_timestamp(raw).with_context(|| {
                format!("invalid detected_at {raw:?} on line {line}")
            })?),
            _ => None,
        };

        store
            .add(IncidentDraft {
                hazard_type: Some(hazard_type),
                severity: Some(severity),
                position: Some(Position::new(row.latitude, row.longitude)),
                description: row.description,
                confidence: row.confidence,
                location: row.location.filter(|location| !location.trim().is_empty()),
                reporter: row.reporter,
                has_photo: false,
                detected_at,
            })
            .with_context(|| format!("rejected detection on line {line}"))?;
        inserted += 1;
    }

    Ok(inserted)
}

fn parse_timestamp(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    let naive = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")?;
    Utc.from_local_datetime(&naive)
        .single()
        .context("ambiguous timestamp")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;
    use crate::store::IncidentFilter;

    const DETECTIONS: &str = "\
type,severity,latitude,longitude,confidence,location,description,reporter,detected_at
pothole,high,28.6139,77.2090,0.93,MG Road,Crater in lane two,cam-14,2026-02-05T08:00:00Z
crack,low,28.6201,77.2151,,,Hairline crack,cam-09,2026-02-06 17:45:00
waterlog,critical,28.6003,77.2270,0.71,Khan Market,Flooded underpass,cam-02,
";

    #[test]
    fn seed_loads_reports_and_detections() {
        let mut store = IncidentStore::new();
        let added = seed(&mut store).expect("seed");

        assert_eq!(added, 6);
        assert_eq!(store.len(), 6);
        let approved = store.list(&IncidentFilter::status(Status::Approved));
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].location.as_deref(), Some("Ring Road Junction"));
        assert_eq!(store.iter().filter(|i| i.confidence.is_some()).count(), 3);
    }

    #[test]
    fn import_adds_every_row() {
        let mut store = IncidentStore::new();
        let inserted = import_csv(&mut store, DETECTIONS.as_bytes()).expect("import");

        assert_eq!(inserted, 3);
        let incidents: Vec<_> = store.iter().collect();
        assert_eq!(incidents[0].confidence, Some(0.93));
        assert_eq!(
            incidents[0].reported_at.to_rfc3339(),
            "2026-02-05T08:00:00+00:00"
        );
        assert_eq!(incidents[1].location, None);
        assert_eq!(incidents[1].confidence, None);
        assert_eq!(incidents[2].severity, Severity::Critical);
        assert!(incidents.iter().all(|i| i.status == Status::Pending));
    }

    #[test]
    fn import_stops_at_invalid_row() {
        let csv = "\
type,severity,latitude,longitude,confidence,location,description,reporter,detected_at
pothole,high,28.6139,77.2090,,,ok,cam-1,
pothole,high,128.0,77.2090,,,bad latitude,cam-1,
";
        let mut store = IncidentStore::new();
        let err = import_csv(&mut store, csv.as_bytes()).unwrap_err();

        assert!(err.to_string().contains("line 3"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn import_rejects_unknown_types() {
        let csv = "\
type,severity,latitude,longitude,confidence,location,description,reporter,detected_at
sinkhole,high,28.6,77.2,,,unknown,cam-1,
";
        let mut store = IncidentStore::new();
        assert!(import_csv(&mut store, csv.as_bytes()).is_err());
        assert!(store.is_empty());
    }
}
