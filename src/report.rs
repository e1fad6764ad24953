use std::fmt::Write;

use chrono::{NaiveDate, SecondsFormat};

use crate::analytics;
use crate::error::HazardError;
use crate::models::Incident;
use crate::risk;

pub fn build_report(
    scope: Option<&str>,
    lookback_days: i64,
    today: NaiveDate,
    incidents: &[Incident],
) -> Result<String, HazardError> {
    let cutoff = risk::window_start(today, lookback_days)?;
    let area = scope.map(str::to_lowercase);
    let windowed: Vec<Incident> = incidents
        .iter()
        .filter(|incident| {
            let date = incident.reported_at.date_naive();
            date >= cutoff && date <= today
        })
        .filter(|incident| match &area {
            Some(area) => incident.area_label().to_lowercase().contains(area.as_str()),
            None => true,
        })
        .cloned()
        .collect();
    let summary = analytics::compute(&windowed, today, lookback_days)?;

    let mut output = String::new();
    let scope_label = scope.unwrap_or("all areas");

    let _ = writeln!(output, "# Road Hazard Summary");
    let _ = writeln!(
        output,
        "Generated for {} (incidents since {})",
        scope_label, cutoff
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Hazard Mix");

    if summary.by_type.is_empty() {
        let _ = writeln!(output, "No incidents recorded for this window.");
    } else {
        for entry in summary.by_type.iter() {
            let _ = writeln!(
                output,
                "- {}: {} incidents ({:.0}%)",
                entry.hazard_type.title(),
                entry.count,
                entry.share * 100.0
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Riskiest Areas");

    if summary.by_area.is_empty() {
        let _ = writeln!(output, "No areas with incidents in this window.");
    } else {
        for area in summary.by_area.iter().take(10) {
            let _ = writeln!(
                output,
                "- {}: risk {:.0} across {} incidents",
                area.area, area.mean_risk, area.incidents
            );
        }
    }

    let mut recent = windowed;
    recent.sort_by(|a, b| b.reported_at.cmp(&a.reported_at));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Incidents");

    if recent.is_empty() {
        let _ = writeln!(output, "No incidents recorded for this window.");
    } else {
        for incident in recent.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} {} ({}, {}) at {} on {}: {}",
                incident.id,
                incident.hazard_type,
                incident.severity,
                incident.status,
                incident.area_label(),
                incident
                    .reported_at
                    .to_rfc3339_opts(SecondsFormat::Secs, true),
                incident.description
            );
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use crate::models::{HazardType, IncidentDraft, Position, Severity};
    use crate::store::IncidentStore;

    #[test]
    fn report_lists_mix_areas_and_recent_incidents() {
        let mut store = IncidentStore::new();
        for (hazard, severity, d) in [
            (HazardType::Pothole, Severity::High, 6),
            (HazardType::Pothole, Severity::Low, 7),
            (HazardType::Flooding, Severity::Critical, 1),
        ] {
            let mut draft = IncidentDraft::new(hazard, severity, Position::new(28.61, 77.2));
            draft.location = Some("MG Road".to_string());
            draft.description = format!("{hazard} on day {d}");
            draft.detected_at = Utc.with_ymd_and_hms(2026, 2, d, 12, 0, 0).single();
            store.add(draft).expect("add");
        }
        let incidents: Vec<_> = store.iter().cloned().collect();
        let today = NaiveDate::from_ymd_opt(2026, 2, 8).expect("date");

        let report = build_report(Some("mg road"), 7, today, &incidents).expect("report");

        assert!(report.starts_with("# Road Hazard Summary\n"));
        assert!(report.contains("Generated for mg road (incidents since 2026-02-02)"));
        assert!(report.contains("- Pothole: 2 incidents (100%)"));
        assert!(!report.contains("Flooding"));
        assert!(report.contains("- MG Road: risk 50 across 2 incidents"));
        let recent = report.split("## Recent Incidents").nth(1).expect("section");
        assert!(recent.find("RPT-002").expect("newest") < recent.find("RPT-001").expect("older"));
    }

    #[test]
    fn empty_report_says_so() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 8).expect("date");
        let report = build_report(None, 7, today, &[]).expect("report");
        assert!(report.contains("Generated for all areas"));
        assert!(report.contains("No incidents recorded for this window."));
        assert!(report.contains("No areas with incidents in this window."));
    }

    fn incident_at(location: &str, description: &str, day: u32) -> IncidentDraft {
        let mut draft =
            IncidentDraft::new(HazardType::Pothole, Severity::High, Position::new(28.61, 77.2));
        draft.location = Some(location.to_string());
        draft.description = description.to_string();
        draft.detected_at = Utc.with_ymd_and_hms(2026, 2, day, 12, 0, 0).single();
        draft
    }

    #[test]
    fn area_scope_matches_only_the_area_label() {
        let mut store = IncidentStore::new();
        store
            .add(incident_at("Ring Road", "pothole near MG Road exit", 6))
            .expect("add");
        store.add(incident_at("MG Road", "deep pothole", 6)).expect("add");
        let incidents: Vec<_> = store.iter().cloned().collect();
        let today = NaiveDate::from_ymd_opt(2026, 2, 8).expect("date");

        let by_type = build_report(Some("pothole"), 7, today, &incidents).expect("report");
        assert!(by_type.contains("No incidents recorded for this window."));

        let scoped = build_report(Some("MG Road"), 7, today, &incidents).expect("report");
        assert!(scoped.contains("- Pothole: 1 incidents (100%)"));
        assert!(scoped.contains("RPT-002"));
        assert!(!scoped.contains("RPT-001"));
    }

    #[test]
    fn future_incidents_stay_out_of_the_window() {
        let mut store = IncidentStore::new();
        store.add(incident_at("MG Road", "today", 8)).expect("add");
        store.add(incident_at("MG Road", "tomorrow", 9)).expect("add");
        let incidents: Vec<_> = store.iter().cloned().collect();
        let today = NaiveDate::from_ymd_opt(2026, 2, 8).expect("date");

        let report = build_report(None, 7, today, &incidents).expect("report");
        assert!(report.contains("- Pothole: 1 incidents (100%)"));
        assert!(!report.contains("RPT-002"));
    }

    #[test]
    fn oversized_lookback_is_an_error() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 8).expect("date");
        assert!(build_report(None, 200_000_000, today, &[]).is_err());
    }
}
