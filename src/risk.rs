use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::error::{HazardError, ValidationError};
use crate::models::Incident;

pub const MAX_LOOKBACK_DAYS: i64 = 366;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaRisk {
    pub area: String,
    pub incidents: usize,
    pub mean_risk: f64,
}

/// Groups incidents by area label and averages their severity risk score.
pub fn score_areas(incidents: &[Incident]) -> Vec<AreaRisk> {
    let mut totals: HashMap<String, (usize, f64)> = HashMap::new();

    for incident in incidents {
        let entry = totals.entry(incident.area_label()).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += incident.severity.risk_score();
    }

    let mut areas: Vec<AreaRisk> = totals
        .into_iter()
        .map(|(area, (count, total))| AreaRisk {
            area,
            incidents: count,
            mean_risk: total / count as f64,
        })
        .collect();

    areas.sort_by(|a, b| {
        b.mean_risk
            .partial_cmp(&a.mean_risk)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.incidents.cmp(&a.incidents))
            .then_with(|| a.area.cmp(&b.area))
    });
    areas
}

/// First day of a lookback window that ends on `today`, inclusive. Windows
/// shorter than a day count as one day.
pub fn window_start(today: NaiveDate, lookback_days: i64) -> Result<NaiveDate, HazardError> {
    if lookback_days > MAX_LOOKBACK_DAYS {
        return Err(ValidationError::LookbackTooLong(lookback_days).into());
    }
    let span = lookback_days.max(1) - 1;
    today
        .checked_sub_days(Days::new(span.unsigned_abs()))
        .ok_or_else(|| ValidationError::LookbackTooLong(lookback_days).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Position, Severity};
    use crate::store::tests::pothole_draft;
    use crate::store::IncidentStore;

    #[test]
    fn areas_average_severity_scores() {
        let mut store = IncidentStore::new();
        store.add(pothole_draft()).expect("add");
        let mut low = pothole_draft();
        low.severity = Some(Severity::Low);
        store.add(low).expect("add");
        let mut elsewhere = pothole_draft();
        elsewhere.location = None;
        elsewhere.position = Some(Position::new(28.6212, 77.2149));
        elsewhere.severity = Some(Severity::Critical);
        store.add(elsewhere).expect("add");

        let incidents: Vec<_> = store.iter().cloned().collect();
        let areas = score_areas(&incidents);

        assert_eq!(areas.len(), 2);
        assert_eq!(areas[0].area, "28.62,77.21");
        assert_eq!(areas[0].mean_risk, 100.0);
        assert_eq!(areas[1].area, "MG Road, Sector 14");
        assert_eq!(areas[1].incidents, 2);
        assert!((areas[1].mean_risk - 50.0).abs() < 0.001);
    }

    #[test]
    fn window_includes_today() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 8).expect("date");
        assert_eq!(
            window_start(today, 7),
            Ok(NaiveDate::from_ymd_opt(2026, 2, 2).expect("date"))
        );
        assert_eq!(window_start(today, 0), Ok(today));
    }

    #[test]
    fn oversized_window_is_an_error() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).expect("date");
        assert!(window_start(today, MAX_LOOKBACK_DAYS).is_ok());
        assert_eq!(
            window_start(today, 200_000_000),
            Err(HazardError::from(ValidationError::LookbackTooLong(200_000_000)))
        );
        assert!(window_start(NaiveDate::MIN, 2).is_err());
    }
}
