use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::error::HazardError;
use crate::models::{HazardType, Incident, Status};
use crate::risk::{self, AreaRisk};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub weekday: String,
    pub reported: usize,
    pub resolved: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeCount {
    pub hazard_type: HazardType,
    pub count: usize,
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analytics {
    pub daily: Vec<DailyActivity>,
    pub by_type: Vec<TypeCount>,
    pub by_area: Vec<AreaRisk>,
}

pub fn compute(
    incidents: &[Incident],
    today: NaiveDate,
    lookback_days: i64,
) -> Result<Analytics, HazardError> {
    Ok(Analytics {
        daily: daily_activity(incidents, today, lookback_days)?,
        by_type: by_type(incidents),
        by_area: by_area(incidents),
    })
}

/// One entry per day of the window ending on `today`, oldest first.
/// "Resolved" counts incidents reported that day that are now approved.
pub fn daily_activity(
    incidents: &[Incident],
    today: NaiveDate,
    lookback_days: i64,
) -> Result<Vec<DailyActivity>, HazardError> {
    let start = risk::window_start(today, lookback_days)?;
    let mut days: Vec<DailyActivity> = (0..lookback_days.max(1))
        .map(|offset| {
            let date = start + Duration::days(offset);
            DailyActivity {
                date,
                weekday: date.format("%a").to_string(),
                reported: 0,
                resolved: 0,
            }
        })
        .collect();

    for incident in incidents {
        let day = incident.reported_at.date_naive();
        if day < start || day > today {
            continue;
        }
        let index = (day - start).num_days() as usize;
        if let Some(entry) = days.get_mut(index) {
            entry.reported += 1;
            if incident.status == Status::Approved {
                entry.resolved += 1;
            }
        }
    }

    Ok(days)
}

pub fn by_type(incidents: &[Incident]) -> Vec<TypeCount> {
    let mut counts: HashMap<HazardType, usize> = HashMap::new();
    for incident in incidents {
        *counts.entry(incident.hazard_type).or_insert(0) += 1;
    }

    let total = incidents.len();
    let mut summaries: Vec<TypeCount> = counts
        .into_iter()
        .map(|(hazard_type, count)| TypeCount {
            hazard_type,
            count,
            share: count as f64 / total as f64,
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.hazard_type.to_string().cmp(&b.hazard_type.to_string()))
    });
    summaries
}

pub fn by_area(incidents: &[Incident]) -> Vec<AreaRisk> {
    risk::score_areas(incidents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    use crate::models::{IncidentDraft, Position, Severity};
    use crate::store::IncidentStore;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, d).expect("date")
    }

    fn detected(store: &mut IncidentStore, hazard: HazardType, d: u32) -> Incident {
        let mut draft = IncidentDraft::new(hazard, Severity::Medium, Position::new(28.6, 77.2));
        draft.detected_at = Utc.with_ymd_and_hms(2026, 2, d, 9, 30, 0).single();
        store.add(draft).expect("add")
    }

    #[test]
    fn daily_window_splits_reported_and_resolved() {
        let mut store = IncidentStore::new();
        let resolved = detected(&mut store, HazardType::Pothole, 5);
        detected(&mut store, HazardType::Pothole, 5);
        detected(&mut store, HazardType::Debris, 8);
        detected(&mut store, HazardType::Debris, 1);
        store.approve(&resolved.id).expect("approve");

        let incidents: Vec<_> = store.iter().cloned().collect();
        let daily = daily_activity(&incidents, day(8), 7).expect("window");

        assert_eq!(daily.len(), 7);
        assert_eq!(daily[0].date, day(2));
        assert_eq!(daily[6].date, day(8));
        let fifth = daily.iter().find(|d| d.date == day(5)).expect("day 5");
        assert_eq!((fifth.reported, fifth.resolved), (2, 1));
        assert_eq!(daily[6].reported, 1);
        assert_eq!(daily.iter().map(|d| d.reported).sum::<usize>(), 3);
    }

    #[test]
    fn type_counts_are_sorted_with_shares() {
        let mut store = IncidentStore::new();
        detected(&mut store, HazardType::Flooding, 3);
        detected(&mut store, HazardType::Pothole, 3);
        detected(&mut store, HazardType::Pothole, 4);
        detected(&mut store, HazardType::Pothole, 4);

        let incidents: Vec<_> = store.iter().cloned().collect();
        let types = by_type(&incidents);

        assert_eq!(types[0].hazard_type, HazardType::Pothole);
        assert_eq!(types[0].count, 3);
        assert!((types[0].share - 0.75).abs() < 0.001);
        assert_eq!(types[1].hazard_type, HazardType::Flooding);
    }

    #[test]
    fn projections_ignore_input_order() {
        let mut store = IncidentStore::new();
        for (hazard, d) in [
            (HazardType::Crack, 2),
            (HazardType::Waterlog, 6),
            (HazardType::Crack, 7),
        ] {
            detected(&mut store, hazard, d);
        }
        let forward: Vec<_> = store.iter().cloned().collect();
        let mut reversed = forward.clone();
        reversed.reverse();

        assert_eq!(
            compute(&forward, day(8), 7).expect("forward"),
            compute(&reversed, day(8), 7).expect("reversed")
        );
    }

    #[test]
    fn empty_store_gives_empty_window() {
        let analytics = compute(&[], day(8), 7).expect("window");
        assert_eq!(analytics.daily.len(), 7);
        assert!(analytics.daily.iter().all(|d| d.reported == 0));
        assert!(analytics.by_type.is_empty());
        assert!(analytics.by_area.is_empty());
    }

    #[test]
    fn oversized_window_is_rejected() {
        assert!(compute(&[], day(8), 200_000_000).is_err());
        let year = daily_activity(&[], day(8), crate::risk::MAX_LOOKBACK_DAYS).expect("year");
        assert_eq!(year.len(), 366);
        assert_eq!(year[365].date, day(8));
    }
}
