use std::future::Future;
use std::time::Duration;

use crate::error::HazardError;
use crate::models::{Incident, IncidentDraft, Position, RiskTier, RouteKind, RouteResult};
use crate::store::IncidentStore;

/// Remote side of incident creation.
pub trait IncidentService {
    async fn create(&mut self, draft: IncidentDraft) -> Result<Incident, HazardError>;
}

/// Remote side of route computation. Results depend only on the two
/// locations.
pub trait RoutePlanner {
    async fn compute(&self, start: &str, end: &str) -> Result<Vec<RouteResult>, HazardError>;
}

/// Creates incidents in a local store after a simulated network delay.
/// The write happens after the delay, so a call dropped by a timeout
/// leaves the store untouched.
pub struct LocalIncidentService<'a> {
    store: &'a mut IncidentStore,
    latency: Duration,
}

impl<'a> LocalIncidentService<'a> {
    pub fn new(store: &'a mut IncidentStore, latency: Duration) -> Self {
        Self { store, latency }
    }
}

impl IncidentService for LocalIncidentService<'_> {
    async fn create(&mut self, draft: IncidentDraft) -> Result<Incident, HazardError> {
        tokio::time::sleep(self.latency).await;
        self.store.add(draft)
    }
}

pub struct MockRoutePlanner {
    latency: Duration,
}

impl MockRoutePlanner {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

impl RoutePlanner for MockRoutePlanner {
    async fn compute(&self, start: &str, end: &str) -> Result<Vec<RouteResult>, HazardError> {
        tokio::time::sleep(self.latency).await;
        log::debug!("Computed mock routes from {start:?} to {end:?}");
        Ok(candidate_routes(start, end))
    }
}

/// Fixed candidates, fastest first as a routing engine would list them.
pub fn candidate_routes(_start: &str, _end: &str) -> Vec<RouteResult> {
    vec![
        RouteResult {
            kind: RouteKind::Normal,
            distance_km: 8.7,
            duration_minutes: 18,
            risk_tier: RiskTier::Medium,
            path: vec![
                Position::new(28.6139, 77.2090),
                Position::new(28.6140, 77.2200),
                Position::new(28.6200, 77.2150),
            ],
        },
        RouteResult {
            kind: RouteKind::Safe,
            distance_km: 12.4,
            duration_minutes: 28,
            risk_tier: RiskTier::Low,
            path: vec![
                Position::new(28.6139, 77.2090),
                Position::new(28.6150, 77.2100),
                Position::new(28.6200, 77.2150),
            ],
        },
    ]
}

pub async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, HazardError>
where
    F: Future<Output = Result<T, HazardError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(HazardError::Server(format!(
            "request timed out after {}ms",
            limit.as_millis()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::pothole_draft;

    #[tokio::test]
    async fn local_service_writes_after_delay() {
        let mut store = IncidentStore::new();
        let mut service = LocalIncidentService::new(&mut store, Duration::from_millis(1));
        let incident = service.create(pothole_draft()).await.expect("create");
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&incident.id), Some(&incident));
    }

    #[tokio::test]
    async fn timed_out_call_leaves_store_untouched() {
        let mut store = IncidentStore::new();
        let mut service = LocalIncidentService::new(&mut store, Duration::from_millis(200));
        let result = with_timeout(Duration::from_millis(5), service.create(pothole_draft())).await;

        assert!(matches!(result, Err(HazardError::Server(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn candidate_paths_have_at_least_two_points() {
        let routes = candidate_routes("A", "B");
        assert!(routes.iter().all(|route| route.path.len() >= 2));
        assert!(routes.iter().any(|route| route.kind == RouteKind::Safe));
    }
}
