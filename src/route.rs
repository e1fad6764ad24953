use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use crate::error::{Field, HazardError, ValidationError};
use crate::models::{RouteKind, RouteResult};
use crate::service::{with_timeout, RoutePlanner};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteState {
    Idle,
    Computing,
    Ready,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRequest {
    pub ticket: Uuid,
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone)]
pub struct RouteFlow {
    start: String,
    end: String,
    state: RouteState,
    routes: Vec<RouteResult>,
    in_flight: Option<Uuid>,
    last_error: Option<HazardError>,
    closed: bool,
}

impl Default for RouteFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteFlow {
    pub fn new() -> Self {
        Self {
            start: String::new(),
            end: String::new(),
            state: RouteState::Idle,
            routes: Vec::new(),
            in_flight: None,
            last_error: None,
            closed: false,
        }
    }

    pub fn state(&self) -> RouteState {
        self.state
    }

    pub fn routes(&self) -> &[RouteResult] {
        &self.routes
    }

    pub fn last_error(&self) -> Option<&HazardError> {
        self.last_error.as_ref()
    }

    pub fn set_start(&mut self, start: impl Into<String>) {
        self.start = start.into();
    }

    pub fn set_end(&mut self, end: impl Into<String>) {
        self.end = end.into();
    }

    pub fn begin_compute(&mut self) -> Result<Option<RouteRequest>, HazardError> {
        if self.closed || self.state == RouteState::Computing {
            log::debug!("Ignoring route request while {:?}", self.state);
            return Ok(None);
        }

        let start = self.start.trim();
        let end = self.end.trim();
        let mut missing = Vec::new();
        if start.is_empty() {
            missing.push(Field::StartLocation);
        }
        if end.is_empty() {
            missing.push(Field::EndLocation);
        }
        if !missing.is_empty() {
            let err = HazardError::from(ValidationError::MissingFields(missing));
            self.state = RouteState::Idle;
            self.last_error = Some(err.clone());
            return Err(err);
        }

        let request = RouteRequest {
            ticket: Uuid::new_v4(),
            start: start.to_string(),
            end: end.to_string(),
        };
        self.state = RouteState::Computing;
        self.in_flight = Some(request.ticket);
        self.last_error = None;
        log::info!(
            "Computing routes {} from {:?} to {:?}",
            request.ticket,
            request.start,
            request.end
        );
        Ok(Some(request))
    }

    /// Installs a planner response. The list is replaced wholesale, with safe
    /// routes moved ahead of the rest. Completions for another ticket are
    /// dropped and return `None`.
    pub fn complete(
        &mut self,
        ticket: Uuid,
        result: Result<Vec<RouteResult>, HazardError>,
    ) -> Option<Result<(), HazardError>> {
        if self.closed || self.state != RouteState::Computing || self.in_flight != Some(ticket) {
            log::warn!("Dropping late route completion {ticket}");
            return None;
        }
        self.in_flight = None;

        match result.and_then(rank_routes) {
            Ok(routes) => {
                log::info!("Route request {ticket} returned {} routes", routes.len());
                self.routes = routes;
                self.state = RouteState::Ready;
                Some(Ok(()))
            }
            Err(err) => {
                log::warn!("Route request {ticket} failed: {err}");
                self.routes.clear();
                self.state = RouteState::Failed;
                self.last_error = Some(err.clone());
                Some(Err(err))
            }
        }
    }

    pub async fn compute<P: RoutePlanner>(
        &mut self,
        planner: &P,
        timeout: Duration,
    ) -> Result<&[RouteResult], HazardError> {
        let Some(request) = self.begin_compute()? else {
            return Ok(&self.routes);
        };

        let result = with_timeout(timeout, planner.compute(&request.start, &request.end)).await;
        if let Some(Err(err)) = self.complete(request.ticket, result) {
            return Err(err);
        }
        Ok(&self.routes)
    }

    /// Acknowledges the chosen route; nothing is handed to a navigation
    /// system.
    pub fn select(&self, index: usize) -> Result<String, HazardError> {
        let route = self
            .routes
            .get(index)
            .filter(|_| self.state == RouteState::Ready)
            .ok_or(ValidationError::NoSuchRoute(index))?;
        Ok(format!("{} route has been set as your navigation.", route.kind))
    }

    pub fn reset(&mut self) {
        self.state = RouteState::Idle;
        self.routes.clear();
        self.in_flight = None;
        self.last_error = None;
    }

    pub fn close(&mut self) {
        self.closed = true;
        self.in_flight = None;
    }
}

fn rank_routes(mut routes: Vec<RouteResult>) -> Result<Vec<RouteResult>, HazardError> {
    if let Some(route) = routes.iter().find(|route| route.path.len() < 2) {
        return Err(HazardError::Server(format!(
            "{} route has a path of {} points",
            route.kind,
            route.path.len()
        )));
    }
    if !routes.iter().any(|route| route.kind == RouteKind::Safe) {
        return Err(HazardError::Server(
            "planner returned no safe route".to_string(),
        ));
    }
    routes.sort_by_key(|route| route.kind != RouteKind::Safe);
    Ok(routes)
}
