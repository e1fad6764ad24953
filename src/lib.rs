//! Client-side state for road hazard monitoring: the incident store and its
//! moderation rules, map markers, the report and route flows, and the
//! read-only analytics and exports built on top of them.

pub mod analytics;
pub mod config;
pub mod error;
pub mod export;
pub mod ingest;
pub mod map;
pub mod models;
pub mod moderation;
pub mod report;
pub mod report_flow;
pub mod risk;
pub mod route;
pub mod selection;
pub mod service;
pub mod snapshot;
pub mod store;
