//! Hiring prediction server
//!
//! Serves match predictions over HTTP from a random forest artifact, with
//! health, readiness and Prometheus endpoints.

pub mod api;
pub mod bootstrap;
pub mod config;
