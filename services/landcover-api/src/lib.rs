//! Land-cover analysis HTTP service.
//!
//! Exposes the query pipeline as `POST /chat`, the selectable options as
//! `GET /get_config`, plus health, readiness and Prometheus metrics.

pub mod config;
pub mod handlers;
pub mod routes;
pub mod state;
