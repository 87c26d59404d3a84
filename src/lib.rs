//! HTTP service that records geolocation reports into an append-only CSV
//! file and serves them back as JSON for a map view.

pub mod config;
pub mod handlers;
pub mod models;
pub mod storage;
