//! Hadashot LIVE - A Hebrew news flash aggregator
//!
//! This crate aggregates several Hebrew-language news RSS channels and the
//! Home Front Command alert feed into a single polled JSON API backed by a
//! short-lived in-memory cache.

pub mod aggregator;
pub mod alerts;
pub mod config;
pub mod routes;
