//! Test fixtures for delivery-route-planner.
//!
//! Provides:
//! - Real Monaco locations (small OSM extract, quick to preprocess for OSRM)
//! - A scripted route provider that records every request it receives

#![allow(dead_code)]

pub mod monaco_locations;
pub mod scripted_provider;

pub use monaco_locations::*;
pub use scripted_provider::*;
