//! delivery-route-planner core
//!
//! Ordering and route-reconciliation engine for delivery points that can be
//! visited either in manual priority order or in a provider-optimized order.

pub mod config;
pub mod error;
pub mod haversine;
pub mod ordering;
pub mod osrm;
pub mod osrm_data;
pub mod planner;
pub mod point;
pub mod polyline;
pub mod reconcile;
pub mod reorder;
pub mod sync;
pub mod traits;
