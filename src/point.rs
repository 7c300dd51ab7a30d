//! Delivery point data model.
//!
//! A point carries three independent order keys: `created_order` (insertion,
//! never rewritten), `priority_sort_order` (position inside its priority
//! band) and `order` (last route-visit position, rewritten wholesale).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Opaque identifier, unique for the lifetime of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PointId(pub u64);

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dp-{}", self.0)
    }
}

/// Latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Validated constructor.
    pub fn new(lat: f64, lng: f64) -> Result<Self, ValidationError> {
        let coordinates = Self { lat, lng };
        coordinates.validate()?;
        Ok(coordinates)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let lat_ok = self.lat.is_finite() && (-90.0..=90.0).contains(&self.lat);
        let lng_ok = self.lng.is_finite() && (-180.0..=180.0).contains(&self.lng);
        if lat_ok && lng_ok {
            Ok(())
        } else {
            Err(ValidationError::InvalidCoordinates {
                lat: self.lat,
                lng: self.lng,
            })
        }
    }

    pub fn as_tuple(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

impl From<(f64, f64)> for Coordinates {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self { lat, lng }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Normal,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Normal, Priority::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Normal => "normal",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which derived ordering is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutePolicy {
    #[default]
    Priority,
    Shortest,
}

impl fmt::Display for RoutePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutePolicy::Priority => f.write_str("priority"),
            RoutePolicy::Shortest => f.write_str("shortest"),
        }
    }
}

/// A stop the operator wants visited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryPoint {
    pub(crate) id: PointId,
    pub(crate) coordinates: Coordinates,
    pub priority: Priority,
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub(crate) created_order: u32,
    /// Absent for points restored from hosts that never assigned one.
    #[serde(default)]
    pub(crate) priority_sort_order: Option<u32>,
    #[serde(default)]
    pub(crate) order: u32,
}

impl DeliveryPoint {
    pub fn id(&self) -> PointId {
        self.id
    }

    pub fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    pub fn created_order(&self) -> u32 {
        self.created_order
    }

    pub fn priority_sort_order(&self) -> Option<u32> {
        self.priority_sort_order
    }

    /// Last committed route-visit position, 1-based.
    pub fn order(&self) -> u32 {
        self.order
    }

    /// Key used inside a priority band.
    pub(crate) fn band_key(&self) -> u32 {
        self.priority_sort_order.unwrap_or(self.created_order)
    }
}

/// Descriptive fields supplied when a point is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointDetails {
    pub name: String,
    pub address: String,
    pub notes: Option<String>,
}

impl Default for PointDetails {
    fn default() -> Self {
        Self {
            name: "Delivery point".to_string(),
            address: String::new(),
            notes: None,
        }
    }
}

impl PointDetails {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Partial update. Identity, coordinates and order keys are not updatable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointUpdate {
    pub priority: Option<Priority>,
    pub name: Option<String>,
    pub address: Option<String>,
    /// `Some(None)` clears the notes.
    pub notes: Option<Option<String>>,
}

impl PointUpdate {
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn notes(mut self, notes: Option<String>) -> Self {
        self.notes = Some(notes);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.priority.is_none() && self.name.is_none() && self.address.is_none() && self.notes.is_none()
    }
}
