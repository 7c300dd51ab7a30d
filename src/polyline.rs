//! Polyline representation and codec for route geometries.
//!
//! Providers return geometry in the compact encoded-polyline format
//! (precision 1e-5). Decoding happens once at the boundary; the rest of the
//! planner only deals with decoded coordinate sequences.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const PRECISION: f64 = 1e5;
const CHAR_BIAS: u8 = 63;
const CONTINUATION: u64 = 0x20;
const CHUNK_MASK: u64 = 0x1f;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolylineError {
    #[error("invalid character {found:?} at byte {position}")]
    InvalidCharacter { position: usize, found: char },
    #[error("encoded value truncated at byte {position}")]
    Truncated { position: usize },
    #[error("encoded value at byte {position} exceeds 32 bits")]
    Overflow { position: usize },
    #[error("latitude without a matching longitude")]
    DanglingLatitude,
}

/// A polyline representing a route geometry as decoded coordinates.
///
/// Each point is a (latitude, longitude) tuple.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<(f64, f64)>,
}

impl Polyline {
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    /// Decodes a single encoded path.
    pub fn decode(encoded: &str) -> Result<Self, PolylineError> {
        decode(encoded).map(Self::new)
    }

    /// Decodes per-step segments and joins them into one path.
    ///
    /// Segments decode independently; any malformed segment fails the whole
    /// path. When a segment starts exactly where the previous one ended, the
    /// shared point is kept once.
    pub fn from_segments<S: AsRef<str> + Sync>(segments: &[S]) -> Result<Self, PolylineError> {
        let decoded = segments
            .par_iter()
            .map(|segment| decode(segment.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut path = Polyline::default();
        for segment in decoded {
            path.append(segment);
        }
        Ok(path)
    }

    /// Appends a decoded segment, dropping an exactly-equal boundary point.
    pub fn append(&mut self, segment: Vec<(f64, f64)>) {
        let mut segment = segment.into_iter().peekable();
        if let (Some(last), Some(first)) = (self.points.last(), segment.peek()) {
            if last == first {
                segment.next();
            }
        }
        self.points.extend(segment);
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn into_points(self) -> Vec<(f64, f64)> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn encode(&self) -> String {
        encode(&self.points)
    }
}

/// Decodes an encoded polyline into (latitude, longitude) pairs.
///
/// Values alternate latitude, longitude; each pair is a delta from the
/// previous one.
pub fn decode(encoded: &str) -> Result<Vec<(f64, f64)>, PolylineError> {
    let bytes = encoded.as_bytes();
    let mut points = Vec::with_capacity(bytes.len() / 4);
    let mut position = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;

    while position < bytes.len() {
        lat += next_value(encoded, &mut position)?;
        if position >= bytes.len() {
            return Err(PolylineError::DanglingLatitude);
        }
        lng += next_value(encoded, &mut position)?;
        points.push((lat as f64 / PRECISION, lng as f64 / PRECISION));
    }

    Ok(points)
}

fn next_value(encoded: &str, position: &mut usize) -> Result<i64, PolylineError> {
    let bytes = encoded.as_bytes();
    let start = *position;
    let mut result: u64 = 0;
    let mut shift = 0;

    loop {
        let Some(&byte) = bytes.get(*position) else {
            return Err(PolylineError::Truncated { position: start });
        };
        if !(CHAR_BIAS..=b'~').contains(&byte) {
            let found = encoded[*position..].chars().next().unwrap_or(char::REPLACEMENT_CHARACTER);
            return Err(PolylineError::InvalidCharacter {
                position: *position,
                found,
            });
        }
        if shift >= 32 {
            return Err(PolylineError::Overflow { position: start });
        }

        let chunk = u64::from(byte - CHAR_BIAS);
        result |= (chunk & CHUNK_MASK) << shift;
        shift += 5;
        *position += 1;

        if chunk & CONTINUATION == 0 {
            break;
        }
    }

    let value = (result >> 1) as i64;
    Ok(if result & 1 != 0 { !value } else { value })
}

/// Encodes (latitude, longitude) pairs at 1e-5 precision.
pub fn encode(points: &[(f64, f64)]) -> String {
    let mut out = String::with_capacity(points.len() * 8);
    let mut prev_lat: i64 = 0;
    let mut prev_lng: i64 = 0;

    for &(lat, lng) in points {
        let lat = (lat * PRECISION).round() as i64;
        let lng = (lng * PRECISION).round() as i64;
        push_value(&mut out, lat - prev_lat);
        push_value(&mut out, lng - prev_lng);
        prev_lat = lat;
        prev_lng = lng;
    }

    out
}

fn push_value(out: &mut String, delta: i64) {
    let zigzag = if delta < 0 { !(delta << 1) } else { delta << 1 };
    let mut value = zigzag as u64;
    while value >= CONTINUATION {
        out.push(char::from(((CONTINUATION | (value & CHUNK_MASK)) as u8) + CHAR_BIAS));
        value >>= 5;
    }
    out.push(char::from(value as u8 + CHAR_BIAS));
}
