use fxhash::FxHashMap;
use std::fmt;

use super::constants::{CHANNELS_PER_CHIP, CHIPS_PER_PLANE, NUMBER_OF_PLANES};
use super::error::HitError;

/// The external plane.chip representation, i.e. `2.3` is plane 2 chip 3
pub fn decimal_id(plane: u8, chip: u8) -> f64 {
    plane as f64 + chip as f64 / 10.0
}

/// Split a plane.chip value back into (plane, chip)
///
/// The chip must be a single decimal digit; `0.25` or `-1.0` are rejected.
pub fn from_decimal_id(id: f64) -> Result<(u8, u8), HitError> {
    if !id.is_finite() || id < 0.0 {
        return Err(HitError::BadDecimalId(id));
    }
    let plane = id.floor();
    let tenths = (id - plane) * 10.0;
    let chip = tenths.round();
    if (tenths - chip).abs() > 1.0e-6 || plane > u8::MAX as f64 || chip > 9.0 {
        return Err(HitError::BadDecimalId(id));
    }
    Ok((plane as u8, chip as u8))
}

/// A single detector hit: one channel on one chip (VMM) of one plane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hit {
    pub plane: u8,
    pub chip: u8,
    pub channel: u8,
}

impl Hit {
    /// Construct a new Hit, validating against the detector geometry
    pub fn new(plane: u8, chip: u8, channel: u32) -> Result<Self, HitError> {
        if plane >= NUMBER_OF_PLANES {
            return Err(HitError::BadPlane(plane));
        }
        if chip >= CHIPS_PER_PLANE {
            return Err(HitError::BadChip(chip));
        }
        if channel >= CHANNELS_PER_CHIP {
            return Err(HitError::BadChannel(channel));
        }
        Ok(Self {
            plane,
            chip,
            channel: channel as u8,
        })
    }

    /// Construct a Hit from the plane.chip representation
    pub fn from_decimal(id: f64, channel: u32) -> Result<Self, HitError> {
        let (plane, chip) = from_decimal_id(id)?;
        Self::new(plane, chip, channel)
    }

    pub fn decimal_id(&self) -> f64 {
        decimal_id(self.plane, self.chip)
    }

    /// Key of the canonical order; the channel never takes part
    pub fn plane_chip(&self) -> (u8, u8) {
        (self.plane, self.chip)
    }
}

/// Stable sort ascending by (plane, chip). Channels move with their hit.
pub fn sort_by_plane_chip(hits: &mut [Hit]) {
    hits.sort_by_key(|hit| hit.plane_chip());
}

/// Channels travel on the wire last hit first
pub fn to_wire_order<T: Clone>(canonical: &[T]) -> Vec<T> {
    canonical.iter().rev().cloned().collect()
}

/// Inverse of [to_wire_order]
pub fn from_wire_order<T>(mut wire: Vec<T>) -> Vec<T> {
    wire.reverse();
    wire
}

/// An ordered collection of hits, always kept in canonical (plane, chip) order.
///
/// Hits sharing a plane and chip keep the order they were given in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HitSet {
    hits: Vec<Hit>,
}

impl HitSet {
    pub fn new(mut hits: Vec<Hit>) -> Self {
        sort_by_plane_chip(&mut hits);
        Self { hits }
    }

    /// Build a HitSet from parallel plane.chip and channel lists
    pub fn from_parallel(ids: &[f64], channels: &[u32]) -> Result<Self, HitError> {
        if ids.len() != channels.len() {
            return Err(HitError::LengthMismatch(ids.len(), channels.len()));
        }
        let hits = ids
            .iter()
            .zip(channels)
            .map(|(id, channel)| Hit::from_decimal(*id, *channel))
            .collect::<Result<Vec<Hit>, HitError>>()?;
        Ok(Self::new(hits))
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Hit> {
        self.hits.iter()
    }

    pub fn hits(&self) -> &[Hit] {
        &self.hits
    }

    pub fn decimal_ids(&self) -> Vec<f64> {
        self.hits.iter().map(Hit::decimal_id).collect()
    }

    pub fn channels(&self) -> Vec<u8> {
        self.hits.iter().map(|hit| hit.channel).collect()
    }

    /// Number of hits on each plane that has at least one
    pub fn plane_multiplicity(&self) -> FxHashMap<u8, usize> {
        let mut counts = FxHashMap::default();
        for hit in self.hits.iter() {
            *counts.entry(hit.plane).or_insert(0) += 1;
        }
        counts
    }
}

impl<'a> IntoIterator for &'a HitSet {
    type Item = &'a Hit;
    type IntoIter = std::slice::Iter<'a, Hit>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.iter()
    }
}

impl fmt::Display for HitSet {
    /// Renders as `[0.2, 2.1][10, 12]`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<String> = self
            .hits
            .iter()
            .map(|hit| format!("{}.{}", hit.plane, hit.chip))
            .collect();
        let channels: Vec<String> = self.hits.iter().map(|hit| hit.channel.to_string()).collect();
        write!(f, "[{}][{}]", ids.join(", "), channels.join(", "))
    }
}
