use std::sync::Arc;

use chrono::{DateTime, Utc};
use sgp4::{Constants, Elements};

use super::error::PropagationError;
use crate::cache::BoundedCache;

const ELEMENT_CACHE_CAPACITY: usize = 512;

/// A parsed element set together with its derived propagation constants.
pub struct ElementSet {
    pub elements: Elements,
    pub constants: Constants,
}

impl ElementSet {
    pub fn new(elements: Elements) -> Result<Self, PropagationError> {
        let constants = Constants::from_elements(&elements)?;
        Ok(Self {
            elements,
            constants,
        })
    }

    /// Parse a single TLE, either the 2-line or the 3-line (named) form.
    pub fn from_tle_text(text: &str) -> Result<Self, PropagationError> {
        let lines: Vec<&str> = text
            .lines()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect();

        let (name, line1, line2) = match lines.as_slice() {
            [l1, l2] if l1.starts_with("1 ") && l2.starts_with("2 ") => (None, *l1, *l2),
            [name, l1, l2] if l1.starts_with("1 ") && l2.starts_with("2 ") => {
                (Some(name.to_string()), *l1, *l2)
            }
            _ => return Err(PropagationError::InvalidTleFormat),
        };

        let elements = Elements::from_tle(name, line1.as_bytes(), line2.as_bytes())?;
        Self::new(elements)
    }

    pub fn norad_id(&self) -> u64 {
        self.elements.norad_id
    }

    pub fn epoch(&self) -> DateTime<Utc> {
        self.elements.datetime.and_utc()
    }

    /// Orbital period derived from mean motion (revolutions per day).
    /// Non-positive mean motion yields `None`.
    pub fn period_minutes(&self) -> Option<f64> {
        let mean_motion = self.elements.mean_motion;
        if mean_motion > 0.0 {
            Some(1440.0 / mean_motion)
        } else {
            None
        }
    }
}

/// Per-instance cache of element sets keyed by raw TLE text, so repeated
/// queries against the same satellite skip re-parsing. Insert-only until
/// cleared, like the other caches.
pub struct ElementSetCache {
    entries: BoundedCache<String, Arc<ElementSet>>,
}

impl ElementSetCache {
    pub fn new() -> Self {
        Self {
            entries: BoundedCache::new(ELEMENT_CACHE_CAPACITY),
        }
    }

    pub fn resolve(&mut self, tle_text: &str) -> Result<Arc<ElementSet>, PropagationError> {
        if let Some(entry) = self.entries.get(&tle_text.to_string()) {
            return Ok(entry.clone());
        }
        let parsed = Arc::new(ElementSet::from_tle_text(tle_text)?);
        self.entries.insert(tle_text.to_string(), parsed.clone());
        Ok(parsed)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ElementSetCache {
    fn default() -> Self {
        Self::new()
    }
}
