use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};

use crate::cache::BoundedCache;
use crate::eclipse::EclipseClassifier;
use crate::predict::{
    find_elevation_passes, find_swath_passes, ElevationSearch, GroundStation, Pass, SearchOutcome,
    SearchStats, SwathSearch,
};
use crate::propagation::{sample_at, ElementSetCache, PositionSample, PropagationError};

const PASS_CACHE_CAPACITY: usize = 256;

/// One engine instance owns all the mutable state a search needs: the
/// element-set cache, the eclipse classifier with its memo, and the
/// pass-result cache. Each dispatcher worker holds its own engine; the
/// synchronous path holds another. Nothing is shared between instances,
/// so none of this needs locking.
pub struct PredictionEngine {
    elements: ElementSetCache,
    classifier: EclipseClassifier,
    pass_cache: BoundedCache<PassKey, Vec<Pass>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PassKey {
    tle_hash: u64,
    station: (i64, i64, i64),
    start_ms: i64,
    end_ms: i64,
    params: SearchParams,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum SearchParams {
    Elevation {
        min_elevation_millideg: i64,
        max_passes: usize,
        transition_step_ms: i64,
    },
    Swath {
        swath_m: i64,
        max_passes: usize,
        transition_step_ms: i64,
    },
}

impl PredictionEngine {
    pub fn new() -> Self {
        Self {
            elements: ElementSetCache::new(),
            classifier: EclipseClassifier::new(),
            pass_cache: BoundedCache::new(PASS_CACHE_CAPACITY),
        }
    }

    /// Elevation pass search, memoized on the full query. The cache is
    /// only invalidated explicitly (`clear_caches`); callers that change
    /// element sets supply different text and therefore a different key.
    pub fn find_passes(
        &mut self,
        tle_text: &str,
        station: &GroundStation,
        search: &ElevationSearch,
    ) -> Result<SearchOutcome, PropagationError> {
        let sat = self.elements.resolve(tle_text)?;
        let key = PassKey {
            tle_hash: hash_text(tle_text),
            station: station.quantized(),
            start_ms: search.start.timestamp_millis(),
            end_ms: search.end.timestamp_millis(),
            params: SearchParams::Elevation {
                min_elevation_millideg: (search.min_elevation_deg * 1e3).round() as i64,
                max_passes: search.max_passes,
                transition_step_ms: (search.transition_step_s * 1e3).round() as i64,
            },
        };
        if let Some(cached) = self.pass_cache.get(&key) {
            log::debug!("pass cache hit for norad {}", sat.norad_id());
            return Ok(cached_outcome(cached));
        }

        let outcome = find_elevation_passes(&sat, station, &mut self.classifier, search);
        self.pass_cache.insert(key, outcome.passes.clone());
        Ok(outcome)
    }

    pub fn find_swath_passes(
        &mut self,
        tle_text: &str,
        station: &GroundStation,
        search: &SwathSearch,
    ) -> Result<SearchOutcome, PropagationError> {
        let sat = self.elements.resolve(tle_text)?;
        let key = PassKey {
            tle_hash: hash_text(tle_text),
            station: station.quantized(),
            start_ms: search.start.timestamp_millis(),
            end_ms: search.end.timestamp_millis(),
            params: SearchParams::Swath {
                swath_m: (search.swath_km * 1e3).round() as i64,
                max_passes: search.max_passes,
                transition_step_ms: (search.transition_step_s * 1e3).round() as i64,
            },
        };
        if let Some(cached) = self.pass_cache.get(&key) {
            log::debug!("swath cache hit for norad {}", sat.norad_id());
            return Ok(cached_outcome(cached));
        }

        let outcome = find_swath_passes(&sat, station, &mut self.classifier, search);
        self.pass_cache.insert(key, outcome.passes.clone());
        Ok(outcome)
    }

    pub fn propagate_positions(
        &mut self,
        tle_text: &str,
        timestamps: &[DateTime<Utc>],
    ) -> Result<Vec<Option<PositionSample>>, PropagationError> {
        let sat = self.elements.resolve(tle_text)?;
        Ok(timestamps
            .iter()
            .map(|&t| sample_at(&sat, t, false))
            .collect())
    }

    pub fn propagate_geodetic(
        &mut self,
        tle_text: &str,
        t: DateTime<Utc>,
    ) -> Result<Option<PositionSample>, PropagationError> {
        let sat = self.elements.resolve(tle_text)?;
        Ok(sample_at(&sat, t, true))
    }

    pub fn clear_caches(&mut self) {
        self.elements.clear();
        self.classifier.clear();
        self.pass_cache.clear();
        log::debug!("engine caches cleared");
    }

    pub fn pass_cache_len(&self) -> usize {
        self.pass_cache.len()
    }
}

impl Default for PredictionEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn cached_outcome(passes: &[Pass]) -> SearchOutcome {
    SearchOutcome {
        passes: passes.to_vec(),
        stats: SearchStats {
            passes_found: passes.len(),
            ..SearchStats::default()
        },
    }
}

fn hash_text(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}
