use serde::{Deserialize, Serialize};

use crate::predict::{GroundStation, Pass, SearchStats};
use crate::propagation::PositionSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobType {
    PropagatePositions,
    PropagateGeodetic,
    ComputePassesElevation,
    ComputePassesSwath,
    ClearCache,
}

/// Type-specific job payload. On the wire this is
/// `{ "type": "...", "data": { ... } }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobKind {
    PropagatePositions {
        tle: String,
        timestamps_ms: Vec<i64>,
    },
    PropagateGeodetic {
        tle: String,
        timestamp_ms: i64,
    },
    ComputePassesElevation {
        tle: String,
        station: GroundStation,
        start_ms: i64,
        end_ms: i64,
        min_elevation_deg: f64,
        max_passes: usize,
        #[serde(default)]
        collect_stats: bool,
    },
    ComputePassesSwath {
        tle: String,
        station: GroundStation,
        swath_km: f64,
        start_ms: i64,
        end_ms: i64,
        max_passes: usize,
        #[serde(default)]
        collect_stats: bool,
    },
    ClearCache,
}

impl JobKind {
    pub fn job_type(&self) -> JobType {
        match self {
            JobKind::PropagatePositions { .. } => JobType::PropagatePositions,
            JobKind::PropagateGeodetic { .. } => JobType::PropagateGeodetic,
            JobKind::ComputePassesElevation { .. } => JobType::ComputePassesElevation,
            JobKind::ComputePassesSwath { .. } => JobType::ComputePassesSwath,
            JobKind::ClearCache => JobType::ClearCache,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRequest {
    pub id: u64,
    #[serde(flatten)]
    pub kind: JobKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResponse {
    pub id: u64,
    pub job: JobType,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobResponse {
    pub fn ok(id: u64, job: JobType, result: JobResult) -> Self {
        Self {
            id,
            job,
            success: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: u64, job: JobType, error: impl Into<String>) -> Self {
        Self {
            id,
            job,
            success: false,
            result: None,
            error: Some(error.into()),
        }
    }

    pub fn passes(&self) -> Option<&[Pass]> {
        match self.result.as_ref()? {
            JobResult::Passes { passes, .. } => Some(passes),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobResult {
    Passes {
        passes: Vec<Pass>,
        #[serde(skip_serializing_if = "Option::is_none")]
        stats: Option<SearchStats>,
    },
    CacheCleared {
        cleared: bool,
    },
    Positions(Vec<Option<PositionSample>>),
    Geodetic(Option<PositionSample>),
}
