pub mod cache;
pub mod config;
pub mod dispatch;
pub mod eclipse;
pub mod engine;
pub mod predict;
pub mod propagation;
pub mod tle;

pub use engine::PredictionEngine;
pub use predict::{GroundStation, Pass};
