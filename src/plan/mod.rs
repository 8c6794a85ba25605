//! Chunk planning module
//!
//! Pure and deterministic: given a total duration and the max/min part
//! policy, produce the ordered part windows the extractor cuts.

pub mod planner;

pub use planner::{plan_chunks, ChunkPlan, ChunkSpec};
