//! Chunk planner - turns a total duration and a size policy into part windows

use serde::Serialize;

use crate::error::{Result, SplitError};

/// Remainders smaller than one `AV_TIME_BASE` tick are floating-point noise
/// from the division, not a real tail.
const REMAINDER_EPSILON_SECS: f64 = 1e-6;

/// Upper bound on the number of parts in one plan.
pub const MAX_PARTS: usize = 100_000;

/// One planned output part
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChunkSpec {
    /// Zero-based position in the plan
    pub index: usize,
    /// Offset into the input, in seconds
    pub start_secs: f64,
    /// Length of the part, in seconds (always > 0)
    pub duration_secs: f64,
}

impl ChunkSpec {
    /// End of the part's half-open window `[start, end)`
    pub fn end_secs(&self) -> f64 {
        self.start_secs + self.duration_secs
    }

    /// One-based part number used in file names
    pub fn part_number(&self) -> usize {
        self.index + 1
    }
}

/// Ordered, contiguous parts covering the whole input
#[derive(Debug, Clone, Serialize)]
pub struct ChunkPlan {
    /// Total duration the plan covers
    pub total_secs: f64,
    /// Parts in increasing start order
    pub chunks: Vec<ChunkSpec>,
    /// Whether a short tail was folded into the last part
    pub merged_tail: bool,
}

impl ChunkPlan {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn last(&self) -> Option<&ChunkSpec> {
        self.chunks.last()
    }
}

/// Plan the parts for an input of `total_secs`.
///
/// Every part is `max_chunk_secs` long except the last: a tail shorter
/// than `min_chunk_secs` is merged into the previous part (if there is
/// one), otherwise it becomes its own, shorter, part. On exact division
/// the last part is a full `max_chunk_secs`.
pub fn plan_chunks(total_secs: f64, max_chunk_secs: f64, min_chunk_secs: f64) -> Result<ChunkPlan> {
    if !max_chunk_secs.is_finite() || max_chunk_secs <= 0.0 {
        return Err(SplitError::Plan(format!(
            "maximum chunk duration must be positive, got {}",
            max_chunk_secs
        )));
    }
    if !min_chunk_secs.is_finite() || min_chunk_secs < 0.0 {
        return Err(SplitError::Plan(format!(
            "minimum chunk duration must be non-negative, got {}",
            min_chunk_secs
        )));
    }
    if !total_secs.is_finite() || total_secs <= 0.0 {
        return Err(SplitError::Plan(format!(
            "total duration must be positive, got {}",
            total_secs
        )));
    }

    let ratio = total_secs / max_chunk_secs;
    if !ratio.is_finite() || ratio >= MAX_PARTS as f64 {
        return Err(SplitError::Plan(format!(
            "{}s in parts of {}s exceeds {} parts",
            total_secs, max_chunk_secs, MAX_PARTS
        )));
    }

    let full_chunks = ratio.floor() as usize;
    let mut remainder = total_secs - full_chunks as f64 * max_chunk_secs;
    if full_chunks > 0 && remainder.abs() < REMAINDER_EPSILON_SECS {
        remainder = 0.0;
    }

    let merge_tail = remainder > 0.0 && remainder < min_chunk_secs && full_chunks > 0;
    let (total_parts, last_duration) = if merge_tail {
        (full_chunks, max_chunk_secs + remainder)
    } else if remainder > 0.0 {
        let parts = full_chunks.checked_add(1).ok_or_else(|| {
            SplitError::Plan(format!("part count overflow for {}s", total_secs))
        })?;
        (parts, remainder)
    } else {
        (full_chunks, max_chunk_secs)
    };

    let chunks = (0..total_parts)
        .map(|index| ChunkSpec {
            index,
            start_secs: index as f64 * max_chunk_secs,
            duration_secs: if index + 1 == total_parts {
                last_duration
            } else {
                max_chunk_secs
            },
        })
        .collect::<Vec<_>>();

    if merge_tail {
        tracing::info!(
            "Tail of {:.2}s is shorter than {:.2}s, merging into part {}",
            remainder,
            min_chunk_secs,
            total_parts
        );
    }
    tracing::debug!(
        "Planned {} part(s) for {:.2}s: full={}, remainder={:.2}s, last={:.2}s",
        total_parts,
        total_secs,
        full_chunks,
        remainder,
        last_duration
    );

    Ok(ChunkPlan {
        total_secs,
        chunks,
        merged_tail: merge_tail,
    })
}
