//! Split orchestration
//!
//! Probes the input, plans the parts and extracts them one after another.
//! Every part gets its own input and output handle, so parts can also be
//! extracted concurrently on the blocking pool via [`split_async`].

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::config::SplitConfig;
use crate::error::{Result, SplitError};
use crate::media::probe_duration;
use crate::naming::part_path_in;
use crate::plan::{plan_chunks, ChunkPlan, ChunkSpec};
use crate::segment::{extract_window, SegmentSummary, SegmentWindow};

/// Split `input` into parts of at most `max_chunk_secs`, merging a trailing
/// part shorter than `min_chunk_secs` into the one before it.
///
/// Parts are written next to the input as `<stem>_partNN.<ext>`. Returns the
/// part paths in order. Stops at the first failing part; parts written
/// before it are left in place and listed in the error.
pub fn split<P: AsRef<Path>>(
    input: P,
    max_chunk_secs: f64,
    min_chunk_secs: f64,
) -> Result<Vec<PathBuf>> {
    split_with_config(input, &SplitConfig::with_policy(max_chunk_secs, min_chunk_secs))
}

/// [`split`] with the full configuration (output directory etc.).
///
/// Always sequential; `config.jobs` only affects [`split_async`].
pub fn split_with_config<P: AsRef<Path>>(input: P, config: &SplitConfig) -> Result<Vec<PathBuf>> {
    config.validate()?;
    let input = input.as_ref();
    let plan = plan_for(input, config)?;

    let mut completed = Vec::with_capacity(plan.len());
    for chunk in &plan.chunks {
        let output = part_path_in(input, chunk.part_number(), config.output_dir.as_deref());
        if let Err(e) = extract_chunk(input, &output, chunk, is_last(&plan, chunk)) {
            tracing::error!("Part {} of {:?} failed: {}", chunk.part_number(), input, e);
            return Err(SplitError::ChunkFailed {
                index: chunk.index,
                completed,
                source: Box::new(e),
            });
        }
        completed.push(output);
    }

    tracing::info!("Split {:?} into {} part(s)", input, completed.len());
    Ok(completed)
}

/// Future-based [`split_with_config`].
///
/// Work runs on tokio's blocking pool. With `jobs == 1` this is exactly the
/// sequential split. With more jobs up to `jobs` parts are extracted at
/// once. After a failure no new parts are started; parts already running
/// finish, and the lowest-index failure is returned with every part that
/// did succeed in `completed`.
pub async fn split_async<P: AsRef<Path>>(input: P, config: &SplitConfig) -> Result<Vec<PathBuf>> {
    config.validate()?;
    let input = input.as_ref().to_path_buf();
    let config = config.clone();

    if config.jobs <= 1 {
        return tokio::task::spawn_blocking(move || split_with_config(&input, &config))
            .await
            .map_err(|e| SplitError::Join(e.to_string()))?;
    }

    let plan = {
        let input = input.clone();
        let config = config.clone();
        tokio::task::spawn_blocking(move || plan_for(&input, &config))
            .await
            .map_err(|e| SplitError::Join(e.to_string()))??
    };

    let parts = plan.len();
    let source = input.clone();
    let output_dir = config.output_dir.clone();
    let outcomes = run_parallel(plan.chunks, config.jobs, move |chunk| {
        let output = part_path_in(&source, chunk.part_number(), output_dir.as_deref());
        extract_chunk(&source, &output, &chunk, chunk.index + 1 == parts).map(|_| output)
    })
    .await;

    let merged = merge_outcomes(outcomes);
    match &merged {
        Ok(parts) => tracing::info!("Split {:?} into {} part(s)", input, parts.len()),
        Err(e) => tracing::error!("Split of {:?} failed: {}", input, e),
    }
    merged
}

/// Run `work` for each chunk with at most `jobs` running at once.
///
/// Once any part has failed no further parts are started. Outcomes are
/// returned in plan order for the parts that were started.
async fn run_parallel<F>(chunks: Vec<ChunkSpec>, jobs: usize, work: F) -> Vec<Result<PathBuf>>
where
    F: Fn(ChunkSpec) -> Result<PathBuf> + Send + Sync + 'static,
{
    let work = Arc::new(work);
    let semaphore = Arc::new(Semaphore::new(jobs.max(1)));
    let failed = Arc::new(AtomicBool::new(false));
    let mut handles = Vec::with_capacity(chunks.len());
    let mut outcomes = Vec::with_capacity(chunks.len());

    for chunk in chunks {
        if failed.load(Ordering::Acquire) {
            break;
        }
        let permit = match semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                outcomes.push(Err(SplitError::Join(e.to_string())));
                break;
            }
        };
        // a running part may have failed while we waited for the permit
        if failed.load(Ordering::Acquire) {
            tracing::warn!("Not starting part {}: an earlier part failed", chunk.part_number());
            break;
        }

        let work = work.clone();
        let failed = failed.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let outcome = work(chunk);
            if outcome.is_err() {
                failed.store(true, Ordering::Release);
            }
            outcome
        }));
    }

    let mut joined = Vec::with_capacity(handles.len() + outcomes.len());
    for handle in handles {
        joined.push(
            handle
                .await
                .map_err(|e| SplitError::Join(e.to_string()))
                .and_then(|r| r),
        );
    }
    joined.extend(outcomes);
    joined
}

fn plan_for(input: &Path, config: &SplitConfig) -> Result<ChunkPlan> {
    let total_secs = usable_duration(input, probe_duration(input)?)?;

    tracing::info!(
        "Planning {:?}: {:.2}s, max={:.2}s, min={:.2}s",
        input,
        total_secs,
        config.max_chunk_secs,
        config.min_chunk_secs
    );

    plan_chunks(total_secs, config.max_chunk_secs, config.min_chunk_secs)
}

/// A declared duration only counts when it is finite and positive.
fn usable_duration(input: &Path, declared: Option<f64>) -> Result<f64> {
    match declared {
        Some(d) if d.is_finite() && d > 0.0 => Ok(d),
        declared => Err(SplitError::DurationUnknown(format!(
            "{:?} (declared {:?})",
            input, declared
        ))),
    }
}

fn is_last(plan: &ChunkPlan, chunk: &ChunkSpec) -> bool {
    chunk.index + 1 == plan.len()
}

/// The last part reads to end of input so nothing past an under-reported
/// container duration is lost.
fn chunk_window(chunk: &ChunkSpec, last: bool) -> SegmentWindow {
    if last {
        SegmentWindow::open_ended(chunk.start_secs)
    } else {
        SegmentWindow::new(chunk.start_secs, chunk.duration_secs)
    }
}

fn extract_chunk(
    input: &Path,
    output: &Path,
    chunk: &ChunkSpec,
    last: bool,
) -> Result<SegmentSummary> {
    tracing::info!(
        "Writing part {} ({:.2}s + {:.2}s) to {:?}",
        chunk.part_number(),
        chunk.start_secs,
        chunk.duration_secs,
        output
    );

    let summary = extract_window(input, output, chunk_window(chunk, last))?;

    tracing::info!(
        "Part {} done: {} packets, {} bytes",
        chunk.part_number(),
        summary.packets_written,
        summary.payload_bytes
    );
    Ok(summary)
}

/// Combine per-part results in plan order.
fn merge_outcomes(outcomes: Vec<Result<PathBuf>>) -> Result<Vec<PathBuf>> {
    let mut completed = Vec::with_capacity(outcomes.len());
    let mut first_failure = None;

    for (index, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(path) => completed.push(path),
            Err(e) => {
                if first_failure.is_none() {
                    first_failure = Some((index, e));
                } else {
                    tracing::warn!("Part {} also failed: {}", index + 1, e);
                }
            }
        }
    }

    match first_failure {
        None => Ok(completed),
        Some((index, source)) => Err(SplitError::ChunkFailed {
            index,
            completed,
            source: Box::new(source),
        }),
    }
}
