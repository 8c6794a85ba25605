//! Segment extraction
//!
//! Copies one time window of an input file into a new container by stream
//! copy. Packets are never decoded; part boundaries therefore snap to the
//! keyframes the container seek lands on.

pub mod extractor;
pub mod rebase;

pub use extractor::{extract_segment, extract_window, SegmentSummary};
pub use rebase::SegmentWindow;
