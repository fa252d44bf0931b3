//! Staging layer: per-entity overlays over the loaded snapshot

mod cache;
mod overlay;

pub use cache::StagingCache;
pub use overlay::{Overlay, StageOutcome};
