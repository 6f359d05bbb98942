#![forbid(unsafe_code)]

//! Render kernel: the drawing-surface abstraction and frame budget tracking.
//!
//! The engine issues only immediate-mode draw calls through the [`Surface`]
//! trait; it never owns the surface. [`budget::FrameBudget`] answers "are we
//! keeping up with the target rate" and exposes the adaptive quality scalar
//! effects use to scale down their own workload.

pub mod budget;
pub mod surface;

pub use budget::{FrameBudget, FrameBudgetConfig, FrameStats, Priority, QualityTier};
pub use surface::{DrawOp, FontSpec, FontWeight, RecordingSurface, Surface, TextMetrics, with_scope};
