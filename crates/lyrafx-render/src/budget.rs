#![forbid(unsafe_code)]

//! Frame time budget tracking with adaptive quality scaling.
//!
//! Rendering several independent visual effects has to finish inside one
//! display frame (~16.7 ms at 60 fps). This module answers two questions
//! every frame:
//!
//! 1. "Do we have time left for this priority tier?" — via
//!    [`FrameBudget::has_time_for`], which gates lower-priority effects
//!    before they render.
//! 2. "Are we keeping up over time?" — via a sliding window of frame
//!    durations that drives an adaptive quality scalar in
//!    `[min_quality, 1.0]`. Effects read the scalar and scale down their
//!    own particle counts, trail lengths, or blur radii.
//!
//! # Usage
//!
//! ```
//! use lyrafx_render::budget::{FrameBudget, Priority};
//!
//! let mut budget = FrameBudget::new(60.0);
//! budget.begin();
//! if budget.has_time_for(Priority::Normal, 2.0) {
//!     // render the effect
//! }
//! budget.end();
//! let stats = budget.stats();
//! assert!(stats.quality >= 0.5 && stats.quality <= 1.0);
//! ```
//!
//! Budget exhaustion is never an error: it is signaled only through skip
//! decisions, the quality scalar, and the dropped-frame counter.

use std::collections::VecDeque;
use std::time::Instant;

#[cfg(feature = "tracing")]
use tracing::{trace, warn};

/// Priority tiers, in descending urgency.
///
/// The frame budget is pre-split across tiers: a lower tier can exhaust
/// its share while a higher tier still has room. `Critical` work is never
/// throttled — lyric text must always be visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Critical,
    High,
    Normal,
    Low,
}

impl Priority {
    /// Fraction of the frame budget pre-allocated to this tier.
    ///
    /// Shares are 30% / 30% / 25% / 15% and intentionally sum to 1.0.
    #[inline]
    pub const fn share(self) -> f64 {
        match self {
            Self::Critical => 0.30,
            Self::High => 0.30,
            Self::Normal => 0.25,
            Self::Low => 0.15,
        }
    }

    /// Human-readable name for logging.
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Normal => "normal",
            Self::Low => "low",
        }
    }
}

/// Coarse quality tier derived from the continuous quality scalar.
///
/// Effects that cannot scale continuously branch on this instead:
/// `Full` renders everything, `Reduced` drops embellishments (fewer
/// particles, shorter trails), `Minimal` is the cheapest acceptable
/// rendition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QualityTier {
    Minimal,
    Reduced,
    #[default]
    Full,
}

impl QualityTier {
    /// Map the `[0, 1]` quality scalar onto a tier.
    #[inline]
    pub fn from_scalar(quality: f64) -> Self {
        if quality >= 0.85 {
            Self::Full
        } else if quality >= 0.6 {
            Self::Reduced
        } else {
            Self::Minimal
        }
    }
}

/// Configuration for frame budget behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBudgetConfig {
    /// Target frame rate; the per-frame budget is `1000 / target_fps` ms.
    pub target_fps: f64,
    /// Whether the quality scalar adapts to measured frame times.
    pub adaptive_quality: bool,
    /// Lower clamp for the quality scalar.
    pub min_quality: f64,
    /// Sliding window length for the frame-time average.
    pub sample_size: usize,
    /// Per-frame quality step when adapting.
    pub adjustment_rate: f64,
}

impl Default for FrameBudgetConfig {
    fn default() -> Self {
        Self {
            target_fps: 60.0,
            adaptive_quality: true,
            min_quality: 0.5,
            sample_size: 30,
            adjustment_rate: 0.02,
        }
    }
}

impl FrameBudgetConfig {
    /// Config for a given target frame rate, defaults elsewhere.
    pub fn with_target_fps(target_fps: f64) -> Self {
        Self {
            target_fps,
            ..Default::default()
        }
    }
}

/// Read-only snapshot of budget state.
///
/// All fields are `Copy`; capture once per frame and forward to a debug
/// overlay or structured logger.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameStats {
    /// Average frame duration over the sliding window, in ms.
    pub average_frame_ms: f64,
    /// Frames per second derived from the window average.
    pub fps: f64,
    /// Current quality scalar in `[min_quality, 1.0]`.
    pub quality: f64,
    /// Frames whose duration exceeded the budget.
    pub dropped_frames: u64,
    /// Total frames observed.
    pub total_frames: u64,
}

/// Per-frame time budget tracker.
///
/// Call [`begin`](Self::begin) at frame start, [`has_time_for`](Self::has_time_for)
/// before each prioritized piece of work, and [`end`](Self::end) when the
/// frame's rendering is done. All timing uses a monotonic clock.
#[derive(Debug, Clone)]
pub struct FrameBudget {
    config: FrameBudgetConfig,
    /// Per-frame budget in ms, derived from `target_fps`.
    budget_ms: f64,
    /// Start of the current frame; `None` outside `begin()`..`end()`.
    frame_start: Option<Instant>,
    /// Sliding window of recent frame durations (ms).
    samples: VecDeque<f64>,
    quality: f64,
    total_frames: u64,
    dropped_frames: u64,
}

impl FrameBudget {
    /// Create a budget for the given target frame rate.
    pub fn new(target_fps: f64) -> Self {
        Self::from_config(FrameBudgetConfig::with_target_fps(target_fps))
    }

    /// Create a budget from configuration.
    pub fn from_config(config: FrameBudgetConfig) -> Self {
        let fps = if config.target_fps > 0.0 {
            config.target_fps
        } else {
            60.0
        };
        Self {
            budget_ms: 1000.0 / fps,
            frame_start: None,
            samples: VecDeque::with_capacity(config.sample_size),
            quality: 1.0,
            total_frames: 0,
            dropped_frames: 0,
            config,
        }
    }

    /// The per-frame budget in milliseconds.
    #[inline]
    pub fn budget_ms(&self) -> f64 {
        self.budget_ms
    }

    /// Record the frame start. Must be called once per frame before any
    /// `has_time_for` queries.
    pub fn begin(&mut self) {
        self.frame_start = Some(Instant::now());
    }

    /// Record the frame end, fold the duration into the sliding window,
    /// and adapt the quality scalar.
    ///
    /// Calling `end` without a matching `begin` is a no-op.
    pub fn end(&mut self) {
        let Some(start) = self.frame_start.take() else {
            return;
        };
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        self.record(duration_ms);
    }

    /// Fold a measured frame duration (ms) into the tracker.
    ///
    /// `end()` calls this with the measured duration; tests drive it
    /// directly with synthetic durations.
    pub fn record(&mut self, duration_ms: f64) {
        self.samples.push_back(duration_ms);
        while self.samples.len() > self.config.sample_size {
            self.samples.pop_front();
        }

        self.total_frames += 1;
        if duration_ms > self.budget_ms {
            self.dropped_frames += 1;
        }

        if self.config.adaptive_quality {
            self.adjust_quality(duration_ms);
        }
    }

    /// Adapt the quality scalar from the ratio of frame time to budget.
    ///
    /// Over 1.2× budget drops quality at double rate; over 1.0× at single
    /// rate; under 0.7× recovers at single rate. The scalar is clamped to
    /// `[min_quality, 1.0]`.
    fn adjust_quality(&mut self, duration_ms: f64) {
        let ratio = duration_ms / self.budget_ms;
        let rate = self.config.adjustment_rate;
        let before = self.quality;

        // A frame at exactly 1.2x budget (20 ms at 60 fps) must take the
        // double-step path; absorb float noise around the threshold.
        if ratio >= 1.2 - 1e-9 {
            self.quality -= 2.0 * rate;
        } else if ratio > 1.0 {
            self.quality -= rate;
        } else if ratio < 0.7 && self.quality < 1.0 {
            self.quality += rate;
        }
        self.quality = self.quality.clamp(self.config.min_quality, 1.0);

        #[cfg(feature = "tracing")]
        if self.quality < before {
            warn!(
                quality = self.quality,
                ratio, "frame over budget, reducing quality"
            );
        } else if self.quality > before {
            trace!(quality = self.quality, "frame under budget, recovering quality");
        }
        let _ = before;
    }

    /// Milliseconds elapsed since `begin()`, or 0 outside a frame.
    #[inline]
    pub fn elapsed_ms(&self) -> f64 {
        self.frame_start
            .map(|s| s.elapsed().as_secs_f64() * 1000.0)
            .unwrap_or(0.0)
    }

    /// Check whether work of the given priority and estimated cost fits in
    /// what remains of this frame.
    ///
    /// `Critical` always fits — it is never throttled. Other tiers fail
    /// when the whole-frame remainder is smaller than the estimate, or when
    /// the tier's pre-allocated share is already spent.
    ///
    /// The per-tier "time already used" figure is a deliberate
    /// approximation: total elapsed time divided evenly across the four
    /// tiers, not a true per-tier ledger. It errs toward skipping
    /// low-priority work under load, which is the safe direction.
    pub fn has_time_for(&self, priority: Priority, estimated_cost_ms: f64) -> bool {
        if priority == Priority::Critical {
            return true;
        }

        let elapsed = self.elapsed_ms();
        let remaining = self.budget_ms - elapsed;
        if remaining < estimated_cost_ms {
            return false;
        }

        let tier_budget = self.budget_ms * priority.share();
        let tier_used = elapsed / 4.0;
        tier_used + estimated_cost_ms <= tier_budget
    }

    /// The adaptive quality scalar in `[min_quality, 1.0]`.
    #[inline]
    pub fn quality_level(&self) -> f64 {
        self.quality
    }

    /// The coarse tier for the current quality scalar.
    #[inline]
    pub fn quality_tier(&self) -> QualityTier {
        QualityTier::from_scalar(self.quality)
    }

    /// Snapshot current stats, recomputed from the sliding window.
    pub fn stats(&self) -> FrameStats {
        let average_frame_ms = if self.samples.is_empty() {
            0.0
        } else {
            self.samples.iter().sum::<f64>() / self.samples.len() as f64
        };
        let fps = if average_frame_ms > 0.0 {
            1000.0 / average_frame_ms
        } else {
            0.0
        };
        FrameStats {
            average_frame_ms,
            fps,
            quality: self.quality,
            dropped_frames: self.dropped_frames,
            total_frames: self.total_frames,
        }
    }

    /// Reset timing state, counters, and the quality scalar.
    pub fn reset(&mut self) {
        self.frame_start = None;
        self.samples.clear();
        self.quality = 1.0;
        self.total_frames = 0;
        self.dropped_frames = 0;
    }

    /// The configuration this budget was built from.
    #[inline]
    pub fn config(&self) -> &FrameBudgetConfig {
        &self.config
    }
}
