#![forbid(unsafe_code)]

//! The effect abstraction: polymorphic renderable behaviors.
//!
//! An effect is a unit of visual behavior over one of two capability sets:
//! a [`LyricEffect`] renders text for the currently active lyric line, a
//! [`BackgroundEffect`] renders an ambient animated backdrop. Both share
//! the [`Effect`] base contract: identity, a declared parameter schema,
//! current parameter values, and lifecycle hooks.
//!
//! Render methods return `Result` so one broken effect can never blank the
//! screen: the composer logs the failure with the effect's id and moves on
//! to the next effect in the same frame.

use std::error::Error;
use std::fmt;

use lyrafx_core::audio::AudioFrame;
use lyrafx_core::geometry::{Rect, Size};
use lyrafx_core::params::{ParamMap, ParamSchema};
use lyrafx_render::surface::Surface;

/// Which render slot an effect occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectCategory {
    Lyric,
    Background,
}

impl EffectCategory {
    /// Human-readable name for logging.
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lyric => "lyric",
            Self::Background => "background",
        }
    }
}

/// A render-time failure inside an effect.
///
/// These are caught per effect, per frame; rendering always proceeds with
/// the remaining effects.
#[derive(Debug)]
pub enum EffectError {
    /// The effect could not complete its render this frame.
    Render(String),
    /// A parameter value was unusable at render time.
    BadParameter { key: String, message: String },
}

impl fmt::Display for EffectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Render(msg) => write!(f, "render failed: {msg}"),
            Self::BadParameter { key, message } => {
                write!(f, "bad parameter {key:?}: {message}")
            }
        }
    }
}

impl Error for EffectError {}

/// Per-frame inputs for background rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackgroundContext {
    /// Seconds since the previous background frame. The first frame uses
    /// a nominal 1/60 s.
    pub elapsed: f32,
    /// Seconds since the composer was created.
    pub time: f64,
    /// Frame counter.
    pub frame: u64,
    /// Audio signals for this frame.
    pub audio: AudioFrame,
    /// Adaptive quality scalar in `[min_quality, 1.0]`.
    pub quality: f64,
}

/// Per-frame inputs for lyric rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LyricContext<'a> {
    /// The currently active lyric line.
    pub line: &'a str,
    /// Playback progress through the line in `[0, 1]`.
    pub progress: f32,
    /// Region the lyric should occupy.
    pub bounds: Rect,
    pub time: f64,
    pub frame: u64,
    pub audio: AudioFrame,
    /// Adaptive quality scalar in `[min_quality, 1.0]`.
    pub quality: f64,
}

/// Base contract shared by lyric and background effects.
///
/// Lifecycle per instance: created → `init` → `on_activate` → rendered any
/// number of times → `on_deactivate`. `reset` may be called any number of
/// times while activated and must not change activation state.
pub trait Effect {
    /// Stable id used in persisted configs and registry lookups.
    fn id(&self) -> &'static str;

    /// Human-readable name for effect-selection UI.
    fn display_name(&self) -> &'static str;

    /// Which render slot this effect occupies.
    fn category(&self) -> EffectCategory;

    /// Search/filter tags for effect-selection UI.
    fn tags(&self) -> &'static [&'static str] {
        &[]
    }

    /// The declared parameter schema.
    fn schema(&self) -> ParamSchema;

    /// Snapshot of current parameter values.
    fn params(&self) -> ParamMap;

    /// Apply parameter values. Values are schema-sanitized before they
    /// reach this method; unknown keys never appear.
    fn set_params(&mut self, params: &ParamMap);

    /// One-time setup after construction.
    fn init(&mut self) {}

    /// Called when the effect joins an active list.
    fn on_activate(&mut self) {}

    /// Called when the effect leaves an active list.
    fn on_deactivate(&mut self) {}

    /// Return to initial animation state (e.g. when the lyric changes)
    /// without deactivating.
    fn reset(&mut self) {}

    /// The drawing surface changed size.
    fn resize(&mut self, _size: Size) {}

    /// Estimated render cost in milliseconds, used for budget queries.
    fn estimated_cost_ms(&self) -> f64 {
        2.0
    }
}

/// An ambient animated backdrop.
pub trait BackgroundEffect: Effect {
    fn render(
        &mut self,
        surface: &mut dyn Surface,
        ctx: &BackgroundContext,
    ) -> Result<(), EffectError>;
}

/// An animated treatment of the active lyric line.
pub trait LyricEffect: Effect {
    fn render(
        &mut self,
        surface: &mut dyn Surface,
        ctx: &LyricContext<'_>,
    ) -> Result<(), EffectError>;
}
