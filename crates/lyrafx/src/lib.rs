#![forbid(unsafe_code)]

//! Frame-budgeted lyric and background visual effects engine.
//!
//! The host drives one render pass per display frame:
//!
//! ```
//! use lyrafx::composer::EffectComposer;
//! use lyrafx::config::EffectInstanceConfig;
//! use lyrafx::effects;
//! use lyrafx::registry::EffectRegistry;
//! use lyrafx_core::audio::AudioFrame;
//! use lyrafx_render::surface::RecordingSurface;
//!
//! let mut registry = EffectRegistry::new();
//! effects::register_builtins(&mut registry);
//!
//! let mut composer = EffectComposer::new(registry);
//! composer.set_background_effects(&[EffectInstanceConfig::new("gradient_wash")]);
//! composer.enable_frame_budget(60.0);
//!
//! let mut surface = RecordingSurface::new(1280.0, 720.0);
//! let audio = AudioFrame::from_bands(0.6, 0.4, 0.2);
//!
//! composer.begin_frame();
//! composer.render_background(&mut surface, audio);
//! composer.render_lyric(&mut surface, "and the beat goes on", 0.5, audio);
//! composer.end_frame();
//! ```
//!
//! Everything runs on the single rendering thread; the per-frame tick is
//! the only suspension point. Budget enforcement is pure skip logic — an
//! effect is either rendered or skipped this frame, never interrupted.

pub mod composer;
pub mod config;
pub mod effect;
pub mod effects;
pub mod particle;
pub mod registry;

pub use composer::EffectComposer;
pub use config::EffectInstanceConfig;
pub use effect::{
    BackgroundContext, BackgroundEffect, Effect, EffectCategory, EffectError, LyricContext,
    LyricEffect,
};
pub use particle::{Particle, ParticlePool, ParticleUpdate, Trail};
pub use registry::{DescriptorOverrides, EffectDescriptor, EffectRegistry};
