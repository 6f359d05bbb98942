#![forbid(unsafe_code)]

//! Foundation types for the lyrafx effect engine.
//!
//! This crate holds the data-only building blocks shared by the render
//! kernel and the effect stack: canvas geometry, packed RGBA color,
//! per-frame audio signals, and the parameter schema machinery that
//! effects use to describe and validate their settings.
//!
//! Nothing here performs I/O or owns a drawing surface.

pub mod audio;
pub mod color;
pub mod geometry;
pub mod params;

pub use audio::AudioFrame;
pub use color::Rgba;
pub use geometry::{Point, Rect, Size};
pub use params::{ParamKind, ParamSchema, ParamSpec, ParamValue};
