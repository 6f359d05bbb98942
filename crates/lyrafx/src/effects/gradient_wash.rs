#![forbid(unsafe_code)]

//! Ambient vertical gradient that breathes with the music.

use lyrafx_core::color::{self, Rgba};
use lyrafx_core::geometry::Rect;
use lyrafx_core::params::{ParamKind, ParamMap, ParamSchema, ParamSpec, ParamValue};
use lyrafx_render::surface::Surface;

use crate::effect::{BackgroundContext, BackgroundEffect, Effect, EffectCategory, EffectError};

/// Bands drawn at full quality; the count scales down with the quality
/// scalar.
const FULL_BANDS: usize = 64;

fn schema() -> ParamSchema {
    ParamSchema::new(vec![
        ParamSpec {
            key: "top_color",
            label: "Top color",
            kind: ParamKind::Color {
                default: Rgba::rgb(16, 8, 48),
            },
        },
        ParamSpec {
            key: "bottom_color",
            label: "Bottom color",
            kind: ParamKind::Color {
                default: Rgba::rgb(72, 16, 96),
            },
        },
        ParamSpec {
            key: "drift_speed",
            label: "Drift speed",
            kind: ParamKind::Slider {
                min: 0.0,
                max: 3.0,
                step: 0.1,
                default: 0.5,
                unit: "x",
            },
        },
        ParamSpec {
            key: "audio_reactive",
            label: "Audio reactive",
            kind: ParamKind::Toggle { default: true },
        },
    ])
}

/// A slow vertical color wash between two configurable colors.
///
/// Bass brightens the gradient on beats when `audio_reactive` is on; the
/// gradient endpoints drift along the hue of the configured colors over
/// time at `drift_speed`.
pub struct GradientWashFx {
    top: Rgba,
    bottom: Rgba,
    drift_speed: f64,
    audio_reactive: bool,
    phase: f32,
}

/// Registry constructor.
pub fn construct() -> Box<dyn BackgroundEffect> {
    Box::new(GradientWashFx {
        top: Rgba::rgb(16, 8, 48),
        bottom: Rgba::rgb(72, 16, 96),
        drift_speed: 0.5,
        audio_reactive: true,
        phase: 0.0,
    })
}

impl Effect for GradientWashFx {
    fn id(&self) -> &'static str {
        "gradient_wash"
    }

    fn display_name(&self) -> &'static str {
        "Gradient Wash"
    }

    fn category(&self) -> EffectCategory {
        EffectCategory::Background
    }

    fn tags(&self) -> &'static [&'static str] {
        &["ambient", "gradient", "calm"]
    }

    fn schema(&self) -> ParamSchema {
        schema()
    }

    fn params(&self) -> ParamMap {
        let mut m = ParamMap::new();
        m.insert("top_color".into(), ParamValue::Color(self.top));
        m.insert("bottom_color".into(), ParamValue::Color(self.bottom));
        m.insert("drift_speed".into(), ParamValue::Number(self.drift_speed));
        m.insert("audio_reactive".into(), ParamValue::Flag(self.audio_reactive));
        m
    }

    fn set_params(&mut self, params: &ParamMap) {
        if let Some(c) = params.get("top_color").and_then(ParamValue::as_color) {
            self.top = c;
        }
        if let Some(c) = params.get("bottom_color").and_then(ParamValue::as_color) {
            self.bottom = c;
        }
        if let Some(n) = params.get("drift_speed").and_then(ParamValue::as_number) {
            self.drift_speed = n;
        }
        if let Some(b) = params.get("audio_reactive").and_then(ParamValue::as_flag) {
            self.audio_reactive = b;
        }
    }

    fn reset(&mut self) {
        self.phase = 0.0;
    }

    fn estimated_cost_ms(&self) -> f64 {
        1.5
    }
}

impl BackgroundEffect for GradientWashFx {
    fn render(
        &mut self,
        surface: &mut dyn Surface,
        ctx: &BackgroundContext,
    ) -> Result<(), EffectError> {
        self.phase += ctx.elapsed * self.drift_speed as f32;

        let size = surface.size();
        if size.is_empty() {
            return Ok(());
        }

        // Brighten with bass when reactive; phase drifts the blend point.
        let pump = if self.audio_reactive {
            ctx.audio.bass * 0.3
        } else {
            0.0
        };
        let shift = (self.phase.sin() + 1.0) * 0.5 * 0.2;

        let bands = ((FULL_BANDS as f64 * ctx.quality) as usize).max(8);
        let band_h = size.height / bands as f32;
        for i in 0..bands {
            let t = (i as f32 / (bands - 1).max(1) as f32 + shift).clamp(0.0, 1.0);
            let mut c = color::lerp(self.top, self.bottom, t);
            if pump > 0.0 {
                c = color::lerp(c, Rgba::WHITE, pump);
            }
            surface.set_fill(c);
            // Bands overlap by one pixel so seams never show.
            surface.fill_rect(Rect::new(0.0, i as f32 * band_h, size.width, band_h + 1.0));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyrafx_core::audio::AudioFrame;
    use lyrafx_render::surface::{DrawOp, RecordingSurface};

    fn ctx(quality: f64, audio: AudioFrame) -> BackgroundContext {
        BackgroundContext {
            elapsed: 1.0 / 60.0,
            time: 0.0,
            frame: 1,
            audio,
            quality,
        }
    }

    #[test]
    fn full_quality_draws_full_band_count() {
        let mut fx = construct();
        let mut s = RecordingSurface::new(640.0, 360.0);
        fx.render(&mut s, &ctx(1.0, AudioFrame::SILENT)).unwrap();
        assert_eq!(s.count(|op| matches!(op, DrawOp::FillRect(_))), FULL_BANDS);
    }

    #[test]
    fn reduced_quality_draws_fewer_bands() {
        let mut fx = construct();
        let mut s = RecordingSurface::new(640.0, 360.0);
        fx.render(&mut s, &ctx(0.5, AudioFrame::SILENT)).unwrap();
        let n = s.count(|op| matches!(op, DrawOp::FillRect(_)));
        assert_eq!(n, FULL_BANDS / 2);
    }

    #[test]
    fn empty_surface_draws_nothing() {
        let mut fx = construct();
        let mut s = RecordingSurface::new(0.0, 0.0);
        fx.render(&mut s, &ctx(1.0, AudioFrame::SILENT)).unwrap();
        assert!(s.ops().is_empty());
    }

    #[test]
    fn bass_brightens_bands() {
        let mut fx = construct();
        let mut quiet = RecordingSurface::new(64.0, 64.0);
        fx.render(&mut quiet, &ctx(1.0, AudioFrame::SILENT)).unwrap();
        fx.reset();

        let mut loud = RecordingSurface::new(64.0, 64.0);
        let audio = AudioFrame::from_bands(1.0, 0.0, 0.0);
        fx.render(&mut loud, &ctx(1.0, audio)).unwrap();

        let first_fill = |s: &RecordingSurface| {
            s.ops().iter().find_map(|op| match op {
                DrawOp::SetFill(c) => Some(*c),
                _ => None,
            })
        };
        let q = first_fill(&quiet).unwrap();
        let l = first_fill(&loud).unwrap();
        assert!(l.r() > q.r() && l.g() > q.g(), "loud fill is brighter");
    }

    #[test]
    fn params_roundtrip_through_schema() {
        let mut fx = construct();
        let schema = fx.schema();
        let mut target = fx.params();
        let mut incoming = ParamMap::new();
        incoming.insert("drift_speed".into(), ParamValue::Number(99.0));
        schema.merge_sanitized(&mut target, &incoming);
        fx.set_params(&target);
        assert_eq!(fx.params()["drift_speed"], ParamValue::Number(3.0));
    }
}
