#![forbid(unsafe_code)]

//! Lyric text with a layered glow halo.

use lyrafx_core::color::Rgba;
use lyrafx_core::geometry::Point;
use lyrafx_core::params::{ParamKind, ParamMap, ParamSchema, ParamSpec, ParamValue};
use lyrafx_render::budget::QualityTier;
use lyrafx_render::surface::{FontSpec, Surface};

use crate::effect::{Effect, EffectCategory, EffectError, LyricContext, LyricEffect};

fn schema() -> ParamSchema {
    ParamSchema::new(vec![
        ParamSpec {
            key: "color",
            label: "Text color",
            kind: ParamKind::Color {
                default: Rgba::WHITE,
            },
        },
        ParamSpec {
            key: "glow_color",
            label: "Glow color",
            kind: ParamKind::Color {
                default: Rgba::rgb(120, 180, 255),
            },
        },
        ParamSpec {
            key: "intensity",
            label: "Glow intensity",
            kind: ParamKind::Slider {
                min: 0.0,
                max: 1.0,
                step: 0.05,
                default: 0.7,
                unit: "",
            },
        },
        ParamSpec {
            key: "font_scale",
            label: "Font scale",
            kind: ParamKind::Slider {
                min: 0.5,
                max: 2.0,
                step: 0.1,
                default: 1.0,
                unit: "x",
            },
        },
    ])
}

/// Centered lyric text with concentric glow passes behind it.
///
/// The glow strengthens on beats. At reduced quality the halo thins; at
/// minimal quality only the text itself is drawn, so the line stays
/// readable at every degradation level.
pub struct GlowLineFx {
    color: Rgba,
    glow_color: Rgba,
    intensity: f64,
    font_scale: f64,
}

/// Registry constructor.
pub fn construct() -> Box<dyn LyricEffect> {
    Box::new(GlowLineFx {
        color: Rgba::WHITE,
        glow_color: Rgba::rgb(120, 180, 255),
        intensity: 0.7,
        font_scale: 1.0,
    })
}

/// Glow passes per quality tier.
fn glow_passes(tier: QualityTier) -> usize {
    match tier {
        QualityTier::Full => 4,
        QualityTier::Reduced => 2,
        QualityTier::Minimal => 0,
    }
}

impl Effect for GlowLineFx {
    fn id(&self) -> &'static str {
        "glow_line"
    }

    fn display_name(&self) -> &'static str {
        "Glow Line"
    }

    fn category(&self) -> EffectCategory {
        EffectCategory::Lyric
    }

    fn tags(&self) -> &'static [&'static str] {
        &["glow", "readable"]
    }

    fn schema(&self) -> ParamSchema {
        schema()
    }

    fn params(&self) -> ParamMap {
        let mut m = ParamMap::new();
        m.insert("color".into(), ParamValue::Color(self.color));
        m.insert("glow_color".into(), ParamValue::Color(self.glow_color));
        m.insert("intensity".into(), ParamValue::Number(self.intensity));
        m.insert("font_scale".into(), ParamValue::Number(self.font_scale));
        m
    }

    fn set_params(&mut self, params: &ParamMap) {
        if let Some(c) = params.get("color").and_then(ParamValue::as_color) {
            self.color = c;
        }
        if let Some(c) = params.get("glow_color").and_then(ParamValue::as_color) {
            self.glow_color = c;
        }
        if let Some(n) = params.get("intensity").and_then(ParamValue::as_number) {
            self.intensity = n;
        }
        if let Some(n) = params.get("font_scale").and_then(ParamValue::as_number) {
            self.font_scale = n;
        }
    }

    fn estimated_cost_ms(&self) -> f64 {
        2.0
    }
}

impl LyricEffect for GlowLineFx {
    fn render(
        &mut self,
        surface: &mut dyn Surface,
        ctx: &LyricContext<'_>,
    ) -> Result<(), EffectError> {
        if ctx.line.is_empty() {
            return Ok(());
        }

        let font_size =
            (ctx.bounds.height * 0.25 * self.font_scale as f32).clamp(12.0, 96.0);
        surface.set_font(&FontSpec::bold("sans-serif", font_size));

        let metrics = surface.measure_text(ctx.line);
        let at = Point::new(
            ctx.bounds.center_x() - metrics.width / 2.0,
            ctx.bounds.center_y() + metrics.ascent / 2.0,
        );

        // Beats widen the halo for one frame.
        let beat_kick = if ctx.audio.beat {
            1.0 + ctx.audio.beat_strength * 0.5
        } else {
            1.0
        };

        let passes = glow_passes(QualityTier::from_scalar(ctx.quality));
        for pass in (1..=passes).rev() {
            let spread = pass as f32 * font_size * 0.04 * beat_kick;
            let alpha = self.intensity as f32 * 0.25 / pass as f32;
            surface.set_alpha(alpha);
            surface.set_fill(self.glow_color);
            for (dx, dy) in [(spread, 0.0), (-spread, 0.0), (0.0, spread), (0.0, -spread)] {
                surface.fill_text(ctx.line, Point::new(at.x + dx, at.y + dy));
            }
        }

        surface.set_alpha(1.0);
        surface.set_fill(self.color);
        surface.fill_text(ctx.line, at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyrafx_core::audio::AudioFrame;
    use lyrafx_core::geometry::Rect;
    use lyrafx_render::surface::RecordingSurface;

    fn ctx<'a>(line: &'a str, quality: f64, audio: AudioFrame) -> LyricContext<'a> {
        LyricContext {
            line,
            progress: 0.5,
            bounds: Rect::new(0.0, 200.0, 800.0, 200.0),
            time: 1.0,
            frame: 60,
            audio,
            quality,
        }
    }

    #[test]
    fn full_quality_draws_glow_plus_text() {
        let mut fx = construct();
        let mut s = RecordingSurface::new(800.0, 600.0);
        fx.render(&mut s, &ctx("shine", 1.0, AudioFrame::SILENT))
            .unwrap();
        // 4 passes x 4 offsets + 1 main draw.
        assert_eq!(s.fill_text_count(), 17);
    }

    #[test]
    fn minimal_quality_draws_text_only() {
        let mut fx = construct();
        let mut s = RecordingSurface::new(800.0, 600.0);
        fx.render(&mut s, &ctx("shine", 0.5, AudioFrame::SILENT))
            .unwrap();
        assert_eq!(s.fill_text_count(), 1);
    }

    #[test]
    fn empty_line_draws_nothing() {
        let mut fx = construct();
        let mut s = RecordingSurface::new(800.0, 600.0);
        fx.render(&mut s, &ctx("", 1.0, AudioFrame::SILENT)).unwrap();
        assert!(s.ops().is_empty());
    }

    #[test]
    fn main_text_is_drawn_last_at_full_alpha() {
        use lyrafx_render::surface::DrawOp;
        let mut fx = construct();
        let mut s = RecordingSurface::new(800.0, 600.0);
        fx.render(&mut s, &ctx("shine", 1.0, AudioFrame::SILENT))
            .unwrap();
        let ops = s.ops();
        assert!(matches!(ops.last(), Some(DrawOp::FillText { .. })));
        // The alpha set immediately before the final draw is 1.0.
        let last_alpha = ops
            .iter()
            .rev()
            .find_map(|op| match op {
                DrawOp::SetAlpha(a) => Some(*a),
                _ => None,
            })
            .unwrap();
        assert_eq!(last_alpha, 1.0);
    }
}
