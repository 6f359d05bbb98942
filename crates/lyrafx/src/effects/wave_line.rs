#![forbid(unsafe_code)]

//! Lyric text riding a sine wave, one character at a time.

use lyrafx_core::color::{self, Rgba};
use lyrafx_core::geometry::Point;
use lyrafx_core::params::{ParamKind, ParamMap, ParamSchema, ParamSpec, ParamValue};
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
            key: "sung_color",
            label: "Sung color",
            kind: ParamKind::Color {
                default: Rgba::rgb(255, 200, 80),
            },
        },
        ParamSpec {
            key: "amplitude",
            label: "Wave amplitude",
            kind: ParamKind::Slider {
                min: 0.0,
                max: 30.0,
                step: 1.0,
                default: 8.0,
                unit: "px",
            },
        },
        ParamSpec {
            key: "wave_speed",
            label: "Wave speed",
            kind: ParamKind::Slider {
                min: 0.1,
                max: 5.0,
                step: 0.1,
                default: 1.5,
                unit: "x",
            },
        },
    ])
}

/// Each character bobs on a travelling sine wave; characters left of the
/// playback position take the "sung" highlight color.
///
/// The wave amplitude is scaled by the quality scalar and by the mid band,
/// so quiet passages flatten out. Character layout uses the surface's own
/// text metrics, never a hardcoded advance.
pub struct WaveLineFx {
    color: Rgba,
    sung_color: Rgba,
    amplitude: f64,
    wave_speed: f64,
}

/// Registry constructor.
pub fn construct() -> Box<dyn LyricEffect> {
    Box::new(WaveLineFx {
        color: Rgba::WHITE,
        sung_color: Rgba::rgb(255, 200, 80),
        amplitude: 8.0,
        wave_speed: 1.5,
    })
}

impl Effect for WaveLineFx {
    fn id(&self) -> &'static str {
        "wave_line"
    }

    fn display_name(&self) -> &'static str {
        "Wave Line"
    }

    fn category(&self) -> EffectCategory {
        EffectCategory::Lyric
    }

    fn tags(&self) -> &'static [&'static str] {
        &["wave", "karaoke"]
    }

    fn schema(&self) -> ParamSchema {
        schema()
    }

    fn params(&self) -> ParamMap {
        let mut m = ParamMap::new();
        m.insert("color".into(), ParamValue::Color(self.color));
        m.insert("sung_color".into(), ParamValue::Color(self.sung_color));
        m.insert("amplitude".into(), ParamValue::Number(self.amplitude));
        m.insert("wave_speed".into(), ParamValue::Number(self.wave_speed));
        m
    }

    fn set_params(&mut self, params: &ParamMap) {
        if let Some(c) = params.get("color").and_then(ParamValue::as_color) {
            self.color = c;
        }
        if let Some(c) = params.get("sung_color").and_then(ParamValue::as_color) {
            self.sung_color = c;
        }
        if let Some(n) = params.get("amplitude").and_then(ParamValue::as_number) {
            self.amplitude = n;
        }
        if let Some(n) = params.get("wave_speed").and_then(ParamValue::as_number) {
            self.wave_speed = n;
        }
    }

    fn estimated_cost_ms(&self) -> f64 {
        2.5
    }
}

impl LyricEffect for WaveLineFx {
    fn render(
        &mut self,
        surface: &mut dyn Surface,
        ctx: &LyricContext<'_>,
    ) -> Result<(), EffectError> {
        if ctx.line.is_empty() {
            return Ok(());
        }

        let font_size = (ctx.bounds.height * 0.25).clamp(12.0, 96.0);
        surface.set_font(&FontSpec::bold("sans-serif", font_size));

        let total_width = surface.measure_text(ctx.line).width;
        let baseline = ctx.bounds.center_y() + surface.measure_text(ctx.line).ascent / 2.0;
        let mut x = ctx.bounds.center_x() - total_width / 2.0;

        let amplitude =
            self.amplitude as f32 * ctx.quality as f32 * (0.4 + 0.6 * ctx.audio.mid);
        let phase = ctx.time as f32 * self.wave_speed as f32 * std::f32::consts::TAU;

        let chars: Vec<char> = ctx.line.chars().collect();
        let sung = (ctx.progress * chars.len() as f32).floor() as usize;

        let mut buf = [0u8; 4];
        for (i, ch) in chars.iter().enumerate() {
            let s: &str = ch.encode_utf8(&mut buf);
            let advance = surface.measure_text(s).width;
            let y = baseline + (phase + i as f32 * 0.55).sin() * amplitude;
            let c = if i < sung {
                // Soften the highlight edge on the most recent character.
                if i + 1 == sung {
                    color::lerp(self.color, self.sung_color, 0.7)
                } else {
                    self.sung_color
                }
            } else {
                self.color
            };
            surface.set_fill(c);
            surface.fill_text(s, Point::new(x, y));
            x += advance;
        }
        Ok(())
    }
}
