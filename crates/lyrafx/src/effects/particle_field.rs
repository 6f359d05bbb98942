#![forbid(unsafe_code)]

//! Audio-reactive drifting particle field over the pooled particle store.

use lyrafx_core::color::Rgba;
use lyrafx_core::geometry::Size;
use lyrafx_core::params::{ParamKind, ParamMap, ParamSchema, ParamSpec, ParamValue};
use lyrafx_render::surface::Surface;

use crate::effect::{BackgroundContext, BackgroundEffect, Effect, EffectCategory, EffectError};
use crate::particle::{ParticlePool, ParticleUpdate};

const DEFAULT_COUNT: f64 = 120.0;

fn schema() -> ParamSchema {
    ParamSchema::new(vec![
        ParamSpec {
            key: "count",
            label: "Particle count",
            kind: ParamKind::Slider {
                min: 0.0,
                max: 500.0,
                step: 10.0,
                default: DEFAULT_COUNT,
                unit: "",
            },
        },
        ParamSpec {
            key: "speed",
            label: "Speed",
            kind: ParamKind::Slider {
                min: 0.1,
                max: 5.0,
                step: 0.1,
                default: 1.0,
                unit: "x",
            },
        },
        ParamSpec {
            key: "tint",
            label: "Tint",
            kind: ParamKind::Color {
                default: Rgba::rgb(180, 210, 255),
            },
        },
        ParamSpec {
            key: "trails",
            label: "Trails",
            kind: ParamKind::Toggle { default: true },
        },
        ParamSpec {
            key: "trail_intensity",
            label: "Trail intensity",
            kind: ParamKind::Slider {
                min: 0.0,
                max: 1.0,
                step: 0.05,
                default: 0.5,
                unit: "",
            },
        },
    ])
}

/// Drifting particles that speed up with bass and pulse with treble.
///
/// The rendered particle count is the configured count scaled by the
/// adaptive quality scalar, so this effect degrades smoothly under load
/// instead of being skipped outright.
pub struct ParticleFieldFx {
    pool: ParticlePool,
    count: f64,
    speed: f64,
    tint: Rgba,
    trails: bool,
    trail_intensity: f64,
}

/// Registry constructor.
pub fn construct() -> Box<dyn BackgroundEffect> {
    let tint = Rgba::rgb(180, 210, 255);
    let mut pool = ParticlePool::new(DEFAULT_COUNT as usize, Size::default());
    pool.set_palette(&palette_for(tint));
    Box::new(ParticleFieldFx {
        pool,
        count: DEFAULT_COUNT,
        speed: 1.0,
        tint,
        trails: true,
        trail_intensity: 0.5,
    })
}

/// Three-stop palette around the configured tint.
fn palette_for(tint: Rgba) -> [Rgba; 3] {
    [
        tint,
        lyrafx_core::color::lerp(tint, Rgba::WHITE, 0.5),
        tint.with_opacity(0.6),
    ]
}

impl Effect for ParticleFieldFx {
    fn id(&self) -> &'static str {
        "particle_field"
    }

    fn display_name(&self) -> &'static str {
        "Particle Field"
    }

    fn category(&self) -> EffectCategory {
        EffectCategory::Background
    }

    fn tags(&self) -> &'static [&'static str] {
        &["particles", "ambient", "reactive"]
    }

    fn schema(&self) -> ParamSchema {
        schema()
    }

    fn params(&self) -> ParamMap {
        let mut m = ParamMap::new();
        m.insert("count".into(), ParamValue::Number(self.count));
        m.insert("speed".into(), ParamValue::Number(self.speed));
        m.insert("tint".into(), ParamValue::Color(self.tint));
        m.insert("trails".into(), ParamValue::Flag(self.trails));
        m.insert(
            "trail_intensity".into(),
            ParamValue::Number(self.trail_intensity),
        );
        m
    }

    fn set_params(&mut self, params: &ParamMap) {
        if let Some(n) = params.get("count").and_then(ParamValue::as_number) {
            self.count = n;
        }
        if let Some(n) = params.get("speed").and_then(ParamValue::as_number) {
            self.speed = n;
        }
        if let Some(c) = params.get("tint").and_then(ParamValue::as_color) {
            self.tint = c;
            self.pool.set_palette(&palette_for(c));
        }
        if let Some(b) = params.get("trails").and_then(ParamValue::as_flag) {
            self.trails = b;
        }
        if let Some(n) = params.get("trail_intensity").and_then(ParamValue::as_number) {
            self.trail_intensity = n;
        }
    }

    fn resize(&mut self, size: Size) {
        self.pool.resize(size);
    }

    fn reset(&mut self) {
        while self.pool.active_count() > 0 {
            self.pool.release_last();
        }
    }

    fn estimated_cost_ms(&self) -> f64 {
        4.0
    }
}

impl BackgroundEffect for ParticleFieldFx {
    fn render(
        &mut self,
        surface: &mut dyn Surface,
        ctx: &BackgroundContext,
    ) -> Result<(), EffectError> {
        let size = surface.size();
        if size.is_empty() {
            return Ok(());
        }
        self.pool.resize(size);

        // Quality scales the live population, not the draw path.
        let target = (self.count * ctx.quality) as usize;
        while self.pool.active_count() < target {
            if self.pool.acquire().is_none() {
                break;
            }
        }
        while self.pool.active_count() > target {
            self.pool.release_last();
        }

        let update = ParticleUpdate {
            dt: ctx.elapsed,
            bounds: size,
            speed_multiplier: self.speed as f32,
            motion_boost: ctx.audio.bass,
            pulse_boost: ctx.audio.treble * 0.8,
            trails: self.trails,
            trail_intensity: self.trail_intensity as f32,
        };
        for p in self.pool.active_mut() {
            p.update(&update);
        }
        for p in self.pool.active() {
            p.draw(surface);
        }
        Ok(())
    }
}
