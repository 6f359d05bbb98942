//! End-to-end frames through the composer with the built-in effects.

use lyrafx::composer::EffectComposer;
use lyrafx::config::EffectInstanceConfig;
use lyrafx::effects::register_builtins;
use lyrafx::registry::EffectRegistry;
use lyrafx_core::audio::AudioFrame;
use lyrafx_core::params::{ParamMap, ParamValue};
use lyrafx_render::surface::{DrawOp, RecordingSurface};

fn composer() -> EffectComposer {
    let mut registry = EffectRegistry::new();
    register_builtins(&mut registry);
    EffectComposer::new(registry)
}

fn full_stack() -> EffectComposer {
    let mut c = composer();
    c.set_background_effects(&[
        EffectInstanceConfig::new("gradient_wash"),
        EffectInstanceConfig::new("particle_field"),
    ]);
    c.set_lyric_effects(&[
        EffectInstanceConfig::new("glow_line"),
        EffectInstanceConfig::new("wave_line"),
    ]);
    c
}

#[test]
fn full_frame_renders_background_and_lyric() {
    let mut c = full_stack();
    let mut surface = RecordingSurface::new(1280.0, 720.0);
    let audio = AudioFrame::from_bands(0.6, 0.4, 0.2).with_beat(0.8);

    c.begin_frame();
    c.render_background(&mut surface, audio);
    c.render_lyric(&mut surface, "singing in the rain", 0.3, audio);
    c.end_frame();

    assert!(surface.count(|op| matches!(op, DrawOp::FillRect(_))) > 0, "gradient drew");
    assert!(surface.fill_circle_count() > 0, "particles drew");
    assert!(surface.fill_text_count() > 0, "lyric drew");
    assert_eq!(surface.save_depth(), 0, "all effect scopes balanced");
}

#[test]
fn many_frames_with_budget_stay_consistent() {
    let mut c = full_stack();
    c.enable_frame_budget(60.0);
    let mut surface = RecordingSurface::new(1280.0, 720.0);
    let audio = AudioFrame::from_bands(0.8, 0.5, 0.6);

    for frame in 0..120 {
        surface.clear_ops();
        c.begin_frame();
        c.render_background(&mut surface, audio);
        c.render_lyric(&mut surface, "chorus line", frame as f32 / 120.0, audio);
        c.end_frame();
        assert_eq!(surface.save_depth(), 0);
        // The primary lyric effect is never skipped.
        assert!(surface.fill_text_count() > 0, "lyric visible on frame {frame}");
    }

    let stats = c.frame_stats().expect("budget enabled");
    assert_eq!(stats.total_frames, 120);
    assert!(stats.quality >= 0.5 && stats.quality <= 1.0);
}

#[test]
fn lyric_always_visible_without_any_effects() {
    let mut c = composer();
    let mut surface = RecordingSurface::new(1280.0, 720.0);
    c.render_lyric(&mut surface, "never gonna vanish", 0.0, AudioFrame::SILENT);
    assert_eq!(surface.fill_text_count(), 1);
}

#[test]
fn stack_replacement_mid_session() {
    let mut c = full_stack();
    let mut surface = RecordingSurface::new(640.0, 360.0);

    c.render_background(&mut surface, AudioFrame::SILENT);
    let with_particles = surface.fill_circle_count();
    assert!(with_particles > 0);

    c.set_background_effects(&[EffectInstanceConfig::new("gradient_wash")]);
    surface.clear_ops();
    c.render_background(&mut surface, AudioFrame::SILENT);
    assert_eq!(surface.fill_circle_count(), 0, "particle field removed");
    assert!(surface.count(|op| matches!(op, DrawOp::FillRect(_))) > 0);
}

#[test]
fn parameter_update_applies_next_frame() {
    let mut c = composer();
    c.set_background_effects(&[EffectInstanceConfig::new("particle_field")]);
    let mut surface = RecordingSurface::new(640.0, 360.0);

    c.render_background(&mut surface, AudioFrame::SILENT);
    let before = surface.fill_circle_count();

    let mut params = ParamMap::new();
    params.insert("count".into(), ParamValue::Number(10.0));
    assert!(c.update_effect_parameters("particle_field", &params));

    surface.clear_ops();
    c.render_background(&mut surface, AudioFrame::SILENT);
    assert_eq!(surface.fill_circle_count(), 10);
    assert!(before > 10);
}

#[test]
fn degraded_quality_reduces_particle_population() {
    let mut c = composer();
    c.set_background_effects(&[EffectInstanceConfig::new("particle_field")]);
    c.enable_frame_budget(60.0);
    let mut surface = RecordingSurface::new(640.0, 360.0);

    c.render_background(&mut surface, AudioFrame::SILENT);
    let full = surface.fill_circle_count();

    // Sustained over-budget frames degrade quality to the floor.
    for _ in 0..60 {
        c.begin_frame();
        std::thread::sleep(std::time::Duration::from_millis(25));
        c.end_frame();
    }
    assert!(c.quality_level() < 1.0);

    surface.clear_ops();
    c.render_background(&mut surface, AudioFrame::SILENT);
    assert!(surface.fill_circle_count() < full);
}

#[test]
fn disabling_budget_restores_full_quality() {
    let mut c = composer();
    c.enable_frame_budget(60.0);
    for _ in 0..30 {
        c.begin_frame();
        std::thread::sleep(std::time::Duration::from_millis(25));
        c.end_frame();
    }
    assert!(c.quality_level() < 1.0);
    c.disable_frame_budget();
    assert_eq!(c.quality_level(), 1.0);
    assert!(c.frame_stats().is_none());
}

#[test]
fn persisted_config_roundtrip_drives_composer() {
    // Configs flow: host JSON -> composer -> snapshot -> host JSON.
    #[cfg(feature = "serde")]
    {
        let json = r#"[
            {"effect_id": "glow_line", "parameters": {"intensity": {"Number": 0.4}}},
            {"effect_id": "wave_line", "enabled": false}
        ]"#;
        let configs: Vec<EffectInstanceConfig> = serde_json::from_str(json).unwrap();
        let mut c = composer();
        c.set_lyric_effects(&configs);
        assert_eq!(c.lyric_effect_ids(), vec!["glow_line"]);

        let snapshot = c.snapshot_configs();
        let out = serde_json::to_string(&snapshot).unwrap();
        assert!(out.contains("glow_line"));
    }
}
