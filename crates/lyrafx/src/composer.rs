#![forbid(unsafe_code)]

//! Frame orchestration across the active effect stacks.
//!
//! The composer owns two ordered lists of live effect instances (lyric and
//! background), instantiated from persisted configs through the registry.
//! Each display frame the host calls, in order: [`EffectComposer::begin_frame`],
//! [`EffectComposer::render_background`], [`EffectComposer::render_lyric`],
//! [`EffectComposer::end_frame`].
//!
//! Two guarantees hold regardless of what individual effects do:
//!
//! * Isolation. Every render runs inside a surface save/restore scope, and
//!   a `Result::Err` from one effect is logged and contained; the rest of
//!   the frame proceeds.
//! * Legibility. The first lyric effect renders unconditionally every
//!   frame, and when no lyric effect is active a plain fallback line is
//!   drawn, so the lyric text can never silently disappear.

use std::time::Instant;

use tracing::{debug, warn};

use lyrafx_core::audio::AudioFrame;
use lyrafx_core::color::Rgba;
use lyrafx_core::geometry::{Point, Rect, Size};
use lyrafx_core::params::ParamMap;
use lyrafx_render::budget::{FrameBudget, FrameStats, Priority};
use lyrafx_render::surface::{FontSpec, Surface, with_scope};

use crate::config::EffectInstanceConfig;
use crate::effect::{BackgroundContext, BackgroundEffect, Effect, LyricContext, LyricEffect};
use crate::registry::EffectRegistry;

/// Fallback lyric font size as a fraction of surface height.
const FALLBACK_FONT_FRACTION: f32 = 0.06;

/// A live effect instance paired with the config it was built from.
///
/// The config is kept in sync with parameter updates so the host can read
/// back the current state for persistence.
struct Active<E: ?Sized> {
    effect: Box<E>,
    config: EffectInstanceConfig,
}

impl<E: Effect + ?Sized> Active<E> {
    /// Apply schema defaults, then the config's sanitized overrides.
    fn apply_config(&mut self) {
        let schema = self.effect.schema();
        let mut params = schema.defaults();
        schema.merge_sanitized(&mut params, &self.config.parameters);
        self.effect.set_params(&params);
    }

    /// Merge new values into the live effect and the config snapshot.
    fn update_params(&mut self, incoming: &ParamMap) -> usize {
        let schema = self.effect.schema();
        let mut params = self.effect.params();
        let applied = schema.merge_sanitized(&mut params, incoming);
        if applied > 0 {
            self.effect.set_params(&params);
            schema.merge_sanitized(&mut self.config.parameters, incoming);
        }
        applied
    }
}

/// Orchestrates the active lyric and background effect stacks.
///
/// # Usage
///
/// See the crate-level example. The composer is single-threaded and owned
/// by the render loop; all state changes happen between frames or from the
/// same thread that renders.
pub struct EffectComposer {
    registry: EffectRegistry,
    lyric: Vec<Active<dyn LyricEffect>>,
    background: Vec<Active<dyn BackgroundEffect>>,
    budget: Option<FrameBudget>,
    /// Engine epoch for the absolute `time` context field.
    start: Instant,
    /// Previous background tick, for frame-delta computation.
    last_tick: Option<Instant>,
    frame: u64,
    /// Last surface size seen, to detect resizes.
    last_size: Option<Size>,
    /// Last lyric line seen, to reset lyric animation state on change.
    last_line: Option<String>,
}

impl EffectComposer {
    /// Create a composer over a filled registry. No frame budget is active
    /// until [`enable_frame_budget`](Self::enable_frame_budget).
    pub fn new(registry: EffectRegistry) -> Self {
        Self {
            registry,
            lyric: Vec::new(),
            background: Vec::new(),
            budget: None,
            start: Instant::now(),
            last_tick: None,
            frame: 0,
            last_size: None,
            last_line: None,
        }
    }

    /// The effect catalog backing this composer.
    #[inline]
    pub fn registry(&self) -> &EffectRegistry {
        &self.registry
    }

    /// Mutable access to the catalog, for late registrations.
    #[inline]
    pub fn registry_mut(&mut self) -> &mut EffectRegistry {
        &mut self.registry
    }

    // -- stack management ---------------------------------------------------

    /// Replace the lyric effect stack from configs.
    ///
    /// Current instances are deactivated exactly once, then each enabled
    /// config is instantiated in array order. Unknown ids are skipped with
    /// a warning; they never abort the rest of the list.
    pub fn set_lyric_effects(&mut self, configs: &[EffectInstanceConfig]) {
        for active in &mut self.lyric {
            active.effect.on_deactivate();
        }
        self.lyric.clear();
        for config in configs.iter().filter(|c| c.enabled) {
            let Some(effect) = self.registry.create_lyric(&config.effect_id) else {
                continue;
            };
            let mut active = Active {
                effect,
                config: config.clone(),
            };
            active.apply_config();
            if let Some(size) = self.last_size {
                active.effect.resize(size);
            }
            active.effect.on_activate();
            self.lyric.push(active);
        }
        debug!(count = self.lyric.len(), "lyric effect stack replaced");
    }

    /// Replace the background effect stack from configs.
    ///
    /// Same semantics as [`set_lyric_effects`](Self::set_lyric_effects).
    pub fn set_background_effects(&mut self, configs: &[EffectInstanceConfig]) {
        for active in &mut self.background {
            active.effect.on_deactivate();
        }
        self.background.clear();
        for config in configs.iter().filter(|c| c.enabled) {
            let Some(effect) = self.registry.create_background(&config.effect_id) else {
                continue;
            };
            let mut active = Active {
                effect,
                config: config.clone(),
            };
            active.apply_config();
            if let Some(size) = self.last_size {
                active.effect.resize(size);
            }
            active.effect.on_activate();
            self.background.push(active);
        }
        debug!(count = self.background.len(), "background effect stack replaced");
    }

    /// Append an already-constructed lyric effect to the stack.
    ///
    /// The paired config is derived from the instance's id and current
    /// parameters. Intended for effects built outside the registry.
    pub fn add_lyric_effect(&mut self, mut effect: Box<dyn LyricEffect>) {
        let config = EffectInstanceConfig {
            effect_id: effect.id().to_string(),
            parameters: effect.params(),
            enabled: true,
        };
        if let Some(size) = self.last_size {
            effect.resize(size);
        }
        effect.on_activate();
        self.lyric.push(Active { effect, config });
    }

    /// Append an already-constructed background effect to the stack.
    pub fn add_background_effect(&mut self, mut effect: Box<dyn BackgroundEffect>) {
        let config = EffectInstanceConfig {
            effect_id: effect.id().to_string(),
            parameters: effect.params(),
            enabled: true,
        };
        if let Some(size) = self.last_size {
            effect.resize(size);
        }
        effect.on_activate();
        self.background.push(Active { effect, config });
    }

    /// Deactivate and remove the first active instance with the given id,
    /// searching lyric then background. Returns whether one was removed.
    pub fn remove_effect(&mut self, id: &str) -> bool {
        if let Some(pos) = self.lyric.iter().position(|a| a.effect.id() == id) {
            let mut active = self.lyric.remove(pos);
            active.effect.on_deactivate();
            return true;
        }
        if let Some(pos) = self.background.iter().position(|a| a.effect.id() == id) {
            let mut active = self.background.remove(pos);
            active.effect.on_deactivate();
            return true;
        }
        false
    }

    /// Push new parameter values to every active instance with the given
    /// id, in both stacks. Values are schema-sanitized; unknown keys are
    /// dropped. Returns whether any instance accepted at least one value.
    pub fn update_effect_parameters(&mut self, id: &str, params: &ParamMap) -> bool {
        let mut touched = false;
        for active in self.lyric.iter_mut().filter(|a| a.effect.id() == id) {
            touched |= active.update_params(params) > 0;
        }
        for active in self.background.iter_mut().filter(|a| a.effect.id() == id) {
            touched |= active.update_params(params) > 0;
        }
        if !touched {
            warn!(id, "parameter update matched no active effect");
        }
        touched
    }

    /// Return every lyric effect to its initial animation state, e.g.
    /// after a seek. Activation state is untouched.
    pub fn reset_lyric_effects(&mut self) {
        for active in &mut self.lyric {
            active.effect.reset();
        }
    }

    /// Reset both stacks and the budget history, e.g. on track change.
    pub fn reset_all(&mut self) {
        self.reset_lyric_effects();
        for active in &mut self.background {
            active.effect.reset();
        }
        if let Some(budget) = &mut self.budget {
            budget.reset();
        }
        self.last_tick = None;
        self.last_line = None;
        self.frame = 0;
    }

    /// Deactivate and drop all active effects. Idempotent; the registry
    /// and budget survive, so new stacks can be set afterwards.
    pub fn clear_effects(&mut self) {
        for active in &mut self.lyric {
            active.effect.on_deactivate();
        }
        self.lyric.clear();
        for active in &mut self.background {
            active.effect.on_deactivate();
        }
        self.background.clear();
        self.last_line = None;
    }

    /// Ids of the active lyric stack, in render order.
    pub fn lyric_effect_ids(&self) -> Vec<&'static str> {
        self.lyric.iter().map(|a| a.effect.id()).collect()
    }

    /// Ids of the active background stack, in render order.
    pub fn background_effect_ids(&self) -> Vec<&'static str> {
        self.background.iter().map(|a| a.effect.id()).collect()
    }

    /// Current configs of both stacks (lyric first), suitable for
    /// persistence. Parameter updates made at runtime are reflected.
    pub fn snapshot_configs(&self) -> Vec<EffectInstanceConfig> {
        self.lyric
            .iter()
            .map(|a| a.config.clone())
            .chain(self.background.iter().map(|a| a.config.clone()))
            .collect()
    }

    // -- frame budget -------------------------------------------------------

    /// Turn on budget enforcement and adaptive quality at a target rate.
    ///
    /// Replaces any previous budget, resetting its history.
    pub fn enable_frame_budget(&mut self, target_fps: f64) {
        self.budget = Some(FrameBudget::new(target_fps));
    }

    /// Turn off budget enforcement; every effect renders every frame and
    /// quality pins at 1.0.
    pub fn disable_frame_budget(&mut self) {
        self.budget = None;
    }

    /// Mark the start of a display frame.
    pub fn begin_frame(&mut self) {
        self.frame += 1;
        if let Some(budget) = &mut self.budget {
            budget.begin();
        }
    }

    /// Mark the end of a display frame, folding its duration into the
    /// quality controller.
    pub fn end_frame(&mut self) {
        if let Some(budget) = &mut self.budget {
            budget.end();
        }
    }

    /// Budget statistics, if a budget is enabled.
    pub fn frame_stats(&self) -> Option<FrameStats> {
        self.budget.as_ref().map(|b| b.stats())
    }

    /// The adaptive quality scalar; 1.0 when no budget is enabled.
    pub fn quality_level(&self) -> f64 {
        self.budget.as_ref().map_or(1.0, |b| b.quality_level())
    }

    // -- rendering ----------------------------------------------------------

    fn sync_size(&mut self, surface: &dyn Surface) {
        let size = surface.size();
        if self.last_size == Some(size) {
            return;
        }
        self.last_size = Some(size);
        for active in &mut self.lyric {
            active.effect.resize(size);
        }
        for active in &mut self.background {
            active.effect.resize(size);
        }
    }

    /// Render the background stack in order.
    ///
    /// The first effect is checked against the `High` tier, the rest
    /// against `Normal`; an effect that does not fit is skipped for this
    /// frame only. A failing effect is logged and skipped; later effects
    /// still render.
    pub fn render_background(&mut self, surface: &mut dyn Surface, audio: AudioFrame) {
        self.sync_size(surface);

        let now = Instant::now();
        let elapsed = match self.last_tick {
            Some(prev) => now.duration_since(prev).as_secs_f32(),
            None => 1.0 / 60.0,
        };
        self.last_tick = Some(now);

        let ctx = BackgroundContext {
            elapsed,
            time: self.start.elapsed().as_secs_f64(),
            frame: self.frame,
            audio,
            quality: self.quality_level(),
        };

        // Field borrow split: the budget is read while the effect list is
        // iterated mutably.
        let budget = self.budget.as_ref();
        for (i, active) in self.background.iter_mut().enumerate() {
            let priority = if i == 0 { Priority::High } else { Priority::Normal };
            let cost = active.effect.estimated_cost_ms();
            if !budget.is_none_or(|b| b.has_time_for(priority, cost)) {
                debug!(
                    id = active.effect.id(),
                    priority = priority.as_str(),
                    "background effect skipped, budget exhausted"
                );
                continue;
            }
            let result = with_scope(surface, |s| active.effect.render(s, &ctx));
            if let Err(err) = result {
                warn!(id = active.effect.id(), %err, "background effect failed");
            }
        }
    }

    /// Render the lyric stack for the active line.
    ///
    /// With an empty stack, draws one plain bold centered line so the
    /// lyric is always readable. Otherwise the first effect renders
    /// unconditionally; each subsequent effect is checked against the
    /// `High` tier and the loop stops at the first that does not fit.
    pub fn render_lyric(
        &mut self,
        surface: &mut dyn Surface,
        line: &str,
        progress: f32,
        audio: AudioFrame,
    ) {
        self.sync_size(surface);

        if self.last_line.as_deref() != Some(line) {
            self.last_line = Some(line.to_string());
            for active in &mut self.lyric {
                active.effect.reset();
            }
        }

        let size = surface.size();
        let bounds = Rect::new(0.0, size.height * 0.35, size.width, size.height * 0.3);

        if self.lyric.is_empty() {
            self.render_fallback_lyric(surface, line, bounds);
            return;
        }

        let ctx = LyricContext {
            line,
            progress: progress.clamp(0.0, 1.0),
            bounds,
            time: self.start.elapsed().as_secs_f64(),
            frame: self.frame,
            audio,
            quality: self.quality_level(),
        };

        let budget = self.budget.as_ref();
        for (i, active) in self.lyric.iter_mut().enumerate() {
            // The primary lyric effect carries the text and is never
            // skipped; embellishment layers yield under load.
            if i > 0
                && !budget
                    .is_none_or(|b| b.has_time_for(Priority::High, active.effect.estimated_cost_ms()))
            {
                debug!(
                    id = active.effect.id(),
                    "remaining lyric effects skipped, budget exhausted"
                );
                break;
            }
            let result = with_scope(surface, |s| active.effect.render(s, &ctx));
            if let Err(err) = result {
                warn!(id = active.effect.id(), %err, "lyric effect failed");
            }
        }
    }

    fn render_fallback_lyric(&self, surface: &mut dyn Surface, line: &str, bounds: Rect) {
        if line.is_empty() {
            return;
        }
        with_scope(surface, |s| {
            let font_size = (s.size().height * FALLBACK_FONT_FRACTION).max(12.0);
            s.set_font(&FontSpec::bold("sans-serif", font_size));
            s.set_fill(Rgba::WHITE);
            let metrics = s.measure_text(line);
            let at = Point::new(
                bounds.center_x() - metrics.width / 2.0,
                bounds.center_y() + metrics.ascent / 2.0,
            );
            s.fill_text(line, at);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    use lyrafx_core::params::{ParamSchema, ParamValue};
    use lyrafx_render::surface::{DrawOp, RecordingSurface};

    use crate::effect::{EffectCategory, EffectError};
    use crate::effects::register_builtins;

    #[derive(Default, Clone)]
    struct Probe {
        activated: Rc<Cell<u32>>,
        deactivated: Rc<Cell<u32>>,
        resets: Rc<Cell<u32>>,
        renders: Rc<Cell<u32>>,
    }

    struct StubLyric {
        probe: Probe,
        cost: f64,
        fail: bool,
        params: ParamMap,
    }

    impl StubLyric {
        fn new(probe: Probe) -> Self {
            Self {
                probe,
                cost: 1.0,
                fail: false,
                params: ParamMap::new(),
            }
        }
    }

    impl Effect for StubLyric {
        fn id(&self) -> &'static str {
            "stub_lyric"
        }
        fn display_name(&self) -> &'static str {
            "Stub"
        }
        fn category(&self) -> EffectCategory {
            EffectCategory::Lyric
        }
        fn schema(&self) -> ParamSchema {
            ParamSchema::empty()
        }
        fn params(&self) -> ParamMap {
            self.params.clone()
        }
        fn set_params(&mut self, params: &ParamMap) {
            self.params = params.clone();
        }
        fn on_activate(&mut self) {
            self.probe.activated.set(self.probe.activated.get() + 1);
        }
        fn on_deactivate(&mut self) {
            self.probe.deactivated.set(self.probe.deactivated.get() + 1);
        }
        fn reset(&mut self) {
            self.probe.resets.set(self.probe.resets.get() + 1);
        }
        fn estimated_cost_ms(&self) -> f64 {
            self.cost
        }
    }

    impl LyricEffect for StubLyric {
        fn render(
            &mut self,
            surface: &mut dyn Surface,
            ctx: &LyricContext<'_>,
        ) -> Result<(), EffectError> {
            if self.fail {
                return Err(EffectError::Render("stub failure".into()));
            }
            self.probe.renders.set(self.probe.renders.get() + 1);
            surface.fill_text(ctx.line, ctx.bounds.center());
            Ok(())
        }
    }

    struct StubBackground {
        probe: Probe,
        fail: bool,
    }

    impl Effect for StubBackground {
        fn id(&self) -> &'static str {
            "stub_background"
        }
        fn display_name(&self) -> &'static str {
            "Stub Background"
        }
        fn category(&self) -> EffectCategory {
            EffectCategory::Background
        }
        fn schema(&self) -> ParamSchema {
            ParamSchema::empty()
        }
        fn params(&self) -> ParamMap {
            ParamMap::new()
        }
        fn set_params(&mut self, _params: &ParamMap) {}
        fn on_deactivate(&mut self) {
            self.probe.deactivated.set(self.probe.deactivated.get() + 1);
        }
    }

    impl BackgroundEffect for StubBackground {
        fn render(
            &mut self,
            _surface: &mut dyn Surface,
            _ctx: &BackgroundContext,
        ) -> Result<(), EffectError> {
            if self.fail {
                return Err(EffectError::Render("x".into()));
            }
            self.probe.renders.set(self.probe.renders.get() + 1);
            Ok(())
        }
    }

    fn composer_with_builtins() -> EffectComposer {
        let mut registry = EffectRegistry::new();
        register_builtins(&mut registry);
        EffectComposer::new(registry)
    }

    #[test]
    fn empty_lyric_stack_draws_single_fallback_line() {
        let mut composer = composer_with_builtins();
        let mut surface = RecordingSurface::new(800.0, 600.0);
        composer.render_lyric(&mut surface, "hello world", 0.5, AudioFrame::SILENT);
        assert_eq!(surface.fill_text_count(), 1);
        // Bold font was selected for the fallback.
        assert!(surface.count(|op| matches!(
            op,
            DrawOp::SetFont(f) if f.weight == lyrafx_render::surface::FontWeight::Bold
        )) == 1);
        assert_eq!(surface.save_depth(), 0);
    }

    #[test]
    fn fallback_skips_empty_line() {
        let mut composer = composer_with_builtins();
        let mut surface = RecordingSurface::new(800.0, 600.0);
        composer.render_lyric(&mut surface, "", 0.0, AudioFrame::SILENT);
        assert_eq!(surface.fill_text_count(), 0);
    }

    #[test]
    fn set_effects_deactivates_previous_stack_exactly_once() {
        let mut composer = composer_with_builtins();
        let probe = Probe::default();
        composer.add_lyric_effect(Box::new(StubLyric::new(probe.clone())));
        assert_eq!(probe.activated.get(), 1);

        composer.set_lyric_effects(&[EffectInstanceConfig::new("glow_line")]);
        assert_eq!(probe.deactivated.get(), 1);

        composer.set_lyric_effects(&[]);
        assert_eq!(probe.deactivated.get(), 1, "stub already gone");
    }

    #[test]
    fn unknown_config_id_is_skipped_not_fatal() {
        let mut composer = composer_with_builtins();
        composer.set_lyric_effects(&[
            EffectInstanceConfig::new("no_such_effect"),
            EffectInstanceConfig::new("glow_line"),
        ]);
        assert_eq!(composer.lyric_effect_ids(), vec!["glow_line"]);
    }

    #[test]
    fn disabled_configs_are_not_instantiated() {
        let mut composer = composer_with_builtins();
        composer.set_background_effects(&[
            EffectInstanceConfig::new("gradient_wash").with_enabled(false),
            EffectInstanceConfig::new("particle_field"),
        ]);
        assert_eq!(composer.background_effect_ids(), vec!["particle_field"]);
    }

    #[test]
    fn failing_effect_does_not_block_later_effects() {
        let mut composer = composer_with_builtins();
        let failing_probe = Probe::default();
        let ok_probe = Probe::default();
        let mut failing = StubLyric::new(failing_probe);
        failing.fail = true;
        composer.add_lyric_effect(Box::new(failing));
        composer.add_lyric_effect(Box::new(StubLyric::new(ok_probe.clone())));

        let mut surface = RecordingSurface::new(800.0, 600.0);
        composer.render_lyric(&mut surface, "line", 0.0, AudioFrame::SILENT);
        assert_eq!(ok_probe.renders.get(), 1);
        assert_eq!(surface.save_depth(), 0, "scopes balanced despite failure");
    }

    #[test]
    fn failing_background_effect_does_not_block_later_effects() {
        let mut composer = composer_with_builtins();
        let ok_probe = Probe::default();
        composer.add_background_effect(Box::new(StubBackground {
            probe: Probe::default(),
            fail: true,
        }));
        composer.add_background_effect(Box::new(StubBackground {
            probe: ok_probe.clone(),
            fail: false,
        }));

        let mut surface = RecordingSurface::new(800.0, 600.0);
        composer.render_background(&mut surface, AudioFrame::SILENT);
        assert_eq!(ok_probe.renders.get(), 1);
        assert_eq!(surface.save_depth(), 0);
    }

    #[test]
    fn reset_all_clears_budget_history_and_animation_state() {
        let mut composer = composer_with_builtins();
        let probe = Probe::default();
        composer.add_lyric_effect(Box::new(StubLyric::new(probe.clone())));
        composer.enable_frame_budget(60.0);
        composer.begin_frame();
        composer.end_frame();
        assert_eq!(composer.frame_stats().unwrap().total_frames, 1);

        composer.reset_all();
        assert_eq!(composer.frame_stats().unwrap().total_frames, 0);
        assert_eq!(probe.resets.get(), 1);
    }

    #[test]
    fn first_lyric_effect_renders_even_when_budget_exhausted() {
        let mut composer = composer_with_builtins();
        let first = Probe::default();
        let second = Probe::default();
        let mut expensive = StubLyric::new(first.clone());
        expensive.cost = 1000.0;
        composer.add_lyric_effect(Box::new(expensive));
        let mut also_expensive = StubLyric::new(second.clone());
        also_expensive.cost = 1000.0;
        composer.add_lyric_effect(Box::new(also_expensive));

        composer.enable_frame_budget(60.0);
        let mut surface = RecordingSurface::new(800.0, 600.0);
        composer.begin_frame();
        composer.render_lyric(&mut surface, "line", 0.0, AudioFrame::SILENT);
        composer.end_frame();

        assert_eq!(first.renders.get(), 1, "primary never skipped");
        assert_eq!(second.renders.get(), 0, "embellishment skipped");
    }

    #[test]
    fn background_effects_skip_individually_under_budget() {
        let mut composer = composer_with_builtins();
        composer.set_background_effects(&[
            EffectInstanceConfig::new("gradient_wash"),
            EffectInstanceConfig::new("particle_field"),
        ]);
        composer.enable_frame_budget(60.0);

        let mut surface = RecordingSurface::new(800.0, 600.0);
        composer.begin_frame();
        composer.render_background(&mut surface, AudioFrame::SILENT);
        composer.end_frame();
        // A fresh frame admits both cheap builtins.
        assert!(!surface.ops().is_empty());
        assert_eq!(surface.save_depth(), 0);
    }

    #[test]
    fn no_budget_means_full_quality_and_no_skips() {
        let composer = composer_with_builtins();
        assert_eq!(composer.quality_level(), 1.0);
        assert!(composer.frame_stats().is_none());
    }

    #[test]
    fn line_change_resets_lyric_effects() {
        let mut composer = composer_with_builtins();
        let probe = Probe::default();
        composer.add_lyric_effect(Box::new(StubLyric::new(probe.clone())));
        let mut surface = RecordingSurface::new(800.0, 600.0);

        composer.render_lyric(&mut surface, "first line", 0.0, AudioFrame::SILENT);
        composer.render_lyric(&mut surface, "first line", 0.5, AudioFrame::SILENT);
        composer.render_lyric(&mut surface, "second line", 0.0, AudioFrame::SILENT);
        // Once for the initial line, once for the change.
        assert_eq!(probe.resets.get(), 2);
    }

    #[test]
    fn update_parameters_reaches_live_effect_and_config() {
        let mut composer = composer_with_builtins();
        composer.set_background_effects(&[EffectInstanceConfig::new("particle_field")]);

        let mut params = ParamMap::new();
        params.insert("count".into(), ParamValue::Number(50.0));
        assert!(composer.update_effect_parameters("particle_field", &params));

        let configs = composer.snapshot_configs();
        assert_eq!(configs[0].parameters["count"], ParamValue::Number(50.0));
    }

    #[test]
    fn update_parameters_for_unknown_id_is_false() {
        let mut composer = composer_with_builtins();
        let params = ParamMap::new();
        assert!(!composer.update_effect_parameters("nope", &params));
    }

    #[test]
    fn remove_effect_deactivates_and_reports() {
        let mut composer = composer_with_builtins();
        let probe = Probe::default();
        composer.add_lyric_effect(Box::new(StubLyric::new(probe.clone())));
        assert!(composer.remove_effect("stub_lyric"));
        assert_eq!(probe.deactivated.get(), 1);
        assert!(!composer.remove_effect("stub_lyric"));
    }

    #[test]
    fn clear_effects_is_idempotent() {
        let mut composer = composer_with_builtins();
        let probe = Probe::default();
        composer.add_lyric_effect(Box::new(StubLyric::new(probe.clone())));
        composer.set_background_effects(&[EffectInstanceConfig::new("gradient_wash")]);

        composer.clear_effects();
        composer.clear_effects();
        assert_eq!(probe.deactivated.get(), 1);
        assert!(composer.lyric_effect_ids().is_empty());
        assert!(composer.background_effect_ids().is_empty());
    }

    #[test]
    fn config_overrides_are_sanitized_on_instantiation() {
        let mut composer = composer_with_builtins();
        // count is a slider; an absurd value clamps to the schema max.
        composer.set_background_effects(&[
            EffectInstanceConfig::new("particle_field")
                .with_param("count", ParamValue::Number(1e9)),
        ]);
        let configs = composer.snapshot_configs();
        assert_eq!(configs.len(), 1);
        // The live effect saw a clamped value even though the config
        // snapshot keeps the host's raw override.
        let mut surface = RecordingSurface::new(200.0, 100.0);
        composer.render_background(&mut surface, AudioFrame::SILENT);
        assert!(surface.fill_circle_count() <= 1000);
    }
}
