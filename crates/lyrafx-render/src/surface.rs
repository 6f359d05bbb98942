#![forbid(unsafe_code)]

//! Immediate-mode drawing surface abstraction.
//!
//! The host owns the real surface (a canvas, a GPU-backed 2D context, a
//! software rasterizer); this trait is the seam the engine draws through.
//! Transform, style, and alpha form a state stack driven by
//! [`Surface::save`]/[`Surface::restore`] so the composer can isolate one
//! effect's state from the next.
//!
//! [`RecordingSurface`] is the headless test double: it records every call
//! as a [`DrawOp`] so tests can assert on what was drawn without a real
//! rendering backend.

use lyrafx_core::color::Rgba;
use lyrafx_core::geometry::{Point, Rect, Size};

/// Font weight for text drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

/// A font selection for text drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    /// Size in surface units (pixels).
    pub size: f32,
    pub weight: FontWeight,
}

impl FontSpec {
    pub fn new(family: impl Into<String>, size: f32) -> Self {
        Self {
            family: family.into(),
            size,
            weight: FontWeight::Normal,
        }
    }

    pub fn bold(family: impl Into<String>, size: f32) -> Self {
        Self {
            family: family.into(),
            size,
            weight: FontWeight::Bold,
        }
    }
}

impl Default for FontSpec {
    fn default() -> Self {
        Self::new("sans-serif", 16.0)
    }
}

/// Measured extents of a piece of text under the current font.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextMetrics {
    pub width: f32,
    pub ascent: f32,
    pub descent: f32,
}

/// An immediate-mode 2D drawing surface.
///
/// Implementations must keep transform, fill/stroke style, global alpha,
/// and font as part of the save/restore stack. Draw calls take effect
/// immediately; there is no retained scene.
pub trait Surface {
    /// Current drawable size in surface units.
    fn size(&self) -> Size;

    /// Push the current transform/style state.
    fn save(&mut self);
    /// Pop back to the most recently saved state. A restore with no
    /// matching save is a no-op.
    fn restore(&mut self);

    fn translate(&mut self, dx: f32, dy: f32);
    fn rotate(&mut self, radians: f32);
    fn scale(&mut self, sx: f32, sy: f32);

    fn set_fill(&mut self, color: Rgba);
    fn set_stroke(&mut self, color: Rgba);
    fn set_line_width(&mut self, width: f32);
    /// Global alpha multiplier in `[0, 1]`, applied to all draws.
    fn set_alpha(&mut self, alpha: f32);
    fn set_font(&mut self, font: &FontSpec);

    /// Fill the whole surface with a color, ignoring the current transform.
    fn clear(&mut self, color: Rgba);
    fn fill_rect(&mut self, rect: Rect);
    fn fill_circle(&mut self, center: Point, radius: f32);
    fn stroke_circle(&mut self, center: Point, radius: f32);
    fn stroke_line(&mut self, from: Point, to: Point);

    /// Draw filled text with its baseline-left corner at `at`.
    fn fill_text(&mut self, text: &str, at: Point);
    /// Draw stroked (outline) text with its baseline-left corner at `at`.
    fn stroke_text(&mut self, text: &str, at: Point);
    /// Measure text under the current font.
    fn measure_text(&self, text: &str) -> TextMetrics;
}

/// Run `f` inside a save/restore scope on `surface`.
///
/// The composer wraps every effect render in one of these so an effect's
/// transform/style state cannot leak into the next effect.
#[inline]
pub fn with_scope<S: Surface + ?Sized, R>(surface: &mut S, f: impl FnOnce(&mut S) -> R) -> R {
    surface.save();
    let out = f(surface);
    surface.restore();
    out
}

// ---------------------------------------------------------------------------
// RecordingSurface
// ---------------------------------------------------------------------------

/// One recorded surface call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Save,
    Restore,
    Translate { dx: f32, dy: f32 },
    Rotate { radians: f32 },
    Scale { sx: f32, sy: f32 },
    SetFill(Rgba),
    SetStroke(Rgba),
    SetLineWidth(f32),
    SetAlpha(f32),
    SetFont(FontSpec),
    Clear(Rgba),
    FillRect(Rect),
    FillCircle { center: Point, radius: f32 },
    StrokeCircle { center: Point, radius: f32 },
    StrokeLine { from: Point, to: Point },
    FillText { text: String, at: Point },
    StrokeText { text: String, at: Point },
}

/// Headless surface that records draw calls for tests.
///
/// Text measurement uses a fixed per-character advance of 0.6 × font size,
/// which is stable and good enough for layout assertions.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    size: Size,
    font_size: f32,
    save_depth: usize,
    ops: Vec<DrawOp>,
}

impl RecordingSurface {
    /// Create a recording surface with the given drawable size.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Size::new(width, height),
            font_size: FontSpec::default().size,
            save_depth: 0,
            ops: Vec::new(),
        }
    }

    /// All recorded operations, in call order.
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Drop all recorded operations (size and state are kept).
    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    /// Current save/restore nesting depth.
    pub fn save_depth(&self) -> usize {
        self.save_depth
    }

    /// Count recorded ops matching a predicate.
    pub fn count(&self, pred: impl Fn(&DrawOp) -> bool) -> usize {
        self.ops.iter().filter(|op| pred(op)).count()
    }

    /// Number of `FillText` ops recorded.
    pub fn fill_text_count(&self) -> usize {
        self.count(|op| matches!(op, DrawOp::FillText { .. }))
    }

    /// Number of `FillCircle` ops recorded.
    pub fn fill_circle_count(&self) -> usize {
        self.count(|op| matches!(op, DrawOp::FillCircle { .. }))
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> Size {
        self.size
    }

    fn save(&mut self) {
        self.save_depth += 1;
        self.ops.push(DrawOp::Save);
    }

    fn restore(&mut self) {
        if self.save_depth == 0 {
            return;
        }
        self.save_depth -= 1;
        self.ops.push(DrawOp::Restore);
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.ops.push(DrawOp::Translate { dx, dy });
    }

    fn rotate(&mut self, radians: f32) {
        self.ops.push(DrawOp::Rotate { radians });
    }

    fn scale(&mut self, sx: f32, sy: f32) {
        self.ops.push(DrawOp::Scale { sx, sy });
    }

    fn set_fill(&mut self, color: Rgba) {
        self.ops.push(DrawOp::SetFill(color));
    }

    fn set_stroke(&mut self, color: Rgba) {
        self.ops.push(DrawOp::SetStroke(color));
    }

    fn set_line_width(&mut self, width: f32) {
        self.ops.push(DrawOp::SetLineWidth(width));
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.ops.push(DrawOp::SetAlpha(alpha.clamp(0.0, 1.0)));
    }

    fn set_font(&mut self, font: &FontSpec) {
        self.font_size = font.size;
        self.ops.push(DrawOp::SetFont(font.clone()));
    }

    fn clear(&mut self, color: Rgba) {
        self.ops.push(DrawOp::Clear(color));
    }

    fn fill_rect(&mut self, rect: Rect) {
        self.ops.push(DrawOp::FillRect(rect));
    }

    fn fill_circle(&mut self, center: Point, radius: f32) {
        self.ops.push(DrawOp::FillCircle { center, radius });
    }

    fn stroke_circle(&mut self, center: Point, radius: f32) {
        self.ops.push(DrawOp::StrokeCircle { center, radius });
    }

    fn stroke_line(&mut self, from: Point, to: Point) {
        self.ops.push(DrawOp::StrokeLine { from, to });
    }

    fn fill_text(&mut self, text: &str, at: Point) {
        self.ops.push(DrawOp::FillText {
            text: text.to_string(),
            at,
        });
    }

    fn stroke_text(&mut self, text: &str, at: Point) {
        self.ops.push(DrawOp::StrokeText {
            text: text.to_string(),
            at,
        });
    }

    fn measure_text(&self, text: &str) -> TextMetrics {
        TextMetrics {
            width: text.chars().count() as f32 * self.font_size * 0.6,
            ascent: self.font_size * 0.8,
            descent: self.font_size * 0.2,
        }
    }
}
