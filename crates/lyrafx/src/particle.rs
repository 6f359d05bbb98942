#![forbid(unsafe_code)]

//! Reusable particles with bounded trail history and an O(1) pool.
//!
//! Particles are never individually allocated or freed in steady state:
//! the pool hands out storage with [`ParticlePool::acquire`] and reclaims
//! it with a swap-with-last [`ParticlePool::release`]. Trail history is a
//! fixed-capacity ring buffer with a logical limit separate from physical
//! capacity, so per-frame intensity changes never reallocate — only a
//! growing physical capacity does.

use lyrafx_core::color::Rgba;
use lyrafx_core::geometry::{Point, Size, wrap_coord};
use lyrafx_render::surface::Surface;

/// Hard ceiling on pool growth.
pub const MAX_CAPACITY: usize = 1000;

/// Margin (surface units) a particle travels past an edge before it
/// reappears on the opposite side.
const WRAP_MARGIN: f32 = 16.0;

// ---------------------------------------------------------------------------
// Trail
// ---------------------------------------------------------------------------

/// Ring buffer of recent positions.
///
/// `limit` is the logical capacity (recomputed by the owner every frame
/// from intensity and speed); `buf` is physical storage that only grows.
/// While below the limit, pushes append; at the limit, pushes overwrite
/// the oldest slot. Shrinking the limit drops the oldest entries.
#[derive(Debug, Clone, Default)]
pub struct Trail {
    buf: Vec<Point>,
    /// Index of the oldest valid entry (always `< limit` when non-empty).
    head: usize,
    len: usize,
    limit: usize,
}

impl Trail {
    /// An empty trail with no storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of valid history points.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the trail holds no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The current logical limit.
    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Physical storage capacity (grow-only).
    #[inline]
    pub fn physical_capacity(&self) -> usize {
        self.buf.len()
    }

    /// Set the logical limit, dropping the oldest entries if it shrank.
    ///
    /// Storage is only reallocated when the limit exceeds physical
    /// capacity.
    pub fn set_limit(&mut self, new_limit: usize) {
        if new_limit == self.limit {
            return;
        }

        // Normalize so oldest..newest occupy buf[0..len]; all ring
        // arithmetic is modulo the limit, which is about to change.
        if self.limit > 0 && self.len > 0 {
            self.buf[..self.limit].rotate_left(self.head);
            self.head = 0;
            if self.len > new_limit {
                let drop = self.len - new_limit;
                self.buf.copy_within(drop..self.len, 0);
                self.len = new_limit;
            }
        }
        if new_limit == 0 {
            self.len = 0;
            self.head = 0;
        }

        self.limit = new_limit;
        if self.buf.len() < new_limit {
            self.buf.resize(new_limit, Point::ZERO);
        }
    }

    /// Append a point, overwriting the oldest once at the limit.
    pub fn push(&mut self, p: Point) {
        if self.limit == 0 {
            return;
        }
        if self.len < self.limit {
            let idx = (self.head + self.len) % self.limit;
            self.buf[idx] = p;
            self.len += 1;
        } else {
            self.buf[self.head] = p;
            self.head = (self.head + 1) % self.limit;
        }
    }

    /// Drop all history; counters reset to zero. Storage is kept.
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Iterate points oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = Point> + '_ {
        (0..self.len).map(move |i| self.buf[(self.head + i) % self.limit.max(1)])
    }
}

// ---------------------------------------------------------------------------
// Particle
// ---------------------------------------------------------------------------

/// Caller-supplied per-frame update inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleUpdate {
    /// Seconds since the previous frame.
    pub dt: f32,
    /// Drawing-surface bounds for toroidal wrapping.
    pub bounds: Size,
    /// Base velocity multiplier (effect speed parameter).
    pub speed_multiplier: f32,
    /// Frequency-derived addition to velocity, in `[0, 1]`.
    pub motion_boost: f32,
    /// Frequency-derived addition to size, in `[0, 1]`.
    pub pulse_boost: f32,
    /// Whether trail history is recorded this frame.
    pub trails: bool,
    /// Trail intensity in `[0, 1]`; drives the trail length limit.
    pub trail_intensity: f32,
}

impl Default for ParticleUpdate {
    fn default() -> Self {
        Self {
            dt: 1.0 / 60.0,
            bounds: Size::new(0.0, 0.0),
            speed_multiplier: 1.0,
            motion_boost: 0.0,
            pulse_boost: 0.0,
            trails: false,
            trail_intensity: 0.5,
        }
    }
}

/// A reusable moving visual element.
#[derive(Debug, Clone, Default)]
pub struct Particle {
    pub pos: Point,
    /// Size before audio-driven pulsing.
    pub base_size: f32,
    /// Size after pulsing; recomputed every update.
    pub size: f32,
    /// Velocity in surface units per second.
    pub speed_x: f32,
    pub speed_y: f32,
    pub color: Rgba,
    pub rotation: f32,
    /// Radians per second.
    pub rotation_speed: f32,
    /// Remaining life in `[0, 1]`; scales draw alpha.
    pub life: f32,
    pub opacity: f32,
    trail: Trail,
}

/// Trail length limit for a given intensity and speed multiplier.
#[inline]
pub fn trail_limit(intensity: f32, speed_multiplier: f32) -> usize {
    (5.0 + 15.0 * intensity * speed_multiplier).max(0.0) as usize
}

impl Particle {
    /// Advance position, rotation, size, and trail history by one frame.
    pub fn update(&mut self, u: &ParticleUpdate) {
        let boost = 1.0 + u.motion_boost;
        let step = u.speed_multiplier * boost * u.dt;
        self.pos.x += self.speed_x * step;
        self.pos.y += self.speed_y * step;
        self.rotation += self.rotation_speed * u.dt;

        self.pos.x = wrap_coord(self.pos.x, u.bounds.width, WRAP_MARGIN);
        self.pos.y = wrap_coord(self.pos.y, u.bounds.height, WRAP_MARGIN);

        self.size = self.base_size * (1.0 + u.pulse_boost);

        if u.trails {
            self.trail
                .set_limit(trail_limit(u.trail_intensity, u.speed_multiplier));
            self.trail.push(self.pos);
        } else {
            self.trail.clear();
            self.trail.set_limit(0);
        }
    }

    /// Paint the trail (oldest to newest) and then the particle body.
    ///
    /// Global draw alpha is `opacity × life`; a fully faded particle
    /// draws nothing.
    pub fn draw(&self, surface: &mut dyn Surface) {
        let alpha = (self.opacity * self.life).clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        surface.set_alpha(alpha);

        let n = self.trail.len();
        if n > 1 {
            surface.set_stroke(self.color);
            let mut prev: Option<Point> = None;
            for (i, p) in self.trail.iter().enumerate() {
                if let Some(from) = prev {
                    // Older segments are thinner and fainter.
                    let t = i as f32 / n as f32;
                    surface.set_line_width((self.size * 0.5 * t).max(0.5));
                    surface.set_alpha(alpha * t);
                    surface.stroke_line(from, p);
                }
                prev = Some(p);
            }
            surface.set_alpha(alpha);
        }

        surface.set_fill(self.color);
        surface.fill_circle(self.pos, self.size.max(0.5) / 2.0);
    }

    /// Read-only view of the trail history.
    pub fn trail(&self) -> &Trail {
        &self.trail
    }
}

// ---------------------------------------------------------------------------
// ParticlePool
// ---------------------------------------------------------------------------

/// Deterministic xorshift32 PRNG.
#[inline]
fn xorshift32(state: &mut u32) -> u32 {
    let mut x = *state;
    x ^= x << 13;
    x ^= x >> 17;
    x ^= x << 5;
    *state = x;
    x
}

#[inline]
fn rand_unit(state: &mut u32) -> f32 {
    (xorshift32(state) >> 8) as f32 / (1u32 << 24) as f32
}

/// Preallocated contiguous particle store with an active-count cursor.
///
/// Particles at index `< active_count` are live; the rest are reusable
/// storage. `acquire` is O(1) and allocation-free below capacity; the pool
/// grows monotonically up to [`MAX_CAPACITY`] and never shrinks.
#[derive(Debug, Clone)]
pub struct ParticlePool {
    particles: Vec<Particle>,
    active: usize,
    bounds: Size,
    palette: Vec<Rgba>,
    rng: u32,
}

impl ParticlePool {
    /// Preallocate `initial_size` particles (clamped to [`MAX_CAPACITY`]).
    pub fn new(initial_size: usize, bounds: Size) -> Self {
        let initial = initial_size.min(MAX_CAPACITY);
        Self {
            particles: vec![Particle::default(); initial],
            active: 0,
            bounds,
            palette: vec![Rgba::WHITE],
            rng: 0x9e37_79b9,
        }
    }

    /// Number of live particles.
    #[inline]
    pub fn active_count(&self) -> usize {
        self.active
    }

    /// Currently allocated storage (grows monotonically).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.particles.len()
    }

    /// Live particles, in slot order.
    #[inline]
    pub fn active(&self) -> &[Particle] {
        &self.particles[..self.active]
    }

    /// Mutable live particles, in slot order.
    #[inline]
    pub fn active_mut(&mut self) -> &mut [Particle] {
        &mut self.particles[..self.active]
    }

    /// Take a particle from the pool, respawned with fresh state.
    ///
    /// Returns `None` when the pool is at [`MAX_CAPACITY`] — an expected,
    /// recoverable condition: the caller simply spawns nothing this frame.
    pub fn acquire(&mut self) -> Option<&mut Particle> {
        if self.active == self.particles.len() {
            if self.particles.len() >= MAX_CAPACITY {
                return None;
            }
            self.particles.push(Particle::default());
        }
        let idx = self.active;
        self.active += 1;
        self.respawn(idx);
        Some(&mut self.particles[idx])
    }

    /// Return a live particle (by index into the active range) to storage.
    ///
    /// O(1) swap-with-last, not an ordered removal. Indices outside the
    /// active range are a no-op.
    pub fn release(&mut self, index: usize) -> bool {
        if index >= self.active {
            return false;
        }
        self.particles.swap(index, self.active - 1);
        self.active -= 1;
        true
    }

    /// Release the most recently positioned live particle, if any.
    pub fn release_last(&mut self) -> bool {
        if self.active == 0 {
            return false;
        }
        self.active -= 1;
        true
    }

    /// Update surface bounds for subsequently-acquired particles.
    ///
    /// Already-active particles keep their positions; the next `update`
    /// wraps them into the new bounds.
    pub fn resize(&mut self, bounds: Size) {
        self.bounds = bounds;
    }

    /// Replace the color palette used for subsequently-acquired particles.
    ///
    /// An empty palette falls back to white.
    pub fn set_palette(&mut self, palette: &[Rgba]) {
        if palette.is_empty() {
            self.palette = vec![Rgba::WHITE];
        } else {
            self.palette = palette.to_vec();
        }
    }

    fn respawn(&mut self, idx: usize) {
        let w = self.bounds.width.max(1.0);
        let h = self.bounds.height.max(1.0);
        let color = self.palette[xorshift32(&mut self.rng) as usize % self.palette.len()];
        let p = &mut self.particles[idx];
        p.pos = Point::new(rand_unit(&mut self.rng) * w, rand_unit(&mut self.rng) * h);
        p.base_size = 1.0 + rand_unit(&mut self.rng) * 3.0;
        p.size = p.base_size;
        p.speed_x = (rand_unit(&mut self.rng) - 0.5) * 40.0;
        p.speed_y = (rand_unit(&mut self.rng) - 0.5) * 40.0;
        p.color = color;
        p.rotation = rand_unit(&mut self.rng) * std::f32::consts::TAU;
        p.rotation_speed = (rand_unit(&mut self.rng) - 0.5) * 2.0;
        p.life = 1.0;
        p.opacity = 0.5 + rand_unit(&mut self.rng) * 0.5;
        p.trail.clear();
        p.trail.set_limit(0);
    }
}
