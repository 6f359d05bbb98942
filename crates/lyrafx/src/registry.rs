#![forbid(unsafe_code)]

//! The effect catalog: stable id → constructor + descriptive metadata.
//!
//! Registration happens once at process start from a fixed list of
//! built-in effect types (see [`crate::effects::register_builtins`]);
//! nothing is discovered dynamically. Metadata is captured from a
//! throwaway probe instance at registration time, so the descriptor is
//! always consistent with what the constructor actually builds.
//!
//! Unknown ids are a non-fatal configuration error: `create_*` logs a
//! warning and returns `None`, and the caller skips that effect.

use tracing::warn;

use crate::effect::{BackgroundEffect, Effect, EffectCategory, LyricEffect};

/// Constructor for a lyric effect.
pub type LyricCtor = fn() -> Box<dyn LyricEffect>;
/// Constructor for a background effect.
pub type BackgroundCtor = fn() -> Box<dyn BackgroundEffect>;

/// Category-tagged constructor, so a lyric id can never be instantiated
/// into a background slot.
#[derive(Clone, Copy)]
enum EffectCtor {
    Lyric(LyricCtor),
    Background(BackgroundCtor),
}

/// Immutable descriptive metadata for one registered effect type.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectDescriptor {
    pub id: String,
    pub display_name: String,
    pub category: EffectCategory,
    pub tags: Vec<String>,
}

/// Optional overrides applied at registration time.
///
/// The id and category always come from the effect itself.
#[derive(Debug, Clone, Default)]
pub struct DescriptorOverrides {
    pub display_name: Option<String>,
    pub tags: Option<Vec<String>>,
}

struct Entry {
    descriptor: EffectDescriptor,
    ctor: EffectCtor,
}

/// Catalog of registered effect types.
///
/// A plain value with no global state; construct one per composer (or per
/// test) and fill it with an explicit registration list.
#[derive(Default)]
pub struct EffectRegistry {
    // Registration order is preserved; the catalog is small (a fixed
    // built-in list), so lookups are linear scans.
    entries: Vec<Entry>,
}

impl EffectRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a lyric effect constructor.
    pub fn register_lyric(&mut self, ctor: LyricCtor, overrides: DescriptorOverrides) {
        let probe = ctor();
        let descriptor = Self::describe(probe.as_ref(), overrides);
        self.insert(descriptor, EffectCtor::Lyric(ctor));
    }

    /// Register a background effect constructor.
    pub fn register_background(&mut self, ctor: BackgroundCtor, overrides: DescriptorOverrides) {
        let probe = ctor();
        let descriptor = Self::describe(probe.as_ref(), overrides);
        self.insert(descriptor, EffectCtor::Background(ctor));
    }

    fn describe<E: Effect + ?Sized>(probe: &E, overrides: DescriptorOverrides) -> EffectDescriptor {
        EffectDescriptor {
            id: probe.id().to_string(),
            display_name: overrides
                .display_name
                .unwrap_or_else(|| probe.display_name().to_string()),
            category: probe.category(),
            tags: overrides
                .tags
                .unwrap_or_else(|| probe.tags().iter().map(|t| t.to_string()).collect()),
        }
    }

    fn insert(&mut self, descriptor: EffectDescriptor, ctor: EffectCtor) {
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|e| e.descriptor.id == descriptor.id)
        {
            warn!(id = %descriptor.id, "effect id registered twice, replacing");
            existing.descriptor = descriptor;
            existing.ctor = ctor;
        } else {
            self.entries.push(Entry { descriptor, ctor });
        }
    }

    fn entry(&self, id: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.descriptor.id == id)
    }

    /// Instantiate a fresh lyric effect and run its `init()`.
    ///
    /// Returns `None` (with a warning logged) for unknown ids or ids
    /// registered in the background category; callers treat absence as
    /// "skip this effect".
    pub fn create_lyric(&self, id: &str) -> Option<Box<dyn LyricEffect>> {
        match self.entry(id).map(|e| e.ctor) {
            Some(EffectCtor::Lyric(ctor)) => {
                let mut effect = ctor();
                effect.init();
                Some(effect)
            }
            Some(EffectCtor::Background(_)) => {
                warn!(id, "effect is registered as background, not lyric");
                None
            }
            None => {
                warn!(id, "unknown lyric effect id");
                None
            }
        }
    }

    /// Instantiate a fresh background effect and run its `init()`.
    ///
    /// Same absence semantics as [`create_lyric`](Self::create_lyric).
    pub fn create_background(&self, id: &str) -> Option<Box<dyn BackgroundEffect>> {
        match self.entry(id).map(|e| e.ctor) {
            Some(EffectCtor::Background(ctor)) => {
                let mut effect = ctor();
                effect.init();
                Some(effect)
            }
            Some(EffectCtor::Lyric(_)) => {
                warn!(id, "effect is registered as lyric, not background");
                None
            }
            None => {
                warn!(id, "unknown background effect id");
                None
            }
        }
    }

    /// Metadata for one id.
    pub fn metadata(&self, id: &str) -> Option<&EffectDescriptor> {
        self.entry(id).map(|e| &e.descriptor)
    }

    /// All descriptors, in registration order.
    pub fn all(&self) -> impl Iterator<Item = &EffectDescriptor> {
        self.entries.iter().map(|e| &e.descriptor)
    }

    /// Descriptors in one category, in registration order.
    pub fn by_category(
        &self,
        category: EffectCategory,
    ) -> impl Iterator<Item = &EffectDescriptor> {
        self.all().filter(move |d| d.category == category)
    }

    /// Descriptors carrying a tag, in registration order.
    pub fn by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a EffectDescriptor> {
        self.all().filter(move |d| d.tags.iter().any(|t| t == tag))
    }

    /// Number of registered effect types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for EffectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectRegistry")
            .field("ids", &self.all().map(|d| d.id.as_str()).collect::<Vec<_>>())
            .finish()
    }
}
