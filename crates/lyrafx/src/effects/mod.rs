#![forbid(unsafe_code)]

//! Built-in effects shipped with the engine.
//!
//! Background: [`gradient_wash`] (cheap ambient color) and
//! [`particle_field`] (pooled audio-reactive particles). Lyric:
//! [`glow_line`] (layered glow text) and [`wave_line`] (per-character
//! wave motion). Hosts register their own effects alongside these.

use crate::registry::{DescriptorOverrides, EffectRegistry};

pub mod glow_line;
pub mod gradient_wash;
pub mod particle_field;
pub mod wave_line;

/// Register every built-in effect type.
pub fn register_builtins(registry: &mut EffectRegistry) {
    registry.register_background(gradient_wash::construct, DescriptorOverrides::default());
    registry.register_background(particle_field::construct, DescriptorOverrides::default());
    registry.register_lyric(glow_line::construct, DescriptorOverrides::default());
    registry.register_lyric(wave_line::construct, DescriptorOverrides::default());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_all_builtins() {
        let mut r = EffectRegistry::new();
        register_builtins(&mut r);
        assert_eq!(r.len(), 4);
        for id in ["gradient_wash", "particle_field", "glow_line", "wave_line"] {
            assert!(r.metadata(id).is_some(), "missing builtin {id}");
        }
    }
}
