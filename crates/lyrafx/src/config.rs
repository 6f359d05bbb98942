#![forbid(unsafe_code)]

//! Persisted per-instance effect configuration.
//!
//! Config lists are owned by an external settings store; the composer
//! treats them as inputs to `set_lyric_effects`/`set_background_effects`
//! and never persists them itself. Array position encodes render order
//! and, for lyric effects, draw priority.

use lyrafx_core::params::{ParamMap, ParamValue};

/// One configured effect instance.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectInstanceConfig {
    /// Registry id of the effect to instantiate.
    pub effect_id: String,
    /// Parameter overrides; keys missing here fall back to schema defaults.
    #[cfg_attr(feature = "serde", serde(default))]
    pub parameters: ParamMap,
    /// Disabled configs are skipped entirely — not instantiated at all.
    #[cfg_attr(feature = "serde", serde(default = "default_enabled"))]
    pub enabled: bool,
}

#[cfg(feature = "serde")]
fn default_enabled() -> bool {
    true
}

impl EffectInstanceConfig {
    /// An enabled config with schema-default parameters.
    pub fn new(effect_id: impl Into<String>) -> Self {
        Self {
            effect_id: effect_id.into(),
            parameters: ParamMap::new(),
            enabled: true,
        }
    }

    /// Builder-style parameter override.
    pub fn with_param(mut self, key: impl Into<String>, value: ParamValue) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    /// Builder-style enabled flag.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}
