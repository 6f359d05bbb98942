#![forbid(unsafe_code)]

//! Parameter schemas for effects.
//!
//! Every effect declares an ordered list of [`ParamSpec`]s. The schema is
//! purely descriptive: it is used to derive default values, to drive an
//! external settings UI, and to clamp/validate incoming values before they
//! reach the effect. Values that fail validation are dropped silently;
//! configuration errors are never fatal.

use std::collections::BTreeMap;

use crate::color::Rgba;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The kind of a single parameter, with its default baked in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    /// A numeric slider with inclusive bounds.
    Slider {
        min: f64,
        max: f64,
        step: f64,
        default: f64,
        /// Display unit for UI ("px", "ms", "%", or empty).
        unit: &'static str,
    },
    /// A color picker.
    Color { default: Rgba },
    /// One of a fixed set of options. The first option is the default.
    Choice { options: &'static [&'static str] },
    /// An on/off switch.
    Toggle { default: bool },
}

/// A single named parameter in an effect's schema.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    /// Stable key used in persisted configs.
    pub key: &'static str,
    /// Human-readable label for UI.
    pub label: &'static str,
    pub kind: ParamKind,
}

impl ParamSpec {
    /// The default value derived from the kind.
    pub fn default_value(&self) -> ParamValue {
        match self.kind {
            ParamKind::Slider { default, .. } => ParamValue::Number(default),
            ParamKind::Color { default } => ParamValue::Color(default),
            ParamKind::Choice { options } => {
                ParamValue::Choice(options.first().copied().unwrap_or("").to_string())
            }
            ParamKind::Toggle { default } => ParamValue::Flag(default),
        }
    }

    /// Clamp/validate an incoming value against this spec.
    ///
    /// Returns `None` when the value's type does not match the spec or a
    /// choice is not one of the declared options. Sliders are clamped into
    /// `[min, max]`; color strings in persisted configs are parsed by the
    /// caller before reaching this point.
    pub fn sanitize(&self, value: &ParamValue) -> Option<ParamValue> {
        match (self.kind, value) {
            (ParamKind::Slider { min, max, .. }, ParamValue::Number(n)) => {
                Some(ParamValue::Number(n.clamp(min, max)))
            }
            (ParamKind::Color { .. }, ParamValue::Color(c)) => Some(ParamValue::Color(*c)),
            (ParamKind::Choice { options }, ParamValue::Choice(s)) => {
                options.contains(&s.as_str()).then(|| value.clone())
            }
            (ParamKind::Toggle { .. }, ParamValue::Flag(b)) => Some(ParamValue::Flag(*b)),
            _ => None,
        }
    }
}

/// A runtime parameter value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ParamValue {
    Number(f64),
    Color(Rgba),
    Choice(String),
    Flag(bool),
}

impl ParamValue {
    /// The numeric value, if this is a `Number`.
    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The color value, if this is a `Color`.
    #[inline]
    pub fn as_color(&self) -> Option<Rgba> {
        match self {
            Self::Color(c) => Some(*c),
            _ => None,
        }
    }

    /// The selected option, if this is a `Choice`.
    #[inline]
    pub fn as_choice(&self) -> Option<&str> {
        match self {
            Self::Choice(s) => Some(s),
            _ => None,
        }
    }

    /// The boolean value, if this is a `Flag`.
    #[inline]
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            _ => None,
        }
    }
}

/// Current parameter values keyed by spec key.
pub type ParamMap = BTreeMap<String, ParamValue>;

/// An ordered parameter schema.
#[derive(Debug, Clone, Default)]
pub struct ParamSchema {
    specs: Vec<ParamSpec>,
}

impl ParamSchema {
    /// An empty schema (effect with no tunable parameters).
    pub const fn empty() -> Self {
        Self { specs: Vec::new() }
    }

    /// Build a schema from an ordered spec list.
    pub fn new(specs: Vec<ParamSpec>) -> Self {
        Self { specs }
    }

    /// The specs, in declaration order.
    #[inline]
    pub fn specs(&self) -> &[ParamSpec] {
        &self.specs
    }

    /// Look up a spec by key.
    pub fn spec(&self, key: &str) -> Option<&ParamSpec> {
        self.specs.iter().find(|s| s.key == key)
    }

    /// Derive the full default value map.
    pub fn defaults(&self) -> ParamMap {
        self.specs
            .iter()
            .map(|s| (s.key.to_string(), s.default_value()))
            .collect()
    }

    /// Merge incoming values into `target`, clamping against the schema.
    ///
    /// Unknown keys and type-mismatched values are dropped. Returns the
    /// number of values actually applied.
    pub fn merge_sanitized(&self, target: &mut ParamMap, incoming: &ParamMap) -> usize {
        let mut applied = 0;
        for (key, value) in incoming {
            let Some(spec) = self.spec(key) else { continue };
            if let Some(clean) = spec.sanitize(value) {
                target.insert(key.clone(), clean);
                applied += 1;
            }
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> ParamSchema {
        ParamSchema::new(vec![
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
                key: "color",
                label: "Color",
                kind: ParamKind::Color {
                    default: Rgba::rgb(255, 255, 255),
                },
            },
            ParamSpec {
                key: "style",
                label: "Style",
                kind: ParamKind::Choice {
                    options: &["smooth", "stepped"],
                },
            },
            ParamSpec {
                key: "trails",
                label: "Trails",
                kind: ParamKind::Toggle { default: true },
            },
        ])
    }

    #[test]
    fn defaults_follow_declaration() {
        let defaults = schema().defaults();
        assert_eq!(defaults["speed"], ParamValue::Number(1.0));
        assert_eq!(defaults["color"], ParamValue::Color(Rgba::WHITE));
        assert_eq!(defaults["style"], ParamValue::Choice("smooth".into()));
        assert_eq!(defaults["trails"], ParamValue::Flag(true));
    }

    #[test]
    fn slider_clamps() {
        let s = schema();
        let spec = s.spec("speed").unwrap();
        assert_eq!(
            spec.sanitize(&ParamValue::Number(99.0)),
            Some(ParamValue::Number(5.0))
        );
        assert_eq!(
            spec.sanitize(&ParamValue::Number(-1.0)),
            Some(ParamValue::Number(0.1))
        );
    }

    #[test]
    fn choice_must_be_declared() {
        let s = schema();
        let spec = s.spec("style").unwrap();
        assert_eq!(spec.sanitize(&ParamValue::Choice("neon".into())), None);
        assert!(spec.sanitize(&ParamValue::Choice("stepped".into())).is_some());
    }

    #[test]
    fn type_mismatch_is_dropped() {
        let s = schema();
        let spec = s.spec("trails").unwrap();
        assert_eq!(spec.sanitize(&ParamValue::Number(1.0)), None);
    }

    #[test]
    fn merge_skips_unknown_keys() {
        let s = schema();
        let mut target = s.defaults();
        let mut incoming = ParamMap::new();
        incoming.insert("speed".into(), ParamValue::Number(2.0));
        incoming.insert("nope".into(), ParamValue::Number(1.0));
        incoming.insert("style".into(), ParamValue::Flag(true));

        let applied = s.merge_sanitized(&mut target, &incoming);
        assert_eq!(applied, 1);
        assert_eq!(target["speed"], ParamValue::Number(2.0));
        assert!(!target.contains_key("nope"));
        assert_eq!(target["style"], ParamValue::Choice("smooth".into()));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn param_value_json_roundtrip() {
        let v = ParamValue::Color(Rgba::rgb(255, 136, 0));
        let json = serde_json::to_string(&v).unwrap();
        assert!(json.contains("#ff8800"));
        let back: ParamValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }
}
