#![forbid(unsafe_code)]

//! Per-frame audio-derived signals.
//!
//! The audio-analysis collaborator lives outside this engine; it hands us
//! one [`AudioFrame`] per display frame. Effects treat the fields as plain
//! numeric inputs and never touch audio buffers themselves.

/// Audio signals for a single display frame.
///
/// Band amplitudes are normalized to `[0, 1]`. A frame with no audio
/// playing is all zeros (the default), which effects must render sensibly.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AudioFrame {
    /// Low-frequency band amplitude.
    pub bass: f32,
    /// Mid-frequency band amplitude.
    pub mid: f32,
    /// High-frequency band amplitude.
    pub treble: f32,
    /// Average amplitude across all bands.
    pub average: f32,
    /// Whether a beat landed on this frame.
    pub beat: bool,
    /// Beat strength in `[0, 1]`; 0 when `beat` is false.
    pub beat_strength: f32,
}

impl AudioFrame {
    /// A silent frame (all signals zero).
    pub const SILENT: Self = Self {
        bass: 0.0,
        mid: 0.0,
        treble: 0.0,
        average: 0.0,
        beat: false,
        beat_strength: 0.0,
    };

    /// Build a frame from band amplitudes, clamping into `[0, 1]`.
    pub fn from_bands(bass: f32, mid: f32, treble: f32) -> Self {
        let bass = bass.clamp(0.0, 1.0);
        let mid = mid.clamp(0.0, 1.0);
        let treble = treble.clamp(0.0, 1.0);
        Self {
            bass,
            mid,
            treble,
            average: (bass + mid + treble) / 3.0,
            beat: false,
            beat_strength: 0.0,
        }
    }

    /// Mark this frame as carrying a beat of the given strength.
    pub fn with_beat(mut self, strength: f32) -> Self {
        self.beat = true;
        self.beat_strength = strength.clamp(0.0, 1.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_is_default() {
        assert_eq!(AudioFrame::SILENT, AudioFrame::default());
    }

    #[test]
    fn from_bands_clamps_and_averages() {
        let f = AudioFrame::from_bands(2.0, 0.5, -1.0);
        assert_eq!(f.bass, 1.0);
        assert_eq!(f.treble, 0.0);
        assert!((f.average - 0.5).abs() < 1e-6);
        assert!(!f.beat);
    }

    #[test]
    fn with_beat_clamps_strength() {
        let f = AudioFrame::SILENT.with_beat(1.5);
        assert!(f.beat);
        assert_eq!(f.beat_strength, 1.0);
    }
}
