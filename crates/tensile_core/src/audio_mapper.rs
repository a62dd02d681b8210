use crate::emitter::AudioEmitter;
use crate::solver::Peak;

/// Instantaneous gain/pan targets derived from one integration step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AudioTargets {
    /// 0.0 (silent) to 1.0
    pub gain: f32,
    /// -1.0 (left) to 1.0 (right)
    pub pan: f32,
}

/// Map the step's peak to audio targets.
///
/// Loudness follows how far the string is displaced relative to the pluck cap;
/// stereo position follows where along the string the peak sits.
pub fn map_peak(peak: Peak, num_segments: usize, max_magnitude: f64) -> AudioTargets {
    let gain = if max_magnitude > 0.0 {
        (peak.magnitude / max_magnitude).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let pan = if num_segments > 0 {
        ((peak.index as f64 / num_segments as f64) * 2.0 - 1.0).clamp(-1.0, 1.0)
    } else {
        0.0
    };

    AudioTargets {
        gain: gain as f32,
        pan: pan as f32,
    }
}

/// Map the peak and forward the targets to `emitter`.
pub fn forward(
    emitter: &mut dyn AudioEmitter,
    peak: Peak,
    num_segments: usize,
    max_magnitude: f64,
) -> AudioTargets {
    let targets = map_peak(peak, num_segments, max_magnitude);
    emitter.update(targets.gain, targets.pan);
    targets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_is_ratio_of_cap() {
        let targets = map_peak(Peak { index: 50, magnitude: 30.0 }, 100, 60.0);
        assert!((targets.gain - 0.5).abs() < 1e-6);
        assert!(targets.pan.abs() < 1e-6);
    }

    #[test]
    fn test_gain_clamped_to_unit() {
        let targets = map_peak(Peak { index: 1, magnitude: 90.0 }, 100, 60.0);
        assert_eq!(targets.gain, 1.0);
    }

    #[test]
    fn test_pan_spans_string() {
        let left = map_peak(Peak { index: 0, magnitude: 1.0 }, 100, 60.0);
        let right = map_peak(Peak { index: 99, magnitude: 1.0 }, 100, 60.0);
        assert_eq!(left.pan, -1.0);
        assert!((right.pan - 0.98).abs() < 1e-6);
    }

    #[test]
    fn test_rest_is_silent() {
        let targets = map_peak(Peak { index: 1, magnitude: 0.0 }, 10, 60.0);
        assert_eq!(targets.gain, 0.0);
    }
}
