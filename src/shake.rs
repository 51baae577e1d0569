// Torchly — Shake Gesture Detector
//
// Debounced magnitude-threshold detector over accelerometer samples.  The
// detector is context-free: it only decides "this was a shake"; whether a
// shake toggles the torch is the control task's call.

use std::time::{Duration, Instant};

use crate::config::*;
use crate::events::SensorData;

/// Derive the trigger threshold (m/s² above gravity) from the user's
/// sensitivity setting in [0,1].  Higher sensitivity → lower threshold.
pub fn threshold_for(sensitivity: f32) -> f32 {
    SHAKE_THRESHOLD_BASE - sensitivity.clamp(0.0, 1.0) * SHAKE_THRESHOLD_SPAN
}

pub struct ShakeDetector {
    threshold: f32,
    debounce: Duration,
    last_shake: Option<Instant>,
}

impl ShakeDetector {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            debounce: Duration::from_millis(SHAKE_DEBOUNCE_MS),
            last_shake: None,
        }
    }

    /// Replace the threshold; applies from the next sample on.
    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold;
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Feed one accelerometer sample (axes in g).  Returns `true` when the
    /// gravity-compensated magnitude crosses the threshold outside the
    /// debounce window.
    pub fn on_sample(&mut self, sample: &SensorData, now: Instant) -> bool {
        let magnitude =
            (sample.ax * sample.ax + sample.ay * sample.ay + sample.az * sample.az).sqrt()
                * GRAVITY_MS2;
        let acceleration = magnitude - GRAVITY_MS2;

        if acceleration <= self.threshold {
            return false;
        }
        if let Some(last) = self.last_shake {
            if now.duration_since(last) < self.debounce {
                return false;
            }
        }
        self.last_shake = Some(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spike(gs: f32) -> SensorData {
        SensorData { ax: gs, ay: 0.0, az: 0.0 }
    }

    const AT_REST: SensorData = SensorData { ax: 0.0, ay: 0.0, az: 1.0 };

    #[test]
    fn resting_device_never_triggers() {
        let mut detector = ShakeDetector::new(threshold_for(1.0));
        let now = Instant::now();
        for i in 0..100 {
            let t = now + Duration::from_millis(i * 16);
            assert!(!detector.on_sample(&AT_REST, t));
        }
    }

    #[test]
    fn spike_above_threshold_triggers() {
        let mut detector = ShakeDetector::new(6.0);
        // 2 g → 9.81 m/s² above gravity.
        assert!(detector.on_sample(&spike(2.0), Instant::now()));
    }

    #[test]
    fn spikes_within_debounce_window_fire_once() {
        let mut detector = ShakeDetector::new(6.0);
        let now = Instant::now();
        assert!(detector.on_sample(&spike(2.0), now));
        assert!(!detector.on_sample(&spike(2.0), now + Duration::from_millis(500)));
        assert!(detector.on_sample(&spike(2.0), now + Duration::from_millis(1500)));
    }

    #[test]
    fn suppressed_spike_does_not_extend_the_window() {
        let mut detector = ShakeDetector::new(6.0);
        let now = Instant::now();
        assert!(detector.on_sample(&spike(2.0), now));
        // Ignored spike at +900 ms must not push the next trigger past +1000 ms.
        assert!(!detector.on_sample(&spike(2.0), now + Duration::from_millis(900)));
        assert!(detector.on_sample(&spike(2.0), now + Duration::from_millis(1100)));
    }

    #[test]
    fn threshold_update_applies_to_next_sample() {
        let mut detector = ShakeDetector::new(12.0);
        let now = Instant::now();
        // 1.8 g → ~7.85 m/s² above gravity: below 12, above 6.
        assert!(!detector.on_sample(&spike(1.8), now));
        detector.set_threshold(6.0);
        assert!(detector.on_sample(&spike(1.8), now + Duration::from_millis(16)));
    }

    #[test]
    fn sensitivity_maps_linearly_onto_threshold() {
        assert_eq!(threshold_for(0.0), 12.0);
        assert_eq!(threshold_for(0.5), 9.0);
        assert_eq!(threshold_for(1.0), 6.0);
        // Out-of-range settings clamp instead of extrapolating.
        assert_eq!(threshold_for(-1.0), 12.0);
        assert_eq!(threshold_for(2.0), 6.0);
    }
}
