// Torchly — Haptic Motor Driver
//
// Simple GPIO-driven vibration motor.  Pulses are best-effort: pin faults are
// swallowed, a flashlight must keep working without feedback.

use std::thread;
use std::time::Duration;

use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};

/// Raw start/stop control.  The blink sequencer holds the motor on for the
/// span of each light pulse; everything else uses the blocking `buzz`.
pub trait Haptic {
    fn set_active(&mut self, on: bool);

    /// Vibrate for a fixed duration (blocks the calling thread).
    fn buzz(&mut self, duration: Duration) {
        self.set_active(true);
        thread::sleep(duration);
        self.set_active(false);
    }
}

pub struct HapticDriver {
    pin: PinDriver<'static, AnyOutputPin, Output>,
}

impl HapticDriver {
    pub fn new(pin: PinDriver<'static, AnyOutputPin, Output>) -> Self {
        Self { pin }
    }
}

impl Haptic for HapticDriver {
    fn set_active(&mut self, on: bool) {
        let result = if on { self.pin.set_high() } else { self.pin.set_low() };
        if let Err(e) = result {
            log::debug!("haptic pin write failed: {}", e);
        }
    }
}
