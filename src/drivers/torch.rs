// Torchly — Torch LED Driver
//
// The single hardware-facing light primitive.  Preferred backend is an LEDC
// PWM channel (variable strength); if PWM setup fails at boot we fall back to
// a plain GPIO switch, and if no output can be configured at all every call
// reports `NoCapableDevice` so callers can tell the user instead of crashing.

use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};
use esp_idf_hal::ledc::LedcDriver;
use esp_idf_sys::EspError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TorchError {
    /// No torch-capable output was resolved at startup.  Permanent.
    #[error("no torch-capable light configured")]
    NoCapableDevice,
    /// Transient fault from the LEDC/GPIO layer.  Never fatal.
    #[error("torch hardware fault: {0}")]
    Hardware(#[from] EspError),
}

/// The narrow contract the blink sequencer drives.  Strength is a manual-mode
/// concern; sequenced pulses are plain on/off.
pub trait Torch {
    fn set(&mut self, on: bool) -> Result<(), TorchError>;
}

/// Map a normalized brightness in [0,1] onto the integer strength range
/// [1, max_level].  Linear, floor-rounded, so 0.0 → 1 and 1.0 → max_level.
pub fn strength_level(value: f32, max_level: u32) -> u32 {
    let max_level = max_level.max(1);
    (value.clamp(0.0, 1.0) * (max_level - 1) as f32) as u32 + 1
}

enum Backend {
    /// LEDC PWM channel; duty range doubles as the strength level range.
    Pwm(LedcDriver<'static>),
    /// Plain on/off GPIO — no variable strength.
    Switch(PinDriver<'static, AnyOutputPin, Output>),
    Unavailable,
}

pub struct TorchDriver {
    backend: Backend,
}

impl TorchDriver {
    pub fn pwm(ledc: LedcDriver<'static>) -> Self {
        Self { backend: Backend::Pwm(ledc) }
    }

    pub fn switch(pin: PinDriver<'static, AnyOutputPin, Output>) -> Self {
        Self { backend: Backend::Switch(pin) }
    }

    /// Placeholder driver for hardware where no LED output could be set up.
    pub fn unavailable() -> Self {
        Self { backend: Backend::Unavailable }
    }

    /// Maximum strength level, or `None` when only boolean switching works.
    pub fn max_level(&self) -> Option<u32> {
        match &self.backend {
            Backend::Pwm(ledc) => Some(ledc.get_max_duty()),
            _ => None,
        }
    }

    /// Drive the light.  `brightness` only matters when turning on a PWM
    /// backend; switching off ignores it entirely.  Exactly one hardware
    /// call per invocation.
    pub fn apply(&mut self, on: bool, brightness: Option<f32>) -> Result<(), TorchError> {
        match &mut self.backend {
            Backend::Pwm(ledc) => {
                let duty = if !on {
                    0
                } else {
                    match brightness {
                        Some(value) => strength_level(value, ledc.get_max_duty()),
                        None => ledc.get_max_duty(),
                    }
                };
                ledc.set_duty(duty)?;
                Ok(())
            }
            Backend::Switch(pin) => {
                if on {
                    pin.set_high()?;
                } else {
                    pin.set_low()?;
                }
                Ok(())
            }
            Backend::Unavailable => Err(TorchError::NoCapableDevice),
        }
    }
}

impl Torch for TorchDriver {
    fn set(&mut self, on: bool) -> Result<(), TorchError> {
        self.apply(on, None)
    }
}

#[cfg(test)]
mod tests {
    use super::strength_level;

    #[test]
    fn endpoints_map_to_full_range() {
        assert_eq!(strength_level(0.0, 45), 1);
        assert_eq!(strength_level(1.0, 45), 45);
        assert_eq!(strength_level(0.0, 2), 1);
        assert_eq!(strength_level(1.0, 2), 2);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        assert_eq!(strength_level(-3.0, 10), 1);
        assert_eq!(strength_level(7.5, 10), 10);
    }

    #[test]
    fn mapping_is_monotone_and_in_range() {
        let max = 1023;
        let mut prev = 0;
        for step in 0..=100 {
            let level = strength_level(step as f32 / 100.0, max);
            assert!((1..=max).contains(&level));
            assert!(level >= prev);
            prev = level;
        }
    }

    #[test]
    fn degenerate_single_level_device() {
        assert_eq!(strength_level(0.0, 1), 1);
        assert_eq!(strength_level(1.0, 1), 1);
    }
}
