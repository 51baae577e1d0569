// Torchly — User Settings
//
// Runtime preferences persisted in NVS flash under the `torch_settings`
// namespace.  Persistence is best-effort: a failed flash write costs the
// user a preference across reboots, never a working torch.

use std::time::Duration;

use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};

use crate::config::NVS_NAMESPACE;
use crate::events::SettingChange;

const KEY_SHAKE_SENSITIVITY: &str = "shake_sensitivity";
const KEY_VIBRATION_ENABLED: &str = "vibration_enabled";
const KEY_AUTO_OFF_TIMER: &str = "auto_off_timer";
const KEY_SHAKE_TO_FLASH: &str = "shake_to_flash";

// ---------------------------------------------------------------------------
// Auto-off timer choices
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoOffTimer {
    Off,
    TwoMin,
    #[default]
    FiveMin,
    TenMin,
}

impl AutoOffTimer {
    /// Label stored in NVS and shown in status output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "Off",
            Self::TwoMin => "2 min",
            Self::FiveMin => "5 min",
            Self::TenMin => "10 min",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Off" => Some(Self::Off),
            "2 min" => Some(Self::TwoMin),
            "5 min" => Some(Self::FiveMin),
            "10 min" => Some(Self::TenMin),
            _ => None,
        }
    }

    /// How long the torch may stay on, `None` when the timer is disabled.
    pub fn duration(&self) -> Option<Duration> {
        match self {
            Self::Off => None,
            Self::TwoMin => Some(Duration::from_secs(2 * 60)),
            Self::FiveMin => Some(Duration::from_secs(5 * 60)),
            Self::TenMin => Some(Duration::from_secs(10 * 60)),
        }
    }
}

// ---------------------------------------------------------------------------
// Settings snapshot
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    pub shake_sensitivity: f32,
    pub vibration_enabled: bool,
    pub auto_off_timer: AutoOffTimer,
    pub shake_to_flash: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            shake_sensitivity: 0.5,
            vibration_enabled: true,
            auto_off_timer: AutoOffTimer::FiveMin,
            shake_to_flash: false,
        }
    }
}

impl Settings {
    pub fn apply(&mut self, change: &SettingChange) {
        match change {
            SettingChange::ShakeSensitivity(v) => self.shake_sensitivity = v.clamp(0.0, 1.0),
            SettingChange::VibrationEnabled(v) => self.vibration_enabled = *v,
            SettingChange::AutoOff(t) => self.auto_off_timer = *t,
            SettingChange::ShakeToFlash(v) => self.shake_to_flash = *v,
        }
    }
}

// ---------------------------------------------------------------------------
// NVS persistence
// ---------------------------------------------------------------------------
pub struct SettingsStore {
    nvs: EspNvs<NvsDefault>,
}

impl SettingsStore {
    pub fn new(partition: EspDefaultNvsPartition) -> anyhow::Result<Self> {
        let nvs = EspNvs::new(partition, NVS_NAMESPACE, true)?;
        Ok(Self { nvs })
    }

    /// Read all preferences, falling back to defaults for anything missing
    /// or unreadable.
    pub fn load(&self) -> Settings {
        let defaults = Settings::default();

        // NVS has no float type; sensitivity is stored as raw f32 bits.
        let shake_sensitivity = match self.nvs.get_u32(KEY_SHAKE_SENSITIVITY) {
            Ok(Some(bits)) => f32::from_bits(bits).clamp(0.0, 1.0),
            Ok(None) => defaults.shake_sensitivity,
            Err(e) => {
                log::warn!("failed to read {}: {}", KEY_SHAKE_SENSITIVITY, e);
                defaults.shake_sensitivity
            }
        };

        let mut buf = [0u8; 16];
        let auto_off_timer = match self.nvs.get_str(KEY_AUTO_OFF_TIMER, &mut buf) {
            Ok(Some(label)) => AutoOffTimer::from_label(label).unwrap_or(defaults.auto_off_timer),
            Ok(None) => defaults.auto_off_timer,
            Err(e) => {
                log::warn!("failed to read {}: {}", KEY_AUTO_OFF_TIMER, e);
                defaults.auto_off_timer
            }
        };

        Settings {
            shake_sensitivity,
            vibration_enabled: self.load_bool(KEY_VIBRATION_ENABLED, defaults.vibration_enabled),
            auto_off_timer,
            shake_to_flash: self.load_bool(KEY_SHAKE_TO_FLASH, defaults.shake_to_flash),
        }
    }

    /// Persist a single changed preference.
    pub fn save(&mut self, change: &SettingChange) {
        match change {
            SettingChange::ShakeSensitivity(v) => report(
                KEY_SHAKE_SENSITIVITY,
                self.nvs
                    .set_u32(KEY_SHAKE_SENSITIVITY, v.clamp(0.0, 1.0).to_bits()),
            ),
            SettingChange::VibrationEnabled(v) => report(
                KEY_VIBRATION_ENABLED,
                self.nvs.set_u8(KEY_VIBRATION_ENABLED, *v as u8),
            ),
            SettingChange::AutoOff(t) => report(
                KEY_AUTO_OFF_TIMER,
                self.nvs.set_str(KEY_AUTO_OFF_TIMER, t.as_str()),
            ),
            SettingChange::ShakeToFlash(v) => report(
                KEY_SHAKE_TO_FLASH,
                self.nvs.set_u8(KEY_SHAKE_TO_FLASH, *v as u8),
            ),
        }
    }

    fn load_bool(&self, key: &str, default: bool) -> bool {
        match self.nvs.get_u8(key) {
            Ok(Some(raw)) => raw != 0,
            Ok(None) => default,
            Err(e) => {
                log::warn!("failed to read {}: {}", key, e);
                default
            }
        }
    }
}

fn report<T>(key: &str, result: Result<T, esp_idf_sys::EspError>) {
    if let Err(e) = result {
        log::warn!("failed to persist {}: {}", key, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_first_run_behaviour() {
        let settings = Settings::default();
        assert_eq!(settings.shake_sensitivity, 0.5);
        assert!(settings.vibration_enabled);
        assert_eq!(settings.auto_off_timer, AutoOffTimer::FiveMin);
        assert!(!settings.shake_to_flash);
    }

    #[test]
    fn auto_off_label_round_trip() {
        for timer in [
            AutoOffTimer::Off,
            AutoOffTimer::TwoMin,
            AutoOffTimer::FiveMin,
            AutoOffTimer::TenMin,
        ] {
            assert_eq!(AutoOffTimer::from_label(timer.as_str()), Some(timer));
        }
        assert_eq!(AutoOffTimer::from_label("3 min"), None);
    }

    #[test]
    fn auto_off_durations() {
        assert_eq!(AutoOffTimer::Off.duration(), None);
        assert_eq!(AutoOffTimer::TwoMin.duration(), Some(Duration::from_secs(120)));
        assert_eq!(AutoOffTimer::FiveMin.duration(), Some(Duration::from_secs(300)));
        assert_eq!(AutoOffTimer::TenMin.duration(), Some(Duration::from_secs(600)));
    }

    #[test]
    fn apply_clamps_sensitivity() {
        let mut settings = Settings::default();
        settings.apply(&SettingChange::ShakeSensitivity(1.7));
        assert_eq!(settings.shake_sensitivity, 1.0);
        settings.apply(&SettingChange::ShakeSensitivity(-0.2));
        assert_eq!(settings.shake_sensitivity, 0.0);
    }

    #[test]
    fn apply_updates_the_matching_field_only() {
        let mut settings = Settings::default();
        settings.apply(&SettingChange::ShakeToFlash(true));
        assert!(settings.shake_to_flash);
        assert!(settings.vibration_enabled);
        assert_eq!(settings.auto_off_timer, AutoOffTimer::FiveMin);
    }
}
