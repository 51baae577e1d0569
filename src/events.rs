// Torchly — System Events & Data Types

use crate::settings::AutoOffTimer;

// ---------------------------------------------------------------------------
// Sensor Data (3-axis accelerometer reading from MPU6050, in g)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, Default)]
pub struct SensorData {
    pub ax: f32,
    pub ay: f32,
    pub az: f32,
}

// ---------------------------------------------------------------------------
// Setting changes — applied live and persisted to NVS
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettingChange {
    /// Shake sensitivity in [0,1]; re-derives the gesture threshold.
    ShakeSensitivity(f32),
    /// Pulse the vibration motor alongside light pulses.
    VibrationEnabled(bool),
    /// Auto-off timer duration for the manual torch.
    AutoOff(AutoOffTimer),
    /// Allow shake gestures to toggle the torch.
    ShakeToFlash(bool),
}

// ---------------------------------------------------------------------------
// Control Events — sent to the control task via channel
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    /// Set the torch to an explicit state.
    SetTorch(bool),
    /// Flip the torch state.
    ToggleTorch,
    /// Change brightness (0.0–1.0) and re-apply the torch level.
    SetBrightness(f32),
    /// Begin looping the SOS pattern.
    StartSos,
    /// Stop the SOS loop.
    StopSos,
    /// Encode the given text and blink it once.
    PlayMorse(String),
    /// Stop whatever blink run is active.
    StopPlayback,
    /// Shake gesture crossed the threshold.
    Shake,
    /// Single button click detected.
    ButtonSingleClick,
    /// Double button click detected.
    ButtonDoubleClick,
    /// Long button press (≥ 3 s) detected.
    ButtonLongPress,
    /// Update a user preference.
    Apply(SettingChange),
    /// Log the current torch/playback/settings state.
    ReportStatus,
}
