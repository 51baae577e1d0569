// Torchly — Control Task
//
// The single owner of torch state.  Polls the button at ~100 Hz, drains
// control events from the console, gesture, and input sources, and applies
// them through one dispatch match.  Every path that changes the light goes
// through `set_torch` or the sequencer, so manual toggles, blink runs, shake
// gestures, and the auto-off timer can never fight over the hardware.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use esp_idf_hal::gpio::{AnyIOPin, Input, PinDriver};

use crate::config::*;
use crate::drivers::torch::{TorchDriver, TorchError};
use crate::events::{ControlEvent, SettingChange};
use crate::input::ButtonInput;
use crate::morse;
use crate::sequencer::{BlinkSequencer, PlayMode, SharedHaptic};
use crate::settings::{Settings, SettingsStore};
use crate::shake::threshold_for;

pub fn control_task(
    torch: Arc<Mutex<TorchDriver>>,
    haptic: SharedHaptic,
    sequencer: BlinkSequencer,
    button_pin: PinDriver<'static, AnyIOPin, Input>,
    events: Receiver<ControlEvent>,
    events_tx: Sender<ControlEvent>,
    store: SettingsStore,
    settings: Settings,
    shake_threshold_bits: Arc<AtomicU32>,
) -> ! {
    log::info!("Control task started");

    let mut input = ButtonInput::new(events_tx);
    let mut control = TorchControl {
        torch,
        haptic,
        sequencer,
        store,
        settings,
        shake_threshold_bits,
        torch_on: false,
        brightness: 0.5,
        sos_active: false,
        morse_active: false,
        auto_off_deadline: None,
    };

    let poll = Duration::from_millis(CONTROL_POLL_INTERVAL_MS);

    loop {
        // 1. Poll the button (debounce + click detection feed back as events).
        input.update(button_pin.is_low(), Instant::now());

        // 2. Drain all pending control events (non-blocking).
        while let Ok(event) = events.try_recv() {
            control.handle(event);
        }

        // 3. Notice a Morse run that finished on its own.
        if control.morse_active && !control.sequencer.is_running() {
            control.morse_active = false;
            log::info!("Morse playback complete");
        }

        // 4. Fire the auto-off timer.
        control.tick_auto_off(Instant::now());

        thread::sleep(poll);
    }
}

struct TorchControl {
    torch: Arc<Mutex<TorchDriver>>,
    haptic: SharedHaptic,
    sequencer: BlinkSequencer,
    store: SettingsStore,
    settings: Settings,
    shake_threshold_bits: Arc<AtomicU32>,

    torch_on: bool,
    brightness: f32,
    sos_active: bool,
    morse_active: bool,
    auto_off_deadline: Option<Instant>,
}

impl TorchControl {
    fn handle(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::SetTorch(on) => self.set_torch(on),
            ControlEvent::ToggleTorch | ControlEvent::ButtonSingleClick => {
                self.set_torch(!self.torch_on)
            }
            ControlEvent::SetBrightness(value) => {
                self.brightness = value.clamp(0.0, 1.0);
                // Matches the slider: dragging brightness turns the light on.
                self.set_torch(true);
            }
            ControlEvent::StartSos => self.start_sos(),
            ControlEvent::StopSos | ControlEvent::StopPlayback => self.stop_playback(),
            ControlEvent::ButtonDoubleClick => {
                if self.sos_active {
                    self.stop_playback();
                } else {
                    self.start_sos();
                }
            }
            ControlEvent::PlayMorse(text) => self.play_morse(&text),
            ControlEvent::Shake => self.on_shake(),
            ControlEvent::ButtonLongPress => self.power_off(),
            ControlEvent::Apply(change) => self.apply_setting(change),
            ControlEvent::ReportStatus => self.report_status(),
        }
    }

    /// Manual torch path.  Cancels any blink run first so exactly one writer
    /// touches the hardware, then applies state + brightness in one call.
    fn set_torch(&mut self, on: bool) {
        self.halt_playback();

        match self.torch.lock().unwrap().apply(on, Some(self.brightness)) {
            Ok(()) => {
                self.torch_on = on;
                log::info!("Torch {}", if on { "on" } else { "off" });
            }
            Err(TorchError::NoCapableDevice) => {
                log::warn!("No torch-capable light configured — ignoring");
            }
            Err(e) => {
                // Transient fault: state assumed unchanged, no retry.
                log::warn!("Torch write failed: {}", e);
            }
        }

        self.reschedule_auto_off();
    }

    fn start_sos(&mut self) {
        self.set_torch(false);
        self.sequencer
            .start(morse::sos(), PlayMode::Loop, self.settings.vibration_enabled);
        self.sos_active = true;
        log::info!("SOS started");
    }

    fn play_morse(&mut self, text: &str) {
        let plan = morse::encode(text);
        if plan.is_empty() {
            log::warn!("Nothing to blink — text has no A-Z/0-9 characters");
            return;
        }
        self.set_torch(false);
        log::info!(
            "Blinking {:?} ({} s)",
            text,
            plan.total_duration_ms(MORSE_UNIT_MS) / 1000
        );
        self.sequencer
            .start(plan, PlayMode::Once, self.settings.vibration_enabled);
        self.morse_active = true;
    }

    fn stop_playback(&mut self) {
        if self.sos_active || self.morse_active {
            log::info!("Playback stopped");
        }
        self.halt_playback();
    }

    fn halt_playback(&mut self) {
        self.sequencer.stop();
        self.sos_active = false;
        self.morse_active = false;
    }

    fn on_shake(&mut self) {
        if !self.settings.shake_to_flash {
            return;
        }
        // A blink run owns the light; shaking mid-sequence would garble it.
        if self.sequencer.is_running() {
            return;
        }
        self.set_torch(!self.torch_on);
        if self.settings.vibration_enabled {
            self.haptic
                .lock()
                .unwrap()
                .buzz(Duration::from_millis(SHAKE_FEEDBACK_BUZZ_MS));
        }
    }

    fn apply_setting(&mut self, change: SettingChange) {
        self.settings.apply(&change);
        self.store.save(&change);

        match change {
            SettingChange::ShakeSensitivity(_) => {
                // Live update: the gesture task reads this on its next sample.
                let threshold = threshold_for(self.settings.shake_sensitivity);
                self.shake_threshold_bits
                    .store(threshold.to_bits(), Ordering::Relaxed);
            }
            SettingChange::AutoOff(_) => self.reschedule_auto_off(),
            _ => {}
        }

        log::info!("Setting applied: {:?}", change);
    }

    fn reschedule_auto_off(&mut self) {
        self.auto_off_deadline = if self.torch_on {
            self.settings
                .auto_off_timer
                .duration()
                .map(|d| Instant::now() + d)
        } else {
            None
        };
    }

    fn tick_auto_off(&mut self, now: Instant) {
        if let Some(deadline) = self.auto_off_deadline {
            if now >= deadline {
                self.auto_off_deadline = None;
                log::info!("Auto-off timer elapsed");
                self.set_torch(false);
            }
        }
    }

    fn report_status(&self) {
        let playback = if self.sos_active {
            "sos"
        } else if self.morse_active {
            "morse"
        } else {
            "idle"
        };
        println!(
            "torch: {}  brightness: {:.2}  playback: {}",
            if self.torch_on { "on" } else { "off" },
            self.brightness,
            playback
        );
        println!(
            "shake_sensitivity: {:.2}  vibration: {}  auto_off: {}  shake_to_flash: {}",
            self.settings.shake_sensitivity,
            self.settings.vibration_enabled,
            self.settings.auto_off_timer.as_str(),
            self.settings.shake_to_flash
        );
        if let Some(max) = self.torch.lock().unwrap().max_level() {
            println!("strength levels: 1-{}", max);
        }
    }

    /// 3-second hold: shut everything down and enter deep sleep.
    fn power_off(&mut self) -> ! {
        log::info!("Long press — powering off");
        self.halt_playback();
        self.set_torch(false);
        self.haptic.lock().unwrap().buzz(Duration::from_millis(500));
        crate::enter_deep_sleep()
    }
}
