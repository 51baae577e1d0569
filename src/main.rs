// Torchly — Firmware Entry Point
//
// Boot sequence:
//   1. Initialise logging and load persisted settings from NVS.
//   2. Resolve the torch output: LEDC PWM (variable strength) preferred,
//      plain GPIO switch as fallback, "unavailable" as last resort.
//   3. Bring up the button, haptic motor, and I2C accelerometer.
//   4. Spawn the sensor, gesture, and console tasks.
//   5. Run the control dispatch loop on the main thread.
//
// A 3-second button hold powers the device down into deep sleep; pressing
// the button wakes it up again.

mod config;
mod drivers;
mod events;
mod input;
mod morse;
mod sequencer;
mod settings;
mod shake;
mod tasks;

use std::sync::atomic::AtomicU32;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use esp_idf_hal::gpio::{Gpio2, IOPin, OutputPin, PinDriver, Pull};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::ledc::config::TimerConfig;
use esp_idf_hal::ledc::{LedcDriver, LedcTimerDriver, Resolution, CHANNEL0, TIMER0};
use esp_idf_hal::prelude::*;
use esp_idf_svc::nvs::EspDefaultNvsPartition;

use crate::config::*;
use crate::drivers::haptic::HapticDriver;
use crate::drivers::torch::TorchDriver;
use crate::sequencer::{BlinkSequencer, SharedHaptic, SharedTorch};
use crate::settings::SettingsStore;
use crate::shake::threshold_for;

fn main() -> anyhow::Result<()> {
    // Link esp-idf-sys runtime patches and initialise logging.
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    log::info!("Torchly firmware starting…");

    let peripherals = Peripherals::take()?;

    // ---- Settings (NVS) ---------------------------------------------------
    let nvs_partition = EspDefaultNvsPartition::take()?;
    let store = SettingsStore::new(nvs_partition)?;
    let settings = store.load();
    log::info!("Settings loaded: {:?}", settings);

    // ---- Torch output -----------------------------------------------------
    let torch = Arc::new(Mutex::new(resolve_torch(
        peripherals.ledc.timer0,
        peripherals.ledc.channel0,
        peripherals.pins.gpio2,
    )));

    // ---- Button (pull-up, active LOW) -------------------------------------
    let mut button = PinDriver::input(peripherals.pins.gpio3.downgrade())?;
    button.set_pull(Pull::Up)?;

    // ---- Haptic motor ------------------------------------------------------
    let haptic_pin = PinDriver::output(peripherals.pins.gpio4.downgrade_output())?;
    let haptic: SharedHaptic = Arc::new(Mutex::new(HapticDriver::new(haptic_pin)));

    // ---- I2C bus (MPU6050 accelerometer) ----------------------------------
    let i2c_config = I2cConfig::new().baudrate(400u32.kHz().into());
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio6, // SDA
        peripherals.pins.gpio7, // SCL
        &i2c_config,
    )?;

    // ---- Blink sequencer shares the torch and haptic handles ---------------
    let sequencer_torch: SharedTorch = torch.clone();
    let sequencer = BlinkSequencer::new(sequencer_torch, Some(Arc::clone(&haptic)), MORSE_UNIT_MS);

    // ---- Channels & shared state -------------------------------------------
    let (control_tx, control_rx) = mpsc::channel();
    let (sensor_tx, sensor_rx) = mpsc::channel();

    let shake_threshold = Arc::new(AtomicU32::new(
        threshold_for(settings.shake_sensitivity).to_bits(),
    ));

    // ---- Spawn tasks (map to FreeRTOS tasks via std::thread) ---------------
    thread::Builder::new()
        .name("sensor".into())
        .stack_size(STACK_SENSOR)
        .spawn(move || {
            tasks::sensor::sensor_task(i2c, sensor_tx);
        })?;

    let gesture_tx = control_tx.clone();
    let gesture_threshold = Arc::clone(&shake_threshold);
    thread::Builder::new()
        .name("gesture".into())
        .stack_size(STACK_GESTURE)
        .spawn(move || {
            tasks::gesture::gesture_task(sensor_rx, gesture_tx, gesture_threshold);
        })?;

    let console_tx = control_tx.clone();
    thread::Builder::new()
        .name("console".into())
        .stack_size(STACK_CONSOLE)
        .spawn(move || {
            tasks::console::console_task(console_tx);
        })?;

    log::info!("Boot complete — entering normal operation");

    // The control dispatch loop owns the main thread from here on.
    tasks::control::control_task(
        torch,
        haptic,
        sequencer,
        button,
        control_rx,
        control_tx,
        store,
        settings,
        shake_threshold,
    )
}

// ---------------------------------------------------------------------------
// Boot helpers
// ---------------------------------------------------------------------------

/// Resolve the best available torch backend.  PWM gives variable strength;
/// when the LEDC timer cannot be claimed the LED still works as a plain
/// switch, and only if the pin itself is unusable do we give up.
fn resolve_torch(timer: TIMER0, channel: CHANNEL0, pin: Gpio2) -> TorchDriver {
    let timer_config = TimerConfig::default()
        .frequency(TORCH_PWM_FREQ_HZ.Hz())
        .resolution(Resolution::Bits10);

    let timer_driver = match LedcTimerDriver::new(timer, &timer_config) {
        Ok(t) => t,
        Err(e) => {
            log::warn!("LEDC timer unavailable ({}) — torch limited to on/off", e);
            return match PinDriver::output(pin.downgrade_output()) {
                Ok(p) => TorchDriver::switch(p),
                Err(e) => {
                    log::error!("No usable torch output: {}", e);
                    TorchDriver::unavailable()
                }
            };
        }
    };

    match LedcDriver::new(channel, timer_driver, pin) {
        Ok(ledc) => {
            log::info!("Torch on LEDC PWM ({} strength levels)", ledc.get_max_duty());
            TorchDriver::pwm(ledc)
        }
        Err(e) => {
            log::error!("No usable torch output: {}", e);
            TorchDriver::unavailable()
        }
    }
}

/// Configure GPIO wakeup on button press and enter deep sleep.  Does not
/// return.
pub fn enter_deep_sleep() -> ! {
    log::info!("Entering deep sleep — wake on button press (GPIO{})", PIN_BUTTON);
    unsafe {
        esp_idf_sys::esp_deep_sleep_enable_gpio_wakeup(
            1u64 << PIN_BUTTON,
            esp_idf_sys::esp_deepsleep_gpio_wake_up_mode_t_ESP_GPIO_WAKEUP_GPIO_LOW,
        );
        esp_idf_sys::esp_deep_sleep_start();
    }
}
