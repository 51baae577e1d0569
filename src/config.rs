// Torchly — Hardware & System Configuration
// Target: Seeed Studio Xiao ESP32-C3 (RISC-V)

// ---------------------------------------------------------------------------
// GPIO Pin Definitions (Xiao ESP32-C3 pinout)
// ---------------------------------------------------------------------------
pub const PIN_TORCH: i32 = 2;     // D0/A0 — High-power LED (MOSFET gate, LEDC PWM)
pub const PIN_BUTTON: i32 = 3;    // D1/A1 — User button (INPUT_PULLUP, active LOW)
pub const PIN_HAPTIC: i32 = 4;    // D2/A2 — Vibration motor control
pub const PIN_I2C_SDA: i32 = 6;   // D4    — I2C data line (MPU6050)
pub const PIN_I2C_SCL: i32 = 7;   // D5    — I2C clock line (MPU6050)

// ---------------------------------------------------------------------------
// Torch LED (LEDC PWM)
// ---------------------------------------------------------------------------
pub const TORCH_PWM_FREQ_HZ: u32 = 1000;

// ---------------------------------------------------------------------------
// I2C Bus
// ---------------------------------------------------------------------------
pub const I2C_ADDR_MPU6050: u8 = 0x68;
pub const I2C_TIMEOUT_TICKS: u32 = 1000; // FreeRTOS ticks

// ---------------------------------------------------------------------------
// Task Stack Sizes (bytes)
// ---------------------------------------------------------------------------
pub const STACK_SENSOR: usize = 4096;
pub const STACK_GESTURE: usize = 4096;
pub const STACK_CONSOLE: usize = 8192;
pub const STACK_BLINK: usize = 4096;

// ---------------------------------------------------------------------------
// Morse / blink timing
// ---------------------------------------------------------------------------
pub const MORSE_UNIT_MS: u64 = 200;    // base unit: dot = 1, dash = 3
pub const LOOP_PAUSE_UNITS: u32 = 7;   // dark pause between SOS repeats

// ---------------------------------------------------------------------------
// Timing (milliseconds)
// ---------------------------------------------------------------------------
pub const SENSOR_SAMPLE_INTERVAL_MS: u64 = 16;   // ~62.5 Hz
pub const CONTROL_POLL_INTERVAL_MS: u64 = 10;    // 100 Hz button poll / dispatch
pub const DEBOUNCE_MS: u64 = 50;
pub const LONG_PRESS_MS: u64 = 3000;             // 3-second hold → power off
pub const DOUBLE_CLICK_WINDOW_MS: u64 = 400;
pub const SHAKE_DEBOUNCE_MS: u64 = 1000;
pub const SHAKE_FEEDBACK_BUZZ_MS: u64 = 100;

// ---------------------------------------------------------------------------
// Shake detection
// ---------------------------------------------------------------------------
pub const GRAVITY_MS2: f32 = 9.81;
// threshold = BASE - sensitivity * SPAN, sensitivity in [0,1]
pub const SHAKE_THRESHOLD_BASE: f32 = 12.0;
pub const SHAKE_THRESHOLD_SPAN: f32 = 6.0;

// ---------------------------------------------------------------------------
// MPU6050 Sensor Scale Factor
// ---------------------------------------------------------------------------
pub const ACCEL_SCALE_8G: f32 = 4096.0; // LSB/g at ±8 g

// ---------------------------------------------------------------------------
// Settings persistence (NVS)
// ---------------------------------------------------------------------------
pub const NVS_NAMESPACE: &str = "torch_settings";
