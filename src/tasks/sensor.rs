// Torchly — Sensor Task
//
// Continuously reads 3-axis accelerometer data at ~62.5 Hz and pushes samples
// into the sensor channel for the gesture task to consume.

use std::sync::mpsc::Sender;
use std::thread;
use std::time::{Duration, Instant};

use esp_idf_hal::i2c::I2cDriver;

use crate::config::*;
use crate::drivers::imu::Mpu6050;
use crate::events::SensorData;

pub fn sensor_task(i2c: I2cDriver<'static>, sensor_tx: Sender<SensorData>) {
    log::info!("Sensor task started");

    let mut imu = Mpu6050::new(i2c);
    if !imu.is_connected() {
        log::error!("MPU6050 not reachable — shake-to-flash disabled");
        return;
    }
    if let Err(e) = imu.init() {
        log::error!("MPU6050 init failed in sensor task: {}", e);
        return;
    }

    let interval = Duration::from_millis(SENSOR_SAMPLE_INTERVAL_MS);

    loop {
        let tick_start = Instant::now();

        match imu.read_accel() {
            Ok(sample) => {
                if sensor_tx.send(sample).is_err() {
                    // Receiver dropped — gesture task has exited.
                    log::warn!("Sensor channel closed — exiting sensor task");
                    return;
                }
            }
            Err(e) => {
                log::warn!("IMU read error: {}", e);
            }
        }

        // Sleep for the remainder of the sampling interval to hold ~62.5 Hz.
        let elapsed = tick_start.elapsed();
        if elapsed < interval {
            thread::sleep(interval - elapsed);
        }
    }
}
