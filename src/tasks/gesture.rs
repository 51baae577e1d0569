// Torchly — Gesture Task
//
// Consumes accelerometer samples and turns over-threshold spikes into shake
// events for the control task.  The threshold cell is shared with the control
// task so sensitivity changes from the settings surface apply live.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::time::Instant;

use crate::events::{ControlEvent, SensorData};
use crate::shake::ShakeDetector;

pub fn gesture_task(
    sensor_rx: Receiver<SensorData>,
    control_tx: Sender<ControlEvent>,
    threshold_bits: Arc<AtomicU32>,
) {
    log::info!("Gesture task started");

    let mut detector = ShakeDetector::new(f32::from_bits(threshold_bits.load(Ordering::Relaxed)));

    loop {
        // Block until a sensor sample arrives.
        let sample = match sensor_rx.recv() {
            Ok(s) => s,
            Err(_) => {
                log::warn!("Sensor channel closed — exiting gesture task");
                return;
            }
        };

        // Pick up live sensitivity changes before judging the sample.
        let threshold = f32::from_bits(threshold_bits.load(Ordering::Relaxed));
        if threshold != detector.threshold() {
            log::info!("Shake threshold now {:.1} m/s²", threshold);
            detector.set_threshold(threshold);
        }

        if detector.on_sample(&sample, Instant::now()) {
            log::info!("Shake detected");
            if control_tx.send(ControlEvent::Shake).is_err() {
                log::warn!("Control channel closed — exiting gesture task");
                return;
            }
        }
    }
}
