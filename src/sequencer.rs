// Torchly — Blink Sequencer
//
// Walks a SequencePlan on a dedicated background thread, driving the torch
// (and optionally the haptic motor) in lock-step with timed delays.  Exactly
// one run may hold the torch at a time: the active-run slot is guarded by a
// mutex, and starting or stopping first cancels and joins the previous run,
// so cancel-then-start is atomic with respect to the hardware.
//
// Cancellation is cooperative.  The flag is tested before every element, so
// a cancel takes effect within one element duration (≤ 600 ms at the default
// unit), after which the torch is forced off.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::{LOOP_PAUSE_UNITS, STACK_BLINK};
use crate::drivers::haptic::Haptic;
use crate::drivers::torch::Torch;
use crate::morse::{Element, SequencePlan};

pub type SharedTorch = Arc<Mutex<dyn Torch + Send>>;
pub type SharedHaptic = Arc<Mutex<dyn Haptic + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayMode {
    /// Play the plan once and terminate (Morse playback).
    Once,
    /// Repeat forever with a 7-unit pause between passes (SOS).
    Loop,
}

struct RunHandle {
    cancel: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

pub struct BlinkSequencer {
    torch: SharedTorch,
    haptic: Option<SharedHaptic>,
    unit_ms: u64,
    active: Mutex<Option<RunHandle>>,
}

impl BlinkSequencer {
    pub fn new(torch: SharedTorch, haptic: Option<SharedHaptic>, unit_ms: u64) -> Self {
        Self {
            torch,
            haptic,
            unit_ms,
            active: Mutex::new(None),
        }
    }

    /// Start playing `plan`, cancelling and awaiting any previous run first.
    /// `haptics` pulses the vibration motor for the span of each light pulse.
    pub fn start(&self, plan: SequencePlan, mode: PlayMode, haptics: bool) {
        if plan.is_empty() {
            return;
        }

        let mut slot = self.active.lock().unwrap();
        Self::halt(&mut slot);

        let cancel = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));

        let torch = Arc::clone(&self.torch);
        let haptic = if haptics { self.haptic.clone() } else { None };
        let unit_ms = self.unit_ms;
        let run_cancel = Arc::clone(&cancel);
        let run_finished = Arc::clone(&finished);

        let spawned = thread::Builder::new()
            .name("blink".into())
            .stack_size(STACK_BLINK)
            .spawn(move || run(plan, mode, torch, haptic, run_cancel, run_finished, unit_ms));

        match spawned {
            Ok(handle) => {
                *slot = Some(RunHandle {
                    cancel,
                    finished,
                    thread: handle,
                });
            }
            Err(e) => log::error!("failed to spawn blink run: {}", e),
        }
    }

    /// Cancel the active run, if any, and wait for it to release the torch.
    pub fn stop(&self) {
        let mut slot = self.active.lock().unwrap();
        Self::halt(&mut slot);
    }

    /// True while a run is still walking its plan.
    pub fn is_running(&self) -> bool {
        let slot = self.active.lock().unwrap();
        match slot.as_ref() {
            Some(active) => !active.finished.load(Ordering::Acquire),
            None => false,
        }
    }

    fn halt(slot: &mut Option<RunHandle>) {
        if let Some(active) = slot.take() {
            active.cancel.store(true, Ordering::Release);
            let _ = active.thread.join();
        }
    }
}

fn run(
    plan: SequencePlan,
    mode: PlayMode,
    torch: SharedTorch,
    haptic: Option<SharedHaptic>,
    cancel: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    unit_ms: u64,
) {
    let mut reported = false;

    'playback: loop {
        for element in plan.elements() {
            if cancel.load(Ordering::Acquire) {
                break 'playback;
            }
            let duration = Duration::from_millis(element.duration_ms(unit_ms));
            match element {
                Element::Pulse(_) => {
                    set_torch(&torch, true, &mut reported);
                    set_haptic(&haptic, true);
                    thread::sleep(duration);
                    set_haptic(&haptic, false);
                    set_torch(&torch, false, &mut reported);
                }
                Element::Gap(_) => thread::sleep(duration),
            }
        }

        match mode {
            PlayMode::Once => break,
            PlayMode::Loop => {
                if cancel.load(Ordering::Acquire) {
                    break;
                }
                thread::sleep(Duration::from_millis(LOOP_PAUSE_UNITS as u64 * unit_ms));
            }
        }
    }

    // Whatever ended the run, leave the hardware dark and quiet.
    set_torch(&torch, false, &mut reported);
    set_haptic(&haptic, false);
    finished.store(true, Ordering::Release);
}

fn set_torch(torch: &SharedTorch, on: bool, reported: &mut bool) {
    if let Err(e) = torch.lock().unwrap().set(on) {
        // One notice per run, then keep walking the plan so haptics and
        // timing stay intact.
        if !*reported {
            log::warn!("torch unavailable during blink run: {}", e);
            *reported = true;
        }
    }
}

fn set_haptic(haptic: &Option<SharedHaptic>, on: bool) {
    if let Some(h) = haptic {
        h.lock().unwrap().set_active(on);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::torch::TorchError;
    use crate::morse;

    #[derive(Default)]
    struct MockTorch {
        on: bool,
        transitions: Vec<bool>,
    }

    impl Torch for MockTorch {
        fn set(&mut self, on: bool) -> Result<(), TorchError> {
            self.on = on;
            self.transitions.push(on);
            Ok(())
        }
    }

    fn mock_sequencer(unit_ms: u64) -> (Arc<Mutex<MockTorch>>, BlinkSequencer) {
        let torch = Arc::new(Mutex::new(MockTorch::default()));
        let shared: SharedTorch = torch.clone();
        (torch, BlinkSequencer::new(shared, None, unit_ms))
    }

    fn pulse_count(torch: &Arc<Mutex<MockTorch>>) -> usize {
        torch.lock().unwrap().transitions.iter().filter(|&&t| t).count()
    }

    #[test]
    fn once_run_self_terminates_with_torch_off() {
        let (torch, seq) = mock_sequencer(2);
        // "E": one dot, 5 units → 10 ms.
        seq.start(morse::encode("E"), PlayMode::Once, false);
        thread::sleep(Duration::from_millis(150));

        assert!(!seq.is_running());
        let torch = torch.lock().unwrap();
        assert!(!torch.on);
        assert_eq!(torch.transitions.iter().filter(|&&t| t).count(), 1);
        assert_eq!(torch.transitions.last(), Some(&false));
    }

    #[test]
    fn loop_run_repeats_until_cancelled() {
        let (torch, seq) = mock_sequencer(1);
        seq.start(morse::sos(), PlayMode::Loop, false);
        // One pass is 27 ms + 7 ms pause; after 300 ms several passes ran.
        thread::sleep(Duration::from_millis(300));
        assert!(seq.is_running());
        assert!(pulse_count(&torch) > 9, "loop should have repeated the plan");

        seq.stop();
        assert!(!seq.is_running());
        assert!(!torch.lock().unwrap().on);
    }

    #[test]
    fn cancellation_stops_further_elements() {
        let (torch, seq) = mock_sequencer(2);
        seq.start(morse::sos(), PlayMode::Loop, false);
        thread::sleep(Duration::from_millis(20));
        seq.stop();

        // stop() joins the run, so the torch is off and no element executes
        // after it returns.
        assert!(!torch.lock().unwrap().on);
        let settled = pulse_count(&torch);
        thread::sleep(Duration::from_millis(100));
        assert_eq!(pulse_count(&torch), settled);
    }

    #[test]
    fn new_run_replaces_active_run() {
        let (torch, seq) = mock_sequencer(2);
        seq.start(morse::sos(), PlayMode::Loop, false);
        thread::sleep(Duration::from_millis(20));

        // Starting Morse playback while SOS loops must leave exactly one run.
        seq.start(morse::encode("E"), PlayMode::Once, false);
        thread::sleep(Duration::from_millis(150));

        assert!(!seq.is_running(), "the replacement Once run should finish");
        let settled = pulse_count(&torch);
        thread::sleep(Duration::from_millis(100));
        assert_eq!(pulse_count(&torch), settled, "old run must not keep blinking");
        assert!(!torch.lock().unwrap().on);
    }

    #[test]
    fn empty_plan_starts_nothing() {
        let (torch, seq) = mock_sequencer(2);
        seq.start(morse::encode("!"), PlayMode::Once, false);
        assert!(!seq.is_running());
        assert!(torch.lock().unwrap().transitions.is_empty());
    }
}
