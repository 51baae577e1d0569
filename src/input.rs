// Torchly — Button Input Manager
//
// Debounced click detection over a raw pressed/released level, polled at
// ~100 Hz by the control task.  Single click toggles the torch, double click
// toggles SOS, a 3-second hold powers the device off; the mapping itself
// lives in the control task — this module only classifies presses.

use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use crate::config::*;
use crate::events::ControlEvent;

#[derive(Debug, Clone, Copy)]
enum ClickState {
    Idle,
    /// Button is down. `second` marks a press inside the double-click window.
    Held { since: Instant, second: bool },
    /// First click released; waiting to see if a second press follows.
    AwaitSecondClick { first_release: Instant },
}

pub struct ButtonInput {
    tx: Sender<ControlEvent>,

    // Debounce filter
    last_raw: bool,
    stable_since: Instant,
    pressed: bool,

    state: ClickState,
}

impl ButtonInput {
    pub fn new(tx: Sender<ControlEvent>) -> Self {
        let now = Instant::now();
        Self {
            tx,
            last_raw: false,
            stable_since: now,
            pressed: false,
            state: ClickState::Idle,
        }
    }

    /// Feed the current (polarity-corrected) button level.  Call every ~10 ms.
    pub fn update(&mut self, raw_pressed: bool, now: Instant) {
        if raw_pressed != self.last_raw {
            self.last_raw = raw_pressed;
            self.stable_since = now;
        }

        let stable = now.duration_since(self.stable_since) >= Duration::from_millis(DEBOUNCE_MS);
        if stable && raw_pressed != self.pressed {
            self.pressed = raw_pressed;
            self.on_edge(raw_pressed, now);
        }

        self.check_click_window(now);
    }

    fn on_edge(&mut self, pressed: bool, now: Instant) {
        if pressed {
            let second = matches!(self.state, ClickState::AwaitSecondClick { .. });
            self.state = ClickState::Held { since: now, second };
            return;
        }

        if let ClickState::Held { since, second } = self.state {
            let hold = now.duration_since(since);
            if hold >= Duration::from_millis(LONG_PRESS_MS) {
                self.send(ControlEvent::ButtonLongPress);
                self.state = ClickState::Idle;
            } else if second {
                self.send(ControlEvent::ButtonDoubleClick);
                self.state = ClickState::Idle;
            } else {
                self.state = ClickState::AwaitSecondClick { first_release: now };
            }
        }
    }

    /// A first click only becomes a single click once the double-click
    /// window has expired without a second press.
    fn check_click_window(&mut self, now: Instant) {
        if let ClickState::AwaitSecondClick { first_release } = self.state {
            if now.duration_since(first_release) > Duration::from_millis(DOUBLE_CLICK_WINDOW_MS) {
                self.send(ControlEvent::ButtonSingleClick);
                self.state = ClickState::Idle;
            }
        }
    }

    fn send(&self, event: ControlEvent) {
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    struct Harness {
        input: ButtonInput,
        rx: mpsc::Receiver<ControlEvent>,
        start: Instant,
    }

    impl Harness {
        fn new() -> Self {
            let (tx, rx) = mpsc::channel();
            Self {
                input: ButtonInput::new(tx),
                rx,
                start: Instant::now(),
            }
        }

        fn at(&mut self, ms: u64, pressed: bool) {
            self.input.update(pressed, self.start + Duration::from_millis(ms));
        }

        fn events(&self) -> Vec<ControlEvent> {
            self.rx.try_iter().collect()
        }
    }

    #[test]
    fn single_click_after_window_expiry() {
        let mut h = Harness::new();
        h.at(0, true);
        h.at(60, true); // stable press
        h.at(160, false);
        h.at(220, false); // stable release → click candidate
        h.at(300, false);
        assert!(h.events().is_empty(), "click must wait for the window");
        h.at(700, false); // window expired
        assert_eq!(h.events(), vec![ControlEvent::ButtonSingleClick]);
    }

    #[test]
    fn two_clicks_inside_window_are_a_double() {
        let mut h = Harness::new();
        h.at(0, true);
        h.at(60, true);
        h.at(100, false);
        h.at(160, false); // first release at 160
        h.at(200, true);
        h.at(260, true); // second press inside 400 ms window
        h.at(300, false);
        h.at(360, false); // second release
        assert_eq!(h.events(), vec![ControlEvent::ButtonDoubleClick]);
    }

    #[test]
    fn three_second_hold_is_a_long_press() {
        let mut h = Harness::new();
        h.at(0, true);
        h.at(60, true);
        h.at(3200, false);
        h.at(3260, false);
        assert_eq!(h.events(), vec![ControlEvent::ButtonLongPress]);
    }

    #[test]
    fn sub_debounce_glitch_is_ignored() {
        let mut h = Harness::new();
        h.at(0, true);
        h.at(10, false); // bounced back before the 50 ms filter
        h.at(100, false);
        h.at(700, false);
        assert!(h.events().is_empty());
    }

    #[test]
    fn clicks_separated_by_more_than_the_window_stay_single() {
        let mut h = Harness::new();
        h.at(0, true);
        h.at(60, true);
        h.at(100, false);
        h.at(160, false);
        h.at(600, false); // first window expires
        h.at(700, true);
        h.at(760, true);
        h.at(800, false);
        h.at(860, false);
        h.at(1300, false); // second window expires
        assert_eq!(
            h.events(),
            vec![ControlEvent::ButtonSingleClick, ControlEvent::ButtonSingleClick]
        );
    }
}
