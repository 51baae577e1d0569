// Torchly — Console Task
//
// Line-oriented command surface on the UART console (stdin).  Parses each
// line into a control event; anything unrecognised prints the help text.

use std::io::{self, BufRead};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use crate::events::{ControlEvent, SettingChange};
use crate::settings::AutoOffTimer;

pub fn console_task(control_tx: Sender<ControlEvent>) {
    log::info!("Console task started — type 'help' for commands");

    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        line.clear();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => {
                // Nothing buffered on the UART yet.
                thread::sleep(Duration::from_millis(100));
            }
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match parse_line(trimmed) {
                    Some(event) => {
                        if control_tx.send(event).is_err() {
                            log::warn!("Control channel closed — exiting console task");
                            return;
                        }
                    }
                    None => print_help(),
                }
            }
            Err(e) => {
                log::warn!("Console read error: {}", e);
                thread::sleep(Duration::from_secs(1));
            }
        }
    }
}

/// Parse one command line.  `None` means "show help".
fn parse_line(line: &str) -> Option<ControlEvent> {
    let (cmd, rest) = match line.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (line, ""),
    };

    match cmd.to_ascii_lowercase().as_str() {
        "torch" => match rest.to_ascii_lowercase().as_str() {
            "on" => Some(ControlEvent::SetTorch(true)),
            "off" => Some(ControlEvent::SetTorch(false)),
            "toggle" => Some(ControlEvent::ToggleTorch),
            _ => None,
        },
        "brightness" => rest.parse::<f32>().ok().map(ControlEvent::SetBrightness),
        "sos" => match rest.to_ascii_lowercase().as_str() {
            "start" => Some(ControlEvent::StartSos),
            "stop" => Some(ControlEvent::StopSos),
            _ => None,
        },
        "morse" if !rest.is_empty() => Some(ControlEvent::PlayMorse(rest.to_string())),
        "stop" => Some(ControlEvent::StopPlayback),
        "status" => Some(ControlEvent::ReportStatus),
        "set" => {
            let (key, value) = rest.split_once(char::is_whitespace)?;
            parse_setting(key, value.trim()).map(ControlEvent::Apply)
        }
        _ => None,
    }
}

fn parse_setting(key: &str, value: &str) -> Option<SettingChange> {
    match key.to_ascii_lowercase().as_str() {
        "shake_sensitivity" => value.parse::<f32>().ok().map(SettingChange::ShakeSensitivity),
        "vibration" | "vibration_enabled" => parse_bool(value).map(SettingChange::VibrationEnabled),
        "auto_off" | "auto_off_timer" => parse_auto_off(value).map(SettingChange::AutoOff),
        "shake_to_flash" => parse_bool(value).map(SettingChange::ShakeToFlash),
        _ => None,
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Some(true),
        "off" | "false" | "0" => Some(false),
        _ => None,
    }
}

fn parse_auto_off(value: &str) -> Option<AutoOffTimer> {
    match value.to_ascii_lowercase().as_str() {
        "off" => Some(AutoOffTimer::Off),
        "2" | "2min" => Some(AutoOffTimer::TwoMin),
        "5" | "5min" => Some(AutoOffTimer::FiveMin),
        "10" | "10min" => Some(AutoOffTimer::TenMin),
        _ => None,
    }
}

fn print_help() {
    println!("commands:");
    println!("  torch on|off|toggle");
    println!("  brightness <0.0-1.0>");
    println!("  sos start|stop");
    println!("  morse <text>          blink text as Morse code (A-Z, 0-9)");
    println!("  stop                  stop any blinking");
    println!("  status");
    println!("  set shake_sensitivity <0.0-1.0>");
    println!("  set vibration on|off");
    println!("  set auto_off off|2min|5min|10min");
    println!("  set shake_to_flash on|off");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn torch_commands() {
        assert_eq!(parse_line("torch on"), Some(ControlEvent::SetTorch(true)));
        assert_eq!(parse_line("torch off"), Some(ControlEvent::SetTorch(false)));
        assert_eq!(parse_line("TORCH TOGGLE"), Some(ControlEvent::ToggleTorch));
        assert_eq!(parse_line("torch sideways"), None);
    }

    #[test]
    fn brightness_parses_a_float() {
        assert_eq!(parse_line("brightness 0.75"), Some(ControlEvent::SetBrightness(0.75)));
        assert_eq!(parse_line("brightness bright"), None);
    }

    #[test]
    fn morse_keeps_the_full_message() {
        assert_eq!(
            parse_line("morse hello world"),
            Some(ControlEvent::PlayMorse("hello world".into()))
        );
        // Bare "morse" has nothing to blink.
        assert_eq!(parse_line("morse"), None);
    }

    #[test]
    fn sos_and_stop() {
        assert_eq!(parse_line("sos start"), Some(ControlEvent::StartSos));
        assert_eq!(parse_line("sos stop"), Some(ControlEvent::StopSos));
        assert_eq!(parse_line("stop"), Some(ControlEvent::StopPlayback));
    }

    #[test]
    fn settings_commands() {
        assert_eq!(
            parse_line("set shake_sensitivity 0.8"),
            Some(ControlEvent::Apply(SettingChange::ShakeSensitivity(0.8)))
        );
        assert_eq!(
            parse_line("set vibration off"),
            Some(ControlEvent::Apply(SettingChange::VibrationEnabled(false)))
        );
        assert_eq!(
            parse_line("set auto_off 10min"),
            Some(ControlEvent::Apply(SettingChange::AutoOff(AutoOffTimer::TenMin)))
        );
        assert_eq!(
            parse_line("set shake_to_flash on"),
            Some(ControlEvent::Apply(SettingChange::ShakeToFlash(true)))
        );
        assert_eq!(parse_line("set unknown 1"), None);
    }

    #[test]
    fn garbage_asks_for_help() {
        assert_eq!(parse_line("blink faster"), None);
    }
}
