// Magic Wand — Haptic Motor Driver
//
// GPIO-driven vibration motor; one pulse per recognised gesture.

use std::thread;
use std::time::Duration;

use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};

use magic_wand::config::HAPTIC_PULSE_MS;
use magic_wand::events::GestureEvent;
use magic_wand::output::GestureSink;

pub struct HapticDriver<'d> {
    pin: PinDriver<'d, AnyOutputPin, Output>,
}

impl<'d> HapticDriver<'d> {
    pub fn new(pin: PinDriver<'d, AnyOutputPin, Output>) -> Self {
        Self { pin }
    }

    /// Vibrate for a custom duration (blocks the calling thread).
    pub fn buzz(&mut self, duration: Duration) -> anyhow::Result<()> {
        self.pin.set_high()?;
        thread::sleep(duration);
        self.pin.set_low()?;
        Ok(())
    }
}

impl GestureSink for HapticDriver<'_> {
    fn emit(&mut self, event: &GestureEvent) -> anyhow::Result<()> {
        if event.is_gesture() {
            self.buzz(Duration::from_millis(HAPTIC_PULSE_MS))?;
        }
        Ok(())
    }
}
