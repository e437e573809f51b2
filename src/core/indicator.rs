//! Status LEDs
//!
//! The green LED flashes when a cycle's data reached every output, the
//! red one when an output failed. Each has a mode from the settings:
//!
//! | mode       | lights on                  | after the pulse           |
//! |------------|----------------------------|---------------------------|
//! | `all`      | every qualifying cycle     | off                       |
//! | `first`    | the first qualifying cycle | off                       |
//! | `constant` | every failure (red only)   | on until the next success |
//! | `off`      | never                      |                           |

use airpi_core::gpio::{Direction, SysfsPin};
use anyhow::Result;

/// When an LED lights; unrecognised setting text means `Off`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LedMode {
    All,
    First,
    Constant,
    #[default]
    Off,
}

impl LedMode {
    pub fn from_setting(text: &str) -> Self {
        match text.trim().to_ascii_lowercase().as_str() {
            "all" => LedMode::All,
            "first" => LedMode::First,
            "constant" => LedMode::Constant,
            _ => LedMode::Off,
        }
    }
}

/// A light that can be switched on and off
pub trait StatusLight: Send {
    fn set(&mut self, on: bool) -> Result<()>;
}

/// An LED on a sysfs GPIO pin
pub struct SysfsLight {
    pin: SysfsPin,
}

impl SysfsLight {
    /// Export `pin` as an output, initially low
    pub fn open(pin: u32) -> Result<Self> {
        let pin = SysfsPin::open(pin, Direction::Out)?;
        pin.write(false)?;
        Ok(Self { pin })
    }
}

impl StatusLight for SysfsLight {
    fn set(&mut self, on: bool) -> Result<()> {
        self.pin.write(on)
    }
}

fn switch(light: &mut Option<Box<dyn StatusLight>>, on: bool, which: &str) {
    if let Some(light) = light.as_mut() {
        if let Err(e) = light.set(on) {
            log::warn!("Failed to switch {} LED: {:#}", which, e);
        }
    }
}

/// The pair of status LEDs and their modes
pub struct Indicators {
    green: Option<Box<dyn StatusLight>>,
    red: Option<Box<dyn StatusLight>>,
    success_mode: LedMode,
    fail_mode: LedMode,
    green_has_lit: bool,
    red_has_lit: bool,
    red_on: bool,
}

impl Indicators {
    pub fn new(
        green: Option<Box<dyn StatusLight>>,
        red: Option<Box<dyn StatusLight>>,
        success_mode: LedMode,
        fail_mode: LedMode,
    ) -> Self {
        Self {
            green,
            red,
            success_mode,
            fail_mode,
            green_has_lit: false,
            red_has_lit: false,
            red_on: false,
        }
    }

    /// No LEDs fitted
    pub fn none() -> Self {
        Self::new(None, None, LedMode::Off, LedMode::Off)
    }

    /// Open the GPIO pins named in the settings; pin 0 means not fitted
    pub fn from_pins(
        green_pin: u32,
        red_pin: u32,
        success_mode: LedMode,
        fail_mode: LedMode,
    ) -> Result<Self> {
        let open = |pin: u32| -> Result<Option<Box<dyn StatusLight>>> {
            if pin == 0 {
                return Ok(None);
            }
            let light: Box<dyn StatusLight> = Box::new(SysfsLight::open(pin)?);
            Ok(Some(light))
        };
        Ok(Self::new(open(green_pin)?, open(red_pin)?, success_mode, fail_mode))
    }

    /// All outputs succeeded this cycle.
    ///
    /// Also clears a `constant` fail LED left on by an earlier failure.
    pub fn signal_success(&mut self) {
        if self.fail_mode == LedMode::Constant && self.red_on {
            switch(&mut self.red, false, "red");
            self.red_on = false;
        }
        let light = match self.success_mode {
            LedMode::All => true,
            LedMode::First => !self.green_has_lit,
            LedMode::Constant | LedMode::Off => false,
        };
        if light && self.green.is_some() {
            switch(&mut self.green, true, "green");
            self.green_has_lit = true;
        }
    }

    /// An output failed this cycle
    pub fn signal_failure(&mut self) {
        let light = match self.fail_mode {
            LedMode::All | LedMode::Constant => true,
            LedMode::First => !self.red_has_lit,
            LedMode::Off => false,
        };
        if light && self.red.is_some() {
            switch(&mut self.red, true, "red");
            self.red_has_lit = true;
            self.red_on = true;
        }
    }

    /// End of the indicator pulse
    pub fn settle(&mut self) {
        switch(&mut self.green, false, "green");
        if self.fail_mode != LedMode::Constant {
            switch(&mut self.red, false, "red");
            self.red_on = false;
        }
    }

    pub fn all_off(&mut self) {
        switch(&mut self.green, false, "green");
        switch(&mut self.red, false, "red");
        self.red_on = false;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Light that records every switch
    #[derive(Clone, Default)]
    pub(crate) struct RecordingLight(pub Arc<Mutex<Vec<bool>>>);

    impl RecordingLight {
        pub(crate) fn history(&self) -> Vec<bool> {
            self.0.lock().unwrap().clone()
        }

        pub(crate) fn is_on(&self) -> bool {
            self.history().last().copied().unwrap_or(false)
        }
    }

    impl StatusLight for RecordingLight {
        fn set(&mut self, on: bool) -> Result<()> {
            self.0.lock().unwrap().push(on);
            Ok(())
        }
    }

    fn indicators(success: LedMode, fail: LedMode) -> (Indicators, RecordingLight, RecordingLight) {
        let green = RecordingLight::default();
        let red = RecordingLight::default();
        let ind = Indicators::new(Some(Box::new(green.clone())), Some(Box::new(red.clone())), success, fail);
        (ind, green, red)
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!(LedMode::from_setting("ALL"), LedMode::All);
        assert_eq!(LedMode::from_setting(" first "), LedMode::First);
        assert_eq!(LedMode::from_setting("constant"), LedMode::Constant);
        assert_eq!(LedMode::from_setting("blink"), LedMode::Off);
    }

    #[test]
    fn test_success_all_pulses_every_cycle() {
        let (mut ind, green, _) = indicators(LedMode::All, LedMode::Off);
        for _ in 0..2 {
            ind.signal_success();
            assert!(green.is_on());
            ind.settle();
            assert!(!green.is_on());
        }
        assert_eq!(green.history(), vec![true, false, true, false]);
    }

    #[test]
    fn test_first_lights_once() {
        let (mut ind, green, red) = indicators(LedMode::First, LedMode::First);
        ind.signal_success();
        ind.settle();
        ind.signal_success();
        assert!(!green.is_on());

        ind.signal_failure();
        ind.settle();
        ind.signal_failure();
        assert!(!red.is_on());
        // the first settle already switched red off once
        assert_eq!(red.history(), vec![false, true, false]);
    }

    #[test]
    fn test_constant_fail_stays_on() {
        let (mut ind, _, red) = indicators(LedMode::Off, LedMode::Constant);
        ind.signal_failure();
        ind.settle();
        assert!(red.is_on());
        ind.all_off();
        assert!(!red.is_on());
    }

    #[test]
    fn test_constant_fail_cleared_by_next_success() {
        let (mut ind, green, red) = indicators(LedMode::All, LedMode::Constant);
        ind.signal_failure();
        ind.settle();
        assert!(red.is_on());

        ind.signal_success();
        assert!(!red.is_on());
        assert!(green.is_on());
        ind.settle();
        ind.signal_success();
        ind.settle();
        assert!(!red.is_on());
        assert_eq!(red.history(), vec![true, false]);
    }

    #[test]
    fn test_no_leds_is_harmless() {
        let mut ind = Indicators::none();
        ind.signal_success();
        ind.signal_failure();
        ind.settle();
        ind.all_off();
    }
}
