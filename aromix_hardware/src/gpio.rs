//! GPIO/PWM actuator backend (Raspberry Pi, via rppal).
//!
//! Pumps and fans run on software PWM; valves are plain outputs.

use crate::error::HwError;
use aromix_traits::Actuators;
use rppal::gpio::{Gpio, OutputPin};

/// Software PWM frequency for pumps and fans (Hz).
const PWM_FREQUENCY_HZ: f64 = 1000.0;

pub struct GpioActuators {
    pumps: Vec<OutputPin>,
    valves: Vec<OutputPin>,
    fans: Vec<OutputPin>,
}

impl GpioActuators {
    /// Claim the given BCM pins. Pin order maps to actuator ids.
    pub fn new(pump_pins: &[u8], valve_pins: &[u8], fan_pins: &[u8]) -> Result<Self, HwError> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        let claim = |pins: &[u8]| -> Result<Vec<OutputPin>, HwError> {
            pins.iter()
                .map(|&p| {
                    gpio.get(p)
                        .map(rppal::gpio::Pin::into_output_low)
                        .map_err(|e| HwError::Gpio(format!("pin {p}: {e}")))
                })
                .collect()
        };
        Ok(Self {
            pumps: claim(pump_pins)?,
            valves: claim(valve_pins)?,
            fans: claim(fan_pins)?,
        })
    }

    fn drive_pwm(pin: &mut OutputPin, percent: u8) -> Result<(), HwError> {
        if percent == 0 {
            pin.clear_pwm().map_err(|e| HwError::Gpio(e.to_string()))?;
            pin.set_low();
            return Ok(());
        }
        let duty = f64::from(percent.min(100)) / 100.0;
        pin.set_pwm_frequency(PWM_FREQUENCY_HZ, duty)
            .map_err(|e| HwError::Gpio(e.to_string()))
    }
}

impl Actuators for GpioActuators {
    fn set_pump(
        &mut self,
        id: u8,
        percent: u8,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let Some(pin) = self.pumps.get_mut(id as usize) else {
            return Ok(());
        };
        tracing::debug!(pump = id, percent, "gpio pump");
        Self::drive_pwm(pin, percent)?;
        Ok(())
    }

    fn set_valve(
        &mut self,
        id: u8,
        open: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let Some(pin) = self.valves.get_mut(id as usize) else {
            return Ok(());
        };
        tracing::debug!(valve = id, open, "gpio valve");
        if open {
            pin.set_high();
        } else {
            pin.set_low();
        }
        Ok(())
    }

    fn set_fan(
        &mut self,
        id: u8,
        percent: u8,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let Some(pin) = self.fans.get_mut(id as usize) else {
            return Ok(());
        };
        tracing::debug!(fan = id, percent, "gpio fan");
        Self::drive_pwm(pin, percent)?;
        Ok(())
    }
}
