//! GPIO rig construction for the door controller.
//!
//! On Linux the real rig opens the Raspberry Pi pin header through
//! `rppal`; elsewhere there is no GPIO to drive and the simulated rig
//! stands in so the client can be developed off-device.

use doorbot_core::hardware::ActuatorRig;

#[cfg(target_os = "linux")]
pub fn open() -> anyhow::Result<Box<dyn ActuatorRig>> {
    Ok(Box::new(gpio::GpioRig::open()?))
}

#[cfg(not(target_os = "linux"))]
pub fn open() -> anyhow::Result<Box<dyn ActuatorRig>> {
    tracing::warn!("no GPIO support on this platform; using the simulated rig");
    Ok(Box::new(doorbot_core::hardware::SimulatedRig::new()))
}

#[cfg(target_os = "linux")]
mod gpio {
    use doorbot_core::config::PWM_FREQUENCY_HZ;
    use doorbot_core::error::DoorbotError;
    use doorbot_core::hardware::{ActuatorRig, MotorDirection};
    use rppal::gpio::{Gpio, InputPin, OutputPin};
    use rppal::pwm::{Channel, Polarity, Pwm};

    // BCM pin assignments for the production door controller.
    const RELAY_PIN: u8 = 4;
    const DIRECTION_PIN: u8 = 15;
    const LIMIT_SWITCH_PIN: u8 = 7;
    // The motor PWM line (BCM 18) is hardware PWM channel 0.
    const MOTOR_PWM_CHANNEL: Channel = Channel::Pwm0;

    /// The physical actuator: relay and direction outputs, the PWM motor
    /// channel, and the limit-switch input (pull-up; pressed pulls low).
    /// Pins reset to their rest state when the rig is dropped.
    pub struct GpioRig {
        relay: OutputPin,
        direction: OutputPin,
        motor: Pwm,
        limit_switch: InputPin,
    }

    impl GpioRig {
        pub fn open() -> doorbot_core::Result<Self> {
            let gpio = Gpio::new().map_err(hw)?;
            let relay = gpio.get(RELAY_PIN).map_err(hw)?.into_output_low();
            let direction = gpio.get(DIRECTION_PIN).map_err(hw)?.into_output_low();
            let limit_switch = gpio.get(LIMIT_SWITCH_PIN).map_err(hw)?.into_input_pullup();
            let motor = Pwm::with_frequency(
                MOTOR_PWM_CHANNEL,
                PWM_FREQUENCY_HZ,
                0.0,
                Polarity::Normal,
                false,
            )
            .map_err(hw)?;
            tracing::info!("GPIO initialized");
            Ok(Self {
                relay,
                direction,
                motor,
                limit_switch,
            })
        }
    }

    fn hw(e: impl std::fmt::Display) -> DoorbotError {
        DoorbotError::Hardware(e.to_string())
    }

    impl ActuatorRig for GpioRig {
        fn set_relay(&mut self, on: bool) -> doorbot_core::Result<()> {
            if on {
                self.relay.set_high();
            } else {
                self.relay.set_low();
            }
            Ok(())
        }

        fn set_direction(&mut self, direction: MotorDirection) -> doorbot_core::Result<()> {
            match direction {
                MotorDirection::Unlock => self.direction.set_high(),
                MotorDirection::Lock => self.direction.set_low(),
            }
            Ok(())
        }

        fn motor_start(&mut self, duty_cycle_pct: f64) -> doorbot_core::Result<()> {
            self.motor
                .set_duty_cycle(duty_cycle_pct / 100.0)
                .map_err(hw)?;
            self.motor.enable().map_err(hw)
        }

        fn motor_stop(&mut self) -> doorbot_core::Result<()> {
            self.motor.disable().map_err(hw)
        }

        fn limit_switch_pressed(&mut self) -> doorbot_core::Result<bool> {
            Ok(self.limit_switch.is_low())
        }
    }
}
