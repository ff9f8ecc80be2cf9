//! Continuous-rotation servo output for the rover.
//!
//! Both drive servos hang off a PCA9685 PWM controller on a shared I2C bus.
//! A normalized throttle in `[-1.0, 1.0]` maps linearly onto the servo pulse
//! range; the right servo is mounted rotated 180° from the left, so its
//! throttle is inverted here rather than in the drive policy.

use core::cell::RefCell;

use embedded_hal::i2c::I2c;
use embedded_hal_bus::i2c::RefCellDevice;
use pwm_pca9685::{Address as PwmAddress, Channel, Error as PwmError, Pca9685};

use crate::utils::{
    config::ServoConfig,
    controllers::drive::{WheelDrive, WheelSpeeds},
};

/// PCA9685 internal oscillator.
const OSC_HZ: f32 = 25_000_000.0;
/// Counter resolution per PWM period.
const TICKS: f32 = 4096.0;

/// Errors that can occur when driving the servos.
#[derive(Debug)]
pub enum ServoError<E: core::fmt::Debug> {
    PwmError(PwmError<E>),
}

/// Two continuous-rotation servos on one PCA9685.
pub struct ServoDrive<'a, I2C: 'static> {
    pwm: Pca9685<RefCellDevice<'a, I2C>>,
    /// (left, right)
    channels: (Channel, Channel),
    config: ServoConfig,
}

impl<'a, I2C, E> ServoDrive<'a, I2C>
where
    I2C: I2c<Error = E> + 'static,
    E: core::fmt::Debug,
{
    /// Create the driver. No bus traffic happens until [`configure`](Self::configure).
    pub fn new(
        i2c_bus: &'a RefCell<I2C>,
        config: ServoConfig,
    ) -> Result<Self, ServoError<E>> {
        let pwm = Pca9685::new(
            RefCellDevice::new(i2c_bus),
            PwmAddress::from(config.address),
        )
        .map_err(ServoError::PwmError)?;
        Ok(ServoDrive {
            pwm,
            channels: (Channel::C0, Channel::C1),
            config,
        })
    }

    /// Wake the controller and set the PWM frequency.
    pub fn configure(&mut self) -> Result<(), ServoError<E>> {
        self.pwm.enable().map_err(ServoError::PwmError)?;
        let prescale = prescale_for(self.config.frequency_hz);
        self.pwm
            .set_prescale(prescale)
            .map_err(ServoError::PwmError)?;
        tracing::info!(
            prescale,
            frequency_hz = self.config.frequency_hz,
            "servo PWM configured"
        );
        Ok(())
    }

    /// Counter value at which the pulse for `throttle` ends.
    pub fn ticks_for(
        &self,
        throttle: f32,
    ) -> u16 {
        let cfg = &self.config;
        let throttle = throttle.clamp(-1.0, 1.0);
        let span = cfg.max_pulse_us - cfg.min_pulse_us;
        let pulse_us = cfg.min_pulse_us + (throttle + 1.0) / 2.0 * span;
        let period_us = 1_000_000.0 / cfg.frequency_hz;
        libm::roundf(pulse_us * TICKS / period_us).clamp(0.0, TICKS - 1.0) as u16
    }
}

impl<I2C, E> WheelDrive for ServoDrive<'_, I2C>
where
    I2C: I2c<Error = E> + 'static,
    E: core::fmt::Debug,
{
    type Error = ServoError<E>;

    fn set_speeds(
        &mut self,
        speeds: WheelSpeeds,
    ) -> Result<(), Self::Error> {
        let left = self.ticks_for(speeds.left);
        let right = self.ticks_for(-speeds.right);
        let (left_ch, right_ch) = self.channels;
        self.pwm
            .set_channel_on_off(left_ch, 0, left)
            .map_err(ServoError::PwmError)?;
        self.pwm
            .set_channel_on_off(right_ch, 0, right)
            .map_err(ServoError::PwmError)?;
        Ok(())
    }
}

/// Prescaler value for a PWM frequency, per the PCA9685 datasheet.
pub fn prescale_for(frequency_hz: f32) -> u8 {
    let value = libm::roundf(OSC_HZ / (TICKS * frequency_hz)) - 1.0;
    value.clamp(3.0, 255.0) as u8
}
