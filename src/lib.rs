//!
//! A platform-agnostic driver for the INA226 current and power monitor. Built using embedded-hal.
//!
//! The driver owns its I2C bus, remembers which register the chip's pointer is on so repeated
//! reads of one measurement skip the pointer write, and derives the calibration register from the
//! expected maximum current and the shunt resistance.
//!
//! ```rust,no_run
//! use embedded_hal_mock::eh1::i2c::Mock;
//! use ina226::{Averaging, INA226Driver, INA226InitConfig};
//!
//! # fn main() -> Result<(), ina226::INA226Error<embedded_hal::i2c::ErrorKind>> {
//! let i2c = Mock::new(&[]);
//! let mut ina = INA226Driver::new(
//!     i2c,
//!     INA226InitConfig {
//!         address: 0x40,
//!         max_current: 3.3,
//!         shunt_resistance: 0.002,
//!     },
//! )?;
//!
//! ina.begin()?;
//! ina.set_averaging(Averaging::A64)?;
//!
//! let volts = ina.get_bus_voltage()?;
//! let amps = ina.get_current()?;
//! let watts = ina.get_power()?;
//! # let _ = (volts, amps, watts);
//! # Ok(())
//! # }
//! ```
//!

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod calibration;
pub mod driver;
pub mod register;

pub use driver::*;
pub use register::{
    address_from_pins, AddressPin, Averaging, ConfigRegister, ConversionTime, OperatingMode,
    Register,
};
