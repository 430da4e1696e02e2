use crate::calibration::{
    self, BUS_VOLTAGE_LSB, MAX_CALIBRATION_DOUBLINGS, POWER_LSB_FACTOR, SHUNT_VOLTAGE_LSB,
};
use crate::register::{
    Averaging, ConfigRegister, ConversionTime, OperatingMode, Register, POWER_ON_CONFIG,
};
use embedded_hal::i2c::I2c;
use log::{debug, warn};

/// Address with both strap pins tied to ground.
pub const DEFAULT_ADDRESS: u8 = 0x40;

#[derive(Copy, Clone, Debug)]
pub enum INA226Error<I2C> {
    /// The presence probe in `begin` was not acknowledged.
    Connect(I2C),
    I2c(I2C),
    InvalidMaxCurrent,
    CalibrationOverflow,
    /// The current range is so wide for the shunt that the calibration rounds to zero,
    /// which would make current and power always read zero.
    CalibrationUnderflow,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum State {
    Uninitialized,
    Ready,
    Failed,
}

#[derive(Copy, Clone, Debug)]
pub struct INA226InitConfig {
    /// 7-bit bus address, see [`crate::address_from_pins`]
    pub address: u8,
    /// Largest current expected through the shunt, in amps
    pub max_current: f32,
    /// Shunt resistance in ohms
    pub shunt_resistance: f32,
}

/// Matches the common INA226 breakout board: address 0x40 with a 0.1 Ohm shunt, measuring up to
/// 1 A.
impl Default for INA226InitConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            max_current: 1.0,
            shunt_resistance: 0.1,
        }
    }
}

pub struct INA226Driver<I2C> {
    i2c: I2C,
    address: u8,
    max_current: f32,
    shunt_resistance: f32,
    calibration: u16,
    register_pointer: Option<Register>,
    config: ConfigRegister,
    state: State,
}

impl<I2C> INA226Driver<I2C>
where
    I2C: I2c,
{
    ///
    ///
    /// # Arguments
    ///
    /// * `i2c`: The i2c bus.
    /// * `init_config`: Address, expected current range and shunt of the monitor. The max current
    /// is rounded up to a power of two and the shunt resistance is clamped to
    /// [`calibration::MIN_SHUNT_RESISTANCE`].
    ///
    /// No bus traffic happens until [`INA226Driver::begin`] is called.
    ///
    /// returns: Result<INA226Driver<I2C>, INA226Error<<I2C as ErrorType>::Error>>
    pub fn new(i2c: I2C, init_config: INA226InitConfig) -> Result<Self, INA226Error<I2C::Error>> {
        let shunt_resistance = calibration::clamp_shunt_resistance(init_config.shunt_resistance);
        if shunt_resistance != init_config.shunt_resistance {
            warn!(
                "[INA226] Shunt resistance {} too low, clamped to {} Ohm, readings will be inaccurate",
                init_config.shunt_resistance, shunt_resistance
            );
        }

        let max_current = calibration::round_up_to_power_of_two(init_config.max_current)
            .ok_or(INA226Error::InvalidMaxCurrent)?;
        debug!("[INA226] Max current set to {} A", max_current);

        Ok(Self {
            i2c,
            address: init_config.address,
            max_current,
            shunt_resistance,
            calibration: 0,
            register_pointer: None,
            config: ConfigRegister::default(),
            state: State::Uninitialized,
        })
    }

    /// Probes the chip, reads back its configuration and writes the calibration register.
    pub fn begin(&mut self) -> Result<(), INA226Error<I2C::Error>> {
        if let Err(e) = self.i2c.write(self.address, &[]) {
            warn!(
                "[INA226] No response at address {:#04x}: {:?}",
                self.address, e
            );
            self.state = State::Failed;
            return Err(INA226Error::Connect(e));
        }

        let result = self
            .read_config()
            .and_then(|_| self.write_calibration(self.max_current));
        self.state = match result {
            Ok(()) => State::Ready,
            Err(_) => State::Failed,
        };

        result
    }

    /// Bus voltage in volts.
    pub fn get_bus_voltage(&mut self) -> Result<f32, INA226Error<I2C::Error>> {
        Ok(self.read_i16(Register::BusVoltage)? as f32 * BUS_VOLTAGE_LSB)
    }

    /// Shunt voltage in volts, negative for reverse current.
    pub fn get_shunt_voltage(&mut self) -> Result<f32, INA226Error<I2C::Error>> {
        Ok(self.read_i16(Register::ShuntVoltage)? as f32 * SHUNT_VOLTAGE_LSB)
    }

    /// Current in amps, negative for reverse current.
    pub fn get_current(&mut self) -> Result<f32, INA226Error<I2C::Error>> {
        Ok(self.read_i16(Register::Current)? as f32 * self.current_lsb())
    }

    /// Power in watts.
    pub fn get_power(&mut self) -> Result<f32, INA226Error<I2C::Error>> {
        Ok(self.read_i16(Register::Power)? as f32 * POWER_LSB_FACTOR * self.current_lsb())
    }

    pub fn set_averaging(&mut self, averaging: Averaging) -> Result<(), INA226Error<I2C::Error>> {
        self.config.averaging = averaging;
        self.write_config()
    }

    pub fn set_bus_conversion_time(
        &mut self,
        time: ConversionTime,
    ) -> Result<(), INA226Error<I2C::Error>> {
        self.config.bus_conversion_time = time;
        self.write_config()
    }

    pub fn set_shunt_conversion_time(
        &mut self,
        time: ConversionTime,
    ) -> Result<(), INA226Error<I2C::Error>> {
        self.config.shunt_conversion_time = time;
        self.write_config()
    }

    pub fn set_operating_mode(
        &mut self,
        mode: OperatingMode,
    ) -> Result<(), INA226Error<I2C::Error>> {
        self.config.operating_mode = mode;
        self.write_config()
    }

    /// Changes the expected current range and rewrites the calibration register.
    pub fn set_max_current(&mut self, max_current: f32) -> Result<(), INA226Error<I2C::Error>> {
        let max_current = calibration::round_up_to_power_of_two(max_current)
            .ok_or(INA226Error::InvalidMaxCurrent)?;
        debug!("[INA226] Max current set to {} A", max_current);
        self.write_calibration(max_current)
    }

    /// Resets every chip register to its power-on value, then restores the calibration.
    pub fn reset(&mut self) -> Result<(), INA226Error<I2C::Error>> {
        let mut config = self.config;
        config.reset = true;
        self.write_u16(Register::Configuration, config.serialize())?;

        self.register_pointer = None;
        self.config = ConfigRegister::deserialize(POWER_ON_CONFIG);
        self.write_calibration(self.max_current)
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Max current in amps after rounding and any calibration doubling.
    pub fn max_current(&self) -> f32 {
        self.max_current
    }

    pub fn shunt_resistance(&self) -> f32 {
        self.shunt_resistance
    }

    /// Amps per count of the current register.
    pub fn current_lsb(&self) -> f32 {
        calibration::current_lsb(self.max_current)
    }

    /// Last value written to the calibration register.
    pub fn calibration(&self) -> u16 {
        self.calibration
    }

    pub fn config(&self) -> ConfigRegister {
        self.config
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Destroys the driver and hands back the bus.
    pub fn release(self) -> I2C {
        self.i2c
    }

    pub fn read_i16(&mut self, register: Register) -> Result<i16, INA226Error<I2C::Error>> {
        Ok(i16::from_be_bytes(self.read_register(register)?))
    }

    pub fn read_u16(&mut self, register: Register) -> Result<u16, INA226Error<I2C::Error>> {
        Ok(u16::from_be_bytes(self.read_register(register)?))
    }

    fn read_register(&mut self, register: Register) -> Result<[u8; 2], INA226Error<I2C::Error>> {
        self.select_register(register)?;

        let mut read_buffer = [0u8; 2];
        self.i2c
            .read(self.address, &mut read_buffer)
            .map_err(INA226Error::I2c)?;

        Ok(read_buffer)
    }

    /// Moves the chip's register pointer, skipping the write when it is already there.
    fn select_register(&mut self, register: Register) -> Result<(), INA226Error<I2C::Error>> {
        if self.register_pointer == Some(register) {
            return Ok(());
        }

        self.register_pointer = None;
        self.i2c
            .write(self.address, &[register as u8])
            .map_err(INA226Error::I2c)?;
        self.register_pointer = Some(register);

        Ok(())
    }

    fn write_u16(&mut self, register: Register, data: u16) -> Result<(), INA226Error<I2C::Error>> {
        let [msb, lsb] = data.to_be_bytes();

        self.register_pointer = None;
        self.i2c
            .write(self.address, &[register as u8, msb, lsb])
            .map_err(INA226Error::I2c)?;
        self.register_pointer = Some(register);

        Ok(())
    }

    fn read_config(&mut self) -> Result<(), INA226Error<I2C::Error>> {
        self.config = ConfigRegister::deserialize(self.read_u16(Register::Configuration)?);
        Ok(())
    }

    fn write_config(&mut self) -> Result<(), INA226Error<I2C::Error>> {
        self.write_u16(Register::Configuration, self.config.serialize())
    }

    /// Stores `max_current` (possibly doubled) only once the calibration register is written.
    fn write_calibration(&mut self, max_current: f32) -> Result<(), INA226Error<I2C::Error>> {
        let calibration = calibration::compute_calibration(max_current, self.shunt_resistance)
            .ok_or_else(|| {
                warn!(
                    "[INA226] Calibration does not fit after {} doublings of {} A",
                    MAX_CALIBRATION_DOUBLINGS, max_current
                );
                INA226Error::CalibrationOverflow
            })?;

        if calibration.register == 0 {
            warn!(
                "[INA226] Calibration rounds to zero for {} A over {} Ohm",
                max_current, self.shunt_resistance
            );
            return Err(INA226Error::CalibrationUnderflow);
        }

        if calibration.doublings > 0 {
            warn!(
                "[INA226] Maximum current too low for accurate readings, raised from {} A to {} A",
                max_current, calibration.max_current
            );
        }

        debug!(
            "[INA226] Setting calibration register to {} (maximum current {} A)",
            calibration.register, calibration.max_current
        );
        self.write_u16(Register::Calibration, calibration.register)?;
        self.max_current = calibration.max_current;
        self.calibration = calibration.register;

        Ok(())
    }
}

#[cfg(feature = "std")]
impl<I2C> std::fmt::Display for INA226Error<I2C>
where
    I2C: std::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            INA226Error::Connect(i2c) => write!(f, "Unable to connect to INA226: {i2c:?}"),
            INA226Error::I2c(i2c) => write!(f, "I2C Error: {i2c:?}"),
            INA226Error::InvalidMaxCurrent => {
                write!(f, "Max current must be a finite positive number")
            }
            INA226Error::CalibrationOverflow => {
                write!(f, "Calibration register does not fit in 15 bits")
            }
            INA226Error::CalibrationUnderflow => {
                write!(f, "Calibration register rounds to zero")
            }
        }
    }
}

#[cfg(feature = "std")]
impl<I2C> std::error::Error for INA226Error<I2C>
where
    I2C: std::fmt::Debug,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}
