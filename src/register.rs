/// Register pointer values of the INA226.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Register {
    Configuration = 0x00,
    ShuntVoltage = 0x01,
    BusVoltage = 0x02,
    Power = 0x03,
    Current = 0x04,
    Calibration = 0x05,
    MaskEnable = 0x06,
    AlertLimit = 0x07,
}

const RESET_BIT: u16 = 1 << 15;
const AVERAGING_SHIFT: u16 = 9;
const BUS_CONVERSION_TIME_SHIFT: u16 = 6;
const SHUNT_CONVERSION_TIME_SHIFT: u16 = 3;
const FIELD_MASK: u16 = 0b111;

/// Configuration register value after a power-on or software reset.
pub const POWER_ON_CONFIG: u16 = 0x4127;

/// Number of samples averaged per result.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Averaging {
    A1 = 0,
    A4 = 1,
    A16 = 2,
    A64 = 3,
    A128 = 4,
    A256 = 5,
    A512 = 6,
    A1024 = 7,
}

impl Averaging {
    fn from_bits(bits: u16) -> Self {
        match bits & FIELD_MASK {
            0 => Averaging::A1,
            1 => Averaging::A4,
            2 => Averaging::A16,
            3 => Averaging::A64,
            4 => Averaging::A128,
            5 => Averaging::A256,
            6 => Averaging::A512,
            _ => Averaging::A1024,
        }
    }
}

/// ADC conversion time, shared by the bus and shunt voltage fields.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConversionTime {
    T140us = 0,
    T204us = 1,
    T332us = 2,
    T588us = 3,
    T1100us = 4,
    T2116us = 5,
    T4156us = 6,
    T8244us = 7,
}

impl ConversionTime {
    fn from_bits(bits: u16) -> Self {
        match bits & FIELD_MASK {
            0 => ConversionTime::T140us,
            1 => ConversionTime::T204us,
            2 => ConversionTime::T332us,
            3 => ConversionTime::T588us,
            4 => ConversionTime::T1100us,
            5 => ConversionTime::T2116us,
            6 => ConversionTime::T4156us,
            _ => ConversionTime::T8244us,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OperatingMode {
    PowerDown = 0,
    ShuntTriggered = 1,
    BusTriggered = 2,
    ShuntAndBusTriggered = 3,
    /// Behaves as power-down on the chip.
    Reserved = 4,
    ShuntContinuous = 5,
    BusContinuous = 6,
    ShuntAndBusContinuous = 7,
}

impl OperatingMode {
    fn from_bits(bits: u16) -> Self {
        match bits & FIELD_MASK {
            0 => OperatingMode::PowerDown,
            1 => OperatingMode::ShuntTriggered,
            2 => OperatingMode::BusTriggered,
            3 => OperatingMode::ShuntAndBusTriggered,
            4 => OperatingMode::Reserved,
            5 => OperatingMode::ShuntContinuous,
            6 => OperatingMode::BusContinuous,
            _ => OperatingMode::ShuntAndBusContinuous,
        }
    }
}

/// In-memory copy of the configuration register.
///
/// The chip has no partial writes, so every change is applied by writing
/// the whole serialized word back.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ConfigRegister {
    pub reset: bool,
    pub averaging: Averaging,
    pub bus_conversion_time: ConversionTime,
    pub shunt_conversion_time: ConversionTime,
    pub operating_mode: OperatingMode,
}

impl Default for ConfigRegister {
    fn default() -> Self {
        Self::deserialize(POWER_ON_CONFIG)
    }
}

impl ConfigRegister {
    /// Packs the fields into the register word. Reserved bits 14..12 are
    /// written as zero.
    pub fn serialize(&self) -> u16 {
        let mut data = if self.reset { RESET_BIT } else { 0 };
        data |= (self.averaging as u16) << AVERAGING_SHIFT;
        data |= (self.bus_conversion_time as u16) << BUS_CONVERSION_TIME_SHIFT;
        data |= (self.shunt_conversion_time as u16) << SHUNT_CONVERSION_TIME_SHIFT;
        data | self.operating_mode as u16
    }

    /// Unpacks a register word. The reset bit is a pulse and is never kept.
    pub fn deserialize(data: u16) -> Self {
        Self {
            reset: false,
            averaging: Averaging::from_bits(data >> AVERAGING_SHIFT),
            bus_conversion_time: ConversionTime::from_bits(data >> BUS_CONVERSION_TIME_SHIFT),
            shunt_conversion_time: ConversionTime::from_bits(data >> SHUNT_CONVERSION_TIME_SHIFT),
            operating_mode: OperatingMode::from_bits(data),
        }
    }
}

/// Connection of an address strap pin (A0 or A1).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AddressPin {
    Gnd = 0,
    Vs = 1,
    Sda = 2,
    Scl = 3,
}

/// 7-bit bus address selected by the A1/A0 strap pins.
pub fn address_from_pins(a1: AddressPin, a0: AddressPin) -> u8 {
    0x40 | ((a1 as u8) << 2) | a0 as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_on_default_fields() {
        let config = ConfigRegister::default();
        assert_eq!(config.averaging, Averaging::A1);
        assert_eq!(config.bus_conversion_time, ConversionTime::T1100us);
        assert_eq!(config.shunt_conversion_time, ConversionTime::T1100us);
        assert_eq!(config.operating_mode, OperatingMode::ShuntAndBusContinuous);
        assert!(!config.reset);
    }

    #[test]
    fn serialize_places_fields_at_chip_offsets() {
        let config = ConfigRegister {
            reset: false,
            averaging: Averaging::A1024,
            bus_conversion_time: ConversionTime::T140us,
            shunt_conversion_time: ConversionTime::T8244us,
            operating_mode: OperatingMode::BusTriggered,
        };
        assert_eq!(config.serialize(), 0b0000_1110_0011_1010);
    }

    #[test]
    fn reset_bit_is_serialized_but_never_deserialized() {
        let mut config = ConfigRegister::default();
        config.reset = true;
        let word = config.serialize();
        assert_eq!(word, 0x8127);
        assert!(!ConfigRegister::deserialize(word).reset);
    }

    #[test]
    fn round_trip_keeps_fields_and_drops_reset_and_reserved() {
        for word in [0x0000u16, 0x4127, 0x8FFF, 0x0A5B, 0x7FFF, 0xFFFF, 0x0249] {
            let config = ConfigRegister::deserialize(word);
            assert_eq!(config.serialize(), word & 0x0FFF);
            assert_eq!(ConfigRegister::deserialize(config.serialize()), config);
        }
    }

    #[test]
    fn strap_pin_addresses() {
        assert_eq!(address_from_pins(AddressPin::Gnd, AddressPin::Gnd), 0x40);
        assert_eq!(address_from_pins(AddressPin::Gnd, AddressPin::Vs), 0x41);
        assert_eq!(address_from_pins(AddressPin::Vs, AddressPin::Sda), 0x46);
        assert_eq!(address_from_pins(AddressPin::Scl, AddressPin::Scl), 0x4F);
    }
}
