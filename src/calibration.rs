//! Scaling between raw register counts and physical units.

/// Internal fixed scaling constant of the chip's calibration equation.
pub const CALIBRATION_SCALE: f32 = 0.00512;
/// Full-scale count of the current register (2^15).
pub const CURRENT_FULL_SCALE: f32 = 32768.0;
/// Largest calibration value; the top bit of the register must stay clear.
pub const MAX_CALIBRATION: u16 = 0x7FFF;
/// Smallest shunt resistance the calibration register can express.
pub const MIN_SHUNT_RESISTANCE: f32 = CALIBRATION_SCALE / 16384.0;
/// Upper bound on how often the max current is doubled to fit the calibration.
pub const MAX_CALIBRATION_DOUBLINGS: u32 = 64;

/// Bus voltage LSB in volts (1.25 mV).
pub const BUS_VOLTAGE_LSB: f32 = 0.00125;
/// Shunt voltage LSB in volts (2.5 uV).
pub const SHUNT_VOLTAGE_LSB: f32 = 0.0000025;
/// Power LSB as a multiple of the current LSB.
pub const POWER_LSB_FACTOR: f32 = 25.0;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Calibration {
    /// Max current the register value was computed for, possibly doubled.
    pub max_current: f32,
    /// Value to write to the calibration register.
    pub register: u16,
    /// How many times the requested max current was doubled.
    pub doublings: u32,
}

/// Clamps `resistance` to [`MIN_SHUNT_RESISTANCE`], also catching NaN.
pub fn clamp_shunt_resistance(resistance: f32) -> f32 {
    if resistance >= MIN_SHUNT_RESISTANCE {
        resistance
    } else {
        MIN_SHUNT_RESISTANCE
    }
}

/// Rounds `value` up to the nearest power of two.
///
/// Returns `None` for zero, negative or non-finite input, and for values
/// above 2^127 whose next power of two is not representable.
pub fn round_up_to_power_of_two(value: f32) -> Option<f32> {
    if !value.is_finite() || value <= 0.0 {
        return None;
    }

    let bits = value.to_bits();
    let exponent = bits >> F32_MANTISSA_BITS;
    let mantissa = bits & F32_MANTISSA_MASK;

    if exponent == 0 {
        // Subnormal powers of two have a single mantissa bit set, and
        // carrying out of the mantissa lands exactly on 2^-126.
        return Some(f32::from_bits(mantissa.next_power_of_two()));
    }
    if mantissa == 0 {
        return Some(value);
    }
    if exponent + 1 >= F32_EXPONENT_MAX {
        return None;
    }

    Some(f32::from_bits((exponent + 1) << F32_MANTISSA_BITS))
}

const F32_MANTISSA_BITS: u32 = 23;
const F32_MANTISSA_MASK: u32 = (1 << F32_MANTISSA_BITS) - 1;
const F32_EXPONENT_MAX: u32 = 0xFF;

pub fn current_lsb(max_current: f32) -> f32 {
    max_current / CURRENT_FULL_SCALE
}

/// Unrounded calibration register value for the given range and shunt.
pub fn calibration_value(max_current: f32, shunt_resistance: f32) -> f32 {
    CALIBRATION_SCALE / (current_lsb(max_current) * shunt_resistance)
}

/// Computes the calibration register value, doubling `max_current` until it
/// fits in 15 bits.
///
/// Returns `None` if it still does not fit after
/// [`MAX_CALIBRATION_DOUBLINGS`] doublings.
pub fn compute_calibration(max_current: f32, shunt_resistance: f32) -> Option<Calibration> {
    let mut max_current = max_current;

    for doublings in 0..=MAX_CALIBRATION_DOUBLINGS {
        // `as` saturates, so an infinite value lands above the limit too.
        let register = (calibration_value(max_current, shunt_resistance) + 0.5) as u32;
        if register <= MAX_CALIBRATION as u32 {
            return Some(Calibration {
                max_current,
                register: register as u16,
                doublings,
            });
        }
        max_current *= 2.0;
    }

    None
}
