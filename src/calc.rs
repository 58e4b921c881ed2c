//! Conversion of raw readings into normalized values and UV indices.
//!
//! Formulas follow the Vishay application note "Designing the VEML6070 UV
//! Light Sensor Into Applications", page 5. All functions are pure.

use crate::settings::{IntegrationTime, KiloOhms};
use crate::{RiskLevel, SensorValue, UvIndex};

/// Refresh time at 1T is 125 ms for a 300 kΩ RSET and scales linearly.
const REFRESH_MS_AT_300K: f32 = 125.0;

/// Normalized counts per UV index step for a 270 kΩ RSET.
const COUNTS_PER_UVI_270K: f32 = 186.67;

/// Multiplier of the given integration time relative to 1T.
pub fn integration_multiplier(it: IntegrationTime) -> f32 {
    it.multiplier()
}

/// Scales a raw reading back to its 1T equivalent.
pub fn normalized_value(raw: u16, it: IntegrationTime) -> f32 {
    raw as f32 / integration_multiplier(it)
}

/// Time the sensor needs to refresh its data registers, in milliseconds.
pub fn refresh_time_ms(r_set: KiloOhms, it: IntegrationTime) -> f32 {
    integration_multiplier(it) * r_set.0 as f32 * REFRESH_MS_AT_300K / 300.0
}

/// Same as [`refresh_time_ms`], in whole microseconds for the delay provider.
///
/// Integer arithmetic keeps this exact: with the multiplier expressed in
/// quarters, `ms = q / 4 * r_set * 125 / 300`, i.e. `us = q * r_set * 1250 / 12`.
pub fn refresh_time_us(r_set: KiloOhms, it: IntegrationTime) -> u32 {
    let quarters: u32 = match it {
        IntegrationTime::HalfT => 2,
        IntegrationTime::OneT => 4,
        IntegrationTime::TwoT => 8,
        IntegrationTime::FourT => 16,
    };
    quarters * r_set.0 as u32 * 1250 / 12
}

/// UV index for a normalized value, truncated toward zero.
///
/// The float-to-int cast saturates, so the result is never negative.
pub fn uv_index(r_set: KiloOhms, normalized: f32) -> UvIndex {
    let counts_per_step = r_set.0 as f32 * (COUNTS_PER_UVI_270K / 270.0);
    UvIndex((normalized / counts_per_step) as u16)
}

/// Exposure risk classification of a UV index.
pub fn risk_level(uv_index: UvIndex) -> RiskLevel {
    match uv_index.0 {
        0..=2 => RiskLevel::Low,
        3..=5 => RiskLevel::Moderate,
        6..=7 => RiskLevel::High,
        8..=10 => RiskLevel::VeryHigh,
        _ => RiskLevel::Extreme,
    }
}

/// Runs the full pipeline for one raw reading.
pub fn sensor_value(raw: u16, it: IntegrationTime, r_set: KiloOhms) -> SensorValue {
    let normalized = normalized_value(raw, it);
    let uv_index = uv_index(r_set, normalized);

    SensorValue::new(raw, normalized, uv_index, risk_level(uv_index))
}
