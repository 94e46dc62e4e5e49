//! Input validation for values that come from users or config files.

use thiserror::Error;

pub const MAX_SENSOR_NAME_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("confidence threshold must be finite, got {0}")]
    NonFiniteThreshold(f32),
    #[error("confidence threshold {0} outside 0..=100")]
    ThresholdOutOfRange(f32),
    #[error("sensor name is empty")]
    EmptySensorName,
    #[error("sensor name longer than {MAX_SENSOR_NAME_LEN} characters")]
    SensorNameTooLong,
}

/// Threshold is a percentage.
pub fn validate_threshold(threshold: f32) -> Result<(), ValidationError> {
    if threshold.is_nan() || threshold.is_infinite() {
        return Err(ValidationError::NonFiniteThreshold(threshold));
    }
    if !(0.0..=100.0).contains(&threshold) {
        return Err(ValidationError::ThresholdOutOfRange(threshold));
    }
    Ok(())
}

pub fn validate_sensor_name(name: &str) -> Result<(), ValidationError> {
    let name = name.trim();
    if name.is_empty() { return Err(ValidationError::EmptySensorName); }
    if name.chars().count() > MAX_SENSOR_NAME_LEN { return Err(ValidationError::SensorNameTooLong); }
    Ok(())
}
