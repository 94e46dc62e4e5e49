use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Current alert level of the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlarmStatus {
    NoAlarm,
    PendingAlarm,
    Alarm,
}

impl Default for AlarmStatus {
    fn default() -> Self { AlarmStatus::NoAlarm }
}

/// Whether monitoring is active, and in which mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArmingStatus {
    ArmedHome,
    ArmedAway,
    Disarmed,
}

impl ArmingStatus {
    pub fn is_armed(self) -> bool {
        !matches!(self, ArmingStatus::Disarmed)
    }
}

impl Default for ArmingStatus {
    fn default() -> Self { ArmingStatus::Disarmed }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SensorType {
    Door,
    Window,
    Motion,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} value: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! wire_names {
    ($ty:ident, $kind:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(self) -> &'static str {
                match self { $($ty::$variant => $name),+ }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_uppercase().as_str() {
                    $($name => Ok($ty::$variant),)+
                    _ => Err(ParseEnumError { kind: $kind, value: s.to_string() }),
                }
            }
        }
    };
}

wire_names!(AlarmStatus, "alarm status", {
    NoAlarm => "NO_ALARM",
    PendingAlarm => "PENDING_ALARM",
    Alarm => "ALARM",
});

wire_names!(ArmingStatus, "arming status", {
    ArmedHome => "ARMED_HOME",
    ArmedAway => "ARMED_AWAY",
    Disarmed => "DISARMED",
});

wire_names!(SensorType, "sensor type", {
    Door => "DOOR",
    Window => "WINDOW",
    Motion => "MOTION",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SensorId(pub Uuid);

impl SensorId {
    pub fn new() -> Self { Self(Uuid::new_v4()) }
}

impl Default for SensorId {
    fn default() -> Self { Self::new() }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for SensorId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(SensorId)
    }
}

/// A door, window or motion sensor. Identity is the `id`; two sensors with
/// the same name are distinct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sensor {
    pub id: SensorId,
    pub name: String,
    pub sensor_type: SensorType,
    pub active: bool,
}

impl Sensor {
    /// New sensors start inactive.
    pub fn new(name: impl Into<String>, sensor_type: SensorType) -> Self {
        Self { id: SensorId::new(), name: name.into(), sensor_type, active: false }
    }
}

/// Raw camera frame handed to an [`ImageService`](crate::image::ImageService).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Image {
    pub bytes: Vec<u8>,
}

impl Image {
    pub fn new(bytes: Vec<u8>) -> Self { Self { bytes } }

    pub fn is_empty(&self) -> bool { self.bytes.is_empty() }
}
