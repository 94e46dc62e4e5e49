//! Alarm decision table. Pure: reads a [`Snapshot`], returns the commands a
//! [`SecurityService`](crate::service::SecurityService) must apply.

use crate::domain::{AlarmStatus, ArmingStatus};

/// Persisted state the rules look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Snapshot {
    pub alarm_status: AlarmStatus,
    pub arming_status: ArmingStatus,
    /// For sensor events: any sensor other than the one changing is active.
    /// For other events: any sensor at all is active.
    pub any_other_sensor_active: bool,
    /// Result of the last image classification.
    pub cat_detected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityEvent {
    SensorActivationChanged { was_active: bool, active: bool },
    ArmingStatusChanged(ArmingStatus),
    ImageAnalyzed { contains_cat: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetAlarmStatus(AlarmStatus),
    DeactivateAllSensors,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decision {
    pub commands: Vec<Command>,
}

impl Decision {
    fn none() -> Self { Self::default() }

    fn alarm(status: AlarmStatus) -> Self {
        Self { commands: vec![Command::SetAlarmStatus(status)] }
    }

    pub fn is_empty(&self) -> bool { self.commands.is_empty() }

    /// The alarm status this decision moves to, if any.
    pub fn next_alarm_status(&self) -> Option<AlarmStatus> {
        self.commands.iter().rev().find_map(|c| match c {
            Command::SetAlarmStatus(s) => Some(*s),
            _ => None,
        })
    }
}

/// Map the current snapshot and one event to the commands to apply.
pub fn decide(snap: &Snapshot, event: &SecurityEvent) -> Decision {
    match *event {
        SecurityEvent::SensorActivationChanged { was_active, active } => {
            // An active alarm is never changed by sensors.
            if snap.alarm_status == AlarmStatus::Alarm { return Decision::none(); }
            if active {
                on_sensor_activated(snap)
            } else if was_active {
                on_sensor_deactivated(snap)
            } else {
                Decision::none()
            }
        }
        SecurityEvent::ArmingStatusChanged(next) => on_arming_status_changed(snap, next),
        SecurityEvent::ImageAnalyzed { contains_cat } => on_image_analyzed(snap, contains_cat),
    }
}

fn on_sensor_activated(snap: &Snapshot) -> Decision {
    if !snap.arming_status.is_armed() { return Decision::none(); }
    match snap.alarm_status {
        AlarmStatus::NoAlarm => Decision::alarm(AlarmStatus::PendingAlarm),
        AlarmStatus::PendingAlarm => Decision::alarm(AlarmStatus::Alarm),
        AlarmStatus::Alarm => Decision::none(),
    }
}

fn on_sensor_deactivated(snap: &Snapshot) -> Decision {
    if snap.alarm_status == AlarmStatus::PendingAlarm && !snap.any_other_sensor_active {
        Decision::alarm(AlarmStatus::NoAlarm)
    } else {
        Decision::none()
    }
}

fn on_arming_status_changed(snap: &Snapshot, next: ArmingStatus) -> Decision {
    match next {
        ArmingStatus::Disarmed => Decision::alarm(AlarmStatus::NoAlarm),
        ArmingStatus::ArmedHome | ArmingStatus::ArmedAway => {
            let mut commands = vec![Command::DeactivateAllSensors];
            if next == ArmingStatus::ArmedHome && snap.cat_detected {
                commands.push(Command::SetAlarmStatus(AlarmStatus::Alarm));
            }
            Decision { commands }
        }
    }
}

fn on_image_analyzed(snap: &Snapshot, contains_cat: bool) -> Decision {
    if contains_cat && snap.arming_status == ArmingStatus::ArmedHome {
        Decision::alarm(AlarmStatus::Alarm)
    } else if !contains_cat && !snap.any_other_sensor_active {
        Decision::alarm(AlarmStatus::NoAlarm)
    } else {
        Decision::none()
    }
}
