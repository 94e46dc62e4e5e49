use std::collections::HashMap;

use thiserror::Error;

use crate::domain::{AlarmStatus, ArmingStatus, Sensor, SensorId};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("sensor not found: {0}")]
    SensorNotFound(SensorId),
    #[error("storage backend failed: {0}")]
    Backend(String),
}

/// Storage for alarm state and sensors. The service reads and writes all
/// state through this trait.
pub trait SecurityRepository {
    fn alarm_status(&self) -> Result<AlarmStatus, RepositoryError>;
    fn set_alarm_status(&mut self, status: AlarmStatus) -> Result<(), RepositoryError>;
    fn arming_status(&self) -> Result<ArmingStatus, RepositoryError>;
    fn set_arming_status(&mut self, status: ArmingStatus) -> Result<(), RepositoryError>;
    fn sensors(&self) -> Result<Vec<Sensor>, RepositoryError>;
    fn add_sensor(&mut self, sensor: Sensor) -> Result<(), RepositoryError>;
    fn remove_sensor(&mut self, id: &SensorId) -> Result<(), RepositoryError>;
    /// Overwrite the stored copy of `sensor`, matched by id.
    fn update_sensor(&mut self, sensor: &Sensor) -> Result<(), RepositoryError>;
    /// Result of the last image classification.
    fn cat_detected(&self) -> Result<bool, RepositoryError>;
    fn set_cat_detected(&mut self, cat: bool) -> Result<(), RepositoryError>;
}

/// Volatile repository. Starts at `NO_ALARM`, `DISARMED`, no sensors and no cat seen.
#[derive(Debug, Default, Clone)]
pub struct InMemorySecurityRepository {
    alarm_status: AlarmStatus,
    arming_status: ArmingStatus,
    sensors: HashMap<SensorId, Sensor>,
    cat_detected: bool,
}

impl InMemorySecurityRepository {
    pub fn new() -> Self { Self::default() }
}

impl SecurityRepository for InMemorySecurityRepository {
    fn alarm_status(&self) -> Result<AlarmStatus, RepositoryError> { Ok(self.alarm_status) }

    fn set_alarm_status(&mut self, status: AlarmStatus) -> Result<(), RepositoryError> {
        self.alarm_status = status;
        Ok(())
    }

    fn arming_status(&self) -> Result<ArmingStatus, RepositoryError> { Ok(self.arming_status) }

    fn set_arming_status(&mut self, status: ArmingStatus) -> Result<(), RepositoryError> {
        self.arming_status = status;
        Ok(())
    }

    fn sensors(&self) -> Result<Vec<Sensor>, RepositoryError> {
        let mut out: Vec<Sensor> = self.sensors.values().cloned().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(out)
    }

    fn add_sensor(&mut self, sensor: Sensor) -> Result<(), RepositoryError> {
        self.sensors.insert(sensor.id, sensor);
        Ok(())
    }

    fn remove_sensor(&mut self, id: &SensorId) -> Result<(), RepositoryError> {
        self.sensors.remove(id).map(|_| ()).ok_or(RepositoryError::SensorNotFound(*id))
    }

    fn update_sensor(&mut self, sensor: &Sensor) -> Result<(), RepositoryError> {
        match self.sensors.get_mut(&sensor.id) {
            Some(slot) => { *slot = sensor.clone(); Ok(()) }
            None => Err(RepositoryError::SensorNotFound(sensor.id)),
        }
    }

    fn cat_detected(&self) -> Result<bool, RepositoryError> { Ok(self.cat_detected) }

    fn set_cat_detected(&mut self, cat: bool) -> Result<(), RepositoryError> {
        self.cat_detected = cat;
        Ok(())
    }
}
