use thiserror::Error;

use crate::config::SecurityConfig;
use crate::domain::{AlarmStatus, ArmingStatus, Image, Sensor, SensorId};
use crate::engine::{decide, Command, Decision, SecurityEvent, Snapshot};
use crate::image::ImageService;
use crate::listener::StatusListener;
use crate::repository::{RepositoryError, SecurityRepository};
use crate::validation::{validate_sensor_name, ValidationError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Applies alarm decisions to a repository.
///
/// Every operation snapshots the repository, runs [`decide`], and writes the
/// resulting commands back. Listeners hear about each alarm status write,
/// each image classification and each sensor change.
pub struct SecurityService<R, I> {
    repository: R,
    image_service: I,
    cfg: SecurityConfig,
    listeners: Vec<Box<dyn StatusListener>>,
}

impl<R: SecurityRepository, I: ImageService> SecurityService<R, I> {
    pub fn new(repository: R, image_service: I) -> Self {
        Self {
            repository,
            image_service,
            cfg: SecurityConfig::default(),
            listeners: Vec::new(),
        }
    }

    pub fn with_config(repository: R, image_service: I, cfg: SecurityConfig) -> Result<Self, ServiceError> {
        cfg.validate()?;
        let mut svc = Self::new(repository, image_service);
        svc.cfg = cfg;
        Ok(svc)
    }

    pub fn config(&self) -> &SecurityConfig { &self.cfg }

    pub fn add_status_listener(&mut self, listener: Box<dyn StatusListener>) {
        self.listeners.push(listener);
    }

    pub fn remove_status_listeners(&mut self) {
        self.listeners.clear();
    }

    pub fn alarm_status(&self) -> Result<AlarmStatus, ServiceError> {
        Ok(self.repository.alarm_status()?)
    }

    pub fn arming_status(&self) -> Result<ArmingStatus, ServiceError> {
        Ok(self.repository.arming_status()?)
    }

    pub fn sensors(&self) -> Result<Vec<Sensor>, ServiceError> {
        Ok(self.repository.sensors()?)
    }

    /// Whether the last processed image contained a cat.
    pub fn cat_detected(&self) -> Result<bool, ServiceError> {
        Ok(self.repository.cat_detected()?)
    }

    pub fn add_sensor(&mut self, sensor: Sensor) -> Result<(), ServiceError> {
        validate_sensor_name(&sensor.name)?;
        log::info!("adding sensor {} ({}, {})", sensor.id, sensor.name, sensor.sensor_type);
        self.repository.add_sensor(sensor)?;
        Ok(())
    }

    pub fn remove_sensor(&mut self, id: &SensorId) -> Result<(), ServiceError> {
        log::info!("removing sensor {}", id);
        self.repository.remove_sensor(id)?;
        Ok(())
    }

    /// Change the arming status. Disarming clears the alarm; arming resets
    /// every sensor to inactive.
    pub fn set_arming_status(&mut self, status: ArmingStatus) -> Result<(), ServiceError> {
        let snap = self.snapshot(None)?;
        log::info!("arming status {} -> {}", snap.arming_status, status);
        let decision = decide(&snap, &SecurityEvent::ArmingStatusChanged(status));
        self.apply(decision)?;
        self.repository.set_arming_status(status)?;
        Ok(())
    }

    /// Record a sensor going active or inactive and update the alarm status.
    ///
    /// The previous state is the stored one, not `sensor.active`. An unknown
    /// sensor fails with `SensorNotFound` before anything is written.
    pub fn change_sensor_activation_status(&mut self, sensor: &Sensor, active: bool) -> Result<(), ServiceError> {
        let mut stored = self
            .repository
            .sensors()?
            .into_iter()
            .find(|s| s.id == sensor.id)
            .ok_or(RepositoryError::SensorNotFound(sensor.id))?;
        let snap = self.snapshot(Some(&sensor.id))?;
        let event = SecurityEvent::SensorActivationChanged { was_active: stored.active, active };
        let decision = decide(&snap, &event);
        log::debug!("sensor {} active {} -> {}: {:?}", sensor.id, stored.active, active, decision.commands);

        stored.active = active;
        self.repository.update_sensor(&stored)?;
        self.apply(decision)?;
        self.listeners.iter().for_each(|l| l.sensor_status_changed());
        Ok(())
    }

    /// Classify a camera frame and update the alarm status.
    pub fn process_image(&mut self, image: &Image) -> Result<(), ServiceError> {
        let contains_cat = self.image_service.image_contains_cat(image, self.cfg.confidence_threshold);
        self.repository.set_cat_detected(contains_cat)?;
        let snap = self.snapshot(None)?;
        let decision = decide(&snap, &SecurityEvent::ImageAnalyzed { contains_cat });
        self.apply(decision)?;
        self.listeners.iter().for_each(|l| l.cat_detected(contains_cat));
        Ok(())
    }

    /// Set every active sensor to inactive. Leaves the alarm status alone.
    pub fn deactivate_all_sensors(&mut self) -> Result<(), ServiceError> {
        let mut changed = false;
        for mut sensor in self.repository.sensors()? {
            if !sensor.active { continue; }
            sensor.active = false;
            self.repository.update_sensor(&sensor)?;
            changed = true;
        }
        if changed {
            self.listeners.iter().for_each(|l| l.sensor_status_changed());
        }
        Ok(())
    }

    pub fn into_repository(self) -> R { self.repository }

    fn snapshot(&self, changing: Option<&SensorId>) -> Result<Snapshot, ServiceError> {
        let any_other_sensor_active = self
            .repository
            .sensors()?
            .iter()
            .any(|s| s.active && Some(&s.id) != changing);
        Ok(Snapshot {
            alarm_status: self.repository.alarm_status()?,
            arming_status: self.repository.arming_status()?,
            any_other_sensor_active,
            cat_detected: self.repository.cat_detected()?,
        })
    }

    fn apply(&mut self, decision: Decision) -> Result<(), ServiceError> {
        for cmd in decision.commands {
            match cmd {
                Command::SetAlarmStatus(status) => {
                    self.repository.set_alarm_status(status)?;
                    self.listeners.iter().for_each(|l| l.notify(status));
                }
                Command::DeactivateAllSensors => self.deactivate_all_sensors()?,
            }
        }
        Ok(())
    }
}
