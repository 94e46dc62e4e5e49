use std::cell::RefCell;
use std::rc::Rc;

use crate::config::SecurityConfig;
use crate::domain::{AlarmStatus, ArmingStatus, Image, Sensor, SensorId, SensorType};
use crate::image::{FakeImageService, ImageService};
use crate::listener::StatusListener;
use crate::repository::{InMemorySecurityRepository, RepositoryError, SecurityRepository};
use crate::service::{SecurityService, ServiceError};

/// Repository double that records every write.
#[derive(Default)]
struct RecordingRepository {
    inner: InMemorySecurityRepository,
    alarm_writes: Vec<AlarmStatus>,
    sensor_writes: Vec<Sensor>,
}

impl RecordingRepository {
    fn with(alarm: AlarmStatus, arming: ArmingStatus, sensors: &[Sensor]) -> Self {
        let mut inner = InMemorySecurityRepository::new();
        inner.set_alarm_status(alarm).unwrap();
        inner.set_arming_status(arming).unwrap();
        for s in sensors { inner.add_sensor(s.clone()).unwrap(); }
        Self { inner, ..Self::default() }
    }
}

impl SecurityRepository for RecordingRepository {
    fn alarm_status(&self) -> Result<AlarmStatus, RepositoryError> { self.inner.alarm_status() }
    fn set_alarm_status(&mut self, status: AlarmStatus) -> Result<(), RepositoryError> {
        self.alarm_writes.push(status);
        self.inner.set_alarm_status(status)
    }
    fn arming_status(&self) -> Result<ArmingStatus, RepositoryError> { self.inner.arming_status() }
    fn set_arming_status(&mut self, status: ArmingStatus) -> Result<(), RepositoryError> {
        self.inner.set_arming_status(status)
    }
    fn sensors(&self) -> Result<Vec<Sensor>, RepositoryError> { self.inner.sensors() }
    fn add_sensor(&mut self, sensor: Sensor) -> Result<(), RepositoryError> { self.inner.add_sensor(sensor) }
    fn remove_sensor(&mut self, id: &SensorId) -> Result<(), RepositoryError> { self.inner.remove_sensor(id) }
    fn update_sensor(&mut self, sensor: &Sensor) -> Result<(), RepositoryError> {
        self.sensor_writes.push(sensor.clone());
        self.inner.update_sensor(sensor)
    }
    fn cat_detected(&self) -> Result<bool, RepositoryError> { self.inner.cat_detected() }
    fn set_cat_detected(&mut self, cat: bool) -> Result<(), RepositoryError> { self.inner.set_cat_detected(cat) }
}

/// Image service double that also captures the threshold it was called with.
struct PinnedImageService {
    answer: bool,
    seen_threshold: Rc<RefCell<Option<f32>>>,
}

impl ImageService for PinnedImageService {
    fn image_contains_cat(&self, _image: &Image, confidence_threshold: f32) -> bool {
        *self.seen_threshold.borrow_mut() = Some(confidence_threshold);
        self.answer
    }
}

#[derive(Clone, Default)]
struct EventLog(Rc<RefCell<Vec<String>>>);

impl StatusListener for EventLog {
    fn notify(&self, status: AlarmStatus) { self.0.borrow_mut().push(format!("notify:{}", status)); }
    fn cat_detected(&self, cat: bool) { self.0.borrow_mut().push(format!("cat:{}", cat)); }
    fn sensor_status_changed(&self) { self.0.borrow_mut().push("sensors".into()); }
}

fn sensor(active: bool) -> Sensor {
    let mut s = Sensor::new("Front door", SensorType::Door);
    s.active = active;
    s
}

fn service(repo: RecordingRepository, cat: bool) -> SecurityService<RecordingRepository, FakeImageService> {
    SecurityService::new(repo, FakeImageService::always(cat))
}

#[test]
fn armed_sensor_activated_goes_pending() {
    let s = sensor(false);
    let mut svc = service(RecordingRepository::with(AlarmStatus::NoAlarm, ArmingStatus::ArmedHome, &[s.clone()]), false);
    svc.change_sensor_activation_status(&s, true).unwrap();
    let repo = svc.into_repository();
    assert_eq!(repo.alarm_writes, vec![AlarmStatus::PendingAlarm]);
    assert!(repo.sensor_writes.last().unwrap().active);
}

#[test]
fn armed_sensor_activated_while_pending_goes_to_alarm() {
    let s = sensor(false);
    let mut svc = service(RecordingRepository::with(AlarmStatus::PendingAlarm, ArmingStatus::ArmedAway, &[s.clone()]), false);
    svc.change_sensor_activation_status(&s, true).unwrap();
    assert_eq!(svc.into_repository().alarm_writes, vec![AlarmStatus::Alarm]);
}

#[test]
fn pending_and_last_sensor_inactive_returns_to_no_alarm() {
    let s = sensor(true);
    let mut svc = service(RecordingRepository::with(AlarmStatus::PendingAlarm, ArmingStatus::ArmedHome, &[s.clone()]), false);
    svc.change_sensor_activation_status(&s, false).unwrap();
    assert_eq!(svc.into_repository().alarm_writes, vec![AlarmStatus::NoAlarm]);
}

#[test]
fn pending_stays_while_another_sensor_is_active() {
    let a = sensor(true);
    let b = sensor(true);
    let mut svc = service(RecordingRepository::with(AlarmStatus::PendingAlarm, ArmingStatus::ArmedHome, &[a.clone(), b]), false);
    svc.change_sensor_activation_status(&a, false).unwrap();
    assert!(svc.into_repository().alarm_writes.is_empty());
}

#[test]
fn active_alarm_ignores_sensor_changes() {
    let s = sensor(true);
    let mut svc = service(RecordingRepository::with(AlarmStatus::Alarm, ArmingStatus::ArmedHome, &[s.clone()]), false);
    svc.change_sensor_activation_status(&s, false).unwrap();
    let s = svc.sensors().unwrap()[0].clone();
    svc.change_sensor_activation_status(&s, true).unwrap();
    let repo = svc.into_repository();
    assert!(repo.alarm_writes.is_empty());
    assert_eq!(repo.sensor_writes.len(), 2);
}

#[test]
fn active_sensor_activated_again_while_pending_sets_alarm_once() {
    let s = sensor(true);
    let mut svc = service(RecordingRepository::with(AlarmStatus::PendingAlarm, ArmingStatus::ArmedHome, &[s.clone()]), false);
    svc.change_sensor_activation_status(&s, true).unwrap();
    assert_eq!(svc.into_repository().alarm_writes, vec![AlarmStatus::Alarm]);
}

#[test]
fn inactive_sensor_deactivated_changes_nothing() {
    let s = sensor(false);
    for status in [AlarmStatus::NoAlarm, AlarmStatus::PendingAlarm, AlarmStatus::Alarm] {
        let mut svc = service(RecordingRepository::with(status, ArmingStatus::ArmedHome, &[s.clone()]), false);
        svc.change_sensor_activation_status(&s, false).unwrap();
        assert!(svc.into_repository().alarm_writes.is_empty());
    }
}

#[test]
fn cat_while_armed_home_raises_alarm() {
    let mut svc = service(RecordingRepository::with(AlarmStatus::NoAlarm, ArmingStatus::ArmedHome, &[]), true);
    svc.process_image(&Image::default()).unwrap();
    assert!(svc.cat_detected().unwrap());
    assert_eq!(svc.into_repository().alarm_writes, vec![AlarmStatus::Alarm]);
}

#[test]
fn no_cat_and_no_active_sensors_clears_alarm() {
    let mut svc = service(RecordingRepository::with(AlarmStatus::Alarm, ArmingStatus::ArmedHome, &[sensor(false)]), false);
    svc.process_image(&Image::default()).unwrap();
    assert_eq!(svc.into_repository().alarm_writes, vec![AlarmStatus::NoAlarm]);
}

#[test]
fn no_cat_with_active_sensor_keeps_status() {
    let mut svc = service(RecordingRepository::with(AlarmStatus::PendingAlarm, ArmingStatus::ArmedHome, &[sensor(true)]), false);
    svc.process_image(&Image::default()).unwrap();
    assert!(svc.into_repository().alarm_writes.is_empty());
}

#[test]
fn disarming_forces_no_alarm() {
    let mut svc = service(RecordingRepository::with(AlarmStatus::Alarm, ArmingStatus::ArmedAway, &[]), false);
    svc.set_arming_status(ArmingStatus::Disarmed).unwrap();
    assert_eq!(svc.arming_status().unwrap(), ArmingStatus::Disarmed);
    assert_eq!(svc.into_repository().alarm_writes, vec![AlarmStatus::NoAlarm]);
}

#[test]
fn arming_resets_all_sensors_to_inactive() {
    let sensors = [sensor(true), sensor(true), sensor(false)];
    let mut svc = service(RecordingRepository::with(AlarmStatus::NoAlarm, ArmingStatus::Disarmed, &sensors), false);
    svc.set_arming_status(ArmingStatus::ArmedAway).unwrap();
    assert!(svc.sensors().unwrap().iter().all(|s| !s.active));
    assert_eq!(svc.arming_status().unwrap(), ArmingStatus::ArmedAway);
    let repo = svc.into_repository();
    assert!(repo.alarm_writes.is_empty());
    assert_eq!(repo.sensor_writes.len(), 2);
}

#[test]
fn arming_home_while_camera_shows_cat_raises_alarm() {
    let mut svc = service(RecordingRepository::with(AlarmStatus::NoAlarm, ArmingStatus::Disarmed, &[]), true);
    svc.process_image(&Image::default()).unwrap();
    assert!(svc.cat_detected().unwrap());
    svc.set_arming_status(ArmingStatus::ArmedHome).unwrap();
    assert_eq!(svc.into_repository().alarm_writes, vec![AlarmStatus::Alarm]);
}

#[test]
fn configured_threshold_reaches_image_service() {
    let seen = Rc::new(RefCell::new(None));
    let images = PinnedImageService { answer: false, seen_threshold: seen.clone() };
    let cfg = SecurityConfig { confidence_threshold: 72.5, ..SecurityConfig::default() };
    let mut svc = SecurityService::with_config(InMemorySecurityRepository::new(), images, cfg).unwrap();
    svc.process_image(&Image::new(vec![1, 2, 3])).unwrap();
    assert_eq!(*seen.borrow(), Some(72.5));
}

#[test]
fn invalid_threshold_is_rejected() {
    let cfg = SecurityConfig { confidence_threshold: 150.0, ..SecurityConfig::default() };
    let res = SecurityService::with_config(InMemorySecurityRepository::new(), FakeImageService::always(false), cfg);
    assert!(matches!(res, Err(ServiceError::Validation(_))));
}

#[test]
fn listeners_hear_status_cat_and_sensor_events() {
    let log = EventLog::default();
    let s = sensor(false);
    let mut svc = service(RecordingRepository::with(AlarmStatus::NoAlarm, ArmingStatus::ArmedHome, &[s.clone()]), true);
    svc.add_status_listener(Box::new(log.clone()));
    svc.change_sensor_activation_status(&s, true).unwrap();
    svc.process_image(&Image::default()).unwrap();
    assert_eq!(*log.0.borrow(), vec![
        "notify:PENDING_ALARM".to_string(),
        "sensors".to_string(),
        "notify:ALARM".to_string(),
        "cat:true".to_string(),
    ]);
    svc.remove_status_listeners();
    svc.set_arming_status(ArmingStatus::Disarmed).unwrap();
    assert_eq!(log.0.borrow().len(), 4);
}

#[test]
fn add_sensor_validates_name_and_remove_unknown_fails() {
    let mut svc = service(RecordingRepository::default(), false);
    let res = svc.add_sensor(Sensor::new("  ", SensorType::Window));
    assert!(matches!(res, Err(ServiceError::Validation(_))));
    let s = Sensor::new("Kitchen window", SensorType::Window);
    let id = s.id;
    svc.add_sensor(s).unwrap();
    svc.remove_sensor(&id).unwrap();
    assert!(matches!(svc.remove_sensor(&id), Err(ServiceError::Repository(RepositoryError::SensorNotFound(_)))));
}

#[test]
fn changing_unknown_sensor_surfaces_repository_error() {
    let mut svc = service(RecordingRepository::with(AlarmStatus::NoAlarm, ArmingStatus::ArmedHome, &[]), false);
    let res = svc.change_sensor_activation_status(&sensor(false), true);
    assert!(matches!(res, Err(ServiceError::Repository(RepositoryError::SensorNotFound(_)))));
    assert_eq!(svc.alarm_status().unwrap(), AlarmStatus::NoAlarm);
    let repo = svc.into_repository();
    assert!(repo.alarm_writes.is_empty());
    assert!(repo.sensor_writes.is_empty());
}

#[test]
fn previous_state_comes_from_stored_sensor_not_caller_copy() {
    let stored = sensor(false);
    let mut stale = stored.clone();
    stale.active = true;
    let mut svc = service(RecordingRepository::with(AlarmStatus::PendingAlarm, ArmingStatus::ArmedHome, &[stored]), false);
    svc.change_sensor_activation_status(&stale, false).unwrap();
    assert_eq!(svc.alarm_status().unwrap(), AlarmStatus::PendingAlarm);
    assert!(svc.into_repository().alarm_writes.is_empty());
}

#[test]
fn stored_sensor_keeps_its_name_when_caller_copy_differs() {
    let stored = sensor(false);
    let mut renamed = stored.clone();
    renamed.name = "Renamed".into();
    let mut svc = service(RecordingRepository::with(AlarmStatus::NoAlarm, ArmingStatus::Disarmed, &[stored]), false);
    svc.change_sensor_activation_status(&renamed, true).unwrap();
    let after = &svc.sensors().unwrap()[0];
    assert_eq!(after.name, "Front door");
    assert!(after.active);
}

#[test]
fn cat_classification_lives_in_repository() {
    let mut svc = service(RecordingRepository::with(AlarmStatus::NoAlarm, ArmingStatus::Disarmed, &[]), true);
    svc.process_image(&Image::default()).unwrap();
    let repo = svc.into_repository();
    assert!(repo.cat_detected().unwrap());

    let mut svc = service(repo, false);
    svc.set_arming_status(ArmingStatus::ArmedHome).unwrap();
    assert_eq!(svc.alarm_status().unwrap(), AlarmStatus::Alarm);
}
