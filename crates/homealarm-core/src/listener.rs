use crate::domain::AlarmStatus;

/// Observer for state changes made by the service.
pub trait StatusListener {
    fn notify(&self, status: AlarmStatus);

    fn cat_detected(&self, _cat: bool) {}

    fn sensor_status_changed(&self) {}
}

/// Writes every callback to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogStatusListener;

impl StatusListener for LogStatusListener {
    fn notify(&self, status: AlarmStatus) {
        match status {
            AlarmStatus::Alarm => log::warn!("alarm status -> {}", status),
            _ => log::info!("alarm status -> {}", status),
        }
    }

    fn cat_detected(&self, cat: bool) {
        if cat { log::warn!("camera: cat detected"); } else { log::info!("camera: no cat"); }
    }

    fn sensor_status_changed(&self) {
        log::debug!("sensor status changed");
    }
}
