use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use homealarm_core::{
    ArmingStatus, FakeImageService, Image, LogStatusListener, SecurityConfig, SecurityService, Sensor,
    SensorId, SensorType,
};
use homealarm_store::SqliteSecurityRepository;

use crate::{Activation, ArmMode, Cli, Cmd, ConfigCmd, Kind, SensorCmd, YesNo};

const DEFAULT_CONFIG_FILE: &str = "homealarm.toml";

type Service = SecurityService<SqliteSecurityRepository, FakeImageService>;

pub fn run(cli: Cli) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_with(cli, &mut out)
}

pub fn run_with(cli: Cli, out: &mut dyn Write) -> Result<()> {
    let settings = || -> Result<(SecurityConfig, PathBuf)> {
        let cfg = SecurityConfig::load(cli.config.as_deref()).context("loading config")?;
        let db = cli.db.clone().unwrap_or_else(|| cfg.database_path.clone());
        Ok((cfg, db))
    };

    match cli.cmd {
        Cmd::Config { command: ConfigCmd::Init { force } } => {
            let path = cli.config.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            init_config(&path, force, out)
        }
        Cmd::Status { json } => {
            let (cfg, db) = settings()?;
            status(&open(&db, &cfg, FakeImageService::new())?, json, out)
        }
        Cmd::Arm { mode } => {
            let status = match mode {
                ArmMode::Home => ArmingStatus::ArmedHome,
                ArmMode::Away => ArmingStatus::ArmedAway,
            };
            let (cfg, db) = settings()?;
            let mut svc = open(&db, &cfg, FakeImageService::new())?;
            svc.set_arming_status(status)?;
            writeln!(out, "{} (alarm: {})", status, svc.alarm_status()?)?;
            Ok(())
        }
        Cmd::Disarm => {
            let (cfg, db) = settings()?;
            let mut svc = open(&db, &cfg, FakeImageService::new())?;
            svc.set_arming_status(ArmingStatus::Disarmed)?;
            writeln!(out, "{} (alarm: {})", ArmingStatus::Disarmed, svc.alarm_status()?)?;
            Ok(())
        }
        Cmd::Sensor { command } => {
            let (cfg, db) = settings()?;
            sensor(open(&db, &cfg, FakeImageService::new())?, command, out)
        }
        Cmd::Scan { image, cat } => {
            let bytes = std::fs::read(&image).with_context(|| format!("reading {}", image.display()))?;
            let images = match cat {
                Some(YesNo::Yes) => FakeImageService::always(true),
                Some(YesNo::No) => FakeImageService::always(false),
                None => FakeImageService::new(),
            };
            let (cfg, db) = settings()?;
            let mut svc = open(&db, &cfg, images)?;
            svc.process_image(&Image::new(bytes))?;
            writeln!(out, "cat: {} (alarm: {})", if svc.cat_detected()? { "yes" } else { "no" }, svc.alarm_status()?)?;
            Ok(())
        }
        Cmd::History { limit } => {
            let (_, db) = settings()?;
            let repo = SqliteSecurityRepository::open(&db)?;
            for e in repo.history(limit)? {
                writeln!(out, "{}  {} -> {}", e.ts.to_rfc3339(), e.from, e.to)?;
            }
            Ok(())
        }
    }
}

fn open(db: &Path, cfg: &SecurityConfig, images: FakeImageService) -> Result<Service> {
    let repo = SqliteSecurityRepository::open(db).with_context(|| format!("opening {}", db.display()))?;
    let mut svc = SecurityService::with_config(repo, images, cfg.clone())?;
    svc.add_status_listener(Box::new(LogStatusListener));
    Ok(svc)
}

fn status(svc: &Service, json: bool, out: &mut dyn Write) -> Result<()> {
    let sensors = svc.sensors()?;
    if json {
        let v = serde_json::json!({
            "alarm_status": svc.alarm_status()?,
            "arming_status": svc.arming_status()?,
            "sensors": sensors,
        });
        writeln!(out, "{}", serde_json::to_string_pretty(&v)?)?;
        return Ok(());
    }
    writeln!(out, "alarm:  {}", svc.alarm_status()?)?;
    writeln!(out, "arming: {}", svc.arming_status()?)?;
    write_sensors(&sensors, out)
}

fn sensor(mut svc: Service, cmd: SensorCmd, out: &mut dyn Write) -> Result<()> {
    match cmd {
        SensorCmd::Add { name, kind } => {
            let sensor_type = match kind {
                Kind::Door => SensorType::Door,
                Kind::Window => SensorType::Window,
                Kind::Motion => SensorType::Motion,
            };
            let sensor = Sensor::new(name.trim(), sensor_type);
            let id = sensor.id;
            svc.add_sensor(sensor)?;
            writeln!(out, "{}", id)?;
        }
        SensorCmd::Remove { id } => {
            svc.remove_sensor(&parse_id(&id)?)?;
        }
        SensorCmd::Set { id, state } => {
            let id = parse_id(&id)?;
            let sensor = svc
                .sensors()?
                .into_iter()
                .find(|s| s.id == id)
                .ok_or_else(|| anyhow!("no sensor with id {}", id))?;
            svc.change_sensor_activation_status(&sensor, matches!(state, Activation::Active))?;
            writeln!(out, "alarm: {}", svc.alarm_status()?)?;
        }
        SensorCmd::List => write_sensors(&svc.sensors()?, out)?,
    }
    Ok(())
}

fn write_sensors(sensors: &[Sensor], out: &mut dyn Write) -> Result<()> {
    for s in sensors {
        let state = if s.active { "active" } else { "inactive" };
        writeln!(out, "{}  {:<7} {:<8} {}", s.id, s.sensor_type, state, s.name)?;
    }
    Ok(())
}

fn parse_id(id: &str) -> Result<SensorId> {
    id.parse().map_err(|e| anyhow!("invalid sensor id {:?}: {}", id, e))
}

fn init_config(path: &Path, force: bool, out: &mut dyn Write) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    std::fs::write(path, SecurityConfig::default().to_toml_string()?)
        .with_context(|| format!("writing {}", path.display()))?;
    writeln!(out, "wrote {}", path.display())?;
    Ok(())
}
