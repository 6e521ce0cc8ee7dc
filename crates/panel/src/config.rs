//! TOML config file loading and validation, plus environment overrides.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::env;
use std::path::Path;
use std::time::Duration;

use irrigation_engine::state::{default_zones, MOISTURE_RANGE};
use irrigation_engine::telemetry::{SIM_CEILING, SIM_FLOOR};
use irrigation_engine::{IrrigationState, SystemStatus, Zone};

/// Longest accepted telemetry period: one hour.
pub const MAX_TICK_MS: u64 = 3_600_000;

// ---------------------------------------------------------------------------
// Config file structures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorKind {
    /// Commands are applied in-process only.
    Local,
    /// Commands are published to the valve controller over MQTT.
    Mqtt,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default = "default_executor")]
    pub executor: ExecutorKind,
    /// Fixed telemetry seed; random when unset.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub web: WebSection,
    #[serde(default)]
    pub mqtt: MqttSection,
    #[serde(default)]
    pub status: StatusSection,
    #[serde(default)]
    pub zones: Vec<ZoneEntry>,
}

#[derive(Debug, Deserialize)]
pub struct WebSection {
    #[serde(default = "default_web_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct MqttSection {
    #[serde(default = "default_mqtt_host")]
    pub host: String,
    #[serde(default = "default_mqtt_port")]
    pub port: u16,
    #[serde(default = "default_client_id")]
    pub client_id: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusSection {
    #[serde(default = "default_battery")]
    pub battery_level: f64,
    #[serde(default = "default_true")]
    pub solar_power: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZoneEntry {
    pub id: u32,
    pub name: String,
    pub moisture: f64,
    #[serde(default)]
    pub valve_open: bool,
    pub plant_type: String,
    pub soil_type: String,
}

fn default_tick_ms() -> u64 {
    3000
}
fn default_executor() -> ExecutorKind {
    ExecutorKind::Local
}
fn default_web_port() -> u16 {
    8080
}
fn default_mqtt_host() -> String {
    "127.0.0.1".to_string()
}
fn default_mqtt_port() -> u16 {
    1883
}
fn default_client_id() -> String {
    "irrigation-panel".to_string()
}
fn default_battery() -> f64 {
    78.0
}
fn default_true() -> bool {
    true
}

impl Default for WebSection {
    fn default() -> Self {
        Self {
            port: default_web_port(),
        }
    }
}

impl Default for MqttSection {
    fn default() -> Self {
        Self {
            host: default_mqtt_host(),
            port: default_mqtt_port(),
            client_id: default_client_id(),
        }
    }
}

impl Default for StatusSection {
    fn default() -> Self {
        Self {
            battery_level: default_battery(),
            solar_power: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            executor: default_executor(),
            seed: None,
            web: WebSection::default(),
            mqtt: MqttSection::default(),
            status: StatusSection::default(),
            zones: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl Config {
    /// Validate all config entries. Returns `Ok(())` or an error describing
    /// every violation found (not just the first one).
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        if self.tick_ms == 0 {
            errors.push("tick_ms must be positive".to_string());
        } else if self.tick_ms > MAX_TICK_MS {
            errors.push(format!(
                "tick_ms {} exceeds maximum {MAX_TICK_MS}",
                self.tick_ms
            ));
        }

        if self.executor == ExecutorKind::Mqtt && self.mqtt.host.trim().is_empty() {
            errors.push("mqtt.host is empty".to_string());
        }

        let battery = self.status.battery_level;
        if !(SIM_FLOOR..=SIM_CEILING).contains(&battery) {
            errors.push(format!(
                "status.battery_level {battery} out of range [{SIM_FLOOR}, {SIM_CEILING}]"
            ));
        }

        self.validate_zones(&mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            bail!(
                "config validation failed ({} error{}):\n  - {}",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" },
                errors.join("\n  - ")
            );
        }
    }

    fn validate_zones(&self, errors: &mut Vec<String>) {
        let mut seen_ids: HashSet<u32> = HashSet::new();

        for (i, z) in self.zones.iter().enumerate() {
            let ctx = format!("zones[{i}] (id {})", z.id);

            if z.id == 0 {
                errors.push(format!("{ctx}: id must be positive"));
            } else if !seen_ids.insert(z.id) {
                errors.push(format!("{ctx}: duplicate zone id"));
            }

            if z.name.trim().is_empty() {
                errors.push(format!("{ctx}: name is empty"));
            }

            let (lo, hi) = MOISTURE_RANGE;
            if !(lo..=hi).contains(&z.moisture) {
                errors.push(format!(
                    "{ctx}: moisture {} out of range [{lo}, {hi}]",
                    z.moisture
                ));
            }

            if z.plant_type.trim().is_empty() {
                errors.push(format!("{ctx}: plant_type is empty"));
            }
            if z.soil_type.trim().is_empty() {
                errors.push(format!("{ctx}: soil_type is empty"));
            }
        }
    }

    /// Apply `WEB_PORT`, `MQTT_HOST`, `MQTT_PORT`, `TICK_MS` and `EXECUTOR`
    /// on top of the file values.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = var("WEB_PORT") {
            self.web.port = v.parse().with_context(|| format!("invalid WEB_PORT: {v}"))?;
        }
        if let Some(v) = var("MQTT_HOST") {
            self.mqtt.host = v;
        }
        if let Some(v) = var("MQTT_PORT") {
            self.mqtt.port = v.parse().with_context(|| format!("invalid MQTT_PORT: {v}"))?;
        }
        if let Some(v) = var("TICK_MS") {
            self.tick_ms = v.parse().with_context(|| format!("invalid TICK_MS: {v}"))?;
        }
        if let Some(v) = var("EXECUTOR") {
            self.executor = match v.to_ascii_lowercase().as_str() {
                "local" => ExecutorKind::Local,
                "mqtt" => ExecutorKind::Mqtt,
                _ => bail!("invalid EXECUTOR: {v} (use local or mqtt)"),
            };
        }
        Ok(())
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Initial irrigation state: configured zones, or the built-in four.
    pub fn initial_state(&self) -> IrrigationState {
        let zones = if self.zones.is_empty() {
            default_zones()
        } else {
            self.zones
                .iter()
                .map(|z| Zone {
                    id: z.id,
                    name: z.name.clone(),
                    moisture: z.moisture,
                    valve_open: z.valve_open,
                    plant_type: z.plant_type.clone(),
                    soil_type: z.soil_type.clone(),
                })
                .collect()
        };

        IrrigationState::new(
            zones,
            SystemStatus::new(self.status.battery_level, self.status.solar_power),
        )
    }
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Read, parse, and validate a TOML config file. A missing file yields the
/// built-in defaults.
pub fn load(path: &str) -> Result<Config> {
    load_with(path, |key| env::var(key).ok())
}

fn load_with(path: &str, var: impl Fn(&str) -> Option<String>) -> Result<Config> {
    let mut config = if Path::new(path).exists() {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {path}"))?;
        toml::from_str::<Config>(&contents)
            .with_context(|| format!("failed to parse config: {path}"))?
    } else {
        tracing::info!(path, "no config file, using defaults");
        Config::default()
    };

    config.apply_overrides(var)?;
    config
        .validate()
        .with_context(|| format!("invalid config: {path}"))?;
    Ok(config)
}

// ===========================================================================
// Tests
// ===========================================================================
