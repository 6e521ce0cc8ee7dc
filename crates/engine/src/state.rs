use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::activity::{ActivityLog, LogEntry};
use crate::clock;
use crate::moisture::{MoistureBand, Severity};

/// Physical range of a moisture reading, in percent.
pub const MOISTURE_RANGE: (f64, f64) = (0.0, 100.0);

// ---------------------------------------------------------------------------
// Public type aliases
// ---------------------------------------------------------------------------

pub type ZoneId = u32;

pub type SharedState = Arc<RwLock<IrrigationState>>;

// ---------------------------------------------------------------------------
// Core types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    pub moisture: f64,
    pub valve_open: bool,
    /// Resolved display label, not a catalog key.
    pub plant_type: String,
    /// Resolved display label, not a catalog key.
    pub soil_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemStatus {
    pub pump_on: bool,
    pub battery_level: f64,
    pub solar_power: bool,
    pub last_update: String,
}

pub struct IrrigationState {
    pub zones: Vec<Zone>,
    pub status: SystemStatus,
    pub log: ActivityLog,
    /// Simulator ticks applied since the session started.
    pub ticks: u64,
}

impl Zone {
    pub fn new(id: ZoneId, moisture: f64, valve_open: bool, plant: &str, soil: &str) -> Self {
        Self {
            id,
            name: format!("Zone {id}"),
            moisture,
            valve_open,
            plant_type: plant.to_string(),
            soil_type: soil.to_string(),
        }
    }

    pub fn band(&self) -> MoistureBand {
        MoistureBand::classify(self.moisture)
    }

    /// True while the zone is dry; cleared as soon as moisture recovers.
    pub fn low_moisture_alert(&self) -> bool {
        self.band().is_alert()
    }
}

/// The four zones a fresh controller starts with.
pub fn default_zones() -> Vec<Zone> {
    vec![
        Zone::new(1, 45.0, false, "Tomates", "Sol argileux"),
        Zone::new(2, 62.0, true, "Laitue", "Sol sableux"),
        Zone::new(3, 38.0, false, "Basilic", "Sol limoneux"),
        Zone::new(4, 71.0, false, "Courgettes", "Sol humifère"),
    ]
}

impl SystemStatus {
    pub fn new(battery_level: f64, solar_power: bool) -> Self {
        Self {
            pump_on: false,
            battery_level,
            solar_power,
            last_update: clock::time_of_day(),
        }
    }
}

impl Default for SystemStatus {
    fn default() -> Self {
        Self::new(78.0, true)
    }
}

// ---------------------------------------------------------------------------
// Snapshot (what the control surface renders)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ZoneView {
    #[serde(flatten)]
    pub zone: Zone,
    pub status: &'static str,
    pub severity: Severity,
    pub alert: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StateView {
    pub zones: Vec<ZoneView>,
    pub status: SystemStatus,
    pub open_zones: usize,
    pub zone_count: usize,
    pub log: Vec<LogEntry>,
    pub ticks: u64,
}

// ---------------------------------------------------------------------------
// Construction & mutation
// ---------------------------------------------------------------------------

impl Default for IrrigationState {
    fn default() -> Self {
        Self::new(default_zones(), SystemStatus::default())
    }
}

impl IrrigationState {
    pub fn new(zones: Vec<Zone>, status: SystemStatus) -> Self {
        let mut log = ActivityLog::new();
        log.record(format!("Système démarré à {}", clock::hour_minute()));
        for zone in zones.iter().filter(|z| z.valve_open) {
            log.record(format!("Zone {} - Irrigation activée", zone.id));
        }
        log.record(format!("Niveau batterie: {:.0}%", status.battery_level));

        Self {
            zones,
            status,
            log,
            ticks: 0,
        }
    }

    pub fn shared(self) -> SharedState {
        Arc::new(RwLock::new(self))
    }

    pub fn zone(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.iter().find(|z| z.id == id)
    }

    pub fn zone_mut(&mut self, id: ZoneId) -> Option<&mut Zone> {
        self.zones.iter_mut().find(|z| z.id == id)
    }

    pub fn zone_ids(&self) -> Vec<ZoneId> {
        self.zones.iter().map(|z| z.id).collect()
    }

    pub fn open_zone_count(&self) -> usize {
        self.zones.iter().filter(|z| z.valve_open).count()
    }

    /// Record an activity log line.
    pub fn record(&mut self, message: impl Into<String>) {
        self.log.record(message);
    }

    /// Store a sensor reading for a zone. The value is clamped to the
    /// physical range; a non-finite reading is dropped and the previous one
    /// kept. Returns the stored value, or `None` for an unknown zone.
    pub fn record_moisture(&mut self, id: ZoneId, moisture: f64) -> Option<f64> {
        let zone = self.zone_mut(id)?;
        if moisture.is_finite() {
            zone.moisture = moisture.clamp(MOISTURE_RANGE.0, MOISTURE_RANGE.1);
        } else {
            tracing::warn!(zone = id, "discarding non-finite moisture reading");
        }
        Some(zone.moisture)
    }

    /// Build the serialisable snapshot, log most recent first.
    pub fn to_view(&self) -> StateView {
        let zones = self
            .zones
            .iter()
            .map(|z| {
                let band = z.band();
                ZoneView {
                    zone: z.clone(),
                    status: band.label(),
                    severity: band.severity(),
                    alert: band.is_alert(),
                }
            })
            .collect();

        StateView {
            zones,
            status: self.status.clone(),
            open_zones: self.open_zone_count(),
            zone_count: self.zones.len(),
            log: self.log.to_vec(),
            ticks: self.ticks,
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
