//! Valve and pump commands.
//!
//! A command is first forwarded to a [`CommandExecutor`] (the hardware
//! side) and only committed to the shared state once the executor has
//! acknowledged it. A failed command is reported in the activity log and
//! leaves the state untouched. Commands are serialised: one executor round
//! trip at a time.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::error::{CommandError, ExecutorError, SetupError};
use crate::setup::SetupStore;
use crate::state::{SharedState, ZoneId};

// ---------------------------------------------------------------------------
// Executor seam
// ---------------------------------------------------------------------------

/// Carries valve/pump commands to whatever drives the hardware.
#[async_trait]
pub trait CommandExecutor: Send {
    async fn set_valve(&mut self, zone_id: ZoneId, open: bool) -> Result<(), ExecutorError>;
    async fn set_pump(&mut self, on: bool) -> Result<(), ExecutorError>;
}

/// In-process executor used when no hardware is attached. Tracks the
/// commanded outputs and always succeeds.
#[derive(Debug, Default)]
pub struct LocalExecutor {
    pub(crate) valves: BTreeMap<ZoneId, bool>,
    pub(crate) pump: bool,
}

impl LocalExecutor {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommandExecutor for LocalExecutor {
    async fn set_valve(&mut self, zone_id: ZoneId, open: bool) -> Result<(), ExecutorError> {
        self.valves.insert(zone_id, open);
        debug!(zone = zone_id, open, "[local] valve set");
        Ok(())
    }

    async fn set_pump(&mut self, on: bool) -> Result<(), ExecutorError> {
        self.pump = on;
        debug!(on, "[local] pump set");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct Controller {
    state: SharedState,
    executor: Mutex<Box<dyn CommandExecutor>>,
}

fn valve_word(open: bool) -> &'static str {
    if open {
        "ouverte"
    } else {
        "fermée"
    }
}

fn pump_action(was_on: bool) -> &'static str {
    if was_on {
        "arrêtée"
    } else {
        "démarrée"
    }
}

impl Controller {
    pub fn new(state: SharedState, executor: Box<dyn CommandExecutor>) -> Self {
        Self {
            state,
            executor: Mutex::new(executor),
        }
    }

    /// Controller backed by the [`LocalExecutor`].
    pub fn local(state: SharedState) -> Self {
        Self::new(state, Box::new(LocalExecutor::new()))
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Flip one zone's valve. Returns the new valve state.
    pub async fn toggle_valve(&self, zone_id: ZoneId) -> Result<bool, CommandError> {
        let mut executor = self.executor.lock().await;

        let target = {
            let st = self.state.read().await;
            let zone = st.zone(zone_id).ok_or(CommandError::UnknownZone(zone_id))?;
            !zone.valve_open
        };

        if let Err(e) = executor.set_valve(zone_id, target).await {
            error!(zone = zone_id, "valve command failed: {e}");
            self.state
                .write()
                .await
                .record(format!("Erreur contrôle vanne: {e}"));
            return Err(e.into());
        }

        // Commands are serialised and telemetry never touches valves, so the
        // flag still holds `!target` here.
        let mut st = self.state.write().await;
        if let Some(zone) = st.zone_mut(zone_id) {
            zone.valve_open = target;
        }
        st.record(format!("Zone {zone_id} - Vanne {}", valve_word(target)));
        info!(zone = zone_id, open = target, "valve toggled");

        Ok(target)
    }

    /// Flip the pump. Returns the new pump state.
    pub async fn toggle_pump(&self) -> Result<bool, CommandError> {
        let mut executor = self.executor.lock().await;

        let was_on = self.state.read().await.status.pump_on;

        if let Err(e) = executor.set_pump(!was_on).await {
            error!("pump command failed: {e}");
            self.state
                .write()
                .await
                .record(format!("Erreur contrôle pompe: {e}"));
            return Err(e.into());
        }

        let mut st = self.state.write().await;
        st.status.pump_on = !was_on;
        st.record(format!("Pompe {}", pump_action(was_on)));
        info!(on = !was_on, "pump toggled");

        Ok(!was_on)
    }

    /// Commit the pending setup onto the zones. Rejected without any
    /// mutation when required selections are missing.
    pub async fn submit_configuration(&self, setup: &SetupStore) -> Result<(), SetupError> {
        let _serial = self.executor.lock().await;

        let mut st = self.state.write().await;
        setup.apply(&mut st)?;
        st.record("Configuration des zones appliquée");
        info!(
            zones = st.zones.len(),
            global_soil = setup.use_global_soil(),
            "configuration applied"
        );
        Ok(())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
