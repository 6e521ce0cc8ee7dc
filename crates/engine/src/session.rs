//! One running controller session: the shared irrigation state, the command
//! controller, and the interaction surface (screen flow, pending setup and
//! the telemetry timer that lives only while the dashboard is shown).
//!
//! Flow transitions, setup edits and commands are serialised through the
//! surface lock, so entering and leaving the dashboard can never leave two
//! telemetry timers running.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

use crate::command::{CommandExecutor, Controller};
use crate::error::{FlowError, SessionError};
use crate::flow::{FlowEvent, PlantingStatus, Screen, ScreenFlow};
use crate::setup::SetupStore;
use crate::state::{IrrigationState, SharedState, StateView, ZoneId};
use crate::telemetry::{TelemetrySimulator, TelemetryTask, DEFAULT_TICK};

struct Surface {
    flow: ScreenFlow,
    setup: SetupStore,
    telemetry: Option<TelemetryTask>,
    /// Dashboard entries so far; varies the seeded walk per visit.
    visits: u64,
}

pub struct Session {
    state: SharedState,
    controller: Controller,
    surface: Mutex<Surface>,
    tick: Duration,
    seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub screen: Screen,
    pub planting: Option<PlantingStatus>,
    pub setup: SetupStore,
    pub can_submit: bool,
    pub telemetry_running: bool,
    #[serde(flatten)]
    pub state: StateView,
}

impl Session {
    pub fn new(state: IrrigationState, executor: Box<dyn CommandExecutor>) -> Self {
        let setup = SetupStore::new(state.zone_ids());
        let state = state.shared();

        Self {
            controller: Controller::new(state.clone(), executor),
            state,
            surface: Mutex::new(Surface {
                flow: ScreenFlow::new(),
                setup,
                telemetry: None,
                visits: 0,
            }),
            tick: DEFAULT_TICK,
            seed: None,
        }
    }

    /// Telemetry tick period.
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Seed the telemetry random walk for a reproducible run.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub async fn screen(&self) -> Screen {
        self.surface.lock().await.flow.screen()
    }

    pub async fn telemetry_running(&self) -> bool {
        self.surface
            .lock()
            .await
            .telemetry
            .as_ref()
            .is_some_and(TelemetryTask::is_running)
    }

    pub async fn view(&self) -> SessionView {
        let surface = self.surface.lock().await;
        let state = self.state.read().await.to_view();
        SessionView {
            screen: surface.flow.screen(),
            planting: surface.flow.planting(),
            setup: surface.setup.clone(),
            can_submit: surface.setup.can_submit(),
            telemetry_running: surface.telemetry.as_ref().is_some_and(TelemetryTask::is_running),
            state,
        }
    }

    // -----------------------------------------------------------------------
    // Screen flow
    // -----------------------------------------------------------------------

    /// Welcome: "I just planted".
    pub async fn just_planted(&self) -> Result<Screen, SessionError> {
        let mut surface = self.surface.lock().await;
        Ok(self.transition(&mut surface, FlowEvent::JustPlanted).await?)
    }

    /// Welcome: "my plants are already established". Zones keep their labels.
    pub async fn already_established(&self) -> Result<Screen, SessionError> {
        let mut surface = self.surface.lock().await;
        Ok(self.transition(&mut surface, FlowEvent::AlreadyEstablished).await?)
    }

    /// Configuration: leave without committing anything.
    pub async fn back(&self) -> Result<Screen, SessionError> {
        let mut surface = self.surface.lock().await;
        Ok(self.transition(&mut surface, FlowEvent::Back).await?)
    }

    /// Dashboard: return to the welcome screen. Pending setup is kept.
    pub async fn reconfigure(&self) -> Result<Screen, SessionError> {
        let mut surface = self.surface.lock().await;
        Ok(self.transition(&mut surface, FlowEvent::Reconfigure).await?)
    }

    /// Configuration: commit the pending setup and open the dashboard. On
    /// rejection neither the zones nor the screen change.
    pub async fn submit_configuration(&self) -> Result<Screen, SessionError> {
        let mut surface = self.surface.lock().await;
        surface.flow.target(FlowEvent::ConfigurationSubmitted)?;

        if let Err(e) = self.controller.submit_configuration(&surface.setup).await {
            warn!("configuration rejected: {e}");
            return Err(e.into());
        }

        Ok(self
            .transition(&mut surface, FlowEvent::ConfigurationSubmitted)
            .await?)
    }

    async fn transition(
        &self,
        surface: &mut Surface,
        event: FlowEvent,
    ) -> Result<Screen, FlowError> {
        let from = surface.flow.screen();
        let to = surface.flow.apply(event)?;

        if to != Screen::Dashboard {
            if let Some(task) = surface.telemetry.take() {
                task.stop().await;
            }
        } else if surface.telemetry.is_none() {
            let sim = match self.seed {
                Some(seed) => TelemetrySimulator::with_seed(seed.wrapping_add(surface.visits)),
                None => TelemetrySimulator::new(),
            };
            surface.visits += 1;
            surface.telemetry = Some(TelemetryTask::spawn(self.state.clone(), sim, self.tick));
        }

        info!(?from, ?to, ?event, "screen changed");
        Ok(to)
    }

    // -----------------------------------------------------------------------
    // Setup editing (configuration screen)
    // -----------------------------------------------------------------------

    async fn on_configuration(&self) -> Result<MutexGuard<'_, Surface>, SessionError> {
        let surface = self.surface.lock().await;
        match surface.flow.screen() {
            Screen::Configuration => Ok(surface),
            actual => Err(SessionError::WrongScreen {
                expected: Screen::Configuration,
                actual,
            }),
        }
    }

    pub async fn select_plant(&self, zone_id: ZoneId, key: &str) -> Result<(), SessionError> {
        let mut surface = self.on_configuration().await?;
        surface.setup.select_plant(zone_id, key)?;
        Ok(())
    }

    pub async fn select_soil(&self, zone_id: ZoneId, key: &str) -> Result<(), SessionError> {
        let mut surface = self.on_configuration().await?;
        surface.setup.select_soil(zone_id, key)?;
        Ok(())
    }

    pub async fn set_global_soil(&self, key: &str) -> Result<(), SessionError> {
        let mut surface = self.on_configuration().await?;
        surface.setup.set_global_soil(key);
        Ok(())
    }

    pub async fn set_use_global_soil(&self, on: bool) -> Result<(), SessionError> {
        let mut surface = self.on_configuration().await?;
        surface.setup.set_use_global_soil(on);
        Ok(())
    }

    /// Whether the submit action is currently enabled.
    pub async fn can_submit(&self) -> bool {
        self.surface.lock().await.setup.can_submit()
    }

    // -----------------------------------------------------------------------
    // Commands (dashboard)
    // -----------------------------------------------------------------------

    async fn on_dashboard(&self) -> Result<MutexGuard<'_, Surface>, SessionError> {
        let surface = self.surface.lock().await;
        match surface.flow.screen() {
            Screen::Dashboard => Ok(surface),
            actual => Err(SessionError::WrongScreen {
                expected: Screen::Dashboard,
                actual,
            }),
        }
    }

    pub async fn toggle_valve(&self, zone_id: ZoneId) -> Result<bool, SessionError> {
        let _surface = self.on_dashboard().await?;
        Ok(self.controller.toggle_valve(zone_id).await?)
    }

    pub async fn toggle_pump(&self) -> Result<bool, SessionError> {
        let _surface = self.on_dashboard().await?;
        Ok(self.controller.toggle_pump().await?)
    }

    /// Stop the telemetry timer. The session stays usable; the timer is
    /// re-armed on the next entry into the dashboard.
    pub async fn shutdown(&self) {
        let mut surface = self.surface.lock().await;
        if let Some(task) = surface.telemetry.take() {
            task.stop().await;
        }
        info!("session shut down");
    }
}

// ===========================================================================
// Tests
// ===========================================================================
