//! Onboarding screen flow.
//!
//! ```text
//!              ┌──[JustPlanted]──▶ Configuration ──[ConfigurationSubmitted]──┐
//! Welcome ─────┤                        │                                    ▼
//!   ▲  ▲       └──[AlreadyEstablished]──┼──────────────────────────────▶ Dashboard
//!   │  └──────────────[Back]────────────┘                                    │
//!   └─────────────────────────────[Reconfigure]──────────────────────────────┘
//! ```
//!
//! This is only the transition table. Side effects tied to a screen (the
//! telemetry timer, committing the setup) belong to the session.

use serde::Serialize;

use crate::error::FlowError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    Welcome,
    Configuration,
    Dashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlantingStatus {
    New,
    Existing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowEvent {
    /// "I just planted".
    JustPlanted,
    /// "My plants are already established".
    AlreadyEstablished,
    Back,
    ConfigurationSubmitted,
    Reconfigure,
}

#[derive(Debug, Clone)]
pub struct ScreenFlow {
    screen: Screen,
    planting: Option<PlantingStatus>,
}

impl Default for ScreenFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenFlow {
    pub fn new() -> Self {
        Self {
            screen: Screen::Welcome,
            planting: None,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn planting(&self) -> Option<PlantingStatus> {
        self.planting
    }

    /// Where `event` leads from the current screen, without applying it.
    pub fn target(&self, event: FlowEvent) -> Result<Screen, FlowError> {
        use FlowEvent::*;
        use Screen::*;

        match (self.screen, event) {
            (Welcome, JustPlanted) => Ok(Configuration),
            (Welcome, AlreadyEstablished) => Ok(Dashboard),
            (Configuration, Back) => Ok(Welcome),
            (Configuration, ConfigurationSubmitted) => Ok(Dashboard),
            (Dashboard, Reconfigure) => Ok(Welcome),
            (from, event) => Err(FlowError { from, event }),
        }
    }

    /// Apply `event`. On error the flow is unchanged.
    pub fn apply(&mut self, event: FlowEvent) -> Result<Screen, FlowError> {
        let next = self.target(event)?;
        match event {
            FlowEvent::JustPlanted => self.planting = Some(PlantingStatus::New),
            FlowEvent::AlreadyEstablished => self.planting = Some(PlantingStatus::Existing),
            _ => {}
        }
        self.screen = next;
        Ok(next)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_on_welcome() {
        let flow = ScreenFlow::new();
        assert_eq!(flow.screen(), Screen::Welcome);
        assert_eq!(flow.planting(), None);
    }

    #[test]
    fn new_planting_goes_to_configuration() {
        let mut flow = ScreenFlow::new();
        assert_eq!(flow.apply(FlowEvent::JustPlanted), Ok(Screen::Configuration));
        assert_eq!(flow.planting(), Some(PlantingStatus::New));
    }

    #[test]
    fn established_planting_skips_configuration() {
        let mut flow = ScreenFlow::new();
        assert_eq!(flow.apply(FlowEvent::AlreadyEstablished), Ok(Screen::Dashboard));
        assert_eq!(flow.planting(), Some(PlantingStatus::Existing));
    }

    #[test]
    fn back_returns_to_welcome() {
        let mut flow = ScreenFlow::new();
        flow.apply(FlowEvent::JustPlanted).unwrap();
        assert_eq!(flow.apply(FlowEvent::Back), Ok(Screen::Welcome));
    }

    #[test]
    fn reconfigure_keeps_planting_status() {
        let mut flow = ScreenFlow::new();
        flow.apply(FlowEvent::JustPlanted).unwrap();
        flow.apply(FlowEvent::ConfigurationSubmitted).unwrap();
        assert_eq!(flow.apply(FlowEvent::Reconfigure), Ok(Screen::Welcome));
        assert_eq!(flow.planting(), Some(PlantingStatus::New));
    }

    #[test]
    fn full_cycle_can_repeat() {
        let mut flow = ScreenFlow::new();
        for _ in 0..3 {
            flow.apply(FlowEvent::JustPlanted).unwrap();
            flow.apply(FlowEvent::ConfigurationSubmitted).unwrap();
            flow.apply(FlowEvent::Reconfigure).unwrap();
        }
        assert_eq!(flow.screen(), Screen::Welcome);
    }

    #[test]
    fn invalid_events_leave_flow_unchanged() {
        let mut flow = ScreenFlow::new();
        for event in [
            FlowEvent::Back,
            FlowEvent::ConfigurationSubmitted,
            FlowEvent::Reconfigure,
        ] {
            assert_eq!(
                flow.apply(event),
                Err(FlowError {
                    from: Screen::Welcome,
                    event
                })
            );
            assert_eq!(flow.screen(), Screen::Welcome);
        }

        flow.apply(FlowEvent::AlreadyEstablished).unwrap();
        assert!(flow.apply(FlowEvent::JustPlanted).is_err());
        assert!(flow.apply(FlowEvent::Back).is_err());
        assert_eq!(flow.screen(), Screen::Dashboard);
        assert_eq!(flow.planting(), Some(PlantingStatus::Existing));
    }
}
