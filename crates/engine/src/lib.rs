//! Irrigation controller engine: zone state, simulated telemetry, valve and
//! pump commands, and the onboarding flow that seeds zone metadata.

pub mod activity;
pub mod catalog;
pub mod clock;
pub mod command;
pub mod error;
pub mod flow;
pub mod moisture;
pub mod session;
pub mod setup;
pub mod state;
pub mod telemetry;

pub use command::{CommandExecutor, Controller, LocalExecutor};
pub use error::{CommandError, ExecutorError, FlowError, SessionError, SetupError};
pub use flow::{PlantingStatus, Screen};
pub use session::{Session, SessionView};
pub use state::{IrrigationState, SharedState, SystemStatus, Zone, ZoneId};
