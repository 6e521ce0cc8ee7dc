//! Error types for the irrigation engine.
//!
//! None of these is fatal: validation failures block an action at the
//! boundary, command failures are reported and leave local state untouched.

use crate::flow::{FlowEvent, Screen};
use crate::state::ZoneId;

/// Failure reported by a [`CommandExecutor`](crate::command::CommandExecutor)
/// while forwarding a command to the valve/pump hardware.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutorError {
    /// The hardware controller could not be reached.
    #[error("controller unreachable: {0}")]
    Unreachable(String),

    /// The hardware controller answered but refused the command.
    #[error("controller rejected command: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown zone {0}")]
    UnknownZone(ZoneId),

    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    #[error("unknown zone {0}")]
    UnknownZone(ZoneId),

    /// Submission attempted with required selections missing.
    #[error("configuration incomplete: {}", describe_incomplete(.missing_plants, .missing_global_soil))]
    Incomplete {
        missing_plants: Vec<ZoneId>,
        missing_global_soil: bool,
    },
}

fn describe_incomplete(missing_plants: &[ZoneId], missing_global_soil: &bool) -> String {
    let mut parts = Vec::new();
    if !missing_plants.is_empty() {
        let ids: Vec<String> = missing_plants.iter().map(|id| id.to_string()).collect();
        parts.push(format!("no plant type for zone(s) {}", ids.join(", ")));
    }
    if *missing_global_soil {
        parts.push("no global soil type selected".to_string());
    }
    parts.join("; ")
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot apply {event:?} while on the {from:?} screen")]
pub struct FlowError {
    pub from: Screen,
    pub event: FlowEvent,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error(transparent)]
    Command(#[from] CommandError),

    /// The action belongs to a screen that is not currently active.
    #[error("action requires the {expected:?} screen, current screen is {actual:?}")]
    WrongScreen { expected: Screen, actual: Screen },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_lists_every_problem() {
        let err = SetupError::Incomplete {
            missing_plants: vec![2, 4],
            missing_global_soil: true,
        };
        let msg = err.to_string();
        assert!(msg.contains("zone(s) 2, 4"), "got: {msg}");
        assert!(msg.contains("no global soil type"), "got: {msg}");
    }

    #[test]
    fn executor_error_passes_through_command_error() {
        let err: CommandError = ExecutorError::Unreachable("timeout".into()).into();
        assert_eq!(err.to_string(), "controller unreachable: timeout");
    }
}
