//! Moisture bands used for display and low-moisture alerting. Derived from
//! the current reading on demand; never stored.

use serde::Serialize;

/// Below this a zone is dry and raises the alert marker.
pub const DRY_BELOW: f64 = 30.0;
/// At or above this a zone is wet.
pub const WET_FROM: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MoistureBand {
    Dry,
    Moderate,
    Wet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl MoistureBand {
    pub fn classify(moisture: f64) -> Self {
        if moisture < DRY_BELOW {
            Self::Dry
        } else if moisture < WET_FROM {
            Self::Moderate
        } else {
            Self::Wet
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Dry => "Sec",
            Self::Moderate => "Modéré",
            Self::Wet => "Humide",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            Self::Dry => Severity::Low,
            Self::Moderate => Severity::Medium,
            Self::Wet => Severity::High,
        }
    }

    pub fn is_alert(self) -> bool {
        self == Self::Dry
    }
}
