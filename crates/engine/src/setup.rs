//! Pending zone setup collected on the configuration screen, and its
//! resolution into display labels on submission.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::catalog;
use crate::error::SetupError;
use crate::state::{IrrigationState, ZoneId};

/// Catalog keys chosen for one zone. Empty means "not selected yet".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ZoneSelection {
    pub plant_type: String,
    pub soil_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetupStore {
    zones: BTreeMap<ZoneId, ZoneSelection>,
    global_soil: String,
    use_global_soil: bool,
}

/// Labels to write onto one zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedZone {
    pub id: ZoneId,
    pub plant_type: String,
    pub soil_type: String,
}

impl SetupStore {
    /// Empty selections for every zone id; the shared soil type is on by
    /// default.
    pub fn new(zone_ids: impl IntoIterator<Item = ZoneId>) -> Self {
        Self {
            zones: zone_ids
                .into_iter()
                .map(|id| (id, ZoneSelection::default()))
                .collect(),
            global_soil: String::new(),
            use_global_soil: true,
        }
    }

    pub fn selection(&self, id: ZoneId) -> Option<&ZoneSelection> {
        self.zones.get(&id)
    }

    pub fn use_global_soil(&self) -> bool {
        self.use_global_soil
    }

    pub fn global_soil(&self) -> &str {
        &self.global_soil
    }

    pub fn select_plant(&mut self, id: ZoneId, key: &str) -> Result<(), SetupError> {
        let sel = self.zones.get_mut(&id).ok_or(SetupError::UnknownZone(id))?;
        sel.plant_type = key.to_string();
        Ok(())
    }

    pub fn select_soil(&mut self, id: ZoneId, key: &str) -> Result<(), SetupError> {
        let sel = self.zones.get_mut(&id).ok_or(SetupError::UnknownZone(id))?;
        sel.soil_type = key.to_string();
        Ok(())
    }

    pub fn set_global_soil(&mut self, key: &str) {
        self.global_soil = key.to_string();
    }

    pub fn set_use_global_soil(&mut self, on: bool) {
        self.use_global_soil = on;
    }

    /// Check required selections, reporting every gap at once.
    pub fn validate(&self) -> Result<(), SetupError> {
        let missing_plants: Vec<ZoneId> = self
            .zones
            .iter()
            .filter(|(_, sel)| sel.plant_type.is_empty())
            .map(|(id, _)| *id)
            .collect();
        let missing_global_soil = self.use_global_soil && self.global_soil.is_empty();

        if missing_plants.is_empty() && !missing_global_soil {
            Ok(())
        } else {
            Err(SetupError::Incomplete {
                missing_plants,
                missing_global_soil,
            })
        }
    }

    /// Whether the submit action should be enabled.
    pub fn can_submit(&self) -> bool {
        self.validate().is_ok()
    }

    /// Resolve selections to labels against the current zones. A key missing
    /// from the catalog keeps the zone's existing label.
    pub fn resolve(&self, state: &IrrigationState) -> Result<Vec<ResolvedZone>, SetupError> {
        self.validate()?;

        let resolved = state
            .zones
            .iter()
            .map(|zone| {
                let sel = self.zones.get(&zone.id);
                let plant_key = sel.map(|s| s.plant_type.as_str()).unwrap_or_default();
                let soil_key = if self.use_global_soil {
                    self.global_soil.as_str()
                } else {
                    sel.map(|s| s.soil_type.as_str()).unwrap_or_default()
                };

                ResolvedZone {
                    id: zone.id,
                    plant_type: catalog::plant_label(plant_key)
                        .map(str::to_string)
                        .unwrap_or_else(|| zone.plant_type.clone()),
                    soil_type: catalog::soil_label(soil_key)
                        .map(str::to_string)
                        .unwrap_or_else(|| zone.soil_type.clone()),
                }
            })
            .collect();

        Ok(resolved)
    }

    /// Validate, resolve and commit labels onto the zones. On error nothing
    /// is written.
    pub fn apply(&self, state: &mut IrrigationState) -> Result<(), SetupError> {
        for r in self.resolve(state)? {
            if let Some(zone) = state.zone_mut(r.id) {
                zone.plant_type = r.plant_type;
                zone.soil_type = r.soil_type;
            }
        }
        Ok(())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
