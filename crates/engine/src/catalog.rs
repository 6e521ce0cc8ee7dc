//! Static plant and soil catalogs offered during zone setup.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub key: &'static str,
    pub label: &'static str,
}

pub const PLANT_TYPES: &[CatalogEntry] = &[
    CatalogEntry { key: "tomates", label: "Tomates" },
    CatalogEntry { key: "laitue", label: "Laitue" },
    CatalogEntry { key: "basilic", label: "Basilic" },
    CatalogEntry { key: "courgettes", label: "Courgettes" },
    CatalogEntry { key: "radis", label: "Radis" },
    CatalogEntry { key: "carottes", label: "Carottes" },
    CatalogEntry { key: "persil", label: "Persil" },
    CatalogEntry { key: "menthe", label: "Menthe" },
];

pub const SOIL_TYPES: &[CatalogEntry] = &[
    CatalogEntry { key: "argileux", label: "Sol argileux" },
    CatalogEntry { key: "sableux", label: "Sol sableux" },
    CatalogEntry { key: "limoneux", label: "Sol limoneux" },
    CatalogEntry { key: "humifere", label: "Sol humifère" },
    CatalogEntry { key: "calcaire", label: "Sol calcaire" },
];

fn lookup(entries: &'static [CatalogEntry], key: &str) -> Option<&'static str> {
    entries.iter().find(|e| e.key == key).map(|e| e.label)
}

/// Display label for a plant key, if the key is in the catalog.
pub fn plant_label(key: &str) -> Option<&'static str> {
    lookup(PLANT_TYPES, key)
}

/// Display label for a soil key, if the key is in the catalog.
pub fn soil_label(key: &str) -> Option<&'static str> {
    lookup(SOIL_TYPES, key)
}

// ===========================================================================
// Tests
// ===========================================================================
