use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, SproutsError};

/// Reference care data for a species.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesInfo {
    #[serde(default)]
    pub watering: Option<String>,
    #[serde(default)]
    pub sunlight: Vec<String>,
    #[serde(default)]
    pub reference_image: Option<String>,
}

/// Source of species reference data.
///
/// `Ok(None)` means the lookup worked but knows nothing about the name;
/// `Err` means the lookup itself failed. Callers treat both as best effort.
pub trait SpeciesLookup {
    fn lookup(&self, name: &str) -> Result<Option<SpeciesInfo>>;
}

/// Used when no species data is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSpeciesData;

impl SpeciesLookup for NoSpeciesData {
    fn lookup(&self, name: &str) -> Result<Option<SpeciesInfo>> {
        Err(SproutsError::Enrichment {
            name: name.to_string(),
            reason: "no species data configured".into(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpeciesEntry {
    name: String,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(flatten)]
    info: SpeciesInfo,
}

/// Offline species table read from a JSON array such as
/// `[{"name": "Monstera deliciosa", "aliases": ["Swiss cheese plant"],
///   "watering": "Average", "sunlight": ["part shade"]}]`.
#[derive(Debug, Clone, Default)]
pub struct SpeciesTable {
    entries: Vec<SpeciesEntry>,
}

impl SpeciesTable {
    pub fn open(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| SproutsError::StorageRead {
            slot: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&text).map_err(|e| match e {
            SproutsError::StorageRead { reason, .. } => {
                SproutsError::StorageRead { slot: path.display().to_string(), reason }
            }
            other => other,
        })
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let entries: Vec<SpeciesEntry> = serde_json::from_str(text).map_err(|e| {
            SproutsError::StorageRead { slot: "species table".into(), reason: e.to_string() }
        })?;
        Ok(SpeciesTable { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SpeciesLookup for SpeciesTable {
    /// Case-insensitive match against names and aliases.
    fn lookup(&self, name: &str) -> Result<Option<SpeciesInfo>> {
        let needle = name.trim().to_lowercase();
        Ok(self
            .entries
            .iter()
            .find(|e| {
                e.name.to_lowercase() == needle || e.aliases.iter().any(|a| a.to_lowercase() == needle)
            })
            .map(|e| e.info.clone()))
    }
}

impl<L: SpeciesLookup + ?Sized> SpeciesLookup for Box<L> {
    fn lookup(&self, name: &str) -> Result<Option<SpeciesInfo>> {
        (**self).lookup(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"[
        {"name": "Monstera deliciosa", "aliases": ["Monstera", "Swiss cheese plant"],
         "watering": "Average", "sunlight": ["part shade", "bright indirect"]},
        {"name": "Snake plant", "watering": "Minimum"}
    ]"#;

    #[test]
    fn matches_names_and_aliases_case_insensitively() {
        let table = SpeciesTable::from_json(TABLE).unwrap();
        assert_eq!(table.len(), 2);

        let info = table.lookup("  swiss CHEESE plant").unwrap().unwrap();
        assert_eq!(info.watering.as_deref(), Some("Average"));
        assert_eq!(info.sunlight, ["part shade", "bright indirect"]);
        assert_eq!(info.reference_image, None);

        assert!(table.lookup("snake plant").unwrap().unwrap().sunlight.is_empty());
        assert_eq!(table.lookup("Fiddle leaf fig").unwrap(), None);
    }

    #[test]
    fn bad_table_is_a_read_error() {
        assert!(matches!(SpeciesTable::from_json("{}"), Err(SproutsError::StorageRead { .. })));
    }

    #[test]
    fn no_species_data_fails_enrichment() {
        assert!(matches!(NoSpeciesData.lookup("Fern"), Err(SproutsError::Enrichment { .. })));
    }
}
