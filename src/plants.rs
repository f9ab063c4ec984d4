use chrono::Utc;
use uuid::Uuid;

use crate::error::{Result, SproutsError};
use crate::models::Plant;
use crate::species::SpeciesLookup;
use crate::storage::{load_collection, save_collection, BlobStore, PLANTS_SLOT};

/// Result of adding a plant.
#[derive(Debug)]
pub struct PlantAdded {
    pub plant: Plant,
    /// Why the plant has no reference data, if the lookup did not succeed.
    pub enrichment_error: Option<SproutsError>,
}

/// The user's plant collection, persisted the same way as tasks.
pub struct PlantCatalog<B: BlobStore> {
    plants: Vec<Plant>,
    backend: B,
}

impl<B: BlobStore> PlantCatalog<B> {
    pub fn load(backend: B) -> Self {
        let plants = load_collection::<Plant, _>(&backend, PLANTS_SLOT).unwrap_or_else(|e| {
            tracing::error!(error = %e, "could not load plants, starting with an empty collection");
            Vec::new()
        });
        PlantCatalog { plants, backend }
    }

    pub fn plants(&self) -> &[Plant] {
        &self.plants
    }

    pub fn get(&self, id: &str) -> Option<&Plant> {
        self.plants.iter().find(|p| p.id == id)
    }

    /// Finds a plant by id, id prefix or suffix, or exact (case-insensitive) name.
    pub fn find(&self, key: &str) -> Option<&Plant> {
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        self.get(key)
            .or_else(|| self.plants.iter().find(|p| p.name.eq_ignore_ascii_case(key)))
            .or_else(|| {
                let mut hits = self
                    .plants
                    .iter()
                    .filter(|p| p.id.starts_with(key) || p.id.ends_with(key));
                match (hits.next(), hits.next()) {
                    (Some(p), None) => Some(p),
                    _ => None,
                }
            })
    }

    /// Adds a plant, enriching it with species data when the lookup succeeds.
    ///
    /// A failed or empty lookup never blocks creation.
    pub fn add(
        &mut self,
        name: &str,
        photo_uri: Option<String>,
        lookup: &dyn SpeciesLookup,
    ) -> Result<PlantAdded> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SproutsError::Validation("Please enter a plant name.".into()));
        }

        let mut plant = Plant {
            id: Uuid::now_v7().to_string(),
            name: name.to_string(),
            photo_uri: photo_uri.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            watering: None,
            sunlight: Vec::new(),
            reference_image: None,
            created_date: Utc::now(),
        };

        let enrichment_error = match lookup.lookup(name) {
            Ok(Some(info)) => {
                plant.watering = info.watering;
                plant.sunlight = info.sunlight;
                plant.reference_image = info.reference_image;
                None
            }
            Ok(None) => Some(SproutsError::Enrichment {
                name: name.to_string(),
                reason: "no matching species".into(),
            }),
            Err(e) => Some(e),
        };
        if let Some(e) = &enrichment_error {
            tracing::warn!(plant = name, error = %e, "adding plant without species data");
        }

        tracing::info!(plant_id = %plant.id, name, "plant added");
        self.plants.push(plant.clone());
        self.persist();
        Ok(PlantAdded { plant, enrichment_error })
    }

    /// Removes one plant. Tasks that mention it by name are unaffected.
    pub fn remove(&mut self, id: &str) -> Option<Plant> {
        let idx = self.plants.iter().position(|p| p.id == id)?;
        let removed = self.plants.remove(idx);
        tracing::info!(plant_id = id, "plant removed");
        self.persist();
        Some(removed)
    }

    pub fn reset(&mut self) -> Result<()> {
        self.plants.clear();
        self.backend.clear(PLANTS_SLOT)
    }

    fn persist(&mut self) -> bool {
        match save_collection(&mut self.backend, PLANTS_SLOT, &self.plants) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "failed to save plants, will retry on next change");
                false
            }
        }
    }
}
