//! Read-only venue catalog supplied by the data layer
//!
//! The catalog file is a JSON array of venue records. Order is preserved:
//! it is the order results are shown in.

use crate::domain::types::VenueId;
use crate::domain::venue::Venue;
use anyhow::{bail, Context};
use rustc_hash::FxHashMap;
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    venues: Vec<Venue>,
    index: FxHashMap<VenueId, usize>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate IDs
    pub fn new(venues: Vec<Venue>) -> anyhow::Result<Self> {
        let mut index = FxHashMap::default();
        for (i, venue) in venues.iter().enumerate() {
            if index.insert(venue.id.clone(), i).is_some() {
                bail!("duplicate venue id {}", venue.id);
            }
        }
        Ok(Self { venues, index })
    }

    /// Load a catalog from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file {}", path.display()))?;
        let venues: Vec<Venue> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse catalog file {}", path.display()))?;

        let catalog = Self::new(venues)
            .with_context(|| format!("Invalid catalog file {}", path.display()))?;
        info!(
            file = %path.display(),
            venues = %catalog.len(),
            without_location = %catalog.venues.iter().filter(|v| v.location.is_none()).count(),
            "catalog_loaded"
        );
        Ok(catalog)
    }

    #[inline]
    pub fn venues(&self) -> &[Venue] {
        &self.venues
    }

    pub fn get(&self, id: &VenueId) -> Option<&Venue> {
        self.index.get(id).map(|&i| &self.venues[i])
    }

    pub fn len(&self) -> usize {
        self.venues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.venues.is_empty()
    }
}
