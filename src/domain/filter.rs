//! Filter state owned by the UI layer and passed into the pipeline by value

use crate::domain::types::VenueId;
use crate::domain::venue::{HalalStatus, Venue};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category filter applied after the base set is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterMode {
    #[default]
    All,
    AllHalal,
    NoAlcohol,
    Favourites,
    Burgers,
    Chicken,
    Curry,
    Desserts,
    Kebab,
}

impl FilterMode {
    pub const ALL_MODES: [FilterMode; 9] = [
        FilterMode::All,
        FilterMode::AllHalal,
        FilterMode::NoAlcohol,
        FilterMode::Favourites,
        FilterMode::Burgers,
        FilterMode::Chicken,
        FilterMode::Curry,
        FilterMode::Desserts,
        FilterMode::Kebab,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterMode::All => "all",
            FilterMode::AllHalal => "all-halal",
            FilterMode::NoAlcohol => "no-alcohol",
            FilterMode::Favourites => "favourites",
            FilterMode::Burgers => "burgers",
            FilterMode::Chicken => "chicken",
            FilterMode::Curry => "curry",
            FilterMode::Desserts => "desserts",
            FilterMode::Kebab => "kebab",
        }
    }

    /// Lower-case keywords matched against cuisine and tags, for cuisine modes
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            FilterMode::Burgers => &["burger", "grill"],
            FilterMode::Chicken => &["chicken", "peri"],
            FilterMode::Curry => &["indian", "pakistani", "curry"],
            FilterMode::Desserts => &["dessert", "shake", "krepe", "crepe", "waffle"],
            FilterMode::Kebab => &["doner", "kebab", "turkish", "mediterranean"],
            _ => &[],
        }
    }

    /// Category predicate for a single venue
    pub fn matches(&self, venue: &Venue, favourites: &Favourites) -> bool {
        match self {
            FilterMode::All => true,
            FilterMode::AllHalal => venue.halal_status() == HalalStatus::AllHalal,
            FilterMode::NoAlcohol => venue.serves_alcohol() == Some(false),
            FilterMode::Favourites => favourites.contains(&venue.id),
            cuisine_mode => {
                let cuisine = venue.cuisine.to_lowercase();
                let tags: Vec<String> = venue.tags.iter().map(|t| t.to_lowercase()).collect();
                cuisine_mode.keywords().iter().any(|keyword| {
                    cuisine.contains(keyword) || tags.iter().any(|tag| tag.contains(keyword))
                })
            }
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FilterMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        FilterMode::ALL_MODES
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| format!("unknown filter mode '{}'", s))
    }
}

/// Whether the base set is restricted to the configured radius
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    /// Venues with coordinates within the radius of the current position
    #[default]
    Nearby,
    /// Full catalog, used when location is unavailable
    Everywhere,
}

/// Filter inputs for one pipeline run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterState {
    pub mode: FilterMode,
    #[serde(default)]
    pub search_query: String,
    #[serde(default)]
    pub scope: SearchScope,
}

impl FilterState {
    pub fn new(mode: FilterMode) -> Self {
        Self { mode, ..Default::default() }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.search_query = query.into();
        self
    }

    pub fn with_scope(mut self, scope: SearchScope) -> Self {
        self.scope = scope;
        self
    }

    /// Normalized query, `None` when blank
    pub fn query(&self) -> Option<String> {
        let trimmed = self.search_query.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_lowercase())
        }
    }
}

/// Externally supplied set of favourite venue IDs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Favourites {
    ids: FxHashSet<VenueId>,
}

impl Favourites {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: VenueId) -> bool {
        self.ids.insert(id)
    }

    pub fn remove(&mut self, id: &VenueId) -> bool {
        self.ids.remove(id)
    }

    #[inline]
    pub fn contains(&self, id: &VenueId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl<I: Into<VenueId>> FromIterator<I> for Favourites {
    fn from_iter<T: IntoIterator<Item = I>>(iter: T) -> Self {
        Self { ids: iter.into_iter().map(Into::into).collect() }
    }
}
