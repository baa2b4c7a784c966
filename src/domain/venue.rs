//! Venue catalog model
//!
//! Field names follow the catalog JSON (`halalInfo.overallStatus`,
//! `alcoholInfo.servesAlcohol`, `location.lat/lng`, ...). Venues are read-only
//! once loaded.

use crate::domain::types::{deserialize_optional_location, Coordinate, VenueId};
use serde::{Deserialize, Serialize};

/// Halal compliance level of a venue's menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HalalStatus {
    AllHalal,
    #[serde(alias = "partial-halal")]
    Partial,
    Mixed,
    HalalFriendly,
    #[default]
    #[serde(other)]
    Unknown,
}

impl HalalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HalalStatus::AllHalal => "all-halal",
            HalalStatus::Partial => "partial",
            HalalStatus::Mixed => "mixed",
            HalalStatus::HalalFriendly => "halal-friendly",
            HalalStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HalalInfo {
    #[serde(default)]
    pub overall_status: HalalStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlcoholInfo {
    /// `None` when the catalog does not know
    #[serde(default)]
    pub serves_alcohol: Option<bool>,
}

/// Price band as shown to users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PriceTier {
    #[serde(rename = "£")]
    Budget,
    #[default]
    #[serde(rename = "££")]
    Moderate,
    #[serde(rename = "£££")]
    Premium,
}

impl PriceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceTier::Budget => "£",
            PriceTier::Moderate => "££",
            PriceTier::Premium => "£££",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub line1: String,
    #[serde(default)]
    pub postcode: Option<String>,
}

/// Immutable catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    pub id: VenueId,
    pub name: String,
    #[serde(default)]
    pub cuisine: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_optional_location")]
    pub location: Option<Coordinate>,
    #[serde(default)]
    pub halal_info: HalalInfo,
    #[serde(default)]
    pub alcohol_info: AlcoholInfo,
    #[serde(default, rename = "priceRange")]
    pub price: PriceTier,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub address: Address,
}

impl Venue {
    #[inline]
    pub fn halal_status(&self) -> HalalStatus {
        self.halal_info.overall_status
    }

    #[inline]
    pub fn serves_alcohol(&self) -> Option<bool> {
        self.alcohol_info.serves_alcohol
    }

    #[inline]
    pub fn coordinate(&self) -> Option<Coordinate> {
        self.location
    }

    /// Lower-cased text used for free-text search:
    /// name, cuisine, city, area and tags joined by spaces
    pub fn search_text(&self) -> String {
        let mut parts: Vec<&str> = vec![&self.name, &self.cuisine, &self.city];
        if let Some(area) = self.area.as_deref() {
            parts.push(area);
        }
        parts.extend(self.tags.iter().map(String::as_str));
        parts.join(" ").to_lowercase()
    }
}

/// A venue that survived filtering, with its distance from the user
#[derive(Debug, Clone, PartialEq)]
pub struct ResultItem {
    pub venue: Venue,
    /// `None` when there is no position or the venue has no coordinates
    pub distance_miles: Option<f64>,
}

impl ResultItem {
    #[inline]
    pub fn id(&self) -> &VenueId {
        &self.venue.id
    }
}

impl PartialEq for Venue {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAZA: &str = r#"{
        "id": "dundee_01",
        "name": "Taza Indian Buffet",
        "city": "Dundee",
        "area": "City Centre",
        "address": { "line1": "1 Camperdown St Unit 1A", "postcode": "DD1 3JA" },
        "location": { "lat": 56.46, "lng": -2.96 },
        "cuisine": "Indian",
        "priceRange": "££",
        "halalInfo": { "overallStatus": "partial-halal", "notes": "Verify meats." },
        "alcoholInfo": { "servesAlcohol": true, "separateFamilyArea": null },
        "tags": ["buffet", "city-centre"]
    }"#;

    #[test]
    fn test_deserialize_catalog_entry() {
        let venue: Venue = serde_json::from_str(TAZA).unwrap();
        assert_eq!(venue.id, VenueId::from("dundee_01"));
        assert_eq!(venue.halal_status(), HalalStatus::Partial);
        assert_eq!(venue.serves_alcohol(), Some(true));
        assert_eq!(venue.price, PriceTier::Moderate);
        assert_eq!(venue.coordinate(), Some(Coordinate::new(56.46, -2.96)));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let venue: Venue = serde_json::from_str(
            r#"{ "id": "x", "name": "Pop-up", "location": { "lat": null, "lng": -2.9 },
                 "halalInfo": { "overallStatus": "something-new" } }"#,
        )
        .unwrap();
        assert_eq!(venue.coordinate(), None);
        assert_eq!(venue.halal_status(), HalalStatus::Unknown);
        assert_eq!(venue.serves_alcohol(), None);
        assert!(venue.tags.is_empty());
    }

    #[test]
    fn test_search_text() {
        let venue: Venue = serde_json::from_str(TAZA).unwrap();
        assert_eq!(venue.search_text(), "taza indian buffet indian dundee city centre buffet city-centre");
    }
}
