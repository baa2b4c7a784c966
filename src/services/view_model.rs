//! View models handed to the list and map sinks
//!
//! Everything here is derived from a result set plus the current selection;
//! sinks never see `Venue` directly.

use crate::domain::filter::FilterState;
use crate::domain::types::{Coordinate, VenueId};
use crate::domain::venue::{HalalStatus, ResultItem};
use smallvec::SmallVec;

/// Tag chips shown on a result card
const MAX_TAG_CHIPS: usize = 3;

pub const DISTANCE_UNAVAILABLE: &str = "distance unavailable";

/// One list/carousel card
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub id: VenueId,
    pub title: String,
    /// `cuisine · city · price`
    pub meta: String,
    pub distance_label: String,
    pub halal_label: String,
    pub alcohol_label: &'static str,
    pub tags: SmallVec<[String; MAX_TAG_CHIPS]>,
    pub selected: bool,
}

/// One map marker; venues without coordinates get none
#[derive(Debug, Clone, PartialEq)]
pub struct MapPin {
    pub id: VenueId,
    pub title: String,
    pub coordinate: Coordinate,
    pub highlighted: bool,
    pub selected: bool,
}

/// A committed frame for the sinks
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultsView {
    /// Transition generation this frame was committed for
    pub generation: u64,
    pub filter: FilterState,
    pub rows: Vec<ResultRow>,
    pub pins: Vec<MapPin>,
    pub selected: Option<VenueId>,
}

impl ResultsView {
    pub fn build(
        generation: u64,
        filter: &FilterState,
        results: &[ResultItem],
        selected: Option<&VenueId>,
    ) -> Self {
        let rows = results.iter().map(|item| result_row(item, selected)).collect();
        let pins = results
            .iter()
            .filter_map(|item| {
                let coordinate = item.venue.coordinate()?;
                Some(MapPin {
                    id: item.venue.id.clone(),
                    title: item.venue.name.clone(),
                    coordinate,
                    highlighted: item.venue.halal_status() == HalalStatus::AllHalal,
                    selected: selected == Some(&item.venue.id),
                })
            })
            .collect();

        Self {
            generation,
            filter: filter.clone(),
            rows,
            pins,
            selected: selected.cloned(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// An entry reported by the list's viewability tracking
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewableItem {
    Venue(VenueId),
    /// Spacer or loading card with no venue behind it
    Placeholder,
}

impl ViewableItem {
    pub fn venue_id(&self) -> Option<&VenueId> {
        match self {
            ViewableItem::Venue(id) => Some(id),
            ViewableItem::Placeholder => None,
        }
    }
}

fn result_row(item: &ResultItem, selected: Option<&VenueId>) -> ResultRow {
    let venue = &item.venue;
    let meta = [venue.cuisine.as_str(), venue.city.as_str(), venue.price.as_str()]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" · ");

    ResultRow {
        id: venue.id.clone(),
        title: venue.name.clone(),
        meta,
        distance_label: distance_label(item.distance_miles),
        halal_label: venue.halal_status().as_str().replace('-', " "),
        alcohol_label: match venue.serves_alcohol() {
            Some(true) => "Yes",
            Some(false) => "No",
            None => "Unknown",
        },
        tags: venue.tags.iter().take(MAX_TAG_CHIPS).cloned().collect(),
        selected: selected == Some(&venue.id),
    }
}

pub fn distance_label(distance_miles: Option<f64>) -> String {
    match distance_miles {
        Some(miles) => format!("{:.1} mi", miles),
        None => DISTANCE_UNAVAILABLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::venue::Venue;

    fn item(json: serde_json::Value, distance_miles: Option<f64>) -> ResultItem {
        let venue: Venue = serde_json::from_value(json).unwrap();
        ResultItem { venue, distance_miles }
    }

    fn sample() -> Vec<ResultItem> {
        vec![
            item(
                serde_json::json!({
                    "id": "a", "name": "Anatolia", "cuisine": "Turkish", "city": "Dundee",
                    "priceRange": "££", "location": {"lat": 56.46, "lng": -2.97},
                    "halalInfo": {"overallStatus": "all-halal"},
                    "alcoholInfo": {"servesAlcohol": false},
                    "tags": ["grill", "late-night", "family", "takeaway"]
                }),
                Some(0.42),
            ),
            item(
                serde_json::json!({
                    "id": "b", "name": "Bay Grill", "cuisine": "Grill", "city": "St Andrews",
                    "halalInfo": {"overallStatus": "partial-halal"}
                }),
                None,
            ),
        ]
    }

    #[test]
    fn test_rows() {
        let results = sample();
        let view = ResultsView::build(3, &FilterState::default(), &results, Some(&VenueId::from("a")));
        assert_eq!(view.generation, 3);
        assert_eq!(view.rows.len(), 2);

        let a = &view.rows[0];
        assert_eq!(a.meta, "Turkish · Dundee · ££");
        assert_eq!(a.distance_label, "0.4 mi");
        assert_eq!(a.halal_label, "all halal");
        assert_eq!(a.alcohol_label, "No");
        assert_eq!(a.tags.as_slice(), &["grill", "late-night", "family"]);
        assert!(a.selected);

        let b = &view.rows[1];
        assert_eq!(b.distance_label, DISTANCE_UNAVAILABLE);
        assert_eq!(b.halal_label, "partial");
        assert_eq!(b.alcohol_label, "Unknown");
        assert!(!b.selected);
    }

    #[test]
    fn test_pins_skip_venues_without_coordinates() {
        let results = sample();
        let view = ResultsView::build(1, &FilterState::default(), &results, None);
        assert_eq!(view.pins.len(), 1);
        assert!(view.pins[0].highlighted);
        assert!(!view.pins[0].selected);
        assert_eq!(view.selected, None);
    }

    #[test]
    fn test_viewable_item() {
        assert_eq!(ViewableItem::Placeholder.venue_id(), None);
        assert_eq!(
            ViewableItem::Venue(VenueId::from("a")).venue_id(),
            Some(&VenueId::from("a"))
        );
    }
}
