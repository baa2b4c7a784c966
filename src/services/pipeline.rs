//! Filter pipeline: catalog + filter state + position -> ordered results
//!
//! Step order is fixed:
//! 1. Non-empty search query: base set is the full catalog (radius suspended)
//! 2. Otherwise: venues with coordinates within the radius of the position;
//!    empty when there is no position (unless scope is `Everywhere`)
//! 3. Category predicate for the active mode
//! 4. Search substring over name/cuisine/city/area/tags
//! 5. Distance for every surviving venue
//!
//! Output keeps catalog order. No sort pass.

use crate::domain::filter::{Favourites, FilterState, SearchScope};
use crate::domain::types::Position;
use crate::domain::venue::{ResultItem, Venue};
use crate::infra::metrics::Metrics;
use crate::services::distance::distance_miles;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Default nearby radius (miles)
pub const DEFAULT_RADIUS_MILES: f64 = 10.0;

/// Run the pipeline. Pure: output depends only on the arguments.
pub fn apply(
    catalog: &[Venue],
    filter: &FilterState,
    favourites: &Favourites,
    position: Option<&Position>,
    radius_miles: f64,
) -> Vec<ResultItem> {
    let query = filter.query();
    let origin = position.map(|p| p.coordinate);

    catalog
        .iter()
        .filter(|venue| {
            if query.is_some() || filter.scope == SearchScope::Everywhere {
                return true;
            }
            match (origin, venue.coordinate()) {
                (Some(here), Some(there)) => distance_miles(here, there) <= radius_miles,
                _ => false,
            }
        })
        .filter(|venue| filter.mode.matches(venue, favourites))
        .filter(|venue| match query.as_deref() {
            Some(q) => venue.search_text().contains(q),
            None => true,
        })
        .map(|venue| ResultItem {
            venue: venue.clone(),
            distance_miles: origin
                .zip(venue.coordinate())
                .map(|(here, there)| distance_miles(here, there)),
        })
        .collect()
}

/// Pipeline bound to its configured radius, recording run latency
#[derive(Clone)]
pub struct FilterPipeline {
    radius_miles: f64,
    metrics: Option<Arc<Metrics>>,
}

impl FilterPipeline {
    pub fn new(radius_miles: f64) -> Self {
        Self { radius_miles, metrics: None }
    }

    /// Create a pipeline with metrics recording
    pub fn with_metrics(radius_miles: f64, metrics: Arc<Metrics>) -> Self {
        Self { radius_miles, metrics: Some(metrics) }
    }

    pub fn radius_miles(&self) -> f64 {
        self.radius_miles
    }

    pub fn apply(
        &self,
        catalog: &[Venue],
        filter: &FilterState,
        favourites: &Favourites,
        position: Option<&Position>,
    ) -> Vec<ResultItem> {
        let start = Instant::now();
        let results = apply(catalog, filter, favourites, position, self.radius_miles);
        let latency_us = start.elapsed().as_micros() as u64;

        if let Some(ref metrics) = self.metrics {
            metrics.record_filter_run(latency_us);
        }
        debug!(
            mode = %filter.mode,
            query = %filter.search_query,
            has_position = %position.is_some(),
            catalog = %catalog.len(),
            results = %results.len(),
            latency_us = %latency_us,
            "filter_applied"
        );
        results
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new(DEFAULT_RADIUS_MILES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::filter::FilterMode;
    use crate::domain::types::VenueId;

    fn venue(id: &str, name: &str, lat: f64, lng: f64, status: &str, alcohol: bool) -> Venue {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": name,
            "cuisine": "Grill",
            "city": "Dundee",
            "location": { "lat": lat, "lng": lng },
            "halalInfo": { "overallStatus": status },
            "alcoholInfo": { "servesAlcohol": alcohol },
        }))
        .unwrap()
    }

    fn ids(results: &[ResultItem]) -> Vec<&str> {
        results.iter().map(|r| r.id().as_str()).collect()
    }

    fn catalog() -> Vec<Venue> {
        vec![
            venue("near-halal", "Camperdown Grill", 56.462, -2.970, "all-halal", false),
            venue("near-mixed", "Perth Road Diner", 56.457, -2.990, "mixed", true),
            venue("edinburgh", "Leith Kitchen", 55.953, -3.188, "all-halal", false),
        ]
    }

    fn here() -> Position {
        Position::new(56.462, -2.970, 0)
    }

    #[test]
    fn test_radius_restricts_without_query() {
        let results = apply(
            &catalog(),
            &FilterState::default(),
            &Favourites::new(),
            Some(&here()),
            DEFAULT_RADIUS_MILES,
        );
        assert_eq!(ids(&results), vec!["near-halal", "near-mixed"]);
        assert!(results.iter().all(|r| r.distance_miles.unwrap() <= DEFAULT_RADIUS_MILES));
    }

    #[test]
    fn test_no_position_yields_empty_base_set() {
        let results =
            apply(&catalog(), &FilterState::default(), &Favourites::new(), None, DEFAULT_RADIUS_MILES);
        assert!(results.is_empty());
    }

    #[test]
    fn test_query_suspends_radius() {
        let filter = FilterState::default().with_query("LEITH");
        let results = apply(&catalog(), &filter, &Favourites::new(), Some(&here()), DEFAULT_RADIUS_MILES);
        assert_eq!(ids(&results), vec!["edinburgh"]);
        assert!(results[0].distance_miles.unwrap() > DEFAULT_RADIUS_MILES);
    }

    #[test]
    fn test_query_without_position_has_no_distance() {
        let filter = FilterState::default().with_query("grill");
        let results = apply(&catalog(), &filter, &Favourites::new(), None, DEFAULT_RADIUS_MILES);
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.distance_miles.is_none()));
    }

    #[test]
    fn test_everywhere_scope_uses_full_catalog() {
        let filter = FilterState::new(FilterMode::AllHalal).with_scope(SearchScope::Everywhere);
        let results = apply(&catalog(), &filter, &Favourites::new(), None, DEFAULT_RADIUS_MILES);
        assert_eq!(ids(&results), vec!["near-halal", "edinburgh"]);
    }

    #[test]
    fn test_query_and_mode_apply_together() {
        let filter = FilterState::new(FilterMode::NoAlcohol).with_query("dundee");
        let results = apply(&catalog(), &filter, &Favourites::new(), None, DEFAULT_RADIUS_MILES);
        assert_eq!(ids(&results), vec!["near-halal", "edinburgh"]);
    }

    #[test]
    fn test_venue_without_coordinates_only_reachable_by_search() {
        let mut venues = catalog();
        venues.push(
            serde_json::from_str(r#"{ "id": "popup", "name": "Harbour Popup", "city": "Dundee" }"#)
                .unwrap(),
        );

        let nearby = apply(&venues, &FilterState::default(), &Favourites::new(), Some(&here()), 10.0);
        assert!(!nearby.iter().any(|r| r.id() == &VenueId::from("popup")));

        let searched =
            apply(&venues, &FilterState::default().with_query("harbour"), &Favourites::new(), Some(&here()), 10.0);
        assert_eq!(ids(&searched), vec!["popup"]);
        assert_eq!(searched[0].distance_miles, None);
    }

    #[test]
    fn test_same_inputs_same_output() {
        let pipeline = FilterPipeline::default();
        let venues = catalog();
        let filter = FilterState::new(FilterMode::AllHalal);
        let first = pipeline.apply(&venues, &filter, &Favourites::new(), Some(&here()));
        let second = pipeline.apply(&venues, &filter, &Favourites::new(), Some(&here()));
        assert_eq!(first, second);
    }

    #[test]
    fn test_records_filter_runs() {
        let metrics = Arc::new(Metrics::new());
        let pipeline = FilterPipeline::with_metrics(DEFAULT_RADIUS_MILES, metrics.clone());
        pipeline.apply(&catalog(), &FilterState::default(), &Favourites::new(), None);
        pipeline.apply(&catalog(), &FilterState::default(), &Favourites::new(), None);
        assert_eq!(metrics.filter_runs(), 2);
    }
}
