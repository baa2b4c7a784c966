//! Selection and view synchronization
//!
//! The coordinator is the single writer of the selected venue. List, map,
//! position and external requests all come in tagged with an `Origin`; only
//! list and external origins move the camera, so map-driven updates never
//! loop back into the map. Interaction events never re-run the filter
//! pipeline.
//!
//! Recomputing results is synchronous. Rendering is a deferred transition:
//! each recompute bumps a generation, and `commit_transition` only renders if
//! its token is still the latest.


use crate::domain::filter::{Favourites, FilterMode, FilterState, SearchScope};
use crate::domain::types::{Origin, Position, Region, VenueId};
use crate::domain::venue::ResultItem;
use crate::infra::config::Config;
use crate::infra::metrics::Metrics;
use crate::io::catalog::Catalog;
use crate::io::presenter::{LocationStatus, MapSurface, ResultPresenter};
use crate::services::pipeline::{self, FilterPipeline};
use crate::services::view_model::{ResultsView, ViewableItem};
use crate::services::viewport::{CameraOutcome, MapViewportController};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinatorSettings {
    /// Camera span used when focusing a venue (degrees)
    pub focus_delta: f64,
    pub animation: Duration,
}

impl CoordinatorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            focus_delta: config.focus_delta(),
            animation: Duration::from_millis(config.animation_ms()),
        }
    }
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

pub struct ViewSyncCoordinator<P, M> {
    catalog: Arc<Catalog>,
    favourites: Favourites,
    pipeline: FilterPipeline,
    settings: CoordinatorSettings,
    filter: FilterState,
    position: Option<Position>,
    /// Last fix failed; `position` still bounds the radius but distances are withheld
    position_stale: bool,
    results: Vec<ResultItem>,
    selected: Option<VenueId>,
    viewport: MapViewportController<M>,
    presenter: P,
    /// Latest transition generation
    generation: u64,
    /// Generation last rendered
    committed: u64,
    /// Camera request dropped because the map was not ready yet
    deferred_camera: Option<Region>,
    metrics: Arc<Metrics>,
}

impl<P: ResultPresenter, M: MapSurface> ViewSyncCoordinator<P, M> {
    pub fn new(
        catalog: Arc<Catalog>,
        favourites: Favourites,
        pipeline: FilterPipeline,
        settings: CoordinatorSettings,
        viewport: MapViewportController<M>,
        presenter: P,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            catalog,
            favourites,
            pipeline,
            settings,
            filter: FilterState::default(),
            position: None,
            position_stale: false,
            results: Vec::new(),
            selected: None,
            viewport,
            presenter,
            generation: 0,
            committed: 0,
            deferred_camera: None,
            metrics,
        }
    }

    // ------------------------------------------------------------------
    // Pipeline inputs
    // ------------------------------------------------------------------

    /// Replace the filter state; returns the transition token to commit
    pub fn set_filter(&mut self, filter: FilterState, origin: Origin) -> u64 {
        debug!(
            mode = %filter.mode,
            query = %filter.search_query,
            origin = %origin.as_str(),
            "filter_changed"
        );
        self.filter = filter;
        self.recompute(origin)
    }

    pub fn set_mode(&mut self, mode: FilterMode, origin: Origin) -> u64 {
        let filter = FilterState { mode, ..self.filter.clone() };
        self.set_filter(filter, origin)
    }

    pub fn set_query(&mut self, query: impl Into<String>, origin: Origin) -> u64 {
        let filter = self.filter.clone().with_query(query);
        self.set_filter(filter, origin)
    }

    /// New position, or `None` once tracking has stopped for good
    pub fn on_position(&mut self, position: Option<Position>) -> u64 {
        self.position = position;
        self.position_stale = false;
        self.recompute(Origin::Location)
    }

    /// Transient fix failure
    ///
    /// The last known position keeps bounding the nearby set; distances read
    /// as unavailable until the next fix arrives.
    pub fn on_position_unavailable(&mut self) -> u64 {
        self.position_stale = true;
        self.recompute(Origin::Location)
    }

    fn recompute(&mut self, origin: Origin) -> u64 {
        let results = self.pipeline.apply(
            self.catalog.venues(),
            &self.filter,
            &self.favourites,
            self.position.as_ref(),
        );
        let results = if self.position_stale {
            results.into_iter().map(|item| ResultItem { distance_miles: None, ..item }).collect()
        } else {
            results
        };
        self.on_filter_changed(results, origin);
        self.generation += 1;
        self.generation
    }

    /// Install a new result set, repairing the selection if it fell out
    pub fn on_filter_changed(&mut self, new_results: Vec<ResultItem>, origin: Origin) {
        self.results = new_results;

        let still_valid = self
            .selected
            .as_ref()
            .is_some_and(|id| self.results.iter().any(|item| item.id() == id));
        if still_valid {
            return;
        }

        let fallback = self.results.first().map(|item| item.id().clone());
        debug!(
            fallback = %fallback.as_ref().map(VenueId::as_str).unwrap_or("-"),
            results = %self.results.len(),
            "selection_fallback"
        );
        if self.set_selection(fallback, origin) && origin.animates_camera() {
            if let Some(region) = self.selected_region() {
                self.request_camera(region);
            }
        }
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    pub fn is_transition_pending(&self) -> bool {
        self.generation != self.committed
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Render the results for `token`; stale tokens are ignored
    pub fn commit_transition(&mut self, token: u64) -> bool {
        if token != self.generation {
            debug!(token = %token, generation = %self.generation, "transition_stale");
            return false;
        }
        if token == self.committed {
            return false;
        }
        let view =
            ResultsView::build(token, &self.filter, &self.results, self.selected.as_ref());
        self.presenter.render(&view);
        self.committed = token;
        true
    }

    // ------------------------------------------------------------------
    // Focus and interaction
    // ------------------------------------------------------------------

    /// Select a venue and, for list/external origins, center the map on it
    ///
    /// Venues without coordinates are ignored. Returns whether the request
    /// was accepted.
    pub fn focus(&mut self, venue_id: &VenueId, origin: Origin) -> bool {
        let Some(coordinate) = self.catalog.get(venue_id).and_then(|v| v.coordinate()) else {
            debug!(venue_id = %venue_id, origin = %origin.as_str(), "focus_ignored");
            return false;
        };

        if self.results.iter().any(|item| item.id() == venue_id) {
            self.set_selection(Some(venue_id.clone()), origin);
        } else {
            debug!(venue_id = %venue_id, "focus_target_not_in_results");
        }

        if origin.animates_camera() {
            self.request_camera(Region::around(coordinate, self.settings.focus_delta));
        }
        true
    }

    /// "Show this venue on the map" from outside the discovery screen
    ///
    /// Resets the category to `all`. The search query and scope are kept
    /// unless the target would still be missing: then the scope widens to
    /// everywhere, and the query is dropped only as a last resort.
    pub fn external_focus(&mut self, venue_id: &VenueId) -> bool {
        let Some(venue) = self.catalog.get(venue_id) else {
            return self.focus(venue_id, Origin::External);
        };

        let reset = FilterState { mode: FilterMode::All, ..self.filter.clone() };
        let unsearched = FilterState { search_query: String::new(), ..reset.clone() };
        let candidates = [
            reset.clone(),
            reset.clone().with_scope(SearchScope::Everywhere),
            unsearched.clone(),
            unsearched.with_scope(SearchScope::Everywhere),
        ];
        let filter = candidates
            .into_iter()
            .find(|filter| {
                let listed = pipeline::apply(
                    std::slice::from_ref(venue),
                    filter,
                    &self.favourites,
                    self.position.as_ref(),
                    self.pipeline.radius_miles(),
                );
                !listed.is_empty()
            })
            .unwrap_or(reset);

        if filter != self.filter {
            self.set_filter(filter, Origin::External);
        }
        self.focus(venue_id, Origin::External)
    }

    pub fn on_marker_pressed(&mut self, venue_id: &VenueId) -> bool {
        self.focus(venue_id, Origin::Map)
    }

    /// Carousel viewability changed; select the first visible venue
    ///
    /// Ignored while a transition is pending, since the visible items belong
    /// to the outgoing result set.
    pub fn on_viewport_visible_items_changed(&mut self, items: &[ViewableItem]) {
        if self.is_transition_pending() {
            debug!(generation = %self.generation, "viewability_suppressed");
            return;
        }
        let Some(venue_id) = items.iter().find_map(ViewableItem::venue_id) else {
            return;
        };
        if !self.results.iter().any(|item| item.id() == venue_id) {
            return;
        }
        let venue_id = venue_id.clone();
        if self.set_selection(Some(venue_id), Origin::List) {
            if let Some(region) = self.selected_region() {
                self.request_camera(region);
            }
        }
    }

    // ------------------------------------------------------------------
    // Map lifecycle
    // ------------------------------------------------------------------

    /// Map finished mounting; re-issue the last dropped camera request
    pub fn on_map_ready(&mut self) {
        self.viewport.on_map_ready();
        if let Some(region) = self.deferred_camera.take() {
            debug!(center = %region.center, "camera_reissued");
            self.request_camera(region);
        }
    }

    pub fn on_animation_complete(&mut self, command_id: u64) {
        self.viewport.on_animation_complete(command_id);
    }

    pub fn teardown(&mut self) {
        self.deferred_camera = None;
        self.viewport.teardown();
    }

    pub fn report_location(&mut self, status: &LocationStatus) {
        self.presenter.location_status(status);
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn selected(&self) -> Option<&VenueId> {
        self.selected.as_ref()
    }

    pub fn results(&self) -> &[ResultItem] {
        &self.results
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn viewport(&self) -> &MapViewportController<M> {
        &self.viewport
    }

    // ------------------------------------------------------------------

    fn set_selection(&mut self, selected: Option<VenueId>, origin: Origin) -> bool {
        if self.selected == selected {
            return false;
        }
        self.selected = selected;
        self.metrics.record_selection_change();
        debug!(
            venue_id = %self.selected.as_ref().map(VenueId::as_str).unwrap_or("-"),
            origin = %origin.as_str(),
            "selection_set"
        );
        self.presenter.selection_changed(self.selected.as_ref());
        true
    }

    fn selected_region(&self) -> Option<Region> {
        let id = self.selected.as_ref()?;
        let coordinate = self.catalog.get(id)?.coordinate()?;
        Some(Region::around(coordinate, self.settings.focus_delta))
    }

    fn request_camera(&mut self, region: Region) {
        match self.viewport.animate_to(region, self.settings.animation) {
            CameraOutcome::Issued(_) => self.deferred_camera = None,
            CameraOutcome::DroppedNotReady => self.deferred_camera = Some(region),
            CameraOutcome::DroppedTornDown => {}
        }
    }
}
