// 🗂️ Gallery Session - the single owner of everything the gallery displays
//
// Holds the full collection, the load status that drives the loading and
// error indicators, the active query and the current render with its
// per-card view state. Callers pass it by reference; nothing is global.

use crate::creature::Collection;
use crate::filter::{self, FilterQuery};
use crate::loader::{LoadReport, Loader, NetworkError};
use crate::render::{self, ImageRegion, Rendered};
use crate::view_state::{ImageVariant, ViewStates};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::ops::RangeInclusive;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadStatus {
    Idle,
    Loading,
    Loaded { count: usize, failed: Vec<u32> },
    Failed { id: u32, message: String },
}

impl LoadStatus {
    pub fn shows_loading_indicator(&self) -> bool {
        matches!(self, LoadStatus::Loading)
    }

    /// Error panel with the retry affordance
    pub fn shows_error(&self) -> bool {
        matches!(self, LoadStatus::Failed { .. })
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    collection: Collection,
    status: LoadStatus,
    query: FilterQuery,
    visible: Collection,
    rendered: Option<Rendered>,
    views: ViewStates,
    loaded_at: Option<DateTime<Utc>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            collection: Collection::new(),
            status: LoadStatus::Idle,
            query: FilterQuery::default(),
            visible: Collection::new(),
            rendered: None,
            views: ViewStates::default(),
            loaded_at: None,
        }
    }

    /// Session over an already available collection (e.g. an offline snapshot).
    pub fn from_collection(collection: Collection) -> Self {
        let mut session = Self::new();
        session.finish_load(Ok(LoadReport {
            collection,
            failures: Vec::new(),
        }))
        .ok();
        session
    }

    // ========================================================================
    // LOADING
    // ========================================================================

    /// Show the loading indicator and clear whatever was displayed.
    pub fn begin_load(&mut self) {
        self.status = LoadStatus::Loading;
        self.rendered = None;
        self.views = ViewStates::default();
    }

    /// Store a finished load and render it with the current query.
    ///
    /// A failed load leaves the collection untouched and switches to the
    /// error state; the loading indicator is cleared either way.
    pub fn finish_load(
        &mut self,
        result: Result<LoadReport, NetworkError>,
    ) -> Result<usize, NetworkError> {
        match result {
            Ok(report) => {
                let count = report.collection.len();
                let failed = report.failures.iter().map(|f| f.id).collect();
                self.collection = report.collection;
                self.loaded_at = Some(Utc::now());
                self.status = LoadStatus::Loaded { count, failed };
                self.refresh();
                info!(count, "session loaded");
                Ok(count)
            }
            Err(err) => {
                warn!(id = err.id, error = %err, "session load failed");
                self.status = LoadStatus::Failed {
                    id: err.id,
                    message: err.to_string(),
                };
                self.rendered = None;
                Err(err)
            }
        }
    }

    pub async fn load(
        &mut self,
        loader: &Loader,
        ids: RangeInclusive<u32>,
    ) -> Result<usize, NetworkError> {
        self.begin_load();
        let result = loader.load(ids).await;
        self.finish_load(result)
    }

    // ========================================================================
    // FILTER + RENDER
    // ========================================================================

    /// Filter the full collection and re-render; every card resets to Primary.
    pub fn apply_filter(&mut self, query: FilterQuery) -> &Rendered {
        self.query = query;
        self.visible = filter::apply(&self.collection, &self.query);
        self.views = ViewStates::reset(self.visible.ids());
        self.rendered.insert(render::render(&self.visible, &self.views))
    }

    /// Re-render with the current query.
    pub fn refresh(&mut self) -> &Rendered {
        let query = self.query.clone();
        self.apply_filter(query)
    }

    /// Flip one card's image. `None` if the card is not on display.
    pub fn toggle_image(&mut self, id: u32) -> Option<ImageRegion> {
        let creature = self.visible.get(id)?;
        let variant = self.views.toggle(id)?;
        let region = ImageRegion::new(creature, variant);

        if let Some(Rendered::Cards(cards)) = self.rendered.as_mut() {
            if let Some(card) = cards.iter_mut().find(|c| c.id == id) {
                card.image = region.clone();
            }
        }

        Some(region)
    }

    /// Render `query` against the full collection without touching this
    /// session's own query or card states. Every card starts at Primary.
    /// `None` unless a collection is loaded.
    pub fn view(&self, query: &FilterQuery) -> Option<Rendered> {
        if !matches!(self.status, LoadStatus::Loaded { .. }) {
            return None;
        }
        let visible = filter::apply(&self.collection, query);
        Some(render::render(&visible, &ViewStates::reset(visible.ids())))
    }

    /// Next image for a card some other view shows as `current`.
    /// `None` if the card is not part of `query`'s result.
    pub fn flip_image(
        &self,
        query: &FilterQuery,
        id: u32,
        current: ImageVariant,
    ) -> Option<ImageRegion> {
        let creature = self.collection.get(id).filter(|c| query.matches(c))?;
        Some(ImageRegion::new(creature, current.toggled()))
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn visible(&self) -> &Collection {
        &self.visible
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn query(&self) -> &FilterQuery {
        &self.query
    }

    /// `None` while loading or after a failed load
    pub fn rendered(&self) -> Option<&Rendered> {
        self.rendered.as_ref()
    }

    pub fn views(&self) -> &ViewStates {
        &self.views
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }
}
