pub mod catalog;
pub mod config;
pub mod db;
pub mod dining;
pub mod models;
pub mod page;
pub mod planner;
pub mod render;
pub mod utils;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use catalog::{CatalogClient, CatalogError, EventCatalog, SelfTestReport};
use config::{AppConfig, StorageKind, DEFAULT_SELF_TEST_CITY};
use db::Store;
use dining::{DiningProvider, PlaceholderDining};
use models::{AddToPlanner, Event, PlannerEntry};
use page::{DiningSearchForm, EventSearchForm, Page, SearchError, DUPLICATE_NOTICE};
use planner::{AddOutcome, Planner, PlannerStorage, RemoveOutcome, SessionStorage, StorageError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("catalog client: {0}")]
    Catalog(#[from] CatalogError),
    #[error("planner storage: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Results were rendered into the page.
    Applied(Vec<Event>),
    /// A newer search was issued while this one was in flight; its results were dropped.
    Superseded,
}

/// Owns everything the page handlers touch. Locks are taken planner first,
/// then page, and never held across a catalog request.
///
/// Planner storage is synchronous and runs on the calling task while the
/// planner lock is held. That suits one-shot CLI use; a host serving many
/// concurrent requests should move planner mutations onto a blocking pool.
pub struct App {
    catalog: Box<dyn EventCatalog>,
    dining: Box<dyn DiningProvider>,
    planner: Mutex<Planner>,
    page: Mutex<Page>,
    self_test_city: String,
}

impl App {
    pub fn new(
        catalog: Box<dyn EventCatalog>,
        dining: Box<dyn DiningProvider>,
        storage: Box<dyn PlannerStorage>,
    ) -> Self {
        let planner = Planner::load(storage);
        let mut page = Page::default();
        page.show_planner(planner.entries());
        Self {
            catalog,
            dining,
            planner: Mutex::new(planner),
            page: Mutex::new(page),
            self_test_city: DEFAULT_SELF_TEST_CITY.to_string(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, StartupError> {
        let catalog = CatalogClient::from_config(config)?;
        let storage: Box<dyn PlannerStorage> = match config.storage {
            StorageKind::Session => Box::new(SessionStorage::default()),
            StorageKind::Sqlite => Box::new(Store::open(&config.database_path())?),
        };
        Ok(Self::new(Box::new(catalog), Box::new(PlaceholderDining), storage)
            .with_self_test_city(config.self_test_city.clone()))
    }

    pub fn with_self_test_city(mut self, city: impl Into<String>) -> Self {
        self.self_test_city = city.into();
        self
    }

    /// Startup diagnostic; only logs, never touches the page.
    pub async fn self_test(&self) -> SelfTestReport {
        catalog::self_test(self.catalog.as_ref(), &self.self_test_city).await
    }

    pub async fn handle_event_search(
        &self,
        form: &EventSearchForm,
    ) -> Result<SearchOutcome, SearchError> {
        let query = match form.to_query() {
            Ok(query) => query,
            Err(err) => {
                self.page.lock().await.show_error(err.user_message());
                return Err(err);
            }
        };

        let ticket = self.page.lock().await.begin_search();
        let result = self.catalog.search(&query).await;

        let mut page = self.page.lock().await;
        if !page.is_current(ticket) {
            debug!(ticket, city = %query.city, "dropping superseded search response");
            return Ok(SearchOutcome::Superseded);
        }
        page.finish_search();

        match result {
            Ok(events) => {
                info!(city = %query.city, count = events.len(), "event search complete");
                page.show_events(render::render_events(&events));
                Ok(SearchOutcome::Applied(events))
            }
            Err(err) => {
                error!(city = %query.city, "error fetching events: {err}");
                let err = SearchError::from(err);
                page.show_error(err.user_message());
                Err(err)
            }
        }
    }

    pub async fn handle_dining_search(&self, form: &DiningSearchForm) {
        let restaurants = self.dining.search(&form.location, &form.cuisine);
        self.page.lock().await.show_dining(&restaurants);
    }

    pub async fn add_to_planner(&self, draft: AddToPlanner) -> AddOutcome {
        let mut planner = self.planner.lock().await;
        let outcome = planner.add(draft);
        let mut page = self.page.lock().await;
        match &outcome {
            AddOutcome::Added(entry) => {
                info!(id = %entry.id, "added to planner");
                page.show_planner(planner.entries());
                page.notify(format!("\"{}\" added to your planner!", entry.name));
            }
            AddOutcome::Duplicate => page.notify(DUPLICATE_NOTICE),
        }
        outcome
    }

    /// Fires the add control of the currently displayed result card for `event_id`.
    pub async fn add_displayed_result(&self, event_id: &str) -> Option<AddOutcome> {
        let draft = self
            .page
            .lock()
            .await
            .event_results
            .bindings
            .iter()
            .find(|binding| binding.id == event_id)
            .cloned()?;
        Some(self.add_to_planner(draft).await)
    }

    pub async fn remove_from_planner(&self, event_id: &str) -> RemoveOutcome {
        let mut planner = self.planner.lock().await;
        let outcome = planner.remove(event_id);
        if let RemoveOutcome::Removed(entry) = &outcome {
            info!(id = %entry.id, "removed from planner");
        }
        self.page.lock().await.show_planner(planner.entries());
        outcome
    }

    pub async fn planner_entries(&self) -> Vec<PlannerEntry> {
        self.planner.lock().await.entries().to_vec()
    }

    pub async fn page(&self) -> Page {
        self.page.lock().await.clone()
    }

    pub async fn take_notices(&self) -> Vec<String> {
        self.page.lock().await.take_notices()
    }

    pub async fn render(&self) -> String {
        render::render_page(&*self.page.lock().await)
    }
}
