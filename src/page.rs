//! View state of the planner page and the form inputs that drive it.

use chrono::NaiveDate;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::models::{Category, EventQuery, PlannerEntry, Restaurant};
use crate::render::{self, ResultsView};

pub const RETRY_MESSAGE: &str = "Failed to fetch events. Please try again.";
pub const LOCATION_REQUIRED: &str = "Please enter a location";
pub const DUPLICATE_NOTICE: &str = "This event is already in your planner!";

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("{0}")]
    Validation(String),
    #[error("request failed: {0}")]
    RequestFailed(#[from] CatalogError),
}

impl SearchError {
    /// Text for the error banner. Request failures never leak their cause.
    pub fn user_message(&self) -> String {
        match self {
            SearchError::Validation(message) => message.clone(),
            SearchError::RequestFailed(_) => RETRY_MESSAGE.to_string(),
        }
    }
}

/// Raw values of the event search form. Empty strings mean "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventSearchForm {
    pub location: String,
    pub event_type: String,
    pub date_range: String,
}

impl EventSearchForm {
    pub fn to_query(&self) -> Result<EventQuery, SearchError> {
        let location = self.location.trim();
        if location.is_empty() {
            return Err(SearchError::Validation(LOCATION_REQUIRED.to_string()));
        }

        let category = match self.event_type.trim() {
            "" => None,
            raw => Some(
                raw.parse::<Category>()
                    .map_err(|err| SearchError::Validation(err.to_string()))?,
            ),
        };

        let start_date = match self.date_range.trim() {
            "" => None,
            raw => Some(NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                SearchError::Validation(format!("Please enter a date as YYYY-MM-DD, not {raw}"))
            })?),
        };

        Ok(EventQuery::new(location)
            .with_category(category)
            .starting_on(start_date))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiningSearchForm {
    pub location: String,
    pub cuisine: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub event_results: ResultsView,
    pub dining_results: String,
    pub planner_items: String,
    pub planner_empty: bool,
    pub loading: bool,
    pub error: Option<String>,
    pub notices: Vec<String>,
    latest_search: u64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            event_results: ResultsView::default(),
            dining_results: String::new(),
            planner_items: String::new(),
            planner_empty: true,
            loading: false,
            error: None,
            notices: Vec::new(),
            latest_search: 0,
        }
    }
}

impl Page {
    /// Issues the ticket for a new search and shows the loading indicator.
    pub fn begin_search(&mut self) -> u64 {
        self.latest_search += 1;
        self.loading = true;
        self.hide_error();
        self.latest_search
    }

    /// Only the most recently issued ticket may touch the results grid.
    pub fn is_current(&self, ticket: u64) -> bool {
        ticket == self.latest_search
    }

    pub fn finish_search(&mut self) {
        self.loading = false;
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn hide_error(&mut self) {
        self.error = None;
    }

    pub fn show_events(&mut self, view: ResultsView) {
        self.event_results = view;
    }

    pub fn show_dining(&mut self, restaurants: &[Restaurant]) {
        self.dining_results = render::render_restaurants(restaurants);
    }

    pub fn show_planner(&mut self, entries: &[PlannerEntry]) {
        self.planner_empty = entries.is_empty();
        self.planner_items = render::render_planner(entries);
    }

    pub fn notify(&mut self, message: impl Into<String>) {
        self.notices.push(message.into());
    }

    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }
}
