use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PAGE_SIZE: u32 = 20;

pub const UNTITLED_EVENT: &str = "Untitled Event";
pub const DATE_FALLBACK: &str = "Date TBA";
pub const VENUE_FALLBACK: &str = "Venue TBA";
pub const PRICE_FALLBACK: &str = "Price TBA";

/// An event as returned by one catalog search. Never stored.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Event {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub start_date: Option<String>,
    pub start_time: Option<String>,
    pub venue_name: Option<String>,
    pub price_range: Option<PriceRange>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct PriceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Event {
    pub fn date_label(&self) -> &str {
        non_blank(self.start_date.as_deref()).unwrap_or(DATE_FALLBACK)
    }

    pub fn time_label(&self) -> &str {
        non_blank(self.start_time.as_deref()).unwrap_or("")
    }

    pub fn venue_label(&self) -> &str {
        non_blank(self.venue_name.as_deref()).unwrap_or(VENUE_FALLBACK)
    }

    pub fn price_label(&self) -> String {
        self.price_range
            .and_then(|range| range.label())
            .unwrap_or_else(|| PRICE_FALLBACK.to_string())
    }

    /// What the card's "Add to Planner" control hands to the planner.
    pub fn planner_draft(&self) -> AddToPlanner {
        AddToPlanner {
            id: self.id.clone(),
            name: self.name.clone(),
            date: self.date_label().to_string(),
            venue: self.venue_label().to_string(),
        }
    }
}

impl PriceRange {
    pub fn label(&self) -> Option<String> {
        match (self.min, self.max) {
            (Some(min), Some(max)) => Some(format!("${min} - ${max}")),
            (Some(only), None) | (None, Some(only)) => Some(format!("${only}")),
            (None, None) => None,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}

/// Payload bound to a result card's add control.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AddToPlanner {
    pub id: String,
    pub name: String,
    pub date: String,
    pub venue: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PlannerEntry {
    pub id: String,
    pub name: String,
    pub date: String,
    pub venue: String,
    pub added_at: DateTime<Utc>,
}

impl PlannerEntry {
    pub fn from_draft(draft: AddToPlanner, added_at: DateTime<Utc>) -> Self {
        Self {
            id: draft.id,
            name: draft.name,
            date: draft.date,
            venue: draft.venue,
            added_at,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown event type: {0}")]
pub struct UnknownCategory(pub String);

/// Catalog classification filter.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Music,
    Sports,
    Arts,
    Family,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Music,
        Category::Sports,
        Category::Arts,
        Category::Family,
    ];

    /// Value sent as `classificationName`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Music => "music",
            Category::Sports => "sports",
            Category::Arts => "arts",
            Category::Family => "family",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Category::Music => "Music",
            Category::Sports => "Sports",
            Category::Arts => "Arts & Theatre",
            Category::Family => "Family",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownCategory(wanted.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventQuery {
    pub city: String,
    pub category: Option<Category>,
    pub start_date: Option<NaiveDate>,
    pub size: u32,
}

impl EventQuery {
    pub fn new(city: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            category: None,
            start_date: None,
            size: PAGE_SIZE,
        }
    }

    pub fn with_category(mut self, category: Option<Category>) -> Self {
        self.category = category;
        self
    }

    pub fn starting_on(mut self, date: Option<NaiveDate>) -> Self {
        self.start_date = date;
        self
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Restaurant {
    pub name: String,
    pub cuisine: String,
    pub rating: f32,
    pub address: String,
    pub gradient: String,
}
