//! Events catalog (Ticketmaster Discovery) client.
//!
//! The wire structs mirror only the parts of the payload the planner reads;
//! everything is optional because the catalog omits fields freely.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::models::{Event, EventQuery, PriceRange, UNTITLED_EVENT};

pub const SELF_TEST_SIZE: u32 = 5;

const USER_AGENT: &str = "event-planner/0.1";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no catalog API key configured")]
    MissingApiKey,
    #[error("invalid catalog url: {0}")]
    InvalidUrl(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("catalog returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("parse error: {0}")]
    Parse(String),
}

#[async_trait]
pub trait EventCatalog: Send + Sync {
    async fn search(&self, query: &EventQuery) -> Result<Vec<Event>, CatalogError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "_embedded")]
    embedded: Option<EmbeddedEvents>,
}

#[derive(Debug, Deserialize)]
struct EmbeddedEvents {
    events: Option<Vec<EventDoc>>,
}

#[derive(Debug, Deserialize)]
struct EventDoc {
    id: Option<String>,
    name: Option<String>,
    images: Option<Vec<ImageDoc>>,
    dates: Option<DatesDoc>,
    #[serde(rename = "_embedded")]
    embedded: Option<EmbeddedVenues>,
    #[serde(rename = "priceRanges")]
    price_ranges: Option<Vec<PriceRangeDoc>>,
}

#[derive(Debug, Deserialize)]
struct ImageDoc {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DatesDoc {
    start: Option<StartDoc>,
}

#[derive(Debug, Deserialize)]
struct StartDoc {
    #[serde(rename = "localDate")]
    local_date: Option<String>,
    #[serde(rename = "localTime")]
    local_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddedVenues {
    venues: Option<Vec<VenueDoc>>,
}

#[derive(Debug, Deserialize)]
struct VenueDoc {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PriceRangeDoc {
    min: Option<f64>,
    max: Option<f64>,
}

/// Builds the catalog search URL for `query`.
pub fn search_url(base_url: &str, api_key: &str, query: &EventQuery) -> Result<Url, CatalogError> {
    let mut url = Url::parse(base_url).map_err(|err| CatalogError::InvalidUrl(err.to_string()))?;
    {
        let mut pairs = url.query_pairs_mut();
        pairs
            .append_pair("apikey", api_key)
            .append_pair("city", &query.city)
            .append_pair("size", &query.size.to_string());
        if let Some(category) = query.category {
            pairs.append_pair("classificationName", category.as_str());
        }
        if let Some(date) = query.start_date {
            pairs.append_pair(
                "startDateTime",
                &format!("{}T00:00:00Z", date.format("%Y-%m-%d")),
            );
        }
    }
    Ok(url)
}

/// Parses a catalog response body. A body without embedded events is an empty result.
pub fn parse_events(body: &str) -> Result<Vec<Event>, CatalogError> {
    let payload: SearchResponse =
        serde_json::from_str(body).map_err(|err| CatalogError::Parse(err.to_string()))?;

    let docs = payload
        .embedded
        .and_then(|embedded| embedded.events)
        .unwrap_or_default();

    Ok(docs.into_iter().map(into_event).collect())
}

fn into_event(doc: EventDoc) -> Event {
    let name = doc
        .name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNTITLED_EVENT.to_string());
    let image_url = doc
        .images
        .and_then(|images| images.into_iter().next())
        .and_then(|image| image.url);
    let (start_date, start_time) = doc
        .dates
        .and_then(|dates| dates.start)
        .map(|start| (start.local_date, start.local_time))
        .unwrap_or((None, None));
    let venue_name = doc
        .embedded
        .and_then(|embedded| embedded.venues)
        .and_then(|venues| venues.into_iter().next())
        .and_then(|venue| venue.name);
    let price_range = doc
        .price_ranges
        .and_then(|ranges| ranges.into_iter().next())
        .map(|range| PriceRange {
            min: range.min,
            max: range.max,
        })
        .filter(|range| range.min.is_some() || range.max.is_some());

    let id = doc
        .id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| {
            derived_id(&[
                name.as_str(),
                start_date.as_deref().unwrap_or(""),
                start_time.as_deref().unwrap_or(""),
                venue_name.as_deref().unwrap_or(""),
                image_url.as_deref().unwrap_or(""),
            ])
        });

    Event {
        id,
        name,
        image_url,
        start_date,
        start_time,
        venue_name,
        price_range,
    }
}

/// Stable identifier for events the catalog returned without one, hashed
/// over every displayed field that can tell two showings apart.
fn derived_id(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (index, part) in parts.iter().enumerate() {
        if index > 0 {
            hasher.update(b"|");
        }
        hasher.update(part.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

pub struct CatalogClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl CatalogClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| CatalogError::Http(err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, CatalogError> {
        Self::new(
            config.catalog_base_url.clone(),
            config.api_key().map(str::to_string),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn search_url(&self, query: &EventQuery) -> Result<Url, CatalogError> {
        let key = self.api_key.as_deref().ok_or(CatalogError::MissingApiKey)?;
        search_url(&self.base_url, key, query)
    }
}

#[async_trait]
impl EventCatalog for CatalogClient {
    async fn search(&self, query: &EventQuery) -> Result<Vec<Event>, CatalogError> {
        let url = self.search_url(query)?;
        debug!(
            city = %query.city,
            category = ?query.category,
            start_date = ?query.start_date,
            size = query.size,
            "catalog search"
        );

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        parse_events(&text)
    }
}

/// The request URL carries the API key, so it never makes it into error text.
fn transport_error(err: reqwest::Error) -> CatalogError {
    CatalogError::Http(err.without_url().to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub enum SelfTestReport {
    Passed { count: usize, first: String },
    NoEvents,
    Failed(String),
}

/// One diagnostic search, logged and never surfaced to the page.
pub async fn self_test(catalog: &dyn EventCatalog, city: &str) -> SelfTestReport {
    info!("testing catalog API with a sample query for {city}");
    let query = EventQuery::new(city).with_size(SELF_TEST_SIZE);

    match catalog.search(&query).await {
        Ok(events) => match events.first() {
            Some(first) => {
                info!(
                    count = events.len(),
                    first = %first.name,
                    "catalog API test successful"
                );
                SelfTestReport::Passed {
                    count: events.len(),
                    first: first.name.clone(),
                }
            }
            None => {
                warn!("catalog API test returned no events");
                SelfTestReport::NoEvents
            }
        },
        Err(err) => {
            error!("catalog API test failed: {err}");
            info!(
                "set TICKETMASTER_API_KEY or run `event-planner config set-api-key <KEY>`; \
                 keys are issued at https://developer.ticketmaster.com/"
            );
            SelfTestReport::Failed(err.to_string())
        }
    }
}
