//! HTML fragments for the planner page.
//!
//! Every value that did not originate in this module goes through
//! [`escape_html`]. Controls never carry inline script: they are tagged with a
//! `data-action` and the identifying `data-*` attributes, and the renderer
//! hands back the typed payload for each control alongside the markup.

use std::fmt::Write as _;

use reqwest::Url;

use crate::models::{AddToPlanner, Category, Event, PlannerEntry, Restaurant};
use crate::page::Page;

pub const NO_EVENTS_MESSAGE: &str = "No events found. Try different search criteria.";
pub const EMPTY_PLANNER_MESSAGE: &str =
    "Your planner is empty. Search for events and add them here.";
pub const ADD_ACTION: &str = "add-to-planner";
pub const REMOVE_ACTION: &str = "remove-from-planner";

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Rendered results grid plus the payload behind each card's add control, in card order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultsView {
    pub html: String,
    pub bindings: Vec<AddToPlanner>,
}

pub fn render_events(events: &[Event]) -> ResultsView {
    if events.is_empty() {
        return ResultsView {
            html: format!(r#"<p class="empty-state">{NO_EVENTS_MESSAGE}</p>"#),
            bindings: Vec::new(),
        };
    }

    let mut html = String::new();
    let mut bindings = Vec::with_capacity(events.len());
    for event in events {
        let draft = event.planner_draft();
        html.push_str(&event_card(event, &draft));
        bindings.push(draft);
    }
    ResultsView { html, bindings }
}

fn event_card(event: &Event, draft: &AddToPlanner) -> String {
    let image = event
        .image_url
        .as_deref()
        .and_then(safe_image_url)
        .map(|src| {
            format!(
                r#"<img class="event-image" src="{}" alt="{}" loading="lazy">"#,
                escape_html(&src),
                escape_html(&event.name)
            )
        })
        .unwrap_or_else(|| r#"<div class="event-image event-image-missing"></div>"#.to_string());
    let when = format!("{} {}", event.date_label(), event.time_label());

    format!(
        r#"<div class="event-card">
    {image}
    <div class="event-content">
        <h4 class="event-title">{name}</h4>
        <p class="event-date">📅 {when}</p>
        <p class="event-venue">📍 {venue}</p>
        <p class="event-price">💵 {price}</p>
        <button type="button" class="btn btn-secondary" data-action="{ADD_ACTION}" data-event-id="{id}" data-event-name="{draft_name}" data-event-date="{draft_date}" data-event-venue="{draft_venue}">Add to Planner</button>
    </div>
</div>
"#,
        name = escape_html(&event.name),
        when = escape_html(when.trim_end()),
        venue = escape_html(event.venue_label()),
        price = escape_html(&event.price_label()),
        id = escape_html(&draft.id),
        draft_name = escape_html(&draft.name),
        draft_date = escape_html(&draft.date),
        draft_venue = escape_html(&draft.venue),
    )
}

/// Only absolute http(s) image links make it into markup.
fn safe_image_url(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    match url.scheme() {
        "http" | "https" => Some(url.to_string()),
        _ => None,
    }
}

/// Planner list items; empty string for an empty planner.
pub fn render_planner(entries: &[PlannerEntry]) -> String {
    let mut html = String::new();
    for entry in entries {
        let _ = write!(
            html,
            r#"<div class="event-card planner-item" data-event-id="{id}">
    <div class="planner-details">
        <h4>{name}</h4>
        <p>📅 {date}</p>
        <p>📍 {venue}</p>
    </div>
    <button type="button" class="btn btn-secondary" data-action="{REMOVE_ACTION}" data-event-id="{id}">Remove</button>
</div>
"#,
            id = escape_html(&entry.id),
            name = escape_html(&entry.name),
            date = escape_html(&entry.date),
            venue = escape_html(&entry.venue),
        );
    }
    html
}

pub fn render_restaurants(restaurants: &[Restaurant]) -> String {
    let mut html = String::new();
    for restaurant in restaurants {
        let _ = write!(
            html,
            r#"<div class="restaurant-card">
    <div class="restaurant-image" style="background: {gradient};"></div>
    <div class="restaurant-content">
        <h4 class="restaurant-name">{name}</h4>
        <p class="restaurant-cuisine">🍽️ {cuisine} Cuisine</p>
        <p class="restaurant-rating">⭐ {rating}/5</p>
        <p class="restaurant-address">📍 {address}</p>
    </div>
</div>
"#,
            gradient = escape_html(&restaurant.gradient),
            name = escape_html(&restaurant.name),
            cuisine = escape_html(&restaurant.cuisine),
            rating = restaurant.rating,
            address = escape_html(&restaurant.address),
        );
    }
    html
}

fn display(visible: bool, shown_as: &str) -> String {
    if visible {
        format!("display: {shown_as};")
    } else {
        "display: none;".to_string()
    }
}

fn category_options() -> String {
    let mut options = String::from(r#"<option value="">All Events</option>"#);
    for category in Category::ALL {
        let _ = write!(
            options,
            r#"<option value="{}">{}</option>"#,
            category.as_str(),
            escape_html(category.display_name())
        );
    }
    options
}

/// Whole page document for the current view state.
pub fn render_page(page: &Page) -> String {
    let error_text = page.error.as_deref().map(escape_html).unwrap_or_default();
    let notices: String = page
        .notices
        .iter()
        .map(|notice| format!(r#"<li class="notice">{}</li>"#, escape_html(notice)))
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Event Planner</title>
</head>
<body>
<main class="container">
<section class="search-section">
    <h2>Find Events</h2>
    <form id="eventSearchForm">
        <input type="text" id="location" name="location" placeholder="City" required>
        <select id="eventType" name="eventType">{options}</select>
        <input type="date" id="dateRange" name="dateRange">
        <button type="submit" class="btn btn-primary">Search Events</button>
    </form>
    <div id="errorMessage" class="error-message" style="{error_display}">{error_text}</div>
    <div id="loadingSpinner" class="spinner" style="{loading_display}"></div>
    <div id="eventResults" class="results-grid" style="{results_display}">{results}</div>
</section>
<section class="search-section">
    <h2>Find Dining</h2>
    <form id="diningSearchForm">
        <input type="text" id="diningLocation" name="diningLocation" placeholder="City">
        <input type="text" id="cuisine" name="cuisine" placeholder="Cuisine">
        <button type="submit" class="btn btn-primary">Search Restaurants</button>
    </form>
    <div id="diningResults" class="results-grid">{dining}</div>
</section>
<section class="planner-section">
    <h2>My Planner</h2>
    <p class="empty-state" style="{empty_display}">{EMPTY_PLANNER_MESSAGE}</p>
    <div id="plannerItems">{planner}</div>
</section>
<ul class="notices">{notices}</ul>
</main>
</body>
</html>
"#,
        options = category_options(),
        error_display = display(page.error.is_some(), "block"),
        loading_display = display(page.loading, "block"),
        results_display = display(!page.loading, "grid"),
        results = page.event_results.html,
        dining = page.dining_results,
        empty_display = display(page.planner_empty, "block"),
        planner = page.planner_items,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PriceRange, DATE_FALLBACK, PRICE_FALLBACK, VENUE_FALLBACK};
    use chrono::{TimeZone, Utc};
    use once_cell::sync::Lazy;
    use scraper::{Html, Selector};

    static CARD: Lazy<Selector> = Lazy::new(|| Selector::parse("div.event-card").expect("card"));
    static ADD_BUTTON: Lazy<Selector> = Lazy::new(|| {
        Selector::parse(r#"button[data-action="add-to-planner"]"#).expect("add button")
    });
    static REMOVE_BUTTON: Lazy<Selector> = Lazy::new(|| {
        Selector::parse(r#"button[data-action="remove-from-planner"]"#).expect("remove button")
    });
    static EMPTY_STATE: Lazy<Selector> =
        Lazy::new(|| Selector::parse("p.empty-state").expect("empty state"));
    static SCRIPT_OR_HANDLER: Lazy<Selector> =
        Lazy::new(|| Selector::parse("script, [onclick]").expect("script"));

    fn event(id: &str, name: &str) -> Event {
        Event {
            id: id.to_string(),
            name: name.to_string(),
            image_url: Some(format!("https://img.example.com/{id}.jpg")),
            start_date: Some("2024-05-01".to_string()),
            start_time: Some("19:30:00".to_string()),
            venue_name: Some("Test Arena".to_string()),
            price_range: Some(PriceRange {
                min: Some(20.0),
                max: Some(45.0),
            }),
        }
    }

    fn fragment(html: &str) -> Html {
        Html::parse_fragment(html)
    }

    #[test]
    fn escape_covers_markup_and_quotes() {
        assert_eq!(
            escape_html(r#"<b>"Tom & Jerry's"</b>"#),
            "&lt;b&gt;&quot;Tom &amp; Jerry&#39;s&quot;&lt;/b&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn zero_events_render_empty_state() {
        let view = render_events(&[]);
        assert!(view.bindings.is_empty());
        let doc = fragment(&view.html);
        assert_eq!(doc.select(&CARD).count(), 0);
        let empty: Vec<_> = doc.select(&EMPTY_STATE).collect();
        assert_eq!(empty.len(), 1);
        assert_eq!(empty[0].text().collect::<String>(), NO_EVENTS_MESSAGE);
    }

    #[test]
    fn one_event_renders_one_wired_card() {
        let view = render_events(&[event("G5v1", "Test Show")]);
        let doc = fragment(&view.html);
        assert_eq!(doc.select(&CARD).count(), 1);
        assert!(view.html.contains("Test Show"));
        assert!(view.html.contains("2024-05-01"));
        assert!(view.html.contains("Test Arena"));
        assert!(view.html.contains("$20 - $45"));

        let button = doc.select(&ADD_BUTTON).next().expect("add control");
        assert_eq!(button.text().collect::<String>(), "Add to Planner");
        assert_eq!(button.value().attr("data-event-id"), Some("G5v1"));
        assert_eq!(button.value().attr("data-event-name"), Some("Test Show"));
        assert_eq!(button.value().attr("data-event-date"), Some("2024-05-01"));
        assert_eq!(button.value().attr("data-event-venue"), Some("Test Arena"));

        assert_eq!(view.bindings, vec![event("G5v1", "Test Show").planner_draft()]);
    }

    #[test]
    fn five_events_render_five_cards_with_fallbacks() {
        let mut events: Vec<Event> = (0..5).map(|i| event(&format!("e{i}"), &format!("Show {i}"))).collect();
        events[2].start_date = None;
        events[2].start_time = None;
        events[2].venue_name = None;
        events[2].price_range = None;
        events[2].image_url = None;

        let view = render_events(&events);
        let doc = fragment(&view.html);
        let cards: Vec<_> = doc.select(&CARD).collect();
        assert_eq!(cards.len(), 5);
        assert_eq!(view.bindings.len(), 5);

        let sparse = cards[2].text().collect::<String>();
        assert!(sparse.contains(DATE_FALLBACK));
        assert!(sparse.contains(VENUE_FALLBACK));
        assert!(sparse.contains(PRICE_FALLBACK));
        assert_eq!(view.bindings[2].date, DATE_FALLBACK);
        assert_eq!(view.bindings[2].venue, VENUE_FALLBACK);
    }

    #[test]
    fn hostile_text_never_becomes_markup() {
        let mut hostile = event("x'); alert(1); ('", "<script>alert('name')</script>");
        hostile.venue_name = Some(r#"Arena" onmouseover="alert(2)"#.to_string());
        let view = render_events(&[hostile.clone()]);
        let doc = fragment(&view.html);

        assert_eq!(doc.select(&SCRIPT_OR_HANDLER).count(), 0);
        let button = doc.select(&ADD_BUTTON).next().expect("add control");
        assert_eq!(button.value().attr("data-event-id"), Some(hostile.id.as_str()));
        assert_eq!(button.value().attr("data-event-name"), Some(hostile.name.as_str()));
        assert_eq!(
            button.value().attr("data-event-venue"),
            hostile.venue_name.as_deref()
        );
        assert!(button.value().attr("onmouseover").is_none());
    }

    #[test]
    fn non_http_image_links_are_dropped() {
        let mut event = event("js", "Sneaky");
        event.image_url = Some("javascript:alert(1)".to_string());
        let view = render_events(&[event]);
        assert!(!view.html.contains("javascript:"));
        assert!(view.html.contains("event-image-missing"));
    }

    #[test]
    fn planner_items_have_scoped_remove_controls() {
        let added_at = Utc.with_ymd_and_hms(2024, 4, 1, 12, 0, 0).single().expect("time");
        let entries = vec![
            PlannerEntry {
                id: "a".to_string(),
                name: "Alpha".to_string(),
                date: "2024-05-01".to_string(),
                venue: "Hall <A>".to_string(),
                added_at,
            },
            PlannerEntry {
                id: "b".to_string(),
                name: "Beta".to_string(),
                date: DATE_FALLBACK.to_string(),
                venue: VENUE_FALLBACK.to_string(),
                added_at,
            },
        ];
        let html = render_planner(&entries);
        let doc = fragment(&html);
        let ids: Vec<_> = doc
            .select(&REMOVE_BUTTON)
            .filter_map(|button| button.value().attr("data-event-id"))
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(html.contains("Hall &lt;A&gt;"));
        assert!(render_planner(&[]).is_empty());
    }

    #[test]
    fn page_reflects_loading_error_and_empty_planner() {
        let mut page = Page::default();
        page.loading = true;
        page.error = Some("Please enter a location".to_string());
        page.notices.push("<b>hi</b>".to_string());

        let html = render_page(&page);
        let doc = Html::parse_document(&html);
        let spinner = Selector::parse("#loadingSpinner").expect("spinner");
        let results = Selector::parse("#eventResults").expect("results");
        let banner = Selector::parse("#errorMessage").expect("banner");
        let options = Selector::parse("#eventType option").expect("options");

        let style = |sel: &Selector| {
            doc.select(sel)
                .next()
                .and_then(|el| el.value().attr("style"))
                .map(str::to_string)
        };
        assert_eq!(style(&spinner).as_deref(), Some("display: block;"));
        assert_eq!(style(&results).as_deref(), Some("display: none;"));
        assert_eq!(style(&banner).as_deref(), Some("display: block;"));
        assert_eq!(doc.select(&options).count(), 5);
        assert!(html.contains(EMPTY_PLANNER_MESSAGE));
        assert!(html.contains("&lt;b&gt;hi&lt;/b&gt;"));
    }
}
