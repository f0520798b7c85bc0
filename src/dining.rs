//! Dining search. Only a placeholder provider exists; nothing leaves the process.

use crate::models::Restaurant;

pub trait DiningProvider: Send + Sync {
    fn search(&self, location: &str, cuisine: &str) -> Vec<Restaurant>;
}

/// Two canned restaurants with the filters echoed back for display.
pub struct PlaceholderDining;

impl DiningProvider for PlaceholderDining {
    fn search(&self, location: &str, cuisine: &str) -> Vec<Restaurant> {
        let location = non_blank(location);
        let cuisine = non_blank(cuisine);
        vec![
            Restaurant {
                name: "Sample Restaurant".to_string(),
                cuisine: cuisine.unwrap_or("Various").to_string(),
                rating: 4.5,
                address: location.unwrap_or("City Center").to_string(),
                gradient: "linear-gradient(135deg, #f093fb 0%, #f5576c 100%)".to_string(),
            },
            Restaurant {
                name: "Another Great Spot".to_string(),
                cuisine: cuisine.unwrap_or("International").to_string(),
                rating: 4.8,
                address: location.unwrap_or("Downtown").to_string(),
                gradient: "linear-gradient(135deg, #4facfe 0%, #00f2fe 100%)".to_string(),
            },
        ]
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
