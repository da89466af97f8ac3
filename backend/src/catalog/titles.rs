//! Display titles synthesized from ids.

use crate::error::{CatalogError, Result};
use regex::Regex;
use std::sync::OnceLock;

fn capital_pattern() -> Result<&'static Regex> {
    static PATTERN: OnceLock<std::result::Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"([A-Z])"))
        .as_ref()
        .map_err(|e| CatalogError::Upstream(format!("Regex error: {}", e)))
}

fn capitalize(id: &str) -> String {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `electronics` -> `Electronics`
pub fn category_title(category_id: &str) -> String {
    capitalize(category_id)
}

/// `flashSale` -> `Flash Sale`, `bestSellers` -> `Best Sellers`
pub fn section_title(section_id: &str) -> Result<String> {
    let capitalized = capitalize(section_id);
    Ok(capital_pattern()?
        .replace_all(&capitalized, " $1")
        .trim()
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_titles_capitalize_first_letter() {
        assert_eq!(category_title("electronics"), "Electronics");
        assert_eq!(category_title("homeDecor"), "HomeDecor");
        assert_eq!(category_title(""), "");
    }

    #[test]
    fn section_titles_split_camel_case() {
        assert_eq!(section_title("flashSale").unwrap(), "Flash Sale");
        assert_eq!(section_title("bestSellers").unwrap(), "Best Sellers");
        assert_eq!(section_title("newArrivalsToday").unwrap(), "New Arrivals Today");
        assert_eq!(section_title("popular").unwrap(), "Popular");
    }
}
