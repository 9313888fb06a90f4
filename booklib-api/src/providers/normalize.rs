//! Record normalization
//!
//! Maps the heterogeneous raw shapes the metadata providers return into
//! the provider-agnostic [`NormalizedRecord`] the reconciler consumes.
//! Absent or unusable fields are always `None` (or an empty list), never
//! an empty string or zero, so the reconciler can tell "not provided"
//! from "explicitly empty".

use serde::{Deserialize, Serialize};

/// Provider-agnostic representation of fetched book metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub title: Option<String>,
    /// Ordered author display names, possibly empty
    pub authors: Vec<String>,
    pub description: Option<String>,
    pub series: Option<String>,
    pub publish_year: Option<i64>,
    /// Free-text genre/tag names
    pub genres: Vec<String>,
    pub cover_url: Option<String>,
}

impl NormalizedRecord {
    /// True when the record carries nothing usable
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.authors.is_empty()
            && self.description.is_none()
            && self.series.is_none()
            && self.publish_year.is_none()
            && self.genres.is_empty()
            && self.cover_url.is_none()
    }
}

/// A raw field that is either a scalar or a list of scalars
///
/// Open Library presents `series` both ways; only the first element of a
/// list is kept.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_first(self) -> Option<T> {
        match self {
            OneOrMany::One(value) => Some(value),
            OneOrMany::Many(values) => values.into_iter().next(),
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

/// A raw text field that is either a plain string or a `{"value": ...}`
/// wrapper object (Open Library's text type)
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TextOrValue {
    Text(String),
    Object { value: String },
}

impl TextOrValue {
    pub fn into_text(self) -> String {
        match self {
            TextOrValue::Text(text) => text,
            TextOrValue::Object { value } => value,
        }
    }
}

/// Extract the year from a free-text publish date
///
/// Takes the portion before the first `-` and parses it as an integer.
/// Unparsable or absent input yields `None`, never a fabricated default.
pub fn year_from_date(raw: &str) -> Option<i64> {
    raw.split('-').next()?.trim().parse::<i64>().ok()
}

/// Collapse an optional string field, mapping blank values to `None`
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_from_full_date() {
        assert_eq!(year_from_date("1965-06-01"), Some(1965));
        assert_eq!(year_from_date("2016-10-18"), Some(2016));
    }

    #[test]
    fn test_year_from_bare_year() {
        assert_eq!(year_from_date("1984"), Some(1984));
    }

    #[test]
    fn test_year_from_malformed_input() {
        assert_eq!(year_from_date("June 1965"), None);
        assert_eq!(year_from_date(""), None);
        assert_eq!(year_from_date("-06-01"), None);
    }

    #[test]
    fn test_series_list_keeps_first_element() {
        let raw: OneOrMany<String> = serde_json::from_str(r#"["Dune Chronicles", "Other"]"#)
            .expect("deserialize list");
        assert_eq!(raw.into_first().as_deref(), Some("Dune Chronicles"));
    }

    #[test]
    fn test_series_scalar_passes_through() {
        let raw: OneOrMany<String> =
            serde_json::from_str(r#""Discworld""#).expect("deserialize scalar");
        assert_eq!(raw.into_first().as_deref(), Some("Discworld"));
    }

    #[test]
    fn test_series_empty_list_yields_none() {
        let raw: OneOrMany<String> = serde_json::from_str("[]").expect("deserialize empty list");
        assert!(raw.into_first().is_none());
    }

    #[test]
    fn test_description_value_object_extracted() {
        let raw: TextOrValue =
            serde_json::from_str(r#"{"type": "/type/text", "value": "A desert planet."}"#)
                .expect("deserialize object");
        assert_eq!(raw.into_text(), "A desert planet.");
    }

    #[test]
    fn test_description_plain_string_used_as_is() {
        let raw: TextOrValue =
            serde_json::from_str(r#""A desert planet.""#).expect("deserialize string");
        assert_eq!(raw.into_text(), "A desert planet.");
    }

    #[test]
    fn test_non_blank_maps_empty_to_none() {
        assert_eq!(non_blank(Some("  ".to_string())), None);
        assert_eq!(non_blank(Some(String::new())), None);
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some("x".to_string())).as_deref(), Some("x"));
    }

    #[test]
    fn test_empty_record_is_empty() {
        assert!(NormalizedRecord::default().is_empty());

        let record = NormalizedRecord {
            publish_year: Some(1965),
            ..Default::default()
        };
        assert!(!record.is_empty());
    }
}
