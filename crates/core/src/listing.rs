//! Search, sort, and text helpers for list pages.
//!
//! The document store only filters by equality, so every list page loads a
//! whole collection and narrows it here.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of a sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Query-string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// The opposite direction, used by clickable column headers.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(format!("invalid sort order: {s}")),
        }
    }
}

/// Keep the items where any of the extracted fields contains `term`,
/// ignoring case.
///
/// A blank term (empty or whitespace only) keeps everything.
///
/// ```
/// use store_ratings_core::filter_by_search_term;
///
/// let stores = vec![("Corner Shop", "12 Elm St, Springfield"), ("Bakery", "Shelbyville")];
/// let hits = filter_by_search_term(stores, "springfield", |s| [s.0, s.1]);
/// assert_eq!(hits.len(), 1);
/// ```
#[must_use]
pub fn filter_by_search_term<T, F, const N: usize>(items: Vec<T>, term: &str, fields: F) -> Vec<T>
where
    F: for<'a> Fn(&'a T) -> [&'a str; N],
{
    if term.trim().is_empty() {
        return items;
    }
    let needle = term.to_lowercase();
    items
        .into_iter()
        .filter(|item| {
            fields(item)
                .iter()
                .any(|field| field.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Stable sort of `items` by the extracted key.
///
/// Keys that cannot be compared (NaN averages) are treated as equal.
#[must_use]
pub fn sort_by_key<T, K, F>(mut items: Vec<T>, key: F, order: SortOrder) -> Vec<T>
where
    K: PartialOrd,
    F: Fn(&T) -> K,
{
    items.sort_by(|a, b| {
        let ord = key(a).partial_cmp(&key(b)).unwrap_or(Ordering::Equal);
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
    items
}

/// Cut `text` to `max` characters and append "..." when it is longer.
#[must_use]
pub fn truncate_text(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_owned();
    }
    let mut cut: String = text.chars().take(max).collect();
    cut.push_str("...");
    cut
}

/// Short US-style date, e.g. "Jan 5, 2025".
#[must_use]
pub fn format_date(ts: DateTime<Utc>) -> String {
    ts.format("%b %-d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    struct Store {
        name: &'static str,
        address: &'static str,
        average: f64,
    }

    fn stores() -> Vec<Store> {
        vec![
            Store {
                name: "Springfield Hardware",
                address: "1 Main St",
                average: 4.5,
            },
            Store {
                name: "Corner Bakery",
                address: "742 Evergreen Terrace, SPRINGFIELD",
                average: 3.0,
            },
            Store {
                name: "Ocean Books",
                address: "9 Harbor Rd, Shelbyville",
                average: 4.9,
            },
        ]
    }

    #[test]
    fn test_filter_matches_any_field_ignoring_case() {
        let hits = filter_by_search_term(stores(), "springfield", |s| [s.name, s.address]);
        let names: Vec<&str> = hits.iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Springfield Hardware", "Corner Bakery"]);
    }

    #[test]
    fn test_filter_blank_term_keeps_all() {
        assert_eq!(filter_by_search_term(stores(), "", |s| [s.name]).len(), 3);
        assert_eq!(filter_by_search_term(stores(), "   ", |s| [s.name]).len(), 3);
    }

    #[test]
    fn test_filter_only_listed_fields() {
        let hits = filter_by_search_term(stores(), "harbor", |s| [s.name]);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_sort_by_text_and_number() {
        let by_name = sort_by_key(stores(), |s| s.name, SortOrder::Asc);
        assert_eq!(by_name.first().map(|s| s.name), Some("Corner Bakery"));

        let by_rating = sort_by_key(stores(), |s| s.average, SortOrder::Desc);
        let averages: Vec<f64> = by_rating.iter().map(|s| s.average).collect();
        assert_eq!(averages, vec![4.9, 4.5, 3.0]);
    }

    #[test]
    fn test_sort_is_stable() {
        let items = vec![(1, 'a'), (0, 'b'), (1, 'c'), (0, 'd')];
        let sorted = sort_by_key(items, |i| i.0, SortOrder::Desc);
        assert_eq!(sorted, vec![(1, 'a'), (1, 'c'), (0, 'b'), (0, 'd')]);
    }

    #[test]
    fn test_sort_order_parse_and_toggle() {
        assert_eq!("desc".parse::<SortOrder>(), Ok(SortOrder::Desc));
        assert!("down".parse::<SortOrder>().is_err());
        assert_eq!(SortOrder::Asc.toggled(), SortOrder::Desc);
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("exactly10!", 10), "exactly10!");
        assert_eq!(truncate_text("a longer sentence", 8), "a longer...");
        assert_eq!(truncate_text("ééééé", 2), "éé...");
    }

    #[test]
    fn test_format_date() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 5, 18, 30, 0).single();
        assert_eq!(ts.map(format_date).as_deref(), Some("Jan 5, 2025"));
    }
}
