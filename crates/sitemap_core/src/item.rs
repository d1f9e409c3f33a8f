use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};

use crate::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// A nested sitemap (`<sitemap>` element) to crawl further.
    IndexEntry,
    /// A terminal page URL (`<url>` element or a plain-list line).
    LeafUrl,
}

impl ItemKind {
    /// Maps a lower-cased element name to the kind of item it opens.
    pub fn from_element_name(name: &str) -> Option<Self> {
        match name {
            "sitemap" => Some(Self::IndexEntry),
            "url" => Some(Self::LeafUrl),
            _ => None,
        }
    }

    pub fn element_name(self) -> &'static str {
        match self {
            Self::IndexEntry => "sitemap",
            Self::LeafUrl => "url",
        }
    }
}

/// One discovered sitemap entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub location: Location,
    pub change_frequency: Option<String>,
    /// `None` when the entry had no `lastmod` or it could not be parsed.
    pub last_modified: Option<DateTime<FixedOffset>>,
    pub priority: f64,
    pub kind: ItemKind,
}

impl Item {
    pub fn new(location: Location, kind: ItemKind) -> Self {
        Self {
            location,
            change_frequency: None,
            last_modified: None,
            priority: 0.0,
            kind,
        }
    }
}

/// Parse a `lastmod` value: full date-time with offset first, then a bare date (UTC midnight).
pub fn parse_last_modified(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).ok().or_else(|| {
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()
            .map(|date| date.and_time(NaiveTime::MIN).and_utc().fixed_offset())
    })
}

/// Parse a `priority` value; anything unparsable or non-finite yields 0.0.
pub fn parse_priority(value: &str) -> f64 {
    value
        .parse::<f64>()
        .ok()
        .filter(|priority| priority.is_finite())
        .unwrap_or(0.0)
}
