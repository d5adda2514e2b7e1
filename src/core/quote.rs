//! Quote types and the mapping from the remote source's records

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Latest known rate for one tracked currency.
///
/// Only `title` is guaranteed; the other fields stay `None` until a fetch populates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
}

impl Quote {
    /// A quote with only its title, shown before the first fetch completes.
    pub fn placeholder(title: &str) -> Self {
        Self {
            code: None,
            title: title.to_string(),
            current_value: None,
            variation: None,
            updated: None,
        }
    }
}

/// One currency pair record as returned by the remote source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawQuoteRecord {
    /// "Title/Base", e.g. "Dólar Canadense/Real Brasileiro"
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub codein: Option<String>,
    #[serde(default)]
    pub bid: Option<String>,
    #[serde(default, rename = "pctChange")]
    pub pct_change: Option<String>,
    /// "YYYY-MM-DD HH:MM:SS"
    #[serde(default)]
    pub create_date: Option<String>,
}

/// A raw response keyed by pair identifier (e.g. "CADBRL").
///
/// Entries keep the order in which the source sent them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawQuotes(Vec<(String, RawQuoteRecord)>);

impl RawQuotes {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawQuoteRecord)> {
        self.0.iter().map(|(pair, record)| (pair.as_str(), record))
    }
}

impl FromIterator<(String, RawQuoteRecord)> for RawQuotes {
    fn from_iter<I: IntoIterator<Item = (String, RawQuoteRecord)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for RawQuotes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RawQuotesVisitor;

        impl<'de> Visitor<'de> for RawQuotesVisitor {
            type Value = RawQuotes;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of pair identifiers to quote records")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, RawQuoteRecord>()? {
                    entries.push(entry);
                }
                Ok(RawQuotes(entries))
            }
        }

        deserializer.deserialize_map(RawQuotesVisitor)
    }
}

/// Maps a raw response into domain quotes, one per record, in source order.
pub fn map_quotes(raw: &RawQuotes) -> Vec<Quote> {
    raw.iter().map(|(_, record)| map_record(record)).collect()
}

fn map_record(record: &RawQuoteRecord) -> Quote {
    let title = record
        .name
        .split_once('/')
        .map_or(record.name.as_str(), |(title, _)| title);

    Quote {
        code: Some(record.code.clone()),
        title: title.to_string(),
        current_value: record
            .bid
            .as_deref()
            .and_then(|bid| bid.trim().parse::<f64>().ok())
            .filter(|value| value.is_finite()),
        variation: record.pct_change.clone(),
        updated: record
            .create_date
            .as_deref()
            .and_then(|date| date.split_once(' '))
            .map(|(_, time)| time.to_string()),
    }
}
