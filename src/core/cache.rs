//! Time-boxed persistent cache for the latest quote list
//!
//! A single envelope is stored under [`CACHE_KEY`]. Every operation is total: storage
//! failures, corrupted payloads and expired entries all read as a cache miss and are
//! never surfaced to the caller.

use super::clock::Clock;
use super::quote::Quote;
use super::storage::KeyValueStorage;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const CACHE_KEY: &str = "conversion_quotes_cache";

/// Three minutes.
pub const DEFAULT_TTL: Duration = Duration::from_millis(180_000);

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheEnvelope {
    data: Vec<Quote>,
    timestamp: i64,
    expires_at: i64,
}

enum Lookup {
    Missing,
    Invalid,
    Found(CacheEnvelope),
}

#[derive(Clone)]
pub struct QuoteCache {
    storage: Arc<dyn KeyValueStorage>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl QuoteCache {
    pub fn new(storage: Arc<dyn KeyValueStorage>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            storage,
            clock,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached quotes if a valid, unexpired entry exists.
    ///
    /// Expired and structurally invalid entries are deleted as a side effect.
    pub fn get(&self) -> Option<Vec<Quote>> {
        let lookup = match self.lookup() {
            Ok(lookup) => lookup,
            Err(e) => {
                warn!(error = %e, "Failed to read quote cache");
                return None;
            }
        };

        match lookup {
            Lookup::Missing => {
                debug!("Cache MISS for key: {}", CACHE_KEY);
                None
            }
            Lookup::Invalid => {
                self.clear();
                None
            }
            Lookup::Found(envelope) => {
                if self.clock.now_millis() > envelope.expires_at {
                    debug!("Cache entry expired for key: {}", CACHE_KEY);
                    self.clear();
                    return None;
                }
                debug!("Cache HIT for key: {}", CACHE_KEY);
                Some(envelope.data)
            }
        }
    }

    /// Stores `quotes` with a fresh expiry. Storage failures are logged and dropped.
    pub fn set(&self, quotes: &[Quote]) {
        let res: Result<()> = (|| {
            let now = self.clock.now_millis();
            let ttl_millis = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
            let envelope = CacheEnvelope {
                data: quotes.to_vec(),
                timestamp: now,
                expires_at: now.saturating_add(ttl_millis),
            };
            self.storage
                .set_item(CACHE_KEY, &serde_json::to_string(&envelope)?)?;
            debug!("Cache PUT for key: {}", CACHE_KEY);
            Ok(())
        })();
        if let Err(e) = res {
            warn!(error = %e, "Failed to write quote cache");
        }
    }

    pub fn clear(&self) {
        match self.storage.remove_item(CACHE_KEY) {
            Ok(()) => debug!("Cache REMOVE for key: {}", CACHE_KEY),
            Err(e) => warn!(error = %e, "Failed to clear quote cache"),
        }
    }

    /// Time left before the current entry expires, zero if there is no valid entry.
    ///
    /// Unlike [`QuoteCache::get`], an expired entry is left in place.
    pub fn remaining_time(&self) -> Duration {
        match self.lookup() {
            Ok(Lookup::Found(envelope)) => {
                let remaining = envelope.expires_at.saturating_sub(self.clock.now_millis());
                Duration::from_millis(u64::try_from(remaining).unwrap_or(0))
            }
            Ok(_) => Duration::ZERO,
            Err(e) => {
                debug!(error = %e, "Quote cache unreadable, no time remaining");
                Duration::ZERO
            }
        }
    }

    /// Unparseable text is an error; parseable text of the wrong shape is `Invalid`.
    fn lookup(&self) -> Result<Lookup> {
        let Some(raw) = self.storage.get_item(CACHE_KEY)? else {
            return Ok(Lookup::Missing);
        };
        let value: Value = serde_json::from_str(&raw)?;
        if !is_valid_envelope(&value) {
            debug!("Invalid cache envelope for key: {}", CACHE_KEY);
            return Ok(Lookup::Invalid);
        }
        match serde_json::from_value::<CacheEnvelope>(value) {
            Ok(envelope) => Ok(Lookup::Found(envelope)),
            Err(e) => {
                debug!(error = %e, "Invalid cache envelope for key: {}", CACHE_KEY);
                Ok(Lookup::Invalid)
            }
        }
    }
}

/// serde alone would also take field-ordered arrays and `null` for absent fields,
/// so the raw shape is checked first.
fn is_valid_envelope(value: &Value) -> bool {
    let Some(envelope) = value.as_object() else {
        return false;
    };
    let is_integer = |key: &str| envelope.get(key).and_then(Value::as_i64).is_some();
    is_integer("timestamp")
        && is_integer("expiresAt")
        && envelope
            .get("data")
            .and_then(Value::as_array)
            .is_some_and(|quotes| quotes.iter().all(is_valid_quote))
}

fn is_valid_quote(value: &Value) -> bool {
    let Some(quote) = value.as_object() else {
        return false;
    };
    let absent_or = |key: &str, check: fn(&Value) -> bool| quote.get(key).is_none_or(check);
    quote.get("title").is_some_and(Value::is_string)
        && absent_or("code", Value::is_string)
        && absent_or("variation", Value::is_string)
        && absent_or("updated", Value::is_string)
        && absent_or("currentValue", Value::is_number)
}
