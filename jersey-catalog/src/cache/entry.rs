//! Cache entries and their persisted representation

use crate::cache::types::CacheKey;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;

/// A cached payload together with the instant it was fetched.
///
/// Payload and timestamp always travel together: tiers replace whole entries,
/// never one field at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// The cache key
    pub key: CacheKey,

    /// The cached payload as JSON
    pub data: JsonValue,

    /// Creation or last refresh time
    pub timestamp: DateTime<Utc>,
}

/// On-disk/session layout: `{ "data": ..., "timestamp": ... }`
#[derive(Debug, Serialize, Deserialize)]
struct PersistedEntry {
    data: JsonValue,
    timestamp: DateTime<Utc>,
}

impl CacheEntry {
    /// Create an entry stamped with the current time
    pub fn new(key: CacheKey, data: JsonValue) -> Self {
        Self::with_timestamp(key, data, Utc::now())
    }

    /// Create an entry with an explicit timestamp
    pub fn with_timestamp(key: CacheKey, data: JsonValue, timestamp: DateTime<Utc>) -> Self {
        Self {
            key,
            data,
            timestamp,
        }
    }

    /// Serialize a typed value into a fresh entry
    pub fn from_value<T: Serialize>(key: CacheKey, value: &T) -> Result<Self> {
        Ok(Self::new(key, serde_json::to_value(value)?))
    }

    /// Decode the payload into a typed value
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.data.clone())?)
    }

    /// Get the age of the entry
    pub fn age(&self) -> Duration {
        (Utc::now() - self.timestamp)
            .to_std()
            .unwrap_or(Duration::from_secs(0))
    }

    /// True while the entry is younger than the freshness window
    pub fn is_fresh(&self, window: Duration) -> bool {
        self.age() < window
    }

    /// Encode the entry for the persisted tier
    pub fn to_persisted(&self) -> Result<String> {
        let persisted = PersistedEntry {
            data: self.data.clone(),
            timestamp: self.timestamp,
        };
        Ok(serde_json::to_string(&persisted)?)
    }

    /// Decode a persisted document. Any shape other than `{data, timestamp}`
    /// is an error.
    pub fn from_persisted(key: CacheKey, raw: &str) -> Result<Self> {
        let persisted: PersistedEntry = serde_json::from_str(raw)?;
        Ok(Self::with_timestamp(key, persisted.data, persisted.timestamp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cache_entry_creation() {
        let entry = CacheEntry::new("catalog:products".to_string(), json!([1, 2, 3]));

        assert_eq!(entry.key, "catalog:products");
        assert_eq!(entry.data, json!([1, 2, 3]));
        assert!(entry.is_fresh(Duration::from_secs(60)));
    }

    #[test]
    fn test_staleness() {
        let entry = CacheEntry::with_timestamp(
            "k".to_string(),
            json!("v"),
            Utc::now() - chrono::Duration::minutes(11),
        );

        assert!(!entry.is_fresh(Duration::from_secs(600)));
        assert!(entry.age() >= Duration::from_secs(660));
    }

    #[test]
    fn test_future_timestamp_has_zero_age() {
        let entry = CacheEntry::with_timestamp(
            "k".to_string(),
            json!(null),
            Utc::now() + chrono::Duration::hours(1),
        );
        assert_eq!(entry.age(), Duration::from_secs(0));
    }

    #[test]
    fn test_persisted_layout() {
        let entry = CacheEntry::new("k".to_string(), json!({"name": "Home Kit"}));
        let raw = entry.to_persisted().unwrap();

        let doc: JsonValue = serde_json::from_str(&raw).unwrap();
        assert_eq!(doc["data"]["name"], "Home Kit");
        assert!(doc["timestamp"].is_string());

        let restored = CacheEntry::from_persisted("k".to_string(), &raw).unwrap();
        assert_eq!(restored, entry);
    }

    #[test]
    fn test_foreign_content_is_rejected() {
        assert!(CacheEntry::from_persisted("k".to_string(), "not json").is_err());
        assert!(CacheEntry::from_persisted("k".to_string(), r#"{"data": 1}"#).is_err());
        assert!(CacheEntry::from_persisted("k".to_string(), r#"[1,2]"#).is_err());
        assert!(
            CacheEntry::from_persisted("k".to_string(), r#"{"data": 1, "timestamp": "yesterday"}"#)
                .is_err()
        );
    }

    #[test]
    fn test_typed_round_trip() {
        let entry = CacheEntry::from_value("k".to_string(), &vec!["a".to_string()]).unwrap();
        let decoded: Vec<String> = entry.decode().unwrap();
        assert_eq!(decoded, vec!["a".to_string()]);

        let mismatched: Result<u32> = entry.decode();
        assert!(mismatched.is_err());
    }
}
