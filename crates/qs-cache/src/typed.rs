//! Typed JSON view over a byte cache.

use crate::{Cache, CacheError, CacheResult, PayloadCodec};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Outcome of a typed lookup that found an entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    /// A cached value.
    Hit(T),
    /// A negative-cache marker: the source of truth has no such value.
    Absent,
}

/// Serializes values of `T` to JSON, optionally gzipped, over a [`Cache`].
///
/// A zero-length payload is reserved for negative-cache markers.
pub struct TypedCache<T> {
    cache: Arc<dyn Cache>,
    codec: PayloadCodec,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for TypedCache<T> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            codec: self.codec,
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for TypedCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedCache")
            .field("type", &std::any::type_name::<T>())
            .field("codec", &self.codec)
            .finish()
    }
}

impl<T> TypedCache<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    /// Wraps `cache`, encoding payloads with `codec`.
    #[must_use]
    pub fn new(cache: Arc<dyn Cache>, codec: PayloadCodec) -> Self {
        Self {
            cache,
            codec,
            _marker: PhantomData,
        }
    }

    /// Returns the underlying byte cache.
    #[must_use]
    pub fn raw(&self) -> &Arc<dyn Cache> {
        &self.cache
    }

    /// Get a value. Misses and negative markers both yield `NotFound`.
    pub async fn get(&self, key: &str) -> CacheResult<T> {
        match self.lookup(key).await? {
            Lookup::Hit(value) => Ok(value),
            Lookup::Absent => Err(CacheError::NotFound),
        }
    }

    /// Get a value, telling negative markers apart from misses.
    pub async fn lookup(&self, key: &str) -> CacheResult<Lookup<T>> {
        let stored = self.cache.get(key).await?;
        if stored.is_empty() {
            return Ok(Lookup::Absent);
        }
        Ok(Lookup::Hit(self.decode(stored)?))
    }

    /// Store a value. A value serializing to JSON `null` is rejected.
    pub async fn set(&self, key: &str, value: &T, ttl: Duration) -> CacheResult<()> {
        let payload = self.encode(value)?;
        self.cache.set(key, &payload, ttl).await
    }

    /// Store a negative-cache marker.
    pub async fn set_absent(&self, key: &str, ttl: Duration) -> CacheResult<()> {
        self.cache.set(key, &[], ttl).await
    }

    /// Store a value unless the key already holds a value or a marker.
    pub async fn set_if_absent(&self, key: &str, value: &T, ttl: Duration) -> CacheResult<bool> {
        let payload = self.encode(value)?;
        self.cache.set_if_absent(key, &payload, ttl).await
    }

    /// Store a negative-cache marker unless the key already holds something.
    pub async fn set_absent_if_vacant(&self, key: &str, ttl: Duration) -> CacheResult<bool> {
        self.cache.set_if_absent(key, &[], ttl).await
    }

    /// Delete a key.
    pub async fn delete(&self, key: &str) -> CacheResult<()> {
        self.cache.delete(key).await
    }

    /// Check if a key holds a value or a marker.
    pub async fn exists(&self, key: &str) -> CacheResult<bool> {
        self.cache.exists(key).await
    }

    /// Get several values. Markers and undecodable entries are left out.
    pub async fn mget(&self, keys: &[String]) -> CacheResult<HashMap<String, T>> {
        let stored = self.cache.mget(keys).await?;
        let mut values = HashMap::with_capacity(stored.len());
        for (key, payload) in stored {
            if payload.is_empty() {
                continue;
            }
            match self.decode(payload) {
                Ok(value) => {
                    values.insert(key, value);
                }
                Err(e) => warn!(key = %key, error = %e, "Skipping undecodable cache entry"),
            }
        }
        Ok(values)
    }

    /// Store several values sharing one TTL. Nothing is written if any value fails to encode.
    pub async fn mset(&self, values: &HashMap<String, T>, ttl: Duration) -> CacheResult<()> {
        let payloads = values
            .iter()
            .map(|(key, value)| -> CacheResult<(String, Vec<u8>)> { Ok((key.clone(), self.encode(value)?)) })
            .collect::<CacheResult<HashMap<_, _>>>()?;
        self.cache.mset(&payloads, ttl).await
    }

    fn encode(&self, value: &T) -> CacheResult<Vec<u8>> {
        let json = serde_json::to_vec(value)?;
        if json == b"null" {
            return Err(CacheError::Serialization("refusing to cache a nil value".to_string()));
        }
        self.codec.encode(json)
    }

    fn decode(&self, stored: Vec<u8>) -> CacheResult<T> {
        let raw = self.codec.decode(stored)?;
        Ok(serde_json::from_slice(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryCache;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        code: String,
        score: Option<f64>,
    }

    fn sample() -> Sample {
        Sample {
            code: "PHQ9".to_string(),
            score: Some(12.5),
        }
    }

    fn typed(compress: bool) -> (Arc<MemoryCache>, TypedCache<Sample>) {
        let memory = Arc::new(MemoryCache::new());
        let cache: Arc<dyn Cache> = memory.clone();
        (memory, TypedCache::new(cache, PayloadCodec::new(compress)))
    }

    #[tokio::test]
    async fn test_set_then_get_under_both_codecs() {
        for compress in [false, true] {
            let (_, cache) = typed(compress);
            cache.set("k", &sample(), Duration::from_secs(60)).await.unwrap();
            assert_eq!(cache.get("k").await.unwrap(), sample());
        }
    }

    #[tokio::test]
    async fn test_miss_propagates_not_found() {
        let (_, cache) = typed(false);
        assert_eq!(cache.get("missing").await, Err(CacheError::NotFound));
    }

    #[tokio::test]
    async fn test_absent_marker() {
        let (memory, cache) = typed(true);
        cache.set_absent("k", Duration::from_secs(60)).await.unwrap();

        assert_eq!(memory.get("k").await.unwrap(), Vec::<u8>::new());
        assert_eq!(cache.lookup("k").await.unwrap(), Lookup::Absent);
        assert_eq!(cache.get("k").await, Err(CacheError::NotFound));
    }

    #[tokio::test]
    async fn test_conditional_writes_keep_existing_entry() {
        let (_, cache) = typed(false);
        cache.set("k", &sample(), Duration::from_secs(60)).await.unwrap();

        assert!(!cache.set_absent_if_vacant("k", Duration::from_secs(60)).await.unwrap());
        let other = Sample { code: "GAD7".to_string(), score: None };
        assert!(!cache.set_if_absent("k", &other, Duration::from_secs(60)).await.unwrap());
        assert_eq!(cache.get("k").await.unwrap(), sample());

        assert!(cache.set_absent_if_vacant("gone", Duration::from_secs(60)).await.unwrap());
        assert_eq!(cache.lookup("gone").await.unwrap(), Lookup::Absent);
    }

    #[tokio::test]
    async fn test_nil_value_rejected() {
        let memory = Arc::new(MemoryCache::new());
        let cache: TypedCache<Option<Sample>> = TypedCache::new(memory.clone(), PayloadCodec::default());

        let err = cache.set("k", &None, Duration::from_secs(60)).await.unwrap_err();
        assert!(matches!(err, CacheError::Serialization(_)));
        assert!(memory.is_empty());
    }

    #[tokio::test]
    async fn test_garbage_is_serialization_error() {
        let (memory, cache) = typed(false);
        memory.set("k", b"not json", Duration::from_secs(60)).await.unwrap();
        assert!(matches!(cache.get("k").await, Err(CacheError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_batch_operations() {
        let (memory, cache) = typed(true);
        let mut values = HashMap::new();
        values.insert("a".to_string(), sample());
        values.insert("b".to_string(), Sample { code: "GAD7".to_string(), score: None });
        cache.mset(&values, Duration::from_secs(60)).await.unwrap();
        memory.set("c", &[], Duration::from_secs(60)).await.unwrap();

        let keys = ["a", "b", "c", "d"].map(String::from);
        assert_eq!(cache.mget(&keys).await.unwrap(), values);
    }
}
