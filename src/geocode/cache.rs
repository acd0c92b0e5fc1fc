//! Two-tier cache in front of a [`ReverseResolver`].
//!
//! Positions are rounded to a [`CacheKey`] before any lookup, so photos taken a few metres
//! apart share one provider request. The exact tier is a bounded LRU that never expires;
//! the timed tier in front of it drops entries after a fixed age. Failed lookups are cached
//! as `None` in both tiers.

use crate::features::gps::Coordinate;
use crate::geocode::address::{AddressResult, normalize_address};
use crate::geocode::error::ConfigError;
use crate::geocode::resolver::ReverseResolver;
use log::debug;
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Four decimal places, about 11 metres.
pub const DEFAULT_PRECISION: u32 = 4;
pub const MAX_PRECISION: u32 = 9;
pub const DEFAULT_CAPACITY: usize = 1024;
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// A position rounded to a fixed number of decimal places, stored as scaled integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    lat: i64,
    lon: i64,
    precision: u32,
}

impl CacheKey {
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(coordinate: &Coordinate, precision: u32) -> Self {
        let precision = precision.min(MAX_PRECISION);
        let scale = Self::scale(precision);
        Self {
            lat: (coordinate.latitude() * scale).round() as i64,
            lon: (coordinate.longitude() * scale).round() as i64,
            precision,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn latitude(&self) -> f64 {
        self.lat as f64 / Self::scale(self.precision)
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn longitude(&self) -> f64 {
        self.lon as f64 / Self::scale(self.precision)
    }

    pub const fn precision(&self) -> u32 {
        self.precision
    }

    #[allow(clippy::cast_possible_wrap)]
    fn scale(precision: u32) -> f64 {
        10_f64.powi(precision as i32)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub address: Option<AddressResult>,
    pub inserted_at: Instant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// Decimal places kept in the cache key.
    pub precision: u32,
    /// Maximum entries in the exact tier.
    pub capacity: usize,
    /// Age after which timed-tier entries are dropped.
    pub ttl: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            capacity: DEFAULT_CAPACITY,
            ttl: DEFAULT_TTL,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct GeocodingCache<R> {
    resolver: R,
    settings: CacheSettings,
    exact: Mutex<LruCache<CacheKey, CacheEntry>>,
    timed: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl<R: ReverseResolver> GeocodingCache<R> {
    pub fn new(resolver: R, settings: CacheSettings) -> Result<Self, ConfigError> {
        if settings.precision > MAX_PRECISION {
            return Err(ConfigError::PrecisionOutOfRange(settings.precision));
        }
        let capacity = NonZeroUsize::new(settings.capacity).ok_or(ConfigError::ZeroCapacity)?;
        Ok(Self {
            resolver,
            settings,
            exact: Mutex::new(LruCache::new(capacity)),
            timed: Mutex::new(HashMap::new()),
        })
    }

    pub const fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    pub const fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn key(&self, coordinate: &Coordinate) -> CacheKey {
        CacheKey::new(coordinate, self.settings.precision)
    }

    /// Resolves through both tiers, hitting the provider only when neither has the key.
    pub async fn resolve(&self, coordinate: &Coordinate) -> Option<AddressResult> {
        self.resolve_at(coordinate, Instant::now()).await
    }

    /// Resolves through the exact tier only, skipping the timed tier.
    pub async fn resolve_exact(&self, coordinate: &Coordinate) -> Option<AddressResult> {
        self.resolve_key(self.key(coordinate)).await
    }

    pub(crate) async fn resolve_at(&self, coordinate: &Coordinate, now: Instant) -> Option<AddressResult> {
        let key = self.key(coordinate);
        if let Some(address) = self.timed_get(&key, now) {
            debug!("Timed cache hit for ({}, {})", key.latitude(), key.longitude());
            return address;
        }
        let address = self.resolve_key(key).await;
        self.timed_insert(key, address.clone(), now);
        address
    }

    async fn resolve_key(&self, key: CacheKey) -> Option<AddressResult> {
        let cached = lock(&self.exact).get(&key).map(|entry| entry.address.clone());
        if let Some(address) = cached {
            debug!("Exact cache hit for ({}, {})", key.latitude(), key.longitude());
            return address;
        }

        debug!("Cache miss for ({}, {})", key.latitude(), key.longitude());
        let address = self
            .resolver
            .fetch(key.latitude(), key.longitude())
            .await
            .and_then(normalize_address);

        lock(&self.exact).put(
            key,
            CacheEntry {
                address: address.clone(),
                inserted_at: Instant::now(),
            },
        );
        address
    }

    fn timed_get(&self, key: &CacheKey, now: Instant) -> Option<Option<AddressResult>> {
        let timed = lock(&self.timed);
        let entry = timed.get(key)?;
        (now.saturating_duration_since(entry.inserted_at) < self.settings.ttl)
            .then(|| entry.address.clone())
    }

    /// Inserts into the timed tier, which holds at most `capacity` entries. Expired entries
    /// are purged only once the tier is full; if it is still full, the oldest entry goes.
    fn timed_insert(&self, key: CacheKey, address: Option<AddressResult>, now: Instant) {
        let ttl = self.settings.ttl;
        let mut timed = lock(&self.timed);
        if !timed.contains_key(&key) && timed.len() >= self.settings.capacity {
            timed.retain(|_, entry| now.saturating_duration_since(entry.inserted_at) < ttl);
            if timed.len() >= self.settings.capacity
                && let Some(oldest) = timed
                    .iter()
                    .min_by_key(|(_, entry)| entry.inserted_at)
                    .map(|(key, _)| *key)
            {
                timed.remove(&oldest);
            }
        }
        timed.insert(
            key,
            CacheEntry {
                address,
                inserted_at: now,
            },
        );
    }

    pub fn exact_len(&self) -> usize {
        lock(&self.exact).len()
    }

    pub fn timed_len(&self) -> usize {
        lock(&self.timed).len()
    }

    pub fn clear(&self) {
        lock(&self.exact).clear();
        lock(&self.timed).clear();
    }
}
