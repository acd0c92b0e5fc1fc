use crate::PhotoLocatorError;
use crate::features::gps::get_coordinate;
use crate::geocode::cache::{DEFAULT_CAPACITY, DEFAULT_PRECISION, DEFAULT_TTL};
use crate::geocode::error::ConfigError;
use crate::geocode::resolver::{DEFAULT_LANGUAGE, DEFAULT_REQUEST_TIMEOUT, NOMINATIM_REVERSE_URL};
use crate::geocode::{
    CacheSettings, GeocodingCache, NominatimResolver, ResolverSettings, RetryPolicy,
    ReverseResolver, UserAgent,
};
use crate::metadata::{MetadataRecord, read_metadata, read_metadata_from_path};
use crate::structs::PhotoReport;
use crate::time::get_capture_date;
use bon::bon;
use log::info;
use std::io::{self, Cursor};
use std::path::Path;
use std::time::Duration;

/// The main entry point for locating photos.
///
/// Holds the geocoding cache and the resolver behind it. Create it once and reuse it for
/// every photo; the cache lives exactly as long as the locator.
///
/// ```rust,no_run
/// # use photo_locator::{PhotoLocator, PhotoLocatorError};
/// # #[tokio::main]
/// # async fn main() -> Result<(), PhotoLocatorError> {
/// let locator = PhotoLocator::builder()
///     .contact("you@example.com")
///     .build()?;
/// let report = locator.locate_file(std::path::Path::new("holiday.jpg")).await?;
/// println!("{report}");
/// # Ok(())
/// # }
/// ```
pub struct PhotoLocator<R = NominatimResolver> {
    cache: GeocodingCache<R>,
}

#[bon]
impl PhotoLocator {
    /// Constructs a `PhotoLocator` talking to Nominatim over HTTP.
    ///
    /// # Builder Arguments
    ///
    /// * `contact: String` - Contact address sent in the `User-Agent`, required by the provider's usage policy.
    /// * `app_name: String` - (Default: crate name) Application name in the `User-Agent`.
    /// * `app_version: String` - (Default: crate version) Application version in the `User-Agent`.
    /// * `endpoint: String` - (Default: Nominatim's public `/reverse`) Reverse geocoding endpoint.
    /// * `language: String` - (Default: `"en"`) Preferred language of the returned address.
    /// * `precision: u32` - (Default: `4`) Decimal places kept when rounding positions into cache keys.
    /// * `cache_capacity: usize` - (Default: `1024`) Entries kept by the never-expiring cache tier.
    /// * `cache_ttl: Duration` - (Default: 24 hours) Lifetime of entries in the timed cache tier.
    /// * `request_timeout: Duration` - (Default: 10 seconds) Timeout of each HTTP request.
    /// * `max_attempts: u32` - (Default: `3`) Requests per lookup, including the first.
    /// * `deadline: Option<Duration>` - Upper bound on one lookup including all retries.
    ///
    /// # Errors
    ///
    /// Returns [`PhotoLocatorError::Config`] for an empty contact, an out-of-range precision,
    /// a zero capacity or zero attempts, and [`PhotoLocatorError::HttpClient`] if the HTTP
    /// client cannot be built.
    #[builder]
    pub fn new(
        #[builder(into)] contact: String,
        #[builder(into, default = String::from(env!("CARGO_PKG_NAME")))] app_name: String,
        #[builder(into, default = String::from(env!("CARGO_PKG_VERSION")))] app_version: String,
        #[builder(into, default = String::from(NOMINATIM_REVERSE_URL))] endpoint: String,
        #[builder(into, default = String::from(DEFAULT_LANGUAGE))] language: String,
        #[builder(default = DEFAULT_PRECISION)] precision: u32,
        #[builder(default = DEFAULT_CAPACITY)] cache_capacity: usize,
        #[builder(default = DEFAULT_TTL)] cache_ttl: Duration,
        #[builder(default = DEFAULT_REQUEST_TIMEOUT)] request_timeout: Duration,
        #[builder(default = 3)] max_attempts: u32,
        deadline: Option<Duration>,
    ) -> Result<Self, PhotoLocatorError> {
        if max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts.into());
        }
        let user_agent = UserAgent::new(&app_name, &app_version, &contact)?;
        let settings = ResolverSettings {
            endpoint,
            language,
            user_agent,
            policy: RetryPolicy {
                max_attempts,
                deadline,
                ..RetryPolicy::default()
            },
        };
        let resolver = NominatimResolver::with_http(settings, request_timeout)?;
        Self::with_resolver(
            resolver,
            CacheSettings {
                precision,
                capacity: cache_capacity,
                ttl: cache_ttl,
            },
        )
    }
}

impl<R: ReverseResolver> PhotoLocator<R> {
    /// Builds a locator around any resolver, e.g. a self-hosted provider or a test double.
    pub fn with_resolver(resolver: R, settings: CacheSettings) -> Result<Self, PhotoLocatorError> {
        Ok(Self {
            cache: GeocodingCache::new(resolver, settings)?,
        })
    }

    pub const fn cache(&self) -> &GeocodingCache<R> {
        &self.cache
    }

    /// Runs the whole pipeline on an already-read metadata record. Never fails; anything
    /// that cannot be determined is `None` in the report.
    pub async fn locate_record(&self, record: &MetadataRecord) -> PhotoReport {
        let capture_date = get_capture_date(record);
        let coordinate = get_coordinate(record);
        let address = match &coordinate {
            Some(coordinate) => self.cache.resolve(coordinate).await,
            None => None,
        };

        info!(
            "Located photo: coordinate {}, address {}",
            coordinate.map_or_else(|| "absent".to_string(), |c| c.to_string()),
            address.as_ref().map_or("absent", |a| a.display_name.as_str()),
        );

        PhotoReport {
            has_metadata: record.has_metadata(),
            capture_date,
            coordinate,
            address,
        }
    }

    /// Reads a photo file and locates it.
    ///
    /// # Errors
    ///
    /// Only I/O failures are errors. A photo without EXIF yields a report with
    /// `has_metadata == false`.
    pub async fn locate_file(&self, path: &Path) -> Result<PhotoReport, PhotoLocatorError> {
        let path = path.to_path_buf();
        let record = tokio::task::spawn_blocking(move || read_metadata_from_path(&path))
            .await
            .map_err(io::Error::other)??;
        Ok(self.locate_record(&record).await)
    }

    /// Locates a photo held in memory, e.g. an upload.
    pub async fn locate_bytes(&self, bytes: &[u8]) -> Result<PhotoReport, PhotoLocatorError> {
        let record = read_metadata(&mut Cursor::new(bytes))?;
        Ok(self.locate_record(&record).await)
    }
}
