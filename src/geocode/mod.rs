//! Reverse geocoding of coordinates into addresses through Nominatim.
pub mod address;
pub mod cache;
pub mod error;
pub mod resolver;

pub use address::{AddressResult, normalize_address};
pub use cache::{CacheEntry, CacheKey, CacheSettings, GeocodingCache};
pub use error::{ConfigError, TransportError};
pub use resolver::{
    HttpTransport, NominatimResolver, Outcome, ResolverSettings, RetryPolicy, ReverseRequest,
    ReverseResolver, Sleeper, TokioSleeper, Transport, TransportResponse, UserAgent,
};
