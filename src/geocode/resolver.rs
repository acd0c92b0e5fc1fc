//! The Nominatim reverse geocoding client: transport, retry policy and the resolver itself.

use crate::geocode::error::{ConfigError, TransportError};
use log::{debug, warn};
use reqwest::Client;
use reqwest::header::{HeaderValue, USER_AGENT};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::time::Duration;

pub const NOMINATIM_REVERSE_URL: &str = "https://nominatim.openstreetmap.org/reverse";
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// The identification header the provider's usage policy requires:
/// `<app-name>/<version> (contact: <email>)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgent(String);

impl UserAgent {
    pub fn new(app_name: &str, version: &str, contact: &str) -> Result<Self, ConfigError> {
        let contact = contact.trim();
        if contact.is_empty() {
            return Err(ConfigError::MissingContact);
        }
        let value = format!("{app_name}/{version} (contact: {contact})");
        HeaderValue::from_str(&value).map_err(|_| ConfigError::InvalidUserAgent(value.clone()))?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One reverse lookup as sent to the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ReverseRequest {
    pub endpoint: String,
    pub latitude: f64,
    pub longitude: f64,
    pub language: String,
    pub user_agent: String,
}

impl ReverseRequest {
    pub fn query(&self) -> [(&'static str, String); 4] {
        [
            ("lat", self.latitude.to_string()),
            ("lon", self.longitude.to_string()),
            ("format", "json".to_string()),
            ("accept-language", self.language.clone()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    /// Only read for `200` responses; empty otherwise.
    pub body: String,
}

/// Sends a single GET to the provider. Implementations must not retry.
pub trait Transport: Send + Sync {
    fn get(
        &self,
        request: &ReverseRequest,
    ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send;
}

/// [`Transport`] over a `reqwest` client with a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

fn transport_error(err: &reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Connection(err.to_string())
    }
}

impl Transport for HttpTransport {
    async fn get(&self, request: &ReverseRequest) -> Result<TransportResponse, TransportError> {
        let response = self
            .client
            .get(&request.endpoint)
            .query(&request.query())
            .header(USER_AGENT, request.user_agent.as_str())
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status().as_u16();
        if status != 200 {
            return Ok(TransportResponse {
                status,
                body: String::new(),
            });
        }
        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Body(e.to_string())
            }
        })?;
        Ok(TransportResponse { status, body })
    }
}

/// Waits between attempts. Injectable so retry timing can be tested without sleeping.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

/// How one attempt ended, as far as retrying is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// HTTP 429.
    RateLimited,
    /// Any other non-200 status. Not transient.
    Rejected,
    /// Timeout, connection failure or an unreadable body.
    Fault,
}

impl Outcome {
    pub const fn from_status(status: u16) -> Self {
        match status {
            200 => Self::Success,
            429 => Self::RateLimited,
            _ => Self::Rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Multiplied by the attempt number after a 429.
    pub rate_limit_backoff: Duration,
    /// Multiplied by the attempt number after a network fault.
    pub fault_backoff: Duration,
    /// Upper bound on the whole retry loop.
    pub deadline: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            rate_limit_backoff: Duration::from_millis(1500),
            fault_backoff: Duration::from_millis(500),
            deadline: None,
        }
    }
}

impl RetryPolicy {
    /// The wait before the next attempt after `attempt` (1-based) ended with `outcome`,
    /// or `None` if the loop must stop.
    pub fn retry_after(&self, attempt: u32, outcome: Outcome) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        match outcome {
            Outcome::Success | Outcome::Rejected => None,
            Outcome::RateLimited => Some(self.rate_limit_backoff * attempt),
            Outcome::Fault => Some(self.fault_backoff * attempt),
        }
    }
}

/// Anything that turns a position into a raw provider payload, or nothing.
pub trait ReverseResolver: Send + Sync {
    fn fetch(&self, latitude: f64, longitude: f64) -> impl Future<Output = Option<Value>> + Send;
}

#[derive(Debug, Clone)]
pub struct ResolverSettings {
    pub endpoint: String,
    pub language: String,
    pub user_agent: UserAgent,
    pub policy: RetryPolicy,
}

impl ResolverSettings {
    pub fn new(user_agent: UserAgent) -> Self {
        Self {
            endpoint: NOMINATIM_REVERSE_URL.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            user_agent,
            policy: RetryPolicy::default(),
        }
    }
}

/// Reverse geocoding against Nominatim with the provider's retry etiquette.
///
/// Each lookup makes at most `max_attempts` requests. A 200 returns at once, a 429 or a
/// network fault waits and retries, any other status gives up immediately. The result is
/// always a payload or `None`; failures are logged, never returned.
pub struct NominatimResolver<T = HttpTransport, S = TokioSleeper> {
    transport: T,
    sleeper: S,
    settings: ResolverSettings,
}

impl NominatimResolver {
    /// A resolver that talks HTTP and sleeps on the tokio timer.
    pub fn with_http(settings: ResolverSettings, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self::new(HttpTransport::new(timeout)?, TokioSleeper, settings))
    }
}

impl<T: Transport, S: Sleeper> NominatimResolver<T, S> {
    pub const fn new(transport: T, sleeper: S, settings: ResolverSettings) -> Self {
        Self {
            transport,
            sleeper,
            settings,
        }
    }

    pub const fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    pub const fn transport(&self) -> &T {
        &self.transport
    }

    pub const fn sleeper(&self) -> &S {
        &self.sleeper
    }

    fn request(&self, latitude: f64, longitude: f64) -> ReverseRequest {
        ReverseRequest {
            endpoint: self.settings.endpoint.clone(),
            latitude,
            longitude,
            language: self.settings.language.clone(),
            user_agent: self.settings.user_agent.as_str().to_string(),
        }
    }

    async fn fetch_with_retries(&self, request: &ReverseRequest) -> Option<Value> {
        let policy = &self.settings.policy;
        for attempt in 1..=policy.max_attempts {
            let outcome = match self.transport.get(request).await {
                Ok(response) => match Outcome::from_status(response.status) {
                    Outcome::Success => match serde_json::from_str::<Value>(&response.body) {
                        Ok(body) => return Some(body),
                        Err(err) => {
                            warn!("Attempt {attempt}: undecodable geocoding response: {err}");
                            Outcome::Fault
                        }
                    },
                    Outcome::RateLimited => {
                        warn!("Attempt {attempt}: rate limited by geocoding provider");
                        Outcome::RateLimited
                    }
                    other => {
                        warn!(
                            "Geocoding provider answered HTTP {} for ({}, {}), giving up",
                            response.status, request.latitude, request.longitude
                        );
                        other
                    }
                },
                Err(err) => {
                    debug!("Attempt {attempt}: geocoding request failed: {err}");
                    Outcome::Fault
                }
            };

            match policy.retry_after(attempt, outcome) {
                Some(wait) => self.sleeper.sleep(wait).await,
                None => break,
            }
        }
        None
    }
}

impl<T: Transport, S: Sleeper> ReverseResolver for NominatimResolver<T, S> {
    async fn fetch(&self, latitude: f64, longitude: f64) -> Option<Value> {
        let request = self.request(latitude, longitude);
        debug!("Reverse geocoding ({latitude}, {longitude})");
        match self.settings.policy.deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.fetch_with_retries(&request))
                .await
                .unwrap_or_else(|_| {
                    warn!("Reverse geocoding ({latitude}, {longitude}) exceeded its deadline");
                    None
                }),
            None => self.fetch_with_retries(&request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    type Scripted = Result<TransportResponse, TransportError>;

    /// Replays scripted responses and records every request it receives.
    #[derive(Default)]
    struct ScriptedTransport {
        responses: Mutex<VecDeque<Scripted>>,
        requests: Mutex<Vec<ReverseRequest>>,
    }

    impl ScriptedTransport {
        fn new(responses: impl IntoIterator<Item = Scripted>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().collect()),
                requests: Mutex::default(),
            }
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    impl Transport for ScriptedTransport {
        fn get(
            &self,
            request: &ReverseRequest,
        ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send {
            self.requests.lock().unwrap().push(request.clone());
            let next = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Connection("script exhausted".into())));
            std::future::ready(next)
        }
    }

    #[derive(Default)]
    struct RecordingSleeper {
        waits: Mutex<Vec<Duration>>,
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
            self.waits.lock().unwrap().push(duration);
            std::future::ready(())
        }
    }

    /// Never answers within any reasonable deadline.
    struct StalledTransport;

    impl Transport for StalledTransport {
        fn get(
            &self,
            _request: &ReverseRequest,
        ) -> impl Future<Output = Result<TransportResponse, TransportError>> + Send {
            async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Err(TransportError::Timeout)
            }
        }
    }

    fn ok(body: &str) -> Scripted {
        Ok(TransportResponse {
            status: 200,
            body: body.to_string(),
        })
    }

    fn status(code: u16) -> Scripted {
        Ok(TransportResponse {
            status: code,
            body: String::new(),
        })
    }

    fn settings() -> ResolverSettings {
        ResolverSettings::new(UserAgent::new("photo_locator", "0.1.0", "me@example.com").unwrap())
    }

    fn resolver(
        responses: impl IntoIterator<Item = Scripted>,
    ) -> NominatimResolver<ScriptedTransport, RecordingSleeper> {
        NominatimResolver::new(
            ScriptedTransport::new(responses),
            RecordingSleeper::default(),
            settings(),
        )
    }

    fn waits(resolver: &NominatimResolver<ScriptedTransport, RecordingSleeper>) -> Vec<Duration> {
        resolver.sleeper.waits.lock().unwrap().clone()
    }

    #[test]
    fn test_user_agent_format_and_validation() {
        let agent = UserAgent::new("photo-location-app", "1.0", " your.email@example.com ").unwrap();
        assert_eq!(
            agent.as_str(),
            "photo-location-app/1.0 (contact: your.email@example.com)"
        );
        assert_eq!(
            UserAgent::new("app", "1.0", "  "),
            Err(ConfigError::MissingContact)
        );
        assert!(matches!(
            UserAgent::new("app", "1.0", "line\nbreak"),
            Err(ConfigError::InvalidUserAgent(_))
        ));
    }

    #[test]
    fn test_retry_policy_backoff_schedule() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.retry_after(1, Outcome::RateLimited), Some(Duration::from_millis(1500)));
        assert_eq!(policy.retry_after(2, Outcome::RateLimited), Some(Duration::from_millis(3000)));
        assert_eq!(policy.retry_after(1, Outcome::Fault), Some(Duration::from_millis(500)));
        assert_eq!(policy.retry_after(2, Outcome::Fault), Some(Duration::from_millis(1000)));
        assert_eq!(policy.retry_after(3, Outcome::Fault), None, "No wait after the last attempt");
        assert_eq!(policy.retry_after(1, Outcome::Rejected), None);
        assert_eq!(policy.retry_after(1, Outcome::Success), None);
    }

    #[test]
    fn test_outcome_from_status() {
        assert_eq!(Outcome::from_status(200), Outcome::Success);
        assert_eq!(Outcome::from_status(429), Outcome::RateLimited);
        assert_eq!(Outcome::from_status(500), Outcome::Rejected);
        assert_eq!(Outcome::from_status(204), Outcome::Rejected);
        assert_eq!(Outcome::from_status(403), Outcome::Rejected);
    }

    #[tokio::test]
    async fn test_success_returns_body_and_sends_policy_headers() {
        let resolver = resolver([ok(r#"{"display_name": "Pittsburgh"}"#)]);

        let body = resolver.fetch(40.4461, -79.9822).await;

        assert_eq!(body, Some(serde_json::json!({"display_name": "Pittsburgh"})));
        let requests = resolver.transport.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.endpoint, NOMINATIM_REVERSE_URL);
        assert_eq!(
            request.user_agent,
            "photo_locator/0.1.0 (contact: me@example.com)"
        );
        assert_eq!(
            request.query(),
            [
                ("lat", "40.4461".to_string()),
                ("lon", "-79.9822".to_string()),
                ("format", "json".to_string()),
                ("accept-language", "en".to_string()),
            ]
        );
        assert!(waits(&resolver).is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_is_retried_with_growing_backoff() {
        let resolver = resolver([status(429), status(429), ok("{}")]);

        let body = resolver.fetch(1.0, 2.0).await;

        assert_eq!(body, Some(serde_json::json!({})));
        assert_eq!(resolver.transport.calls(), 3);
        assert_eq!(
            waits(&resolver),
            vec![Duration::from_millis(1500), Duration::from_millis(3000)]
        );
    }

    #[tokio::test]
    async fn test_persistent_rate_limit_gives_up_after_three_attempts() {
        let resolver = resolver([status(429), status(429), status(429), ok("{}")]);

        assert_eq!(resolver.fetch(1.0, 2.0).await, None);
        assert_eq!(resolver.transport.calls(), 3);
        assert_eq!(waits(&resolver).len(), 2);
    }

    #[tokio::test]
    async fn test_other_statuses_are_terminal() {
        for code in [500, 404, 403, 503] {
            let resolver = resolver([status(code), ok("{}")]);

            assert_eq!(resolver.fetch(1.0, 2.0).await, None, "HTTP {code}");
            assert_eq!(resolver.transport.calls(), 1, "HTTP {code} must not be retried");
            assert!(waits(&resolver).is_empty());
        }
    }

    #[tokio::test]
    async fn test_network_faults_are_retried() {
        let resolver = resolver([
            Err(TransportError::Timeout),
            Err(TransportError::Connection("reset".into())),
            ok(r#"{"address": {}}"#),
        ]);

        assert!(resolver.fetch(1.0, 2.0).await.is_some());
        assert_eq!(resolver.transport.calls(), 3);
        assert_eq!(
            waits(&resolver),
            vec![Duration::from_millis(500), Duration::from_millis(1000)]
        );
    }

    #[tokio::test]
    async fn test_exhausted_faults_return_none() {
        let resolver = resolver([
            Err(TransportError::Timeout),
            Err(TransportError::Timeout),
            Err(TransportError::Timeout),
        ]);

        assert_eq!(resolver.fetch(1.0, 2.0).await, None);
        assert_eq!(resolver.transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_undecodable_body_is_treated_as_fault() {
        let resolver = resolver([ok("<html>busy</html>"), ok(r#"{"display_name": "x"}"#)]);

        assert!(resolver.fetch(1.0, 2.0).await.is_some());
        assert_eq!(resolver.transport.calls(), 2);
        assert_eq!(waits(&resolver), vec![Duration::from_millis(500)]);
    }

    #[tokio::test]
    async fn test_deadline_aborts_a_stalled_request() {
        let mut settings = settings();
        settings.policy.deadline = Some(Duration::from_millis(20));
        let resolver = NominatimResolver::new(StalledTransport, TokioSleeper, settings);

        let started = std::time::Instant::now();
        assert_eq!(resolver.fetch(1.0, 2.0).await, None);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_http_transport_builds() {
        assert!(HttpTransport::new(DEFAULT_REQUEST_TIMEOUT).is_ok());
    }

    #[tokio::test]
    #[ignore] // Hits the live provider: cargo test -- --ignored
    async fn test_live_reverse_lookup() {
        let resolver = NominatimResolver::with_http(settings(), DEFAULT_REQUEST_TIMEOUT).unwrap();

        let body = resolver.fetch(40.4461, -79.9822).await;

        assert!(body.is_some_and(|b| b.get("address").is_some()));
    }
}
